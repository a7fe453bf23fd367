use kvxml::{encode_to_xml_text, reader::parse_str, Error, Object, Value};

#[test]
fn test_scalar_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let data = Object::from([("a", "hello")]);
    let xml = encode_to_xml_text(&data, "root")?;
    assert_eq!(parse_str(&xml)?, data);
    Ok(())
}

#[test]
fn test_attribute_directive() -> Result<(), Box<dyn std::error::Error>> {
    let mut data = Object::new();
    data.insert("@attributes", Object::from([("id", "7")]));
    data.insert("value", "x");

    let xml = encode_to_xml_text(&data, "root")?;
    assert!(xml.contains("<root id=\"7\"><![CDATA[x]]></root>"));

    let tree = kvxml::XmlParser::new(xml.as_bytes()).parse()?;
    assert_eq!(tree.root.attributes.get("id").map(String::as_str), Some("7"));
    assert_eq!(tree.root.children, vec![kvxml::XmlContent::CData("x".to_string())]);
    Ok(())
}

#[test]
fn test_sequence_expansion() -> Result<(), Box<dyn std::error::Error>> {
    let data = Object::from([("item", Value::from(vec!["a".into(), "b".into(), "c".into()]))]);
    let xml = encode_to_xml_text(&data, "root")?;

    let tree = kvxml::XmlParser::new(xml.as_bytes()).parse()?;
    let items: Vec<(&str, String)> = tree
        .root
        .elements()
        .map(|e| (e.name.as_str(), e.text()))
        .collect();
    assert_eq!(
        items,
        vec![
            ("item", "a".to_string()),
            ("item", "b".to_string()),
            ("item", "c".to_string()),
        ]
    );
    Ok(())
}

#[test]
fn test_attributes_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let mut product = Object::new();
    product.insert("@attributes", Object::from([("sku", "A-1"), ("stock", "3")]));
    product.insert("name", "Lamp");
    product.insert("tags", Value::from(vec!["desk".into(), "led".into()]));

    let data = Object::from([("product", product)]);
    let xml = encode_to_xml_text(&data, "catalog")?;
    assert_eq!(parse_str(&xml)?, data);
    Ok(())
}

#[test]
fn test_document_shape() -> Result<(), Box<dyn std::error::Error>> {
    let mut data = Object::new();
    data.insert("title", "Q3 <draft>");
    data.insert("rows", Object::from([("row", Value::from(vec![1.into(), 2.into()]))]));

    let xml = encode_to_xml_text(&data, "report")?;
    assert_eq!(
        xml,
        r#"<?xml version="1.0" encoding="utf-8"?>
<report>
  <title><![CDATA[Q3 <draft>]]></title>
  <rows>
    <row><![CDATA[1]]></row>
    <row><![CDATA[2]]></row>
  </rows>
</report>
"#
    );
    Ok(())
}

#[test]
fn test_cdata_terminator_survives_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let data = Object::from([("code", "if a[b[0]]>1 {}")]);
    let xml = encode_to_xml_text(&data, "root")?;
    assert_eq!(parse_str(&xml)?, data);
    Ok(())
}

#[test]
fn test_mixed_content_survives_reencoding() -> Result<(), Box<dyn std::error::Error>> {
    let decoded = parse_str(r#"<root><p a="1">x<b>y</b></p></root>"#)?;

    let mut p = Object::new();
    p.insert("@attributes", Object::from([("a", "1")]));
    p.insert("b", "y");
    p.insert("#text", "x");
    assert_eq!(decoded, Object::from([("p", p)]));

    let xml = encode_to_xml_text(&decoded, "root")?;
    assert!(xml.contains(r#"<p a="1"><b><![CDATA[y]]></b><![CDATA[x]]></p>"#));
    assert_eq!(parse_str(&xml)?, decoded);
    Ok(())
}

#[test]
fn test_text_only_root_survives_reencoding() -> Result<(), Box<dyn std::error::Error>> {
    let decoded = parse_str("<root>just text</root>")?;
    let xml = encode_to_xml_text(&decoded, "root")?;
    assert!(xml.ends_with("<root><![CDATA[just text]]></root>\n"));
    assert_eq!(parse_str(&xml)?, decoded);
    Ok(())
}

#[test]
fn test_non_scalar_text_entry_is_rejected() {
    let data = Object::from([("#text", Object::from([("x", "1")]))]);
    assert!(matches!(
        encode_to_xml_text(&data, "root"),
        Err(Error::InvalidName(name)) if name == "#text"
    ));
}
