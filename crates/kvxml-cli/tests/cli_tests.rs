use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn test_encode_from_stdin() -> TestResult {
    Command::cargo_bin("kvxml")?
        .args(["encode", "--root", "root"])
        .write_stdin(r#"{"@attributes":{"id":"7"},"value":"x"}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "<root id=\"7\"><![CDATA[x]]></root>",
        ));
    Ok(())
}

#[test]
fn test_encode_rejects_non_object_input() -> TestResult {
    Command::cargo_bin("kvxml")?
        .args(["encode", "--root", "root"])
        .write_stdin("[1, 2, 3]")
        .assert()
        .failure()
        .stderr(predicate::str::contains("input must be a JSON object"));
    Ok(())
}

#[test]
fn test_write_then_read() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("order.json");
    let output = tmp.path().join("out/order.xml");
    fs::write(
        &input,
        r#"{"customer":"ACME","note":"plain","line":[{"sku":"A-1"},{"sku":"B <2>"}],"empty":""}"#,
    )?;

    Command::cargo_bin("kvxml")?
        .arg("write")
        .arg(&input)
        .args(["--root", "order", "--attr", "channel=web", "--force-cdata", "note"])
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let xml = fs::read_to_string(&output)?;
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<order channel=\"web\">"));
    assert!(xml.contains("<customer>ACME</customer>"));
    assert!(xml.contains("<note><![CDATA[plain]]></note>"));
    assert!(xml.contains("<sku><![CDATA[B <2>]]></sku>"));

    Command::cargo_bin("kvxml")?
        .arg("read")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""channel": "web""#))
        .stdout(predicate::str::contains(r#""sku": "B <2>""#))
        .stdout(predicate::str::contains("empty").not());

    Command::cargo_bin("kvxml")?
        .arg("read")
        .arg(&output)
        .arg("--keep-empty")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""empty": {}"#));
    Ok(())
}

#[test]
fn test_write_append() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let output = tmp.path().join("log.xml");

    for _ in 0..2 {
        Command::cargo_bin("kvxml")?
            .args(["write", "--root", "entry", "--append", "--output"])
            .arg(&output)
            .write_stdin(r#"{"event":"start"}"#)
            .assert()
            .success();
    }

    let xml = fs::read_to_string(&output)?;
    assert_eq!(xml.matches("<entry>").count(), 2);
    Ok(())
}

#[test]
fn test_read_reports_diagnostic() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("broken.xml");
    fs::write(&path, "<root><a></b></root>")?;

    Command::cargo_bin("kvxml")?
        .arg("read")
        .arg(&path)
        .args(["--retries", "1", "--retry-pause-ms", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("---------^"))
        .stderr(predicate::str::contains(
            "Fatal Error 76: Opening and ending tag mismatch: a and b",
        ));
    Ok(())
}

#[test]
fn test_read_directory_is_not_a_file() -> TestResult {
    let tmp = tempfile::tempdir()?;

    Command::cargo_bin("kvxml")?
        .arg("read")
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("because: Not a file"));
    Ok(())
}

#[test]
fn test_invalid_attribute_argument() -> TestResult {
    Command::cargo_bin("kvxml")?
        .args(["write", "--root", "r", "--output", "x.xml", "--attr", "novalue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected NAME=VALUE"));
    Ok(())
}
