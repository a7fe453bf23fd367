use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use kvxml::{encode_to_xml_text, reader::parse_str, Object, Value};

const SIMPLE_XML: &str = "<root><child>text</child></root>";
const ATTR_XML: &str = "<root id=\"1\" name='test'><item value=\"42\" /><item>x</item></root>";

fn catalog(items: i32) -> Object {
    let products: Vec<Value> = (0..items)
        .map(|i| {
            let mut product = Object::new();
            product.insert("@attributes", Object::from([("id", i)]));
            product.insert("name", format!("product {i}"));
            product.insert("price", f64::from(i) * 1.5);
            Value::from(product)
        })
        .collect();
    Object::from([("product", products)])
}

fn bench_decode_simple(c: &mut Criterion) {
    c.bench_function("kvxml_decode_simple", |b| {
        b.iter(|| parse_str(black_box(SIMPLE_XML)))
    });
}

fn bench_decode_attr(c: &mut Criterion) {
    c.bench_function("kvxml_decode_attr", |b| {
        b.iter(|| parse_str(black_box(ATTR_XML)))
    });
}

fn bench_encode_catalog(c: &mut Criterion) {
    let data = catalog(1_000);
    c.bench_function("kvxml_encode_catalog_1k", |b| {
        b.iter(|| encode_to_xml_text(black_box(&data), "catalog"))
    });
}

criterion_group!(
    benches,
    bench_decode_simple,
    bench_decode_attr,
    bench_encode_catalog
);
criterion_main!(benches);
