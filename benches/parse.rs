use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use flowdoc::mapping::extract_models;
use flowdoc::{binary, from_str, from_str_with_model, to_string, BinaryOptions};

const MODEL_HEADER: &str = "\
$models:
  Reading:
    fields:
      sensor:
        alias = s
        id = 1
      temperature:
        alias = t
        type = float
        id = 2
      taken:
        alias = at
        type = datetime
        id = 3
use_model = Reading
";

fn document(records: usize) -> String {
    let mut text = String::from(MODEL_HEADER);
    for i in 0..records {
        text.push_str(&format!(
            "r{}:\n  s = S-{}\n  t = {}.5\n  at = 2025-01-01T00:00:{:02}\n  tags = [lab, \"bay {}\"]\n",
            i,
            i,
            i,
            i % 60,
            i % 4
        ));
    }
    text
}

fn benchmark_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for size in [10, 100, 500].iter() {
        let text = document(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| from_str(black_box(text)))
        });
    }
    group.finish();
}

fn benchmark_parse_with_model(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_with_model");

    for size in [10, 100, 500].iter() {
        let text = document(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| from_str_with_model(black_box(text), None))
        });
    }
    group.finish();
}

fn benchmark_serialize(c: &mut Criterion) {
    let value = from_str_with_model(&document(100), None).unwrap();

    c.bench_function("serialize_100_records", |b| {
        b.iter(|| to_string(black_box(&value)))
    });
}

fn benchmark_binary(c: &mut Criterion) {
    let text = document(100);
    let value = from_str_with_model(&text, None).unwrap();
    let registry = extract_models(&from_str(&text)).unwrap();
    let model = registry.get("Reading").unwrap();
    let options = BinaryOptions::new().with_field_ids(true);

    let mut group = c.benchmark_group("binary");
    group.bench_function("encode_plain", |b| b.iter(|| binary::to_vec(black_box(&value))));
    group.bench_function("encode_field_ids", |b| {
        b.iter(|| binary::to_vec_with_model(black_box(&value), model, &options))
    });

    let compact = binary::to_vec_with_model(&value, model, &options).unwrap();
    group.bench_function("decode_field_ids", |b| {
        b.iter(|| binary::from_slice_with_model(black_box(&compact), model))
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_parse,
    benchmark_parse_with_model,
    benchmark_serialize,
    benchmark_binary
);
criterion_main!(benches);
