use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_dataset::{
    from_str, row, table_from_str, table_to_string, to_string, to_string_with_options,
    CodecOptions, Dataset, Table, WireFormat,
};

fn orders(size: usize) -> Table {
    let mut table = Table::new("Orders");
    for i in 0..size {
        table
            .append_row(row! {
                "IdOrder" => i as i64,
                "Customer" => format!("Customer {}", i),
                "Total" => 9.99 + i as f64,
                "Paid" => i % 2 == 0,
                "Tags" => ["web", "priority"],
            })
            .unwrap();
    }
    table.set_primary_key(["IdOrder"]).unwrap();
    for i in (0..size).step_by(3) {
        table
            .modify_row(i, row! { "IdOrder" => (i + size) as i64, "Paid" => true })
            .unwrap();
    }
    for i in (1..size).step_by(7) {
        table.delete_row(i).unwrap();
    }
    table
}

fn lines(order: i64, count: usize) -> Table {
    let mut table = Table::new("Lines");
    for i in 0..count {
        table
            .insert_row(row! { "IdOrder" => order, "Line" => i as i64, "Qty" => 1 })
            .unwrap();
    }
    table
}

fn benchmark_encode_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_table");

    for size in [10, 100, 1000].iter() {
        let table = orders(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &table, |b, table| {
            b.iter(|| table_to_string(black_box(table)))
        });
    }
    group.finish();
}

fn benchmark_decode_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_table");

    for size in [10, 100, 1000].iter() {
        let json = table_to_string(&orders(*size)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &json, |b, json| {
            b.iter(|| table_from_str("Orders", black_box(json)))
        });
    }
    group.finish();
}

fn benchmark_nested(c: &mut Criterion) {
    let mut table = Table::new("Orders");
    for i in 0..50 {
        table
            .insert_row(row! { "IdOrder" => i, "Lines" => lines(i, 5) })
            .unwrap();
    }
    let dataset: Dataset = [table].into_iter().collect();
    let json = to_string(&dataset).unwrap();

    c.bench_function("encode_nested", |b| b.iter(|| to_string(black_box(&dataset))));
    c.bench_function("decode_nested", |b| b.iter(|| from_str(black_box(&json))));
}

fn benchmark_wire_formats(c: &mut Criterion) {
    let dataset: Dataset = [orders(200)].into_iter().collect();
    let legacy = CodecOptions::default().with_wire_format(WireFormat::Legacy);

    let mut group = c.benchmark_group("wire_format");

    group.bench_function("nested_encode", |b| {
        b.iter(|| to_string(black_box(&dataset)))
    });

    group.bench_function("legacy_encode", |b| {
        b.iter(|| to_string_with_options(black_box(&dataset), legacy.clone()))
    });

    group.bench_function("pretty_encode", |b| {
        b.iter(|| to_string_with_options(black_box(&dataset), CodecOptions::pretty()))
    });

    group.finish();
}

fn benchmark_comparison_with_serde_json(c: &mut Criterion) {
    let dataset: Dataset = [orders(200)].into_iter().collect();
    let json = to_string(&dataset).unwrap();

    let mut group = c.benchmark_group("comparison");

    group.bench_function("native_decode", |b| b.iter(|| from_str(black_box(&json))));

    group.bench_function("serde_json_decode", |b| {
        b.iter(|| serde_json::from_str::<Dataset>(black_box(&json)))
    });

    group.bench_function("untyped_json_decode", |b| {
        b.iter(|| serde_json::from_str::<serde_json::Value>(black_box(&json)))
    });

    group.finish();
}

fn benchmark_roundtrip(c: &mut Criterion) {
    let dataset: Dataset = [orders(100)].into_iter().collect();

    c.bench_function("roundtrip_changes", |b| {
        b.iter(|| {
            let serialized = to_string(black_box(&dataset)).unwrap();
            let _decoded: Dataset = from_str(black_box(&serialized)).unwrap();
        })
    });
}

criterion_group!(
    benches,
    benchmark_encode_table,
    benchmark_decode_table,
    benchmark_nested,
    benchmark_wire_formats,
    benchmark_comparison_with_serde_json,
    benchmark_roundtrip
);
criterion_main!(benches);
