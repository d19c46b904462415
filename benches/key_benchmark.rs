//! Key construction and sniffing benchmarks

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use upstow::source::{sniff_extension, SourceDescriptor};
use upstow::storage::StorageOptions;

fn benchmark_compute_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_key");
    let now = Utc::now();

    let auto = StorageOptions {
        path_prefix: "img/".into(),
        auto_generate_path: true,
        ..Default::default()
    };
    group.bench_function("auto_path", |b| {
        b.iter(|| black_box(auto.compute_key("", "png", now)));
    });

    let append = StorageOptions {
        path_prefix: "img".into(),
        append_extension: true,
        insert_prefix_separator: true,
        ..Default::default()
    };
    group.bench_function("append_extension", |b| {
        b.iter(|| black_box(append.compute_key("avatars/42", "png", now)));
    });

    group.finish();
}

fn benchmark_sniff_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("sniff_sizes");

    for size in [16, 1024, 1024 * 1024].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(format!("{}_bytes", size), size, |b, &size| {
            let mut data = vec![0u8; size];
            data[..8].copy_from_slice(b"\x89PNG\r\n\x1a\n");
            b.iter(|| black_box(sniff_extension(&data)));
        });
    }

    group.bench_function("raw_content_descriptor", |b| {
        b.iter(|| black_box(SourceDescriptor::from_raw_content("hello world")));
    });

    group.finish();
}

criterion_group!(benches, benchmark_compute_key, benchmark_sniff_sizes);
criterion_main!(benches);
