//! Document Export Benchmarks
//!
//! Performance benchmarks for writing and reading back `.docx` exports.
//!
//! Run with: `cargo bench --bench document_export`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use ocr_extractor::docx::{read_sections, DocumentWriter, DocxWriter, Section};

/// Sections resembling a batch of scanned pages
fn create_sections(count: usize, lines_per_section: usize) -> Vec<Section> {
    (0..count)
        .map(|i| {
            let lines = (0..lines_per_section)
                .map(|l| format!("Line {} of page {}: the quick brown fox jumps over the lazy dog", l, i))
                .collect();
            Section::new(format!("scan_{:04}.png", i), lines)
        })
        .collect()
}

fn bench_build_document(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_document");
    let writer = DocxWriter::default();

    for count in [1usize, 10, 100] {
        let sections = create_sections(count, 40);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &sections, |b, sections| {
            b.iter(|| writer.build_document(black_box(sections)).unwrap())
        });
    }

    group.finish();
}

fn bench_read_sections(c: &mut Criterion) {
    let bytes = DocxWriter::default()
        .build_document(&create_sections(100, 40))
        .unwrap();

    c.bench_function("read_sections_100", |b| {
        b.iter(|| read_sections(black_box(&bytes)).unwrap())
    });
}

criterion_group!(benches, bench_build_document, bench_read_sections);
criterion_main!(benches);
