use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use precip_audit::analyzers::StatisticsEngine;
use precip_audit::processors::{Aggregator, StructuralValidator};
use precip_audit::readers::RecordParser;
use precip_audit::models::FileOutcome;
use std::path::Path;

// Whitespace-separated station-month lines, a sentinel every 17th day
fn create_test_content(stations: usize, years: usize) -> String {
    let mut content = String::new();
    let mut cell = 0usize;

    for station in 1..=stations {
        for year in 0..years {
            for month in 1..=12 {
                content.push_str(&format!("ST{:03} {} {}", station, 1990 + year, month));
                for day in 0..31 {
                    cell += 1;
                    if cell % 17 == 0 {
                        content.push_str(" -999");
                    } else {
                        content.push_str(&format!(" {:.1}", ((day * month) % 23) as f64 * 0.5));
                    }
                }
                content.push('\n');
            }
        }
    }

    content
}

fn benchmark_parser(c: &mut Criterion) {
    let parser = RecordParser::new();
    let mut group = c.benchmark_group("record_parser");

    for years in [1, 10, 50] {
        let content = create_test_content(1, years);
        group.bench_with_input(BenchmarkId::from_parameter(years), &content, |b, content| {
            b.iter(|| {
                parser
                    .parse_content(Path::new("bench.dat"), black_box(content))
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn benchmark_validation_and_statistics(c: &mut Criterion) {
    let content = create_test_content(5, 20);
    let table = RecordParser::new()
        .parse_content(Path::new("bench.dat"), &content)
        .unwrap();
    let validator = StructuralValidator::default();
    let engine = StatisticsEngine::new();

    c.bench_function("structural_validator", |b| {
        b.iter(|| validator.validate(black_box(&table)).unwrap())
    });

    let validated = validator.validate(&table).unwrap();
    c.bench_function("statistics_engine", |b| {
        b.iter(|| {
            engine
                .compute(Path::new("bench.dat"), black_box(&validated.records))
                .unwrap()
        })
    });
}

fn benchmark_aggregator(c: &mut Criterion) {
    let content = create_test_content(1, 10);
    let table = RecordParser::new()
        .parse_content(Path::new("bench.dat"), &content)
        .unwrap();
    let validated = StructuralValidator::default().validate(&table).unwrap();
    let statistics = StatisticsEngine::new()
        .compute(Path::new("bench.dat"), &validated.records)
        .unwrap();

    let outcomes: Vec<FileOutcome> = (0..500)
        .map(|i| {
            let mut report = validated.report.clone();
            let mut statistics = statistics.clone();
            report.source = format!("data/file_{:04}.dat", i).into();
            statistics.source = report.source.clone();
            FileOutcome::Processed { report, statistics }
        })
        .collect();

    let aggregator = Aggregator::new();
    c.bench_function("aggregate_500_files", |b| {
        b.iter(|| aggregator.aggregate(Path::new("data"), black_box(outcomes.clone())))
    });
}

criterion_group!(
    benches,
    benchmark_parser,
    benchmark_validation_and_statistics,
    benchmark_aggregator
);
criterion_main!(benches);
