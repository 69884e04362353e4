use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::fs;
use tempfile::TempDir;
use tfci_core::changes::{parse_changes, ChangeMode};
use tfci_core::{ClassifierConfig, PathClassifier};

fn create_tree(configs: usize) -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    for i in 0..configs {
        let root = dir.path().join(format!("configurations/config_{}", i));
        fs::create_dir_all(root.join("tests")).expect("create config");
        fs::write(root.join("main.tf"), "").expect("write main.tf");
        fs::write(root.join("tests/basic.tftest.hcl"), "").expect("write test");
    }
    fs::create_dir_all(dir.path().join("modules/network")).expect("create module");
    fs::write(dir.path().join("modules/network/main.tf"), "").expect("write module");
    dir
}

fn generate_changes(count: usize, configs: usize) -> String {
    (0..count)
        .map(|i| {
            let config = i % configs;
            match i % 4 {
                0 => format!("configurations/config_{}/main.tf", config),
                1 => format!("\"configurations/config_{}/tests/basic.tftest.hcl\"", config),
                2 => format!(" ./configurations/config_{}/main.tf ", config),
                _ => "README.md".to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn bench_parse_changes(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_changes");

    for count in [10, 100, 1000] {
        let raw = generate_changes(count, 50);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &raw, |b, raw| {
            b.iter(|| parse_changes(black_box(raw)).len());
        });
    }

    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify_items");
    let tree = create_tree(50);
    let config = ClassifierConfig {
        base_dir: tree.path().to_path_buf(),
        ..ClassifierConfig::default()
    };
    let classifier = PathClassifier::new(&config);

    for count in [10, 100, 500] {
        let raw = generate_changes(count, 50);
        let items = parse_changes(&raw);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("files", count), &items, |b, items| {
            b.iter(|| classifier.classify_items(black_box(items), ChangeMode::Files));
        });
    }

    let module_change = format!("modules/network/main.tf,{}", generate_changes(20, 50));
    let items = parse_changes(&module_change);
    group.bench_function("module_change", |b| {
        b.iter(|| classifier.classify_items(black_box(&items), ChangeMode::Files));
    });

    group.finish();
}

criterion_group!(benches, bench_parse_changes, bench_classify);
criterion_main!(benches);
