//! This bench test simulates reconciling a large locked file: parsing every
//! line, validating the metadata, and writing the file back out.

#![allow(missing_docs)]

use std::{fmt::Write as _, hint::black_box};

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use reqsync::{GeneratorCredit, Layout, ParsedLine, Reconciler, domain::Extensions};
use tempfile::TempDir;

/// Generates a declaration and a locked file with `count` packages.
fn preseed_directory(count: usize) -> TempDir {
    let tmp_dir = TempDir::new().unwrap();
    let mut declaration = String::new();
    let mut locked = String::from("#\n#    pip-compile --output-file=base.txt base.in\n#\n");
    for i in 0..count {
        writeln!(declaration, "package-{i}[extra]>=1.0  # reason {i}").unwrap();
        writeln!(locked, "package-{i}[extra]=={i}.0.0\n    # via -r base.in").unwrap();
    }
    std::fs::write(tmp_dir.path().join("base.in"), declaration).unwrap();
    std::fs::write(tmp_dir.path().join("base.txt"), locked).unwrap();
    tmp_dir
}

fn parse_lines(c: &mut Criterion) {
    c.bench_function("parse lines", |b| {
        b.iter(|| {
            black_box(ParsedLine::parse(
                "cryptography[ssh,pkcs11]~=42.0.5  # security fixes",
            ));
            black_box(ParsedLine::parse("    # via requests"));
        });
    });
}

fn reconcile(c: &mut Criterion) {
    c.bench_function("reconcile 1000 packages", |b| {
        b.iter_batched(
            || preseed_directory(1000),
            |tmp_dir| {
                Reconciler::new(
                    Layout::in_place(tmp_dir.path().to_path_buf(), Extensions::default()),
                    GeneratorCredit::default(),
                )
                .run(&["base".to_string()], None)
                .unwrap();
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, parse_lines, reconcile);
criterion_main!(benches);
