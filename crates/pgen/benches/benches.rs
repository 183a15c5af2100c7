use std::{env, fs, path::PathBuf};

use criterion::{criterion_group, criterion_main, Criterion};
use pgen::Config;

criterion_main!(benches);
criterion_group!(benches, bench_expressions, bench_languages);

fn bench_expressions(c: &mut Criterion) {
    bench_generate(c, "tests/grammars/arithmetic.grammar");
    bench_generate(c, "tests/grammars/assign.grammar");
}

fn bench_languages(c: &mut Criterion) {
    bench_generate(c, "tests/grammars/statements.grammar");
    bench_generate(c, "../../grammars/m.grammar");
}

fn bench_generate(c: &mut Criterion, path: &str) {
    let project_root = env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .expect("missing environment variable: `CARGO_MANIFEST_DIR'");
    let source = fs::read_to_string(project_root.join(path)).unwrap();
    let name = PathBuf::from(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut group = c.benchmark_group(name);
    group.bench_function("LALR", |b| {
        b.iter(|| Config::new().use_lalr().generate(&source));
    });
    group.bench_function("SLR", |b| {
        b.iter(|| Config::new().use_slr().generate(&source));
    });
    group.finish();
}
