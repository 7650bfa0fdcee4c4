use std::path::Path;

use boxing_bench::core::{ArtifactKind, Strategy, TypeSetCatalog};
use boxing_bench::engine::{CompileRequest, CompilerPreset, MatrixGenerator, render_args};

fn generator(preset: CompilerPreset) -> MatrixGenerator {
    MatrixGenerator::new(TypeSetCatalog::standard(), preset, "/src", "/out")
}

#[test]
fn standard_matrix_shape() {
    let jobs = generator(CompilerPreset::Go).generate().unwrap();
    assert_eq!(jobs.len(), 22);

    let boxed: Vec<_> = jobs.iter().filter(|j| j.strategy == Strategy::Boxed).collect();
    assert_eq!(boxed.len(), 2);
    assert!(boxed.iter().all(|j| j.selector == "no_int"));

    for strategy in [Strategy::Generic, Strategy::Typed] {
        let ks: Vec<usize> = jobs
            .iter()
            .filter(|j| j.strategy == strategy && j.kind == ArtifactKind::Library)
            .map(|j| j.cardinality())
            .collect();
        assert_eq!(ks, vec![1, 2, 3, 4, 5]);
    }

    let mut outputs: Vec<_> = jobs.iter().map(|j| j.output_path.clone()).collect();
    outputs.sort();
    outputs.dedup();
    assert_eq!(outputs.len(), jobs.len());
}

#[test]
fn baseline_and_kind_filters() {
    let jobs = generator(CompilerPreset::Go)
        .with_baseline(true)
        .with_kinds(&[ArtifactKind::Library])
        .generate()
        .unwrap();
    assert_eq!(jobs.len(), 13);
    assert!(jobs.iter().all(|j| j.kind == ArtifactKind::Library));
    assert_eq!(jobs.iter().filter(|j| j.cardinality() == 0).count(), 3);
}

#[test]
fn go_command_line() {
    let jobs = generator(CompilerPreset::Go).generate().unwrap();
    let job = jobs
        .iter()
        .find(|j| j.strategy == Strategy::Generic && j.cardinality() == 2)
        .unwrap();
    let args = render_args(&CompilerPreset::Go.args_template(), &CompileRequest::from_job(job));
    assert_eq!(
        args,
        vec![
            "build",
            "-a",
            "-tags",
            "int,int8",
            "-o",
            "/out/generic-2-types.bin",
            "/src/lists/generic/cmd",
        ]
    );
}

#[test]
fn rustc_command_line() {
    let jobs = generator(CompilerPreset::Rustc).generate().unwrap();
    let job = jobs
        .iter()
        .find(|j| {
            j.strategy == Strategy::Typed && j.cardinality() == 2 && j.kind == ArtifactKind::Library
        })
        .unwrap();
    assert_eq!(job.target, Path::new("/src/typed.rs"));
    let args = render_args(
        &CompilerPreset::Rustc.args_template(),
        &CompileRequest::from_job(job),
    );
    let joined = args.join(" ");
    assert!(joined.contains("--crate-type rlib --cfg int --cfg int8 -o /out/typed-2-types.a"));
}
