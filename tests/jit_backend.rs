//! Compiled tree backend against the interpreted one.
//!
//! Tests needing a working C compiler return early when none is found.

#![cfg(feature = "jit")]

use jit_trees::*;

mod common;
use common::*;

fn fit(backend: TreeBackendKind) -> GradientBoosting {
    let (features, labels) = create_test_data!(regression, 150, 3);
    let mut model = GradientBoosting::new(create_test_model_config(backend, false)).unwrap();
    model
        .fit(
            features.view(),
            labels.view(),
            features.view(),
            labels.view(),
            &create_test_training_config(8, 3),
        )
        .unwrap();
    model
}

#[test]
fn test_compiled_matches_interpreted() {
    if !jit_available() {
        eprintln!("skipping: no C compiler available");
        return;
    }
    let reference = fit(TreeBackendKind::Interpreted);
    let (features, _) = create_test_data!(regression, 60, 3);
    let expected = reference.predict_batch(features.view()).unwrap();

    for style in [SourceStyle::IfElse, SourceStyle::Loop] {
        let compiled = fit(TreeBackendKind::compiled(style));
        assert_eq!(compiled.tree_count(), reference.tree_count());
        assert_eq!(compiled.predict_batch(features.view()).unwrap(), expected);
        for (i, row) in features.rows().into_iter().enumerate().take(10) {
            let sample = row.to_vec();
            assert_eq!(compiled.predict(&sample).unwrap(), expected[i]);
            assert_eq!(
                compiled.predict_from_to(&sample, 2, 5).unwrap(),
                reference.predict_from_to(&sample, 2, 5).unwrap()
            );
        }
    }
}

#[test]
fn test_compiled_backend_loads_saved_model() {
    if !jit_available() {
        eprintln!("skipping: no C compiler available");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.txt");
    let reference = fit(TreeBackendKind::Interpreted);
    reference.save_model(&path).unwrap();

    let config = create_test_model_config(TreeBackendKind::compiled(SourceStyle::Loop), false);
    let compiled = GradientBoosting::load(&path, config).unwrap();
    let (features, _) = create_test_data!(regression, 30, 3);
    assert_eq!(
        compiled.predict_batch(features.view()).unwrap(),
        reference.predict_batch(features.view()).unwrap()
    );
}

#[test]
fn test_scratch_directory_is_removed_on_drop() {
    if !jit_available() {
        eprintln!("skipping: no C compiler available");
        return;
    }
    let model = fit(TreeBackendKind::compiled(SourceStyle::IfElse));
    let dir = model
        .predictor()
        .unwrap()
        .holder()
        .scratch_dir()
        .unwrap()
        .to_path_buf();
    assert!(dir.is_dir());
    assert!(std::fs::read_dir(&dir).unwrap().count() >= 2 * model.tree_count());
    drop(model);
    assert!(!dir.exists());
}

#[test]
fn test_missing_compiler_fails_fit() {
    let backend = TreeBackendKind::Compiled {
        style: SourceStyle::IfElse,
        compiler: Some("jit-trees-no-such-compiler".to_string()),
    };
    let (features, labels) = create_test_data!(step);
    let mut model = GradientBoosting::new(create_test_model_config(backend, false)).unwrap();
    let err = model
        .fit(
            features.view(),
            labels.view(),
            features.view(),
            labels.view(),
            &create_test_training_config(2, 1),
        )
        .unwrap_err();

    assert_eq!(err.category(), "compile");
    assert!(!model.is_fitted());
}
