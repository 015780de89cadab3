//! Round-trip tests for NIfTI loading, templates and CSV matrices

mod common;

use std::fs;

use ndarray::{array, Array3};
use neurovis_io::{
    get_affine, load_matrix, load_matrix_with_delimiter, load_volume, locate, write_matrix,
    IoError, TemplateAsset,
};
use tempfile::TempDir;

fn ramp() -> Array3<f64> {
    Array3::from_shape_fn((4, 5, 3), |(i, j, k)| (i + 10 * j + 100 * k) as f64 * 0.5)
}

#[test]
fn test_load_uncompressed_volume() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("map.nii");
    common::write_nifti(&path, &ramp(), common::mni_2mm(), false);

    let volume = load_volume(&path).unwrap();
    assert_eq!(volume.dim(), (4, 5, 3));
    assert_eq!(volume.data, ramp());
    assert_eq!(volume.affine.voxel_to_world([45.0, 63.0, 36.0]), [0.0, 0.0, 0.0]);
}

#[test]
fn test_load_gzip_volume() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("map.nii.gz");
    common::write_nifti(&path, &ramp(), common::mni_2mm(), true);

    let volume = load_volume(&path).unwrap();
    assert_eq!(volume.data, ramp());
}

#[test]
fn test_gzip_detected_by_content() {
    // compressed bytes behind a plain .nii name still load
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("misnamed.nii");
    common::write_nifti(&path, &ramp(), common::mni_2mm(), true);

    assert_eq!(load_volume(&path).unwrap().data, ramp());
}

#[test]
fn test_nan_voxels_survive() {
    let mut data = ramp();
    data[[1, 2, 0]] = f64::NAN;
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nan.nii");
    common::write_nifti(&path, &data, common::mni_2mm(), false);

    let volume = load_volume(&path).unwrap();
    assert!(volume.data[[1, 2, 0]].is_nan());
    assert_eq!(volume.data[[1, 2, 1]], data[[1, 2, 1]]);
}

#[test]
fn test_get_affine() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("map.nii.gz");
    common::write_nifti(&path, &ramp(), common::mni_2mm(), true);

    let rows = get_affine(&path).unwrap().to_rows();
    assert_eq!(rows[0], [2.0, 0.0, 0.0, -90.0]);
    assert_eq!(rows[1], [0.0, 2.0, 0.0, -126.0]);
    assert_eq!(rows[2], [0.0, 0.0, 2.0, -72.0]);
    assert_eq!(rows[3], [0.0, 0.0, 0.0, 1.0]);
}

#[test]
fn test_garbage_file_is_invalid_format() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("junk.nii");
    fs::write(&path, b"definitely not a nifti header").unwrap();

    assert!(matches!(load_volume(&path), Err(IoError::InvalidFormat(_))));
}

#[test]
fn test_locate_existing_template() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ch2bet.nii.gz");
    common::write_nifti(&path, &ramp(), common::mni_2mm(), true);

    assert_eq!(locate(TemplateAsset::Ch2Bet, Some(dir.path())).unwrap(), path);
    assert!(matches!(
        locate(TemplateAsset::Ch2, Some(dir.path())),
        Err(IoError::TemplateMissing { .. })
    ));
}

#[test]
fn test_matrix_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rdm.csv");
    let rdm = array![[0.0, 0.25, 0.5], [0.25, 0.0, 0.75], [0.5, 0.75, 0.0]];

    write_matrix(&path, rdm.view()).unwrap();
    assert_eq!(load_matrix(&path).unwrap(), rdm);
}

#[test]
fn test_matrix_accepts_whitespace_and_nan() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("m.tsv");
    fs::write(&path, "1\t nan\n 2.5\t-3\n").unwrap();

    let m = load_matrix_with_delimiter(&path, b'\t').unwrap();
    assert_eq!(m.dim(), (2, 2));
    assert_eq!(m[[0, 0]], 1.0);
    assert!(m[[0, 1]].is_nan());
    assert_eq!(m[[1, 1]], -3.0);
}

#[test]
fn test_ragged_matrix_reports_line() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ragged.csv");
    fs::write(&path, "1,2,3\n4,5\n").unwrap();

    match load_matrix(&path) {
        Err(IoError::Csv { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected csv error, got {:?}", other),
    }
}

#[test]
fn test_non_numeric_field() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("text.csv");
    fs::write(&path, "1,2\n3,abc\n").unwrap();

    assert!(matches!(load_matrix(&path), Err(IoError::Csv { line: 2, .. })));
}

#[test]
fn test_empty_matrix() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.csv");
    fs::write(&path, "").unwrap();

    assert!(matches!(load_matrix(&path), Err(IoError::InvalidFormat(_))));
}
