//! Shared fixtures: synthetic result maps, a small NIfTI-1 writer and a
//! font probe for tests that render text

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::Path;

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use flate2::write::GzEncoder;
use flate2::Compression;
use ndarray::Array3;

use neurovis_core::{fonts, FontConfig};
use neurovis_io::{Affine, Volume};

/// Whether a system font is available for text rendering
pub fn fonts_available() -> bool {
    let found = fonts::find_font(&FontConfig::default()).is_some();
    if !found {
        eprintln!("no system font found; skipping text rendering test");
    }
    found
}

/// 3 mm sform with the grid centred near the origin
pub fn srow_3mm() -> [[f32; 4]; 3] {
    [
        [3.0, 0.0, 0.0, -30.0],
        [0.0, 3.0, 0.0, -36.0],
        [0.0, 0.0, 3.0, -24.0],
    ]
}

pub fn affine_from_srow(srow: [[f32; 4]; 3]) -> Affine {
    Affine::from_rows(srow.map(|row| row.map(f64::from)))
}

/// A 21 × 25 × 17 map with one large positive cluster, one small negative
/// cluster and a NaN border slab
pub fn result_map() -> Volume {
    let mut data = Array3::<f64>::zeros((21, 25, 17));
    for i in 8..14 {
        for j in 10..16 {
            for k in 6..11 {
                data[[i, j, k]] = 0.7;
            }
        }
    }
    data[[3, 3, 3]] = -0.4;
    data[[3, 4, 3]] = -0.5;
    for j in 0..25 {
        for k in 0..17 {
            data[[20, j, k]] = f64::NAN;
        }
    }
    Volume::new(data, affine_from_srow(srow_3mm()))
}

/// A smooth blob standing in for a template head
pub fn template_volume() -> Volume {
    let data = Array3::from_shape_fn((21, 25, 17), |(i, j, k)| {
        let d = (i as f64 - 10.0).powi(2) + (j as f64 - 12.0).powi(2) + (k as f64 - 8.0).powi(2);
        (100.0 - d).max(0.0)
    });
    Volume::new(data, affine_from_srow(srow_3mm()))
}

/// Write a float32 NIfTI-1 image with an sform, gzip-compressed
pub fn write_nifti_gz(path: &Path, data: &Array3<f64>, srow: [[f32; 4]; 3]) {
    let (nx, ny, nz) = data.dim();
    let mut buf: Vec<u8> = Vec::with_capacity(352 + nx * ny * nz * 4);

    buf.write_i32::<LittleEndian>(348).unwrap();
    buf.extend_from_slice(&[0u8; 36]);
    for d in [3i16, nx as i16, ny as i16, nz as i16, 1, 1, 1, 1] {
        buf.write_i16::<LittleEndian>(d).unwrap();
    }
    buf.extend_from_slice(&[0u8; 12]); // intent_p1..p3
    buf.write_i16::<LittleEndian>(0).unwrap(); // intent_code
    buf.write_i16::<LittleEndian>(16).unwrap(); // float32
    buf.write_i16::<LittleEndian>(32).unwrap(); // bitpix
    buf.write_i16::<LittleEndian>(0).unwrap(); // slice_start
    for p in [1.0f32, srow[0][0], srow[1][1], srow[2][2], 1.0, 1.0, 1.0, 1.0] {
        buf.write_f32::<LittleEndian>(p).unwrap();
    }
    buf.write_f32::<LittleEndian>(352.0).unwrap(); // vox_offset
    buf.write_f32::<LittleEndian>(1.0).unwrap(); // scl_slope
    buf.write_f32::<LittleEndian>(0.0).unwrap(); // scl_inter
    buf.write_i16::<LittleEndian>(0).unwrap(); // slice_end
    buf.write_u8(0).unwrap(); // slice_code
    buf.write_u8(10).unwrap(); // mm + s
    buf.extend_from_slice(&[0u8; 24 + 80 + 24]); // cal_max .. aux_file
    buf.write_i16::<LittleEndian>(0).unwrap(); // qform_code
    buf.write_i16::<LittleEndian>(1).unwrap(); // sform_code
    buf.extend_from_slice(&[0u8; 24]); // quaternion
    for row in srow {
        for v in row {
            buf.write_f32::<LittleEndian>(v).unwrap();
        }
    }
    buf.extend_from_slice(&[0u8; 16]); // intent_name
    buf.extend_from_slice(b"n+1\0");
    assert_eq!(buf.len(), 348);
    buf.extend_from_slice(&[0u8; 4]);

    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                buf.write_f32::<LittleEndian>(data[[i, j, k]] as f32).unwrap();
            }
        }
    }

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&buf).unwrap();
    File::create(path)
        .unwrap()
        .write_all(&encoder.finish().unwrap())
        .unwrap();
}

/// Write a FreeSurfer triangle surface (big-endian, "created by" header)
pub fn write_fs_surface(path: &Path, vertices: &[[f32; 3]], faces: &[[i32; 3]]) {
    let mut buf: Vec<u8> = vec![0xff, 0xff, 0xfe];
    buf.extend_from_slice(b"created by neurovis tests\n\n");
    buf.write_i32::<BigEndian>(vertices.len() as i32).unwrap();
    buf.write_i32::<BigEndian>(faces.len() as i32).unwrap();
    for v in vertices.iter().flatten() {
        buf.write_f32::<BigEndian>(*v).unwrap();
    }
    for f in faces.iter().flatten() {
        buf.write_i32::<BigEndian>(*f).unwrap();
    }
    File::create(path).unwrap().write_all(&buf).unwrap();
}

/// Write a FreeSurfer "new format" per-vertex curvature file
pub fn write_fs_curv(path: &Path, values: &[f32], faces: usize) {
    let mut buf: Vec<u8> = vec![0xff, 0xff, 0xff];
    buf.write_i32::<BigEndian>(values.len() as i32).unwrap();
    buf.write_i32::<BigEndian>(faces as i32).unwrap();
    buf.write_i32::<BigEndian>(1).unwrap();
    for v in values {
        buf.write_f32::<BigEndian>(*v).unwrap();
    }
    File::create(path).unwrap().write_all(&buf).unwrap();
}
