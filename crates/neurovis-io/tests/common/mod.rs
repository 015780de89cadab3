//! Test fixture utilities: a minimal NIfTI-1 writer

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::write::GzEncoder;
use flate2::Compression;
use ndarray::Array3;

/// Encode a float32 NIfTI-1 single-file image with an sform affine
pub fn encode_nifti(data: &Array3<f64>, srow: [[f32; 4]; 3]) -> Vec<u8> {
    let (nx, ny, nz) = data.dim();
    let mut buf: Vec<u8> = Vec::with_capacity(352 + nx * ny * nz * 4);

    buf.write_i32::<LittleEndian>(348).unwrap();
    buf.extend_from_slice(&[0u8; 36]); // data_type .. dim_info

    for d in [3i16, nx as i16, ny as i16, nz as i16, 1, 1, 1, 1] {
        buf.write_i16::<LittleEndian>(d).unwrap();
    }
    for _ in 0..3 {
        buf.write_f32::<LittleEndian>(0.0).unwrap(); // intent_p1..p3
    }
    buf.write_i16::<LittleEndian>(0).unwrap(); // intent_code
    buf.write_i16::<LittleEndian>(16).unwrap(); // datatype: float32
    buf.write_i16::<LittleEndian>(32).unwrap(); // bitpix
    buf.write_i16::<LittleEndian>(0).unwrap(); // slice_start

    let pixdim = [1.0f32, srow[0][0].abs(), srow[1][1].abs(), srow[2][2].abs(), 1.0, 1.0, 1.0, 1.0];
    for p in pixdim {
        buf.write_f32::<LittleEndian>(p).unwrap();
    }
    buf.write_f32::<LittleEndian>(352.0).unwrap(); // vox_offset
    buf.write_f32::<LittleEndian>(1.0).unwrap(); // scl_slope
    buf.write_f32::<LittleEndian>(0.0).unwrap(); // scl_inter
    buf.write_i16::<LittleEndian>(0).unwrap(); // slice_end
    buf.write_u8(0).unwrap(); // slice_code
    buf.write_u8(10).unwrap(); // xyzt_units: mm + s
    buf.extend_from_slice(&[0u8; 24]); // cal_max .. glmin
    buf.extend_from_slice(&[0u8; 80]); // descrip
    buf.extend_from_slice(&[0u8; 24]); // aux_file
    buf.write_i16::<LittleEndian>(0).unwrap(); // qform_code
    buf.write_i16::<LittleEndian>(1).unwrap(); // sform_code
    buf.extend_from_slice(&[0u8; 24]); // quatern_b .. qoffset_z
    for row in srow {
        for v in row {
            buf.write_f32::<LittleEndian>(v).unwrap();
        }
    }
    buf.extend_from_slice(&[0u8; 16]); // intent_name
    buf.extend_from_slice(b"n+1\0");
    assert_eq!(buf.len(), 348);
    buf.extend_from_slice(&[0u8; 4]); // no extensions

    // Fortran order: i varies fastest
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                buf.write_f32::<LittleEndian>(data[[i, j, k]] as f32).unwrap();
            }
        }
    }
    buf
}

/// Write a volume to `path`, gzip-compressed when `gzip` is set
pub fn write_nifti(path: &Path, data: &Array3<f64>, srow: [[f32; 4]; 3], gzip: bool) {
    let bytes = encode_nifti(data, srow);
    let mut file = File::create(path).unwrap();
    if gzip {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&bytes).unwrap();
        file.write_all(&encoder.finish().unwrap()).unwrap();
    } else {
        file.write_all(&bytes).unwrap();
    }
}

/// 2 mm isotropic MNI-like sform
pub fn mni_2mm() -> [[f32; 4]; 3] {
    [
        [2.0, 0.0, 0.0, -90.0],
        [0.0, 2.0, 0.0, -126.0],
        [0.0, 0.0, 2.0, -72.0],
    ]
}
