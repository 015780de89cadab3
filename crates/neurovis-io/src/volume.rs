//! NIfTI volume loading
//!
//! Supports NIfTI-1 `.nii` and gzip-compressed `.nii.gz` files (gzip is
//! detected from the magic bytes, not the extension). Only the first 3-D
//! frame of a 4-D series is read.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use flate2::read::GzDecoder;
use ndarray::Array3;
use nifti::volume::{NiftiVolume, RandomAccessNiftiVolume};
use nifti::{InMemNiftiObject, NiftiHeader, NiftiObject};

use crate::affine::{affine_from_quaternion, Affine};
use crate::error::{IoError, IoResult};

/// A 3-D scalar volume with its voxel-to-world transform
#[derive(Clone, Debug)]
pub struct Volume {
    /// Voxel values indexed `[i, j, k]`
    pub data: Array3<f64>,
    /// Voxel-to-world transform
    pub affine: Affine,
}

impl Volume {
    pub fn new(data: Array3<f64>, affine: Affine) -> Self {
        Self { data, affine }
    }

    /// Volume shape `(nx, ny, nz)`
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Whether every voxel is NaN (an empty volume counts as all-NaN)
    pub fn is_all_nan(&self) -> bool {
        self.data.iter().all(|v| v.is_nan())
    }

    /// Replace the voxel data, keeping the affine
    pub fn with_data(&self, data: Array3<f64>) -> Self {
        Self::new(data, self.affine.clone())
    }

    /// World-space bounding box of the voxel centres, `(min, max)` per axis
    pub fn world_bounds(&self) -> ([f64; 3], [f64; 3]) {
        let (nx, ny, nz) = self.dim();
        let hi = [
            nx.saturating_sub(1) as f64,
            ny.saturating_sub(1) as f64,
            nz.saturating_sub(1) as f64,
        ];

        let mut min = [f64::INFINITY; 3];
        let mut max = [f64::NEG_INFINITY; 3];
        for corner in 0..8 {
            let ijk = [
                if corner & 1 == 0 { 0.0 } else { hi[0] },
                if corner & 2 == 0 { 0.0 } else { hi[1] },
                if corner & 4 == 0 { 0.0 } else { hi[2] },
            ];
            let w = self.affine.voxel_to_world(ijk);
            for axis in 0..3 {
                min[axis] = min[axis].min(w[axis]);
                max[axis] = max[axis].max(w[axis]);
            }
        }
        (min, max)
    }

    /// Value of the voxel nearest to a world position, `None` outside the grid
    pub fn sample_nearest(&self, xyz: [f64; 3]) -> Option<f64> {
        let ijk = self.affine.world_to_voxel(xyz)?;
        self.value_at_index(ijk)
    }

    /// Value of the voxel nearest to a fractional index, `None` outside the grid
    pub fn value_at_index(&self, ijk: [f64; 3]) -> Option<f64> {
        let (nx, ny, nz) = self.dim();
        let dims = [nx, ny, nz];
        let mut idx = [0usize; 3];
        for axis in 0..3 {
            let r = ijk[axis].round();
            if !(r >= 0.0) || r as usize >= dims[axis] {
                return None;
            }
            idx[axis] = r as usize;
        }
        Some(self.data[idx])
    }
}

fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0x1f && bytes[1] == 0x8b
}

fn read_object(path: &Path) -> IoResult<InMemNiftiObject> {
    if !path.exists() {
        return Err(IoError::FileNotFound(path.to_path_buf()));
    }

    let bytes = fs::read(path).map_err(|e| IoError::OpenFailed(format!("{}: {}", path.display(), e)))?;

    let obj = if is_gzip(&bytes) {
        InMemNiftiObject::from_reader(GzDecoder::new(Cursor::new(bytes)))
    } else {
        InMemNiftiObject::from_reader(Cursor::new(bytes))
    };

    obj.map_err(|e| IoError::InvalidFormat(format!("{}: {}", path.display(), e)))
}

/// Voxel-to-world transform stored in a NIfTI header
///
/// The sform is preferred when present, then the qform; without either the
/// voxel sizes from `pixdim` are used on an axis-aligned grid.
pub fn header_affine(header: &NiftiHeader) -> Affine {
    if header.sform_code > 0 {
        let row = |r: &[f32; 4]| [r[0] as f64, r[1] as f64, r[2] as f64, r[3] as f64];
        return Affine::from_rows([row(&header.srow_x), row(&header.srow_y), row(&header.srow_z)]);
    }

    let pixdim = header.pixdim;
    let voxel_size = [pixdim[1] as f64, pixdim[2] as f64, pixdim[3] as f64];

    if header.qform_code > 0 {
        return affine_from_quaternion(
            [
                header.quatern_b as f64,
                header.quatern_c as f64,
                header.quatern_d as f64,
            ],
            [
                header.quatern_x as f64,
                header.quatern_y as f64,
                header.quatern_z as f64,
            ],
            voxel_size,
            pixdim[0] as f64,
        );
    }

    Affine::scaling(voxel_size, [0.0; 3])
}

/// Load a 3-D volume and its affine
pub fn load_volume(path: impl AsRef<Path>) -> IoResult<Volume> {
    let path = path.as_ref();
    let obj = read_object(path)?;
    let affine = header_affine(obj.header());

    let volume = obj.volume();
    let dim = volume.dim();
    if dim.len() < 3 {
        return Err(IoError::Unsupported(format!(
            "expected at least a 3-D volume, got {}-D",
            dim.len()
        )));
    }

    let (nx, ny, nz) = (dim[0] as usize, dim[1] as usize, dim[2] as usize);
    let mut coords = vec![0u16; dim.len()];
    let mut data = Array3::<f64>::zeros((nx, ny, nz));

    for ((i, j, k), slot) in data.indexed_iter_mut() {
        coords[0] = i as u16;
        coords[1] = j as u16;
        coords[2] = k as u16;
        *slot = volume
            .get_f64(&coords)
            .map_err(|e| IoError::InvalidFormat(e.to_string()))?;
    }

    tracing::debug!(path = %path.display(), nx, ny, nz, "loaded volume");
    Ok(Volume::new(data, affine))
}

/// Read only the affine of a volume
pub fn get_affine(path: impl AsRef<Path>) -> IoResult<Affine> {
    let obj = read_object(path.as_ref())?;
    Ok(header_affine(obj.header()))
}
