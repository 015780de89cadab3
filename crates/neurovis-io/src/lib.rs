//! neurovis-io - Data I/O for RSA result visualization
//!
//! This crate loads the inputs the plotting layer works on:
//!
//! - **NIfTI**: 3-D statistical maps and template backgrounds (`.nii`, `.nii.gz`)
//! - **Affine**: voxel ↔ world transforms read from the volume header
//! - **Templates**: the bundled `ch2` / `ch2bet` background volumes
//! - **FreeSurfer**: pial meshes and sulcal depth maps for surface views
//! - **CSV**: plain numeric matrices (RDMs, channel × time arrays)
//!
//! # Design
//!
//! Loaders return owned, fully materialized data. Volumes are small enough
//! that there is no lazy access path.

pub mod affine;
pub mod error;
pub mod template;
pub mod volume;

#[cfg(feature = "csv")]
pub mod matrix_csv;

#[cfg(feature = "freesurfer")]
pub mod surface;

pub use affine::*;
pub use error::*;
pub use template::*;
pub use volume::*;

#[cfg(feature = "csv")]
pub use matrix_csv::*;

#[cfg(feature = "freesurfer")]
pub use surface::*;
