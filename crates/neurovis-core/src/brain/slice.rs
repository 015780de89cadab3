//! Resampling volumes onto cut planes
//!
//! Cuts are taken in world space, so volumes with different grids (the
//! statistical map and its template) line up. Each plane is sampled with
//! nearest-neighbour lookup on a square grid.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use neurovis_io::Volume;

/// Orientation of a cut, named by the world axis it is perpendicular to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CutAxis {
    /// Perpendicular to x
    Sagittal,
    /// Perpendicular to y
    Coronal,
    /// Perpendicular to z
    Axial,
}

impl CutAxis {
    pub const ALL: [CutAxis; 3] = [CutAxis::Sagittal, CutAxis::Coronal, CutAxis::Axial];

    /// World axis the cut is perpendicular to
    pub fn world_axis(&self) -> usize {
        match self {
            CutAxis::Sagittal => 0,
            CutAxis::Coronal => 1,
            CutAxis::Axial => 2,
        }
    }

    /// World axes drawn horizontally and vertically
    pub fn in_plane(&self) -> (usize, usize) {
        match self {
            CutAxis::Sagittal => (1, 2),
            CutAxis::Coronal => (0, 2),
            CutAxis::Axial => (0, 1),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CutAxis::Sagittal => "sagittal",
            CutAxis::Coronal => "coronal",
            CutAxis::Axial => "axial",
        }
    }

    /// Coordinate letter, as in "x=12"
    pub fn letter(&self) -> char {
        match self {
            CutAxis::Sagittal => 'x',
            CutAxis::Coronal => 'y',
            CutAxis::Axial => 'z',
        }
    }
}

/// A square sampling grid in the plane of a cut
#[derive(Clone, Debug, PartialEq)]
pub struct PlaneGrid {
    pub axis: CutAxis,
    /// World position of sample `(0, 0)` along the in-plane axes
    pub origin: (f64, f64),
    /// Sample spacing in millimetres
    pub step: f64,
    /// `(columns, rows)`
    pub size: (usize, usize),
}

impl PlaneGrid {
    /// Grid covering a world bounding box
    pub fn covering(axis: CutAxis, min: [f64; 3], max: [f64; 3], step: f64) -> Self {
        let step = if step > 0.0 && step.is_finite() { step } else { 1.0 };
        let (u, v) = axis.in_plane();
        let count = |a: usize| (((max[a] - min[a]) / step).round().max(0.0) as usize) + 1;
        Self {
            axis,
            origin: (min[u], min[v]),
            step,
            size: (count(u), count(v)),
        }
    }

    /// `(left, right, bottom, top)` covered by the samples' cells
    pub fn extent(&self) -> [f64; 4] {
        let half = self.step / 2.0;
        let (cols, rows) = self.size;
        [
            self.origin.0 - half,
            self.origin.0 + self.step * cols as f64 - half,
            self.origin.1 - half,
            self.origin.1 + self.step * rows as f64 - half,
        ]
    }

    /// World point of sample `(row, col)` on the cut at `coord`
    pub fn world_point(&self, row: usize, col: usize, coord: f64) -> [f64; 3] {
        let (u, v) = self.axis.in_plane();
        let mut p = [0.0; 3];
        p[self.axis.world_axis()] = coord;
        p[u] = self.origin.0 + self.step * col as f64;
        p[v] = self.origin.1 + self.step * row as f64;
        p
    }

    /// Nearest-neighbour values of `volume` on the cut, NaN outside it
    ///
    /// Rows run upwards along the vertical in-plane axis.
    pub fn sample(&self, volume: &Volume, coord: f64) -> Array2<f64> {
        let (cols, rows) = self.size;
        Array2::from_shape_fn((rows, cols), |(row, col)| {
            volume
                .sample_nearest(self.world_point(row, col, coord))
                .unwrap_or(f64::NAN)
        })
    }

    /// Largest absolute value along the cut axis for every sample
    ///
    /// Samples no finite voxel projects onto stay NaN.
    pub fn project_max_abs(&self, volume: &Volume) -> Array2<f64> {
        let (cols, rows) = self.size;
        let (u, v) = self.axis.in_plane();
        let mut out = Array2::from_elem((rows, cols), f64::NAN);

        for ((i, j, k), value) in volume.data.indexed_iter() {
            if !value.is_finite() {
                continue;
            }
            let w = volume.affine.voxel_to_world([i as f64, j as f64, k as f64]);
            let col = ((w[u] - self.origin.0) / self.step).round();
            let row = ((w[v] - self.origin.1) / self.step).round();
            if col < 0.0 || row < 0.0 || col as usize >= cols || row as usize >= rows {
                continue;
            }
            let cell = &mut out[[row as usize, col as usize]];
            if cell.is_nan() || value.abs() > *cell {
                *cell = value.abs();
            }
        }
        out
    }
}

/// Bounding box enclosing both boxes
pub(crate) fn union_bounds(
    a: ([f64; 3], [f64; 3]),
    b: ([f64; 3], [f64; 3]),
) -> ([f64; 3], [f64; 3]) {
    (
        [0, 1, 2].map(|i| a.0[i].min(b.0[i])),
        [0, 1, 2].map(|i| a.1[i].max(b.1[i])),
    )
}

/// Finest voxel edge of a volume
pub(crate) fn sample_step(volume: &Volume) -> f64 {
    volume
        .affine
        .voxel_sizes()
        .into_iter()
        .filter(|s| *s > 0.0)
        .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use neurovis_io::Affine;

    fn ramp() -> Volume {
        let data = Array3::from_shape_fn((4, 5, 6), |(i, j, k)| (100 * i + 10 * j + k) as f64);
        Volume::new(data, Affine::scaling([2.0, 2.0, 2.0], [0.0, 0.0, 0.0]))
    }

    #[test]
    fn test_grid_covers_volume() {
        let vol = ramp();
        let (min, max) = vol.world_bounds();
        let grid = PlaneGrid::covering(CutAxis::Coronal, min, max, sample_step(&vol));
        assert_eq!(grid.size, (4, 6));
        assert_eq!(grid.extent(), [-1.0, 7.0, -1.0, 11.0]);
    }

    #[test]
    fn test_sample_axial_cut() {
        let vol = ramp();
        let (min, max) = vol.world_bounds();
        let grid = PlaneGrid::covering(CutAxis::Axial, min, max, 2.0);
        // z = 4 mm is k = 2
        let cut = grid.sample(&vol, 4.0);
        assert_eq!(cut.dim(), (5, 4));
        assert_eq!(cut[[3, 1]], 100.0 + 30.0 + 2.0);
    }

    #[test]
    fn test_sample_outside_is_nan() {
        let vol = ramp();
        let (min, max) = vol.world_bounds();
        let grid = PlaneGrid::covering(CutAxis::Sagittal, min, max, 2.0);
        assert!(grid.sample(&vol, 50.0).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_projection_takes_max_abs() {
        let mut data = Array3::<f64>::from_elem((3, 3, 3), f64::NAN);
        data[[1, 0, 2]] = -0.8;
        data[[1, 2, 2]] = 0.3;
        let vol = Volume::new(data, Affine::identity());
        let (min, max) = vol.world_bounds();
        let grid = PlaneGrid::covering(CutAxis::Coronal, min, max, 1.0);
        let proj = grid.project_max_abs(&vol);
        assert_eq!(proj[[2, 1]], 0.8);
        assert!(proj[[0, 0]].is_nan());
    }

    #[test]
    fn test_union_bounds() {
        let (min, max) = union_bounds(
            ([0.0, -5.0, 1.0], [4.0, 5.0, 2.0]),
            ([-1.0, 0.0, 0.0], [2.0, 6.0, 3.0]),
        );
        assert_eq!(min, [-1.0, -5.0, 0.0]);
        assert_eq!(max, [4.0, 6.0, 3.0]);
    }
}
