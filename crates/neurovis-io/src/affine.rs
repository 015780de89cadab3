//! Voxel ↔ world coordinate transforms
//!
//! An affine is a 4×4 homogeneous matrix mapping voxel indices `(i, j, k)` to
//! world coordinates `(x, y, z)` in millimetres.

use nalgebra::{Matrix3, Matrix4, Vector3, Vector4};

/// A voxel-to-world affine transform
#[derive(Clone, Debug, PartialEq)]
pub struct Affine {
    matrix: Matrix4<f64>,
}

impl Affine {
    /// Wrap a homogeneous matrix
    pub fn new(matrix: Matrix4<f64>) -> Self {
        Self { matrix }
    }

    /// The identity transform (1 mm isotropic voxels at the origin)
    pub fn identity() -> Self {
        Self::new(Matrix4::identity())
    }

    /// Axis-aligned voxel scaling with a translation
    pub fn scaling(voxel_size: [f64; 3], origin: [f64; 3]) -> Self {
        let mut m = Matrix4::identity();
        for axis in 0..3 {
            m[(axis, axis)] = voxel_size[axis];
            m[(axis, 3)] = origin[axis];
        }
        Self::new(m)
    }

    /// Build from the three top rows; the bottom row is `[0, 0, 0, 1]`
    pub fn from_rows(rows: [[f64; 4]; 3]) -> Self {
        let mut m = Matrix4::identity();
        for (r, row) in rows.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                m[(r, c)] = *v;
            }
        }
        Self::new(m)
    }

    /// The underlying matrix
    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.matrix
    }

    /// Matrix as row-major nested arrays
    pub fn to_rows(&self) -> [[f64; 4]; 4] {
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = self.matrix[(r, c)];
            }
        }
        rows
    }

    /// Linear 3×3 part (rotation, zoom, shear)
    pub fn linear(&self) -> Matrix3<f64> {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// Voxel edge lengths along each index axis
    pub fn voxel_sizes(&self) -> [f64; 3] {
        let lin = self.linear();
        [lin.column(0).norm(), lin.column(1).norm(), lin.column(2).norm()]
    }

    /// Map a (possibly fractional) voxel index to world coordinates
    pub fn voxel_to_world(&self, ijk: [f64; 3]) -> [f64; 3] {
        let p = self.matrix * Vector4::new(ijk[0], ijk[1], ijk[2], 1.0);
        [p[0], p[1], p[2]]
    }

    /// Inverse transform, `None` when the affine is singular
    pub fn inverse(&self) -> Option<Affine> {
        self.matrix.try_inverse().map(Affine::new)
    }

    /// Map world coordinates to a fractional voxel index
    pub fn world_to_voxel(&self, xyz: [f64; 3]) -> Option<[f64; 3]> {
        let lin = self.linear();
        let offset = Vector3::new(self.matrix[(0, 3)], self.matrix[(1, 3)], self.matrix[(2, 3)]);
        let inv = lin.try_inverse()?;
        let v = inv * (Vector3::new(xyz[0], xyz[1], xyz[2]) - offset);
        Some([v[0], v[1], v[2]])
    }

    /// Index axis that moves furthest along each world axis
    ///
    /// For an oblique affine this is the closest matching index axis.
    pub fn world_axis_to_voxel_axis(&self) -> [usize; 3] {
        let lin = self.linear();
        let mut mapping = [0, 1, 2];
        for (world, slot) in mapping.iter_mut().enumerate() {
            let row = lin.row(world);
            let mut best = 0;
            for c in 1..3 {
                if row[c].abs() > row[best].abs() {
                    best = c;
                }
            }
            *slot = best;
        }
        mapping
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::identity()
    }
}

/// Affine from a NIfTI quaternion (qform) parameterization
///
/// `qfac` is `pixdim[0]`; a value of -1 flips the third axis.
pub fn affine_from_quaternion(
    quatern: [f64; 3],
    offset: [f64; 3],
    voxel_size: [f64; 3],
    qfac: f64,
) -> Affine {
    let [b, c, d] = quatern;
    let a = (1.0 - (b * b + c * c + d * d)).max(0.0).sqrt();

    let rotation = Matrix3::new(
        a * a + b * b - c * c - d * d,
        2.0 * (b * c - a * d),
        2.0 * (b * d + a * c),
        2.0 * (b * c + a * d),
        a * a + c * c - b * b - d * d,
        2.0 * (c * d - a * b),
        2.0 * (b * d - a * c),
        2.0 * (c * d + a * b),
        a * a + d * d - c * c - b * b,
    );

    let qfac = if qfac < 0.0 { -1.0 } else { 1.0 };
    let zooms = Matrix3::from_diagonal(&Vector3::new(voxel_size[0], voxel_size[1], voxel_size[2] * qfac));
    let lin = rotation * zooms;

    let mut m = Matrix4::identity();
    m.fixed_view_mut::<3, 3>(0, 0).copy_from(&lin);
    for axis in 0..3 {
        m[(axis, 3)] = offset[axis];
    }
    Affine::new(m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaling_round_trip() {
        let affine = Affine::scaling([2.0, 2.0, 3.0], [-90.0, -126.0, -72.0]);
        let world = affine.voxel_to_world([45.0, 63.0, 24.0]);
        assert_eq!(world, [0.0, 0.0, 0.0]);

        let voxel = affine.world_to_voxel(world).unwrap();
        assert!((voxel[0] - 45.0).abs() < 1e-9);
        assert!((voxel[1] - 63.0).abs() < 1e-9);
        assert!((voxel[2] - 24.0).abs() < 1e-9);
        assert_eq!(affine.voxel_sizes(), [2.0, 2.0, 3.0]);
    }

    #[test]
    fn test_singular_affine_has_no_inverse() {
        let affine = Affine::scaling([1.0, 0.0, 1.0], [0.0; 3]);
        assert!(affine.inverse().is_none());
        assert!(affine.world_to_voxel([1.0, 1.0, 1.0]).is_none());
    }

    #[test]
    fn test_identity_quaternion() {
        let affine = affine_from_quaternion([0.0; 3], [1.0, 2.0, 3.0], [2.0, 2.0, 2.0], 1.0);
        assert_eq!(affine, Affine::scaling([2.0; 3], [1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_quaternion_flip() {
        // 180 degree rotation about z, as written by LAS-oriented scanners
        let affine = affine_from_quaternion([0.0, 0.0, 1.0], [0.0; 3], [1.0; 3], -1.0);
        let rows = affine.to_rows();
        assert!((rows[0][0] + 1.0).abs() < 1e-12);
        assert!((rows[1][1] + 1.0).abs() < 1e-12);
        assert!((rows[2][2] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_axis_mapping_for_permuted_affine() {
        // index axis 0 moves along world z, 2 along world x
        let affine = Affine::from_rows([
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [1.0, 0.0, 0.0, 0.0],
        ]);
        assert_eq!(affine.world_axis_to_voxel_axis(), [2, 1, 0]);
    }
}
