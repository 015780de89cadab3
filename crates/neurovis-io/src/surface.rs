//! FreeSurfer pial meshes and per-vertex curvature
//!
//! Surface views need, per hemisphere, a pial mesh (`lh.pial`) and a sulcal
//! depth map (`lh.sulc`) with one value per vertex.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IoError, IoResult};

/// Brain hemisphere
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    Left,
    Right,
}

impl Hemisphere {
    pub fn prefix(&self) -> &'static str {
        match self {
            Hemisphere::Left => "lh",
            Hemisphere::Right => "rh",
        }
    }
}

/// A triangle mesh in world coordinates
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceMesh {
    pub vertices: Vec<[f64; 3]>,
    pub faces: Vec<[usize; 3]>,
}

impl SurfaceMesh {
    /// Build a mesh, checking that every face references a valid vertex
    pub fn new(vertices: Vec<[f64; 3]>, faces: Vec<[usize; 3]>) -> IoResult<Self> {
        let n = vertices.len();
        if let Some(face) = faces.iter().find(|f| f.iter().any(|&v| v >= n)) {
            return Err(IoError::InvalidFormat(format!(
                "face {:?} references a vertex beyond {}",
                face, n
            )));
        }
        Ok(Self { vertices, faces })
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Axis-aligned bounding box `(min, max)`
    pub fn bounds(&self) -> ([f64; 3], [f64; 3]) {
        let mut min = [f64::INFINITY; 3];
        let mut max = [f64::NEG_INFINITY; 3];
        for v in &self.vertices {
            for axis in 0..3 {
                min[axis] = min[axis].min(v[axis]);
                max[axis] = max[axis].max(v[axis]);
            }
        }
        (min, max)
    }
}

/// Load a FreeSurfer binary surface (`*.pial`, `*.white`, `*.inflated`)
pub fn load_surface(path: impl AsRef<Path>) -> IoResult<SurfaceMesh> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(IoError::FileNotFound(path.to_path_buf()));
    }

    let surf = neuroformats::read_surf(path)
        .map_err(|e| IoError::InvalidFormat(format!("{}: {}", path.display(), e)))?;

    let coords = &surf.mesh.vertices;
    if coords.len() % 3 != 0 {
        return Err(IoError::InvalidFormat(format!(
            "{}: vertex buffer length {} is not a multiple of 3",
            path.display(),
            coords.len()
        )));
    }
    let vertices = coords
        .chunks_exact(3)
        .map(|c| [c[0] as f64, c[1] as f64, c[2] as f64])
        .collect();

    let indices = &surf.mesh.faces;
    if indices.len() % 3 != 0 || indices.iter().any(|&i| i < 0) {
        return Err(IoError::InvalidFormat(format!(
            "{}: malformed face buffer",
            path.display()
        )));
    }
    let faces = indices
        .chunks_exact(3)
        .map(|f| [f[0] as usize, f[1] as usize, f[2] as usize])
        .collect();

    let mesh = SurfaceMesh::new(vertices, faces)?;
    tracing::debug!(
        path = %path.display(),
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "loaded surface"
    );
    Ok(mesh)
}

/// Load a FreeSurfer per-vertex curvature file (`*.sulc`, `*.curv`)
pub fn load_curvature(path: impl AsRef<Path>) -> IoResult<Vec<f64>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(IoError::FileNotFound(path.to_path_buf()));
    }

    let curv = neuroformats::read_curv(path)
        .map_err(|e| IoError::InvalidFormat(format!("{}: {}", path.display(), e)))?;
    Ok(curv.data.iter().map(|&v| v as f64).collect())
}

/// Load a mesh with its sulcal depth map, checking that they match
pub fn load_hemisphere(
    mesh_path: impl AsRef<Path>,
    sulc_path: impl AsRef<Path>,
) -> IoResult<(SurfaceMesh, Vec<f64>)> {
    let mesh = load_surface(mesh_path)?;
    let sulc = load_curvature(sulc_path)?;
    if sulc.len() != mesh.vertex_count() {
        return Err(IoError::InvalidFormat(format!(
            "sulcal map has {} values for {} vertices",
            sulc.len(),
            mesh.vertex_count()
        )));
    }
    Ok((mesh, sulc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetrahedron() -> SurfaceMesh {
        SurfaceMesh::new(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 2.0, 0.0],
                [0.0, 0.0, 3.0],
            ],
            vec![[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn test_mesh_counts_and_bounds() {
        let mesh = tetrahedron();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 4);
        assert_eq!(mesh.bounds(), ([0.0, 0.0, 0.0], [1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_face_out_of_range() {
        let err = SurfaceMesh::new(vec![[0.0; 3]; 3], vec![[0, 1, 3]]).unwrap_err();
        assert!(matches!(err, IoError::InvalidFormat(_)));
    }

    #[test]
    fn test_hemisphere_prefix() {
        assert_eq!(Hemisphere::Left.prefix(), "lh");
        assert_eq!(Hemisphere::Right.prefix(), "rh");
    }

    #[test]
    fn test_missing_surface() {
        assert!(matches!(
            load_surface("/definitely/not/lh.pial"),
            Err(IoError::FileNotFound(_))
        ));
        assert!(matches!(
            load_curvature("/definitely/not/lh.sulc"),
            Err(IoError::FileNotFound(_))
        ));
    }
}
