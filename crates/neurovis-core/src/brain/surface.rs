//! Cortical surface views
//!
//! The map is sampled at each pial vertex and drawn over sulcal shading.
//! Meshes are projected orthographically onto the sagittal plane and faces
//! are painted from far to near.

use neurovis_io::{load_hemisphere, Hemisphere, SurfaceMesh, Volume};

use super::{prepare, BrainOptions};
use crate::colormap::{cold_hot, gray, Color, ColorScale};
use crate::config::SurfaceConfig;
use crate::error::{PlotError, PlotResult};
use crate::figure::{Colorbar, Figure, Label, Layer, Mesh, Panel, Triangle};

/// Values below this magnitude show only the sulcal shading
pub const SURFACE_THRESHOLD: f64 = 0.1;

/// Color limit of the surface overlay (symmetric)
pub const SURFACE_VMAX: f64 = 0.8;

/// Brightness factor applied to the sulcal shading
pub const DARKNESS: f32 = 0.7;

/// Side a hemisphere is viewed from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceView {
    /// From outside the brain
    Lateral,
    /// From the midline
    Medial,
}

impl SurfaceView {
    pub fn name(&self) -> &'static str {
        match self {
            SurfaceView::Lateral => "lateral",
            SurfaceView::Medial => "medial",
        }
    }

    /// Sign of the x direction the viewer sits in
    fn viewer_side(&self, hemi: Hemisphere) -> f64 {
        match (hemi, self) {
            (Hemisphere::Left, SurfaceView::Lateral) | (Hemisphere::Right, SurfaceView::Medial) => -1.0,
            (Hemisphere::Left, SurfaceView::Medial) | (Hemisphere::Right, SurfaceView::Lateral) => 1.0,
        }
    }
}

/// One hemisphere's pial mesh with its sulcal depth map
#[derive(Clone, Debug)]
pub struct HemisphereSurface {
    pub hemisphere: Hemisphere,
    pub mesh: SurfaceMesh,
    /// One value per vertex
    pub sulc: Vec<f64>,
}

/// Load both configured hemispheres
pub fn load_surfaces(config: &SurfaceConfig) -> PlotResult<Vec<HemisphereSurface>> {
    [Hemisphere::Left, Hemisphere::Right]
        .into_iter()
        .map(|hemisphere| -> PlotResult<HemisphereSurface> {
            let (pial, sulc) = config.hemisphere(hemisphere).ok_or_else(|| {
                PlotError::invalid_option(
                    "surface",
                    format!("no {} pial mesh and sulcal map configured", hemisphere.prefix()),
                )
            })?;
            let (mesh, sulc) = load_hemisphere(pial, sulc)?;
            Ok(HemisphereSurface {
                hemisphere,
                mesh,
                sulc,
            })
        })
        .collect()
}

/// Map value at every vertex; vertices outside the map or on NaN get 0
pub fn vol_to_surf(img: &Volume, mesh: &SurfaceMesh) -> Vec<f64> {
    mesh.vertices
        .iter()
        .map(|v| match img.sample_nearest(*v) {
            Some(value) if value.is_finite() => value,
            _ => 0.0,
        })
        .collect()
}

/// Projected, painter-sorted triangles for one view of a hemisphere
pub(crate) fn project_view(
    surface: &HemisphereSurface,
    texture: &[f64],
    view: SurfaceView,
) -> Mesh {
    let side = view.viewer_side(surface.hemisphere);
    let overlay = ColorScale::new(cold_hot(), -SURFACE_VMAX, SURFACE_VMAX);
    let shading = sulc_scale(&surface.sulc);
    let shade = gray().reversed();

    let vertices = &surface.mesh.vertices;
    let mut faces: Vec<(f64, Triangle)> = surface
        .mesh
        .faces
        .iter()
        .map(|face| {
            let mean = |values: &dyn Fn(usize) -> f64| face.iter().map(|&i| values(i)).sum::<f64>() / 3.0;
            let value = mean(&|i| texture[i]);
            let sulc = mean(&|i| surface.sulc[i]);
            let depth = mean(&|i| side * vertices[i][0]);

            let color = if value.abs() >= SURFACE_THRESHOLD {
                overlay.color(value)
            } else {
                None
            }
            .unwrap_or_else(|| shade.sample(shading.normalize(sulc)).darken(DARKNESS));

            let points = face.map(|i| (side * vertices[i][1], vertices[i][2]));
            (depth, Triangle { points, color })
        })
        .collect();

    // nearest faces have the largest depth and are drawn last
    faces.sort_by(|a, b| a.0.total_cmp(&b.0));
    Mesh {
        triangles: faces.into_iter().map(|(_, t)| t).collect(),
    }
}

fn sulc_scale(sulc: &[f64]) -> ColorScale {
    let (lo, hi) = sulc
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    if lo.is_finite() && hi > lo {
        ColorScale::new(gray(), lo, hi)
    } else {
        ColorScale::new(gray(), 0.0, 1.0)
    }
}

/// `(min_u, max_u, min_v, max_v)` of a projected mesh, padded by 2%
fn mesh_bounds(mesh: &Mesh) -> [f64; 4] {
    let mut b = [f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY];
    for (u, v) in mesh.triangles.iter().flat_map(|t| t.points) {
        b = [b[0].min(u), b[1].max(u), b[2].min(v), b[3].max(v)];
    }
    if !b.iter().all(|v| v.is_finite()) {
        return [0.0, 1.0, 0.0, 1.0];
    }
    let pad_u = (b[1] - b[0]).max(1e-6) * 0.02;
    let pad_v = (b[3] - b[2]).max(1e-6) * 0.02;
    [b[0] - pad_u, b[1] + pad_u, b[2] - pad_v, b[3] + pad_v]
}

pub(crate) fn surface_figure(
    mut fig: Figure,
    img: &Volume,
    hemispheres: &[HemisphereSurface],
) -> PlotResult<Figure> {
    if hemispheres.is_empty() {
        return Err(PlotError::invalid_option("surface", "no hemisphere to draw"));
    }
    let overlay = ColorScale::new(cold_hot(), -SURFACE_VMAX, SURFACE_VMAX);
    let textures: Vec<Vec<f64>> = hemispheres
        .iter()
        .map(|h| vol_to_surf(img, &h.mesh))
        .collect();

    let cols = hemispheres.len();
    let mut panels = Vec::with_capacity(2 * cols);
    for view in [SurfaceView::Lateral, SurfaceView::Medial] {
        for (col, (surface, texture)) in hemispheres.iter().zip(&textures).enumerate() {
            let mesh = project_view(surface, texture, view);
            let [u0, u1, v0, v1] = mesh_bounds(&mesh);
            tracing::debug!(
                hemisphere = surface.hemisphere.prefix(),
                view = view.name(),
                faces = mesh.triangles.len(),
                "projected surface"
            );

            let mut panel = Panel::bare(u0, u1, v0, v1).with_title(Label::new(
                format!("{} {}", surface.hemisphere.prefix(), view.name()),
                fig.fonts.condition_label_size,
            ));
            panel.equal_aspect = true;
            panel.push(Layer::Mesh(mesh));
            if col + 1 == cols {
                panel.colorbar = Some(Colorbar {
                    scale: overlay.clone(),
                    label: None,
                    tick_size: fig.fonts.colorbar_tick_size,
                });
            }
            panels.push(panel);
        }
    }

    fig.clear();
    fig.title = Some(Label::new("Similarity", fig.fonts.axis_label_size).with_color(fig.foreground));
    fig.set_panels(2, cols, panels);
    Ok(fig)
}

/// Lateral and medial views of both hemispheres
///
/// Meshes come from `opts.surface`. Each hemisphere is shaded with its own
/// sulcal map.
pub fn plot_brainrsa_surface(fig: Figure, img: &Volume, opts: &BrainOptions) -> PlotResult<Figure> {
    let img = prepare(img, opts.threshold)?;
    let hemispheres = load_surfaces(&opts.surface)?;
    surface_figure(fig, &img, &hemispheres)
}

/// Surface views from meshes already in memory
pub fn plot_surface_views(
    fig: Figure,
    img: &Volume,
    hemispheres: &[HemisphereSurface],
    threshold: Option<usize>,
) -> PlotResult<Figure> {
    let img = prepare(img, threshold)?;
    surface_figure(fig, &img, hemispheres)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use neurovis_io::Affine;

    /// Two triangles side by side along y, one closer to x = -inf
    fn patch(hemisphere: Hemisphere) -> HemisphereSurface {
        let mesh = SurfaceMesh::new(
            vec![
                [-2.0, 0.0, 0.0],
                [-2.0, 1.0, 0.0],
                [-2.0, 0.0, 1.0],
                [2.0, 2.0, 0.0],
                [2.0, 3.0, 0.0],
                [2.0, 2.0, 1.0],
            ],
            vec![[0, 1, 2], [3, 4, 5]],
        )
        .unwrap();
        HemisphereSurface {
            hemisphere,
            mesh,
            sulc: vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
        }
    }

    fn map() -> Volume {
        let mut data = Array3::<f64>::zeros((5, 5, 3));
        data[[0, 0, 0]] = 0.5;
        Volume::new(data, Affine::scaling([1.0, 1.0, 1.0], [-2.0, 0.0, 0.0]))
    }

    #[test]
    fn test_vol_to_surf() {
        let surface = patch(Hemisphere::Left);
        let texture = vol_to_surf(&map(), &surface.mesh);
        assert_eq!(texture[0], 0.5);
        assert_eq!(texture[3], 0.0);
    }

    #[test]
    fn test_lateral_left_paints_near_face_last() {
        let surface = patch(Hemisphere::Left);
        let mesh = project_view(&surface, &[0.0; 6], SurfaceView::Lateral);
        // viewer on the -x side: the x = -2 face is nearest
        assert_eq!(mesh.triangles[1].points[0], (0.0, 0.0));
        // anterior (+y) is drawn to the left
        assert_eq!(mesh.triangles[0].points[1], (-3.0, 0.0));
    }

    #[test]
    fn test_medial_left_flips() {
        let surface = patch(Hemisphere::Left);
        let mesh = project_view(&surface, &[0.0; 6], SurfaceView::Medial);
        assert_eq!(mesh.triangles[1].points[1], (3.0, 0.0));
    }

    #[test]
    fn test_overlay_threshold() {
        let surface = patch(Hemisphere::Right);
        let texture = [0.5, 0.5, 0.5, 0.05, 0.05, 0.05];
        let mesh = project_view(&surface, &texture, SurfaceView::Lateral);
        let colors: Vec<Color> = mesh.triangles.iter().map(|t| t.color).collect();
        // sub-threshold face is gray (equal channels)
        assert!(colors.iter().any(|c| c.r == c.g && c.g == c.b));
        // supra-threshold face takes the red side of cold_hot
        assert!(colors.iter().any(|c| c.r > c.b));
    }

    #[test]
    fn test_surface_grid() {
        let hemis = vec![patch(Hemisphere::Left), patch(Hemisphere::Right)];
        let fig = plot_surface_views(Figure::new(), &map(), &hemis, None).unwrap();
        assert_eq!(fig.grid, (2, 2));
        assert!(fig.panels[1].colorbar.is_some());
        assert!(fig.panels[2].colorbar.is_none());
        assert_eq!(fig.panels[2].title.as_ref().unwrap().text, "lh medial");
    }

    #[test]
    fn test_unconfigured_surface() {
        let err = plot_brainrsa_surface(Figure::new(), &map(), &BrainOptions::default()).unwrap_err();
        assert!(matches!(err, PlotError::InvalidOption { .. }));
    }
}
