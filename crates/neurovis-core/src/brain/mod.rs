//! Brain-volume views of RSA result maps
//!
//! All views take a statistical map as a [`Volume`], optionally drop small
//! clusters first, and draw it over a template background:
//!
//! - **regions**: three orthogonal cuts through the main cluster
//! - **montage**: rows of cuts along each axis
//! - **glass**: maximum-intensity projections on black
//! - **surface**: the map sampled onto FreeSurfer pial meshes
//!
//! Zero and NaN voxels of the map are never drawn.

mod slice;
mod surface;
mod views;

pub use slice::*;
pub use surface::*;
pub use views::*;

use std::path::PathBuf;

use ndarray::Array2;

use neurovis_io::{load_volume, locate, TemplateAsset, Volume};
use neurovis_stats::{correct_by_threshold, is_active, label_clusters, Connectivity};

use crate::colormap::{gray, ColorScale};
use crate::config::{PlotConfig, SurfaceConfig};
use crate::error::{PlotError, PlotResult};
use crate::figure::Figure;

/// What to draw behind the statistical map
#[derive(Clone, Debug)]
pub enum Background {
    /// One of the template volumes, looked up in the template directory
    Template(TemplateAsset),
    /// A caller-supplied volume
    Volume(Volume),
    /// Nothing
    None,
}

/// Options shared by the brain views
#[derive(Clone, Debug, Default)]
pub struct BrainOptions {
    /// Minimum cluster size in voxels; smaller clusters are zeroed first
    pub threshold: Option<usize>,
    /// Explicit background; each view falls back to its default template
    pub background: Option<Background>,
    /// Template directory; the environment / data-dir default when unset
    pub template_dir: Option<PathBuf>,
    /// Meshes for the surface view
    pub surface: SurfaceConfig,
}

impl BrainOptions {
    pub fn from_config(config: &PlotConfig) -> Self {
        Self {
            threshold: None,
            background: None,
            template_dir: config.templates.dir.clone(),
            surface: config.surface.clone(),
        }
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_background(mut self, background: Background) -> Self {
        self.background = Some(background);
        self
    }
}

/// Reject empty maps and apply the optional cluster-size threshold
pub(crate) fn prepare(img: &Volume, threshold: Option<usize>) -> PlotResult<Volume> {
    if img.is_all_nan() {
        return Err(PlotError::EmptyResult {
            reason: "No Valid Results: the map contains only NaN".to_string(),
        });
    }
    match threshold {
        Some(threshold) => {
            let corrected = correct_by_threshold(img.data.view(), threshold)?;
            Ok(img.with_data(corrected))
        }
        None => Ok(img.clone()),
    }
}

/// Background volume for a view whose default template is `default`
///
/// A missing default template only drops the background; a missing template
/// that was asked for explicitly is an error.
pub(crate) fn resolve_background(
    opts: &BrainOptions,
    default: TemplateAsset,
) -> PlotResult<Option<Volume>> {
    let dir = opts.template_dir.as_deref();
    match &opts.background {
        Some(Background::Volume(volume)) => Ok(Some(volume.clone())),
        Some(Background::None) => Ok(None),
        Some(Background::Template(asset)) => {
            let path = locate(*asset, dir)?;
            Ok(Some(load_volume(path)?))
        }
        None => match locate(default, dir) {
            Ok(path) => Ok(Some(load_volume(path)?)),
            Err(e) => {
                tracing::warn!(template = %default, error = %e, "template unavailable; drawing without background");
                Ok(None)
            }
        },
    }
}

/// Gray scale spanning the finite range of a background volume
pub(crate) fn background_scale(bg: &Volume) -> ColorScale {
    let (lo, hi) = bg
        .data
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    if lo.is_finite() && hi > lo {
        ColorScale::new(gray(), lo, hi)
    } else {
        ColorScale::new(gray(), 0.0, 1.0)
    }
}

/// Map zeros to NaN so they are left transparent
pub(crate) fn transparent_zeros(mut values: Array2<f64>) -> Array2<f64> {
    values.mapv_inplace(|v| if v == 0.0 { f64::NAN } else { v });
    values
}

/// World point the views are centred on
///
/// The centroid of the largest cluster; the centre of the volume when the
/// map has no active voxel.
pub fn cut_point(img: &Volume) -> [f64; 3] {
    let clusters = label_clusters(img.data.view(), Connectivity::default());
    match clusters.largest() {
        Some(cluster) => img.affine.voxel_to_world(cluster.centroid()),
        None => {
            let (min, max) = img.world_bounds();
            [0, 1, 2].map(|a| (min[a] + max[a]) / 2.0)
        }
    }
}

/// World-space range of the active voxels along one world axis
pub(crate) fn active_extent(img: &Volume, axis: usize) -> Option<(f64, f64)> {
    let mut range: Option<(f64, f64)> = None;
    for ((i, j, k), v) in img.data.indexed_iter() {
        if !is_active(*v) {
            continue;
        }
        let w = img.affine.voxel_to_world([i as f64, j as f64, k as f64])[axis];
        range = Some(match range {
            Some((lo, hi)) => (lo.min(w), hi.max(w)),
            None => (w, w),
        });
    }
    range
}

/// Every brain view of one map
///
/// Regions and montage are always drawn. The glass view is skipped when an
/// explicit background is given; the surface view is added when meshes are
/// configured. Each figure starts as a copy of `fig`.
pub fn plot_brainrsa_rlts(
    fig: &Figure,
    img: &Volume,
    slices: &SliceSpec,
    opts: &BrainOptions,
) -> PlotResult<Vec<Figure>> {
    let img = prepare(img, opts.threshold)?;

    let mut figures = vec![
        regions_figure(fig.clone(), &img, resolve_background(opts, TemplateAsset::Ch2)?)?,
        montage_figure(
            fig.clone(),
            &img,
            slices,
            resolve_background(opts, TemplateAsset::Ch2Bet)?,
        )?,
    ];
    if opts.background.is_none() {
        figures.push(glass_figure(fig.clone(), &img)?);
    }
    if opts.surface.is_configured() {
        let hemispheres = load_surfaces(&opts.surface)?;
        figures.push(surface_figure(fig.clone(), &img, &hemispheres)?);
    }

    tracing::info!(figures = figures.len(), "plotted brain views");
    Ok(figures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use neurovis_io::Affine;

    pub(crate) fn blob_volume() -> Volume {
        let mut data = Array3::<f64>::zeros((10, 12, 8));
        // 3x3x3 block around voxel (6, 5, 4) and a lone voxel
        for i in 5..8 {
            for j in 4..7 {
                for k in 3..6 {
                    data[[i, j, k]] = 0.6;
                }
            }
        }
        data[[1, 1, 1]] = 0.9;
        Volume::new(data, Affine::scaling([2.0, 2.0, 2.0], [-10.0, -12.0, -8.0]))
    }

    #[test]
    fn test_all_nan_is_empty_result() {
        let img = Volume::new(Array3::from_elem((3, 3, 3), f64::NAN), Affine::identity());
        assert!(matches!(
            prepare(&img, None),
            Err(PlotError::EmptyResult { .. })
        ));
    }

    #[test]
    fn test_threshold_drops_small_clusters() {
        let img = prepare(&blob_volume(), Some(5)).unwrap();
        assert_eq!(img.data[[1, 1, 1]], 0.0);
        assert_eq!(img.data[[6, 5, 4]], 0.6);
    }

    #[test]
    fn test_zero_threshold_rejected() {
        assert!(matches!(
            prepare(&blob_volume(), Some(0)),
            Err(PlotError::Stats(_))
        ));
    }

    #[test]
    fn test_cut_point_is_cluster_centroid() {
        let p = cut_point(&blob_volume());
        assert_eq!(p, [2.0, -2.0, 0.0]);
    }

    #[test]
    fn test_cut_point_of_empty_map_is_centre() {
        let img = Volume::new(Array3::zeros((5, 5, 5)), Affine::identity());
        assert_eq!(cut_point(&img), [2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_explicit_missing_template_is_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let opts = BrainOptions {
            template_dir: Some(dir.path().to_path_buf()),
            ..BrainOptions::default()
        }
        .with_background(Background::Template(TemplateAsset::Ch2));
        assert!(matches!(
            resolve_background(&opts, TemplateAsset::Ch2),
            Err(PlotError::Io(_))
        ));

        let opts = BrainOptions {
            template_dir: Some(dir.path().to_path_buf()),
            ..BrainOptions::default()
        };
        assert!(resolve_background(&opts, TemplateAsset::Ch2).unwrap().is_none());
    }

    #[test]
    fn test_active_extent() {
        let (lo, hi) = active_extent(&blob_volume(), 0).unwrap();
        assert_eq!((lo, hi), (-8.0, 4.0));
    }
}
