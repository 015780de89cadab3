//! Slice-based brain views: regions, montage and glass projections

use serde::{Deserialize, Serialize};

use neurovis_io::{TemplateAsset, Volume};

use super::slice::{sample_step, union_bounds, CutAxis, PlaneGrid};
use super::{
    active_extent, background_scale, cut_point, prepare, resolve_background, transparent_zeros,
    BrainOptions,
};
use crate::colormap::{cold_hot, hot, jet, Color, ColorScale};
use crate::error::{PlotError, PlotResult};
use crate::figure::{Annotation, Colorbar, Figure, Heatmap, Label, Layer, Origin, Panel};

/// Cuts along one axis of a montage
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cuts {
    /// This many cuts spread over the active part of the map; 0 skips the axis
    Count(usize),
    /// Cuts at these world coordinates (mm)
    Coords(Vec<f64>),
}

impl Default for Cuts {
    fn default() -> Self {
        Cuts::Count(6)
    }
}

impl Cuts {
    pub fn is_empty(&self) -> bool {
        match self {
            Cuts::Count(n) => *n == 0,
            Cuts::Coords(coords) => coords.is_empty(),
        }
    }
}

/// Montage cuts for the sagittal (x), coronal (y) and axial (z) rows
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceSpec {
    pub x: Cuts,
    pub y: Cuts,
    pub z: Cuts,
}

impl SliceSpec {
    /// The same number of cuts on every axis
    pub fn counts(x: usize, y: usize, z: usize) -> Self {
        Self {
            x: Cuts::Count(x),
            y: Cuts::Count(y),
            z: Cuts::Count(z),
        }
    }

    pub fn cuts(&self, axis: CutAxis) -> &Cuts {
        match axis {
            CutAxis::Sagittal => &self.x,
            CutAxis::Coronal => &self.y,
            CutAxis::Axial => &self.z,
        }
    }
}

/// World coordinates of the cuts along `axis`
///
/// A count of `n` splits the active extent of the map into `n` equal bins
/// and cuts through the middle of each.
pub fn cut_coords(img: &Volume, axis: CutAxis, cuts: &Cuts) -> Vec<f64> {
    match cuts {
        Cuts::Coords(coords) => coords.clone(),
        Cuts::Count(0) => Vec::new(),
        Cuts::Count(n) => {
            let a = axis.world_axis();
            let (lo, hi) = active_extent(img, a).unwrap_or_else(|| {
                let (min, max) = img.world_bounds();
                (min[a], max[a])
            });
            let width = (hi - lo) / *n as f64;
            (0..*n).map(|i| lo + width * (i as f64 + 0.5)).collect()
        }
    }
}

/// Everything one cut panel needs besides the overlay scale
struct CutPanel<'a> {
    img: &'a Volume,
    background: Option<&'a Volume>,
    grid: &'a PlaneGrid,
    coord: f64,
    cross: [f64; 3],
}

impl CutPanel<'_> {
    fn build(&self, fig: &Figure, scale: &ColorScale) -> Panel {
        let extent = self.grid.extent();
        let mut panel = Panel::bare(extent[0], extent[1], extent[2], extent[3]);
        panel.equal_aspect = true;
        panel.background = Some(Color::BLACK);

        if let Some(bg) = self.background {
            panel.push(Layer::Heatmap(Heatmap::new(
                self.grid.sample(bg, self.coord),
                extent,
                Origin::Lower,
                background_scale(bg),
            )));
        }

        let overlay = transparent_zeros(self.grid.sample(self.img, self.coord));
        panel.push(Layer::Heatmap(Heatmap::new(
            overlay,
            extent,
            Origin::Lower,
            scale.clone(),
        )));

        let (u, v) = self.grid.axis.in_plane();
        panel.push(Layer::Crosshair {
            x: self.cross[u],
            y: self.cross[v],
            color: Color::rgb(0.4, 0.6, 1.0),
        });

        panel.annotations.push(Annotation {
            x: (extent[0] + extent[1]) / 2.0,
            y: extent[3] - (extent[3] - extent[2]) * 0.06,
            label: Label::new(
                format!("{}={:.0}", self.grid.axis.letter(), self.coord),
                fig.fonts.condition_label_size,
            )
            .with_color(Color::WHITE),
        });
        panel
    }
}

/// World bounds shared by the map and its background
fn view_bounds(img: &Volume, background: Option<&Volume>) -> ([f64; 3], [f64; 3]) {
    match background {
        Some(bg) => union_bounds(img.world_bounds(), bg.world_bounds()),
        None => img.world_bounds(),
    }
}

fn colorbar(fig: &Figure, scale: &ColorScale) -> Colorbar {
    Colorbar {
        scale: scale.clone(),
        label: None,
        tick_size: fig.fonts.colorbar_tick_size,
    }
}

fn title(fig: &Figure, text: &str) -> Label {
    Label::new(text, fig.fonts.axis_label_size).with_color(fig.foreground)
}

pub(crate) fn regions_figure(
    mut fig: Figure,
    img: &Volume,
    background: Option<Volume>,
) -> PlotResult<Figure> {
    let cross = cut_point(img);
    let bounds = view_bounds(img, background.as_ref());
    let step = sample_step(img);
    let scale = ColorScale::new(jet(), 0.1, 1.0);
    tracing::debug!(?cross, "plotting regions");

    let panels = CutAxis::ALL
        .iter()
        .map(|&axis| {
            let grid = PlaneGrid::covering(axis, bounds.0, bounds.1, step);
            CutPanel {
                img,
                background: background.as_ref(),
                grid: &grid,
                coord: cross[axis.world_axis()],
                cross,
            }
            .build(&fig, &scale)
        })
        .collect();

    fig.clear();
    fig.title = Some(title(&fig, "Similarity"));
    fig.set_panels(1, 3, panels);
    Ok(fig)
}

pub(crate) fn montage_figure(
    mut fig: Figure,
    img: &Volume,
    slices: &SliceSpec,
    background: Option<Volume>,
) -> PlotResult<Figure> {
    let rows: Vec<(CutAxis, Vec<f64>)> = CutAxis::ALL
        .iter()
        .map(|&axis| (axis, cut_coords(img, axis, slices.cuts(axis))))
        .filter(|(_, coords)| !coords.is_empty())
        .collect();
    if rows.is_empty() {
        return Err(PlotError::invalid_option(
            "slice",
            "at least one axis needs a cut",
        ));
    }
    let cols = rows.iter().map(|(_, c)| c.len()).max().unwrap_or(1);

    let cross = cut_point(img);
    let bounds = view_bounds(img, background.as_ref());
    let step = sample_step(img);
    let scale = ColorScale::new(cold_hot(), -1.0, 1.0);

    let mut panels = Vec::with_capacity(rows.len() * cols);
    for (axis, coords) in &rows {
        tracing::debug!(axis = axis.name(), ?coords, "montage row");
        let grid = PlaneGrid::covering(*axis, bounds.0, bounds.1, step);
        for (i, coord) in coords.iter().enumerate() {
            let mut panel = CutPanel {
                img,
                background: background.as_ref(),
                grid: &grid,
                coord: *coord,
                cross,
            }
            .build(&fig, &scale);
            if i == 0 {
                panel.title = Some(title(&fig, &format!("Similarity -{}", axis.name())));
            }
            if i + 1 == coords.len() {
                panel.colorbar = Some(colorbar(&fig, &scale));
            }
            panels.push(panel);
        }
        // pad short rows so every row starts in the first column
        for _ in coords.len()..cols {
            panels.push(Panel::bare(0.0, 1.0, 0.0, 1.0));
        }
    }

    fig.clear();
    fig.set_panels(rows.len(), cols, panels);
    Ok(fig)
}

pub(crate) fn glass_figure(mut fig: Figure, img: &Volume) -> PlotResult<Figure> {
    let (min, max) = img.world_bounds();
    let step = sample_step(img);
    let cross = cut_point(img);
    let scale = ColorScale::new(hot(), 0.0, 1.0);

    fig.clear();
    fig.background = Color::BLACK;
    fig.foreground = Color::WHITE;

    let panels: Vec<Panel> = CutAxis::ALL
        .iter()
        .map(|&axis| {
            let grid = PlaneGrid::covering(axis, min, max, step);
            let extent = grid.extent();
            let mut panel = Panel::bare(extent[0], extent[1], extent[2], extent[3]);
            panel.equal_aspect = true;
            panel.push(Layer::Heatmap(Heatmap::new(
                transparent_zeros(grid.project_max_abs(img)),
                extent,
                Origin::Lower,
                scale.clone(),
            )));
            let (u, v) = axis.in_plane();
            panel.push(Layer::Crosshair {
                x: cross[u],
                y: cross[v],
                color: Color::rgb(0.5, 0.5, 0.5),
            });
            if axis == CutAxis::Axial {
                panel.colorbar = Some(colorbar(&fig, &scale));
            }
            panel
        })
        .collect();

    fig.title = Some(title(&fig, "Similarity"));
    fig.set_panels(1, 3, panels);
    Ok(fig)
}

/// Three orthogonal cuts through the largest cluster
///
/// The map is drawn with jet over `[0.1, 1]` on the `ch2` template unless
/// another background is given.
pub fn plot_brainrsa_regions(fig: Figure, img: &Volume, opts: &BrainOptions) -> PlotResult<Figure> {
    let img = prepare(img, opts.threshold)?;
    let background = resolve_background(opts, TemplateAsset::Ch2)?;
    regions_figure(fig, &img, background)
}

/// Rows of sagittal, coronal and axial cuts
///
/// The map is drawn with a cold-hot scale over `[-1, 1]` on the `ch2bet`
/// template unless another background is given.
pub fn plot_brainrsa_montage(
    fig: Figure,
    img: &Volume,
    slices: &SliceSpec,
    opts: &BrainOptions,
) -> PlotResult<Figure> {
    let img = prepare(img, opts.threshold)?;
    let background = resolve_background(opts, TemplateAsset::Ch2Bet)?;
    montage_figure(fig, &img, slices, background)
}

/// Maximum-intensity projections along each axis on a black background
pub fn plot_brainrsa_glass(fig: Figure, img: &Volume, opts: &BrainOptions) -> PlotResult<Figure> {
    let img = prepare(img, opts.threshold)?;
    glass_figure(fig, &img)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::tests::blob_volume;
    use crate::brain::Background;

    fn no_background() -> BrainOptions {
        BrainOptions::default().with_background(Background::None)
    }

    fn overlay_colormap(panel: &Panel) -> &str {
        &panel.heatmaps().last().unwrap().scale.colormap.name
    }

    #[test]
    fn test_cut_coords_spread_over_active_extent() {
        let img = blob_volume();
        // active x range is -8 .. 4
        let coords = cut_coords(&img, CutAxis::Sagittal, &Cuts::Count(3));
        assert_eq!(coords, vec![-6.0, -2.0, 2.0]);
        assert!(cut_coords(&img, CutAxis::Axial, &Cuts::Count(0)).is_empty());
        assert_eq!(
            cut_coords(&img, CutAxis::Axial, &Cuts::Coords(vec![10.0])),
            vec![10.0]
        );
    }

    #[test]
    fn test_regions_has_three_cuts() {
        let fig = plot_brainrsa_regions(Figure::new(), &blob_volume(), &no_background()).unwrap();
        assert_eq!(fig.grid, (1, 3));
        assert_eq!(fig.panels.len(), 3);
        assert_eq!(overlay_colormap(&fig.panels[0]), "jet");
        // no background layer
        assert_eq!(fig.panels[0].heatmaps().count(), 1);
    }

    #[test]
    fn test_montage_skips_empty_axis() {
        let slices = SliceSpec {
            x: Cuts::Count(4),
            y: Cuts::Count(0),
            z: Cuts::Coords(vec![-2.0, 0.0]),
        };
        let fig =
            plot_brainrsa_montage(Figure::new(), &blob_volume(), &slices, &no_background()).unwrap();
        assert_eq!(fig.grid, (2, 4));
        assert_eq!(fig.panels.len(), 8);

        let first_axial = &fig.panels[4];
        assert_eq!(
            first_axial.title.as_ref().map(|l| l.text.as_str()),
            Some("Similarity -axial")
        );
        assert!(fig.panels[5].colorbar.is_some());
        // padding panels are empty
        assert!(fig.panels[6].layers.is_empty());
    }

    #[test]
    fn test_montage_without_cuts_rejected() {
        let slices = SliceSpec::counts(0, 0, 0);
        let err = plot_brainrsa_montage(Figure::new(), &blob_volume(), &slices, &no_background())
            .unwrap_err();
        assert!(matches!(err, PlotError::InvalidOption { .. }));
    }

    #[test]
    fn test_glass_is_black() {
        let fig = plot_brainrsa_glass(Figure::new(), &blob_volume(), &BrainOptions::default()).unwrap();
        assert_eq!(fig.background, Color::BLACK);
        assert_eq!(fig.panels.len(), 3);
        assert_eq!(overlay_colormap(&fig.panels[2]), "hot");
        assert!(fig.panels[2].colorbar.is_some());
    }

    #[test]
    fn test_overlay_zeros_are_transparent() {
        let fig = plot_brainrsa_regions(Figure::new(), &blob_volume(), &no_background()).unwrap();
        let overlay = fig.panels[2].heatmaps().last().unwrap();
        assert!(overlay.values.iter().any(|v| v.is_nan()));
        assert!(overlay.values.iter().all(|v| v.is_nan() || *v != 0.0));
    }
}
