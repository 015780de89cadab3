//! Drawing a [`Figure`] onto a plotters drawing area
//!
//! Layout is computed in pixels per panel: title band on top, colorbar band
//! on the right, tick and label margins on the left and bottom. Everything
//! inside the plot rectangle is clipped to it.
//!
//! Text can only be drawn upright or at right angles, so slanted tick
//! labels are drawn upright and right-aligned under their tick.

use plotters::coord::Shift;
use plotters::drawing::{DrawingArea, DrawingAreaErrorKind};
use plotters::element::{PathElement, Polygon, Rectangle, Text};
use plotters::prelude::DrawingBackend;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{
    Color as _, FontDesc, FontFamily, FontStyle, FontTransform, RGBAColor, TextStyle,
};

use crate::axis::{calculate_ticks, AxisConfig, AxisLayout, AxisPosition, TickMark};
use crate::colormap::Color;
use crate::figure::{Colorbar, Figure, Heatmap, Label, Layer, Line, Mesh, Panel};

type DrawResult<DB> = Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

/// Pixel rectangle `(x, y, width, height)`, y downwards
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    fn right(&self) -> f64 {
        self.x + self.w
    }

    fn bottom(&self) -> f64 {
        self.y + self.h
    }

    fn is_drawable(&self) -> bool {
        self.w >= 2.0 && self.h >= 2.0
    }
}

fn to_rgba(c: Color) -> RGBAColor {
    let (r, g, b) = c.to_rgb8();
    RGBAColor(r, g, b, c.a.clamp(0.0, 1.0) as f64)
}

fn px(p: (f64, f64)) -> (i32, i32) {
    (p.0.round() as i32, p.1.round() as i32)
}

/// Rough advance width of `text` at `size_px`
fn text_width(text: &str, size_px: f64) -> f64 {
    text.chars().count() as f64 * size_px * 0.6
}

/// Draw the whole figure
pub(crate) fn draw_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    fig: &Figure,
) -> DrawResult<DB> {
    root.fill(&to_rgba(fig.background))?;

    let (width, height) = root.dim_in_pixel();
    let scale = fig.px_per_pt();
    let mut top = 0.0;

    if let Some(title) = &fig.title {
        let band = title.size * scale * 1.8;
        draw_text(
            root,
            fig,
            title,
            (width as f64 / 2.0, band / 2.0),
            Pos::new(HPos::Center, VPos::Center),
            FontTransform::None,
        )?;
        top = band;
    }

    let (rows, cols) = fig.grid;
    let cell_w = width as f64 / cols as f64;
    let cell_h = (height as f64 - top) / rows as f64;

    for (i, panel) in fig.panels.iter().enumerate().take(rows * cols) {
        let cell = Rect {
            x: (i % cols) as f64 * cell_w,
            y: top + (i / cols) as f64 * cell_h,
            w: cell_w,
            h: cell_h,
        };
        draw_panel(root, fig, panel, cell)?;
    }
    Ok(())
}

/// Pixel layout of one panel
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PanelLayout {
    pub plot: Rect,
    pub colorbar: Option<Rect>,
}

pub(crate) fn layout_panel(fig: &Figure, panel: &Panel, cell: Rect) -> PanelLayout {
    let scale = fig.px_per_pt();
    let tick_len = 3.5 * scale;

    let mut top = cell.h * 0.04;
    if let Some(title) = &panel.title {
        top += title.size * scale * 1.6;
    }
    let mut right = cell.w * 0.04;
    let mut left = cell.w * 0.03;
    let mut bottom = cell.h * 0.03;

    if panel.axes_visible {
        let y_ticks = calculate_ticks(&panel.y_axis);
        let widest = y_ticks
            .iter()
            .map(|t| text_width(&t.label, panel.y_axis.tick_size * scale))
            .fold(0.0, f64::max);
        left += widest + tick_len + 4.0;
        if panel.y_axis.label.is_some() {
            left += panel.y_axis.label_size * scale * 1.5;
        }

        if !calculate_ticks(&panel.x_axis).is_empty() {
            bottom += panel.x_axis.tick_size * scale * 1.4 + tick_len;
        }
        if panel.x_axis.label.is_some() {
            bottom += panel.x_axis.label_size * scale * 1.5;
        }
    }

    let colorbar = panel.colorbar.as_ref().map(|cb| {
        let ticks = colorbar_ticks(cb);
        let widest = ticks
            .iter()
            .map(|t| text_width(&t.label, cb.tick_size * scale))
            .fold(0.0, f64::max);
        let bar = (cell.w * 0.035).max(8.0);
        let label = cb
            .label
            .as_ref()
            .map(|l| l.size * scale * 1.5)
            .unwrap_or(0.0);
        let band = cell.w * 0.04 + bar + tick_len + 4.0 + widest + label;
        right += band;
        band
    });

    let mut plot = Rect {
        x: cell.x + left,
        y: cell.y + top,
        w: (cell.w - left - right).max(0.0),
        h: (cell.h - top - bottom).max(0.0),
    };

    if panel.equal_aspect {
        let dx = (panel.x_axis.max - panel.x_axis.min).abs();
        let dy = (panel.y_axis.max - panel.y_axis.min).abs();
        if dx > 0.0 && dy > 0.0 && plot.is_drawable() {
            let data_aspect = dx / dy;
            if plot.w / plot.h > data_aspect {
                let w = plot.h * data_aspect;
                plot.x += (plot.w - w) / 2.0;
                plot.w = w;
            } else {
                let h = plot.w / data_aspect;
                plot.y += (plot.h - h) / 2.0;
                plot.h = h;
            }
        }
    }

    let colorbar = colorbar.map(|band| {
        let bar = (cell.w * 0.035).max(8.0);
        Rect {
            x: plot.right() + cell.w * 0.04,
            y: plot.y,
            w: bar.min(band),
            h: plot.h,
        }
    });

    PanelLayout { plot, colorbar }
}

fn draw_panel<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    fig: &Figure,
    panel: &Panel,
    cell: Rect,
) -> DrawResult<DB> {
    let layout = layout_panel(fig, panel, cell);
    let plot = layout.plot;
    if !plot.is_drawable() {
        tracing::warn!(?cell, "panel too small to draw; skipped");
        return Ok(());
    }
    let scale = fig.px_per_pt();
    let axes = AxisLayout::new([plot.x, plot.y, plot.w, plot.h], &panel.x_axis, &panel.y_axis);

    if let Some(bg) = panel.background {
        fill_rect(root, plot, bg)?;
    }

    for layer in &panel.layers {
        match layer {
            Layer::Heatmap(heatmap) => draw_heatmap(root, &axes, plot, heatmap)?,
            Layer::Line(line) => draw_line(root, &axes, plot, line, scale)?,
            Layer::Mesh(mesh) => draw_mesh(root, &axes, mesh)?,
            Layer::Crosshair { x, y, color } => {
                let (cx, cy) = axes.data_to_pixel(*x, *y);
                let style = to_rgba(*color).stroke_width(1);
                if cx >= plot.x && cx <= plot.right() {
                    root.draw(&PathElement::new(
                        vec![px((cx, plot.y)), px((cx, plot.bottom()))],
                        style,
                    ))?;
                }
                if cy >= plot.y && cy <= plot.bottom() {
                    root.draw(&PathElement::new(
                        vec![px((plot.x, cy)), px((plot.right(), cy))],
                        style,
                    ))?;
                }
            }
        }
    }

    for note in &panel.annotations {
        let at = axes.data_to_pixel(note.x, note.y);
        draw_text(
            root,
            fig,
            &note.label,
            at,
            Pos::new(HPos::Center, VPos::Center),
            FontTransform::None,
        )?;
    }

    if panel.axes_visible {
        draw_axes(root, fig, panel, plot)?;
    }

    if panel.legend {
        draw_legend(root, fig, panel, plot)?;
    }

    if let Some(title) = &panel.title {
        let y = plot.y - title.size * scale * 0.9;
        draw_text(
            root,
            fig,
            title,
            (plot.x + plot.w / 2.0, y),
            Pos::new(HPos::Center, VPos::Center),
            FontTransform::None,
        )?;
    }

    if let (Some(cb), Some(rect)) = (&panel.colorbar, layout.colorbar) {
        draw_colorbar(root, fig, cb, rect)?;
    }

    Ok(())
}

fn fill_rect<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    rect: Rect,
    color: Color,
) -> DrawResult<DB> {
    root.draw(&Rectangle::new(
        [px((rect.x, rect.y)), px((rect.right(), rect.bottom()))],
        to_rgba(color).filled(),
    ))
}

fn draw_heatmap<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    axes: &AxisLayout,
    clip: Rect,
    heatmap: &Heatmap,
) -> DrawResult<DB> {
    let (nrows, ncols) = heatmap.values.dim();
    for row in 0..nrows {
        for col in 0..ncols {
            let Some(color) = heatmap.scale.color(heatmap.values[[row, col]]) else {
                continue;
            };
            let (x0, x1, y0, y1) = heatmap.cell_bounds(row, col);
            let (ax, ay) = axes.data_to_pixel(x0, y0);
            let (bx, by) = axes.data_to_pixel(x1, y1);

            let left = ax.min(bx).max(clip.x);
            let right = ax.max(bx).min(clip.right());
            let top = ay.min(by).max(clip.y);
            let bottom = ay.max(by).min(clip.bottom());
            if right <= left || bottom <= top {
                continue;
            }
            root.draw(&Rectangle::new(
                [px((left, top)), px((right, bottom))],
                to_rgba(color).filled(),
            ))?;
        }
    }
    Ok(())
}

/// Liang-Barsky clipping of a segment to `rect`
pub(crate) fn clip_segment(
    a: (f64, f64),
    b: (f64, f64),
    rect: Rect,
) -> Option<((f64, f64), (f64, f64))> {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;

    let checks = [
        (-dx, a.0 - rect.x),
        (dx, rect.right() - a.0),
        (-dy, a.1 - rect.y),
        (dy, rect.bottom() - a.1),
    ];
    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }

    Some((
        (a.0 + t0 * dx, a.1 + t0 * dy),
        (a.0 + t1 * dx, a.1 + t1 * dy),
    ))
}

/// Split a polyline into visible runs inside `rect`
pub(crate) fn clip_polyline(points: &[(f64, f64)], rect: Rect) -> Vec<Vec<(f64, f64)>> {
    let mut runs: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();

    for pair in points.windows(2) {
        match clip_segment(pair[0], pair[1], rect) {
            Some((a, b)) => {
                if current.last() != Some(&a) {
                    if current.len() > 1 {
                        runs.push(std::mem::take(&mut current));
                    }
                    current.clear();
                    current.push(a);
                }
                current.push(b);
            }
            None => {
                if current.len() > 1 {
                    runs.push(std::mem::take(&mut current));
                }
                current.clear();
            }
        }
    }
    if current.len() > 1 {
        runs.push(current);
    }
    runs
}

fn draw_line<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    axes: &AxisLayout,
    clip: Rect,
    line: &Line,
    scale: f64,
) -> DrawResult<DB> {
    let points: Vec<(f64, f64)> = line
        .x
        .iter()
        .zip(&line.y)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(x, y)| axes.data_to_pixel(*x, *y))
        .collect();

    let width = (line.width * scale).round().max(1.0) as u32;
    let style = to_rgba(line.color).stroke_width(width);
    for run in clip_polyline(&points, clip) {
        root.draw(&PathElement::new(
            run.into_iter().map(px).collect::<Vec<_>>(),
            style,
        ))?;
    }
    Ok(())
}

fn draw_mesh<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    axes: &AxisLayout,
    mesh: &Mesh,
) -> DrawResult<DB> {
    for tri in &mesh.triangles {
        let points: Vec<(i32, i32)> = tri
            .points
            .iter()
            .map(|(x, y)| px(axes.data_to_pixel(*x, *y)))
            .collect();
        root.draw(&Polygon::new(points, to_rgba(tri.color).filled()))?;
    }
    Ok(())
}

fn draw_axes<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    fig: &Figure,
    panel: &Panel,
    plot: Rect,
) -> DrawResult<DB> {
    let scale = fig.px_per_pt();
    let tick_len = 3.5 * scale;
    let stroke = to_rgba(fig.foreground).stroke_width(scale.round().max(1.0) as u32);

    let spines = [
        (panel.spines.left, (plot.x, plot.y), (plot.x, plot.bottom())),
        (panel.spines.right, (plot.right(), plot.y), (plot.right(), plot.bottom())),
        (panel.spines.top, (plot.x, plot.y), (plot.right(), plot.y)),
        (panel.spines.bottom, (plot.x, plot.bottom()), (plot.right(), plot.bottom())),
    ];
    for (visible, a, b) in spines {
        if visible {
            root.draw(&PathElement::new(vec![px(a), px(b)], stroke))?;
        }
    }

    let in_range = |t: &TickMark| t.normalized >= -1e-9 && t.normalized <= 1.0 + 1e-9;

    // x axis, bottom
    let x_axis = &panel.x_axis;
    let mut label_y = plot.bottom() + tick_len;
    for tick in calculate_ticks(x_axis).iter().filter(|t| in_range(t)) {
        let x = plot.x + tick.normalized * plot.w;
        root.draw(&PathElement::new(
            vec![px((x, plot.bottom())), px((x, plot.bottom() + tick_len))],
            stroke,
        ))?;
        let h = if x_axis.tick_rotation.abs() > 1e-9 {
            HPos::Right
        } else {
            HPos::Center
        };
        let label = Label::new(&tick.label, x_axis.tick_size).with_color(fig.foreground);
        draw_text(
            root,
            fig,
            &label,
            (x, plot.bottom() + tick_len + 2.0),
            Pos::new(h, VPos::Top),
            FontTransform::None,
        )?;
        label_y = plot.bottom() + tick_len + x_axis.tick_size * scale * 1.4;
    }
    if let Some(text) = &x_axis.label {
        let label = Label::new(text, x_axis.label_size).with_color(fig.foreground);
        draw_text(
            root,
            fig,
            &label,
            (plot.x + plot.w / 2.0, label_y + 2.0),
            Pos::new(HPos::Center, VPos::Top),
            FontTransform::None,
        )?;
    }

    // y axis, left
    let y_axis = &panel.y_axis;
    let mut widest: f64 = 0.0;
    for tick in calculate_ticks(y_axis).iter().filter(|t| in_range(t)) {
        let y = plot.bottom() - tick.normalized * plot.h;
        root.draw(&PathElement::new(
            vec![px((plot.x - tick_len, y)), px((plot.x, y))],
            stroke,
        ))?;
        let label = Label::new(&tick.label, y_axis.tick_size).with_color(fig.foreground);
        draw_text(
            root,
            fig,
            &label,
            (plot.x - tick_len - 3.0, y),
            Pos::new(HPos::Right, VPos::Center),
            FontTransform::None,
        )?;
        widest = widest.max(text_width(&tick.label, y_axis.tick_size * scale));
    }
    if let Some(text) = &y_axis.label {
        let label = Label::new(text, y_axis.label_size).with_color(fig.foreground);
        let x = plot.x - tick_len - 6.0 - widest - y_axis.label_size * scale * 0.75;
        draw_text(
            root,
            fig,
            &label,
            (x, plot.y + plot.h / 2.0),
            Pos::new(HPos::Center, VPos::Center),
            FontTransform::Rotate270,
        )?;
    }

    Ok(())
}

fn draw_legend<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    fig: &Figure,
    panel: &Panel,
    plot: Rect,
) -> DrawResult<DB> {
    let entries: Vec<(&str, Color)> = panel
        .lines()
        .filter_map(|l| l.label.as_deref().map(|text| (text, l.color)))
        .collect();
    if entries.is_empty() {
        return Ok(());
    }

    let scale = fig.px_per_pt();
    let size = 10.0;
    let row_h = size * scale * 1.5;
    let sample = 20.0 * scale;
    let widest = entries
        .iter()
        .map(|(text, _)| text_width(text, size * scale))
        .fold(0.0, f64::max);

    let w = sample + widest + 12.0 * scale;
    let h = row_h * entries.len() as f64 + 4.0 * scale;
    let x = plot.right() - w - 4.0 * scale;
    let y = plot.y + 4.0 * scale;

    root.draw(&Rectangle::new(
        [px((x, y)), px((x + w, y + h))],
        to_rgba(Color::WHITE.with_alpha(0.8)).filled(),
    ))?;
    root.draw(&Rectangle::new(
        [px((x, y)), px((x + w, y + h))],
        to_rgba(Color::rgb(0.8, 0.8, 0.8)).stroke_width(1),
    ))?;

    for (i, (text, color)) in entries.iter().enumerate() {
        let cy = y + 2.0 * scale + row_h * (i as f64 + 0.5);
        root.draw(&PathElement::new(
            vec![px((x + 4.0 * scale, cy)), px((x + 4.0 * scale + sample * 0.8, cy))],
            to_rgba(*color).stroke_width((2.0 * scale).round() as u32),
        ))?;
        let label = Label::new(*text, size);
        draw_text(
            root,
            fig,
            &label,
            (x + 8.0 * scale + sample * 0.8, cy),
            Pos::new(HPos::Left, VPos::Center),
            FontTransform::None,
        )?;
    }
    Ok(())
}

fn colorbar_ticks(cb: &Colorbar) -> Vec<TickMark> {
    calculate_ticks(&AxisConfig::new(
        AxisPosition::Right,
        cb.scale.vmin,
        cb.scale.vmax,
    ))
}

fn draw_colorbar<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    fig: &Figure,
    cb: &Colorbar,
    rect: Rect,
) -> DrawResult<DB> {
    let steps = rect.h.round().max(1.0) as usize;
    for i in 0..steps {
        let t = (i as f64 + 0.5) / steps as f64;
        let color = cb.scale.colormap.sample(t as f32);
        let y1 = rect.bottom() - i as f64;
        let y0 = (y1 - 1.0).max(rect.y);
        root.draw(&Rectangle::new(
            [px((rect.x, y0)), px((rect.right(), y1))],
            to_rgba(color).filled(),
        ))?;
    }
    root.draw(&Rectangle::new(
        [px((rect.x, rect.y)), px((rect.right(), rect.bottom()))],
        to_rgba(fig.foreground).stroke_width(1),
    ))?;

    let scale = fig.px_per_pt();
    let tick_len = 3.5 * scale;
    let mut widest: f64 = 0.0;
    for tick in colorbar_ticks(cb) {
        let y = rect.bottom() - tick.normalized * rect.h;
        root.draw(&PathElement::new(
            vec![px((rect.right(), y)), px((rect.right() + tick_len, y))],
            to_rgba(fig.foreground).stroke_width(1),
        ))?;
        let label = Label::new(&tick.label, cb.tick_size).with_color(fig.foreground);
        draw_text(
            root,
            fig,
            &label,
            (rect.right() + tick_len + 3.0, y),
            Pos::new(HPos::Left, VPos::Center),
            FontTransform::None,
        )?;
        widest = widest.max(text_width(&tick.label, cb.tick_size * scale));
    }

    if let Some(label) = &cb.label {
        let x = rect.right() + tick_len + 6.0 + widest + label.size * scale * 0.75;
        draw_text(
            root,
            fig,
            label,
            (x, rect.y + rect.h / 2.0),
            Pos::new(HPos::Center, VPos::Center),
            FontTransform::Rotate270,
        )?;
    }
    Ok(())
}

fn draw_text<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    fig: &Figure,
    label: &Label,
    at: (f64, f64),
    pos: Pos,
    transform: FontTransform,
) -> DrawResult<DB> {
    if label.text.is_empty() {
        return Ok(());
    }
    let color = to_rgba(label.color);
    let font = FontDesc::new(
        FontFamily::Name(&fig.fonts.family),
        label.size * fig.px_per_pt(),
        FontStyle::Normal,
    );
    let style = TextStyle::from(font)
        .color(&color)
        .pos(pos)
        .transform(transform);
    root.draw(&Text::new(label.text.clone(), px(at), style))
}
