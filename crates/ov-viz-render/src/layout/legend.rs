use crate::canvas::Canvas;
use crate::color::Color;
use crate::config::LegendConfig;
use crate::layout::margins::PlotArea;
use crate::primitives::*;

pub struct LegendEntry {
    pub label: String,
    pub color: Color,
    pub kind: LegendKind,
}

pub enum LegendKind {
    Line(Option<String>), // dash pattern
    /// Histogram line with a vertical error bar through it.
    LineWithError,
    Marker,
}

/// Legend rectangle in canvas points for a box given in panel fractions.
pub fn legend_box(area: &PlotArea, cfg: &LegendConfig) -> PlotArea {
    let (x1, x2) = (cfg.x1.min(cfg.x2), cfg.x1.max(cfg.x2));
    let (y1, y2) = (cfg.y1.min(cfg.y2), cfg.y1.max(cfg.y2));
    PlotArea::manual(
        area.left + x1 * area.width,
        area.bottom() - y2 * area.height,
        (x2 - x1) * area.width,
        (y2 - y1) * area.height,
    )
}

/// Draw a legend inside `cfg`'s box; rows share the box height evenly.
pub fn draw_legend(
    canvas: &mut Canvas,
    area: &PlotArea,
    entries: &[LegendEntry],
    config_font_size: f64,
    cfg: &LegendConfig,
) {
    if entries.is_empty() {
        return;
    }

    let bx = legend_box(area, cfg);
    let row_height = bx.height / entries.len() as f64;
    let font_size = (config_font_size * 0.85).min(row_height * 0.8).max(4.0);
    let swatch_w = 0.25 * bx.width.min(80.0);
    let gap = 6.0;
    let padding = 4.0;

    if cfg.fill.is_some() || cfg.frame {
        let bg_style = Style {
            fill: cfg.fill,
            stroke: if cfg.frame { Some(Color::rgb(0, 0, 0)) } else { None },
            stroke_width: 0.6,
            opacity: 1.0,
        };
        canvas.rect(bx.left, bx.top, bx.width, bx.height, &bg_style);
    }

    let text_style = TextStyle {
        size: font_size,
        baseline: TextBaseline::Central,
        ..Default::default()
    };

    for (i, entry) in entries.iter().enumerate() {
        let ey = bx.top + i as f64 * row_height + row_height / 2.0;
        let sx = bx.left + padding;

        match entry.kind {
            LegendKind::Line(ref dash) => {
                let ls = LineStyle { color: entry.color, width: 1.5, dash: dash.clone() };
                canvas.line(sx, ey, sx + swatch_w, ey, &ls);
            }
            LegendKind::LineWithError => {
                let ls = LineStyle::solid(entry.color, 1.5);
                let half = (row_height * 0.35).min(font_size * 0.6);
                canvas.line(sx, ey, sx + swatch_w, ey, &ls);
                canvas.line(sx + swatch_w / 2.0, ey - half, sx + swatch_w / 2.0, ey + half, &ls);
            }
            LegendKind::Marker => {
                canvas.marker(
                    sx + swatch_w / 2.0,
                    ey,
                    &MarkerStyle { color: entry.color, size: 3.0, ..Default::default() },
                );
            }
        }

        canvas.text(sx + swatch_w + gap, ey, &entry.label, &text_style);
    }
}
