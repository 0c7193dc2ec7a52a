use crate::canvas::Canvas;
use crate::color::Color;
use crate::config::VizConfig;
use crate::layout::axes::Axis;
use crate::layout::margins::PlotArea;
use crate::primitives::*;

#[derive(Clone, Copy)]
enum Edge {
    Bottom,
    Top,
    Left,
    Right,
}

/// Draw a box frame with major/minor ticks, grid, tick labels and axis titles.
///
/// Axis titles are aligned to the high end of their axis, ROOT style.
pub fn draw_axes(
    canvas: &mut Canvas,
    area: &PlotArea,
    x_axis: &Axis,
    y_axis: &Axis,
    config: &VizConfig,
) {
    let frame_color = Color::rgb(0, 0, 0);
    let frame_style = LineStyle::solid(frame_color, 0.8);
    let major_style = LineStyle::solid(frame_color, 0.6);
    let minor_style = LineStyle::solid(frame_color, 0.4);
    let inward = config.axes.tick_direction == "in";
    let tl = config.axes.tick_length;
    let mtl = config.axes.minor_tick_length;

    // Frame rectangle
    canvas.line(area.left, area.top, area.right(), area.top, &frame_style);
    canvas.line(area.left, area.bottom(), area.right(), area.bottom(), &frame_style);
    canvas.line(area.left, area.top, area.left, area.bottom(), &frame_style);
    canvas.line(area.right(), area.top, area.right(), area.bottom(), &frame_style);

    let grid_style = LineStyle {
        color: config.grid.color.with_alpha(config.grid.alpha),
        width: 0.5,
        dash: Some("3 3".into()),
    };

    // --- X axis ---
    let x_label_style = TextStyle {
        size: config.font.tick_size,
        color: frame_color,
        anchor: TextAnchor::Middle,
        baseline: TextBaseline::Hanging,
        ..Default::default()
    };
    for (i, &val) in x_axis.tick_positions.iter().enumerate() {
        let px = x_axis.data_to_pixel(val, area.left, area.right());
        if px < area.left - 0.5 || px > area.right() + 0.5 {
            continue;
        }
        if config.grid.show {
            canvas.line(px, area.top, px, area.bottom(), &grid_style);
        }
        tick(canvas, area, Edge::Bottom, px, tl, inward, &major_style);
        if config.axes.show_top_ticks {
            tick(canvas, area, Edge::Top, px, tl, inward, &major_style);
        }
        if let Some(label) = x_axis.tick_labels.get(i) {
            let label_y = if inward { area.bottom() + 4.0 } else { area.bottom() + tl + 4.0 };
            canvas.text(px, label_y, label, &x_label_style);
        }
    }
    for &val in &x_axis.minor_ticks {
        let px = x_axis.data_to_pixel(val, area.left, area.right());
        if px < area.left - 0.5 || px > area.right() + 0.5 {
            continue;
        }
        tick(canvas, area, Edge::Bottom, px, mtl, inward, &minor_style);
        if config.axes.show_top_ticks {
            tick(canvas, area, Edge::Top, px, mtl, inward, &minor_style);
        }
    }

    // --- Y axis ---
    let y_label_style = TextStyle {
        size: config.font.tick_size,
        color: frame_color,
        anchor: TextAnchor::End,
        baseline: TextBaseline::Central,
        ..Default::default()
    };
    let label_x = if inward { area.left - 4.0 } else { area.left - tl - 4.0 };
    for (i, &val) in y_axis.tick_positions.iter().enumerate() {
        let py = y_axis.data_to_pixel(val, area.bottom(), area.top);
        if py < area.top - 0.5 || py > area.bottom() + 0.5 {
            continue;
        }
        if config.grid.show {
            canvas.line(area.left, py, area.right(), py, &grid_style);
        }
        tick(canvas, area, Edge::Left, py, tl, inward, &major_style);
        if config.axes.show_right_ticks {
            tick(canvas, area, Edge::Right, py, tl, inward, &major_style);
        }
        if let Some(label) = y_axis.tick_labels.get(i) {
            canvas.text(label_x, py, label, &y_label_style);
        }
    }
    for &val in &y_axis.minor_ticks {
        let py = y_axis.data_to_pixel(val, area.bottom(), area.top);
        if py < area.top - 0.5 || py > area.bottom() + 0.5 {
            continue;
        }
        tick(canvas, area, Edge::Left, py, mtl, inward, &minor_style);
        if config.axes.show_right_ticks {
            tick(canvas, area, Edge::Right, py, mtl, inward, &minor_style);
        }
    }

    // --- Axis titles ---
    let title_style = TextStyle {
        size: config.font.label_size,
        color: frame_color,
        anchor: TextAnchor::End,
        ..Default::default()
    };

    if !x_axis.label.is_empty() {
        let label_y = if inward {
            area.bottom() + config.font.tick_size + 18.0
        } else {
            area.bottom() + tl + config.font.tick_size + 18.0
        };
        canvas.text(area.right(), label_y, &x_axis.label, &title_style);
    }

    if !y_axis.label.is_empty() {
        let max_tick_w = y_axis
            .tick_labels
            .iter()
            .map(|l| canvas.measure_text(l, &y_label_style).width)
            .fold(0.0_f64, f64::max);
        let x = label_x - max_tick_w - 6.0;
        canvas.text_rotated(x, area.top, &y_axis.label, &title_style, -90.0);
    }
}

fn tick(
    canvas: &mut Canvas,
    area: &PlotArea,
    edge: Edge,
    pos: f64,
    len: f64,
    inward: bool,
    style: &LineStyle,
) {
    let len = if inward { len } else { -len };
    match edge {
        Edge::Bottom => canvas.line(pos, area.bottom(), pos, area.bottom() - len, style),
        Edge::Top => canvas.line(pos, area.top, pos, area.top + len, style),
        Edge::Left => canvas.line(area.left, pos, area.left + len, pos, style),
        Edge::Right => canvas.line(area.right(), pos, area.right() - len, pos, style),
    }
}
