use crate::canvas::Canvas;
use crate::config::VizConfig;
use crate::layout::axes::Axis;
use crate::primitives::TextStyle;

/// Rectangular plot area within the canvas.
#[derive(Debug, Clone, Copy)]
pub struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PlotArea {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Content box left after outer margins sized for the given axes.
    ///
    /// `y_axes` are all axes stacked on the left edge (main and ratio panel);
    /// the widest tick label decides the left margin.
    pub fn auto(canvas: &Canvas, y_axes: &[&Axis], x_axis: &Axis, config: &VizConfig) -> Self {
        let tick_style = TextStyle { size: config.font.tick_size, ..Default::default() };

        // Left margin: y-axis tick labels + rotated axis label + padding
        let max_tick_w = y_axes
            .iter()
            .flat_map(|a| a.tick_labels.iter())
            .map(|l| canvas.measure_text(l, &tick_style).width)
            .fold(0.0_f64, f64::max);
        let mut left = 15.0 + max_tick_w + 8.0;
        if y_axes.iter().any(|a| !a.label.is_empty()) {
            left += config.font.label_size + 8.0;
        }

        // Bottom margin: x-axis tick labels + axis label + padding
        let mut bottom = 15.0 + config.font.tick_size + 6.0;
        if !x_axis.label.is_empty() {
            bottom += config.font.label_size + 6.0;
        }

        // Top margin: header space
        let top = if config.experiment.name.is_empty() && config.experiment.lumi_fb_inv <= 0.0 {
            12.0
        } else {
            config.font.label_size * 1.3 + 20.0
        };

        let right = 20.0;

        let width = canvas.width - left - right;
        let height = canvas.height - top - bottom;

        Self { left, top, width: width.max(50.0), height: height.max(50.0) }
    }

    /// Manual margins (for multi-panel layouts).
    pub fn manual(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_leaves_room_for_labels() {
        let config = VizConfig::default();
        let canvas = Canvas::new(576.0, 576.0);
        let y = Axis::bounded_log(0.001, 100.0).with_label("Normalized entries");
        let x = Axis::auto_linear(60.0, 120.0, 7).with_label("m [GeV]");
        let area = PlotArea::auto(&canvas, &[&y], &x, &config);
        assert!(area.left > 30.0);
        assert!(area.top > 12.0);
        assert!(area.right() < 576.0);
        assert!(area.bottom() < 576.0);
    }
}
