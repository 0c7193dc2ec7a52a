use crate::canvas::Canvas;
use crate::color::Color;
use crate::config::VizConfig;
use crate::layout::margins::PlotArea;
use crate::primitives::*;

/// Draw the experiment header above the panel: **CMS** *Simulation* on the
/// left, `35.9 fb⁻¹ (13 TeV)` on the right.
pub fn draw_experiment_header(canvas: &mut Canvas, area: &PlotArea, config: &VizConfig) {
    let header_size = config.font.label_size * 1.3;
    let y = area.top - 6.0;

    if !config.experiment.name.is_empty() {
        let x = area.left;
        let bold_style = TextStyle {
            size: header_size,
            color: Color::rgb(0, 0, 0),
            weight: FontWeight::Bold,
            anchor: TextAnchor::Start,
            baseline: TextBaseline::Alphabetic,
            ..Default::default()
        };
        canvas.text(x, y, &config.experiment.name, &bold_style);

        let name_w = canvas.measure_text(&config.experiment.name, &bold_style).width;
        if !config.experiment.status.is_empty() {
            let italic_style = TextStyle {
                size: header_size * 0.8,
                color: Color::rgb(0, 0, 0),
                style: FontStyle::Italic,
                anchor: TextAnchor::Start,
                baseline: TextBaseline::Alphabetic,
                ..Default::default()
            };
            canvas.text(x + name_w + 5.0, y, &config.experiment.status, &italic_style);
        }
    }

    if let Some(info) = lumi_label(config) {
        let info_style = TextStyle {
            size: config.font.size,
            color: Color::rgb(0, 0, 0),
            anchor: TextAnchor::End,
            baseline: TextBaseline::Alphabetic,
            ..Default::default()
        };
        canvas.text(area.right(), y, &info, &info_style);
    }
}

/// `L fb⁻¹ (E TeV)`, either part omitted when non-positive.
fn lumi_label(config: &VizConfig) -> Option<String> {
    let e = &config.experiment;
    match (e.lumi_fb_inv > 0.0, e.sqrt_s_tev > 0.0) {
        (true, true) => Some(format!("{} fb\u{207B}\u{00B9} ({} TeV)", e.lumi_fb_inv, e.sqrt_s_tev)),
        (true, false) => Some(format!("{} fb\u{207B}\u{00B9}", e.lumi_fb_inv)),
        (false, true) => Some(format!("{} TeV", e.sqrt_s_tev)),
        (false, false) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cms_header_text() {
        let config = VizConfig::default();
        assert_eq!(lumi_label(&config).unwrap(), "35.9 fb\u{207B}\u{00B9} (13 TeV)");

        let mut canvas = Canvas::new(300.0, 300.0);
        draw_experiment_header(&mut canvas, &PlotArea::manual(40.0, 40.0, 200.0, 200.0), &config);
        let svg = canvas.finish_svg();
        assert!(svg.contains(">CMS</text>"));
        assert!(svg.contains(">Simulation</text>"));
    }

    #[test]
    fn empty_experiment_draws_nothing() {
        let mut config = VizConfig::default();
        config.experiment.name.clear();
        config.experiment.lumi_fb_inv = 0.0;
        config.experiment.sqrt_s_tev = 0.0;
        let mut canvas = Canvas::new(300.0, 300.0);
        draw_experiment_header(&mut canvas, &PlotArea::manual(40.0, 40.0, 200.0, 200.0), &config);
        assert!(!canvas.finish_svg().contains("<text"));
    }
}
