use ov_viz::overlay::{HistogramSeries, OverlayArtifact};

use crate::canvas::Canvas;
use crate::color::Color;
use crate::config::VizConfig;
use crate::header::draw_experiment_header;
use crate::layout::axes::Axis;
use crate::layout::legend::{self, LegendEntry, LegendKind};
use crate::layout::margins::PlotArea;
use crate::layout::multi_panel::MainRatioLayout;
use crate::plots::axes_draw::draw_axes;
use crate::primitives::*;

/// Render the normalized overlay (main panel) and `compared / reference` (ratio panel).
pub fn render(artifact: &OverlayArtifact, config: &VizConfig) -> crate::Result<String> {
    artifact.validate()?;
    config.validate()?;

    let ov = &config.overlay;
    let edges = &artifact.bin_edges;
    let (x_min, x_max) = (edges[0], edges[edges.len() - 1]);

    let mut canvas = Canvas::new(config.figure.width, config.figure.height);

    let x_axis_ratio = Axis::bounded_linear(x_min, x_max, 7).with_label(&artifact.x_label);
    let x_axis_main = x_axis_ratio.clone().with_label("").without_tick_labels();
    let y_axis_main = main_y_axis(artifact, config).with_label(&ov.y_label);
    let ratio_label = ov.ratio_label.as_deref().unwrap_or(&artifact.ratio_label);
    let [r_lo, r_hi] = ov.ratio_y_range;
    let y_axis_ratio = Axis::bounded_linear(r_lo, r_hi, 4).with_label(ratio_label);

    let content = PlotArea::auto(&canvas, &[&y_axis_main, &y_axis_ratio], &x_axis_ratio, config);
    let layout = MainRatioLayout::split(&content, 6.0, ov.ratio_frac);

    draw_experiment_header(&mut canvas, &layout.main, config);

    // --- Main panel ---
    let main = &layout.main;
    draw_axes(&mut canvas, main, &x_axis_main, &y_axis_main, config);
    canvas.push_clip(main.left, main.top, main.width, main.height);
    let edges_px: Vec<f64> =
        edges.iter().map(|&e| x_axis_main.data_to_pixel(e, main.left, main.right())).collect();

    draw_series(&mut canvas, main, &edges_px, &y_axis_main, &artifact.reference, config.colors.reference, ov.show_errors);
    for (i, c) in artifact.compared.iter().enumerate() {
        let color = config.series_color(&c.series.name, i);
        draw_series(&mut canvas, main, &edges_px, &y_axis_main, &c.series, color, ov.show_errors);
    }
    canvas.pop_clip();

    let mut entries = vec![LegendEntry {
        label: legend_label(&artifact.reference),
        color: config.colors.reference,
        kind: LegendKind::LineWithError,
    }];
    for (i, c) in artifact.compared.iter().enumerate() {
        let mut label = legend_label(&c.series);
        if ov.show_kappa {
            label.push_str(&format!(" (\u{03BA} = {})", format_kappa(c.kappa)));
        }
        entries.push(LegendEntry {
            label,
            color: config.series_color(&c.series.name, i),
            kind: LegendKind::LineWithError,
        });
    }
    legend::draw_legend(&mut canvas, main, &entries, config.font.size, &ov.legend);

    // --- Ratio panel ---
    let ratio = &layout.ratio;
    draw_axes(&mut canvas, ratio, &x_axis_ratio, &y_axis_ratio, config);
    canvas.push_clip(ratio.left, ratio.top, ratio.width, ratio.height);

    // Reference line at y=1
    let ref_py = y_axis_ratio.data_to_pixel(1.0, ratio.bottom(), ratio.top);
    canvas.line(ratio.left, ref_py, ratio.right(), ref_py, &LineStyle::dashed(config.colors.ratio_line, 0.8));

    for (i, c) in artifact.compared.iter().enumerate() {
        let color = config.series_color(&c.series.name, i);
        let marker = MarkerStyle { color, size: 2.5, fill: true, ..Default::default() };
        let err_style = LineStyle::solid(color, 0.8);

        for bi in 0..artifact.n_bins() {
            // Ratio is undefined where the reference is empty.
            if artifact.reference.y[bi] == 0.0 || !c.ratio_y[bi].is_finite() {
                continue;
            }
            let px = 0.5 * (edges_px[bi] + edges_px[bi + 1]);
            let (y, e) = (c.ratio_y[bi], c.ratio_yerr[bi]);
            let py = y_axis_ratio.data_to_pixel(y, ratio.bottom(), ratio.top);
            if e > 0.0 {
                let py_lo = y_axis_ratio.data_to_pixel_clamped(y - e, ratio.bottom(), ratio.top);
                let py_hi = y_axis_ratio.data_to_pixel_clamped(y + e, ratio.bottom(), ratio.top);
                canvas.error_bar(px, py_lo, py_hi, 0.0, &err_style);
            }
            canvas.marker(px, py, &marker);
        }
    }
    canvas.pop_clip();

    Ok(canvas.finish_svg())
}

/// Main-panel y axis: the configured range, else autoscaled to all series.
fn main_y_axis(artifact: &OverlayArtifact, config: &VizConfig) -> Axis {
    let ov = &config.overlay;
    if let Some([lo, hi]) = ov.y_range {
        return if ov.log_y { Axis::bounded_log(lo, hi) } else { Axis::bounded_linear(lo, hi, 6) };
    }

    let all = std::iter::once(&artifact.reference).chain(artifact.compared.iter().map(|c| &c.series));
    let mut y_max = 0.0_f64;
    let mut y_min_pos = f64::INFINITY;
    for s in all {
        for (&y, &e) in s.y.iter().zip(&s.yerr) {
            if y.is_finite() {
                y_max = y_max.max(y + e.max(0.0));
                if y > 0.0 {
                    y_min_pos = y_min_pos.min(y);
                }
            }
        }
    }
    if y_max <= 0.0 {
        y_max = 1.0;
    }

    if ov.log_y {
        let lo = if y_min_pos.is_finite() { y_min_pos * 0.5 } else { y_max * 1e-3 };
        Axis::auto_log(lo, y_max * 2.0)
    } else {
        Axis::auto_linear(0.0, y_max * 1.2, 6)
    }
}

/// Step outline plus bin-centre error bars, in `color`.
fn draw_series(
    canvas: &mut Canvas,
    area: &PlotArea,
    edges_px: &[f64],
    y_axis: &Axis,
    s: &HistogramSeries,
    color: Color,
    show_errors: bool,
) {
    let to_px = |v: f64| y_axis.data_to_pixel_clamped(v, area.bottom(), area.top);
    let values_px: Vec<f64> = s.y.iter().map(|&y| to_px(y)).collect();
    canvas.step_line(edges_px, &values_px, &LineStyle::solid(color, 1.5));

    if !show_errors {
        return;
    }
    let err_style = LineStyle::solid(color, 1.0);
    for (bi, (&y, &e)) in s.y.iter().zip(&s.yerr).enumerate() {
        if !(e > 0.0 && y.is_finite()) {
            continue;
        }
        let px = 0.5 * (edges_px[bi] + edges_px[bi + 1]);
        canvas.error_bar(px, to_px(y - e), to_px(y + e), 0.0, &err_style);
    }
}

fn legend_label(s: &HistogramSeries) -> String {
    if s.title.trim().is_empty() { s.name.clone() } else { s.title.clone() }
}

/// Kappa with four significant digits for legends.
fn format_kappa(k: f64) -> String {
    if k == 0.0 || !k.is_finite() {
        return format!("{k}");
    }
    let digits = (3 - k.abs().log10().floor() as i32).max(0) as usize;
    let s = format!("{k:.digits$}");
    if s.contains('.') { s.trim_end_matches('0').trim_end_matches('.').to_string() } else { s }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ov_viz::overlay::{ComparedSeries, OverlayMeta, RatioPolicy, SCHEMA_VERSION};

    fn series(name: &str, y: Vec<f64>) -> HistogramSeries {
        let yerr = y.iter().map(|v| 0.1 * v).collect();
        HistogramSeries {
            name: name.into(),
            title: String::new(),
            integral: 10.0,
            entries: 10.0,
            y,
            yerr,
        }
    }

    fn artifact() -> OverlayArtifact {
        OverlayArtifact {
            schema_version: SCHEMA_VERSION.into(),
            meta: OverlayMeta {
                tool: "overlay".into(),
                tool_version: "test".into(),
                created_unix_ms: 0,
                input: None,
            },
            bin_edges: vec![60.0, 80.0, 100.0, 120.0],
            x_label: "m_ee [GeV]".into(),
            ratio_label: "method / truth".into(),
            ratio_policy: RatioPolicy { denominator: "truth".into(), zero_policy: "zero".into() },
            reference: series("truth", vec![0.25, 0.5, 0.25]),
            compared: vec![ComparedSeries {
                series: series("method", vec![0.0, 0.5, 0.5]),
                kappa: 0.2,
                ratio_y: vec![0.0, 1.0, 2.0],
                ratio_yerr: vec![0.0, 0.1, 0.3],
            }],
        }
    }

    #[test]
    fn renders_both_panels() {
        let svg = render(&artifact(), &VizConfig::default()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(">method / truth</text>"));
        assert!(svg.contains(">m_ee [GeV]</text>"));
        assert!(svg.contains(">CMS</text>"));
        assert!(svg.contains("method (\u{03BA} = 0.2)"));
        assert!(svg.contains(">truth</text>"));
        // One step outline per series, one dashed unity line.
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert_eq!(svg.matches(r#"stroke-dasharray="6 3""#).count(), 1);
        // Two clipped panels.
        assert_eq!(svg.matches("<clipPath").count(), 2);
        // Ratio markers skip no bins here (reference is non-empty everywhere).
        assert_eq!(svg.matches("<circle").count(), 3);
    }

    #[test]
    fn compared_uses_first_palette_color() {
        let svg = render(&artifact(), &VizConfig::default()).unwrap();
        assert!(svg.contains(r##"stroke="#0099ff""##));
        assert!(svg.contains(r##"stroke="#000000""##));
    }

    #[test]
    fn ratio_label_override() {
        let mut config = VizConfig::default();
        config.overlay.ratio_label = Some("DT / RECO".into());
        config.overlay.show_kappa = false;
        let svg = render(&artifact(), &config).unwrap();
        assert!(svg.contains(">DT / RECO</text>"));
        assert!(!svg.contains("\u{03BA}"));
    }

    #[test]
    fn empty_reference_bin_has_no_ratio_marker() {
        let mut art = artifact();
        art.reference.y[0] = 0.0;
        let svg = render(&art, &VizConfig::default()).unwrap();
        assert_eq!(svg.matches("<circle").count(), 2);
    }

    #[test]
    fn autoscaled_linear_axis() {
        let mut config = VizConfig::default();
        config.overlay.y_range = None;
        config.overlay.log_y = false;
        let y = main_y_axis(&artifact(), &config);
        assert!(!y.log);
        assert!(y.max >= 0.55 * 1.2 - 1e-12);
        config.overlay.log_y = true;
        let y = main_y_axis(&artifact(), &config);
        assert!(y.log && y.min <= 0.125 && y.max >= 1.1);
    }

    #[test]
    fn invalid_artifact_is_rejected() {
        let mut art = artifact();
        art.compared[0].ratio_y.pop();
        assert!(matches!(
            render(&art, &VizConfig::default()),
            Err(crate::RenderError::Artifact(_))
        ));
    }

    #[test]
    fn kappa_formatting() {
        assert_eq!(format_kappa(0.2), "0.2");
        assert_eq!(format_kappa(0.123456), "0.1235");
        assert_eq!(format_kappa(12.5), "12.5");
        assert_eq!(format_kappa(1234.0), "1234");
    }
}
