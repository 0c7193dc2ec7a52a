//! End-to-end: synthesized ROOT file -> overlay artifact -> rendered plot.

use ov_root::RootFile;
use ov_root::fixtures::{HistSpec, RootFileBuilder};
use ov_viz::{OverlayArtifact, OverlayOptions};
use ov_viz_render::config::resolve_config;
use ov_viz_render::{RenderError, render_json_svg, render_svg, render_to_bytes, render_to_file};
use std::path::PathBuf;

fn tmp_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ov_render_it_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir.join(name)
}

fn artifact() -> OverlayArtifact {
    let bytes = RootFileBuilder::new()
        .histogram(
            HistSpec::uniform("hInvMassEl_RECOden", "truth", 60.0, 120.0, vec![1.0, 2.0, 4.0, 2.0, 1.0])
                .with_x_title("m_{ee} [GeV]"),
        )
        .histogram(HistSpec::uniform("hInvMassEl_DTnum", "method", 60.0, 120.0, vec![0.0, 0.5, 1.0, 0.5, 0.0]))
        .build();
    let f = RootFile::from_bytes(bytes, PathBuf::from("mem.root")).unwrap();
    let truth = f.get_histogram("hInvMassEl_RECOden").unwrap();
    let dt = f.get_histogram("hInvMassEl_DTnum").unwrap();
    OverlayArtifact::from_histograms(&truth, &[dt], &OverlayOptions::default()).unwrap()
}

#[test]
fn svg_from_root_histograms() {
    let art = artifact();
    let config = resolve_config(None, None).unwrap();
    let svg = render_svg(&art, &config).unwrap();
    assert!(svg.contains(">m_{ee} [GeV]</text>"));
    assert!(svg.contains(">method / truth</text>"));
    assert!(svg.contains("method (\u{03BA} = 0.2)"));
    assert!(svg.contains("35.9 fb"));
}

#[test]
fn json_round_trip_renders_identically_shaped_svg() {
    let art = artifact();
    let config = resolve_config(None, Some("atlas")).unwrap();
    let direct = render_svg(&art, &config).unwrap();
    let from_json = render_json_svg(&art.to_json().unwrap(), &config).unwrap();
    assert_eq!(direct.matches("<polyline").count(), from_json.matches("<polyline").count());
    assert!(from_json.contains(">ATLAS</text>"));
}

#[test]
fn file_output_by_extension() {
    let art = artifact();
    let config = resolve_config(None, None).unwrap();
    let path = tmp_path("overlay.svg");
    render_to_file(&art, &path, &config).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("<svg"));
}

#[test]
fn unknown_format_is_rejected() {
    let art = artifact();
    let config = resolve_config(None, None).unwrap();
    let err = render_to_bytes(&art, "gif", &config).unwrap_err();
    assert!(matches!(err, RenderError::UnknownFormat(f) if f == "gif"));
}

#[test]
fn malformed_json_is_a_deserialize_error() {
    let config = resolve_config(None, None).unwrap();
    assert!(matches!(render_json_svg("{", &config), Err(RenderError::Deserialize(_))));
}

#[cfg(feature = "png")]
#[test]
fn png_has_signature() {
    let art = artifact();
    let mut config = resolve_config(None, None).unwrap();
    config.output.dpi = 72;
    let png = render_to_bytes(&art, "png", &config).unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
}

#[cfg(feature = "pdf")]
#[test]
fn pdf_has_header() {
    let art = artifact();
    let config = resolve_config(None, None).unwrap();
    let pdf = render_to_bytes(&art, "pdf", &config).unwrap();
    assert!(pdf.starts_with(b"%PDF"));
}
