//! # ov-viz-render
//!
//! Renders overlay artifacts to SVG, and to PNG/PDF behind the `png` and
//! `pdf` features.

pub mod canvas;
pub mod color;
pub mod config;
pub mod header;
pub mod layout;
pub mod output;
pub mod plots;
pub mod primitives;
pub mod text;
pub mod theme;

use std::path::Path;

use config::VizConfig;
use ov_viz::OverlayArtifact;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid artifact: {0}")]
    Artifact(#[from] ov_viz::Error),
    #[error("deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("unknown output format: {0} (expected svg, png or pdf)")]
    UnknownFormat(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "png")]
    #[error("PNG encoding error: {0}")]
    Png(String),
    #[cfg(feature = "pdf")]
    #[error("PDF conversion error: {0}")]
    Pdf(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Render an overlay artifact to an SVG string.
pub fn render_svg(artifact: &OverlayArtifact, config: &VizConfig) -> Result<String> {
    plots::overlay::render(artifact, config)
}

/// Render an artifact JSON document to an SVG string.
pub fn render_json_svg(artifact_json: &str, config: &VizConfig) -> Result<String> {
    let artifact: OverlayArtifact = serde_json::from_str(artifact_json)?;
    render_svg(&artifact, config)
}

/// Render an artifact to bytes in the specified format (`svg`, `png`, `pdf`).
pub fn render_to_bytes(
    artifact: &OverlayArtifact,
    format: &str,
    config: &VizConfig,
) -> Result<Vec<u8>> {
    let format = format.to_ascii_lowercase();
    // Reject unknown formats before doing any work.
    match format.as_str() {
        "svg" => {}
        #[cfg(feature = "png")]
        "png" => {}
        #[cfg(feature = "pdf")]
        "pdf" => {}
        _ => return Err(RenderError::UnknownFormat(format)),
    }
    let svg = render_svg(artifact, config)?;
    match format.as_str() {
        #[cfg(feature = "png")]
        "png" => output::png::svg_to_png(&svg, config.output.dpi),
        #[cfg(feature = "pdf")]
        "pdf" => output::pdf::svg_to_pdf(&svg),
        _ => Ok(svg.into_bytes()),
    }
}

/// Render an artifact to a file (format inferred from extension, else `config.output.format`).
pub fn render_to_file(artifact: &OverlayArtifact, path: &Path, config: &VizConfig) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| config.output.format.clone());
    if ext.eq_ignore_ascii_case("svg") {
        let svg = render_svg(artifact, config)?;
        return output::svg::save_svg(&svg, path);
    }
    let bytes = render_to_bytes(artifact, &ext, config)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
