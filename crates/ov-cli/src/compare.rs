//! `overlay compare`: load the reference and compared histograms, report
//! kappa, and draw the normalized overlay with its ratio panel.

use anyhow::{Context, Result};
use clap::Args;
use ov_root::RootFile;
use ov_viz::{OverlayArtifact, OverlayInputMeta, OverlayOptions, overlay::DEFAULT_RATIO_LABEL};
use ov_viz_render::config::VizConfig;
use sha2::{Digest, Sha256};
use std::io::{BufRead, Write};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Input ROOT file
    #[arg(short, long)]
    input: PathBuf,

    /// Reference ("truth") histogram key, e.g. `dir/hInvMass_RECOden`
    #[arg(short, long)]
    reference: String,

    /// Compared ("method") histogram key (repeatable)
    #[arg(short, long = "compare", required = true)]
    compare: Vec<String>,

    /// Output plot; format from the extension (svg, png, pdf)
    #[arg(short, long, default_value = "overlay.svg")]
    output: PathBuf,

    /// Also write the overlay artifact (pretty JSON)
    #[arg(long)]
    artifact: Option<PathBuf>,

    /// Plot configuration (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Built-in theme (cms, hep2026, atlas, minimal)
    #[arg(long)]
    theme: Option<String>,

    /// Integrated luminosity in fb^-1 shown in the header
    #[arg(long)]
    lumi: Option<f64>,

    /// Experiment status label (e.g. "Simulation", "Preliminary")
    #[arg(long)]
    status: Option<String>,

    /// Linear main-panel y axis instead of logarithmic
    #[arg(long)]
    linear: bool,

    /// Main-panel y range
    #[arg(long, num_args = 2, value_names = ["LO", "HI"], allow_negative_numbers = true)]
    y_range: Option<Vec<f64>>,

    /// Ratio-panel y range
    #[arg(long, num_args = 2, value_names = ["LO", "HI"], allow_negative_numbers = true)]
    ratio_range: Option<Vec<f64>>,

    /// Ratio-panel y label
    #[arg(long)]
    ratio_label: Option<String>,

    /// Wait for Enter before exiting
    #[arg(long)]
    pause: bool,
}

pub fn run(args: &CompareArgs) -> Result<()> {
    let config = plot_config(args)?;

    let file = RootFile::open(&args.input)
        .with_context(|| format!("failed to open ROOT file {}", args.input.display()))?;
    tracing::info!(path = %args.input.display(), "opened ROOT file");

    let reference = file
        .get_histogram(&args.reference)
        .with_context(|| format!("failed to read reference histogram '{}'", args.reference))?;
    tracing::info!(name = %reference.name, n_bins = reference.n_bins, "loaded reference");
    tracing::debug!(name = %reference.name, integral = reference.integral(), "raw integral");

    let mut compared = Vec::with_capacity(args.compare.len());
    for key in &args.compare {
        let h = file
            .get_histogram(key)
            .with_context(|| format!("failed to read compared histogram '{key}'"))?;
        tracing::info!(name = %h.name, n_bins = h.n_bins, "loaded compared histogram");
        tracing::debug!(name = %h.name, integral = h.integral(), "raw integral");
        compared.push(h);
    }

    let options = OverlayOptions {
        ratio_label: args.ratio_label.clone().unwrap_or_else(|| DEFAULT_RATIO_LABEL.to_string()),
        x_label: None,
        input: Some(OverlayInputMeta {
            path: args.input.display().to_string(),
            sha256: Some(sha256_file(&args.input)?),
        }),
    };
    let artifact = OverlayArtifact::from_histograms(&reference, &compared, &options)
        .context("failed to normalize histograms")?;

    {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        for c in &artifact.compared {
            writeln!(out, "Kappa is {}", format_kappa(c.kappa))?;
        }
        out.flush()?;
    }

    if let Some(path) = &args.artifact {
        std::fs::write(path, artifact.to_json()?)
            .with_context(|| format!("failed to write artifact {}", path.display()))?;
        tracing::info!(path = %path.display(), "artifact written");
    }

    ov_viz_render::render_to_file(&artifact, &args.output, &config)
        .with_context(|| format!("failed to render {}", args.output.display()))?;
    tracing::info!(path = %args.output.display(), "plot written");

    if args.pause {
        pause()?;
    }
    Ok(())
}

/// Config file + theme, then the command-line overrides.
fn plot_config(args: &CompareArgs) -> Result<VizConfig> {
    let mut config = crate::load_config(args.config.as_ref(), args.theme.as_deref())?;
    if let Some(lumi) = args.lumi {
        config.experiment.lumi_fb_inv = lumi;
    }
    if let Some(status) = &args.status {
        config.experiment.status = status.clone();
    }
    if args.linear {
        config.overlay.log_y = false;
    }
    if let Some(r) = &args.y_range {
        config.overlay.y_range = Some([r[0], r[1]]);
    }
    if let Some(r) = &args.ratio_range {
        config.overlay.ratio_y_range = [r[0], r[1]];
    }
    if let Some(label) = &args.ratio_label {
        config.overlay.ratio_label = Some(label.clone());
    }
    config.validate().context("invalid plot settings")?;
    Ok(config)
}

fn pause() -> Result<()> {
    eprint!("Press Enter to continue...");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(())
}

/// `%.12g`, with `.0` appended when the result reads as an integer.
fn format_kappa(x: f64) -> String {
    let mut s = format_g12(x);
    if !s.contains(['.', 'e', 'n']) {
        s.push_str(".0");
    }
    s
}

fn format_g12(x: f64) -> String {
    const PRECISION: i32 = 12;
    if !x.is_finite() {
        return if x.is_nan() { "nan".into() } else if x > 0.0 { "inf".into() } else { "-inf".into() };
    }
    if x == 0.0 {
        return "0".into();
    }
    // The exponent after rounding to 12 significant digits picks the style.
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, x);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    if exp < -4 || exp >= PRECISION {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exp.abs())
    } else {
        let fixed = format!("{:.*}", (PRECISION - 1 - exp) as usize, x);
        trim_fraction(&fixed).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') { s.trim_end_matches('0').trim_end_matches('.') } else { s }
}

fn sha256_file(path: &PathBuf) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(sha256_hex(&bytes))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    let out = h.finalize();
    let mut s = String::with_capacity(64);
    for b in out {
        s.push_str(&format!("{:02x}", b));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kappa_uses_twelve_significant_digits() {
        assert_eq!(format_kappa(0.2), "0.2");
        assert_eq!(format_kappa(1.0), "1.0");
        assert_eq!(format_kappa(1.0 / 3.0), "0.333333333333");
        assert_eq!(format_kappa(2.0 / 3.0), "0.666666666667");
        assert_eq!(format_kappa(1e20), "1e+20");
        assert_eq!(format_kappa(123456789012.0), "123456789012.0");
        assert_eq!(format_kappa(1234567890123.0), "1.23456789012e+12");
        assert_eq!(format_kappa(0.0001), "0.0001");
        assert_eq!(format_kappa(0.00001), "1e-05");
        assert_eq!(format_kappa(2.5e-7), "2.5e-07");
    }

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
