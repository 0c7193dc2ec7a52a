//! Normalized overlay artifacts: a reference histogram, one or more compared
//! histograms scaled to unit area, their kappa factors, and the bin-by-bin
//! ratio `compared / reference` (numbers-first).

use std::time::{SystemTime, UNIX_EPOCH};

use ov_root::{Histogram, kappa};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Schema tag written into every overlay artifact.
pub const SCHEMA_VERSION: &str = "overlay_v1";

/// Default ratio-panel label.
pub const DEFAULT_RATIO_LABEL: &str = "method / truth";

/// Plot-friendly artifact for a normalized comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayArtifact {
    /// Always [`SCHEMA_VERSION`].
    pub schema_version: String,
    /// Provenance.
    pub meta: OverlayMeta,
    /// Shared bin edges (`n_bins + 1`).
    pub bin_edges: Vec<f64>,
    /// X-axis label (reference histogram's axis title unless overridden).
    pub x_label: String,
    /// Ratio panel y-axis label.
    pub ratio_label: String,
    /// How ratio bins are formed.
    pub ratio_policy: RatioPolicy,
    /// Reference ("truth") histogram, normalized.
    pub reference: HistogramSeries,
    /// Compared ("method") histograms, normalized, each with kappa and ratio.
    pub compared: Vec<ComparedSeries>,
}

/// Provenance of an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayMeta {
    /// Producing tool name.
    pub tool: String,
    /// Producing tool version.
    pub tool_version: String,
    /// Creation time (milliseconds since the Unix epoch).
    pub created_unix_ms: u128,
    /// Input file, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<OverlayInputMeta>,
}

/// Input file the histograms were read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayInputMeta {
    /// Path as given on the command line.
    pub path: String,
    /// Hex SHA-256 of the file contents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// Ratio definition recorded alongside the ratio series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioPolicy {
    /// Denominator series name (the reference histogram).
    pub denominator: String,
    /// Bins with a zero denominator are reported as `"zero"` (content 0, error 0).
    pub zero_policy: String,
}

/// One normalized histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSeries {
    /// Key name in the input file.
    pub name: String,
    /// Histogram title (legend text).
    pub title: String,
    /// Raw integral before normalization.
    pub integral: f64,
    /// `fEntries` as stored.
    pub entries: f64,
    /// Normalized bin contents.
    pub y: Vec<f64>,
    /// Normalized per-bin errors.
    pub yerr: Vec<f64>,
}

/// A compared histogram with its scale factor and ratio to the reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparedSeries {
    /// The normalized histogram.
    #[serde(flatten)]
    pub series: HistogramSeries,
    /// `integral(compared) / integral(reference)` on raw integrals.
    pub kappa: f64,
    /// `normalized(compared) / normalized(reference)` per bin.
    pub ratio_y: Vec<f64>,
    /// Propagated ratio errors.
    pub ratio_yerr: Vec<f64>,
}

/// Options for [`OverlayArtifact::from_histograms`].
#[derive(Debug, Clone)]
pub struct OverlayOptions {
    /// Ratio panel label.
    pub ratio_label: String,
    /// X-axis label override.
    pub x_label: Option<String>,
    /// Input file provenance.
    pub input: Option<OverlayInputMeta>,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self { ratio_label: DEFAULT_RATIO_LABEL.to_string(), x_label: None, input: None }
    }
}

fn now_unix_ms() -> Result<u128> {
    let d = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| Error::Computation(format!("system time error: {}", e)))?;
    Ok(d.as_millis())
}

fn series(raw: &Histogram, normalized: &Histogram) -> HistogramSeries {
    HistogramSeries {
        name: raw.name.clone(),
        title: raw.title.clone(),
        integral: raw.integral(),
        entries: raw.entries,
        y: normalized.bin_content.clone(),
        yerr: normalized.errors(),
    }
}

impl OverlayArtifact {
    /// Normalize `reference` and every `compared` histogram and build the artifact.
    ///
    /// Kappa is taken on the raw integrals; inputs are never modified.
    pub fn from_histograms(
        reference: &Histogram,
        compared: &[Histogram],
        options: &OverlayOptions,
    ) -> Result<Self> {
        if compared.is_empty() {
            return Err(Error::Validation("at least one compared histogram is required".into()));
        }

        let reference_norm = reference.normalized()?;
        let mut compared_out = Vec::with_capacity(compared.len());
        for h in compared {
            let norm = h.normalized()?;
            reference.check_compatible(h)?;
            let k = kappa(reference, h)?;
            let ratio = norm.divide(&reference_norm)?;
            compared_out.push(ComparedSeries {
                series: series(h, &norm),
                kappa: k,
                ratio_yerr: ratio.errors(),
                ratio_y: ratio.bin_content,
            });
        }

        Ok(Self {
            schema_version: SCHEMA_VERSION.to_string(),
            meta: OverlayMeta {
                tool: "overlay".to_string(),
                tool_version: crate::VERSION.to_string(),
                created_unix_ms: now_unix_ms()?,
                input: options.input.clone(),
            },
            bin_edges: reference.bin_edges.clone(),
            x_label: options.x_label.clone().unwrap_or_else(|| reference.x_title.clone()),
            ratio_label: options.ratio_label.clone(),
            ratio_policy: RatioPolicy {
                denominator: reference.name.clone(),
                zero_policy: "zero".to_string(),
            },
            reference: series(reference, &reference_norm),
            compared: compared_out,
        })
    }

    /// Number of bins.
    pub fn n_bins(&self) -> usize {
        self.bin_edges.len().saturating_sub(1)
    }

    /// Check schema tag and that every series has one value per bin.
    pub fn validate(&self) -> Result<()> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(Error::Validation(format!(
                "unsupported schema_version '{}' (expected '{}')",
                self.schema_version, SCHEMA_VERSION
            )));
        }
        let n = self.n_bins();
        if n == 0 {
            return Err(Error::Validation("bin_edges must contain at least two values".into()));
        }
        if self.bin_edges.iter().any(|e| !e.is_finite())
            || self.bin_edges.windows(2).any(|w| w[1] <= w[0])
        {
            return Err(Error::Validation("bin_edges must be finite and strictly increasing".into()));
        }
        if self.compared.is_empty() {
            return Err(Error::Validation("artifact has no compared series".into()));
        }

        let check = |what: &str, name: &str, len: usize| {
            if len == n {
                Ok(())
            } else {
                Err(Error::Validation(format!("{name}: {what} has {len} values, expected {n}")))
            }
        };
        let r = &self.reference;
        check("y", &r.name, r.y.len())?;
        check("yerr", &r.name, r.yerr.len())?;
        for c in &self.compared {
            let name = &c.series.name;
            check("y", name, c.series.y.len())?;
            check("yerr", name, c.series.yerr.len())?;
            check("ratio_y", name, c.ratio_y.len())?;
            check("ratio_yerr", name, c.ratio_yerr.len())?;
        }
        Ok(())
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate an artifact.
    pub fn from_json(s: &str) -> Result<Self> {
        let artifact: Self = serde_json::from_str(s)?;
        artifact.validate()?;
        Ok(artifact)
    }
}
