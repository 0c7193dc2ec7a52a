use serde::{Deserialize, Serialize};
use serde_yaml_ng::Value;
use std::collections::HashMap;

use crate::RenderError;
use crate::color::Color;
use crate::theme::BuiltinTheme;

/// Top-level visualization configuration (YAML or programmatic).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    pub theme: String,
    pub figure: FigureConfig,
    pub font: FontConfig,
    pub axes: AxesConfig,
    pub grid: GridConfig,
    pub experiment: ExperimentConfig,
    pub colors: ColorsConfig,
    pub palette: String,
    /// Per-histogram colors keyed by histogram name; overrides the palette.
    pub series_colors: HashMap<String, Color>,
    pub output: OutputConfig,
    pub overlay: OverlayConfig,
}

impl Default for VizConfig {
    fn default() -> Self {
        BuiltinTheme::default().base_config()
    }
}

impl VizConfig {
    pub fn palette_colors(&self) -> Vec<Color> {
        crate::color::palette_colors(&self.palette)
    }

    /// Color of the `index`-th compared series.
    pub fn series_color(&self, name: &str, index: usize) -> Color {
        if let Some(c) = self.series_colors.get(name) {
            return *c;
        }
        let palette = self.palette_colors();
        if palette.is_empty() { Color::hex("#888888") } else { palette[index % palette.len()] }
    }

    /// Reject settings no plot can be drawn with.
    pub fn validate(&self) -> crate::Result<()> {
        if !(self.figure.width > 0.0 && self.figure.height > 0.0) {
            return Err(RenderError::Config(format!(
                "figure size must be positive, got {}x{}",
                self.figure.width, self.figure.height
            )));
        }
        let ov = &self.overlay;
        if let Some([lo, hi]) = ov.y_range {
            if !(lo.is_finite() && hi.is_finite()) || hi <= lo {
                return Err(RenderError::Config(format!("invalid y_range [{lo}, {hi}]")));
            }
            if ov.log_y && lo <= 0.0 {
                return Err(RenderError::Config(format!(
                    "y_range lower bound must be > 0 on a log axis, got {lo}"
                )));
            }
        }
        let [lo, hi] = ov.ratio_y_range;
        if !(lo.is_finite() && hi.is_finite()) || hi <= lo {
            return Err(RenderError::Config(format!("invalid ratio_y_range [{lo}, {hi}]")));
        }
        if !(0.05..=0.8).contains(&ov.ratio_frac) {
            return Err(RenderError::Config(format!(
                "ratio_frac must lie in [0.05, 0.8], got {}",
                ov.ratio_frac
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: 576.0,  // 8" * 72
            height: 576.0, // 8" * 72
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub size: f64,
    pub label_size: f64,
    pub tick_size: f64,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self { size: 11.0, label_size: 12.0, tick_size: 10.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AxesConfig {
    pub tick_direction: String,
    pub show_top_ticks: bool,
    pub show_right_ticks: bool,
    pub tick_length: f64,
    pub minor_tick_length: f64,
}

impl Default for AxesConfig {
    fn default() -> Self {
        Self {
            tick_direction: "in".into(),
            show_top_ticks: true,
            show_right_ticks: true,
            tick_length: 6.0,
            minor_tick_length: 3.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub show: bool,
    pub color: Color,
    pub alpha: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { show: false, color: Color::hex("#CBD5E1"), alpha: 0.55 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub name: String,
    pub status: String,
    pub sqrt_s_tev: f64,
    pub lumi_fb_inv: f64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            name: "CMS".into(),
            status: "Simulation".into(),
            sqrt_s_tev: 13.0,
            lumi_fb_inv: 35.9,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorsConfig {
    pub reference: Color,
    pub ratio_line: Color,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        Self { reference: Color::rgb(0, 0, 0), ratio_line: Color::rgb(150, 150, 150) }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: String,
    pub dpi: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { format: "svg".into(), dpi: 220 }
    }
}

/// Settings of the overlay + ratio plot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub log_y: bool,
    /// Fixed main-panel y range; `None` autoscales to the data.
    pub y_range: Option<[f64; 2]>,
    pub ratio_y_range: [f64; 2],
    /// Overrides the ratio label stored in the artifact.
    pub ratio_label: Option<String>,
    pub y_label: String,
    pub show_errors: bool,
    /// Append `kappa = ...` to compared legend labels.
    pub show_kappa: bool,
    /// Fraction of the plotting height given to the ratio panel.
    pub ratio_frac: f64,
    pub legend: LegendConfig,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            log_y: true,
            y_range: Some([0.001, 100.0]),
            ratio_y_range: [0.0, 2.5],
            ratio_label: None,
            y_label: "Normalized entries".into(),
            show_errors: true,
            show_kappa: true,
            ratio_frac: 0.3,
            legend: LegendConfig::default(),
        }
    }
}

/// Legend box in fractions of the main panel, measured from its lower-left corner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendConfig {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub frame: bool,
    pub fill: Option<Color>,
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self {
            x1: 0.22,
            y1: 0.56,
            x2: 0.69,
            y2: 0.72,
            frame: false,
            fill: Some(Color::rgb(255, 255, 255)),
        }
    }
}

/// Resolve a VizConfig from an optional YAML string and theme name.
///
/// The theme is `theme_override`, else the YAML's `theme` key, else the default.
/// Keys present in the YAML are deep-merged over that theme's base config.
pub fn resolve_config(user_yaml: Option<&str>, theme_override: Option<&str>) -> crate::Result<VizConfig> {
    let user: Value = match user_yaml {
        Some(yaml) => {
            serde_yaml_ng::from_str(yaml).map_err(|e| RenderError::Config(e.to_string()))?
        }
        None => Value::Null,
    };
    if !matches!(user, Value::Null | Value::Mapping(_)) {
        return Err(RenderError::Config("config root must be a mapping".into()));
    }

    let theme_name = theme_override
        .map(str::to_string)
        .or_else(|| user.get("theme").and_then(Value::as_str).map(str::to_string));
    let theme = match theme_name {
        Some(name) => BuiltinTheme::parse(&name).ok_or_else(|| {
            RenderError::Config(format!(
                "unknown theme '{name}' (expected one of: {})",
                BuiltinTheme::NAMES.join(", ")
            ))
        })?,
        None => BuiltinTheme::default(),
    };

    let mut base = serde_yaml_ng::to_value(theme.base_config())
        .map_err(|e| RenderError::Config(e.to_string()))?;
    if let Value::Mapping(_) = user {
        merge(&mut base, user);
    }
    let mut config: VizConfig =
        serde_yaml_ng::from_value(base).map_err(|e| RenderError::Config(e.to_string()))?;
    config.theme = theme.name().to_string();
    config.validate()?;
    Ok(config)
}

fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(b), Value::Mapping(o)) => {
            for (k, v) in o {
                match b.get_mut(&k) {
                    Some(slot) => merge(slot, v),
                    None => {
                        b.insert(k, v);
                    }
                }
            }
        }
        (slot, v) => *slot = v,
    }
}
