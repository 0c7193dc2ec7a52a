use crate::color::Color;
use crate::config::*;

/// Built-in theme presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuiltinTheme {
    #[default]
    Cms,
    Hep2026,
    Atlas,
    Minimal,
}

impl BuiltinTheme {
    pub const NAMES: [&'static str; 4] = ["cms", "hep2026", "atlas", "minimal"];

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cms" => Some(Self::Cms),
            "hep2026" => Some(Self::Hep2026),
            "atlas" => Some(Self::Atlas),
            "minimal" => Some(Self::Minimal),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Cms => "cms",
            Self::Hep2026 => "hep2026",
            Self::Atlas => "atlas",
            Self::Minimal => "minimal",
        }
    }

    pub fn base_config(self) -> VizConfig {
        match self {
            Self::Cms => cms(),
            Self::Hep2026 => hep2026(),
            Self::Atlas => atlas(),
            Self::Minimal => minimal(),
        }
    }
}

/// ROOT-style CMS simulation plot: black reference, kAzure comparison, log y.
fn cms() -> VizConfig {
    VizConfig {
        theme: "cms".into(),
        figure: FigureConfig::default(),
        font: FontConfig::default(),
        axes: AxesConfig::default(),
        grid: GridConfig::default(),
        experiment: ExperimentConfig::default(),
        colors: ColorsConfig::default(),
        palette: "root_classic".into(),
        series_colors: Default::default(),
        output: OutputConfig::default(),
        overlay: OverlayConfig::default(),
    }
}

fn hep2026() -> VizConfig {
    VizConfig {
        theme: "hep2026".into(),
        figure: FigureConfig { width: 518.4, height: 432.0 },
        font: FontConfig { size: 10.0, label_size: 11.0, tick_size: 8.5 },
        axes: AxesConfig { tick_length: 5.0, ..AxesConfig::default() },
        grid: GridConfig { show: true, color: Color::hex("#CBD5E1"), alpha: 0.55 },
        experiment: ExperimentConfig {
            name: "HEP".into(),
            status: "Internal".into(),
            sqrt_s_tev: 13.6,
            lumi_fb_inv: 140.0,
        },
        colors: ColorsConfig {
            reference: Color::hex("#111827"),
            ratio_line: Color::hex("#94A3B8"),
        },
        palette: "hep2026".into(),
        ..cms()
    }
}

fn atlas() -> VizConfig {
    VizConfig {
        theme: "atlas".into(),
        figure: FigureConfig { width: 576.0, height: 504.0 },
        font: FontConfig { size: 11.0, label_size: 12.0, tick_size: 9.5 },
        experiment: ExperimentConfig {
            name: "ATLAS".into(),
            status: "Simulation Internal".into(),
            sqrt_s_tev: 13.0,
            lumi_fb_inv: 36.1,
        },
        palette: "atlas_wong".into(),
        ..cms()
    }
}

fn minimal() -> VizConfig {
    VizConfig {
        theme: "minimal".into(),
        figure: FigureConfig { width: 432.0, height: 360.0 },
        font: FontConfig { size: 9.0, label_size: 10.0, tick_size: 8.0 },
        axes: AxesConfig {
            tick_direction: "out".into(),
            show_top_ticks: false,
            show_right_ticks: false,
            tick_length: 4.0,
            minor_tick_length: 2.0,
        },
        experiment: ExperimentConfig {
            name: String::new(),
            status: String::new(),
            sqrt_s_tev: 0.0,
            lumi_fb_inv: 0.0,
        },
        palette: "tableau10".into(),
        overlay: OverlayConfig {
            legend: LegendConfig { frame: true, ..LegendConfig::default() },
            ..OverlayConfig::default()
        },
        ..cms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for name in BuiltinTheme::NAMES {
            let theme = BuiltinTheme::parse(name).unwrap();
            assert_eq!(theme.name(), name);
            assert_eq!(theme.base_config().theme, name);
        }
        assert_eq!(BuiltinTheme::parse("CMS"), Some(BuiltinTheme::Cms));
        assert_eq!(BuiltinTheme::parse("root"), None);
    }

    #[test]
    fn themes_keep_overlay_defaults() {
        for name in BuiltinTheme::NAMES {
            let c = BuiltinTheme::parse(name).unwrap().base_config();
            assert_eq!(c.overlay.ratio_y_range, [0.0, 2.5]);
            c.validate().unwrap();
        }
    }
}
