//! overlay CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

mod compare;

#[derive(Parser)]
#[command(name = "overlay")]
#[command(about = "Overlay - normalized histogram comparison with kappa")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize histograms to unit area, print kappa and draw the ratio plot
    Compare(compare::CompareArgs),

    /// List keys of a ROOT file (name, class, cycle)
    Ls {
        /// Input ROOT file
        #[arg(short, long)]
        input: PathBuf,

        /// Directory inside the file (`a/b`). Defaults to the top level.
        #[arg(long)]
        dir: Option<String>,
    },

    /// Re-render a saved overlay artifact (JSON)
    Render {
        /// Overlay artifact JSON
        #[arg(short, long)]
        input: PathBuf,

        /// Output plot; format from the extension (svg, png, pdf)
        #[arg(short, long)]
        output: PathBuf,

        /// Plot configuration (YAML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Built-in theme (cms, hep2026, atlas, minimal)
        #[arg(long)]
        theme: Option<String>,
    },

    /// Print version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Compare(args) => compare::run(&args),
        Commands::Ls { input, dir } => cmd_ls(&input, dir.as_deref()),
        Commands::Render { input, output, config, theme } => {
            cmd_render(&input, &output, config.as_ref(), theme.as_deref())
        }
        Commands::Version => {
            println!("overlay {}", ov_viz::VERSION);
            Ok(())
        }
    }
}

fn cmd_ls(input: &Path, dir: Option<&str>) -> Result<()> {
    let file = ov_root::RootFile::open(input)
        .with_context(|| format!("failed to open ROOT file {}", input.display()))?;
    let keys = match dir {
        Some(d) => file.list_keys_in(d),
        None => file.list_keys(),
    }
    .with_context(|| format!("failed to list keys of {}", input.display()))?;

    tracing::info!(n_keys = keys.len(), "listed keys");
    for k in keys {
        println!("{}\t{}\t{}", k.name, k.class_name, k.cycle);
    }
    Ok(())
}

fn cmd_render(
    input: &Path,
    output: &Path,
    config: Option<&PathBuf>,
    theme: Option<&str>,
) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read artifact {}", input.display()))?;
    let artifact = ov_viz::OverlayArtifact::from_json(&text)
        .with_context(|| format!("invalid overlay artifact {}", input.display()))?;
    let config = load_config(config, theme)?;

    ov_viz_render::render_to_file(&artifact, output, &config)
        .with_context(|| format!("failed to render {}", output.display()))?;
    tracing::info!(path = %output.display(), "plot written");
    Ok(())
}

/// Theme base config with the optional YAML file merged over it.
pub(crate) fn load_config(
    path: Option<&PathBuf>,
    theme: Option<&str>,
) -> Result<ov_viz_render::config::VizConfig> {
    let yaml = match path {
        Some(p) => Some(
            std::fs::read_to_string(p)
                .with_context(|| format!("failed to read config {}", p.display()))?,
        ),
        None => None,
    };
    Ok(ov_viz_render::config::resolve_config(yaml.as_deref(), theme)?)
}
