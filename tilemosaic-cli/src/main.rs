use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tilemosaic::io::{load_gray_image, save_gray_image};
use tilemosaic::{
    register, validate, Blend, ForwardAxis, RegistrationConfig, SearchWindow, Shift, SolverReport,
    SolverStatus,
};
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Register and blend two tiles (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ForwardAxisConfig {
    Horizontal,
    Vertical,
}

impl From<ForwardAxisConfig> for ForwardAxis {
    fn from(value: ForwardAxisConfig) -> Self {
        match value {
            ForwardAxisConfig::Horizontal => ForwardAxis::Horizontal,
            ForwardAxisConfig::Vertical => ForwardAxis::Vertical,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchWindowJson {
    rows: Option<(isize, isize)>,
    cols: Option<(isize, isize)>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RegisterConfigJson {
    upsample_factor: usize,
    blur_sigma: f64,
    forward_axis: ForwardAxisConfig,
    search_window: Option<SearchWindowJson>,
}

impl Default for RegisterConfigJson {
    fn default() -> Self {
        let cfg = RegistrationConfig::default();
        Self {
            upsample_factor: cfg.upsample_factor,
            blur_sigma: cfg.blur_sigma,
            forward_axis: ForwardAxisConfig::Horizontal,
            search_window: None,
        }
    }
}

impl From<RegisterConfigJson> for RegistrationConfig {
    fn from(value: RegisterConfigJson) -> Self {
        Self {
            search_window: value.search_window.map(|w| SearchWindow {
                rows: w.rows,
                cols: w.cols,
            }),
            upsample_factor: value.upsample_factor,
            blur_sigma: value.blur_sigma,
            forward_axis: value.forward_axis.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct BlendConfigJson {
    method: String,
    options: BTreeMap<String, f64>,
}

impl Default for BlendConfigJson {
    fn default() -> Self {
        Self {
            method: "pyramid".to_string(),
            options: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    first_path: String,
    second_path: String,
    output_path: String,
    report_path: Option<String>,
    shift: Option<(f64, f64)>,
    register: RegisterConfigJson,
    blend: BlendConfigJson,
}

#[derive(Debug, Serialize)]
struct SolverRecord {
    status: &'static str,
    iterations: usize,
    residual: f64,
}

impl From<SolverReport> for SolverRecord {
    fn from(value: SolverReport) -> Self {
        let status = match value.status {
            SolverStatus::Converged => "converged",
            SolverStatus::MaxIterations => "max_iterations",
            SolverStatus::Diverged => "diverged",
        };
        Self {
            status,
            iterations: value.iterations,
            residual: value.residual,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    shift: [f64; 2],
    error: Option<f64>,
    phase_diff: Option<f64>,
    method: String,
    solver: Option<SolverRecord>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("tilemosaic=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.first_path.is_empty() || config.second_path.is_empty() || config.output_path.is_empty() {
        return Err("first_path, second_path and output_path must be set in the config".into());
    }
    // Fail on bad blend options before the expensive registration.
    let strategy = validate(&config.blend.method, config.blend.options)?;

    let first = load_gray_image(&config.first_path)?;
    let second = load_gray_image(&config.second_path)?;

    let (shift, error, phase_diff) = match config.shift {
        Some((dy, dx)) => (Shift::new(dy, dx), None, None),
        None => {
            let result = register(&first, &second, &config.register.into())?;
            tracing::info!(
                dy = result.shift.dy,
                dx = result.shift.dx,
                error = result.error,
                "registered tiles"
            );
            (result.shift, Some(result.error), Some(result.phase_diff))
        }
    };

    let blended = strategy.blend(&first, &second, shift)?;
    save_gray_image(&config.output_path, &blended.image)?;

    let output = Output {
        shift: [shift.dy, shift.dx],
        error,
        phase_diff,
        method: config.blend.method,
        solver: blended.solver.map(SolverRecord::from),
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.report_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
