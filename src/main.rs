use anyhow::{Context, Result};
use barline::config::GraphConfig;
use barline::csv_reader;
use barline::data::FIELD_PERIOD;
use barline::dimension::{resolve_dimensions, ContainerConstraints, Measured};
use barline::graph::{render_spec, Size};
use barline::palette::ColorCache;
use barline::sizing::compute_sizing;
use clap::Parser;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "barline")]
#[command(about = "Generate bar/line chart specifications from CSV data", long_about = None)]
struct Args {
    #[arg(long = "config", help = "Graph configuration JSON file")]
    config: Option<PathBuf>,

    #[arg(long = "container", help = "Container size constraints JSON file")]
    container: Option<PathBuf>,

    #[arg(long = "measured-width", default_value = "800", help = "Measured container width in pixels")]
    measured_width: f64,

    #[arg(long = "measured-height", default_value = "600", help = "Measured container height in pixels")]
    measured_height: f64,

    #[arg(short = 't', long = "title", help = "Graph title (overrides the config file)")]
    title: Option<String>,

    #[arg(long = "fast-render", help = "Skip the cardinality pass when sizing labels")]
    fast_render: bool,

    #[arg(long = "pretty", help = "Pretty-print the JSON output")]
    pretty: bool,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log: Option<PathBuf>,
}

/// `RUST_LOG` wins; otherwise `warn`, or `debug` when logging to a file.
fn init_logging(log: Option<&Path>) -> Result<()> {
    let default_level = if log.is_some() { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log {
        Some(path) => {
            let file = fs::File::create(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.with_writer(Mutex::new(file)).with_ansi(false).init();
        }
        None => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}

fn read_json_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log.as_deref())?;

    let csv_data = csv_reader::read_csv_from_stdin().context("Failed to read CSV from stdin")?;
    let data = csv_reader::into_data_points(&csv_data).context("Failed to load data rows")?;

    let mut config = match &args.config {
        Some(path) => GraphConfig::from_json(&read_json_file(path)?)
            .with_context(|| format!("Invalid graph configuration in {}", path.display()))?,
        None => GraphConfig::default(),
    };
    if args.title.is_some() {
        config.title = args.title.clone();
    }
    config.fast_render |= args.fast_render;

    let constraints: ContainerConstraints = match &args.container {
        Some(path) => serde_json::from_str(&read_json_file(path)?)
            .with_context(|| format!("Invalid container constraints in {}", path.display()))?,
        None => ContainerConstraints::default(),
    };

    let measured = Measured {
        data_len: data.len(),
        width: args.measured_width,
        height: args.measured_height,
    };
    let dims = resolve_dimensions(&constraints, &measured);
    let sizing = compute_sizing(&data, dims.width, config.fast_render, FIELD_PERIOD);

    let mut cache = ColorCache::default();
    let size = Size { width: dims.width, height: dims.height };
    let spec = render_spec(&data, &config, size, &sizing, &mut cache).context("Failed to build specification")?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&spec)?
    } else {
        serde_json::to_string(&spec)?
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", json).context("Failed to write specification to stdout")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}
