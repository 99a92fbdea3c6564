use clap::{Parser, ValueEnum};
use routemap::layout::LayoutEngine;
use routemap::loader;
use routemap::svg::SvgRenderer;
use routemap::{DataSources, DiagramOptions, LayoutConfig, StopId};
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Svg,
    Json,
}

/// Render the route diagram of a transit stop
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Bundle directory holding stops.min.json and services.min.json
    bundle: PathBuf,
    /// Stop to draw
    stop_id: String,
    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = Format::Svg)]
    format: Format,
    /// Maximum number of routes drawn
    #[arg(long)]
    max_routes: Option<usize>,
    /// Onward stops shown per route
    #[arg(long)]
    major_stops: Option<usize>,
    /// JSON file overriding layout constants
    #[arg(long)]
    config: Option<PathBuf>,
    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn fail(message: impl std::fmt::Display, code: i32) -> ! {
    eprintln!("{}", message);
    process::exit(code);
}

fn main() {
    let args = Args::parse();

    let level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .unwrap_or_else(|e| fail(format!("Failed to read {}: {}", path.display(), e), 1));
            serde_json::from_str::<LayoutConfig>(&text)
                .unwrap_or_else(|e| fail(format!("Invalid config {}: {}", path.display(), e), 1))
        }
        None => LayoutConfig::default(),
    };
    let engine =
        LayoutEngine::with_config(config).unwrap_or_else(|e| fail(format!("Invalid config: {}", e), 1));

    let defaults = DiagramOptions::default();
    let options = DiagramOptions {
        target_major_stops: args.major_stops.unwrap_or(defaults.target_major_stops),
        max_routes: args.max_routes.unwrap_or(defaults.max_routes),
    };

    let mut catalog = loader::from_dir(&args.bundle).unwrap_or_else(|e| fail(e, 1));
    let stop = StopId::new(&args.stop_id);
    loader::load_schedule(&mut catalog, &args.bundle, &stop);

    let sources = DataSources::from_catalog(&catalog);
    let diagram = match engine.compute(&sources, &stop, &options) {
        Ok(d) => d,
        Err(e) if e.is_empty_state() => fail(e, 2),
        Err(e) => fail(e, 1),
    };

    let output = match args.format {
        Format::Svg => SvgRenderer::default().render(&diagram),
        Format::Json => diagram.to_json(),
    };

    match args.output {
        Some(path) => {
            if let Err(e) = fs::write(&path, &output) {
                fail(format!("Failed to write {}: {}", path.display(), e), 1);
            }
        }
        None => print!("{}", output),
    }
}
