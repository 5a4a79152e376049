use clap::{Parser, Subcommand};
use photo_map::core::{GeoPoint, GeoProjection, Projection};
use photo_map::replay::replay_files;
use photo_map::workflow::{PersistedState, WorkflowParams};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "photo-map")]
#[command(about = "Replay and inspect photo-map calibration sessions")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Emit logs as JSON (requires the `tracing` feature)
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a JSON event trace and report what the workflow showed
    Replay {
        /// JSON array of events
        trace: PathBuf,
        /// Workflow parameters; defaults when omitted
        #[arg(long)]
        params: Option<PathBuf>,
        /// Snapshot to restore before the first event
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Write the report here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Project a GPS position through a saved calibration
    Project {
        #[arg(long)]
        snapshot: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Print the default workflow parameters as JSON
    Params {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    match cli.command {
        Command::Replay {
            trace,
            params,
            snapshot,
            out,
        } => {
            let report = replay_files(&trace, params.as_deref(), snapshot.as_deref())?;
            match out {
                Some(path) => {
                    report.write_json(&path)?;
                    log::info!("wrote {} frames to {}", report.frames.len(), path.display());
                }
                None => println!("{}", report.to_json_pretty()?),
            }
        }
        Command::Project { snapshot, lat, lon } => {
            let state = PersistedState::load_json(&snapshot)?;
            let mut projection = GeoProjection::new();
            if let Some(a) = state.point_a {
                projection.set_anchor_a(a.image, a.world);
            }
            if let Some(b) = state.point_b {
                projection.set_anchor_b(b.image, b.world);
            }
            match projection.compute() {
                Projection::Ready(t) => {
                    let p = t.apply(GeoPoint::new(lat, lon));
                    println!("{}", serde_json::to_string(&p)?);
                }
                Projection::NotReady => return Err("snapshot has fewer than two anchors".into()),
                Projection::Degenerate(reason) => return Err(reason.into()),
            }
        }
        Command::Params { out } => {
            let params = WorkflowParams::default();
            match out {
                Some(path) => params.write_json(&path)?,
                None => println!("{}", serde_json::to_string_pretty(&params)?),
            }
        }
    }
    Ok(())
}

#[cfg(feature = "tracing")]
fn init_logging(json: bool) {
    photo_map::core::init_tracing(json);
    let _ = tracing_log::LogTracer::init();
}

#[cfg(not(feature = "tracing"))]
fn init_logging(json: bool) {
    if json {
        eprintln!("--json-logs needs the `tracing` feature; using plain logs");
    }
    let _ = photo_map::core::init_from_env(log::LevelFilter::Warn);
}
