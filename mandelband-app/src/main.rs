mod app_dir;
mod explorer;
mod preferences;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use mandelband_core::{Canvas, EscapeTime, Viewport};
use mandelband_render::{export_png, CancelPolicy, ExportMetadata};

use explorer::{Explorer, ExplorerSettings, InputEvent};
use preferences::AppPreferences;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser)]
#[command(
    name = "mandelband",
    about = "Render a Mandelbrot view, optionally replaying zoom and history input"
)]
struct Args {
    /// Initial view as a query string, e.g. `x=-2.75&y=-1.5&scale=200`
    #[arg(long, default_value = "")]
    query: String,

    /// JSON-lines file of input events to replay after the first frame
    #[arg(long)]
    script: Option<PathBuf>,

    /// Where to write the final frame (defaults to images/ next to the binary)
    #[arg(long)]
    out: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    #[arg(long)]
    max_iterations: Option<u32>,

    /// Compute threads (0 = one per core)
    #[arg(long)]
    pool_size: Option<usize>,

    #[arg(long)]
    band_height: Option<u32>,

    /// `respawn` or `retain`
    #[arg(long, value_parser = parse_cancel_policy)]
    cancel_policy: Option<CancelPolicy>,

    /// Write the effective preferences next to the binary and continue
    #[arg(long)]
    save_preferences: bool,
}

fn parse_cancel_policy(s: &str) -> Result<CancelPolicy, String> {
    match s {
        "respawn" => Ok(CancelPolicy::Respawn),
        "retain" => Ok(CancelPolicy::Retain),
        other => Err(format!("unknown cancel policy {other:?}")),
    }
}

impl Args {
    fn apply(&self, prefs: &mut AppPreferences) {
        if let Some(v) = self.width {
            prefs.width = v;
        }
        if let Some(v) = self.height {
            prefs.height = v;
        }
        if let Some(v) = self.max_iterations {
            prefs.max_iterations = v;
        }
        if let Some(v) = self.pool_size {
            prefs.pool_size = v;
        }
        if let Some(v) = self.band_height {
            prefs.band_height = v;
        }
        if let Some(v) = self.cancel_policy {
            prefs.cancel_policy = v;
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Mandelband");

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), BoxError> {
    let mut prefs = AppPreferences::load();
    args.apply(&mut prefs);
    if args.save_preferences {
        prefs.save_to(&app_dir::exe_directory().join("preferences.json"));
    }

    let canvas = Canvas::new(prefs.width, prefs.height, prefs.pixel_ratio)?;
    let viewport = Viewport::from_query(&args.query, prefs.width, prefs.height)?;
    let timeout = Duration::from_millis(prefs.frame_timeout_ms);

    let mut explorer = Explorer::new(
        EscapeTime,
        canvas,
        viewport,
        ExplorerSettings {
            max_iterations: prefs.max_iterations,
            scheduler: prefs.scheduler_config(),
            history_capacity: prefs.history_capacity,
        },
    )?;

    explorer.start()?;
    settle(&mut explorer, timeout);

    if let Some(script) = &args.script {
        for event in read_script(script)? {
            explorer.handle(event)?;
            if let Some(rect) = explorer.selection_overlay() {
                debug!(?rect, "Selection");
            }
            explorer.tick();
        }
        settle(&mut explorer, timeout);
        info!(
            depth = explorer.history().len(),
            scale = explorer.viewport().scale,
            "Script replayed"
        );
    }

    let out = match &args.out {
        Some(path) => path.clone(),
        None => {
            let dir = app_dir::images_directory();
            fs::create_dir_all(&dir)?;
            dir.join("mandelband.png")
        }
    };
    export_png(
        explorer.raster(),
        &out,
        &ExportMetadata {
            query: explorer.query(),
            max_iterations: prefs.max_iterations,
        },
    )?;
    info!(query = %explorer.query(), "Wrote {}", out.display());
    Ok(())
}

fn settle(explorer: &mut Explorer<EscapeTime>, timeout: Duration) {
    if explorer.settle(timeout).is_none() {
        warn!(
            generation = explorer.generation(),
            status = ?explorer.status(),
            "Frame did not complete within {} ms",
            timeout.as_millis()
        );
    }
}

/// One JSON object per line; blank lines are skipped.
fn read_script(path: &Path) -> Result<Vec<InputEvent>, BoxError> {
    let text = fs::read_to_string(path)?;
    let mut events = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event = serde_json::from_str(line)
            .map_err(|e| format!("{}:{}: {e}", path.display(), n + 1))?;
        events.push(event);
    }
    Ok(events)
}
