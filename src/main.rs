use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;

use cellmachine::game::cells::core::LEGACY_CELLS;
use cellmachine::game::config::{SimConfig, DEFAULT_CONFIG_PATH};
use cellmachine::game::level_code;
use cellmachine::game::registry::{CellTypeKey, Registry};
use cellmachine::game::simulation::{CellMachinePlugin, SimRegistry, SimSet, Simulation};
use cellmachine::game::CellGrid;

use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

/// Headless cell grid runner.
#[derive(Parser, Debug)]
#[command(name = "cellmachine", version, about)]
struct Cli {
    /// RON config file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Level code to start from
    #[arg(long, conflicts_with = "level_file")]
    level: Option<String>,
    /// File holding a level code
    #[arg(long)]
    level_file: Option<PathBuf>,
    /// Stop after this many ticks (overrides `max_ticks`)
    #[arg(long)]
    ticks: Option<u64>,
    /// Level code format printed at exit (overrides `export_format`)
    #[arg(long)]
    format: Option<String>,
    /// Fill empty slots of a blank grid with random cells at this density
    #[arg(long)]
    random: Option<f64>,
    /// RNG seed (overrides `seed`)
    #[arg(long)]
    seed: Option<u64>,
}

fn setup_file_logging(default_filter: &str) -> String {
    let log_dir = PathBuf::from("logs");
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("Failed to create logs directory: {}", e);
    }

    // Clean up old log files, keeping only the last 25
    cleanup_old_logs(&log_dir, 25);

    let now = chrono::Local::now();
    let log_filename = format!("cellmachine_{}.log", now.format("%Y%m%d_%H%M%S"));
    let log_path_str = log_dir.join(&log_filename).to_string_lossy().to_string();

    let file_appender = RollingFileAppender::new(
        Rotation::NEVER, // Don't rotate during a single run
        &log_dir,
        &log_filename,
    );

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    log_path_str
}

fn cleanup_old_logs(log_dir: &Path, keep_count: usize) {
    if let Ok(entries) = fs::read_dir(log_dir) {
        let mut log_files: Vec<_> = entries
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|s| s.starts_with("cellmachine") && s.ends_with(".log"))
                    .unwrap_or(false)
            })
            .collect();

        // Sort by modified time (oldest first)
        log_files.sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()));

        if log_files.len() > keep_count {
            for file in log_files.iter().take(log_files.len() - keep_count) {
                let _ = fs::remove_file(file.path());
            }
        }
    }
}

/// The log filter has to be known before the config is loaded (and logged).
fn peek_log_filter(path: &Path) -> String {
    fs::read_to_string(path)
        .ok()
        .and_then(|contents| SimConfig::from_ron(&contents).ok())
        .map(|config| config.log_filter)
        .unwrap_or_else(|| SimConfig::default().log_filter)
}

fn initial_grid(cli: &Cli, config: &SimConfig, registry: &Arc<Registry>) -> Result<CellGrid, String> {
    let code = match (&cli.level, &cli.level_file) {
        (Some(code), _) => Some(code.clone()),
        (None, Some(path)) => Some(
            fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))?,
        ),
        (None, None) => None,
    };

    let mut grid = match code {
        Some(code) => level_code::import(registry, &code).map_err(|e| e.to_string())?,
        None => CellGrid::new(Arc::clone(registry), config.default_width, config.default_height)
            .with_border(config.border_mode),
    };
    grid.reseed(config.seed);

    if let Some(density) = cli.random {
        let palette: Vec<CellTypeKey> = LEGACY_CELLS.iter().filter_map(|id| registry.key_of(id)).collect();
        grid.generate_random(&palette, density, config.seed);
    }
    Ok(grid)
}

/// Print the final level code and stop once `max_ticks` is reached.
fn report_and_exit(
    sim: Res<Simulation>,
    config: Res<SimConfig>,
    mut exit: MessageWriter<AppExit>,
) {
    let Some(max_ticks) = config.max_ticks else { return };
    if sim.tick() < max_ticks {
        return;
    }

    match sim.grid.export(&config.export_format) {
        Ok(code) => {
            info!("Finished after {} ticks", sim.tick());
            println!("{}", code);
            exit.write(AppExit::Success);
        }
        Err(e) => {
            error!("Failed to export grid as {}: {}", config.export_format, e);
            exit.write(AppExit::error());
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_file = setup_file_logging(&peek_log_filter(&cli.config));
    info!("Logging to {}", log_file);

    let mut config = SimConfig::load(&cli.config);
    if let Some(ticks) = cli.ticks {
        config.max_ticks = Some(ticks);
    }
    if let Some(format) = &cli.format {
        config.export_format = format.clone();
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    let registry = Arc::new(Registry::with_builtins());
    let grid = match initial_grid(&cli, &config, &registry) {
        Ok(grid) => grid,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(
        "Starting {}x{} grid with {} cells at {} ticks/s",
        grid.size.width,
        grid.size.height,
        grid.cell_count(),
        config.tick_rate
    );

    let mut simulation = Simulation::new(grid);
    simulation.running = true;

    let tick_interval = Duration::from_secs_f64(config.tick_interval());
    let exit = App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(tick_interval)))
        .insert_resource(config)
        .insert_resource(SimRegistry(registry))
        .insert_resource(simulation)
        .add_plugins(CellMachinePlugin)
        .add_systems(Update, report_and_exit.after(SimSet::Input).before(SimSet::Tick))
        .run();

    match exit {
        AppExit::Success => ExitCode::SUCCESS,
        AppExit::Error(code) => ExitCode::from(code.get()),
    }
}
