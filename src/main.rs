//! gamewindow-pad - gamepad monitor
//!
//! Opens one logical window, focuses it, and prints the gamepad callbacks the
//! joystick manager routes to it.

use anyhow::Result;
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, trace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gamewindow_pad::config::{AppConfig, MappingWatcher};
use gamewindow_pad::input::gamepad::backend::DeviceHandle;
use gamewindow_pad::input::gamepad::diagnostics::{collect_device_reports, format_device_report};
use gamewindow_pad::{
    paths, Backend, GameWindow, GamepadEvent, JoystickManager, VirtualBackend, VirtualJoystick,
};

/// Gamepad monitor for focus-routed game windows
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Extra mapping database files
    #[arg(short, long, num_args = 1..)]
    mappings: Vec<PathBuf>,

    /// Print the detected devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Use a simulated joystick instead of real hardware
    #[arg(long)]
    simulate: bool,

    /// Stop after this many frames
    #[arg(long)]
    frames: Option<u64>,
}

fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level)?;

    info!("Starting gamewindow-pad v{}...", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config.display());

    let mut config = AppConfig::load_or_default(&args.config)?;
    config.gamepad.mapping_files.extend(args.mappings.iter().cloned());
    config.validate()?;

    if args.simulate {
        let manager = JoystickManager::new(VirtualBackend::default(), config.manager_config());
        return run(manager, &config, &args, simulate_frame);
    }

    run_native(&config, &args)
}

#[cfg(feature = "gilrs")]
fn run_native(config: &AppConfig, args: &Args) -> Result<()> {
    let backend = gamewindow_pad::GilrsBackend::new()?;
    let manager = JoystickManager::new(backend, config.manager_config());
    run(manager, config, args, |_, _| {})
}

#[cfg(not(feature = "gilrs"))]
fn run_native(_config: &AppConfig, _args: &Args) -> Result<()> {
    anyhow::bail!("built without a native joystick backend; run with --simulate")
}

/// Load mappings, open the window and drive the frame loop
fn run<B, F>(
    mut manager: JoystickManager<B>,
    config: &AppConfig,
    args: &Args,
    mut on_frame: F,
) -> Result<()>
where
    B: Backend,
    F: FnMut(&mut B, u64),
{
    let report = manager.init();
    info!("{} mapping(s) loaded, {} rejected", report.added(), report.errors.len());

    if args.list_devices {
        on_frame(manager.backend_mut(), 0);
        list_devices(manager.backend());
        return Ok(());
    }

    let watcher = if config.gamepad.watch_mappings {
        let mut files = paths::mapping_db_candidates();
        files.extend(config.gamepad.mapping_files.iter().cloned());
        Some(MappingWatcher::new(&files)?)
    } else {
        None
    };

    let window = GameWindow::new("main").on_event(print_event);
    let window = manager.add_window(Box::new(window));
    manager.on_window_focused(window, true);

    let interval = Duration::from_millis(config.poll_interval_ms);
    let mut frame = 0u64;
    while args.frames.map_or(true, |limit| frame < limit) {
        if let Some(watcher) = &watcher {
            while let Some(update) = watcher.try_recv() {
                info!("Reloading mappings from {}", update.path.display());
                manager.add_mappings(&update.text);
            }
        }

        on_frame(manager.backend_mut(), frame);
        manager.poll_events();
        manager.update(window);

        frame += 1;
        std::thread::sleep(interval);
    }

    info!("Stopped after {} frame(s)", frame);
    Ok(())
}

fn print_event(event: GamepadEvent) {
    match event {
        GamepadEvent::Connection { connected, .. } => {
            let text = event.to_string();
            info!("{}", if connected { text.green() } else { text.red() });
        }
        GamepadEvent::Button { .. } => info!("{}", event.to_string().yellow()),
        GamepadEvent::Axis { .. } => trace!("{}", event),
    }
}

fn list_devices<B: Backend>(backend: &B) {
    println!("\n{}", "=== Detected Devices ===".bold().cyan());
    let reports = collect_device_reports(backend);
    if reports.is_empty() {
        println!("{}", "No joysticks detected".yellow());
    }
    for report in &reports {
        println!();
        for line in format_device_report(report) {
            println!("{}", line);
        }
    }
    println!();
}

/// Scripted input for `--simulate`: an unmapped stick that presses, sweeps and
/// cycles its hat
fn simulate_frame(backend: &mut VirtualBackend, frame: u64) {
    const STICK: DeviceHandle = DeviceHandle(0);

    if frame == 0 {
        backend.connect(VirtualJoystick::new(
            "Simulated Arcade Stick",
            "03000000de280000fc11000001000000",
            4,
            12,
            1,
        ));
        return;
    }

    backend.set_button(STICK, 0, (frame / 30) % 2 == 1);
    backend.set_axis(STICK, 0, (frame % 120) as f32 / 60.0 - 1.0);
    backend.set_hat(STICK, 0, 1 << ((frame / 45) % 4));
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}
