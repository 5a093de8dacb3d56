//! Flip-dot board renderer
//!
//! Renders a scene at a fixed frame rate and drives a flip-dot panel,
//! either a physical controller on a serial line or the panel simulator
//! over TCP. Only frames that differ from what the panel already shows are
//! sent.
//!
//! # Features
//!
//! - **Fixed-rate ticker**: deadline-paced render loop, stopped cleanly on Ctrl+C
//! - **Two-level output**: every frame is thresholded to pure on/off dots
//! - **Dirty tracking**: unchanged frames never touch the wire; failed writes retry
//! - **Transports**: serial controller (requires `serial` feature) or TCP simulator
//! - **Development mode**: write a PNG preview instead of driving a display
//!
//! # Usage
//!
//! ```bash
//! # Drive the board on the default serial port
//! flipdot-board run
//!
//! # Send frames to the simulator on 127.0.0.1:3000
//! flipdot-board run --simulator
//!
//! # Only write output/frame.png every tick
//! flipdot-board run --dev
//!
//! # Show the effective settings for a config file
//! flipdot-board config -c flipdot.toml
//!
//! # List serial ports (requires serial feature)
//! flipdot-board ports
//! ```
//!
//! While running, each line on stdin is a game command: an empty line or
//! `turn` uses up a turn, `reset` starts over, `quit` exits.

mod app;
mod config;
mod display;
mod frame;
mod scene;
mod ticker;
mod transport;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tokio::io::BufReader;
use tokio::sync::watch;

use app::{Output, RenderStep};
use config::Settings;
use display::Display;
use scene::{read_commands, Scene};
use ticker::Ticker;
use transport::{TransportConfig, DEFAULT_BAUD_RATE, DEFAULT_SERIAL_PATH};

/// Flip-dot board renderer
#[derive(Parser)]
#[command(name = "flipdot-board")]
#[command(version = "0.1.0")]
#[command(about = "Render a scene at a fixed frame rate onto a flip-dot panel")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (per-frame timing)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render frames until interrupted
    Run(RunArgs),

    /// Print the effective settings as TOML
    Config(RunArgs),

    /// List available serial ports (requires --features serial)
    #[cfg(feature = "serial")]
    Ports,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Frames per second
    #[arg(long)]
    fps: Option<u32>,

    /// Write PNG previews instead of driving a display
    #[arg(long)]
    dev: bool,

    /// Send frames to the network simulator
    #[arg(long)]
    simulator: bool,

    /// Serial port of the controller (e.g., /dev/ttyACM0)
    #[arg(long, value_name = "PATH")]
    serial_port: Option<String>,

    /// Serial baud rate
    #[arg(short, long)]
    baud: Option<u32>,

    /// Simulator host
    #[arg(long)]
    host: Option<String>,

    /// Simulator port
    #[arg(long)]
    port: Option<u16>,

    /// Do not mirror the image horizontally
    #[arg(long)]
    no_mirror: bool,

    /// Turns left at startup
    #[arg(long)]
    turns_left: Option<u8>,

    /// Preview path in development mode
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl RunArgs {
    /// Load the config file, if any, and apply command-line overrides
    fn resolve(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };

        if let Some(fps) = self.fps {
            settings.fps = fps;
        }
        if self.dev {
            settings.dev = true;
        }
        if self.no_mirror {
            settings.mirrored = false;
        }
        if let Some(turns_left) = self.turns_left {
            settings.turns_left = turns_left;
        }
        if let Some(ref output) = self.output {
            settings.output = output.clone();
        }

        if self.simulator || self.host.is_some() || self.port.is_some() {
            let current = match &settings.transport {
                network @ TransportConfig::Network { .. } => network.clone(),
                TransportConfig::Serial { .. } => TransportConfig::simulator(),
            };
            if let TransportConfig::Network { host, port } = current {
                settings.transport = TransportConfig::Network {
                    host: self.host.clone().unwrap_or(host),
                    port: self.port.unwrap_or(port),
                };
            }
        } else if self.serial_port.is_some() || self.baud.is_some() {
            let (path, baud_rate) = match &settings.transport {
                TransportConfig::Serial { path, baud_rate } => (path.clone(), *baud_rate),
                TransportConfig::Network { .. } => {
                    (DEFAULT_SERIAL_PATH.to_string(), DEFAULT_BAUD_RATE)
                }
            };
            settings.transport = TransportConfig::Serial {
                path: self.serial_port.clone().unwrap_or(path),
                baud_rate: self.baud.unwrap_or(baud_rate),
            };
        }

        settings.validate()?;
        Ok(settings)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Commands::Run(args) => handle_run(args),
        Commands::Config(args) => handle_config(args),
        #[cfg(feature = "serial")]
        Commands::Ports => handle_ports(),
    }
}

fn handle_run(args: RunArgs) -> Result<()> {
    let settings = args.resolve()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let result = runtime.block_on(run(settings));

    // The stdin reader may still be parked in a blocking read
    runtime.shutdown_background();
    result
}

async fn run(settings: Settings) -> Result<()> {
    let geometry = settings.geometry();
    let (width, height) = (geometry.width(), geometry.height());

    println!(
        "{} Rendering a {}x{} canvas at {} fps",
        "[*]".cyan().bold(),
        width,
        height,
        settings.fps
    );

    // Open the output before ticking; a missing display is fatal
    let output = if settings.dev {
        println!(
            "{} Development mode, writing frames to {}",
            "[DEV]".yellow().bold(),
            settings.output.display().to_string().white()
        );
        Output::Preview(settings.output.clone())
    } else {
        let display = Display::open(geometry, &settings.transport)
            .with_context(|| format!("Failed to open display ({})", settings.transport))?;
        println!(
            "{} Connected to {}",
            "[OK]".green().bold(),
            display.describe_transport().white().bold()
        );
        let panel = display.geometry();
        log::info!(
            "{} sub-panels of {} columns in {} rows{}",
            panel.layout().len(),
            panel.panel_width().columns(),
            panel.layout().rows(),
            if panel.is_mirrored() { ", mirrored" } else { "" }
        );
        Output::Panel(display)
    };

    let ticker = Ticker::new(settings.fps)?;
    log::debug!("Frame budget {:?}", ticker.interval());
    let stop = ticker.stop_handle();
    let (state_tx, state_rx) = watch::channel(settings.game_state());

    let interrupt = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\n{}", "Stopping after the current frame...".yellow());
            interrupt.stop();
        }
    });

    let input_stop = stop.clone();
    tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        if let Err(e) = read_commands(stdin, state_tx, input_stop).await {
            log::warn!("Stopped reading commands: {}", e);
        }
    });

    println!("{}", "Press Ctrl+C to stop\n".yellow());

    let scene = Scene::new(&settings.word);
    log::info!("Word {:?}, {} turns left", scene.word(), settings.turns_left);

    let mut step = RenderStep::new(width, height, scene, output);
    let mut failure = None;

    ticker
        .start(|context| {
            let state = *state_rx.borrow();
            if let Err(e) = step.tick(state, context) {
                failure = Some(e);
                stop.stop();
            }
        })
        .await;

    let stats = step.stats();
    log::info!(
        "Rendered {} frames, {} flushed, {} failed flushes",
        stats.frames,
        stats.flushes,
        stats.failed_flushes
    );

    // Releases the transport only after the last flush has completed
    drop(step);

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn handle_config(args: RunArgs) -> Result<()> {
    let settings = args.resolve()?;
    print!("{}", settings.to_toml_string()?);
    Ok(())
}

#[cfg(feature = "serial")]
fn handle_ports() -> Result<()> {
    let ports = transport::serial::list_ports()?;

    if ports.is_empty() {
        println!("{}", "No serial ports found".yellow());
        println!("\n{}", "Troubleshooting tips:".cyan().bold());
        println!("  1. Connect the controller's USB cable");
        println!("  2. Check if the device is recognized: ls -la /dev/ttyACM* /dev/ttyUSB*");
        println!("  3. Add your user to the 'dialout' group: sudo usermod -aG dialout $USER");
        return Ok(());
    }

    println!("{}", "Available Serial Ports:".green().bold());
    println!("{}", "=".repeat(60));

    for port in ports {
        println!("\n{}: {}", "Port".cyan(), port.port_name.white().bold());
        if let serialport::SerialPortType::UsbPort(info) = port.port_type {
            if let Some(ref product) = info.product {
                println!("  Product: {}", product);
            }
            println!("  VID:PID: {:04x}:{:04x}", info.vid, info.pid);
        }
    }

    println!("\n{}", "=".repeat(60));
    println!(
        "{}",
        "Use: flipdot-board run --serial-port <PORT>".yellow()
    );

    Ok(())
}
