//! Command line client for cmdlink devices
//!
//! Scans for devices, authenticates and runs commands over BLE, or simulates
//! a device locally against the host shell.

mod local;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use cmdlink_ble_controller::ble::{self, CommandLink};
use cmdlink_mcu::{ChannelConfig, CommandChannel, ProcessShell, TransportAdapter};

#[derive(Parser)]
#[command(name = "cmdlink-ble")]
#[command(about = "Run whitelisted commands on cmdlink devices over BLE")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan for cmdlink devices
    Scan {
        /// Scan duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Authenticate and run one command on a device
    Exec {
        /// Device name or address to connect to
        #[arg(short, long)]
        device: Option<String>,
        /// Passcode (defaults to the one in the config file)
        #[arg(short, long)]
        passcode: Option<String>,
        /// Config file (defaults to $CMDLINK_HOME/config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Command to run
        #[arg(required = true, trailing_var_arg = true)]
        command: Vec<String>,
    },
    /// Simulate a device: each stdin line is written to a local channel
    /// backed by the host shell, and the reply is read back chunk by chunk
    Local {
        /// Config file (defaults to $CMDLINK_HOME/config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print chunks as hex
        #[arg(long)]
        hex: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { duration } => {
            scan_devices(duration).await?;
        }
        Commands::Exec { device, passcode, config, command } => {
            let passcode = match passcode {
                Some(passcode) => passcode,
                None => load_config(config.as_deref())?.passcode,
            };
            exec_command(device.as_deref(), &passcode, &command.join(" ")).await?;
        }
        Commands::Local { config, hex } => {
            let config = load_config(config.as_deref())?;
            let channel = CommandChannel::new(config, ProcessShell::default())?;
            let mut adapter = TransportAdapter::new(channel);
            let stdin = std::io::stdin();
            local::run(&mut adapter, stdin.lock(), &mut std::io::stdout(), hex)?;
        }
    }

    Ok(())
}

fn cmdlink_home() -> PathBuf {
    match std::env::var_os("CMDLINK_HOME") {
        Some(home) => PathBuf::from(home),
        None => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".cmdlink"),
    }
}

fn load_config(path: Option<&Path>) -> Result<ChannelConfig, Box<dyn std::error::Error>> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => cmdlink_home().join("config.json"),
    };
    ChannelConfig::load(&path)
        .map_err(|e| format!("failed to load {}: {e}", path.display()).into())
}

async fn scan_devices(duration: u64) -> Result<(), Box<dyn std::error::Error>> {
    println!("Scanning for cmdlink devices ({} seconds)...", duration);

    let devices = ble::scan(duration).await?;

    println!("\nFound {} devices:", devices.len());
    for device in devices {
        let rssi = device
            .rssi
            .map(|r| format!("{} dBm", r))
            .unwrap_or_else(|| "N/A".to_string());
        let marker = if device.is_cmdlink { " [CMDLINK]" } else { "" };

        println!("  {} ({}) RSSI: {}{}", device.name, device.address, rssi, marker);
    }

    Ok(())
}

async fn exec_command(
    target: Option<&str>,
    passcode: &str,
    command: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Connecting...");
    let link = CommandLink::connect(target).await?;
    println!("Connected!");

    let result = run_on_link(&link, passcode, command).await;

    // The device resets its session on disconnect
    if let Err(e) = link.disconnect().await {
        eprintln!("Disconnect failed: {e}");
    }
    result
}

async fn run_on_link(
    link: &CommandLink,
    passcode: &str,
    command: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    link.authenticate(passcode).await?;

    let reply = link.execute(command).await?;
    if reply.is_rejected() {
        eprintln!("Device rejected command: {command}");
    }
    println!("{}", reply.text());
    if reply.possibly_truncated {
        eprintln!("(reply used all {} chunks and may be truncated)", reply.chunks);
    }
    Ok(())
}
