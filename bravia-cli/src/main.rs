//! bravia-cli - Command-line interface for bravia displays
//!
//! Runs one command against the device, or watches its notifications.

mod commands;

use bravia_client::{Client, Config};
use bravia_protocol::{InputType, IrCode, Notification};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bravia-cli")]
#[command(about = "Command-line interface for displays speaking the simple IP control protocol")]
#[command(version)]
pub struct Cli {
    /// Device address (host:port); overrides BRAVIA_ADDR and the config file
    #[arg(short, long)]
    device: Option<String>,

    /// Answer timeout in milliseconds
    #[arg(short, long)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn is_on(self) -> bool {
        self == Switch::On
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show or set the power status
    Power {
        #[arg(value_enum)]
        state: Option<Switch>,
    },

    /// Toggle the power status
    TogglePower,

    /// Show or set the audio volume
    Volume {
        /// New volume level
        level: Option<u32>,
    },

    /// Show or set audio mute
    Mute {
        #[arg(value_enum)]
        state: Option<Switch>,
    },

    /// Show or switch the active input
    Input {
        /// Input type (hdmi, component, mirror)
        kind: Option<InputType>,

        /// Input number
        #[arg(default_value = "1")]
        number: u32,
    },

    /// Show or set picture mute
    PictureMute {
        #[arg(value_enum)]
        state: Option<Switch>,
    },

    /// Toggle picture mute
    TogglePictureMute,

    /// Show or set the picture scene
    Scene {
        /// Scene name (e.g. auto, cinema)
        name: Option<String>,
    },

    /// Show the MAC address of a network interface
    Mac {
        #[arg(default_value = "eth0")]
        iface: String,
    },

    /// Show the broadcast address of a network interface
    Broadcast {
        #[arg(default_value = "eth0")]
        iface: String,
    },

    /// Send an IR remote code (name or number)
    Ir {
        code: IrCode,
    },

    /// List the known IR remote codes
    IrCodes,

    /// Print notifications until Ctrl+C
    Watch {
        /// One JSON object per line
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    // Listing codes needs no device
    if let Commands::IrCodes = cli.command {
        for code in IrCode::ALL {
            println!("{:>4}  {}", code.code(), code.name());
        }
        return Ok(());
    }

    let mut config = Config::load().map_err(|e| {
        eprintln!("{}: {}", "Config error".red(), e);
        e
    })?;
    if let Some(device) = cli.device {
        config.device.addr = device;
    }
    let mut conn_config = config.connection();
    if let Some(ms) = cli.timeout {
        conn_config = conn_config.with_command_timeout(Duration::from_millis(ms));
    }
    tracing::debug!("Using device {}", conn_config.addr);
    let client = Client::new(conn_config);

    match cli.command {
        Commands::Watch { json } => {
            // Subscribe before connecting so the first connect is reported
            let mut notifications = client.subscribe();

            client.connect().await.map_err(|e| {
                eprintln!("{}: {}", "Connection failed".red(), e);
                e
            })?;
            eprintln!("{}", "Press Ctrl+C to stop...".dimmed());

            loop {
                tokio::select! {
                    frame = notifications.recv() => {
                        match frame {
                            Ok(frame) => match Notification::from_frame(&frame) {
                                Ok(notification) if json => {
                                    println!("{}", commands::notification_json(&notification));
                                }
                                Ok(notification) => {
                                    println!("{}", commands::format_notification(&notification));
                                }
                                Err(e) => {
                                    eprintln!("{}: {} ({})", "Warning".yellow(), e, frame);
                                }
                            },
                            Err(RecvError::Lagged(n)) => {
                                eprintln!("{}: lagged {} notifications", "Warning".yellow(), n);
                            }
                            Err(RecvError::Closed) => {
                                eprintln!("{}", "Connection closed".red());
                                break;
                            }
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        eprintln!("\n{}", "Stopping watch...".dimmed());
                        break;
                    }
                }
            }

            client.close().await?;
        }
        cmd => {
            // Connect for one-shot command
            client.connect().await.map_err(|e| {
                eprintln!("{}: {}", "Connection failed".red(), e);
                e
            })?;

            let result = commands::execute(&client, cmd).await;

            match result {
                Ok(output) => {
                    println!("{}", output);
                }
                Err(e) => {
                    eprintln!("{}: {}", "Error".red(), e);
                    client.close().await?;
                    std::process::exit(1);
                }
            }

            client.close().await?;
        }
    }

    Ok(())
}
