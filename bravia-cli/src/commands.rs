//! Command execution.

use crate::Commands;
use bravia_client::Client;
use bravia_protocol::{InputType, Notification};
use colored::Colorize;
use serde_json::{json, Value};

/// Executes a command and returns the formatted output.
pub async fn execute(client: &Client, cmd: Commands) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        Commands::Watch { .. } | Commands::IrCodes => unreachable!(),

        Commands::Power { state: Some(state) } => {
            client.set_power_status(state.is_on()).await?;
            Ok(format!("Power {}", "set".green()))
        }
        Commands::Power { state: None } => {
            let on = client.power_status().await?;
            Ok(format!("Power: {}", on_off(on)))
        }

        Commands::TogglePower => {
            client.toggle_power().await?;
            Ok(format!("Power {}", "toggled".green()))
        }

        Commands::Volume { level: Some(level) } => {
            client.set_audio_volume(level).await?;
            Ok(format!("Volume set to {}", level.to_string().cyan()))
        }
        Commands::Volume { level: None } => {
            let level = client.audio_volume().await?;
            Ok(format!("Volume: {}", level.to_string().cyan()))
        }

        Commands::Mute { state: Some(state) } => {
            client.set_audio_mute(state.is_on()).await?;
            Ok(format!("Audio mute {}", "set".green()))
        }
        Commands::Mute { state: None } => {
            let muted = client.audio_mute().await?;
            Ok(format!("Audio mute: {}", on_off(muted)))
        }

        Commands::Input {
            kind: Some(kind),
            number,
        } => {
            client.set_input(kind, number).await?;
            Ok(format!(
                "Input set to {}",
                format!("{} {}", kind, number).cyan()
            ))
        }
        Commands::Input { kind: None, .. } => {
            let (code, number) = client.input().await?;
            Ok(format!("Input: {}", format_input(code, number).cyan()))
        }

        Commands::PictureMute { state: Some(state) } => {
            client.set_picture_mute(state.is_on()).await?;
            Ok(format!("Picture mute {}", "set".green()))
        }
        Commands::PictureMute { state: None } => {
            let muted = client.picture_mute().await?;
            Ok(format!("Picture mute: {}", on_off(muted)))
        }

        Commands::TogglePictureMute => {
            client.toggle_picture_mute().await?;
            Ok(format!("Picture mute {}", "toggled".green()))
        }

        Commands::Scene { name: Some(name) } => {
            client.set_scene(&name).await?;
            Ok(format!("Scene set to {}", name.cyan()))
        }
        Commands::Scene { name: None } => {
            let scene = client.scene().await?;
            Ok(format!("Scene: {}", scene.cyan()))
        }

        Commands::Mac { iface } => {
            let mac = client.mac_address(&iface).await?;
            Ok(format!("{}: {}", iface.bold(), mac))
        }

        Commands::Broadcast { iface } => {
            let addr = client.broadcast_address(&iface).await?;
            Ok(format!("{}: {}", iface.bold(), addr))
        }

        Commands::Ir { code } => {
            client.send_ir(code).await?;
            Ok(format!("Sent {} ({})", code.name().cyan(), code.code()))
        }
    }
}

/// Formats a notification for terminal output.
pub fn format_notification(notification: &Notification) -> String {
    match notification {
        Notification::Connection(true) => "connected".green().to_string(),
        Notification::Connection(false) => "disconnected".red().to_string(),
        Notification::Input { input_type, number } => {
            format!("input {}", format_input(*input_type, *number).cyan())
        }
        Notification::Other(frame) => format!("{} {}", "other".dimmed(), frame),
        other => other.to_string(),
    }
}

/// Renders a notification as one JSON object.
pub fn notification_json(notification: &Notification) -> Value {
    match notification {
        Notification::Connection(connected) => json!({ "event": "connection", "connected": connected }),
        Notification::Power(on) => json!({ "event": "power", "on": on }),
        Notification::AudioMute(muted) => json!({ "event": "audio_mute", "muted": muted }),
        Notification::PictureMute(muted) => json!({ "event": "picture_mute", "muted": muted }),
        Notification::Volume(level) => json!({ "event": "volume", "level": level }),
        Notification::Input { input_type, number } => json!({
            "event": "input",
            "type": InputType::name_of(*input_type),
            "type_code": input_type,
            "number": number,
        }),
        Notification::Other(frame) => json!({
            "event": "other",
            "kind": frame.kind.to_string(),
            "command": frame.command.to_string(),
            "parameters": frame.parameters.raw(),
        }),
    }
}

fn format_input(code: u32, number: u32) -> String {
    format!("{} {}", InputType::name_of(code), number)
}

fn on_off(on: bool) -> String {
    if on {
        "on".green().to_string()
    } else {
        "off".yellow().to_string()
    }
}
