use std::path::PathBuf;

use clap::{Parser, Subcommand};
use vidspan_common::{IpcClient, IpcCommand, IpcResponse};

#[derive(Parser)]
#[command(name = "vidspan-cli")]
#[command(about = "vidspan-cli (multi-display video playback control)")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the vidspan daemon
    Daemon,

    /// Assign video files to displays, in display order
    Select {
        /// Video files, one per display
        paths: Vec<PathBuf>,
    },

    /// Start fullscreen playback on all displays
    Start,

    /// Stop playback and terminate all players
    Stop,

    /// Toggle loop playback mode
    ToggleLoop,

    /// List detected displays and their geometry
    Displays,

    /// Show current playback status
    Status,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Daemon => {
            println!("To start the daemon, run: vidspan-daemon");
            println!("Or use systemctl --user start vidspan if installed as a service");
            return Ok(());
        }

        Commands::Select { paths } => {
            if paths.is_empty() {
                eprintln!("✗ Error: no video files given");
                std::process::exit(1);
            }
            // Resolve relative to this shell, not the daemon's cwd
            let mut resolved = Vec::new();
            for path in paths {
                match std::fs::canonicalize(&path) {
                    Ok(abs) => resolved.push(abs.to_string_lossy().to_string()),
                    Err(e) => {
                        eprintln!("✗ Error: cannot access {:?}: {}", path, e);
                        std::process::exit(1);
                    }
                }
            }
            IpcCommand::SelectAssets { paths: resolved }
        }

        Commands::Start => IpcCommand::Start,
        Commands::Stop => IpcCommand::Stop,
        Commands::ToggleLoop => IpcCommand::ToggleLoop,
        Commands::Displays => IpcCommand::Displays,
        Commands::Status => IpcCommand::Status,
    };

    let client = IpcClient::new();
    match client.send_command(command) {
        Ok(response) => print_response(response),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn format_uptime(seconds: i64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        let minutes = seconds / 60;
        let secs = seconds % 60;
        if secs == 0 {
            format!("{}m", minutes)
        } else {
            format!("{}m{}s", minutes, secs)
        }
    } else {
        let hours = seconds / 3600;
        let remaining = seconds % 3600;
        let minutes = remaining / 60;
        if minutes == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h{}m", hours, minutes)
        }
    }
}

fn print_response(response: IpcResponse) {
    match response {
        IpcResponse::Success { message } => {
            println!("✓ {}", message);
        }

        IpcResponse::Error { message } => {
            eprintln!("✗ Error: {}", message);
            std::process::exit(1);
        }

        IpcResponse::Displays { displays } => {
            if displays.is_empty() {
                println!("No displays found");
                return;
            }

            println!("Detected displays:");
            println!("==================");
            for display in displays {
                println!(
                    "Screen {} ({}): {}x{} at ({}, {})",
                    display.index + 1,
                    display.device_id,
                    display.width,
                    display.height,
                    display.left,
                    display.top
                );
            }
        }

        IpcResponse::Status { state, loop_enabled, players, last_pass } => {
            println!("vidspan Status:");
            println!("===============");
            println!("State: {}", state.to_uppercase());
            println!("Loop play: {}", if loop_enabled { "ON" } else { "OFF" });

            if let Some(pass) = last_pass {
                println!(
                    "Last pass: {} launched, {} skipped, {} failed",
                    pass.launched,
                    pass.skipped,
                    pass.failures.len()
                );
                for failure in &pass.failures {
                    println!("  ! {}", failure);
                }
            }

            if players.is_empty() {
                println!("No players running");
                return;
            }

            println!();
            for player in players {
                let file_name = std::path::Path::new(&player.asset)
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("unknown");

                println!(
                    "display {} | pid {} | {} | {} | up {}",
                    player.display_index + 1,
                    player.pid,
                    file_name,
                    player.status,
                    format_uptime(player.uptime_secs)
                );
            }
        }
    }
}
