use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use tokio::time::interval;

use vidspan_common::{
    assets, display, AssignmentStore, DisplayEnumerator, DisplaySummary, ErrorReporting,
    IpcCommand, IpcResponse, IpcServer, Orchestrator, PassSummary, PlayerStatus, PlayerSupervisor,
};
use vidspan_config::Config;

/// Everything the control loop and the IPC handlers mutate. Guarded by
/// one mutex so all state changes are serialized, whichever thread they
/// arrive on.
struct DaemonState {
    store: AssignmentStore,
    orchestrator: Orchestrator,
    enumerator: DisplayEnumerator,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    log::info!("Starting vidspan daemon...");

    let config = Config::load();

    let store = AssignmentStore::load(AssignmentStore::default_state_file());
    let supervisor = PlayerSupervisor::new(config.player_settings());
    let orchestrator = Orchestrator::new(supervisor, config.staging.launch_delay);
    let enumerator = DisplayEnumerator::new(config.display.query_command.clone());

    let state = Arc::new(Mutex::new(DaemonState {
        store,
        orchestrator,
        enumerator,
    }));

    // IPC server on its own thread; handlers mutate state through the
    // shared mutex.
    let ipc_state = Arc::clone(&state);
    std::thread::spawn(move || {
        let server = IpcServer::new();
        if let Err(e) = server.start(move |cmd| Ok(handle_ipc_command(cmd, &ipc_state))) {
            log::error!("IPC server error: {}", e);
        }
    });

    log::info!("Daemon started, control loop running");

    // Control loop: drives staged launches and process reaping. Skips a
    // cycle rather than blocking when an IPC handler holds the lock.
    let mut ticker = interval(Duration::from_millis(250));
    loop {
        ticker.tick().await;

        let mut guard = match state.try_lock() {
            Ok(guard) => guard,
            Err(_) => continue,
        };

        let loop_enabled = guard.store.assignment().is_loop_play;
        guard.orchestrator.tick(loop_enabled);
    }
}

fn handle_ipc_command(command: IpcCommand, state: &Arc<Mutex<DaemonState>>) -> IpcResponse {
    let mut guard = state.lock().unwrap();

    match command {
        IpcCommand::SelectAssets { paths } => {
            let mut problems = Vec::new();
            for path in paths.iter().filter(|p| !p.is_empty()) {
                if let Err(e) = assets::validate_asset(Path::new(path)) {
                    problems.push(e.user_friendly_message());
                }
            }
            if !problems.is_empty() {
                return IpcResponse::Error {
                    message: format!("Nothing assigned: {}", problems.join("; ")),
                };
            }

            let displays = match guard.enumerator.enumerate() {
                Ok(displays) => displays,
                Err(e) => {
                    e.log_error("Display enumeration failed during assignment");
                    return IpcResponse::Error { message: e.user_friendly_message() };
                }
            };

            match guard.store.assign(paths, displays.len()) {
                Ok(warnings) => {
                    let mut message = format!(
                        "Assigned {} videos across {} displays",
                        guard.store.assignment().assigned_count(),
                        displays.len()
                    );
                    for warning in warnings {
                        message.push_str(&format!("; {}", warning));
                    }
                    IpcResponse::Success { message }
                }
                Err(e) => {
                    e.log_error("Failed to persist assignment");
                    IpcResponse::Error { message: e.user_friendly_message() }
                }
            }
        }

        IpcCommand::Start => {
            let displays = match guard.enumerator.enumerate() {
                Ok(displays) => displays,
                Err(e) => {
                    e.log_error("Display enumeration failed, aborting start");
                    return IpcResponse::Error { message: e.user_friendly_message() };
                }
            };

            let assignment = guard.store.assignment().clone();
            let display_count = displays.len();
            match guard.orchestrator.start(assignment, displays) {
                Ok(()) => IpcResponse::Success {
                    message: format!("Playback staging started on {} displays", display_count),
                },
                Err(e) => {
                    e.log_error("Start rejected");
                    IpcResponse::Error { message: e.user_friendly_message() }
                }
            }
        }

        IpcCommand::Stop => {
            guard.orchestrator.stop();
            IpcResponse::Success { message: "Playback stopped".to_string() }
        }

        IpcCommand::ToggleLoop => match guard.store.toggle_loop() {
            Ok(true) => IpcResponse::Success { message: "Loop play enabled".to_string() },
            Ok(false) => IpcResponse::Success { message: "Loop play disabled".to_string() },
            Err(e) => {
                e.log_error("Failed to persist loop mode");
                IpcResponse::Error { message: e.user_friendly_message() }
            }
        },

        IpcCommand::Displays => match guard.enumerator.enumerate() {
            Ok(displays) => {
                log::debug!("Display query:\n{}", display::format_summary(&displays));
                IpcResponse::Displays {
                    displays: displays.iter().map(DisplaySummary::from).collect(),
                }
            }
            Err(e) => {
                e.log_error("Display enumeration failed");
                IpcResponse::Error { message: e.user_friendly_message() }
            }
        },

        IpcCommand::Status => {
            let status = guard.orchestrator.status();

            let mut players: Vec<PlayerStatus> = status
                .processes
                .values()
                .map(|process| PlayerStatus {
                    pid: process.pid,
                    display_index: process.display_index,
                    asset: process.asset.to_string_lossy().to_string(),
                    status: process.status.to_string(),
                    uptime_secs: process.uptime_secs(),
                })
                .collect();
            players.sort_by_key(|p| p.display_index);

            IpcResponse::Status {
                state: status.state.to_string(),
                loop_enabled: guard.store.assignment().is_loop_play,
                players,
                last_pass: status.last_report.map(|report| PassSummary {
                    launched: report.launched,
                    skipped: report.skipped,
                    failures: report
                        .failures
                        .iter()
                        .map(|f| format!("display {}: {}", f.display_index, f.message))
                        .collect(),
                }),
            }
        }
    }
}
