use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::assignment::AssetAssignment;
use crate::display::Display;
use crate::error::{SessionError, VidspanError};
use crate::player::{ManagedProcess, PlayerSupervisor};
use crate::{ErrorReporting, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Staging,
    Running,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Staging => write!(f, "staging"),
            PlaybackState::Running => write!(f, "running"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SlotFailure {
    pub display_index: usize,
    pub asset: String,
    pub message: String,
}

/// Outcome of one full staging pass over the assignment.
#[derive(Debug, Clone, Default)]
pub struct StagingReport {
    pub launched: usize,
    pub skipped: usize,
    pub failures: Vec<SlotFailure>,
}

/// Transient per-start() record. Never persisted.
#[derive(Debug)]
struct PlaybackSession {
    displays: Vec<Display>,
    assignment: AssetAssignment,
    launch_cursor: usize,
    loop_enabled: bool,
    next_launch_at: Instant,
    report: StagingReport,
}

#[derive(Debug, Clone)]
pub struct OrchestratorStatus {
    pub state: PlaybackState,
    pub loop_active: bool,
    pub launch_cursor: usize,
    pub slot_count: usize,
    pub passes_completed: usize,
    pub last_report: Option<StagingReport>,
    pub processes: HashMap<u32, ManagedProcess>,
}

/// Sequencing engine: stages one player launch per display slot with a
/// fixed inter-launch delay, restarts the pass in loop mode, and tears
/// everything down on stop. Driven by the host's single control loop
/// calling `tick`; nothing here blocks on a child process.
pub struct Orchestrator {
    supervisor: PlayerSupervisor,
    launch_delay: Duration,
    state: PlaybackState,
    session: Option<PlaybackSession>,
    passes_completed: usize,
    last_report: Option<StagingReport>,
}

impl Orchestrator {
    pub fn new(supervisor: PlayerSupervisor, launch_delay: Duration) -> Self {
        Self {
            supervisor,
            launch_delay,
            state: PlaybackState::Idle,
            session: None,
            passes_completed: 0,
            last_report: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Begins a staged playback session over a fresh display snapshot.
    /// Precondition failures abort before any process is spawned; a
    /// prior session is stopped first.
    pub fn start(&mut self, assignment: AssetAssignment, displays: Vec<Display>) -> Result<()> {
        if assignment.video_files.len() > displays.len() {
            return Err(VidspanError::Session(SessionError::MoreAssetsThanDisplays {
                assets: assignment.video_files.len(),
                displays: displays.len(),
            }));
        }
        if assignment.assigned_count() == 0 {
            return Err(VidspanError::Session(SessionError::NothingToPlay));
        }

        // Nothing can play without a player; fail the whole start here
        // rather than once per slot.
        let player = self.supervisor.resolve_player()?;

        log::info!(
            "Starting playback of {} videos on {} displays with {:?}",
            assignment.assigned_count(),
            displays.len(),
            player
        );

        self.supervisor.terminate_all();
        self.passes_completed = 0;
        self.last_report = None;
        self.session = Some(PlaybackSession {
            loop_enabled: assignment.is_loop_play,
            displays,
            assignment,
            launch_cursor: 0,
            next_launch_at: Instant::now(),
            report: StagingReport::default(),
        });
        self.state = PlaybackState::Staging;
        Ok(())
    }

    /// Stops playback from any state. Synchronous: when this returns,
    /// no managed player process is left alive.
    pub fn stop(&mut self) {
        log::info!("Stop requested");
        self.supervisor.terminate_all();
        if let Some(session) = self.session.take() {
            self.last_report = Some(session.report);
        }
        self.state = PlaybackState::Idle;
    }

    /// Advances whatever is due. Called from the host control loop;
    /// `loop_enabled` is the store's current flag so a toggle takes
    /// effect at the next pass boundary.
    pub fn tick(&mut self, loop_enabled: bool) {
        self.supervisor.poll();

        match self.state {
            PlaybackState::Idle => {}
            PlaybackState::Staging => self.advance_staging(loop_enabled),
            PlaybackState::Running => {
                if self.supervisor.live_count() == 0 {
                    log::info!("All player processes finished, session complete");
                    if let Some(session) = self.session.take() {
                        self.last_report = Some(session.report);
                    }
                    self.state = PlaybackState::Idle;
                }
            }
        }
    }

    fn advance_staging(&mut self, loop_enabled: bool) {
        let Some(session) = self.session.as_mut() else {
            self.state = PlaybackState::Idle;
            return;
        };

        if Instant::now() < session.next_launch_at {
            return;
        }

        // Unassigned slots are skipped without consuming a launch delay.
        let slot_count = session.assignment.video_files.len();
        while session.launch_cursor < slot_count
            && session.assignment.video_files[session.launch_cursor].is_empty()
        {
            log::debug!("Slot {} has no video assigned, skipping", session.launch_cursor);
            session.report.skipped += 1;
            session.launch_cursor += 1;
        }

        if session.launch_cursor >= slot_count {
            self.finish_pass(loop_enabled);
            return;
        }

        let index = session.launch_cursor;
        let asset = session.assignment.video_files[index].clone();
        match self.supervisor.launch(Path::new(&asset), &session.displays[index]) {
            Ok(process) => {
                log::info!("Player {} started for display {}", process.pid, index);
                session.report.launched += 1;
            }
            Err(e) => {
                // Per-slot failure: record it and keep staging the rest.
                e.log_error(&format!("Launch failed for display {}", index));
                session.report.failures.push(SlotFailure {
                    display_index: index,
                    asset,
                    message: e.user_friendly_message(),
                });
            }
        }
        session.launch_cursor += 1;
        session.next_launch_at = Instant::now() + self.launch_delay;
    }

    fn finish_pass(&mut self, loop_enabled: bool) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let report = std::mem::take(&mut session.report);
        log::info!(
            "Staging pass complete: {} launched, {} skipped, {} failed",
            report.launched,
            report.skipped,
            report.failures.len()
        );
        for failure in &report.failures {
            log::warn!(
                "Display {}: {} ({})",
                failure.display_index,
                failure.message,
                failure.asset
            );
        }
        self.passes_completed += 1;
        self.last_report = Some(report);
        session.loop_enabled = loop_enabled;

        if loop_enabled {
            log::info!("Loop play on, restarting from the first display");
            self.supervisor.terminate_all();
            session.launch_cursor = 0;
            session.next_launch_at = Instant::now() + self.launch_delay;
        } else {
            self.state = PlaybackState::Running;
        }
    }

    pub fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            state: self.state,
            loop_active: self.session.as_ref().map(|s| s.loop_enabled).unwrap_or(false),
            launch_cursor: self.session.as_ref().map(|s| s.launch_cursor).unwrap_or(0),
            slot_count: self
                .session
                .as_ref()
                .map(|s| s.assignment.video_files.len())
                .unwrap_or(0),
            passes_completed: self.passes_completed,
            last_report: self.last_report.clone(),
            processes: self.supervisor.status(),
        }
    }

    pub fn live_count(&self) -> usize {
        self.supervisor.live_count()
    }
}
