use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use rustix::process::{kill_process, Pid, Signal};

use crate::display::Display;
use crate::error::{LaunchError, VidspanError};
use crate::Result;

const DEFAULT_PLAYER_BIN: &str = "vlc";

/// Conventional install locations probed when the player is neither
/// explicitly configured nor on PATH.
pub fn default_probe_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from("/usr/bin/vlc"),
        PathBuf::from("/usr/local/bin/vlc"),
        PathBuf::from("/snap/bin/vlc"),
        PathBuf::from("/var/lib/flatpak/exports/bin/org.videolan.VLC"),
    ]
}

/// How the supervisor finds and drives the external player.
#[derive(Debug, Clone)]
pub struct PlayerSettings {
    /// Explicitly configured executable; wins when it exists.
    pub path: Option<PathBuf>,
    /// Binary name looked up on PATH when no explicit path matches.
    pub bin_name: String,
    pub probe_paths: Vec<PathBuf>,
    /// Extra arguments appended after the fullscreen flag.
    pub extra_args: Vec<String>,
    /// How long a process gets to exit after a termination request
    /// before it is force-killed.
    pub grace_period: Duration,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            path: None,
            bin_name: DEFAULT_PLAYER_BIN.to_string(),
            probe_paths: default_probe_paths(),
            extra_args: Vec::new(),
            grace_period: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Starting,
    Running,
    Exited,
    Killed,
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessStatus::Starting => write!(f, "starting"),
            ProcessStatus::Running => write!(f, "running"),
            ProcessStatus::Exited => write!(f, "exited"),
            ProcessStatus::Killed => write!(f, "killed"),
        }
    }
}

/// One live player instance bound to a display.
#[derive(Debug, Clone)]
pub struct ManagedProcess {
    pub pid: u32,
    pub display_index: usize,
    pub asset: PathBuf,
    pub launched_at: chrono::DateTime<chrono::Utc>,
    pub status: ProcessStatus,
}

impl ManagedProcess {
    pub fn uptime_secs(&self) -> i64 {
        (chrono::Utc::now() - self.launched_at).num_seconds().max(0)
    }
}

/// Owns every spawned player process. Launches never wait on the child;
/// liveness comes from `poll` so a long-running video cannot stall the
/// staging sequence behind it.
pub struct PlayerSupervisor {
    settings: PlayerSettings,
    children: HashMap<u32, Child>,
    records: HashMap<u32, ManagedProcess>,
}

impl PlayerSupervisor {
    pub fn new(settings: PlayerSettings) -> Self {
        Self {
            settings,
            children: HashMap::new(),
            records: HashMap::new(),
        }
    }

    /// Resolves the player executable: configured path, then PATH
    /// lookup, then the probe list. First existing match wins.
    pub fn resolve_player(&self) -> Result<PathBuf> {
        if let Some(path) = &self.settings.path {
            if path.exists() {
                return Ok(path.clone());
            }
            log::warn!("Configured player path {:?} does not exist, falling back", path);
        }

        if let Ok(path) = which::which(&self.settings.bin_name) {
            return Ok(path);
        }

        for path in &self.settings.probe_paths {
            if path.exists() {
                return Ok(path.clone());
            }
        }

        Err(VidspanError::Launch(LaunchError::PlayerNotFound))
    }

    /// Spawns one fullscreen player instance for `display` and returns
    /// its record. The child runs detached; this never blocks on it.
    pub fn launch(&mut self, asset: &Path, display: &Display) -> Result<ManagedProcess> {
        if asset.as_os_str().is_empty() || !asset.is_file() {
            return Err(VidspanError::Launch(LaunchError::AssetMissing {
                path: asset.to_path_buf(),
            }));
        }
        let asset = fs::canonicalize(asset).map_err(|_| {
            VidspanError::Launch(LaunchError::AssetMissing {
                path: asset.to_path_buf(),
            })
        })?;

        let player = self.resolve_player()?;

        let mut cmd = Command::new(&player);
        cmd.arg("--fullscreen");
        cmd.args(&self.settings.extra_args);
        cmd.arg(&asset);
        cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());

        log::info!(
            "Launching player for display {} ({}): {:?}",
            display.index,
            display.device_id,
            cmd
        );

        let child = cmd.spawn().map_err(|e| {
            VidspanError::Launch(LaunchError::Spawn {
                command: format!("{:?}", cmd),
                source: e,
            })
        })?;

        let pid = child.id();
        let record = ManagedProcess {
            pid,
            display_index: display.index,
            asset,
            launched_at: chrono::Utc::now(),
            status: ProcessStatus::Starting,
        };

        self.children.insert(pid, child);
        self.records.insert(pid, record.clone());
        Ok(record)
    }

    /// Reaps exited children and refreshes liveness. Confirmed exits
    /// leave the live set.
    pub fn poll(&mut self) {
        let mut exited = Vec::new();
        for (pid, child) in &mut self.children {
            match child.try_wait() {
                Ok(Some(status)) => {
                    log::info!("Player process {} exited with {}", pid, status);
                    exited.push(*pid);
                }
                Ok(None) => {
                    if let Some(record) = self.records.get_mut(pid) {
                        record.status = ProcessStatus::Running;
                    }
                }
                Err(e) => {
                    log::warn!("Failed to poll player process {}: {}", pid, e);
                }
            }
        }
        for pid in exited {
            self.children.remove(&pid);
            self.records.remove(&pid);
        }
    }

    pub fn live_count(&self) -> usize {
        self.children.len()
    }

    /// Requests graceful termination of every live process, waits up to
    /// the grace period, then force-kills stragglers. Individual
    /// failures are logged and never stop the sweep; the live set is
    /// cleared no matter what.
    pub fn terminate_all(&mut self) {
        if self.children.is_empty() {
            self.records.clear();
            return;
        }

        log::info!("Stopping {} player processes", self.children.len());

        for pid in self.children.keys() {
            match Pid::from_raw(*pid as i32) {
                Some(target) => {
                    if let Err(e) = kill_process(target, Signal::Term) {
                        log::warn!("Failed to request termination of player {}: {}", pid, e);
                    }
                }
                None => log::warn!("Player {} has an invalid pid, skipping signal", pid),
            }
        }

        let deadline = Instant::now() + self.settings.grace_period;
        loop {
            self.children.retain(|pid, child| match child.try_wait() {
                Ok(Some(status)) => {
                    log::debug!("Player process {} terminated with {}", pid, status);
                    false
                }
                Ok(None) => true,
                Err(e) => {
                    log::warn!("Failed to poll player process {}: {}", pid, e);
                    true
                }
            });

            if self.children.is_empty() || Instant::now() >= deadline {
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }

        for (pid, child) in &mut self.children {
            log::warn!("Player process {} ignored termination request, killing", pid);
            if let Some(record) = self.records.get_mut(pid) {
                record.status = ProcessStatus::Killed;
            }
            match child.kill() {
                Ok(()) => {
                    let _ = child.wait();
                }
                Err(e) => log::error!("Failed to kill player process {}: {}", pid, e),
            }
        }

        self.children.clear();
        self.records.clear();
        log::info!("All player processes stopped");
    }

    /// Read-only snapshot of the live set, keyed by pid.
    pub fn status(&self) -> HashMap<u32, ManagedProcess> {
        self.records.clone()
    }
}
