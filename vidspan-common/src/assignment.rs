use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StateError, VidspanError};
use crate::Result;

/// Ordered display-index → video-file mapping plus the playback mode.
/// An empty string marks a display slot with no video assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAssignment {
    #[serde(default)]
    pub video_files: Vec<String>,
    #[serde(default)]
    pub is_loop_play: bool,
}

impl AssetAssignment {
    pub fn assigned_count(&self) -> usize {
        self.video_files.iter().filter(|p| !p.is_empty()).count()
    }
}

/// Reconciliation outcome when the selected file count does not match
/// the display count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignWarning {
    Truncated { dropped: Vec<String> },
    Padded { empty_slots: usize },
}

impl fmt::Display for AssignWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignWarning::Truncated { dropped } => write!(
                f,
                "{} more videos selected than displays; dropped: {}",
                dropped.len(),
                dropped.join(", ")
            ),
            AssignWarning::Padded { empty_slots } => {
                write!(f, "{} displays have no video assigned", empty_slots)
            }
        }
    }
}

/// Owns the persisted assignment. Every mutation is written back to
/// disk immediately; loading never fails hard so a corrupt file cannot
/// block startup.
#[derive(Debug)]
pub struct AssignmentStore {
    state_file: PathBuf,
    current: AssetAssignment,
}

impl AssignmentStore {
    pub fn default_state_file() -> PathBuf {
        dirs::state_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("vidspan")
            .join("assignment.json")
    }

    /// Loads the persisted assignment, falling back to the empty
    /// default on a missing or malformed file.
    pub fn load(state_file: PathBuf) -> Self {
        let current = match fs::read_to_string(&state_file) {
            Ok(json) => match serde_json::from_str::<AssetAssignment>(&json) {
                Ok(assignment) => {
                    log::info!(
                        "Assignment loaded from {:?}: {} slots, loop play {}",
                        state_file,
                        assignment.video_files.len(),
                        assignment.is_loop_play
                    );
                    assignment
                }
                Err(e) => {
                    log::warn!(
                        "Malformed assignment file {:?} ({}), starting with empty assignment",
                        state_file,
                        e
                    );
                    AssetAssignment::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No assignment file at {:?}, starting fresh", state_file);
                AssetAssignment::default()
            }
            Err(e) => {
                log::warn!(
                    "Failed to read assignment file {:?} ({}), starting with empty assignment",
                    state_file,
                    e
                );
                AssetAssignment::default()
            }
        };

        Self { state_file, current }
    }

    pub fn assignment(&self) -> &AssetAssignment {
        &self.current
    }

    /// Fits the selected files to the display count: surplus trailing
    /// entries are dropped, missing trailing slots are padded empty.
    /// The result always has exactly `display_count` entries and is
    /// persisted before returning.
    pub fn assign(
        &mut self,
        paths: Vec<String>,
        display_count: usize,
    ) -> Result<Vec<AssignWarning>> {
        let mut warnings = Vec::new();
        let mut video_files = paths;

        if video_files.len() > display_count {
            let dropped = video_files.split_off(display_count);
            log::warn!(
                "Selected {} more videos than displays, keeping the first {}",
                dropped.len(),
                display_count
            );
            warnings.push(AssignWarning::Truncated { dropped });
        } else if video_files.len() < display_count {
            let empty_slots = display_count - video_files.len();
            log::warn!("{} displays will have no video assigned", empty_slots);
            video_files.resize(display_count, String::new());
            warnings.push(AssignWarning::Padded { empty_slots });
        }

        self.current.video_files = video_files;
        self.save()?;
        Ok(warnings)
    }

    /// Flips loop mode, persists, and returns the new value.
    pub fn toggle_loop(&mut self) -> Result<bool> {
        self.current.is_loop_play = !self.current.is_loop_play;
        self.save()?;
        Ok(self.current.is_loop_play)
    }

    /// Atomically overwrites the assignment file. In-memory state stays
    /// valid even when the write fails.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.state_file.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                VidspanError::State(StateError::DirectoryCreation {
                    path: parent.to_path_buf(),
                    source: e,
                })
            })?;
        }

        let json = serde_json::to_string_pretty(&self.current)?;

        // Write-then-rename so a failed write never clobbers the last
        // good assignment.
        let tmp_file = self.state_file.with_extension("json.tmp");
        fs::write(&tmp_file, json).map_err(|e| {
            VidspanError::State(StateError::FileWrite {
                path: tmp_file.clone(),
                source: e,
            })
        })?;
        fs::rename(&tmp_file, &self.state_file).map_err(|e| {
            VidspanError::State(StateError::FileWrite {
                path: self.state_file.clone(),
                source: e,
            })
        })?;

        log::debug!("Assignment saved to {:?}", self.state_file);
        Ok(())
    }

    #[cfg(test)]
    fn state_file(&self) -> &Path {
        &self.state_file
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &Path) -> AssignmentStore {
        AssignmentStore::load(dir.join("assignment.json"))
    }

    #[test]
    fn test_assign_pads_missing_slots() {
        let temp_dir = tempdir().unwrap();
        let mut store = store_in(temp_dir.path());

        let warnings = store
            .assign(vec!["v1.mp4".to_string(), "v2.mp4".to_string()], 3)
            .unwrap();

        assert_eq!(
            store.assignment().video_files,
            vec!["v1.mp4".to_string(), "v2.mp4".to_string(), String::new()]
        );
        assert_eq!(warnings, vec![AssignWarning::Padded { empty_slots: 1 }]);
    }

    #[test]
    fn test_assign_truncates_surplus_trailing_entries() {
        let temp_dir = tempdir().unwrap();
        let mut store = store_in(temp_dir.path());

        let warnings = store
            .assign(
                vec!["a.mp4".into(), "b.mp4".into(), "c.mp4".into(), "d.mp4".into()],
                2,
            )
            .unwrap();

        assert_eq!(
            store.assignment().video_files,
            vec!["a.mp4".to_string(), "b.mp4".to_string()]
        );
        assert_eq!(
            warnings,
            vec![AssignWarning::Truncated {
                dropped: vec!["c.mp4".to_string(), "d.mp4".to_string()]
            }]
        );
    }

    #[test]
    fn test_assign_length_law() {
        let temp_dir = tempdir().unwrap();
        let mut store = store_in(temp_dir.path());

        for display_count in 0..5 {
            for path_count in 0..5 {
                let paths: Vec<String> =
                    (0..path_count).map(|i| format!("v{}.mp4", i)).collect();
                store.assign(paths, display_count).unwrap();
                assert_eq!(store.assignment().video_files.len(), display_count);
            }
        }
    }

    #[test]
    fn test_exact_fit_produces_no_warnings() {
        let temp_dir = tempdir().unwrap();
        let mut store = store_in(temp_dir.path());

        let warnings = store
            .assign(vec!["a.mp4".into(), "b.mp4".into()], 2)
            .unwrap();

        assert!(warnings.is_empty());
        assert_eq!(store.assignment().assigned_count(), 2);
    }

    #[test]
    fn test_save_load_round_trip() {
        let temp_dir = tempdir().unwrap();
        let mut store = store_in(temp_dir.path());
        store.assign(vec!["x.mp4".into()], 2).unwrap();
        store.toggle_loop().unwrap();

        let reloaded = AssignmentStore::load(store.state_file().to_path_buf());

        assert_eq!(reloaded.assignment(), store.assignment());
        assert!(reloaded.assignment().is_loop_play);
    }

    #[test]
    fn test_save_after_load_is_noop_on_disk() {
        let temp_dir = tempdir().unwrap();
        let mut store = store_in(temp_dir.path());
        store.assign(vec!["x.mp4".into(), "y.mp4".into()], 2).unwrap();

        let before = fs::read_to_string(store.state_file()).unwrap();
        let reloaded = AssignmentStore::load(store.state_file().to_path_buf());
        reloaded.save().unwrap();
        let after = fs::read_to_string(store.state_file()).unwrap();

        assert_eq!(before, after);
    }

    #[test]
    fn test_wire_format_field_names() {
        let temp_dir = tempdir().unwrap();
        let mut store = store_in(temp_dir.path());
        store.assign(vec!["x.mp4".into()], 1).unwrap();

        let json = fs::read_to_string(store.state_file()).unwrap();
        assert!(json.contains("\"video_files\""));
        assert!(json.contains("\"is_loop_play\""));
    }

    #[test]
    fn test_load_missing_file_falls_back_to_default() {
        let temp_dir = tempdir().unwrap();
        let store = store_in(temp_dir.path());

        assert_eq!(store.assignment(), &AssetAssignment::default());
        assert!(!store.assignment().is_loop_play);
    }

    #[test]
    fn test_load_malformed_file_falls_back_to_default() {
        let temp_dir = tempdir().unwrap();
        let state_file = temp_dir.path().join("assignment.json");
        fs::write(&state_file, "{ this is not json").unwrap();

        let store = AssignmentStore::load(state_file);

        assert_eq!(store.assignment(), &AssetAssignment::default());
    }

    #[test]
    fn test_toggle_loop_persists_immediately() {
        let temp_dir = tempdir().unwrap();
        let mut store = store_in(temp_dir.path());

        assert!(store.toggle_loop().unwrap());
        let reloaded = AssignmentStore::load(store.state_file().to_path_buf());
        assert!(reloaded.assignment().is_loop_play);

        assert!(!store.toggle_loop().unwrap());
        let reloaded = AssignmentStore::load(store.state_file().to_path_buf());
        assert!(!reloaded.assignment().is_loop_play);
    }
}
