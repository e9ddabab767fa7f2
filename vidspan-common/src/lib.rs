pub mod assets;
pub mod assignment;
pub mod display;
pub mod duration;
pub mod error;
pub mod ipc;
pub mod orchestrator;
pub mod player;

pub use assignment::{AssetAssignment, AssignmentStore, AssignWarning};
pub use display::{Bounds, Display, DisplayEnumerator};
pub use duration::parse_duration;
pub use error::{ErrorReporting, Result, VidspanError};
pub use ipc::{
    DisplaySummary, IpcClient, IpcCommand, IpcResponse, IpcServer, PassSummary, PlayerStatus,
};
pub use orchestrator::{Orchestrator, OrchestratorStatus, PlaybackState, StagingReport};
pub use player::{ManagedProcess, PlayerSettings, PlayerSupervisor, ProcessStatus};
