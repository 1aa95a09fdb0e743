// Orchestration system - fans content requests out to per-modality generators

pub mod batch;
pub mod config;
pub mod error;
pub mod generators;
pub mod orchestrator;
pub mod registry;
pub mod remote;
pub mod storage;
pub mod types;

pub use config::ContentConfig;
pub use error::{GenerationError, OrchestratorError, RemoteError, TransportError};
pub use orchestrator::ContentOrchestrator;
pub use registry::{ModelRef, ModelRegistry, ModelSet};
pub use remote::{PredictionClient, ReplicateClient};
pub use storage::ArtifactStore;
pub use types::*;
