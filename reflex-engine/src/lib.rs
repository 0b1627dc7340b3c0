pub mod config;
pub mod events;
pub mod report;
pub mod scoring;
pub mod state;
pub mod summary;

pub use config::{ConfigError, TrialConfig};
pub use events::{EngineTimer, SessionEvent, SessionObserver};
pub use report::SessionReport;
pub use scoring::ScoringThresholds;
pub use state::{SessionState, TrialEngine};
pub use summary::{RatingCounts, SessionSummary};
