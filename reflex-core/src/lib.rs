pub mod drill;
pub mod phase;
pub mod trial;

pub use drill::{Difficulty, DrillInfo};
pub use phase::{Phase, SessionPhase};
pub use trial::{ReactionRating, TrialOutcome, TrialResult};
