pub mod human;
pub mod train;

pub use human::HumanMode;
pub use train::{EpisodeSummary, StepOutcome, TrainConfig, Trainer};
