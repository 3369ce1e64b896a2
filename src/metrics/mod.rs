pub mod dashboard;
pub mod training_stats;

pub use dashboard::Dashboard;
pub use training_stats::TrainingStats;
