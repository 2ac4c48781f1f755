pub mod detection;

pub use detection::{DetectionService, Readiness, ReloadSummary};
