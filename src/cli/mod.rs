pub mod orchestration;

pub use orchestration::{PackageOutcome, RunReport, UpdateOptions, Updater};
