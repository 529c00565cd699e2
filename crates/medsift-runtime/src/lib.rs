//! MedSift Runtime — periodic scheduling of analysis passes.

pub mod scheduler;

pub use scheduler::AnalysisScheduler;
