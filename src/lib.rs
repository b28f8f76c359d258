pub mod analysis;
pub mod base;
pub mod core;
pub mod schema;
pub mod textformat;

// Re-export the entry point and the seam it is driven through
pub use analysis::{analyze_compilation_unit, AnalyzerError, GraphRecorder};
