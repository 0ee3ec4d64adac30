//! State module for tracking analysis progress
//!
//! # Components
//!
//! - `PipelineStage`: where a single pipeline run currently is
//! - `ReportStatus`: the lifecycle of a persisted report

mod pipeline_stage;
mod report_status;

// Re-export main types
pub use pipeline_stage::PipelineStage;
pub use report_status::ReportStatus;
