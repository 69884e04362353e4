//! Workflow-facing output: step outputs, log commands and report rendering

pub mod commands;
pub mod json_format;
pub mod report;
pub mod writer;

pub use commands::WorkflowCommands;
pub use report::{ReportSection, TerraformReport};
pub use writer::OutputWriter;
