use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("PDF file not found at: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("No Table of Contents pages detected in the document")]
    NoTocDetected,

    #[error("section id is not a dot-delimited integer sequence: {section_id}")]
    MalformedSectionId { section_id: String },
}
