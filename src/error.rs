// ABOUTME: Error taxonomy with structured exit codes for CLI
// ABOUTME: Tags remote failures with the import stage and partial progress

use crate::import::Stage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status} on {endpoint}: {message}")]
    Api {
        endpoint: String,
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("Front matter error: {0}")]
    Frontmatter(String),

    #[error("Remote error at stage {stage}: {source}")]
    Remote { stage: Stage, source: Box<Error> },

    #[error(
        "Partial import into page {page_id}: batch {failed_batch_index} failed \
         after {batches_appended} appended: {source}"
    )]
    PartialImport {
        page_id: String,
        failed_batch_index: usize,
        batches_appended: usize,
        source: Box<Error>,
    },
}

/// What a caller needs to resume or inspect a partially populated page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialProgress {
    pub page_id: String,
    pub failed_batch_index: usize,
    pub batches_appended: usize,
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Auth(_) => 2,
            Error::Network(_) => 3,
            Error::Api { .. } => 4,
            Error::Parse(_) => 5,
            Error::Filesystem(_) => 6,
            Error::InvalidRequest(_) => 7,
            Error::InvalidArgument(_) => 8,
            Error::Conversion(_) => 9,
            Error::Frontmatter(_) => 10,
            Error::Remote { .. } => 11,
            Error::PartialImport { .. } => 12,
        }
    }

    /// Import stage a remote failure happened in, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Remote { stage, .. } => Some(*stage),
            Error::PartialImport {
                failed_batch_index, ..
            } => Some(Stage::AppendingBatch(*failed_batch_index)),
            _ => None,
        }
    }

    pub fn partial_progress(&self) -> Option<PartialProgress> {
        match self {
            Error::PartialImport {
                page_id,
                failed_batch_index,
                batches_appended,
                ..
            } => Some(PartialProgress {
                page_id: page_id.clone(),
                failed_batch_index: *failed_batch_index,
                batches_appended: *batches_appended,
            }),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
