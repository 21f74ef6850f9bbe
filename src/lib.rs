// ABOUTME: Public library API for importing Markdown into Notion
// ABOUTME: Re-exports core modules for external use

pub mod api;
pub mod auth;
pub mod batch;
pub mod cli;
pub mod convert;
pub mod document;
pub mod error;
pub mod frontmatter;
pub mod import;
pub mod model;
pub mod util;

pub use api::{NotionClient, NotionConnector};
pub use batch::{partition, BlockBatch, MAX_BATCH_SIZE};
pub use convert::{BlockConverter, MarkdownConverter};
pub use document::{dry_run_summary, SourceDocument};
pub use error::{Error, PartialProgress, Result};
pub use import::{Connector, DocumentService, ImportRequest, Importer, Progress, Stage};
pub use model::Block;
