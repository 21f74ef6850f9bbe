// ABOUTME: Import pipeline: validate, convert, batch, create page, append batches
// ABOUTME: Appends run strictly in order and failures carry stage and partial progress

use crate::batch::{partition, BlockBatch, MAX_BATCH_SIZE};
use crate::convert::BlockConverter;
use crate::model::Block;
use crate::{Error, Result};
use async_trait::async_trait;
use std::fmt;
use tracing::{debug, info, warn};

/// The four scalars a caller supplies for one import.
#[derive(Clone)]
pub struct ImportRequest {
    pub credential: String,
    pub parent_page_id: String,
    pub title: String,
    pub markdown: String,
}

impl ImportRequest {
    pub fn new(
        credential: impl Into<String>,
        parent_page_id: impl Into<String>,
        title: impl Into<String>,
        markdown: impl Into<String>,
    ) -> Self {
        ImportRequest {
            credential: credential.into(),
            parent_page_id: parent_page_id.into(),
            title: title.into(),
            markdown: markdown.into(),
        }
    }

    /// Title may be empty; credential, parent, and markdown may not.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.credential.trim().is_empty() {
            missing.push("credential");
        }
        if self.parent_page_id.trim().is_empty() {
            missing.push("parent page id");
        }
        if self.markdown.is_empty() {
            missing.push("markdown text");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidRequest(format!(
                "missing {}",
                missing.join(", ")
            )))
        }
    }
}

impl fmt::Debug for ImportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportRequest")
            .field("credential", &"<redacted>")
            .field("parent_page_id", &self.parent_page_id)
            .field("title", &self.title)
            .field("markdown_len", &self.markdown.len())
            .finish()
    }
}

/// Remote stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CreatingPage,
    /// Index into the full batch list; batch 0 rides along with page creation.
    AppendingBatch(usize),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::CreatingPage => write!(f, "creating-page"),
            Stage::AppendingBatch(index) => write!(f, "appending-batch:{}", index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    Converted { blocks: usize, batches: usize },
    PageCreated { page_id: String },
    BatchAppended { index: usize, total: usize },
}

/// The hosted document service the importer writes to.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Creates a child page of `parent_id` and returns the new page id.
    async fn create_page(&self, parent_id: &str, title: &str, children: &[Block]) -> Result<String>;

    async fn append_children(&self, page_id: &str, children: &[Block]) -> Result<()>;
}

/// Produces a service client bound to one credential.
pub trait Connector {
    type Service: DocumentService;

    fn connect(&self, credential: &str) -> Result<Self::Service>;
}

impl<F, S> Connector for F
where
    F: Fn(&str) -> Result<S>,
    S: DocumentService,
{
    type Service = S;

    fn connect(&self, credential: &str) -> Result<S> {
        self(credential)
    }
}

type ProgressFn = Box<dyn Fn(&Progress) + Send + Sync>;

pub struct Importer<C, K> {
    converter: C,
    connector: K,
    batch_size: usize,
    progress: Option<ProgressFn>,
}

impl<C, K> Importer<C, K>
where
    C: BlockConverter,
    K: Connector,
{
    pub fn new(converter: C, connector: K) -> Self {
        Importer {
            converter,
            connector,
            batch_size: MAX_BATCH_SIZE,
            progress: None,
        }
    }

    /// Lowers the batch size. Values above [`MAX_BATCH_SIZE`] are rejected
    /// rather than clipped.
    pub fn with_batch_size(mut self, size: usize) -> Result<Self> {
        if size == 0 || size > MAX_BATCH_SIZE {
            return Err(Error::InvalidArgument(format!(
                "batch size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, size
            )));
        }
        self.batch_size = size;
        Ok(self)
    }

    pub fn on_progress(mut self, f: impl Fn(&Progress) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn emit(&self, event: Progress) {
        if let Some(progress) = &self.progress {
            progress(&event);
        }
    }

    /// Converts and batches without touching the remote service.
    pub fn plan(&self, markdown: &str) -> Result<Vec<BlockBatch>> {
        let blocks = self.converter.convert(markdown).map_err(|e| match e {
            Error::Conversion(_) => e,
            other => Error::Conversion(other.to_string()),
        })?;
        let block_count = blocks.len();
        let batches = partition(blocks, self.batch_size)?;

        info!(
            blocks = block_count,
            batches = batches.len(),
            "converted markdown"
        );
        self.emit(Progress::Converted {
            blocks: block_count,
            batches: batches.len(),
        });
        Ok(batches)
    }

    /// Runs one import and returns the new page id.
    ///
    /// Nothing is retried and nothing is rolled back: a failure after the
    /// page exists comes back as [`Error::PartialImport`].
    pub async fn run(&self, request: &ImportRequest) -> Result<String> {
        request.validate()?;

        let batches = self.plan(&request.markdown)?;
        let total = batches.len();
        let service = self.connector.connect(&request.credential)?;

        let mut batches = batches.into_iter();
        let first = batches.next().unwrap_or_default();

        info!(parent = %request.parent_page_id, title = %request.title, "creating page");
        let page_id = service
            .create_page(&request.parent_page_id, &request.title, &first)
            .await
            .map_err(|e| Error::Remote {
                stage: Stage::CreatingPage,
                source: Box::new(e),
            })?;
        info!(page_id = %page_id, "page created");
        self.emit(Progress::PageCreated {
            page_id: page_id.clone(),
        });

        for (index, batch) in (1..).zip(batches) {
            debug!(index, total, blocks = batch.len(), "appending batch");
            if let Err(e) = service.append_children(&page_id, &batch).await {
                let batches_appended = index - 1;
                warn!(
                    page_id = %page_id,
                    index,
                    batches_appended,
                    "append failed, page left partially populated"
                );
                return Err(Error::PartialImport {
                    page_id,
                    failed_batch_index: index,
                    batches_appended,
                    source: Box::new(e),
                });
            }
            self.emit(Progress::BatchAppended { index, total });
        }

        info!(page_id = %page_id, batches = total, "import complete");
        Ok(page_id)
    }
}
