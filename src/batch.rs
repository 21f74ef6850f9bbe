// ABOUTME: Order-preserving partitioning of blocks into request-sized batches
// ABOUTME: Notion accepts at most 100 children per create or append call

use crate::model::Block;
use crate::util::chunked;
use crate::{Error, Result};

/// Hard per-request ceiling on children imposed by the Notion API.
pub const MAX_BATCH_SIZE: usize = 100;

pub type BlockBatch = Vec<Block>;

/// Splits `items` into consecutive groups of `size`; only the last may be short.
///
/// Returns no batches for empty input. A zero `size` is rejected.
pub fn partition<T>(items: Vec<T>, size: usize) -> Result<Vec<Vec<T>>> {
    if size == 0 {
        return Err(Error::InvalidArgument(
            "batch size must be a positive integer".into(),
        ));
    }

    Ok(chunked(items, size))
}
