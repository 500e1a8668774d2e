//! Typed failure modes for `PagePool::allocate`.
//!
//! Only the non-fatal failure kind from the design (an oversized request)
//! is representable here. The other two failure kinds — out of memory with
//! growth disabled, and the system allocator refusing a new page — are
//! fatal by design and are reported by logging and panicking rather than
//! being returned, since the caller has no way to recover from either.

use thiserror::Error;

/// Recoverable failures returned by [`crate::PagePool::allocate`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PagePoolError {
    /// The request was larger than a single page can ever hold.
    #[error("requested {requested} bytes exceeds the page size of {page_size} bytes")]
    OversizedRequest { requested: usize, page_size: usize },
}
