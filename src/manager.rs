//! The pool itself: owns every page, implements `allocate`, `free`, and the
//! lazy multi-page growth policy.

use core::ptr::NonNull;

use log::{debug, error, warn};

use crate::config::PagePoolConfig;
use crate::error::PagePoolError;
use crate::header::BlockHeader;
use crate::page::Page;

/// A variable-size, page-backed heap allocator.
///
/// `PagePool` is single-writer: it holds raw pointers into its own pages and
/// is intentionally not `Sync`. Share one across threads behind an external
/// lock if you need to.
pub struct PagePool {
    pages: Vec<Page>,
    config: PagePoolConfig,
}

impl PagePool {
    /// Bytes every block header occupies. Re-exported so callers can reason
    /// about how much of a page's capacity is overhead.
    pub const HEADER_SIZE: usize = BlockHeader::HEADER_SIZE;

    /// Creates a pool and reserves its first page.
    ///
    /// # Panics
    ///
    /// Panics if the system allocator refuses the initial page. This is a
    /// fatal condition by design: a pool that cannot reserve even its first
    /// page cannot do anything useful.
    pub fn new(config: PagePoolConfig) -> Self {
        let mut pool = PagePool {
            pages: Vec::new(),
            config,
        };
        match Page::new(config.page_size, 0) {
            Some(page) => pool.pages.push(page),
            None => pool.fatal("constructing the initial page"),
        }
        pool
    }

    /// Number of pages this pool has ever created.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub(crate) fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Returns a pointer to a writable region of at least `size` bytes,
    /// valid until the matching [`PagePool::free`].
    ///
    /// Fails with [`PagePoolError::OversizedRequest`] if `size` is larger
    /// than a single page can ever hold. Any other failure to satisfy the
    /// request is fatal (see the crate-level docs): either growth is
    /// disabled, or the system allocator itself refuses a new page.
    pub fn allocate(&mut self, size: usize) -> Result<NonNull<u8>, PagePoolError> {
        // Round the request up to the header's alignment so that whatever
        // header ends up immediately after this block's payload lands on a
        // properly aligned address (see `BlockHeader::align_up`). The
        // oversized check below is against this rounded size, not the raw
        // one: a page's largest possible block is `page_size - HEADER_SIZE`
        // bytes, and rounding can push a request that was `<= page_size`
        // past that ceiling even though no page could ever have satisfied
        // it anyway.
        let aligned = BlockHeader::align_up(size);
        let max_block_size = self.config.page_size - BlockHeader::HEADER_SIZE;
        if aligned > max_block_size {
            warn!(
                "allocation request of {} bytes exceeds page size {}",
                size, self.config.page_size
            );
            return Err(PagePoolError::OversizedRequest {
                requested: size,
                page_size: self.config.page_size,
            });
        }
        let size = aligned;

        let threshold = self.config.fragment_threshold;
        for page in self.pages.iter_mut() {
            // Bug-compatible with the source design: a page whose mem_left
            // exactly equals `size` is skipped rather than tried, trading a
            // sliver of utilization for a cheap cutoff.
            if page.mem_left <= size {
                continue;
            }
            if let Some(candidate) = page.find_worst_fit(size) {
                unsafe { place(page, candidate, size, threshold) };
                return Ok(BlockHeader::payload_ptr(candidate));
            }
        }

        if !self.config.grow_on_exhaustion {
            self.fatal("allocate: no candidate block and growth is disabled");
        }

        let new_index = self.pages.len();
        self.request_new_page();
        let page = &mut self.pages[new_index];
        // A fresh page holds `page_size - HEADER_SIZE` bytes in one block,
        // and the oversized check above already guarantees
        // `size <= page_size - HEADER_SIZE`, so this always finds a
        // candidate; the `None` arm only guards against that invariant
        // somehow not holding rather than a real operating condition.
        match page.find_worst_fit(size) {
            Some(candidate) => {
                unsafe { place(page, candidate, size, threshold) };
                Ok(BlockHeader::payload_ptr(candidate))
            }
            None => self.fatal("allocate: request does not fit even a freshly grown page"),
        }
    }

    /// Marks the block behind `ptr` free and coalesces it with its
    /// immediate neighbors.
    ///
    /// # Safety
    ///
    /// `ptr` must be a value previously returned by this pool's
    /// [`PagePool::allocate`] and must not already have been freed.
    /// Double-free, freeing a foreign pointer, and use-after-free are
    /// undefined behavior; this pool does not detect any of them.
    pub unsafe fn free(&mut self, ptr: NonNull<u8>) {
        let mut header = BlockHeader::from_payload(ptr);
        header.as_mut().available = true;

        let page_index = header.as_ref().page_index as usize;
        let page = &mut self.pages[page_index];
        page.mem_left += header.as_ref().size;

        // Forward coalesce first, so the backward step below sees the
        // already-extended size.
        if let Some(next) = header.as_ref().next {
            if next.as_ref().available {
                let next_size = next.as_ref().size;
                let next_next = next.as_ref().next;
                header.as_mut().size += next_size + BlockHeader::HEADER_SIZE;
                header.as_mut().next = next_next;
                if let Some(mut nn) = next_next {
                    nn.as_mut().prev = Some(header);
                }
                page.mem_left += BlockHeader::HEADER_SIZE;
            }
        }

        if let Some(mut prev) = header.as_ref().prev {
            if prev.as_ref().available {
                let size = header.as_ref().size;
                let next = header.as_ref().next;
                prev.as_mut().size += size + BlockHeader::HEADER_SIZE;
                prev.as_mut().next = next;
                if let Some(mut nn) = next {
                    nn.as_mut().prev = Some(prev);
                }
                page.mem_left += BlockHeader::HEADER_SIZE;
            }
        }
    }

    /// Allocates a fresh page, appends it to the page list, and returns.
    ///
    /// Fatal (see crate-level docs) if the system allocator refuses.
    fn request_new_page(&mut self) {
        let index = self.pages.len() as u32;
        match Page::new(self.config.page_size, index) {
            Some(page) => {
                debug!(
                    "grew pool to {} pages ({} bytes each)",
                    index + 1,
                    self.config.page_size
                );
                self.pages.push(page);
            }
            None => self.fatal("request_new_page: system allocator refused a new page"),
        }
    }

    /// Releases every page this pool owns, logs the fatal diagnostic line,
    /// and aborts by panicking. Never returns.
    fn fatal(&mut self, context: &str) -> ! {
        error!("pagepool fatal error ({}): Bad Allocation detected.", context);
        self.pages.clear();
        panic!("Bad Allocation detected. Application Terminated.");
    }
}

/// Carves `size` bytes out of `candidate`, splitting off the remainder as a
/// new free block when it comfortably exceeds `fragment_threshold`, or
/// absorbing it into the used block otherwise.
///
/// # Safety
///
/// `candidate` must be a live, `available` header belonging to `page`, with
/// `candidate.size >= size`.
unsafe fn place(
    page: &mut Page,
    candidate: NonNull<BlockHeader>,
    size: usize,
    fragment_threshold: usize,
) {
    let (old_size, page_index, old_next) = {
        let h = candidate.as_ref();
        (h.size, h.page_index, h.next)
    };
    let headroom = old_size - size;

    if headroom > fragment_threshold + BlockHeader::HEADER_SIZE {
        let new_size = headroom - BlockHeader::HEADER_SIZE;
        let new_addr =
            (candidate.as_ptr() as *mut u8).add(BlockHeader::HEADER_SIZE + size) as *mut BlockHeader;
        let new_header = NonNull::new_unchecked(new_addr);
        BlockHeader::write_at(new_header, new_size, page_index, Some(candidate), old_next);
        if let Some(mut next) = old_next {
            next.as_mut().prev = Some(new_header);
        }

        let mut candidate_mut = candidate;
        candidate_mut.as_mut().next = Some(new_header);
        candidate_mut.as_mut().size = size;

        page.mem_left -= old_size;
        page.mem_left += new_size;
    } else {
        page.mem_left -= old_size;
    }

    let mut candidate_mut = candidate;
    candidate_mut.as_mut().available = false;
}
