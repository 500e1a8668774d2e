//! A single contiguous buffer obtained from the system allocator, holding
//! one address-ordered list of block headers.

use core::ptr::NonNull;

use crate::header::BlockHeader;
use crate::os;

/// One page-sized buffer, sub-divided into an address-ordered list of
/// [`BlockHeader`]s.
///
/// A page is created with exactly one free block spanning its whole payload
/// area (`page_size - HEADER_SIZE`). It never shrinks or returns memory to
/// the OS during the pool's lifetime; it is only released when the owning
/// pool is dropped.
pub struct Page {
    buffer: NonNull<u8>,
    page_size: usize,
    /// Free payload bytes currently inside this page, excluding the headers
    /// of those free blocks. A fast filter so `allocate` can skip pages with
    /// no hope of satisfying a request without walking their block list.
    pub mem_left: usize,
    /// Monotonic position of this page in the pool's page list.
    pub index: u32,
}

impl Page {
    /// Reserves a new page of exactly `page_size` bytes from the system
    /// allocator and initializes it with a single free block covering the
    /// whole payload area.
    ///
    /// Returns `None` if the system allocator refuses the request.
    pub fn new(page_size: usize, index: u32) -> Option<Self> {
        let raw = os::alloc_pages(page_size)?;
        let buffer = unsafe { NonNull::new_unchecked(raw) };
        let payload_capacity = page_size - BlockHeader::HEADER_SIZE;

        let head = buffer.cast::<BlockHeader>();
        unsafe {
            BlockHeader::write_at(head, payload_capacity, index, None, None);
        }

        Some(Page {
            buffer,
            page_size,
            mem_left: payload_capacity,
            index,
        })
    }

    /// The first header in this page's block list.
    pub fn head(&self) -> NonNull<BlockHeader> {
        self.buffer.cast()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Walks this page's block list looking for the largest `available`
    /// block whose `size` is at least `size` (worst-fit). Ties resolve to
    /// the first such block in address order, since later-seen blocks only
    /// replace the candidate on a strictly larger size.
    pub fn find_worst_fit(&self, size: usize) -> Option<NonNull<BlockHeader>> {
        let mut best: Option<NonNull<BlockHeader>> = None;
        let mut best_size = 0usize;
        let mut cursor = Some(self.head());

        while let Some(header) = cursor {
            let h = unsafe { header.as_ref() };
            if h.available && h.size >= size && h.size > best_size {
                best = Some(header);
                best_size = h.size;
            }
            cursor = h.next;
        }

        best
    }

    /// Iterates this page's block headers in address order.
    pub fn iter(&self) -> PageIter {
        PageIter {
            cursor: Some(self.head()),
        }
    }
}

impl Drop for Page {
    fn drop(&mut self) {
        unsafe {
            os::free_pages(self.buffer.as_ptr(), self.page_size);
        }
    }
}

pub struct PageIter {
    cursor: Option<NonNull<BlockHeader>>,
}

impl Iterator for PageIter {
    type Item = NonNull<BlockHeader>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.cursor?;
        self.cursor = unsafe { current.as_ref().next };
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_page_has_single_free_block_covering_payload() {
        let page = Page::new(4096, 0).unwrap();
        let mut blocks: Vec<_> = page.iter().collect();
        assert_eq!(blocks.len(), 1);
        let only = unsafe { blocks.pop().unwrap().as_ref() };
        assert!(only.available);
        assert_eq!(only.size, 4096 - BlockHeader::HEADER_SIZE);
        assert_eq!(page.mem_left, only.size);
    }

    #[test]
    fn find_worst_fit_picks_largest_available() {
        let page = Page::new(8192, 0).unwrap();
        // single block covers everything; it trivially is both the only
        // and the largest candidate.
        let found = page.find_worst_fit(32).unwrap();
        assert_eq!(unsafe { found.as_ref() }.size, 8192 - BlockHeader::HEADER_SIZE);
    }

    #[test]
    fn find_worst_fit_returns_none_when_too_small() {
        let page = Page::new(4096, 0).unwrap();
        assert!(page.find_worst_fit(usize::MAX).is_none());
    }
}
