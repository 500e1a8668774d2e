//! The debug "memory dump" collaborator: a stable, diff-testable text
//! rendering of a pool's pages and blocks. Not load-bearing for
//! correctness — purely a debugging aid.

use std::io::{self, Write};

use crate::header::BlockHeader;
use crate::manager::PagePool;
use crate::page::Page;

impl PagePool {
    /// Writes a human-readable dump of every page and block to `sink`.
    ///
    /// Format, one page at a time:
    ///
    /// ```text
    /// Page : 0
    /// Meta Data Address: 0x...
    /// Next Node Address: 0x...
    /// Prev Node Address: 0x...
    /// Memory Size : 28
    /// Availability : 0
    /// Address | Memory Content
    /// 0x...   | ab
    /// ...
    /// ```
    ///
    /// followed by a blank line. Null addresses render as `0`.
    pub fn dump<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        for page in self.pages() {
            dump_page(page, sink)?;
        }
        Ok(())
    }
}

fn addr_or_zero(ptr: Option<std::ptr::NonNull<BlockHeader>>) -> usize {
    ptr.map_or(0, |p| p.as_ptr() as usize)
}

fn dump_page<W: Write>(page: &Page, sink: &mut W) -> io::Result<()> {
    writeln!(sink, "Page : {}", page.index)?;

    for header in page.iter() {
        let h = unsafe { header.as_ref() };
        writeln!(sink, "Meta Data Address: 0x{:x}", header.as_ptr() as usize)?;
        writeln!(sink, "Next Node Address: 0x{:x}", addr_or_zero(h.next))?;
        writeln!(sink, "Prev Node Address: 0x{:x}", addr_or_zero(h.prev))?;
        writeln!(sink, "Memory Size : {}", h.size)?;
        writeln!(sink, "Availability : {}", h.available as u8)?;
        writeln!(sink, "Address | Memory Content")?;

        let payload = BlockHeader::payload_ptr(header);
        for offset in 0..h.size {
            let byte = unsafe { *payload.as_ptr().add(offset) };
            writeln!(sink, "0x{:x} | {:02x}", payload.as_ptr() as usize + offset, byte)?;
        }
    }

    writeln!(sink)
}
