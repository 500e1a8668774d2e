//! Acquiring and releasing page buffers from the system allocator.
//!
//! Pages are reserved directly from the OS (`mmap` on Unix, `VirtualAlloc`
//! on Windows) rather than through Rust's global allocator, so that the
//! manager's bookkeeping is the only layer sub-dividing them. Every buffer
//! handed out here is already committed and zero-initialized, matching what
//! both `mmap(MAP_ANONYMOUS)` and `VirtualAlloc(MEM_COMMIT)` guarantee.

use log::warn;

/// Requests `size` bytes directly from the system allocator.
///
/// Returns `None` if the OS refuses the allocation. `size` is used as-is;
/// callers are expected to have already rounded it to whatever granularity
/// they care about.
pub fn alloc_pages(size: usize) -> Option<*mut u8> {
    if size == 0 {
        return None;
    }
    imp::alloc(size)
}

/// Releases a buffer previously returned by [`alloc_pages`] with the same
/// `size`.
///
/// # Safety
///
/// `ptr` must have been returned by [`alloc_pages`] with this exact `size`,
/// and must not have already been released.
pub unsafe fn free_pages(ptr: *mut u8, size: usize) {
    if ptr.is_null() || size == 0 {
        return;
    }
    imp::free(ptr, size);
}

#[cfg(not(windows))]
mod imp {
    use super::warn;
    use core::ptr::null_mut;
    use libc::{c_void, mmap, munmap, MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE};

    pub fn alloc(size: usize) -> Option<*mut u8> {
        let p = unsafe {
            mmap(
                null_mut(),
                size,
                PROT_READ | PROT_WRITE,
                MAP_PRIVATE | MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if p == MAP_FAILED {
            warn!("mmap failed: {}, size {}", errno::errno(), size);
            None
        } else {
            Some(p as *mut u8)
        }
    }

    pub unsafe fn free(ptr: *mut u8, size: usize) {
        if munmap(ptr as *mut c_void, size) != 0 {
            warn!(
                "munmap failed: {}, addr {:p}, size {}",
                errno::errno(),
                ptr,
                size
            );
        }
    }
}

#[cfg(windows)]
mod imp {
    use super::warn;
    use core::ptr::null_mut;
    use winapi::shared::minwindef::LPVOID;
    use winapi::um::errhandlingapi::GetLastError;
    use winapi::um::memoryapi::{VirtualAlloc, VirtualFree};
    use winapi::um::winnt::{MEM_COMMIT, MEM_RELEASE, MEM_RESERVE, PAGE_READWRITE};

    pub fn alloc(size: usize) -> Option<*mut u8> {
        let p: LPVOID = unsafe {
            VirtualAlloc(
                null_mut(),
                size,
                MEM_RESERVE | MEM_COMMIT,
                PAGE_READWRITE,
            )
        };
        if p.is_null() {
            warn!("VirtualAlloc failed: error {}, size {}", unsafe { GetLastError() }, size);
            None
        } else {
            Some(p as *mut u8)
        }
    }

    pub unsafe fn free(ptr: *mut u8, _size: usize) {
        if VirtualFree(ptr as LPVOID, 0, MEM_RELEASE) == 0 {
            warn!("VirtualFree failed: error {}, addr {:p}", GetLastError(), ptr);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_then_free_roundtrips() {
        let size = 64 * 1024;
        let ptr = alloc_pages(size).expect("system allocator refused a 64KiB page");
        unsafe {
            // the region must be writable end to end
            core::ptr::write_bytes(ptr, 0xAB, size);
            assert_eq!(*ptr, 0xAB);
            assert_eq!(*ptr.add(size - 1), 0xAB);
            free_pages(ptr, size);
        }
    }

    #[test]
    fn zero_size_is_a_no_op() {
        assert!(alloc_pages(0).is_none());
    }
}
