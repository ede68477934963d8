//! OS page mapping for unix targets.

use crate::units::{Bytes, Pages};
use crate::AllocErr;
use core::ptr::{self, NonNull};

/// Map `pages` fresh anonymous pages: zero-initialised, read-write, aligned
/// to the page size by construction.
pub(crate) fn map_pages(pages: Pages) -> Result<NonNull<u8>, AllocErr> {
    invariant!(pages.0 > 0);
    unsafe {
        let bytes: Bytes = pages.into();
        let addr = libc::mmap(
            ptr::null_mut(),
            bytes.0,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_ANON | libc::MAP_PRIVATE,
            -1,
            0,
        );
        if addr == libc::MAP_FAILED {
            Err(AllocErr)
        } else {
            NonNull::new(addr as *mut u8).ok_or(AllocErr)
        }
    }
}

/// Return `pages` pages starting at `addr` to the OS.
///
/// The range may cover several original mappings at once (the page heap
/// coalesces across them); `munmap` accepts any page-aligned range.
///
/// # Safety
///
/// The whole range must have been obtained from [`map_pages`] and must not
/// be referenced again.
pub(crate) unsafe fn unmap_pages(addr: NonNull<u8>, pages: Pages) {
    let bytes: Bytes = pages.into();
    let code = libc::munmap(addr.as_ptr() as *mut libc::c_void, bytes.0);
    invariant_eq!(code, 0, "munmap should run OK");
}
