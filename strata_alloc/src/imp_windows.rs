//! OS page mapping for Windows targets.

use crate::units::{Bytes, Pages};
use crate::AllocErr;
use core::ptr::NonNull;

use winapi::shared::ntdef::NULL;
use winapi::um::memoryapi::{VirtualAlloc, VirtualFree};
use winapi::um::winnt::{MEM_COMMIT, MEM_DECOMMIT, MEM_RESERVE, PAGE_READWRITE};

/// Map `pages` fresh pages: zero-initialised, read-write, aligned to (at
/// least) the page size.
pub(crate) fn map_pages(pages: Pages) -> Result<NonNull<u8>, AllocErr> {
    invariant!(pages.0 > 0);
    let bytes: Bytes = pages.into();
    let ptr = unsafe { VirtualAlloc(NULL, bytes.0, MEM_RESERVE | MEM_COMMIT, PAGE_READWRITE) };
    NonNull::new(ptr as *mut u8).ok_or(AllocErr)
}

/// Return `pages` pages starting at `addr` to the OS.
///
/// `MEM_RELEASE` would demand the exact allocation base, but the page heap
/// releases coalesced ranges that may cover several bases; decommitting
/// gives the physical memory back while leaving the address range reserved,
/// which is the closest Windows equivalent of a partial `munmap`.
///
/// # Safety
///
/// The whole range must have been obtained from [`map_pages`] and must not
/// be referenced again.
pub(crate) unsafe fn unmap_pages(addr: NonNull<u8>, pages: Pages) {
    let bytes: Bytes = pages.into();
    let ok = VirtualFree(addr.as_ptr() as *mut _, bytes.0, MEM_DECOMMIT);
    invariant!(ok != 0, "VirtualFree should run OK");
}
