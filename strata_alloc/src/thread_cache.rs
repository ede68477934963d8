//! The per-thread front end, plus the crate's internal entry points.
//!
//! Every thread owns one `ThreadCache`: an array of intrusive block lists,
//! one per size class, touched by no other thread. The hot path is a plain
//! list pop or push with no locks and no atomics. Misses pull a batch from
//! the central cache; lists that outgrow their watermark drain three
//! quarters of themselves back. Requests above `MAX_BYTES` skip every tier
//! and map pages straight from the OS.

use crate::block::{BlockChain, BlockHeader, BlockList, BlockRef};
use crate::units::{Bytes, Pages, RoundUpTo};
use crate::{block, central_cache, imp, size_class};
use crate::{AllocErr, ALIGNMENT, FREE_LIST_SIZE, MAX_BYTES};
use core::cell::RefCell;
use core::cmp;
use core::ptr::NonNull;

pub(crate) struct ThreadCache {
    lists: Box<[BlockList]>,
}

impl ThreadCache {
    fn new() -> ThreadCache {
        let lists = (0..FREE_LIST_SIZE)
            .map(|_| BlockList::new())
            .collect::<Vec<_>>()
            .into_boxed_slice();
        ThreadCache { lists }
    }

    /// Serve one block of class `index`: pop the local list, or pull a
    /// batch from the central cache when it is empty.
    fn allocate_small(&mut self, index: usize) -> Result<NonNull<u8>, AllocErr> {
        invariant!(index < FREE_LIST_SIZE);
        if let Some(block) = unsafe { self.lists[index].pop() } {
            return Ok(block.user_ptr());
        }
        self.fetch_from_central(index)
    }

    /// Refill from L2: the first block of the batch goes to the caller, the
    /// rest land on the local list.
    fn fetch_from_central(&mut self, index: usize) -> Result<NonNull<u8>, AllocErr> {
        let mut chain = central_cache::global().fetch_batch(index, size_class::batch_for(index));
        unsafe {
            let first = chain.pop_front().ok_or(AllocErr)?;
            self.lists[index].splice_front(chain);
            Ok(first.user_ptr())
        }
    }

    /// Take a block back, draining the list when it outgrows its watermark.
    ///
    /// # Safety
    ///
    /// `block` must be a live class-managed block owned by the caller.
    unsafe fn deallocate_small(&mut self, block: BlockRef) {
        let index = block.header().class_index();
        invariant!(index < FREE_LIST_SIZE);
        self.lists[index].push(block);
        if self.lists[index].len() > size_class::return_watermark(index) {
            self.drain_to_central(index);
        }
    }

    /// Keep a quarter of the list (a contiguous prefix from the head, at
    /// least one block) and hand the rest to the central cache as one
    /// chain.
    fn drain_to_central(&mut self, index: usize) {
        let list = &mut self.lists[index];
        let keep = cmp::max(list.len() / 4, 1);
        let chain = unsafe { list.split_keep(keep) };
        central_cache::global().return_batch(chain, index);
    }

    fn cached(&self, index: usize) -> usize {
        self.lists[index].len()
    }
}

impl Drop for ThreadCache {
    /// A dying thread surrenders everything it cached; nothing strands.
    fn drop(&mut self) {
        for index in 0..FREE_LIST_SIZE {
            if !self.lists[index].is_empty() {
                let chain = unsafe { self.lists[index].take_all() };
                central_cache::global().return_batch(chain, index);
            }
        }
    }
}

std::thread_local! {
    static THREAD_CACHE: RefCell<ThreadCache> = RefCell::new(ThreadCache::new());
}

/// Crate-internal allocate: clamp, route, and only then touch thread-local
/// state, so the bypass path works even where TLS does not.
pub(crate) fn allocate(size: usize) -> Result<NonNull<u8>, AllocErr> {
    let size = if size == 0 { ALIGNMENT.0 } else { size };
    if size > MAX_BYTES.0 {
        return large_allocate(Bytes(size));
    }

    let index = size_class::index_for(size);
    THREAD_CACHE
        .try_with(|cache| cache.borrow_mut().allocate_small(index))
        // The thread is tearing its TLS down; serve a single block straight
        // from the central cache instead.
        .unwrap_or_else(|_| allocate_uncached(index))
}

/// Crate-internal deallocate. The header in front of `ptr` routes the
/// block: large mappings unwind straight to the OS, class-managed blocks go
/// back to the owning thread's list.
///
/// # Safety
///
/// `ptr` must have come out of [`allocate`] and not been freed since.
pub(crate) unsafe fn deallocate(ptr: NonNull<u8>) {
    let block = BlockRef::from_user_ptr(ptr);
    let header = block.header();
    if header.is_large() {
        return large_deallocate(block, header);
    }
    invariant!(header.class_index() < FREE_LIST_SIZE);

    THREAD_CACHE
        .try_with(|cache| cache.borrow_mut().deallocate_small(block))
        .unwrap_or_else(|_| deallocate_uncached(block, header));
}

/// How many blocks the calling thread caches for `index` right now.
pub(crate) fn cached(index: usize) -> usize {
    THREAD_CACHE
        .try_with(|cache| cache.borrow().cached(index))
        .unwrap_or(0)
}

fn allocate_uncached(index: usize) -> Result<NonNull<u8>, AllocErr> {
    let mut chain = central_cache::global().fetch_batch(index, 1);
    unsafe { chain.pop_front().map(BlockRef::user_ptr).ok_or(AllocErr) }
}

unsafe fn deallocate_uncached(block: BlockRef, header: BlockHeader) {
    central_cache::global().return_batch(BlockChain::single(block), header.class_index());
}

/// Bypass path: map `size + header` bytes of pages, stamp the sentinel
/// header with the mapping's length, and hand back the region after it.
fn large_allocate(size: Bytes) -> Result<NonNull<u8>, AllocErr> {
    let pages: Pages = (size + block::HEADER_SIZE).round_up_to();
    let base = imp::map_pages(pages)?;
    unsafe {
        let block = BlockRef::from_header_ptr(base);
        block.write_header(BlockHeader::large(pages));
        Ok(block.user_ptr())
    }
}

/// Bypass frees unmap directly; no tier ever sees the block.
unsafe fn large_deallocate(block: BlockRef, header: BlockHeader) {
    let pages = header.mapped_pages();
    invariant!(pages.0 > 0);
    imp::unmap_pages(NonNull::new_unchecked(block.header_ptr() as *mut u8), pages);
}
