//! The central tier: one block list per size class, shared by every thread.
//!
//! Each class has its own spinlock, so two threads contend only when they
//! miss their thread caches on the same class at the same time. A redundant
//! atomic length per class allows lock-free reads of list sizes for tests
//! and debugging; the spinlock is authoritative.

use crate::block::{BlockChain, BlockHeader, BlockList, BlockRef};
use crate::units::Bytes;
use crate::{page_heap, size_class, FREE_LIST_SIZE};
use core::ptr::NonNull;
use core::sync::atomic::{AtomicUsize, Ordering};

struct CentralSlot {
    list: spin::Mutex<BlockList>,
    len: AtomicUsize,
}

/// The process-wide central cache. One slot per size class; classes never
/// touch each other's state.
pub(crate) struct CentralCache {
    slots: Box<[CentralSlot]>,
}

impl CentralCache {
    fn new() -> CentralCache {
        let slots = (0..FREE_LIST_SIZE)
            .map(|_| CentralSlot {
                list: spin::Mutex::new(BlockList::new()),
                len: AtomicUsize::new(0),
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();
        CentralCache { slots }
    }

    /// Detach up to `n` blocks of class `index` as one chain.
    ///
    /// Refills from the page heap while the class lock is held — refills
    /// are rare next to fetches, and the tier order L2 → L3 is strictly
    /// one-way, so the page heap's mutex cannot deadlock against a class
    /// spinlock. Returns an empty chain when the page heap cannot supply
    /// memory either.
    pub(crate) fn fetch_batch(&self, index: usize, n: usize) -> BlockChain {
        invariant!(index < FREE_LIST_SIZE);
        let slot = &self.slots[index];
        let mut list = slot.list.lock();

        if list.len() < n {
            refill(index, &mut list);
        }

        let chain = unsafe { list.split_front(n) };
        slot.len.store(list.len(), Ordering::Release);
        chain
    }

    /// Splice a chain of class-`index` blocks back onto the list head.
    ///
    /// The chain already knows its tail (found once, outside any lock, by
    /// whoever detached it), so the splice itself is O(1) under the lock.
    pub(crate) fn return_batch(&self, chain: BlockChain, index: usize) {
        invariant!(index < FREE_LIST_SIZE);
        if chain.is_empty() {
            return;
        }
        let slot = &self.slots[index];
        let mut list = slot.list.lock();
        unsafe { list.splice_front(chain) };
        slot.len.store(list.len(), Ordering::Release);
    }

    /// Lock-free view of a class's list length. Racy; the spinlock is the
    /// authority.
    pub(crate) fn approx_len(&self, index: usize) -> usize {
        invariant!(index < FREE_LIST_SIZE);
        self.slots[index].len.load(Ordering::Acquire)
    }
}

/// Ask the page heap for a span, carve it into class-`index` blocks, stamp
/// every header, and splice the lot onto `list`. A failed span request
/// leaves the list untouched.
fn refill(index: usize, list: &mut BlockList) {
    let span = match page_heap::global()
        .lock()
        .allocate_span(size_class::span_pages_for(index))
    {
        Ok(span) => span,
        Err(_) => return,
    };

    let footprint = size_class::block_footprint(index).0;
    let span_bytes: Bytes = span.pages.into();
    let count = span_bytes.0 / footprint;
    invariant!(count > 0);

    unsafe {
        let base = span.addr.as_ptr();
        let first = carve_block(base, index);
        let mut tail = first;
        for i in 1..count {
            let block = carve_block(base.add(i * footprint), index);
            tail.set_next(Some(block));
            tail = block;
        }
        tail.set_next(None);

        list.splice_front(BlockChain::from_linked_run(first, tail, count));
    }
}

unsafe fn carve_block(header_at: *mut u8, index: usize) -> BlockRef {
    let block = BlockRef::from_header_ptr(NonNull::new_unchecked(header_at));
    block.write_header(BlockHeader::small(index));
    block
}

lazy_static::lazy_static! {
    static ref CENTRAL_CACHE: CentralCache = CentralCache::new();
}

/// The process-wide central cache, initialised on first use.
pub(crate) fn global() -> &'static CentralCache {
    &CENTRAL_CACHE
}
