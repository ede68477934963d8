/*!

## About

`strata_alloc`: a three-tier caching memory allocator.

- **Layered:** a lock-free per-thread front end, a process-wide central
  cache with one spinlock per size class, and a page-level back end that
  talks to the operating system. The hot path never takes a lock and never
  blocks.

- **Batched:** every boundary between tiers moves blocks in batches, so the
  cost of central locking and OS page mapping is amortised over hundreds of
  requests.

`strata_alloc` is aimed at latency-sensitive multi-threaded programs that
make many small-to-medium allocations. It is a drop-in *library* allocator:
callers obtain memory through [`allocate`] and return it through
[`deallocate`]. It deliberately does not register itself as Rust's global
allocator — its internal bookkeeping uses the system allocator, which keeps
initialisation and span management free of reentrancy.

## Using `strata_alloc`

```
let p = strata_alloc::allocate(64);
assert!(!p.is_null());
unsafe {
    p.write_bytes(0xAB, 64);
    strata_alloc::deallocate(p);
}
```

## `cargo` Features

- **extra_assertions**: Enable various extra, expensive integrity assertions
  and defensive mechanisms, such as walking whole free lists and span maps.
  This incurs a large runtime overhead. It is useful when debugging a
  use-after-free or `strata_alloc` itself.

## Implementation Notes and Constraints

- Every allocation carries an 8-byte header recording its size class (or,
  for direct OS mappings, the mapped page count). Free blocks keep the
  header and reuse the first word of the user region as an intrusive next
  pointer, so per-block overhead stays at one word.

- Requests larger than `MAX_BYTES` (256 KiB) bypass all three tiers and map
  pages straight from the OS; freeing them unmaps without touching any
  cache.

- The page heap coalesces returned spans eagerly and gives memory back to
  the OS once its free-page pool exceeds `RELEASE_THRESHOLD_PAGES`.

Here is a diagram giving an overview of the implementation:

```text
+------------------------------------------------------------------+
| Operating System                                                 |
+------------------------------------------------------------------+
          |  4 KiB page runs ("spans")              ^
          V                                         | release over
+------------------------------------------------------------------+
| PageHeap          by_size / by_addr span maps, one mutex         |
+------------------------------------------------------------------+
          |  spans, split on demand                 ^
          V                                         | (not reclaimed)
+------------------------------------------------------------------+
| CentralCache      one block list + spinlock per size class       |
+------------------------------------------------------------------+
          |  batches of blocks                      ^
          V                                         | 3/4 of list past
+------------------------------------------------------------------+
| ThreadCache       per-thread block lists, no locks               |
+------------------------------------------------------------------+
          |  single blocks                          ^
          V                                         |
+------------------------------------------------------------------+
| User Application          (> 256 KiB goes straight to the OS)    |
+------------------------------------------------------------------+
```

 */

#![deny(missing_docs)]

#[macro_use]
mod invariant;

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        mod imp_unix;
        pub(crate) use imp_unix as imp;
    } else if #[cfg(windows)] {
        mod imp_windows;
        pub(crate) use imp_windows as imp;
    } else {
        compile_error! {
            "There is no `strata_alloc` page-mapping backend for this target; \
             want to send a pull request? :)"
        }
    }
}

mod block;
mod central_cache;
mod page_heap;
mod size_class;
mod thread_cache;
mod units;

pub use page_heap::PageHeapStats;
pub use units::{Bytes, Pages, RoundUpTo};

use core::ptr;

/// The hardware page size, in bytes.
pub const PAGE_SIZE: Bytes = Bytes(4096);

/// The allocation quantum: user sizes are rounded up to a multiple of this,
/// and every returned pointer is aligned to it.
pub const ALIGNMENT: Bytes = Bytes(8);

/// The largest request served through the tiered caches. Anything bigger
/// bypasses them and maps pages directly.
pub const MAX_BYTES: Bytes = Bytes(256 * 1024);

/// Number of size classes: one per `ALIGNMENT` multiple up to `MAX_BYTES`.
pub const FREE_LIST_SIZE: usize = MAX_BYTES.0 / ALIGNMENT.0;

/// The smallest tail the page heap will leave behind when splitting a span.
pub const MIN_SPAN_PAGES: Pages = Pages(8);

/// Free-page ceiling; beyond it the page heap starts returning whole
/// original OS mappings.
pub const RELEASE_THRESHOLD_PAGES: Pages = Pages(16384);

/// Header sentinel marking a block that was mapped directly from the OS.
pub const LARGE_ALLOC_INDEX: u32 = 0xFFFF_FFFF;

/// A thread cache list longer than this factor times its fetch batch drains
/// three quarters of itself back to the central cache.
pub const RETURN_WATERMARK_FACTOR: usize = 16;

/// The error returned when an allocation cannot be satisfied: the OS denied
/// a page request somewhere below. Collapses to a null pointer at the public
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocErr;

/// Allocate `size` bytes, aligned to [`ALIGNMENT`].
///
/// A `size` of zero is served as the smallest size class. Returns null when
/// the OS is out of memory; the allocator is left consistent, and a later
/// call may succeed.
pub fn allocate(size: usize) -> *mut u8 {
    match thread_cache::allocate(size) {
        Ok(p) => p.as_ptr(),
        Err(AllocErr) => ptr::null_mut(),
    }
}

/// Return a block previously obtained from [`allocate`]. Null is a no-op.
///
/// # Safety
///
/// `ptr` must be null or a pointer returned by [`allocate`] (or the
/// [`StrataAlloc`] methods) that has not been deallocated since.
pub unsafe fn deallocate(ptr: *mut u8) {
    if let Some(p) = ptr::NonNull::new(ptr) {
        thread_cache::deallocate(p);
    }
}

/// A unit type carrying the allocator's public face, for callers that want
/// to pass "an allocator" around rather than call free functions.
#[derive(Debug, Default, Clone, Copy)]
pub struct StrataAlloc;

impl StrataAlloc {
    /// See [`allocate`].
    #[inline]
    pub fn allocate(&self, size: usize) -> *mut u8 {
        allocate(size)
    }

    /// See [`deallocate`].
    ///
    /// # Safety
    ///
    /// Same contract as the free function [`deallocate`].
    #[inline]
    pub unsafe fn deallocate(&self, ptr: *mut u8) {
        deallocate(ptr)
    }
}

/// Snapshot of the process-wide page heap's accounting. Cheap: one mutex
/// acquisition, no traversal.
pub fn heap_stats() -> PageHeapStats {
    page_heap::global_stats()
}

/// Lock-free view of how many blocks the central cache currently holds for
/// size class `index`. Racy by nature; intended for tests and debugging.
pub fn central_len(index: usize) -> usize {
    central_cache::global().approx_len(index)
}

/// How many blocks the calling thread's cache holds for size class `index`.
pub fn thread_cached(index: usize) -> usize {
    thread_cache::cached(index)
}
