//! Size-class quantisation and the batching schedules that drive movement
//! between the tiers.
//!
//! Classes are linear: index `i` serves user sizes in
//! `((i) * ALIGNMENT, (i + 1) * ALIGNMENT]`. There are `FREE_LIST_SIZE`
//! of them, covering `[1, MAX_BYTES]`.

use crate::block;
use crate::units::{Bytes, Pages, RoundUpTo};
use crate::{ALIGNMENT, FREE_LIST_SIZE, MAX_BYTES, MIN_SPAN_PAGES, RETURN_WATERMARK_FACTOR};
use core::cmp;

/// Free-list index for a user size. Callers must have clamped `size` to
/// `(0, MAX_BYTES]` already.
#[inline]
pub(crate) fn index_for(size: usize) -> usize {
    invariant!(size > 0);
    invariant!(size <= MAX_BYTES.0);
    (size + ALIGNMENT.0 - 1) / ALIGNMENT.0 - 1
}

/// The user-visible capacity of blocks in class `index`.
#[inline]
pub(crate) fn size_for(index: usize) -> Bytes {
    invariant!(index < FREE_LIST_SIZE);
    Bytes((index + 1) * ALIGNMENT.0)
}

/// Total footprint of one class-`index` block inside a span: capacity plus
/// the 8-byte header in front of it.
#[inline]
pub(crate) fn block_footprint(index: usize) -> Bytes {
    size_for(index) + block::HEADER_SIZE
}

/// Blocks a thread cache pulls from the central cache in one fetch.
///
/// Monotone in the block size: smaller classes prefetch more, and the
/// worst-case prefetch stays bounded (64 blocks of 128 bytes). The same
/// table feeds [`return_watermark`], which keeps the drain arithmetic
/// stable.
pub(crate) fn batch_for(index: usize) -> usize {
    let bytes = size_for(index).0;
    if bytes <= 128 {
        64
    } else if bytes <= 1024 {
        32
    } else if bytes <= 65536 {
        8
    } else {
        4
    }
}

/// List length past which a thread cache hands three quarters of the list
/// back to the central cache.
#[inline]
pub(crate) fn return_watermark(index: usize) -> usize {
    RETURN_WATERMARK_FACTOR * batch_for(index)
}

/// Pages the central cache requests from the page heap when refilling class
/// `index`.
///
/// A step schedule: bigger classes take bigger spans so a refill always
/// carves a useful number of blocks. The result is clamped from below so
/// that even the largest class's span fits at least one whole block.
pub(crate) fn span_pages_for(index: usize) -> Pages {
    let schedule = if index < 16 {
        MIN_SPAN_PAGES
    } else if index < 64 {
        Pages(16)
    } else {
        Pages(32)
    };
    let one_block: Pages = block_footprint(index).round_up_to();
    cmp::max(schedule, one_block)
}
