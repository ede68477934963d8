//! The direct-to-OS path for requests above `MAX_BYTES`, and the routing
//! boundary around it.
//!
//! This file holds exactly one test so the process-wide counters it reads
//! are not disturbed by concurrently running tests.

use strata_alloc::MAX_BYTES;

#[test]
fn bypass_allocations_never_touch_the_tiers() {
    // Writing every byte of a bypass block must not disturb the tiered
    // state, and freeing it must go straight back to the OS.
    let size = MAX_BYTES.0 + 1024;

    // Warm the tiers first so the comparison below is not confused by
    // first-use initialisation.
    let warm = strata_alloc::allocate(64);
    assert!(!warm.is_null());

    let before = strata_alloc::heap_stats();
    let central_before = strata_alloc::central_len(2);

    let p = strata_alloc::allocate(size);
    assert!(!p.is_null());
    unsafe {
        p.write_bytes(0xA7, size);
        assert_eq!(*p, 0xA7);
        assert_eq!(*p.add(size - 1), 0xA7);
        strata_alloc::deallocate(p);
    }

    let after = strata_alloc::heap_stats();
    assert_eq!(before.span_requests, after.span_requests);
    assert_eq!(before.os_maps, after.os_maps);
    assert_eq!(before.total_free_pages, after.total_free_pages);
    assert_eq!(strata_alloc::central_len(2), central_before);

    // Boundary routing: MAX_BYTES itself is tiered, one byte more is not.
    let tiered = strata_alloc::allocate(MAX_BYTES.0);
    assert!(!tiered.is_null());
    assert!(
        strata_alloc::heap_stats().span_requests > after.span_requests,
        "a MAX_BYTES allocation should have gone through the page heap"
    );

    let spans_at_boundary = strata_alloc::heap_stats().span_requests;
    let bypassed = strata_alloc::allocate(MAX_BYTES.0 + 1);
    assert!(!bypassed.is_null());
    assert_eq!(
        strata_alloc::heap_stats().span_requests,
        spans_at_boundary,
        "a MAX_BYTES + 1 allocation should have bypassed the page heap"
    );

    unsafe {
        strata_alloc::deallocate(tiered);
        strata_alloc::deallocate(bypassed);
        strata_alloc::deallocate(warm);
        // Null is a documented no-op.
        strata_alloc::deallocate(core::ptr::null_mut());
    }
}
