//! Batching effectiveness: a long run of same-sized allocations must be
//! amortised into a small number of span requests at the page heap.
//!
//! This file holds exactly one test so the process-wide counters it reads
//! are not disturbed by concurrently running tests.

#[test]
fn a_hundred_thousand_small_allocations_need_few_spans() {
    const COUNT: usize = 100_000;
    const SIZE: usize = 24;

    let spans_before = strata_alloc::heap_stats().span_requests;

    let mut ptrs = Vec::with_capacity(COUNT);
    for i in 0..COUNT {
        let p = strata_alloc::allocate(SIZE);
        assert!(!p.is_null(), "allocation {} of {} failed", i, COUNT);
        ptrs.push(p);
    }

    let spans_after = strata_alloc::heap_stats().span_requests;
    let spans_used = spans_after - spans_before;
    assert!(
        spans_used < 100,
        "expected batching to amortise {} allocations into fewer than 100 \
         span requests, saw {}",
        COUNT,
        spans_used
    );

    for p in ptrs {
        unsafe { strata_alloc::deallocate(p) };
    }

    // Returning the blocks is pure list work: no further span traffic.
    assert_eq!(strata_alloc::heap_stats().span_requests, spans_after);
}
