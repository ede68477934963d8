//! Model-based round-trip testing: random traces of allocate/free calls
//! must never hand out misaligned, undersized, or overlapping memory, and
//! freeing in any order must leave the allocator able to serve the same
//! sizes again.

use strata_alloc_test::{run, Alloc, Free, Operation, Operations};

quickcheck::quickcheck! {
    fn random_traces_preserve_integrity(ops: Operations) -> bool {
        run(&ops);
        true
    }
}

#[test]
fn same_sizes_succeed_after_a_full_release() {
    // Round-trip: allocate a spread of sizes, free them all in reverse,
    // then allocate the same spread again.
    let sizes: Vec<usize> = (0..512).map(|i| i * 17 % 4096 + 1).collect();

    let first: Vec<Operation> = sizes.iter().map(|&s| Alloc(s)).collect();
    let frees: Vec<Operation> = (0..sizes.len()).rev().map(Free).collect();
    let second: Vec<Operation> = sizes.iter().map(|&s| Alloc(s)).collect();

    let mut ops = first;
    ops.extend(frees);
    ops.extend(second);
    run(&Operations(ops));
}

#[test]
fn interleaved_churn_across_classes() {
    // A deterministic pattern that keeps several classes hot at once and
    // frees in an order unrelated to allocation order.
    let mut ops = Vec::new();
    let mut made = 0;
    for round in 0..64 {
        for &size in &[8, 24, 256, 1024, 3000] {
            ops.push(Alloc(size + round));
            made += 1;
        }
        if round % 2 == 1 {
            // Free the allocations of the *previous* round, middle-out.
            let base = (round - 1) * 5;
            for &k in &[2, 0, 4, 1, 3] {
                ops.push(Free(base + k));
            }
        }
    }
    for idx in 0..made {
        ops.push(Free(idx));
    }
    run(&Operations(ops));
}
