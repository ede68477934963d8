//! Structural invariant checks, active under the `extra_assertions` feature.
//!
//! An allocator cannot log its way out of a corrupted free list — calling a
//! logging facade from inside `allocate` would just re-enter the allocator.
//! The debugging story is heavyweight checking instead: every invariant is
//! asserted at the point it must hold, and whole-structure walks (see
//! `assert_well_formed` in `block.rs` and `assert_integrity` in
//! `page_heap.rs`) re-validate a list or the span maps after each mutation.
//!
//! Both macros expand to a branch on `cfg!(feature = "extra_assertions")`:
//! the condition still type-checks in every build, but without the feature
//! the branch is statically dead and the whole check disappears from the
//! compiled artifact.

/// Assert a structural invariant. Without `extra_assertions` the condition
/// is never evaluated at runtime.
macro_rules! invariant {
    ( $cond:expr $( , $args:expr )* ) => {
        if cfg!(feature = "extra_assertions") {
            assert!($cond $( , $args )* );
        }
    };
}

/// Like [`invariant!`], but comparing two values with `assert_eq!`.
macro_rules! invariant_eq {
    ( $left:expr , $right:expr $( , $args:expr )* ) => {
        if cfg!(feature = "extra_assertions") {
            assert_eq!($left, $right $( , $args )* );
        }
    };
}
