//! Fair shuffling for answer options.
//!
//! Display order must never leak the correct answer, so the permutation has
//! to be uniform and independent of element values.

use rand::Rng;
use rand::thread_rng;

/// Return a uniformly shuffled copy of `items`, leaving the input untouched.
///
/// Backward Fisher–Yates: for each index `i` from the end down to 1, swap
/// with a uniformly chosen index in `[0, i]`. Empty and single-element
/// inputs come back as unchanged copies.
pub fn shuffled<T: Clone>(items: &[T]) -> Vec<T> {
    let mut out = items.to_vec();
    let mut rng = thread_rng();
    for i in (1..out.len()).rev() {
        let j = rng.gen_range(0..=i);
        out.swap(i, j);
    }
    out
}
