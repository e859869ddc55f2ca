// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Bottom-K selection
//!
//! The seam strategies score far more candidates than they keep.
//! Sorting every candidate to keep a handful is wasteful, so we find
//! the k-th smallest key with a randomised quickselect (expected linear
//! time), keep whatever is at or below it, and sort only that.
//!
//! Ties: when more items share the k-th key than there is room for,
//! the ones that came first in the input win.

use rand::Rng;
use std::cmp::Ordering;

#[inline]
fn order<K: PartialOrd>(a: &K, b: &K) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

/// Lomuto partition around `keys[pivot]`; returns the pivot's final
/// position.
fn partition<K: PartialOrd + Copy>(keys: &mut [K], pivot: usize) -> usize {
    let high = keys.len() - 1;
    keys.swap(pivot, high);
    let pivot_value = keys[high];
    let mut store = 0;
    for i in 0..high {
        if order(&keys[i], &pivot_value) == Ordering::Less {
            keys.swap(i, store);
            store += 1;
        }
    }
    keys.swap(store, high);
    store
}

/// The `k`-th smallest key (0-based) of `keys`, reordering `keys`.
/// `keys` must be non-empty and `k < keys.len()`.
pub fn quickselect<K: PartialOrd + Copy, R: Rng>(keys: &mut [K], k: usize, rng: &mut R) -> K {
    let (mut low, mut high) = (0, keys.len() - 1);
    loop {
        if low == high {
            return keys[low];
        }
        let pivot = rng.gen_range(low..=high);
        let pivot = low + partition(&mut keys[low..=high], pivot - low);
        match k.cmp(&pivot) {
            Ordering::Equal => return keys[k],
            Ordering::Less => high = pivot - 1,
            Ordering::Greater => low = pivot + 1,
        }
    }
}

/// The `k` items with the smallest `key`, in ascending key order.
/// Fewer than `k` items in means all of them come back, sorted.
pub fn bottom_k<T, K, F>(items: Vec<T>, k: usize, key: F) -> Vec<T>
where
    K: PartialOrd + Copy,
    F: Fn(&T) -> K,
{
    bottom_k_with(items, k, key, &mut rand::thread_rng())
}

/// [`bottom_k`] with a caller-supplied source of pivots.
pub fn bottom_k_with<T, K, F, R>(items: Vec<T>, k: usize, key: F, rng: &mut R) -> Vec<T>
where
    K: PartialOrd + Copy,
    F: Fn(&T) -> K,
    R: Rng,
{
    if k == 0 || items.is_empty() {
        return Vec::new();
    }

    let mut keyed: Vec<(K, T)> = items.into_iter().map(|item| (key(&item), item)).collect();

    if k < keyed.len() {
        let mut keys: Vec<K> = keyed.iter().map(|(key, _)| *key).collect();
        let threshold = quickselect(&mut keys, k - 1, rng);
        keyed.retain(|(key, _)| order(key, &threshold) != Ordering::Greater);
    }

    // Stable, so equal keys keep their input order through truncation.
    keyed.sort_by(|a, b| order(&a.0, &b.0));
    keyed.truncate(k);
    keyed.into_iter().map(|(_, item)| item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn values(v: &[i32]) -> Vec<i32> {
        v.to_vec()
    }

    #[test]
    fn smallest_in_sorted_order() {
        assert_eq!(bottom_k(values(&[5, 2, 8, 1, 9, 3]), 3, |v| *v), [1, 2, 3]);
        assert_eq!(bottom_k(values(&[9, 1, 8, 2, 7, 3, 6, 4, 5]), 6, |v| *v), [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn duplicates_and_zero() {
        assert_eq!(bottom_k(values(&[3, 1, 4, 1, 5, 9, 2, 6, 5, 3]), 4, |v| *v), [1, 1, 2, 3]);
        assert_eq!(bottom_k(values(&[0, -1, 1, 0, 2, -2]), 4, |v| *v), [-2, -1, 0, 0]);
    }

    #[test]
    fn whole_input_and_singletons() {
        assert_eq!(bottom_k(values(&[3, 1, 4, 2]), 4, |v| *v), [1, 2, 3, 4]);
        assert_eq!(bottom_k(values(&[3, 1, 4, 2]), 10, |v| *v), [1, 2, 3, 4]);
        assert_eq!(bottom_k(values(&[42]), 1, |v| *v), [42]);
        assert!(bottom_k(values(&[42]), 0, |v| *v).is_empty());
        assert!(bottom_k(Vec::<i32>::new(), 3, |v| *v).is_empty());
    }

    #[test]
    fn float_keys() {
        let result = bottom_k(vec![3.14, 2.71, 1.41, 1.73, 2.23], 3, |v: &f64| *v);
        assert_eq!(result, [1.41, 1.73, 2.23]);
    }

    #[test]
    fn ties_keep_input_order() {
        let items = vec![("a", 2), ("b", 1), ("c", 2), ("d", 2), ("e", 3)];
        let result = bottom_k(items, 3, |(_, energy)| *energy);
        assert_eq!(result, [("b", 1), ("a", 2), ("c", 2)]);
    }

    #[test]
    fn bottom_five_bound_everything_excluded() {
        let mut rng = StdRng::seed_from_u64(7);
        let energies: Vec<u32> = (0..200).map(|_| rng.gen_range(0..50)).collect();
        let candidates: Vec<(usize, u32)> = energies.iter().copied().enumerate().collect();
        let picked = bottom_k_with(
            candidates,
            5,
            |(_, e)| *e,
            &mut rng,
        );
        assert_eq!(picked.len(), 5);
        assert!(picked.windows(2).all(|w| w[0].1 <= w[1].1));
        let worst = picked.last().map(|(_, e)| *e).unwrap();
        let chosen: Vec<usize> = picked.iter().map(|(i, _)| *i).collect();
        for (i, e) in energies.iter().enumerate() {
            if !chosen.contains(&i) {
                assert!(worst <= *e);
            }
        }
    }

    #[test]
    fn quickselect_finds_order_statistics() {
        let mut rng = StdRng::seed_from_u64(1);
        for k in 0..9 {
            let mut keys = [9, 1, 8, 2, 7, 3, 6, 4, 5];
            assert_eq!(quickselect(&mut keys, k, &mut rng), k as i32 + 1);
        }
    }
}
