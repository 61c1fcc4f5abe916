//! Round-robin partitioning of the player list.
//!
//! Player `i` belongs to partition `i % count`. Pool worker `k` runs
//! partition `k`; the dispatching thread always runs the last partition,
//! so a single-partition pool never touches another thread.

/// Partition that owns player index `i`.
pub fn owner_of(i: usize, count: usize) -> usize {
    i % count.max(1)
}

/// Player indices belonging to partition `index` of `count` over a list
/// of `len` players. Empty when `index >= count`.
pub fn indices(len: usize, index: usize, count: usize) -> impl Iterator<Item = usize> {
    let count = count.max(1);
    let start = if index < count { index } else { len };
    (start..len).step_by(count)
}

/// Partition index run by the dispatching thread.
pub fn caller_partition(count: usize) -> usize {
    count.max(1) - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_partition_covers_everything() {
        assert_eq!(indices(5, 0, 1).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
        assert_eq!(caller_partition(1), 0);
    }

    #[test]
    fn interleaved_three_way() {
        assert_eq!(indices(7, 0, 3).collect::<Vec<_>>(), vec![0, 3, 6]);
        assert_eq!(indices(7, 1, 3).collect::<Vec<_>>(), vec![1, 4]);
        assert_eq!(indices(7, 2, 3).collect::<Vec<_>>(), vec![2, 5]);
    }

    #[test]
    fn empty_list_and_out_of_range_partition() {
        assert_eq!(indices(0, 0, 4).count(), 0);
        assert_eq!(indices(10, 4, 4).count(), 0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn every_index_exactly_once(len in 0usize..500, count in 1usize..40) {
                let mut seen = vec![0u32; len];
                for p in 0..count {
                    for i in indices(len, p, count) {
                        prop_assert_eq!(owner_of(i, count), p);
                        seen[i] += 1;
                    }
                }
                prop_assert!(seen.iter().all(|&n| n == 1));
            }
        }
    }
}
