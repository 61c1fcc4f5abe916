//! Sorted, bounded NIB table.
//!
//! NIBs are kept ordered by (player ID, federate name) so lookups are a
//! binary search. Insertion appends and bubbles the new entry down to its
//! slot; removal compacts in place.

use std::cmp::Ordering;
use std::sync::Arc;

use simexec_core::{FederateName, PlayerId};

use crate::error::NetError;
use crate::nib::{IoType, Nib};

fn compare(nib: &Nib, id: PlayerId, federate: &FederateName) -> Ordering {
    nib.player_id()
        .cmp(&id)
        .then_with(|| nib.federate().cmp(federate))
}

/// A fixed-capacity table of NIBs for one direction.
#[derive(Debug)]
pub struct NibTable {
    io_type: IoType,
    capacity: usize,
    nibs: Vec<Arc<Nib>>,
}

impl NibTable {
    /// Empty table holding at most `capacity` NIBs.
    pub fn new(io_type: IoType, capacity: usize) -> Self {
        Self {
            io_type,
            capacity,
            nibs: Vec::with_capacity(capacity.min(64)),
        }
    }

    /// Direction of every NIB in the table.
    pub fn io_type(&self) -> IoType {
        self.io_type
    }

    /// Maximum number of NIBs.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of NIBs.
    pub fn len(&self) -> usize {
        self.nibs.len()
    }

    /// True if the table holds no NIBs.
    pub fn is_empty(&self) -> bool {
        self.nibs.is_empty()
    }

    /// Whether another NIB can be inserted.
    pub fn is_full(&self) -> bool {
        self.nibs.len() >= self.capacity
    }

    /// NIBs in key order.
    pub fn iter(&self) -> std::slice::Iter<'_, Arc<Nib>> {
        self.nibs.iter()
    }

    /// Cloned handles to every NIB, for iteration outside the table lock.
    pub fn snapshot(&self) -> Vec<Arc<Nib>> {
        self.nibs.clone()
    }

    /// Find the NIB for (`id`, `federate`).
    pub fn find(&self, id: PlayerId, federate: &FederateName) -> Option<&Arc<Nib>> {
        self.nibs
            .binary_search_by(|n| compare(n, id, federate))
            .ok()
            .map(|i| &self.nibs[i])
    }

    /// Insert a NIB at its sorted position and return that position.
    pub fn insert(&mut self, nib: Arc<Nib>) -> Result<usize, NetError> {
        if self.find(nib.player_id(), nib.federate()).is_some() {
            return Err(NetError::Duplicate {
                player_id: nib.player_id(),
                federate: nib.federate().clone(),
            });
        }
        if self.is_full() {
            return Err(NetError::TableFull {
                io: self.io_type,
                capacity: self.capacity,
            });
        }
        self.nibs.push(nib);
        let mut i = self.nibs.len() - 1;
        while i > 0 {
            let (a, b) = (&self.nibs[i - 1], &self.nibs[i]);
            if compare(a, b.player_id(), b.federate()) != Ordering::Greater {
                break;
            }
            self.nibs.swap(i - 1, i);
            i -= 1;
        }
        Ok(i)
    }

    /// Remove and return the NIB for (`id`, `federate`).
    pub fn remove(&mut self, id: PlayerId, federate: &FederateName) -> Result<Arc<Nib>, NetError> {
        match self.nibs.binary_search_by(|n| compare(n, id, federate)) {
            Ok(i) => Ok(self.nibs.remove(i)),
            Err(_) => Err(NetError::NotFound {
                player_id: id,
                federate: federate.clone(),
            }),
        }
    }

    /// Keep only the NIBs for which `keep` returns `true`, in one
    /// compacting pass. Returns the removed NIBs in key order.
    pub fn retain(&mut self, mut keep: impl FnMut(&Arc<Nib>) -> bool) -> Vec<Arc<Nib>> {
        let mut removed = Vec::new();
        self.nibs.retain(|n| {
            if keep(n) {
                true
            } else {
                removed.push(Arc::clone(n));
                false
            }
        });
        removed
    }

    /// Drop every NIB.
    pub fn clear(&mut self) -> Vec<Arc<Nib>> {
        std::mem::take(&mut self.nibs)
    }

    /// Whether the table is in strictly ascending key order.
    pub fn is_sorted(&self) -> bool {
        self.nibs
            .windows(2)
            .all(|w| compare(&w[0], w[1].player_id(), w[1].federate()) == Ordering::Less)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dead_reckoning::{DrAlgorithm, DrThresholds};
    use crate::entity_type::EntityType;
    use crate::nib::NibInit;
    use simexec_core::NetworkId;

    fn nib(id: u16, fed: &str) -> Arc<Nib> {
        Arc::new(Nib::new(NibInit {
            io_type: IoType::Input,
            network_id: NetworkId(1),
            player_id: PlayerId(id),
            federate: FederateName::new(fed),
            name: Arc::from("n"),
            entity_type: EntityType::default(),
            dr_algorithm: DrAlgorithm::Fpw,
            thresholds: DrThresholds::default(),
        }))
    }

    fn keys(t: &NibTable) -> Vec<(u16, String)> {
        t.iter()
            .map(|n| (n.player_id().0, n.federate().as_str().to_string()))
            .collect()
    }

    #[test]
    fn insert_keeps_order() {
        let mut t = NibTable::new(IoType::Input, 10);
        for (id, fed) in [(5, "B"), (2, "A"), (5, "A"), (1, "Z")] {
            t.insert(nib(id, fed)).unwrap();
        }
        assert_eq!(
            keys(&t),
            vec![
                (1, "Z".into()),
                (2, "A".into()),
                (5, "A".into()),
                (5, "B".into())
            ]
        );
        assert!(t.find(PlayerId(5), &FederateName::new("A")).is_some());
        assert!(t.find(PlayerId(5), &FederateName::new("C")).is_none());
    }

    #[test]
    fn capacity_and_duplicates() {
        let mut t = NibTable::new(IoType::Output, 2);
        t.insert(nib(1, "A")).unwrap();
        assert!(matches!(t.insert(nib(1, "A")), Err(NetError::Duplicate { .. })));
        t.insert(nib(2, "A")).unwrap();
        assert_eq!(
            t.insert(nib(3, "A")),
            Err(NetError::TableFull {
                io: IoType::Output,
                capacity: 2
            })
        );
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn remove_and_retain() {
        let mut t = NibTable::new(IoType::Input, 10);
        for id in 1..=5 {
            t.insert(nib(id, "A")).unwrap();
        }
        t.remove(PlayerId(3), &FederateName::new("A")).unwrap();
        assert!(t.remove(PlayerId(3), &FederateName::new("A")).is_err());
        let removed = t.retain(|n| n.player_id().0 % 2 == 1);
        assert_eq!(removed.len(), 2);
        assert_eq!(keys(&t), vec![(1, "A".into()), (5, "A".into())]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn any_insertion_order_is_sorted(
                entries in proptest::collection::vec((0u16..50, 0usize..3), 0..60),
            ) {
                let feds = ["A", "B", "C"];
                let mut t = NibTable::new(IoType::Input, 40);
                let mut accepted = std::collections::BTreeSet::new();
                for (id, f) in entries {
                    let key = (id, feds[f]);
                    match t.insert(nib(id, feds[f])) {
                        Ok(_) => prop_assert!(accepted.insert(key)),
                        Err(NetError::Duplicate { .. }) => prop_assert!(accepted.contains(&key)),
                        Err(NetError::TableFull { .. }) => prop_assert_eq!(accepted.len(), 40),
                        Err(other) => prop_assert!(false, "unexpected {other}"),
                    }
                }
                prop_assert!(t.is_sorted());
                prop_assert_eq!(t.len(), accepted.len());
                for (id, fed) in &accepted {
                    prop_assert!(t.find(PlayerId(*id), &FederateName::new(fed)).is_some());
                }
            }
        }
    }
}
