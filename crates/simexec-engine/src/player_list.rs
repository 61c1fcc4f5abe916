//! Immutable, sorted player-list snapshots.
//!
//! A [`PlayerList`] is built once by list maintenance, published behind
//! an `Arc`, and never mutated afterwards. Entries are ordered by
//! [`PlayerKey`]: local players first by ID, then remote players by
//! federate name and ID.

use std::sync::Arc;

use simexec_core::{NetworkId, Player, PlayerId, PlayerKey, PlayerLookup};

/// One `(name, player)` pair.
#[derive(Clone, Debug)]
pub struct PlayerEntry {
    /// Listed name.
    pub name: Arc<str>,
    /// The player.
    pub player: Arc<Player>,
}

/// Why [`PlayerList::insert_sorted()`] refused an entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InsertRefused {
    /// Another entry already uses this name.
    DuplicateName,
    /// Another entry already has this sort key.
    DuplicateKey,
}

/// A sorted player-list snapshot.
#[derive(Clone, Debug, Default)]
pub struct PlayerList {
    entries: Vec<PlayerEntry>,
}

impl PlayerList {
    /// Empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty list with room for `n` entries.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            entries: Vec::with_capacity(n),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in sort order.
    pub fn entries(&self) -> &[PlayerEntry] {
        &self.entries
    }

    /// Iterate entries in sort order.
    pub fn iter(&self) -> std::slice::Iter<'_, PlayerEntry> {
        self.entries.iter()
    }

    /// Sort keys in list order.
    pub fn keys(&self) -> Vec<PlayerKey> {
        self.entries.iter().map(|e| e.player.key()).collect()
    }

    fn position(&self, key: &PlayerKey) -> Result<usize, usize> {
        self.entries.binary_search_by(|e| e.player.key().cmp(key))
    }

    /// Entry with exactly this key.
    pub fn find_key(&self, key: &PlayerKey) -> Option<&PlayerEntry> {
        self.position(key).ok().map(|i| &self.entries[i])
    }

    /// Entry listed under `name`.
    pub fn find_by_name(&self, name: &str) -> Option<&PlayerEntry> {
        self.entries.iter().find(|e| &*e.name == name)
    }

    /// Whether `name` is already listed.
    pub fn contains_name(&self, name: &str) -> bool {
        self.find_by_name(name).is_some()
    }

    /// Whether this exact player object is listed.
    pub fn contains_player(&self, player: &Arc<Player>) -> bool {
        self.entries.iter().any(|e| Arc::ptr_eq(&e.player, player))
    }

    /// Append an entry known to sort after every existing one.
    ///
    /// Used when copying survivors out of an already sorted list.
    pub(crate) fn push_sorted(&mut self, entry: PlayerEntry) {
        debug_assert!(self
            .entries
            .last()
            .map(|last| last.player.key() < entry.player.key())
            .unwrap_or(true));
        self.entries.push(entry);
    }

    /// Insert at the position given by the sort key.
    ///
    /// Refuses duplicate names and duplicate keys, leaving the list
    /// unchanged. Returns the insertion index.
    pub fn insert_sorted(
        &mut self,
        name: Arc<str>,
        player: Arc<Player>,
    ) -> Result<usize, InsertRefused> {
        if self.contains_name(&name) {
            return Err(InsertRefused::DuplicateName);
        }
        let key = player.key();
        match self.position(&key) {
            Ok(_) => Err(InsertRefused::DuplicateKey),
            Err(at) => {
                self.entries.insert(at, PlayerEntry { name, player });
                Ok(at)
            }
        }
    }

    /// Smallest local ID not yet in use, if any remain.
    pub fn next_free_local_id(&self) -> Option<PlayerId> {
        let mut candidate: u32 = 1;
        for e in self.entries.iter().take_while(|e| e.player.is_local()) {
            let id = u32::from(e.player.id().0);
            if id == candidate {
                candidate += 1;
            } else if id > candidate {
                break;
            }
        }
        u16::try_from(candidate).ok().map(PlayerId)
    }

    /// Whether entries are in strictly ascending key order.
    pub fn is_sorted(&self) -> bool {
        self.entries
            .windows(2)
            .all(|w| w[0].player.key() < w[1].player.key())
    }

    /// Index of the first remote entry (`len()` when all are local).
    pub fn first_remote(&self) -> usize {
        self.entries.partition_point(|e| e.player.is_local())
    }
}

impl PlayerLookup for PlayerList {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn player_at(&self, index: usize) -> Option<&Arc<Player>> {
        self.entries.get(index).map(|e| &e.player)
    }

    fn find(&self, id: PlayerId, network_id: NetworkId) -> Option<&Arc<Player>> {
        if network_id.is_local() {
            return self.find_key(&PlayerKey::local(id)).map(|e| &e.player);
        }
        self.entries[self.first_remote()..]
            .iter()
            .find(|e| e.player.id() == id && e.player.network_id() == network_id)
            .map(|e| &e.player)
    }
}

impl<'a> IntoIterator for &'a PlayerList {
    type Item = &'a PlayerEntry;
    type IntoIter = std::slice::Iter<'a, PlayerEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
