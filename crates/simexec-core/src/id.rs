//! Strongly-typed identifiers for players and network sessions.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Identifies a player within its owning network scope.
///
/// IDs are scoped per [`NetworkId`]: local player 5 and a proxy for
/// remote player 5 are distinct players. `PlayerId(0)` is reserved to
/// mean "auto-assign the next available ID" at insertion time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PlayerId(pub u16);

impl PlayerId {
    /// The "unset" ID, replaced with the next free ID on insertion.
    pub const UNSET: PlayerId = PlayerId(0);

    /// Whether this ID still needs to be assigned.
    pub fn is_unset(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for PlayerId {
    fn from(v: u16) -> Self {
        Self(v)
    }
}

/// Identifies the network session a player belongs to.
///
/// `NetworkId(0)` is the local simulation; `NetworkId(n)` for `n > 0` is
/// the n-th interoperability session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NetworkId(pub u8);

impl NetworkId {
    /// The local (non-networked) scope.
    pub const LOCAL: NetworkId = NetworkId(0);

    /// Whether this is the local scope.
    pub fn is_local(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for NetworkId {
    fn from(v: u8) -> Self {
        Self(v)
    }
}

/// Name of the federate that owns a remote entity.
///
/// Shared (`Arc<str>`) because the same name is held by the proxy player,
/// its input NIB, and every sort key built over them. Ordering is
/// lexicographic on the underlying bytes.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FederateName(Arc<str>);

impl FederateName {
    /// Create a federate name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for FederateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl fmt::Display for FederateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FederateName {
    fn from(v: &str) -> Self {
        Self::new(v)
    }
}

/// Composite sort key for the player list.
///
/// Local players (network 0) sort first, ascending by ID. Remote players
/// follow, grouped by federate name and then ascending by ID, with the
/// network ID as the final tie-break when two sessions report the same
/// federate.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PlayerKey {
    /// Owning network scope.
    pub network_id: NetworkId,
    /// Owning federate; `None` for local players.
    pub federate: Option<FederateName>,
    /// Player ID within the scope.
    pub id: PlayerId,
}

impl PlayerKey {
    /// Key of a local player.
    pub fn local(id: PlayerId) -> Self {
        Self {
            network_id: NetworkId::LOCAL,
            federate: None,
            id,
        }
    }

    /// Key of a remote player.
    pub fn remote(network_id: NetworkId, federate: FederateName, id: PlayerId) -> Self {
        Self {
            network_id,
            federate: Some(federate),
            id,
        }
    }

    /// Whether the key refers to a local player.
    pub fn is_local(&self) -> bool {
        self.network_id.is_local()
    }
}

impl Ord for PlayerKey {
    fn cmp(&self, other: &Self) -> Ordering {
        // `false < true`, so locals come first.
        (!self.is_local())
            .cmp(&!other.is_local())
            .then_with(|| self.federate.cmp(&other.federate))
            .then_with(|| self.id.cmp(&other.id))
            .then_with(|| self.network_id.cmp(&other.network_id))
    }
}

impl PartialOrd for PlayerKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PlayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.federate {
            Some(fed) => write!(f, "({fed},{})", self.id),
            None => write!(f, "{}", self.id),
        }
    }
}
