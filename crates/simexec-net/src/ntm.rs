//! Entity-type mapping between network codes and template players.
//!
//! Input mapping walks a seven-level tree keyed by entity-type level. A
//! zero key at any level is a wildcard that matches any incoming value
//! not mapped explicitly; the deepest template reached wins. Output
//! mapping resolves a player's type name, falling back to a per-kind
//! default.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use simexec_core::{Player, PlayerKind};

use crate::entity_type::EntityType;

#[derive(Default)]
struct Node {
    template: Option<Arc<Player>>,
    children: IndexMap<u16, Node>,
}

impl Node {
    fn depth(&self) -> usize {
        1 + self.children.values().map(Node::depth).max().unwrap_or(0)
    }
}

/// Bidirectional entity-type mapper.
#[derive(Default)]
pub struct NtmTree {
    root: Node,
    inputs: usize,
    by_type_name: IndexMap<Arc<str>, EntityType>,
    by_kind: HashMap<PlayerKind, EntityType>,
}

impl NtmTree {
    /// Empty mapper.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Input ──────────────────────────────────────────────────────

    /// Map an incoming entity type (zeros are wildcards) to a template.
    /// Trailing zero levels are not stored, so `1.2.225` and
    /// `1.2.225.0.0.0.0` are the same key. A later mapping for the same
    /// key replaces the earlier one.
    pub fn add_input(&mut self, et: EntityType, template: Arc<Player>) {
        let levels = et.levels();
        let len = levels.iter().rposition(|&l| l != 0).map_or(0, |i| i + 1);
        let mut node = &mut self.root;
        for level in &levels[..len] {
            node = node.children.entry(*level).or_default();
        }
        if node.template.replace(template).is_none() {
            self.inputs += 1;
        }
    }

    /// Find the template for an incoming entity type.
    pub fn find_template(&self, et: &EntityType) -> Option<&Arc<Player>> {
        let mut node = &self.root;
        let mut best = node.template.as_ref();
        for level in et.levels() {
            let next = node
                .children
                .get(&level)
                .or_else(|| node.children.get(&0));
            match next {
                Some(n) => {
                    node = n;
                    if n.template.is_some() {
                        best = n.template.as_ref();
                    }
                }
                None => break,
            }
        }
        best
    }

    /// Number of input mappings.
    pub fn input_count(&self) -> usize {
        self.inputs
    }

    /// Depth of the input tree (the root counts as one level).
    pub fn input_depth(&self) -> usize {
        self.root.depth()
    }

    // ── Output ─────────────────────────────────────────────────────

    /// Map a player type name to an outgoing entity type.
    pub fn add_output(&mut self, type_name: impl AsRef<str>, et: EntityType) {
        self.by_type_name.insert(Arc::from(type_name.as_ref()), et);
    }

    /// Default outgoing entity type for a player kind.
    pub fn add_kind_default(&mut self, kind: PlayerKind, et: EntityType) {
        self.by_kind.insert(kind, et);
    }

    /// Outgoing entity type for `player`: its type name first, then its
    /// kind default.
    pub fn find_output(&self, player: &Player) -> Option<EntityType> {
        self.by_type_name
            .get(player.type_name())
            .or_else(|| self.by_kind.get(&player.kind()))
            .copied()
    }

    /// Number of type-name output mappings.
    pub fn output_count(&self) -> usize {
        self.by_type_name.len()
    }
}

impl std::fmt::Debug for NtmTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NtmTree")
            .field("inputs", &self.inputs)
            .field("outputs", &self.by_type_name.len())
            .field("kind_defaults", &self.by_kind.len())
            .finish()
    }
}
