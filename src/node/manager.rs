//! Owner of the merged tree and its generations.

use std::sync::{Arc, PoisonError, RwLock};

use uuid::Uuid;

use crate::validated::Validated;

use super::{merge, ConfigNode};

struct ManagerState {
    /// Per-source fragments in source-list order; reloads replace in place.
    fragments: Vec<(Uuid, ConfigNode)>,
    /// The published, post-processed root of the current generation.
    root: Option<Arc<ConfigNode>>,
    generation: u64,
}

/// Owns the node tree across generations.
///
/// Readers snapshot the current root under a shared lock and then work
/// lock-free against the snapshot. Writers build the next generation
/// entirely off-line ([`stage`](Self::stage)) and swap it in with
/// [`publish`](Self::publish), so an in-flight read always completes
/// against exactly one generation.
pub struct ConfigNodeManager {
    state: RwLock<ManagerState>,
}

impl ConfigNodeManager {
    /// Manager with no fragments and no published generation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ManagerState {
                fragments: Vec::new(),
                root: None,
                generation: 0,
            }),
        }
    }

    /// Record (or, on reload, replace) the fragment contributed by
    /// `source_id`, preserving the original source order.
    pub fn set_fragment(&self, source_id: Uuid, fragment: ConfigNode) {
        let mut state = self.write();
        match state
            .fragments
            .iter_mut()
            .find(|(id, _)| *id == source_id)
        {
            Some((_, existing)) => *existing = fragment,
            None => state.fragments.push((source_id, fragment)),
        }
    }

    /// Whether `source_id` has contributed a fragment.
    #[must_use]
    pub fn has_fragment(&self, source_id: Uuid) -> bool {
        self.read().fragments.iter().any(|(id, _)| *id == source_id)
    }

    /// Merge every fragment in source order into a fresh root, off-line.
    ///
    /// The result is not visible to readers until [`publish`](Self::publish).
    #[must_use]
    pub fn stage(&self) -> Validated<ConfigNode> {
        let fragments: Vec<ConfigNode> = self
            .read()
            .fragments
            .iter()
            .map(|(_, node)| node.clone())
            .collect();

        let mut errors = Vec::new();
        let mut merged: Option<ConfigNode> = None;
        for fragment in fragments {
            merged = Some(match merged {
                None => fragment,
                Some(base) => {
                    let (value, fragment_errors) = merge(base, fragment, "").into_parts();
                    errors.extend(fragment_errors);
                    // merge always yields a node, keeping the override on
                    // conflict.
                    value.unwrap_or_else(|| ConfigNode::Map(super::MapNode::new()))
                }
            });
        }
        Validated::of(
            Some(merged.unwrap_or_else(|| ConfigNode::Map(super::MapNode::new()))),
            errors,
        )
    }

    /// Swap in a new root and bump the generation counter.
    pub fn publish(&self, root: ConfigNode) -> u64 {
        let mut state = self.write();
        state.root = Some(Arc::new(root));
        state.generation += 1;
        state.generation
    }

    /// The current root and generation id, if one has been published.
    ///
    /// Cloning the `Arc` under the shared lock gives the reader a
    /// consistent snapshot for the rest of its call.
    #[must_use]
    pub fn snapshot(&self) -> Option<(Arc<ConfigNode>, u64)> {
        let state = self.read();
        state.root.clone().map(|root| (root, state.generation))
    }

    /// The current generation id; zero before the first publish.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, ManagerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, ManagerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ConfigNodeManager {
    fn default() -> Self {
        Self::new()
    }
}
