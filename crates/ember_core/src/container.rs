//! Ordered child containers
//!
//! Children live in a slot map and are addressed by generational `NodeId`s,
//! so a stale id can never reach a slot that has since been reused. A
//! separate order list keeps traversal in insertion order, which is the
//! order the host drives updates and draws in.

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle to a child of a `Container`
    pub struct NodeId;
}

/// Ordered collection of owned children
#[derive(Clone, Debug)]
pub struct Container<T> {
    nodes: SlotMap<NodeId, T>,
    order: Vec<NodeId>,
}

impl<T> Default for Container<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Container<T> {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    /// Append a child at the end of the traversal order
    pub fn add_child(&mut self, child: T) -> NodeId {
        let id = self.nodes.insert(child);
        self.order.push(id);
        id
    }

    /// Detach a child, handing ownership back to the caller
    ///
    /// Returns `None` if the id is stale or was never part of this container.
    pub fn remove_child(&mut self, id: NodeId) -> Option<T> {
        let child = self.nodes.remove(id)?;
        if let Some(index) = self.order.iter().position(|&o| o == id) {
            self.order.remove(index);
        }
        Some(child)
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Children in traversal order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &T)> + '_ {
        self.order
            .iter()
            .filter_map(move |&id| self.nodes.get(id).map(|child| (id, child)))
    }

    /// Visit every child in order, detaching those for which `keep` returns
    /// false and passing them to `on_removed`
    ///
    /// Runs in a single pass without allocating, so it is safe to call once
    /// per frame.
    pub fn retain_children<F, R>(&mut self, mut keep: F, mut on_removed: R)
    where
        F: FnMut(NodeId, &mut T) -> bool,
        R: FnMut(NodeId, T),
    {
        let Self { nodes, order } = self;
        order.retain(|&id| {
            let Some(child) = nodes.get_mut(id) else {
                return false;
            };
            if keep(id, child) {
                return true;
            }
            if let Some(child) = nodes.remove(id) {
                on_removed(id, child);
            }
            false
        });
    }

    /// Detach every child, last to first
    pub fn drain_children<R>(&mut self, mut on_removed: R)
    where
        R: FnMut(NodeId, T),
    {
        while let Some(id) = self.order.pop() {
            if let Some(child) = self.nodes.remove(id) {
                on_removed(id, child);
            }
        }
        self.nodes.clear();
    }
}
