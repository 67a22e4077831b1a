//! Node arena and tree primitives.
//!
//! Nodes live in a single table and refer to each other through 32-bit
//! [`NodeId`] handles. Ownership runs strictly parent -> child through
//! [`Edge`]s; suffix links are plain handles and never own anything.

use std::cell::OnceCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::marker::PositionMarker;

/// A 32-bit handle to a node in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// The root node, allocated by [`NodeArena::new`].
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    fn new(idx: usize) -> Self {
        debug_assert!(idx < u32::MAX as usize);
        NodeId(idx as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Labelled link from a parent to the child it owns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    /// Non-empty label. Ciphertext of the same length once encrypted.
    pub label: Vec<u8>,
    pub dest: NodeId,
}

#[derive(Clone, Debug, Default)]
pub struct Node {
    /// Outgoing edges keyed by the first (plaintext) symbol of their label.
    pub edges: BTreeMap<u8, Edge>,
    /// Suffix link. Only meaningful while a key is being inserted.
    pub suffix: Option<NodeId>,
    /// Record indices, ascending (insertion order is non-decreasing).
    pub indices: Vec<u32>,
    pub markers: Vec<PositionMarker>,
    /// Length of the label on the incoming edge; 0 for the root.
    pub incoming_len: usize,
    /// Distinct record indices in this subtree, filled on first request.
    pub count: OnceCell<usize>,
}

impl Node {
    #[inline]
    pub fn contains(&self, index: u32) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    #[inline]
    pub fn edge(&self, symbol: u8) -> Option<&Edge> {
        self.edges.get(&symbol)
    }
}

/// Table of all nodes of one tree.
#[derive(Clone, Debug)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Index<NodeId> for NodeArena {
    type Output = Node;

    #[inline]
    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

impl std::ops::IndexMut<NodeId> for NodeArena {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }
}

impl NodeArena {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        // The root is always present.
        false
    }

    pub fn alloc(&mut self) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node::default());
        id
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.iter_mut()
    }

    /// Attaches `index` to `node`, then walks the suffix-link chain attaching
    /// it to every node until one already holds it.
    pub fn add_ref(&mut self, node: NodeId, index: u32) {
        let mut cur = Some(node);
        while let Some(id) = cur {
            let n = &mut self[id];
            if n.contains(index) {
                break;
            }
            n.indices.push(index);
            cur = n.suffix;
        }
    }

    /// Cuts the edge of `parent` starting with `first` after `at` symbols and
    /// installs a fresh node at the cut. The original destination, its suffix
    /// link and its metadata are untouched. Returns the new node.
    pub fn split_edge(&mut self, parent: NodeId, first: u8, at: usize) -> NodeId {
        let mid = self.alloc();
        let edge = self[parent]
            .edges
            .get_mut(&first)
            .expect("edge to split must exist");
        debug_assert!(at > 0 && at < edge.label.len());
        let tail = edge.label.split_off(at);
        let lower = Edge {
            label: tail,
            dest: edge.dest,
        };
        edge.dest = mid;
        let tail_first = lower.label[0];
        self[mid].edges.insert(tail_first, lower);
        mid
    }

    /// Descends from `start` along edges whose full label is a prefix of the
    /// remaining input. Returns the deepest node reached and the unmatched
    /// remainder, which is always a suffix of `input`.
    pub fn canonize<'k>(&self, start: NodeId, input: &'k [u8]) -> (NodeId, &'k [u8]) {
        let mut node = start;
        let mut rest = input;
        while let Some(&first) = rest.first() {
            match self[node].edge(first) {
                Some(e) if rest.starts_with(&e.label) => {
                    rest = &rest[e.label.len()..];
                    node = e.dest;
                }
                _ => break,
            }
        }
        (node, rest)
    }

    /// Finds the node whose root path spells a superstring of `word`, where
    /// `word` ends within (or at the end of) the edge leading into it.
    pub fn find(&self, word: &[u8]) -> Option<NodeId> {
        let mut node = NodeId::ROOT;
        let mut i = 0;
        while i < word.len() {
            let edge = self[node].edge(word[i])?;
            let rest = &word[i..];
            let n = rest.len().min(edge.label.len());
            if rest[..n] != edge.label[..n] {
                return None;
            }
            if edge.label.len() >= rest.len() {
                return Some(edge.dest);
            }
            node = edge.dest;
            i += n;
        }
        None
    }

    /// Pre-order list of `from` and all its descendants.
    pub fn subtree(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            out.push(id);
            // Reverse so children come out in ascending symbol order.
            stack.extend(self[id].edges.values().rev().map(|e| e.dest));
        }
        out
    }

    /// Distinct record indices in the subtree of `from`, ascending. Stops
    /// collecting once `limit` indices are found.
    pub fn collect_indices(&self, from: NodeId, limit: Option<usize>) -> Vec<u32> {
        let mut found = BTreeSet::new();
        if limit == Some(0) {
            return Vec::new();
        }
        'walk: for id in self.subtree(from) {
            for &idx in &self[id].indices {
                found.insert(idx);
                if Some(found.len()) == limit {
                    break 'walk;
                }
            }
        }
        found.into_iter().collect()
    }

    /// Number of distinct record indices below `from`, memoized per node.
    pub fn cached_count(&self, from: NodeId) -> usize {
        *self[from]
            .count
            .get_or_init(|| self.collect_indices(from, None).len())
    }

    /// Fills the count cache of every node and returns the root's count.
    pub fn compute_counts(&self) -> usize {
        let order = self.subtree(NodeId::ROOT);
        let mut sets: HashMap<NodeId, BTreeSet<u32>> = HashMap::new();
        // Children precede parents in reverse pre-order.
        for &id in order.iter().rev() {
            let node = &self[id];
            let mut set: BTreeSet<u32> = node.indices.iter().copied().collect();
            for edge in node.edges.values() {
                if let Some(child) = sets.remove(&edge.dest) {
                    set.extend(child);
                }
            }
            let _ = node.count.set(set.len());
            sets.insert(id, set);
        }
        self.cached_count(NodeId::ROOT)
    }

    /// Drops every memoized count.
    pub fn reset_counts(&mut self) {
        for node in &mut self.nodes {
            node.count.take();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(arena: &mut NodeArena, label: &[u8]) -> NodeId {
        let leaf = arena.alloc();
        arena[NodeId::ROOT].edges.insert(
            label[0],
            Edge {
                label: label.to_vec(),
                dest: leaf,
            },
        );
        leaf
    }

    #[test]
    fn test_split_edge_keeps_destination() {
        let mut a = NodeArena::new();
        let leaf = chain(&mut a, b"abcd");
        a[leaf].indices.push(7);

        let mid = a.split_edge(NodeId::ROOT, b'a', 2);
        let top = a[NodeId::ROOT].edge(b'a').unwrap();
        assert_eq!(top.label, b"ab");
        assert_eq!(top.dest, mid);
        let low = a[mid].edge(b'c').unwrap();
        assert_eq!(low.label, b"cd");
        assert_eq!(low.dest, leaf);
        assert_eq!(a[leaf].indices, vec![7]);
    }

    #[test]
    fn test_canonize_stops_mid_edge() {
        let mut a = NodeArena::new();
        let leaf = chain(&mut a, b"ab");
        a[leaf].edges.insert(
            b'c',
            Edge {
                label: b"cde".to_vec(),
                dest: NodeId::ROOT,
            },
        );
        assert_eq!(a.canonize(NodeId::ROOT, b"abcd"), (leaf, &b"cd"[..]));
        assert_eq!(a.canonize(NodeId::ROOT, b"ab"), (leaf, &b""[..]));
        assert_eq!(a.canonize(NodeId::ROOT, b"a"), (NodeId::ROOT, &b"a"[..]));
    }

    #[test]
    fn test_add_ref_follows_suffix_chain() {
        let mut a = NodeArena::new();
        let x = a.alloc();
        let y = a.alloc();
        let z = a.alloc();
        a[x].suffix = Some(y);
        a[y].suffix = Some(z);
        a[z].indices.push(3);

        a.add_ref(x, 3);
        assert_eq!(a[x].indices, vec![3]);
        assert_eq!(a[y].indices, vec![3]);
        assert_eq!(a[z].indices, vec![3]);

        // A cycle terminates once every node holds the index.
        a[z].suffix = Some(x);
        a.add_ref(x, 4);
        assert!(a[x].contains(4) && a[y].contains(4) && a[z].contains(4));
    }

    #[test]
    fn test_counts_are_distinct() {
        let mut a = NodeArena::new();
        let leaf = chain(&mut a, b"ab");
        a[NodeId::ROOT].indices.push(1);
        a[leaf].indices.extend([1, 2]);
        assert_eq!(a.collect_indices(NodeId::ROOT, None), vec![1, 2]);
        assert_eq!(a.collect_indices(NodeId::ROOT, Some(1)), vec![1]);
        assert_eq!(a.compute_counts(), 2);
        assert_eq!(a.cached_count(leaf), 2);
        a.reset_counts();
        assert!(a[leaf].count.get().is_none());
    }
}
