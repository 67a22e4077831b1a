//! Online construction of the generalized suffix tree and plaintext queries.
//!
//! Construction follows Ukkonen's on-line algorithm, generalized so that any
//! number of keys can be added one after another. Unlike the single-string
//! algorithm, leaves are created with the whole remaining key as their label
//! (there is no open "end" pointer), and a phase may run into nodes that an
//! earlier key already created.
//!
//! A `(node, string)` reference pair names a position in the tree: the path
//! from `node` spelling `string`, which may end in the middle of an edge
//! (an implicit position).

use std::cell::Cell;

use tracing::debug;

use crate::arena::{Edge, NodeArena, NodeId};
use crate::cipher::LabelCipher;
use crate::encrypted::EncryptedSuffixTree;
use crate::error::{Error, Result};
use crate::marker::{encode_number, PositionMarker};

/// Result of [`SuffixTree::search_with_count`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchResults {
    /// Up to `limit` matching record indices, ascending.
    pub results: Vec<u32>,
    /// Number of distinct matching record indices.
    pub total: usize,
}

/// Outcome of a test-and-split step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    /// The extended string is already represented; the phase is over.
    EndpointFound(NodeId),
    /// The string must be extended from this (possibly freshly split) node.
    Extend(NodeId),
}

impl Outcome {
    #[inline]
    fn node(self) -> NodeId {
        match self {
            Outcome::EndpointFound(n) | Outcome::Extend(n) => n,
        }
    }
}

/// State shared by all phases of a single `insert`.
struct Construction {
    /// Most recently created or revisited leaf; its suffix link is wired to
    /// the next leaf of the same insertion.
    active_leaf: NodeId,
}

#[inline]
fn cut_last(s: &[u8]) -> &[u8] {
    &s[..s.len().saturating_sub(1)]
}

/// A generalized suffix tree over byte-string keys.
///
/// After `insert(key, i)`, `search(h)` contains `i` for every substring `h`
/// of `key`. Record indices must be inserted in non-decreasing order.
#[derive(Clone, Debug, Default)]
pub struct SuffixTree {
    arena: NodeArena,
    /// Last accepted record index.
    last: u32,
    counts_cached: Cell<bool>,
}

impl SuffixTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes, root included.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Adds `index` to the tree under `key`.
    ///
    /// Fails without touching the tree if `index` is lower than a previously
    /// inserted index.
    pub fn insert(&mut self, key: &[u8], index: u32) -> Result<()> {
        if index < self.last {
            return Err(Error::OutOfOrder {
                index,
                last: self.last,
            });
        }
        self.last = index;

        if self.counts_cached.replace(false) {
            self.arena.reset_counts();
        }

        let mut ctx = Construction {
            active_leaf: NodeId::ROOT,
        };
        let mut s = NodeId::ROOT;
        // Always a suffix of key[..i], so it can be re-sliced from `key`.
        let mut text: &[u8] = &[];
        for i in 0..key.len() {
            let part = &key[i - text.len()..=i];
            let (node, rest) = self.update(&mut ctx, s, part, &key[i..], index);
            let (node, rest) = self.arena.canonize(node, rest);
            s = node;
            text = rest;
        }

        let leaf = ctx.active_leaf;
        if leaf != NodeId::ROOT && leaf != s && self.arena[leaf].suffix.is_none() {
            self.arena[leaf].suffix = Some(s);
        }

        debug!(
            index,
            key_len = key.len(),
            nodes = self.arena.len(),
            "inserted key"
        );
        Ok(())
    }

    /// One phase of the construction: makes every suffix of `part` present
    /// in the tree, starting from the active point `(start, part[..n-1])`.
    /// `rest` is the key from the new symbol onwards and becomes the label of
    /// any new leaf. Returns the new active point.
    fn update<'k>(
        &mut self,
        ctx: &mut Construction,
        start: NodeId,
        part: &'k [u8],
        rest: &'k [u8],
        value: u32,
    ) -> (NodeId, &'k [u8]) {
        let mut s = start;
        let mut text = part;
        let symbol = *part.last().expect("phase needs the new symbol");

        let mut old_root = NodeId::ROOT;
        let mut outcome = self.test_and_split(s, cut_last(text), symbol, rest, value);

        while let Outcome::Extend(r) = outcome {
            // Earlier keys may already have built the continuation.
            let leaf = match self.arena[r].edge(symbol) {
                Some(e) => e.dest,
                None => {
                    let leaf = self.arena.alloc();
                    self.arena.add_ref(leaf, value);
                    self.arena[r].edges.insert(
                        symbol,
                        Edge {
                            label: rest.to_vec(),
                            dest: leaf,
                        },
                    );
                    leaf
                }
            };

            if ctx.active_leaf != NodeId::ROOT {
                self.arena[ctx.active_leaf].suffix = Some(leaf);
            }
            ctx.active_leaf = leaf;

            if old_root != NodeId::ROOT {
                self.arena[old_root].suffix = Some(r);
            }
            old_root = r;

            match self.arena[s].suffix {
                // Only the root has no link: drop the first symbol instead.
                None => text = text.get(1..).unwrap_or_default(),
                Some(link) => {
                    let (node, remainder) = self.arena.canonize(link, cut_last(text));
                    s = node;
                    text = &text[text.len() - remainder.len() - 1..];
                }
            }

            outcome = self.test_and_split(s, cut_last(text), symbol, rest, value);
        }

        if old_root != NodeId::ROOT {
            self.arena[old_root].suffix = Some(outcome.node());
        }
        (s, text)
    }

    /// Tests whether `part + symbol` is present below `input`, splitting an
    /// edge when `part` ends inside it and the next symbol differs.
    fn test_and_split(
        &mut self,
        input: NodeId,
        part: &[u8],
        symbol: u8,
        remainder: &[u8],
        value: u32,
    ) -> Outcome {
        let (s, partial) = self.arena.canonize(input, part);

        if let Some(&first) = partial.first() {
            let label = &self.arena[s]
                .edge(first)
                .expect("implicit position must lie on an edge")
                .label;
            if label.len() > partial.len() && label[partial.len()] == symbol {
                return Outcome::EndpointFound(s);
            }
            let mid = self.arena.split_edge(s, first, partial.len());
            return Outcome::Extend(mid);
        }

        let Some(edge) = self.arena[s].edge(symbol) else {
            return Outcome::Extend(s);
        };
        let dest = edge.dest;
        if remainder == edge.label.as_slice() {
            self.arena.add_ref(dest, value);
            Outcome::EndpointFound(s)
        } else if remainder.starts_with(&edge.label) {
            Outcome::EndpointFound(s)
        } else if edge.label.starts_with(remainder) {
            let mid = self.arena.split_edge(s, symbol, remainder.len());
            self.arena.add_ref(mid, value);
            Outcome::Extend(s)
        } else {
            // Different words sharing only a common substring.
            Outcome::EndpointFound(s)
        }
    }

    /// Attaches a position marker for every suffix of `key`, which must have
    /// been inserted with `sequence`. The suffix starting at `key[o]` gets
    /// offset `o + 1`.
    pub fn index_positions(&mut self, key: &[u8], sequence: u32) -> Result<()> {
        let mut targets = Vec::with_capacity(key.len());
        for offset in (1..=key.len()).rev() {
            let node = self
                .arena
                .find(&key[offset - 1..])
                .ok_or(Error::KeyNotIndexed { sequence, offset })?;
            targets.push((node, offset));
        }
        for (node, offset) in targets {
            self.arena[node]
                .markers
                .push(PositionMarker::new(sequence, offset));
        }
        debug!(sequence, suffixes = key.len(), "indexed positions");
        Ok(())
    }

    /// Records on every node the length of its incoming label.
    pub fn cache_label_lengths(&mut self) {
        for id in self.arena.subtree(NodeId::ROOT) {
            let lengths: Vec<(NodeId, usize)> = self.arena[id]
                .edges
                .values()
                .map(|e| (e.dest, e.label.len()))
                .collect();
            for (dest, len) in lengths {
                self.arena[dest].incoming_len = len;
            }
        }
    }

    /// Record indices of all keys containing `word`, at most `limit` of them.
    pub fn search(&self, word: &[u8], limit: Option<usize>) -> Vec<u32> {
        match self.arena.find(word) {
            Some(node) => self.arena.collect_indices(node, limit),
            None => Vec::new(),
        }
    }

    /// Like [`search`](Self::search), also reporting the total match count.
    pub fn search_with_count(&self, word: &[u8], limit: Option<usize>) -> SearchResults {
        let Some(node) = self.arena.find(word) else {
            return SearchResults {
                results: Vec::new(),
                total: 0,
            };
        };
        self.counts_cached.set(true);
        SearchResults {
            results: self.arena.collect_indices(node, limit),
            total: self.arena.cached_count(node),
        }
    }

    /// Number of distinct record indices in the tree. Fills every node's
    /// count cache.
    pub fn compute_count(&self) -> usize {
        self.counts_cached.set(true);
        self.arena.compute_counts()
    }

    /// Sequences containing `word` at 1-based `position`. Requires
    /// [`index_positions`](Self::index_positions) to have run.
    pub fn locate(&self, word: &[u8], position: usize) -> Vec<u32> {
        let Some(node) = self.arena.find(word) else {
            return Vec::new();
        };
        let wanted = encode_number(position);
        let mut out: Vec<u32> = self
            .arena
            .subtree(node)
            .into_iter()
            .flat_map(|id| self.arena[id].markers.iter())
            .filter(|m| m.offset == wanted)
            .filter_map(PositionMarker::decode_sequence)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Replaces every label and position marker with its ciphertext.
    ///
    /// Label lengths are cached first. The key must cover the longest label
    /// and marker component; this is checked before anything is transformed.
    pub fn encrypt<C: LabelCipher>(mut self, cipher: &C) -> Result<EncryptedSuffixTree> {
        self.cache_label_lengths();

        let mut needed = 0;
        for id in self.arena.subtree(NodeId::ROOT) {
            let node = &self.arena[id];
            for e in node.edges.values() {
                needed = needed.max(e.label.len());
            }
            for m in &node.markers {
                needed = needed.max(m.sequence.len()).max(m.offset.len());
            }
        }
        if needed > cipher.capacity() {
            return Err(Error::KeyTooShort {
                needed,
                available: cipher.capacity(),
            });
        }

        for node in self.arena.nodes_mut() {
            for e in node.edges.values_mut() {
                e.label = cipher.apply(&e.label)?;
            }
            for m in &mut node.markers {
                m.sequence = cipher.apply(&m.sequence)?;
                m.offset = cipher.apply(&m.offset)?;
            }
        }

        debug!(nodes = self.arena.len(), "encrypted tree");
        Ok(EncryptedSuffixTree::new(self.arena))
    }

    #[cfg(test)]
    pub(crate) fn arena(&self) -> &NodeArena {
        &self.arena
    }
}
