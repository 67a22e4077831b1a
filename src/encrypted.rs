//! Substring search over a tree whose labels and markers are ciphertext.
//!
//! The walk follows the same edges a plaintext search would (edges stay keyed
//! by their first plaintext symbol), but equality of a query fragment and a
//! label is decided by a [`ComparisonOracle`]. Matching is partial: the walk
//! reports how many leading query symbols it could match, and the node whose
//! subtree holds every suffix beginning with that matched prefix.

use std::fmt;

use tracing::{debug, trace};

use crate::arena::{NodeArena, NodeId};
use crate::cipher::LabelCipher;
use crate::error::{Error, Result};
use crate::marker::{encode_number, FIELD_SEPARATOR};
use crate::oracle::ComparisonOracle;

/// One hit of an encrypted location query.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EncryptedMatch {
    /// Ciphertext of the decimal sequence id; the caller decrypts it.
    pub sequence: Vec<u8>,
    /// Number of leading query symbols matched; the caller recovers the
    /// matched substring as `query[..matched_len]`.
    pub matched_len: usize,
}

/// Renders as `<hex sequence>;<matched_len>`.
impl fmt::Display for EncryptedMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.sequence {
            write!(f, "{b:02x}")?;
        }
        write!(f, "{FIELD_SEPARATOR}{}", self.matched_len)
    }
}

/// A suffix tree after [`SuffixTree::encrypt`](crate::SuffixTree::encrypt).
#[derive(Clone, Debug)]
pub struct EncryptedSuffixTree {
    arena: NodeArena,
}

impl EncryptedSuffixTree {
    pub(crate) fn new(arena: NodeArena) -> Self {
        Self { arena }
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Walks from the root matching `query` one edge per oracle round-trip.
    ///
    /// Returns the node reached and the matched length, or `None` when not
    /// even the first symbol matched. A partial match inside an edge stops
    /// the walk at that edge's destination.
    pub fn encrypted_search_node<C, O>(
        &self,
        query: &[u8],
        cipher: &C,
        oracle: &mut O,
    ) -> Result<Option<(NodeId, usize)>>
    where
        C: LabelCipher + ?Sized,
        O: ComparisonOracle + ?Sized,
    {
        let mut node = NodeId::ROOT;
        let mut matched = 0usize;
        let mut i = 0usize;

        while i < query.len() {
            let Some(edge) = self.arena[node].edge(query[i]) else {
                return Ok((matched > 0).then_some((node, matched)));
            };

            let remaining = query.len() - i;
            let label_len = self.arena[edge.dest].incoming_len;
            debug_assert_eq!(label_len, edge.label.len());
            let len = label_len.min(remaining);

            let fragment = &query[i..i + len];
            let ciphertext = &edge.label[..len];
            let key = cipher.key_fragment(len)?;
            let is_final = i + len == query.len();

            let m = oracle.compare_fragment(fragment, ciphertext, key, is_final)?;
            trace!(offset = i, fragment = len, matched = m, "oracle round-trip");
            if m > len {
                return Err(Error::InvalidOracleResponse {
                    matched: m,
                    fragment: len,
                });
            }

            if m < len {
                if m > 0 {
                    return Ok(Some((edge.dest, matched + m)));
                }
                return Ok((matched > 0).then_some((node, matched)));
            }

            matched += m;
            if label_len >= remaining {
                return Ok(Some((edge.dest, matched)));
            }
            node = edge.dest;
            i += len;
        }

        Ok(None)
    }

    /// Sequences containing the longest matchable prefix of `query` at
    /// 1-based `position`, each paired with the matched length.
    ///
    /// Position markers are compared as ciphertext: `position` is encrypted
    /// with `cipher` the same way the markers were.
    pub fn encrypted_search<C, O>(
        &self,
        query: &[u8],
        position: usize,
        cipher: &C,
        oracle: &mut O,
    ) -> Result<Vec<EncryptedMatch>>
    where
        C: LabelCipher + ?Sized,
        O: ComparisonOracle + ?Sized,
    {
        let Some((node, matched)) = self.encrypted_search_node(query, cipher, oracle)? else {
            return Ok(Vec::new());
        };
        let wanted = cipher.apply(&encode_number(position))?;
        let mut out = Vec::new();
        self.collect_suffix_positions(node, &wanted, matched, &mut out);
        debug!(
            query_len = query.len(),
            matched,
            hits = out.len(),
            "encrypted search"
        );
        Ok(out)
    }

    /// Appends a match for every marker in the subtree of `from` whose
    /// encrypted offset equals `offset`.
    fn collect_suffix_positions(
        &self,
        from: NodeId,
        offset: &[u8],
        matched: usize,
        out: &mut Vec<EncryptedMatch>,
    ) {
        for id in self.arena.subtree(from) {
            for marker in &self.arena[id].markers {
                if marker.offset == offset {
                    out.push(EncryptedMatch {
                        sequence: marker.sequence.clone(),
                        matched_len: matched,
                    });
                }
            }
        }
    }
}
