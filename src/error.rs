//! Error types for tree construction, encryption and search.

use thiserror::Error;

use crate::oracle::OracleError;

/// Result type for suffix tree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, encrypting or querying a tree.
#[derive(Debug, Error)]
pub enum Error {
    /// Record indices must be inserted in non-decreasing order.
    #[error("record index {index} is lower than the last accepted index {last}")]
    OutOfOrder {
        /// The rejected index.
        index: u32,
        /// The last index the tree accepted.
        last: u32,
    },

    /// A suffix of a key passed to the indexing pass is not in the tree.
    #[error("suffix at offset {offset} of sequence {sequence} is not indexed")]
    KeyNotIndexed {
        /// Sequence (record index) of the key.
        sequence: u32,
        /// 1-based offset of the missing suffix.
        offset: usize,
    },

    /// Key material is shorter than the data it has to cover.
    #[error("key too short: need {needed} symbols, have {available}")]
    KeyTooShort {
        /// Number of key symbols required.
        needed: usize,
        /// Number of key symbols supplied.
        available: usize,
    },

    /// The encryption key is empty.
    #[error("empty encryption key")]
    EmptyKey,

    /// The comparison oracle failed during a query.
    #[error("oracle unavailable: {0}")]
    Oracle(#[from] OracleError),

    /// The oracle claimed more matched symbols than the fragment holds.
    #[error("oracle reported {matched} matched symbols for a fragment of {fragment}")]
    InvalidOracleResponse {
        /// Matched length reported by the oracle.
        matched: usize,
        /// Length of the fragment sent.
        fragment: usize,
    },
}
