//! # cipher-gst
//!
//! A generalized suffix tree over many byte-string keys, with plaintext
//! substring search and a privacy-preserving search mode over an encrypted
//! copy of the tree.
//!
//! Construction is Ukkonen's on-line algorithm ("On-line construction of
//! suffix trees", 1995) generalized to a growing collection of keys, each
//! tagged with a non-decreasing record index.
//!
//! The pipeline is:
//!
//! 1. [`SuffixTree::insert`] every key,
//! 2. [`SuffixTree::index_positions`] to attach `(sequence, offset)` markers,
//! 3. [`SuffixTree::encrypt`] to turn labels and markers into ciphertext,
//! 4. [`EncryptedSuffixTree::encrypted_search`], which delegates every label
//!    comparison to a [`ComparisonOracle`].
//!
//! ## Example
//!
//! ```rust
//! use cipher_gst::{LabelCipher, LocalOracle, SuffixTree, XorKeystream};
//!
//! let mut tree = SuffixTree::new();
//! tree.insert(b"ab", 1)?;
//! tree.index_positions(b"ab", 1)?;
//! tree.insert(b"ba", 2)?;
//! tree.index_positions(b"ba", 2)?;
//!
//! assert_eq!(tree.search(b"a", None), vec![1, 2]);
//! assert_eq!(tree.search(b"ab", None), vec![1]);
//! assert_eq!(tree.locate(b"b", 2), vec![1]);
//!
//! let cipher = XorKeystream::new(b"k3y!".to_vec())?;
//! let encrypted = tree.encrypt(&cipher)?;
//! let mut oracle = LocalOracle::new();
//! let hits = encrypted.encrypted_search(b"ab", 1, &cipher, &mut oracle)?;
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].matched_len, 2);
//! assert_eq!(cipher.apply(&hits[0].sequence)?, b"1");
//! # Ok::<(), cipher_gst::Error>(())
//! ```

pub mod arena;
pub mod cipher;
pub mod encrypted;
pub mod error;
pub mod marker;
pub mod oracle;
pub mod tree;

pub use arena::NodeId;
pub use cipher::{LabelCipher, XorKeystream};
pub use encrypted::{EncryptedMatch, EncryptedSuffixTree};
pub use error::{Error, Result};
pub use marker::PositionMarker;
pub use oracle::{ComparisonOracle, LocalOracle, OracleError};
pub use tree::{SearchResults, SuffixTree};

#[cfg(test)]
mod proptests;
