//! Label transforms applied by [`SuffixTree::encrypt`](crate::SuffixTree::encrypt).
//!
//! The default transform XORs each symbol with the key symbol at the same
//! position. Key material is never cycled: data of length `n` uses
//! `key[0..n]`, and a key shorter than `n` is an error.

use crate::error::{Error, Result};

/// A length-preserving, deterministic transform of labels and markers.
pub trait LabelCipher {
    /// Transforms `data`. The output has the same length as the input.
    fn apply(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Key symbols available; data longer than this cannot be transformed.
    fn capacity(&self) -> usize;

    /// The key prefix covering `len` symbols, as handed to the oracle.
    fn key_fragment(&self, len: usize) -> Result<&[u8]>;
}

/// Symbol-wise XOR against a key prefix.
#[derive(Clone)]
pub struct XorKeystream {
    key: Vec<u8>,
}

impl XorKeystream {
    pub fn new(key: impl Into<Vec<u8>>) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::EmptyKey);
        }
        Ok(Self { key })
    }
}

// Never print key material.
impl std::fmt::Debug for XorKeystream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XorKeystream")
            .field("len", &self.key.len())
            .finish()
    }
}

impl LabelCipher for XorKeystream {
    fn apply(&self, data: &[u8]) -> Result<Vec<u8>> {
        let key = self.key_fragment(data.len())?;
        Ok(data.iter().zip(key).map(|(d, k)| d ^ k).collect())
    }

    fn capacity(&self) -> usize {
        self.key.len()
    }

    fn key_fragment(&self, len: usize) -> Result<&[u8]> {
        self.key.get(..len).ok_or(Error::KeyTooShort {
            needed: len,
            available: self.key.len(),
        })
    }
}
