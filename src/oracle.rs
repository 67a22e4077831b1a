//! The secure-comparison capability used by encrypted search.
//!
//! The tree never sees plaintext labels after encryption. Each edge visited
//! by an encrypted query costs one [`ComparisonOracle::compare_fragment`]
//! round-trip, which tells the walk how many leading symbols of the query
//! fragment equal the decrypted label.

use thiserror::Error;

/// Failure of a single oracle round-trip.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle disconnected: {0}")]
    Disconnected(String),

    #[error("oracle timed out")]
    Timeout,

    #[error("oracle protocol error: {0}")]
    Protocol(String),
}

/// Computes matched lengths between plaintext and ciphertext fragments.
///
/// Implementations may be arbitrarily expensive (e.g. a network round-trip to
/// a garbled-circuit evaluator) and must not be assumed to cache anything.
pub trait ComparisonOracle {
    /// Number of leading symbols of `plaintext` equal to the decryption of
    /// `ciphertext` under `key`. All three fragments have the same length.
    /// `is_final` is set when the fragment reaches the end of the query.
    fn compare_fragment(
        &mut self,
        plaintext: &[u8],
        ciphertext: &[u8],
        key: &[u8],
        is_final: bool,
    ) -> Result<usize, OracleError>;
}

impl<O: ComparisonOracle + ?Sized> ComparisonOracle for &mut O {
    fn compare_fragment(
        &mut self,
        plaintext: &[u8],
        ciphertext: &[u8],
        key: &[u8],
        is_final: bool,
    ) -> Result<usize, OracleError> {
        (**self).compare_fragment(plaintext, ciphertext, key, is_final)
    }
}

/// In-process stand-in that decrypts with XOR and compares directly.
///
/// Not secure: it exists so the tree walk can be exercised without the
/// secure-computation transport. Pairs with [`XorKeystream`](crate::XorKeystream).
#[derive(Debug, Default)]
pub struct LocalOracle {
    round_trips: usize,
}

impl LocalOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of comparisons performed so far.
    pub fn round_trips(&self) -> usize {
        self.round_trips
    }
}

impl ComparisonOracle for LocalOracle {
    fn compare_fragment(
        &mut self,
        plaintext: &[u8],
        ciphertext: &[u8],
        key: &[u8],
        _is_final: bool,
    ) -> Result<usize, OracleError> {
        self.round_trips += 1;
        if plaintext.len() != ciphertext.len() || key.len() != ciphertext.len() {
            return Err(OracleError::Protocol(format!(
                "fragment lengths differ: plaintext {}, ciphertext {}, key {}",
                plaintext.len(),
                ciphertext.len(),
                key.len()
            )));
        }
        Ok(plaintext
            .iter()
            .zip(ciphertext.iter().zip(key))
            .take_while(|(p, (c, k))| **p == **c ^ **k)
            .count())
    }
}
