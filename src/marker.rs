//! Position markers: which sequence a suffix belongs to and where it starts.
//!
//! Both components are stored as ASCII decimal digits so that a marker can be
//! transformed in place into ciphertext of the same length, one component at
//! a time.

// =============================================================================
// Configuration
// =============================================================================

pub const MARKER_RADIX: u32 = 10; // Digit base of both marker components
pub const FIELD_SEPARATOR: char = ';'; // Between sequence and length in rendered matches

// =============================================================================
// Markers
// =============================================================================

/// A `(sequence, offset)` pair attached to the node a suffix ends at.
///
/// `offset` is the 1-based start of the suffix within its sequence: the whole
/// key has offset 1, its last symbol has offset `len`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PositionMarker {
    pub sequence: Vec<u8>,
    pub offset: Vec<u8>,
}

impl PositionMarker {
    pub fn new(sequence: u32, offset: usize) -> Self {
        Self {
            sequence: encode_number(sequence as usize),
            offset: encode_number(offset),
        }
    }

    /// Plaintext sequence id, if the marker has not been encrypted.
    pub fn decode_sequence(&self) -> Option<u32> {
        decode_number(&self.sequence)
    }

    pub fn decode_offset(&self) -> Option<usize> {
        decode_number(&self.offset)
    }
}

/// ASCII digits of `n` in [`MARKER_RADIX`], most significant first.
pub fn encode_number(mut n: usize) -> Vec<u8> {
    let radix = MARKER_RADIX as usize;
    let mut out = Vec::new();
    loop {
        let digit = char::from_digit((n % radix) as u32, MARKER_RADIX).expect("digit below radix");
        out.push(digit as u8);
        n /= radix;
        if n == 0 {
            break;
        }
    }
    out.reverse();
    out
}

/// Inverse of [`encode_number`]. `None` for anything but plain digits.
pub fn decode_number<T: TryFrom<u64>>(digits: &[u8]) -> Option<T> {
    if digits.is_empty() || !digits.iter().all(|&b| (b as char).is_digit(MARKER_RADIX)) {
        return None;
    }
    let text = std::str::from_utf8(digits).ok()?;
    u64::from_str_radix(text, MARKER_RADIX).ok()?.try_into().ok()
}
