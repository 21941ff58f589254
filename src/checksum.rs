#![deny(missing_docs)]

//! Checksum calculation routines.

use std::num::Wrapping;

/// Calculate a checksum of `data` according to the OpenType table checksum algorithm
///
/// Every 32-bit big-endian word in the data is summed and the result is
/// truncated to 32 bits. If the length of the data is not a multiple of four
/// the trailing bytes are treated as the high-order bytes of a final word
/// whose missing low-order bytes are zero.
///
/// https://docs.microsoft.com/en-us/typography/opentype/spec/otff#calculating-checksums
pub fn table_checksum(data: &[u8]) -> Wrapping<u32> {
    let mut sum = Wrapping(0);
    let mut words = data.chunks_exact(4);
    for word in words.by_ref() {
        sum += Wrapping(u32::from_be_bytes([word[0], word[1], word[2], word[3]]));
    }

    let tail = words.remainder();
    if !tail.is_empty() {
        let mut word = [0u8; 4];
        word[..tail.len()].copy_from_slice(tail);
        sum += Wrapping(u32::from_be_bytes(word));
    }

    sum
}
