//! Substring assertion encoding, window keys and byte-level matching.
//!
//! Encoded assertion layout, every fragment in fragment-key form:
//!
//! ```text
//! [len(initial)] initial... [count(any)] ([len(any_i)] any_i...)* [len(final)] final...
//! ```
//!
//! An absent fragment is a zero length byte. Lengths are single bytes, so a
//! fragment's encoding may not exceed 255 bytes.

use std::collections::BTreeSet;

use crate::assertion::SubstringAssertion;
use crate::collator::{Collator, TERMINATOR_LEN};
use crate::error::CollationError;

/// Largest encoded fragment, and largest middle-fragment count, one byte can describe.
pub const MAX_FRAGMENT_LEN: usize = u8::MAX as usize;

/// Pack an assertion into its normalized byte form.
pub fn encode_assertion(
    assertion: &SubstringAssertion,
    collator: &Collator,
) -> Result<Vec<u8>, CollationError> {
    let mut out = Vec::new();
    write_fragment(&mut out, assertion.sub_initial(), collator)?;

    let count = assertion.sub_any().len();
    let count_byte = u8::try_from(count).map_err(|_| CollationError::TooManyFragments {
        count,
        max: MAX_FRAGMENT_LEN,
    })?;
    out.push(count_byte);
    for any in assertion.sub_any() {
        write_fragment(&mut out, Some(any), collator)?;
    }

    write_fragment(&mut out, assertion.sub_final(), collator)?;
    Ok(out)
}

fn write_fragment(
    out: &mut Vec<u8>,
    fragment: Option<&str>,
    collator: &Collator,
) -> Result<(), CollationError> {
    let Some(fragment) = fragment else {
        out.push(0);
        return Ok(());
    };
    let key = collator.fragment_key(fragment);
    let len = u8::try_from(key.len()).map_err(|_| CollationError::FragmentTooLong {
        length: key.len(),
        max: MAX_FRAGMENT_LEN,
    })?;
    out.push(len);
    out.extend_from_slice(&key);
    Ok(())
}

/// Fragments recovered from an encoded assertion, still in key form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedAssertion {
    pub sub_initial: Vec<u8>,
    pub sub_any: Vec<Vec<u8>>,
    pub sub_final: Vec<u8>,
}

/// Reference decoder for [`encode_assertion`]. `None` when lengths and bytes
/// disagree or bytes trail the final fragment.
pub fn decode_assertion(encoded: &[u8]) -> Option<EncodedAssertion> {
    let mut cursor = Cursor::new(encoded);
    let sub_initial = cursor.fragment()?.to_vec();
    let count = cursor.byte()?;
    let mut sub_any = Vec::with_capacity(count as usize);
    for _ in 0..count {
        sub_any.push(cursor.fragment()?.to_vec());
    }
    let sub_final = cursor.fragment()?.to_vec();
    if cursor.remaining() != 0 {
        return None;
    }
    Some(EncodedAssertion {
        sub_initial,
        sub_any,
        sub_final,
    })
}

/// Substring index keys for a value: its fragment key cut into overlapping
/// windows at every byte offset. Windows near the end shrink to the bytes that
/// remain, so a value shorter than `window` yields a key holding all of it.
pub fn substring_keys(collator: &Collator, value: &str, window: usize) -> BTreeSet<Vec<u8>> {
    window_keys(&collator.fragment_key(value), window)
}

/// Window decomposition of already-encoded bytes, see [`substring_keys`].
pub fn window_keys(encoded: &[u8], window: usize) -> BTreeSet<Vec<u8>> {
    let mut keys = BTreeSet::new();
    if window == 0 {
        return keys;
    }
    for start in 0..encoded.len() {
        let end = encoded.len().min(start + window);
        keys.insert(encoded[start..end].to_vec());
    }
    keys
}

/// Only the windows that span `window` whole bytes.
pub fn full_windows(encoded: &[u8], window: usize) -> BTreeSet<Vec<u8>> {
    if window == 0 {
        return BTreeSet::new();
    }
    encoded.windows(window).map(<[u8]>::to_vec).collect()
}

/// Match a full-key normalized attribute value against an encoded assertion.
///
/// Never panics and never errors: truncated or inconsistent input is simply a
/// non-match.
pub fn values_match(attribute: &[u8], assertion: &[u8]) -> bool {
    let Some(value_len) = attribute.len().checked_sub(TERMINATOR_LEN) else {
        return false;
    };
    let value = &attribute[..value_len];
    let mut cursor = Cursor::new(assertion);

    let Some(initial) = cursor.fragment() else {
        return false;
    };
    if !value.starts_with(initial) {
        return false;
    }
    let mut pos = initial.len();

    let Some(count) = cursor.byte() else {
        return false;
    };
    for _ in 0..count {
        let Some(fragment) = cursor.fragment() else {
            return false;
        };
        match find(&value[pos..], fragment) {
            Some(offset) => pos += offset + fragment.len(),
            None => return false,
        }
    }

    let Some(final_len) = cursor.byte() else {
        return false;
    };
    let final_len = final_len as usize;
    // The final fragment must be exactly what is left of the assertion.
    if final_len != cursor.remaining() {
        return false;
    }
    let Some(fin) = cursor.take(final_len) else {
        return false;
    };
    value.len() - pos >= final_len && value.ends_with(fin)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn byte(&mut self) -> Option<u8> {
        let b = *self.bytes.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let slice = self.bytes.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    fn fragment(&mut self) -> Option<&'a [u8]> {
        let len = self.byte()? as usize;
        self.take(len)
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}
