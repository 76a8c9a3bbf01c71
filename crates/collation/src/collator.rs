use std::cmp::Ordering;

use unicode_categories::UnicodeCategories;
use unicode_normalization::char::decompose_canonical;
use unicode_normalization::UnicodeNormalization;

use crate::error::CollationError;
use crate::locale::Locale;
use crate::tailoring::{root_expansion, root_weight, tailoring_for, Tailoring};

/// Width in bytes of one encoded primary weight.
pub const WEIGHT_LEN: usize = 4;

/// Width in bytes of the terminator appended to full keys.
pub const TERMINATOR_LEN: usize = 4;

/// Terminator appended to full keys. It sorts below every encoded weight, so a
/// value always collates before any longer value it prefixes.
pub const TERMINATOR: [u8; TERMINATOR_LEN] = [0; TERMINATOR_LEN];

/// Which flavour of sort key to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyMode {
    /// Weights followed by the terminator. Used for equality and ordering keys
    /// and for normalized attribute values.
    Full,
    /// Weights only. Used for substring fragments, which get concatenated.
    Fragment,
}

/// Primary-strength collator for one supported locale.
///
/// Keys ignore case and diacritics unless the locale's tailoring makes an
/// accented letter a letter of its own (Swedish `ö`, Spanish `ñ`, ...).
#[derive(Debug, Clone)]
pub struct Collator {
    locale: Locale,
    tailoring: &'static Tailoring,
}

impl Collator {
    /// Build a collator, failing with `UnsupportedLocale` when the locale is not
    /// in the supported-locale database.
    pub fn new(locale: &Locale) -> Result<Self, CollationError> {
        if !locale.is_supported() {
            return Err(CollationError::UnsupportedLocale(locale.to_string()));
        }
        Ok(Self {
            locale: locale.clone(),
            tailoring: tailoring_for(locale.language()),
        })
    }

    /// Convenience for `Collator::new(&Locale::from_tag(tag)?)`.
    pub fn for_tag(tag: &str) -> Result<Self, CollationError> {
        Self::new(&Locale::from_tag(tag)?)
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn encode(&self, value: &str, mode: KeyMode) -> Vec<u8> {
        let mut key = Vec::with_capacity((value.len() + 1) * WEIGHT_LEN);
        self.push_weights(value, &mut key);
        if mode == KeyMode::Full {
            key.extend_from_slice(&TERMINATOR);
        }
        key
    }

    pub fn full_key(&self, value: &str) -> Vec<u8> {
        self.encode(value, KeyMode::Full)
    }

    pub fn fragment_key(&self, value: &str) -> Vec<u8> {
        self.encode(value, KeyMode::Fragment)
    }

    /// Compare two values at primary strength.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.full_key(a).cmp(&self.full_key(b))
    }

    fn push_weights(&self, value: &str, out: &mut Vec<u8>) {
        let chars: Vec<char> = self.fold_case(value).nfc().collect();

        let mut idx = 0;
        while idx < chars.len() {
            if let Some((weight, consumed)) = self.tailoring.lookup(&chars[idx..]) {
                push_weight(out, weight);
                idx += consumed;
                continue;
            }

            let c = chars[idx];
            idx += 1;
            if let Some(expansion) = root_expansion(c) {
                for e in expansion.chars() {
                    push_weight(out, root_weight(e));
                }
                continue;
            }

            decompose_canonical(c, |d| {
                if !is_ignorable(d) {
                    push_weight(out, root_weight(d));
                }
            });
        }
    }

    fn fold_case(&self, value: &str) -> String {
        if !self.tailoring.turkic_casing() {
            return value.to_lowercase();
        }
        let mut folded = String::with_capacity(value.len());
        for c in value.chars() {
            match c {
                'I' => folded.push('ı'),
                'İ' => folded.push('i'),
                other => folded.extend(other.to_lowercase()),
            }
        }
        folded
    }
}

/// Non-spacing marks, controls and format characters carry no primary weight.
fn is_ignorable(c: char) -> bool {
    c.is_mark_nonspacing() || c.is_other_control() || c.is_other_format()
}

/// Encode a weight as four bytes: `1xxxxxxx 0xxxxxxx 0xxxxxxx 0xxxxxxx`.
///
/// Only the leading byte of a weight has the high bit set, so a byte-level
/// search for an encoded fragment can only match on weight boundaries.
fn push_weight(out: &mut Vec<u8>, weight: u32) {
    out.push(0x80 | ((weight >> 21) & 0x7f) as u8);
    out.push(((weight >> 14) & 0x7f) as u8);
    out.push(((weight >> 7) & 0x7f) as u8);
    out.push((weight & 0x7f) as u8);
}
