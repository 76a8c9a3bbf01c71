//! Locale-aware collation layer for directory matching rules.
//!
//! Turns attribute values and substring filter values into byte strings whose
//! unsigned lexicographic order is the locale's primary-strength collation
//! order. Everything index keys, query plans and `values_match` rely on is
//! produced here.
//!
//! ## What we do
//!
//! - Collation keys: case folding, NFC/NFD normalization, per-language
//!   tailoring, fixed-width weights, optional terminator
//! - Substring filters: wildcard/escape parsing into `(initial, any*, final)`
//! - Substring codec: length-prefixed assertion encoding, window keys for the
//!   substring index, and a bounds-checked byte matcher
//! - Locales: `"tag:oid"` specs, index names, the supported-locale database
//!
//! ## Pure function guarantee
//!
//! No I/O and no logging. Same value, same locale, same bytes on any machine.
//!
//! ## Invariants worth knowing
//!
//! - Full key = fragment key + 4-byte zero terminator
//! - Every weight is 4 bytes and only its first byte has the high bit set
//! - Encoded fragments are at most 255 bytes (one length byte)

mod assertion;
mod collator;
mod error;
mod locale;
mod substring;
mod tailoring;

pub use crate::assertion::SubstringAssertion;
pub use crate::collator::{Collator, KeyMode, TERMINATOR, TERMINATOR_LEN, WEIGHT_LEN};
pub use crate::error::CollationError;
pub use crate::locale::{supported_locales, Locale, LocaleSpec, SupportedLocales};
pub use crate::substring::{
    decode_assertion, encode_assertion, full_windows, substring_keys, values_match, window_keys,
    EncodedAssertion, MAX_FRAGMENT_LEN,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_to_match_end_to_end() {
        let collator = Collator::for_tag("de-DE").expect("de-DE supported");
        let assertion = SubstringAssertion::parse("stra*e").expect("substring filter");
        let encoded = encode_assertion(&assertion, &collator).expect("encodable");

        assert!(values_match(&collator.full_key("Straße"), &encoded));
        assert!(values_match(&collator.full_key("STRASSE"), &encoded));
        assert!(!values_match(&collator.full_key("Strand"), &encoded));
    }

    #[test]
    fn spec_drives_collator() {
        let spec: LocaleSpec = "es:1.3.6.1.4.1.42.2.27.9.4.49.1".parse().expect("valid spec");
        let locale = spec.locale().expect("supported");
        let collator = Collator::new(&locale).expect("collator");
        assert_eq!(locale.index_name(), "es");
        assert!(collator.full_key("nube") < collator.full_key("ñu"));
        assert!(collator.full_key("ñu") < collator.full_key("oso"));
    }
}
