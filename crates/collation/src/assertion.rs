//! Substring assertion parsing.
//!
//! A substring filter value such as `ab*c\2ad*ef` is split at its unescaped
//! `*` markers into an initial fragment, ordered middle fragments and a final
//! fragment. `\HH` escapes decode to the byte `0xHH`.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::CollationError;

/// The `(initial, any*, final)` decomposition of a substring filter value.
///
/// Middle fragments keep filter order: they must occur left to right,
/// without overlapping, for a value to match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstringAssertion {
    sub_initial: Option<String>,
    sub_any: Vec<String>,
    sub_final: Option<String>,
}

impl SubstringAssertion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial(mut self, initial: impl Into<String>) -> Self {
        self.sub_initial = Some(initial.into());
        self
    }

    pub fn with_any(mut self, fragment: impl Into<String>) -> Self {
        self.sub_any.push(fragment.into());
        self
    }

    pub fn with_final(mut self, fin: impl Into<String>) -> Self {
        self.sub_final = Some(fin.into());
        self
    }

    /// Parse a raw filter value. Fails with `NotASubstringFilter` when it has no
    /// `*`, and with `InvalidEscape` when a `\` is not followed by two hex digits.
    pub fn parse(filter: &str) -> Result<Self, CollationError> {
        let scan = WildcardScan::run(filter);
        let (first, last) = match (scan.wildcards.first(), scan.wildcards.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return Err(CollationError::NotASubstringFilter(filter.to_owned())),
        };

        let sub_initial = if first > 0 {
            Some(scan.fragment(filter, 0..first)?)
        } else {
            None
        };

        let mut sub_any = Vec::with_capacity(scan.wildcards.len().saturating_sub(1));
        for pair in scan.wildcards.windows(2) {
            sub_any.push(scan.fragment(filter, pair[0] + 1..pair[1])?);
        }

        let sub_final = if last + 1 < filter.len() {
            Some(scan.fragment(filter, last + 1..filter.len())?)
        } else {
            None
        };

        Ok(Self {
            sub_initial,
            sub_any,
            sub_final,
        })
    }

    pub fn sub_initial(&self) -> Option<&str> {
        self.sub_initial.as_deref()
    }

    pub fn sub_any(&self) -> &[String] {
        &self.sub_any
    }

    pub fn sub_final(&self) -> Option<&str> {
        self.sub_final.as_deref()
    }

    /// True when no fragment carries any text, as in `*` or `**`.
    pub fn is_wildcard_only(&self) -> bool {
        self.sub_initial.as_deref().is_none_or(str::is_empty)
            && self.sub_any.iter().all(String::is_empty)
            && self.sub_final.as_deref().is_none_or(str::is_empty)
    }

    /// Render back into filter syntax, escaping `*`, `\`, `(`, `)` and NUL.
    pub fn to_filter_string(&self) -> String {
        let mut out = String::new();
        if let Some(initial) = &self.sub_initial {
            escape_into(&mut out, initial);
        }
        out.push('*');
        for any in &self.sub_any {
            escape_into(&mut out, any);
            out.push('*');
        }
        if let Some(fin) = &self.sub_final {
            escape_into(&mut out, fin);
        }
        out
    }
}

fn escape_into(out: &mut String, fragment: &str) {
    for c in fragment.chars() {
        match c {
            '*' | '\\' | '(' | ')' | '\0' => out.push_str(&format!("\\{:02x}", c as u32)),
            other => out.push(other),
        }
    }
}

/// Result of one pass over the raw filter: wildcard byte offsets and whether
/// any escape needs decoding.
struct WildcardScan {
    wildcards: Vec<usize>,
    has_escapes: bool,
}

impl WildcardScan {
    fn run(filter: &str) -> Self {
        let bytes = filter.as_bytes();
        let mut wildcards = Vec::new();
        let mut has_escapes = false;
        let mut idx = 0;
        while idx < bytes.len() {
            match bytes[idx] {
                b'*' => wildcards.push(idx),
                b'\\' => {
                    has_escapes = true;
                    // Hex digits of the escape can never be wildcards.
                    let digits = bytes[idx + 1..]
                        .iter()
                        .take(2)
                        .take_while(|b| b.is_ascii_hexdigit())
                        .count();
                    idx += digits;
                }
                _ => {}
            }
            idx += 1;
        }
        Self {
            wildcards,
            has_escapes,
        }
    }

    fn fragment(&self, filter: &str, range: Range<usize>) -> Result<String, CollationError> {
        if !self.has_escapes {
            return Ok(filter[range].to_owned());
        }
        decode_escapes(&filter.as_bytes()[range.clone()], range.start)
    }
}

/// Expand `\HH` escapes. Decoded bytes are read as UTF-8, or as Latin-1 when
/// they do not form valid UTF-8.
fn decode_escapes(raw: &[u8], offset: usize) -> Result<String, CollationError> {
    let mut decoded = Vec::with_capacity(raw.len());
    let mut idx = 0;
    while idx < raw.len() {
        if raw[idx] != b'\\' {
            decoded.push(raw[idx]);
            idx += 1;
            continue;
        }
        let hi = raw.get(idx + 1).and_then(|b| hex_value(*b));
        let lo = raw.get(idx + 2).and_then(|b| hex_value(*b));
        match (hi, lo) {
            (Some(hi), Some(lo)) => {
                decoded.push(hi << 4 | lo);
                idx += 3;
            }
            _ => {
                return Err(CollationError::InvalidEscape {
                    position: offset + idx,
                })
            }
        }
    }

    Ok(match String::from_utf8(decoded) {
        Ok(text) => text,
        Err(err) => err.into_bytes().into_iter().map(char::from).collect(),
    })
}

fn hex_value(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_initial_middle_final() {
        let a = SubstringAssertion::parse("ab*cd*ef").unwrap();
        assert_eq!(a.sub_initial(), Some("ab"));
        assert_eq!(a.sub_any(), ["cd".to_string()]);
        assert_eq!(a.sub_final(), Some("ef"));
    }

    #[test]
    fn leading_and_trailing_wildcards_drop_ends() {
        let a = SubstringAssertion::parse("*x*y*").unwrap();
        assert_eq!(a.sub_initial(), None);
        assert_eq!(a.sub_any(), ["x".to_string(), "y".to_string()]);
        assert_eq!(a.sub_final(), None);
    }

    #[test]
    fn middle_order_preserved() {
        let a = SubstringAssertion::parse("*c*a*b*").unwrap();
        assert_eq!(a.sub_any(), ["c", "a", "b"]);
    }

    #[test]
    fn missing_wildcard_rejected() {
        assert_eq!(
            SubstringAssertion::parse("plain"),
            Err(CollationError::NotASubstringFilter("plain".into()))
        );
    }

    #[test]
    fn escaped_star_is_literal() {
        let a = SubstringAssertion::parse(r"a\2ab*c").unwrap();
        assert_eq!(a.sub_initial(), Some("a*b"));
        assert_eq!(a.sub_final(), Some("c"));
    }

    #[test]
    fn escaped_utf8_bytes_decode_to_characters() {
        let a = SubstringAssertion::parse(r"*\c3\a9t\c3\a9").unwrap();
        assert_eq!(a.sub_final(), Some("été"));
    }

    #[test]
    fn stray_latin1_escape_decodes_per_byte() {
        let a = SubstringAssertion::parse(r"caf\e9*").unwrap();
        assert_eq!(a.sub_initial(), Some("café"));
    }

    #[test]
    fn malformed_escape_reports_position() {
        assert_eq!(
            SubstringAssertion::parse(r"ab\zz*"),
            Err(CollationError::InvalidEscape { position: 2 })
        );
        assert_eq!(
            SubstringAssertion::parse(r"*ab\4"),
            Err(CollationError::InvalidEscape { position: 3 })
        );
    }

    #[test]
    fn wildcard_only_detected() {
        assert!(SubstringAssertion::parse("*").unwrap().is_wildcard_only());
        assert!(SubstringAssertion::parse("**").unwrap().is_wildcard_only());
        assert!(!SubstringAssertion::parse("*a*").unwrap().is_wildcard_only());
    }

    #[test]
    fn filter_string_reparses_to_same_assertion() {
        let original = SubstringAssertion::new()
            .with_initial("a(b)")
            .with_any("c*d")
            .with_final(r"e\f");
        let rendered = original.to_filter_string();
        assert_eq!(rendered, r"a\28b\29*c\2ad*e\5cf");
        assert_eq!(SubstringAssertion::parse(&rendered).unwrap(), original);
    }
}
