use std::fmt;

use crate::error::IndexError;

/// Reduces a value to a phonetic key for approximate (`~=`) matching.
pub trait ApproximateNormalizer: Send + Sync + fmt::Debug {
    fn normalize(&self, value: &str) -> Result<Vec<u8>, IndexError>;
}

/// American Soundex over the ASCII letters of a value.
///
/// Values without any ASCII letter cannot be normalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Soundex;

const CODE_LEN: usize = 4;

impl Soundex {
    fn code(letter: u8) -> Option<u8> {
        match letter {
            b'B' | b'F' | b'P' | b'V' => Some(b'1'),
            b'C' | b'G' | b'J' | b'K' | b'Q' | b'S' | b'X' | b'Z' => Some(b'2'),
            b'D' | b'T' => Some(b'3'),
            b'L' => Some(b'4'),
            b'M' | b'N' => Some(b'5'),
            b'R' => Some(b'6'),
            // Vowels separate repeated codes, H and W do not.
            b'H' | b'W' => None,
            _ => Some(b'0'),
        }
    }
}

impl ApproximateNormalizer for Soundex {
    fn normalize(&self, value: &str) -> Result<Vec<u8>, IndexError> {
        let mut letters = value
            .bytes()
            .filter(u8::is_ascii_alphabetic)
            .map(|b| b.to_ascii_uppercase());
        let first = letters
            .next()
            .ok_or_else(|| IndexError::UnnormalizableValue(value.to_owned()))?;

        let mut out = Vec::with_capacity(CODE_LEN);
        out.push(first);
        let mut previous = Self::code(first);
        for letter in letters {
            if out.len() == CODE_LEN {
                break;
            }
            let Some(code) = Self::code(letter) else {
                continue;
            };
            if code != b'0' && Some(code) != previous {
                out.push(code);
            }
            previous = Some(code);
        }
        out.resize(CODE_LEN, b'0');
        Ok(out)
    }
}
