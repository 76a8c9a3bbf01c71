//! Per-language primary-strength tailorings.
//!
//! The root order places every letter at `codepoint << 3`. A tailoring moves a
//! letter (or a two-letter contraction) to one of the seven slots right after an
//! anchor letter, or makes it primary-equal to another letter. Keys are written
//! lower-case and NFC-composed because the collator folds case and composes
//! before it consults the table.

use fxhash::FxHashMap;
use once_cell::sync::Lazy;

/// Number of low bits reserved for tailored insertions after an anchor.
pub(crate) const SLOT_BITS: u32 = 3;

#[derive(Debug, Clone, Copy)]
enum Placement {
    After(char, u32),
    SameAs(char),
}

use Placement::{After, SameAs};

type Rule = (&'static str, Placement);

/// Resolved tailoring for one language.
#[derive(Debug, Default)]
pub(crate) struct Tailoring {
    singles: FxHashMap<char, u32>,
    pairs: FxHashMap<(char, char), u32>,
    turkic_casing: bool,
}

impl Tailoring {
    fn build(rules: &[Rule], turkic_casing: bool) -> Self {
        let mut tailoring = Tailoring {
            turkic_casing,
            ..Tailoring::default()
        };
        for &(letters, placement) in rules {
            let weight = match placement {
                After(anchor, slot) => tailoring.weight_of(anchor) | slot,
                SameAs(other) => tailoring.weight_of(other),
            };
            let mut chars = letters.chars();
            match (chars.next(), chars.next()) {
                (Some(first), None) => {
                    tailoring.singles.insert(first, weight);
                }
                (Some(first), Some(second)) => {
                    tailoring.pairs.insert((first, second), weight);
                }
                _ => {}
            }
        }
        tailoring
    }

    fn weight_of(&self, c: char) -> u32 {
        self.singles.get(&c).copied().unwrap_or_else(|| root_weight(c))
    }

    /// Weight and consumed length for the longest tailored sequence at the head of `chars`.
    pub(crate) fn lookup(&self, chars: &[char]) -> Option<(u32, usize)> {
        if !self.pairs.is_empty() {
            if let [first, second, ..] = chars {
                if let Some(&weight) = self.pairs.get(&(*first, *second)) {
                    return Some((weight, 2));
                }
            }
        }
        let first = chars.first()?;
        self.singles.get(first).map(|&weight| (weight, 1))
    }

    pub(crate) fn turkic_casing(&self) -> bool {
        self.turkic_casing
    }
}

/// Untailored primary weight of a character.
pub(crate) fn root_weight(c: char) -> u32 {
    (c as u32) << SLOT_BITS
}

/// Root expansions for letters whose primary weight is a letter sequence rather
/// than a decomposition.
pub(crate) fn root_expansion(c: char) -> Option<&'static str> {
    Some(match c {
        'ß' | 'ẞ' => "ss",
        'æ' => "ae",
        'œ' => "oe",
        'ø' => "o",
        'đ' | 'ð' => "d",
        'ł' => "l",
        'þ' => "th",
        'ħ' => "h",
        'ı' => "i",
        'ŀ' => "l",
        'ς' => "σ",
        _ => return None,
    })
}

static ROOT: Lazy<Tailoring> = Lazy::new(Tailoring::default);

static TAILORINGS: Lazy<FxHashMap<&'static str, Tailoring>> = Lazy::new(|| {
    let mut map = FxHashMap::default();
    map.insert("sv", Tailoring::build(SWEDISH, false));
    map.insert("fi", Tailoring::build(SWEDISH, false));
    map.insert("da", Tailoring::build(DANISH, false));
    map.insert("nb", Tailoring::build(DANISH, false));
    map.insert("no", Tailoring::build(DANISH, false));
    map.insert("es", Tailoring::build(SPANISH, false));
    map.insert("pl", Tailoring::build(POLISH, false));
    map.insert("cs", Tailoring::build(CZECH, false));
    map.insert("sk", Tailoring::build(SLOVAK, false));
    map.insert("tr", Tailoring::build(TURKISH, true));
    map.insert("az", Tailoring::build(AZERI, true));
    map.insert("is", Tailoring::build(ICELANDIC, false));
    map.insert("et", Tailoring::build(ESTONIAN, false));
    map.insert("lt", Tailoring::build(LITHUANIAN, false));
    map.insert("lv", Tailoring::build(LATVIAN, false));
    map.insert("hu", Tailoring::build(HUNGARIAN, false));
    map.insert("hr", Tailoring::build(CROATIAN, false));
    map.insert("sl", Tailoring::build(SLOVENIAN, false));
    map.insert("ro", Tailoring::build(ROMANIAN, false));
    map
});

/// Tailoring for a language, falling back to the root order.
pub(crate) fn tailoring_for(language: &str) -> &'static Tailoring {
    TAILORINGS.get(language).unwrap_or(&ROOT)
}

const SWEDISH: &[Rule] = &[
    ("å", After('z', 1)),
    ("ä", After('z', 2)),
    ("ö", After('z', 3)),
    ("æ", SameAs('ä')),
    ("ø", SameAs('ö')),
];

const DANISH: &[Rule] = &[
    ("æ", After('z', 1)),
    ("ø", After('z', 2)),
    ("å", After('z', 3)),
    ("ä", SameAs('æ')),
    ("ö", SameAs('ø')),
    ("aa", SameAs('å')),
];

const SPANISH: &[Rule] = &[("ñ", After('n', 1))];

const POLISH: &[Rule] = &[
    ("ą", After('a', 1)),
    ("ć", After('c', 1)),
    ("ę", After('e', 1)),
    ("ł", After('l', 1)),
    ("ń", After('n', 1)),
    ("ó", After('o', 1)),
    ("ś", After('s', 1)),
    ("ź", After('z', 1)),
    ("ż", After('z', 2)),
];

const CZECH: &[Rule] = &[
    ("č", After('c', 1)),
    ("ch", After('h', 1)),
    ("ř", After('r', 1)),
    ("š", After('s', 1)),
    ("ž", After('z', 1)),
];

const SLOVAK: &[Rule] = &[
    ("ä", After('a', 1)),
    ("č", After('c', 1)),
    ("ch", After('h', 1)),
    ("ô", After('o', 1)),
    ("š", After('s', 1)),
    ("ž", After('z', 1)),
];

const TURKISH: &[Rule] = &[
    ("ç", After('c', 1)),
    ("ğ", After('g', 1)),
    ("ı", After('h', 1)),
    ("ö", After('o', 1)),
    ("ş", After('s', 1)),
    ("ü", After('u', 1)),
];

const AZERI: &[Rule] = &[
    ("ç", After('c', 1)),
    ("ə", After('e', 1)),
    ("ğ", After('g', 1)),
    ("ı", After('h', 1)),
    ("ö", After('o', 1)),
    ("ş", After('s', 1)),
    ("ü", After('u', 1)),
];

const ICELANDIC: &[Rule] = &[
    ("á", After('a', 1)),
    ("ð", After('d', 1)),
    ("é", After('e', 1)),
    ("í", After('i', 1)),
    ("ó", After('o', 1)),
    ("ú", After('u', 1)),
    ("ý", After('y', 1)),
    ("þ", After('z', 1)),
    ("æ", After('z', 2)),
    ("ö", After('z', 3)),
];

const ESTONIAN: &[Rule] = &[
    ("š", After('s', 1)),
    ("z", After('s', 2)),
    ("ž", After('s', 3)),
    ("õ", After('w', 1)),
    ("ä", After('w', 2)),
    ("ö", After('w', 3)),
    ("ü", After('w', 4)),
];

const LITHUANIAN: &[Rule] = &[
    ("č", After('c', 1)),
    ("y", After('i', 1)),
    ("š", After('s', 1)),
    ("ž", After('z', 1)),
];

const LATVIAN: &[Rule] = &[
    ("č", After('c', 1)),
    ("ģ", After('g', 1)),
    ("ķ", After('k', 1)),
    ("ļ", After('l', 1)),
    ("ņ", After('n', 1)),
    ("š", After('s', 1)),
    ("ž", After('z', 1)),
];

const HUNGARIAN: &[Rule] = &[
    ("cs", After('c', 1)),
    ("dz", After('d', 1)),
    ("gy", After('g', 1)),
    ("ly", After('l', 1)),
    ("ny", After('n', 1)),
    ("ö", After('o', 1)),
    ("sz", After('s', 1)),
    ("ty", After('t', 1)),
    ("ü", After('u', 1)),
    ("zs", After('z', 1)),
];

const CROATIAN: &[Rule] = &[
    ("č", After('c', 1)),
    ("ć", After('c', 2)),
    ("dž", After('d', 1)),
    ("đ", After('d', 2)),
    ("lj", After('l', 1)),
    ("nj", After('n', 1)),
    ("š", After('s', 1)),
    ("ž", After('z', 1)),
];

const SLOVENIAN: &[Rule] = &[
    ("č", After('c', 1)),
    ("š", After('s', 1)),
    ("ž", After('z', 1)),
];

const ROMANIAN: &[Rule] = &[
    ("ă", After('a', 1)),
    ("â", After('a', 2)),
    ("î", After('i', 1)),
    ("ș", After('s', 1)),
    ("ş", SameAs('ș')),
    ("ț", After('t', 1)),
    ("ţ", SameAs('ț')),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertions_sit_between_anchor_and_next_letter() {
        let swedish = tailoring_for("sv");
        let (aring, _) = swedish.lookup(&['å']).unwrap();
        assert!(aring > root_weight('z'));
        assert!(aring < root_weight('{'));
    }

    #[test]
    fn equivalences_share_weight() {
        let swedish = tailoring_for("sv");
        assert_eq!(swedish.lookup(&['æ']), swedish.lookup(&['ä']));
    }

    #[test]
    fn contraction_preferred_over_single_letter() {
        let czech = tailoring_for("cs");
        let (weight, consumed) = czech.lookup(&['c', 'h', 'a']).unwrap();
        assert_eq!(consumed, 2);
        assert!(weight > root_weight('h') && weight < root_weight('i'));
        assert_eq!(czech.lookup(&['c', 'a']), None);
    }

    #[test]
    fn unknown_language_uses_root() {
        assert!(tailoring_for("en").lookup(&['å']).is_none());
        assert!(!tailoring_for("en").turkic_casing());
        assert!(tailoring_for("tr").turkic_casing());
    }
}
