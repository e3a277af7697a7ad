//! Parser for the free-text "additions" column of device variants.
//!
//! The column carries a trip-curve token and an optional accessory list:
//!
//! ```text
//! Кривая C; НК, ВК
//! ```
//!
//! Everything before the first `;` is searched for a curve marker
//! (`Кривая` or `Curve`) followed by a single letter. Everything after it is a
//! comma-separated list of accessory codes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Curve markers recognized in the head of the additions text.
const CURVE_MARKERS: &[&str] = &["Кривая", "кривая", "Curve", "curve", "CURVE"];

/// Structured form of the additions field.
///
/// # Examples
///
/// ```
/// use shield_sizer::catalog::additions::Additions;
///
/// let a = Additions::parse("Кривая C; НК, ВК");
/// assert_eq!(a.curve, Some('C'));
/// assert!(a.accessories.contains("НК"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Additions {
    /// Trip-curve letter, upper-cased.
    pub curve: Option<char>,
    /// Accessory codes, trimmed and de-duplicated.
    pub accessories: BTreeSet<String>,
}

impl Additions {
    /// Parses the additions text. Never fails; unknown text yields empty fields.
    pub fn parse(text: &str) -> Self {
        let (head, tail) = match text.split_once(';') {
            Some((head, tail)) => (head, Some(tail)),
            None => (text, None),
        };

        let accessories = tail
            .map(|t| {
                t.split(',')
                    .map(str::trim)
                    .filter(|code| !code.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            curve: parse_curve(head),
            accessories,
        }
    }

    /// Returns `true` when every requested accessory code is present.
    pub fn has_all<'a>(&self, requested: impl IntoIterator<Item = &'a String>) -> bool {
        requested
            .into_iter()
            .all(|code| self.accessories.contains(code.trim()))
    }
}

fn parse_curve(head: &str) -> Option<char> {
    CURVE_MARKERS.iter().find_map(|marker| {
        let idx = head.find(marker)?;
        head[idx + marker.len()..]
            .trim_start()
            .chars()
            .next()
            .filter(|c| c.is_alphabetic())
            .map(curve_letter)
    })
}

/// Normalizes a curve letter: upper case, Cyrillic look-alikes mapped to Latin.
pub fn curve_letter(c: char) -> char {
    match c {
        'В' | 'в' => 'B',
        'С' | 'с' => 'C',
        'К' | 'к' => 'K',
        other => other.to_uppercase().next().unwrap_or(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn curve_and_accessories() {
        let a = Additions::parse("Кривая C; НК, ВК");
        assert_eq!(a.curve, Some('C'));
        assert_eq!(a.accessories.len(), 2);
        assert!(a.accessories.contains("НК"));
        assert!(a.accessories.contains("ВК"));
    }

    #[test]
    fn curve_only() {
        let a = Additions::parse("Кривая D");
        assert_eq!(a.curve, Some('D'));
        assert!(a.accessories.is_empty());
    }

    #[test]
    fn cyrillic_curve_letter_is_normalized() {
        // Cyrillic "С" typed in place of Latin "C"
        let a = Additions::parse("Кривая С");
        assert_eq!(a.curve, Some('C'));
    }

    #[test]
    fn english_marker_and_lowercase_letter() {
        let a = Additions::parse("Curve b; AUX");
        assert_eq!(a.curve, Some('B'));
        assert!(a.has_all(codes(&["AUX"]).iter()));
    }

    #[test]
    fn accessories_without_curve() {
        let a = Additions::parse("; НК ,, ВК ");
        assert_eq!(a.curve, None);
        assert_eq!(a.accessories.len(), 2);
    }

    #[test]
    fn empty_text() {
        let a = Additions::parse("");
        assert_eq!(a, Additions::default());
    }

    #[test]
    fn has_all_requires_every_code() {
        let a = Additions::parse("Кривая C; НК");
        assert!(a.has_all(codes(&["НК"]).iter()));
        assert!(!a.has_all(codes(&["НК", "ВК"]).iter()));
        assert!(a.has_all(codes(&[]).iter()));
    }
}
