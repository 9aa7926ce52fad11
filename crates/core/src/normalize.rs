//! Candidate-name normalization.
//!
//! Produces the canonical key used for matching and cache lookups:
//! lowercased, diacritics stripped for the supported locales,
//! whitespace collapsed. Pure and idempotent.

use std::sync::OnceLock;

use regex::Regex;

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Strip the diacritics that appear in the supported locales
/// (en/fr plus the Cyrillic ё). Kazakh-specific Cyrillic letters are
/// distinct letters, not accented variants, and pass through unchanged.
fn strip_diacritics(c: char) -> char {
    match c {
        'à' | 'â' | 'ä' | 'á' | 'ã' => 'a',
        'è' | 'ê' | 'ë' | 'é' => 'e',
        'î' | 'ï' | 'í' => 'i',
        'ô' | 'ö' | 'ó' | 'õ' => 'o',
        'ù' | 'û' | 'ü' | 'ú' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ё' => 'е',
        other => other,
    }
}

/// Canonicalize a raw candidate label for matching and caching.
///
/// The locale parameter selects nothing today — every supported locale
/// shares one diacritic table — but it is part of the signature because
/// cache keys are scoped by `(normalized name, locale)`.
pub fn normalize(raw: &str, _locale: &str) -> String {
    let lowered = raw.to_lowercase();
    let stripped: String = lowered
        .chars()
        .map(strip_diacritics)
        // Ligatures expand to two characters, handled separately.
        .flat_map(|c| match c {
            'œ' => vec!['o', 'e'],
            'æ' => vec!['a', 'e'],
            other => vec![other],
        })
        .collect();
    let collapsed = whitespace_re().replace_all(stripped.trim(), " ");
    collapsed.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_trims() {
        assert_eq!(normalize("  Grilled Chicken  ", "en"), "grilled chicken");
    }

    #[test]
    fn collapses_inner_whitespace() {
        assert_eq!(normalize("grilled \t  chicken\nbreast", "en"), "grilled chicken breast");
    }

    #[test]
    fn strips_french_diacritics() {
        assert_eq!(normalize("Purée de Pommes", "fr"), "puree de pommes");
        assert_eq!(normalize("Bœuf Bourguignon", "fr"), "boeuf bourguignon");
        assert_eq!(normalize("Crème brûlée", "fr"), "creme brulee");
    }

    #[test]
    fn maps_cyrillic_yo() {
        assert_eq!(normalize("Свёкла", "ru"), "свекла");
    }

    #[test]
    fn keeps_kazakh_letters() {
        assert_eq!(normalize("Қазы", "kk"), "қазы");
    }

    #[test]
    fn idempotent() {
        for s in ["  Grilled   Chicken ", "Crème brûlée", "Свёкла", "қазы", ""] {
            let once = normalize(s, "en");
            assert_eq!(normalize(&once, "en"), once);
        }
    }

    #[test]
    fn empty_input() {
        assert_eq!(normalize("", "en"), "");
        assert_eq!(normalize("   ", "en"), "");
    }
}
