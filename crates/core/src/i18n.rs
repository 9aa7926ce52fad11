//! Static message catalog for user-facing pipeline strings.
//!
//! The application ships four locales (en, ru, kk, fr). Lookup walks
//! the configured fallback chain and always terminates at English, so
//! a missing translation degrades to the English message instead of a
//! key leaking into the result.

/// Supported locale codes, in catalog order.
pub const SUPPORTED_LOCALES: &[&str] = &["en", "ru", "kk", "fr"];

/// Default fallback chain used when the config does not override it.
pub const DEFAULT_FALLBACK_CHAIN: &[&str] = &["en"];

/// True when the locale has a catalog of its own.
pub fn is_supported(locale: &str) -> bool {
    SUPPORTED_LOCALES.contains(&locale)
}

fn lookup(locale: &str, key: &str) -> Option<&'static str> {
    let msg = match (locale, key) {
        ("en", "feedback.macro_balance") => {
            "Macronutrient balance is off — consider adjusting protein, carb and fat shares."
        }
        ("en", "feedback.calorie_density") => {
            "This meal is calorie-dense for its weight — watch portion sizes."
        }
        ("en", "feedback.protein_quality") => {
            "Protein content is low for this portion — add a protein source."
        }
        ("en", "feedback.processing_level") => {
            "Several items look highly processed — prefer whole foods where possible."
        }
        ("en", "dish.with") => "with",

        ("ru", "feedback.macro_balance") => {
            "Баланс макронутриентов нарушен — скорректируйте доли белков, углеводов и жиров."
        }
        ("ru", "feedback.calorie_density") => {
            "Блюдо слишком калорийное для своего веса — следите за порциями."
        }
        ("ru", "feedback.protein_quality") => {
            "Мало белка для такой порции — добавьте источник белка."
        }
        ("ru", "feedback.processing_level") => {
            "Несколько позиций выглядят сильно переработанными — выбирайте цельные продукты."
        }
        ("ru", "dish.with") => "с",

        ("kk", "feedback.macro_balance") => {
            "Макронутриенттер балансы бұзылған — ақуыз, көмірсу және май үлесін реттеңіз."
        }
        ("kk", "feedback.calorie_density") => {
            "Тағам салмағына қарағанда тым калориялы — порция мөлшерін бақылаңыз."
        }
        ("kk", "feedback.protein_quality") => {
            "Бұл порцияда ақуыз аз — ақуыз көзін қосыңыз."
        }
        ("kk", "feedback.processing_level") => {
            "Бірнеше тағам қатты өңделген көрінеді — табиғи өнімдерді таңдаңыз."
        }
        ("kk", "dish.with") => "мен",

        ("fr", "feedback.macro_balance") => {
            "L'équilibre des macronutriments est déséquilibré — ajustez les parts de protéines, glucides et lipides."
        }
        ("fr", "feedback.calorie_density") => {
            "Ce plat est dense en calories pour son poids — surveillez les portions."
        }
        ("fr", "feedback.protein_quality") => {
            "La teneur en protéines est faible pour cette portion — ajoutez une source de protéines."
        }
        ("fr", "feedback.processing_level") => {
            "Plusieurs aliments semblent très transformés — privilégiez les aliments bruts."
        }
        ("fr", "dish.with") => "avec",

        _ => return None,
    };
    Some(msg)
}

/// Resolve a message key against a locale plus fallback chain.
///
/// Tries `locale` first, then each entry of `fallback_chain`, then
/// English, then gives back the key itself (never panics on an unknown
/// key — a raw key in output is easier to diagnose than an error).
pub fn message(locale: &str, fallback_chain: &[String], key: &str) -> String {
    if let Some(msg) = lookup(locale, key) {
        return msg.to_string();
    }
    for fb in fallback_chain {
        if let Some(msg) = lookup(fb, key) {
            return msg.to_string();
        }
    }
    lookup("en", key).unwrap_or(key).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_lookup() {
        let msg = message("en", &[], "dish.with");
        assert_eq!(msg, "with");
    }

    #[test]
    fn russian_lookup() {
        assert_eq!(message("ru", &[], "dish.with"), "с");
    }

    #[test]
    fn kazakh_connector_is_comitative() {
        // "X мен Y" (X with Y), not "және" (the list conjunction).
        assert_eq!(message("kk", &[], "dish.with"), "мен");
    }

    #[test]
    fn unknown_locale_falls_back_to_english() {
        let msg = message("de", &[], "feedback.protein_quality");
        assert!(msg.contains("protein"));
    }

    #[test]
    fn fallback_chain_respected() {
        let chain = vec!["ru".to_string()];
        assert_eq!(message("de", &chain, "dish.with"), "с");
    }

    #[test]
    fn unknown_key_returns_key() {
        assert_eq!(message("en", &[], "no.such.key"), "no.such.key");
    }

    #[test]
    fn all_locales_cover_all_feedback_keys() {
        for locale in SUPPORTED_LOCALES {
            for key in [
                "feedback.macro_balance",
                "feedback.calorie_density",
                "feedback.protein_quality",
                "feedback.processing_level",
                "dish.with",
            ] {
                assert!(lookup(locale, key).is_some(), "{locale}/{key} missing");
            }
        }
    }
}
