//! Dish naming shared by the initial run and both reconciliation paths.
//!
//! Rules (resolved to the comma-joined top-3 variant):
//! - one item: the item name, truncated with an ellipsis past 60 chars;
//! - two items: `"A {localized with} B"`, falling back to `"A, B"` when
//!   the connector form exceeds 60 chars;
//! - three or more: comma-joined first three names.

use crate::config::DISH_NAME_MAX_LEN;
use crate::i18n;

/// Truncate on a character boundary and append an ellipsis.
fn truncate_with_ellipsis(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        return name.to_string();
    }
    let truncated: String = name.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", truncated.trim_end())
}

/// Compose a dish name from item names in snapshot order.
///
/// Works on whatever names it is given; callers pass original names and
/// localize the result separately (translation is best-effort I/O and
/// does not belong in a pure function).
pub fn compose(item_names: &[&str], locale: &str, fallback_chain: &[String]) -> String {
    match item_names {
        [] => String::new(),
        [single] => truncate_with_ellipsis(single, DISH_NAME_MAX_LEN),
        [a, b] => {
            let with = i18n::message(locale, fallback_chain, "dish.with");
            let connected = format!("{a} {with} {b}");
            if connected.chars().count() <= DISH_NAME_MAX_LEN {
                connected
            } else {
                truncate_with_ellipsis(&format!("{a}, {b}"), DISH_NAME_MAX_LEN)
            }
        }
        many => {
            let joined = many
                .iter()
                .take(3)
                .copied()
                .collect::<Vec<_>>()
                .join(", ");
            truncate_with_ellipsis(&joined, DISH_NAME_MAX_LEN)
        }
    }
}
