//! Stable logical identifiers for planned resources.

use regex::Regex;
use std::sync::OnceLock;

/// Splits display names into words on anything that is not alphanumeric.
static WORD_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_word_regex() -> &'static Regex {
    WORD_REGEX.get_or_init(|| Regex::new(r"[A-Za-z0-9]+").expect("Invalid Regex"))
}

/// Join name parts into one PascalCase identifier.
///
/// Only the first letter of each word is upper-cased so acronyms survive:
/// `["Provider VPC", "isolated", "Subnet1"]` becomes `ProviderVPCIsolatedSubnet1`.
pub fn logical_id(parts: &[&str]) -> String {
    parts
        .iter()
        .flat_map(|part| get_word_regex().find_iter(part))
        .map(|word| {
            let mut chars = word.as_str().chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Reference to an attribute resolved by the reconciler at apply time.
pub fn attribute_ref(logical_id: &str, attribute: &str) -> String {
    format!("${{{logical_id}.{attribute}}}")
}
