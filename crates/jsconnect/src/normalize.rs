//! Username normalization

use unicode_normalization::UnicodeNormalization;
use unicode_properties::{GeneralCategory, UnicodeGeneralCategory};

/// Applies the username policy to a proposed name.
///
/// Whitespace is removed first, then the name is NFD-decomposed and
/// non-spacing marks are dropped. The result is left decomposed.
pub fn normalize(name: &str, allow_whitespace: bool, allow_accents: bool) -> String {
    let mut result: String = if allow_whitespace {
        name.to_string()
    } else {
        name.chars().filter(|c| !c.is_whitespace()).collect()
    };

    if !allow_accents {
        result = remove_accents(&result);
    }

    result
}

fn remove_accents(input: &str) -> String {
    input
        .nfd()
        .filter(|c| c.general_category() != GeneralCategory::NonspacingMark)
        .collect()
}
