use crate::types::HeadingLevel;

const ROMAN_PREFIXES: [&str; 8] = ["I.", "II.", "III.", "IV.", "V.", "VI.", "VII.", "VIII."];

/// Outline depth of a bold line, read from its literal prefix.
///
/// Roman numerals `I.`..`VIII.` are top-level; single letters `A.`..`E.` and
/// `a.`..`e.` are second-level; anything else is third-level.
pub fn heading_level(text: &str) -> HeadingLevel {
    if ROMAN_PREFIXES.iter().any(|p| text.starts_with(p)) {
        HeadingLevel::H1
    } else if letter_prefix(text, 'A'..='E') || letter_prefix(text, 'a'..='e') {
        HeadingLevel::H2
    } else {
        HeadingLevel::H3
    }
}

/// Text opens with `1.` through `9.`.
pub fn starts_numbered_item(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some('1'..='9'), Some('.'))
    )
}

fn letter_prefix(text: &str, letters: std::ops::RangeInclusive<char>) -> bool {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), Some('.')) => letters.contains(&c),
        _ => false,
    }
}
