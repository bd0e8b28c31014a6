//! Lookup-key normalization
//!
//! Every name entering the index and every span entering the resolver
//! passes through the same normalization, so matching is insensitive to
//! case, diacritics and punctuation. Historical spellings vary wildly
//! ("Koeln", "Köln", "Cologne"), so the fold has to be aggressive while
//! staying deterministic.

use unicode_normalization::UnicodeNormalization;

/// Normalize a place name into its lookup key.
///
/// - Unicode NFD decomposition with combining marks stripped
///   (diacritics folding: "Köln" -> "koln")
/// - lowercase
/// - punctuation replaced by spaces ("Aix-la-Chapelle" -> "aix la chapelle")
/// - whitespace collapsed and trimmed
pub fn normalize_name(name: &str) -> String {
    let folded: String = name
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    let mut key = String::with_capacity(folded.len());
    let mut pending_space = false;
    for c in folded.chars() {
        if c.is_alphanumeric() {
            if pending_space && !key.is_empty() {
                key.push(' ');
            }
            pending_space = false;
            key.extend(c.to_lowercase());
        } else {
            pending_space = true;
        }
    }
    key
}

fn is_combining_mark(c: char) -> bool {
    // Combining Diacritical Marks and their supplement/extension blocks
    matches!(c,
        '\u{0300}'..='\u{036F}'
        | '\u{1AB0}'..='\u{1AFF}'
        | '\u{1DC0}'..='\u{1DFF}'
        | '\u{20D0}'..='\u{20FF}'
        | '\u{FE20}'..='\u{FE2F}')
}
