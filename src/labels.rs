use regex::Regex;
use std::sync::LazyLock;

// Acronym keys are shown as-is: "ASIN", "UPC"
static ACRONYM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]+$").unwrap());

// Lowercase followed by uppercase: the camelCase word break
static CAMEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").unwrap());

/// Fixed display names for the keys the importer writes.
fn known_label(key: &str) -> Option<&'static str> {
    match key {
        "BluRayDiscs" => Some("Blu-ray Discs"),
        "DvdDiscs" => Some("DVD Discs"),
        "DigitalCopy" => Some("Digital Copy"),
        "DateAdded" => Some("Date Added"),
        "PriceComment" => Some("Price Comment"),
        _ => None,
    }
}

/// Turn a custom-field key into a display label.
///
/// "releaseDate" → "Release Date", "price_comment" → "Price Comment",
/// "ASIN" → "ASIN", "blu-ray extras" → "Blu-Ray Extras".
pub fn humanize(key: &str) -> String {
    if let Some(label) = known_label(key) {
        return label.to_string();
    }
    if key.is_empty() {
        return String::new();
    }
    if ACRONYM_RE.is_match(key) {
        return key.to_string();
    }

    // Already spaced or hyphenated: capitalise each word, keep separators
    if key.chars().any(|c| c.is_whitespace() || c == '-') {
        let mut out = String::with_capacity(key.len());
        let mut at_word_start = true;
        for c in key.chars() {
            if c.is_whitespace() || c == '-' {
                at_word_start = true;
                out.push(c);
            } else if at_word_start {
                at_word_start = false;
                out.extend(c.to_uppercase());
            } else {
                out.push(c);
            }
        }
        return out;
    }

    let spaced = CAMEL_RE.replace_all(key, "$1 $2").replace('_', " ");
    capitalize_words(&spaced)
}

/// Uppercase the first character of every alphanumeric run.
fn capitalize_words(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_word = false;
    for c in s.chars() {
        let word = c.is_ascii_alphanumeric();
        if word && !prev_word {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
        prev_word = word;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels() {
        assert_eq!(humanize("BluRayDiscs"), "Blu-ray Discs");
        assert_eq!(humanize("DvdDiscs"), "DVD Discs");
        assert_eq!(humanize("PriceComment"), "Price Comment");
    }

    #[test]
    fn test_acronyms_untouched() {
        assert_eq!(humanize("ASIN"), "ASIN");
        assert_eq!(humanize("UPC"), "UPC");
    }

    #[test]
    fn test_camel_and_snake_case() {
        assert_eq!(humanize("releaseDate"), "Release Date");
        assert_eq!(humanize("ReleaseDate"), "Release Date");
        assert_eq!(humanize("price_comment"), "Price Comment");
        assert_eq!(humanize("studio"), "Studio");
        assert_eq!(humanize("cut2"), "Cut2");
    }

    #[test]
    fn test_spaced_and_hyphenated() {
        assert_eq!(humanize("blu-ray extras"), "Blu-Ray Extras");
        assert_eq!(humanize("date  added"), "Date  Added");
        assert_eq!(humanize("director's cut"), "Director's Cut");
    }

    #[test]
    fn test_empty() {
        assert_eq!(humanize(""), "");
    }
}
