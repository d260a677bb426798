//! Title normalization for library matching.
//!
//! Index keys and descriptor titles go through the same staged pipeline so
//! that posters named "The   Matrix (Director's Cut)" land on the library's
//! "The Matrix". The edition-tag list is extensible through configuration
//! rather than more hard-coded cases.

use unicode_normalization::UnicodeNormalization;

/// Apply the full normalization pipeline with the built-in tag list only.
pub fn normalize(s: &str) -> String {
    normalize_with(s, &[])
}

/// Apply the full normalization pipeline.
///
/// Levels applied in order:
/// 1. Unicode NFKC + case folding
/// 2. Character transliteration
/// 3. Trailing edition-tag and year-in-title stripping
/// 4. Ampersand normalization
/// 5. Punctuation erasure
/// 6. Whitespace collapse
pub fn normalize_with(s: &str, extra_tags: &[String]) -> String {
    let s = unicode_normalize(s);
    let s = transliterate(&s);
    let s = strip_trailing_tags(&s, extra_tags);
    let s = replace_ampersand(&s);
    let s = erase_punctuation(&s);
    collapse_whitespace(&s)
}

// ── Level 1: Unicode NFKC + case folding ──────────────────────────────

/// Apply NFKC normalization (fullwidth → ASCII, compose diacritics) and lowercase.
fn unicode_normalize(s: &str) -> String {
    s.nfkc().collect::<String>().to_lowercase()
}

// ── Level 2: Character transliteration ────────────────────────────────

/// Replace typographic character variants that differ between poster sites
/// and media server metadata.
fn transliterate(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\u{2019}' | '\u{2018}' | '\u{02BC}' => result.push('\''), // curly quotes → straight
            '\u{201C}' | '\u{201D}' => result.push('"'),               // curly double quotes
            '\u{2013}' | '\u{2014}' => result.push('-'),               // en/em dash → hyphen
            '\u{2026}' => result.push_str("..."),                      // ellipsis
            '\u{00E6}' => result.push_str("ae"),                       // æ
            '\u{0153}' => result.push_str("oe"),                       // œ
            '\u{00DF}' => result.push_str("ss"),                       // ß
            c => result.push(c),
        }
    }
    result
}

// ── Level 3: Trailing edition-tag and year stripping ──────────────────

/// Edition tags stripped when they appear as a trailing parenthesized or
/// bracketed suffix, in `tag_key` form.
const EDITION_TAGS: &[&str] = &[
    "directors cut",
    "final cut",
    "extended",
    "extended cut",
    "extended edition",
    "unrated",
    "uncut",
    "remastered",
    "4k remaster",
    "restored",
    "theatrical",
    "theatrical cut",
    "special edition",
    "collectors edition",
    "ultimate edition",
    "anniversary edition",
    "imax",
    "imax enhanced",
    "criterion",
    "criterion collection",
    "redux",
    "open matte",
];

/// Repeatedly strip trailing "(…)" / "[…]" groups whose content is a year
/// or a known edition tag. Non-trailing and unrecognized groups stay.
fn strip_trailing_tags(s: &str, extra_tags: &[String]) -> String {
    let mut current = s.trim_end().to_string();
    while let Some(stripped) = strip_one_trailing_tag(&current, extra_tags) {
        current = stripped.trim_end().to_string();
    }
    current
}

fn strip_one_trailing_tag(s: &str, extra_tags: &[String]) -> Option<String> {
    let open = if s.ends_with(')') {
        '('
    } else if s.ends_with(']') {
        '['
    } else {
        return None;
    };
    let start = s.rfind(open)?;
    // A group that spans the whole string is a title, not a suffix.
    if start == 0 {
        return None;
    }
    let inner = &s[start + open.len_utf8()..s.len() - 1];
    if is_year(inner) || is_edition_tag(inner, extra_tags) {
        Some(s[..start].to_string())
    } else {
        None
    }
}

/// A plausible release year: four digits in a sane range.
fn is_year(s: &str) -> bool {
    let s = s.trim();
    s.len() == 4
        && s.chars().all(|c| c.is_ascii_digit())
        && (1880..=2100).contains(&s.parse::<u16>().unwrap_or(0))
}

fn is_edition_tag(s: &str, extra_tags: &[String]) -> bool {
    let key = tag_key(s);
    EDITION_TAGS.contains(&key.as_str()) || extra_tags.iter().any(|t| tag_key(t) == key)
}

/// Canonical form for tag comparison: lowercase alphanumerics and single
/// spaces ("Director's Cut" and "directors cut" compare equal).
fn tag_key(s: &str) -> String {
    let kept: String = s
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Level 4: Ampersand normalization ──────────────────────────────────

/// Normalize a standalone "&" to "and" so both spellings share a key.
fn replace_ampersand(s: &str) -> String {
    s.split_whitespace()
        .map(|word| if word == "&" { "and" } else { word })
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Level 5: Punctuation erasure ──────────────────────────────────────

/// Strip punctuation and symbol characters, keeping alphanumerics and whitespace.
fn erase_punctuation(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect()
}

// ── Level 6: Whitespace collapse ──────────────────────────────────────

/// Trim and collapse whitespace runs to a single space.
fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Level 1: Unicode NFKC ─────────────────────────────────────────

    #[test]
    fn fullwidth_ascii() {
        assert_eq!(unicode_normalize("ＭＡＴＲＩＸ"), "matrix");
    }

    #[test]
    fn case_folding() {
        assert_eq!(unicode_normalize("The MATRIX"), "the matrix");
    }

    // ── Level 2: Transliteration ──────────────────────────────────────

    #[test]
    fn curly_quotes() {
        assert_eq!(transliterate("it\u{2019}s"), "it's");
    }

    #[test]
    fn em_dash() {
        assert_eq!(transliterate("Title\u{2014}Subtitle"), "Title-Subtitle");
    }

    #[test]
    fn ligatures() {
        assert_eq!(transliterate("æon"), "aeon");
    }

    // ── Level 3: Trailing tags ────────────────────────────────────────

    #[test]
    fn strip_edition_suffix() {
        assert_eq!(
            strip_trailing_tags("the matrix (director's cut)", &[]),
            "the matrix"
        );
        assert_eq!(strip_trailing_tags("dune [extended]", &[]), "dune");
    }

    #[test]
    fn strip_year_suffix() {
        assert_eq!(strip_trailing_tags("inception (2010)", &[]), "inception");
    }

    #[test]
    fn strip_stacked_suffixes() {
        assert_eq!(
            strip_trailing_tags("blade runner (remastered) (1982)", &[]),
            "blade runner"
        );
    }

    #[test]
    fn keep_meaningful_parens() {
        assert_eq!(
            strip_trailing_tags("birdman (or the unexpected virtue of ignorance)", &[]),
            "birdman (or the unexpected virtue of ignorance)"
        );
    }

    #[test]
    fn keep_whole_title_parenthetical() {
        assert_eq!(strip_trailing_tags("(500)", &[]), "(500)");
    }

    #[test]
    fn keep_non_trailing_year() {
        assert_eq!(
            strip_trailing_tags("2001 a space odyssey", &[]),
            "2001 a space odyssey"
        );
    }

    #[test]
    fn extra_tags_from_config() {
        let extra = vec!["Fan Edit".to_string()];
        assert_eq!(strip_trailing_tags("dune (fan edit)", &extra), "dune");
        assert_eq!(strip_trailing_tags("dune (fan edit)", &[]), "dune (fan edit)");
    }

    // ── Level 4: Ampersand ────────────────────────────────────────────

    #[test]
    fn ampersand_to_and() {
        assert_eq!(replace_ampersand("fast & furious"), "fast and furious");
    }

    #[test]
    fn glued_ampersand_untouched() {
        assert_eq!(replace_ampersand("at&t"), "at&t");
    }

    // ── Level 5: Punctuation ──────────────────────────────────────────

    #[test]
    fn erase_all_punctuation() {
        assert_eq!(erase_punctuation("wall-e: the movie!"), "walle the movie");
    }

    // ── Level 6: Whitespace ───────────────────────────────────────────

    #[test]
    fn collapse_spaces() {
        assert_eq!(collapse_whitespace("  the   matrix  "), "the matrix");
    }

    // ── Full pipeline ─────────────────────────────────────────────────

    #[test]
    fn full_pipeline_case_and_whitespace() {
        assert_eq!(normalize("The Matrix"), normalize("the   matrix"));
    }

    #[test]
    fn full_pipeline_edition_suffix() {
        assert_eq!(
            normalize("The Matrix (Director's Cut)"),
            normalize("The Matrix")
        );
    }

    #[test]
    fn full_pipeline_year_in_title() {
        assert_eq!(normalize("Heat (1995)"), "heat");
    }

    #[test]
    fn full_pipeline_punctuation_variants() {
        assert_eq!(normalize("WALL·E"), normalize("WALL-E"));
        assert_eq!(normalize("Se7en!"), "se7en");
    }

    #[test]
    fn full_pipeline_ampersand() {
        assert_eq!(normalize("Fast & Furious"), normalize("Fast and Furious"));
    }

    #[test]
    fn full_pipeline_trailing_number_title_kept() {
        assert_eq!(normalize("Blade Runner 2049"), "blade runner 2049");
    }

    #[test]
    fn full_pipeline_empty() {
        assert_eq!(normalize(""), "");
    }
}
