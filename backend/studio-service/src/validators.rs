use once_cell::sync::Lazy;
use regex::Regex;

/// Input validation utilities for studio service

// Compile regex patterns once at startup
// These patterns are hardcoded and always valid, so we use expect() with explicit reasoning
static SLUG_REGEX: Lazy<Regex> = Lazy::new(|| {
    // This regex is hardcoded and validated - it is a compile-time constant in practice
    Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$")
        .expect("hardcoded slug regex is invalid - fix source code")
});

static TIMEZONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    // IANA zone shape (Area/City with optional third segment), plus UTC
    Regex::new(r"^(?:UTC|[A-Za-z]+(?:[_+-][A-Za-z0-9]+)*(?:/[A-Za-z0-9]+(?:[_+-][A-Za-z0-9]+)*){1,2})$")
        .expect("hardcoded timezone regex is invalid - fix source code")
});

/// Fixed transliteration table for slug generation. The mapping is part of
/// the product contract: slugs must stay stable across releases, so this
/// table only ever grows.
fn ascii_fold(ch: char) -> Option<&'static str> {
    let folded = match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'ý' | 'ÿ' => "y",
        'ñ' => "n",
        'ç' => "c",
        'ß' => "ss",
        'æ' => "ae",
        'œ' => "oe",
        'þ' => "th",
        'ð' | 'đ' => "d",
        'ł' => "l",
        'š' => "s",
        'ž' => "z",
        'č' | 'ć' => "c",
        _ => return None,
    };
    Some(folded)
}

/// Generate a URL-safe slug from a brand name.
///
/// Lowercases, transliterates accented Latin characters through the fixed
/// table, maps every other non-alphanumeric run to a single hyphen. The
/// result is stable for a given input. Names that fold to nothing (e.g.
/// pure CJK) fall back to "brand"; uniqueness suffixes are the caller's job.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for ch in name.chars().flat_map(|c| c.to_lowercase()) {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(ch);
            pending_hyphen = false;
        } else if let Some(folded) = ascii_fold(ch) {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            slug.push_str(folded);
            pending_hyphen = false;
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        "brand".to_string()
    } else {
        slug
    }
}

/// Validate slug shape (lowercase alphanumeric runs joined by single hyphens)
pub fn validate_slug(slug: &str) -> bool {
    !slug.is_empty() && slug.len() <= 100 && SLUG_REGEX.is_match(slug)
}

/// Validate brand name (non-blank, at most 80 characters)
pub fn validate_brand_name(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty() && trimmed.chars().count() <= 80
}

/// Validate timezone shape (IANA-style "Area/City" or "UTC")
pub fn validate_timezone(tz: &str) -> bool {
    !tz.is_empty() && tz.len() <= 64 && TIMEZONE_REGEX.is_match(tz)
}

/// Validate an upload file name (no path separators or control characters)
pub fn validate_file_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 255
        && !name
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control())
}

/// Normalize a hashtag list: trim, strip a leading '#', drop empties,
/// deduplicate case-insensitively keeping the first spelling and order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: Vec<String> = Vec::new();
    let mut result = Vec::new();

    for tag in tags {
        let cleaned = tag.as_ref().trim().trim_start_matches('#').trim();
        if cleaned.is_empty() {
            continue;
        }
        let key = cleaned.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        result.push(cleaned.to_string());
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Acme Coffee"), "acme-coffee");
        assert_eq!(slugify("  Spaced   Out  "), "spaced-out");
        assert_eq!(slugify("UPPER"), "upper");
    }

    #[test]
    fn test_slugify_transliterates() {
        assert_eq!(slugify("Crème Brûlée & Co."), "creme-brulee-co");
        assert_eq!(slugify("Müller GmbH"), "muller-gmbh");
        assert_eq!(slugify("Ærø Søfart"), "aero-sofart");
        assert_eq!(slugify("Straße 9"), "strasse-9");
    }

    #[test]
    fn test_slugify_is_stable() {
        let name = "Café São Paulo — Nº1!";
        assert_eq!(slugify(name), slugify(name));
        assert_eq!(slugify(name), "cafe-sao-paulo-n-1");
    }

    #[test]
    fn test_slugify_falls_back_when_nothing_survives() {
        assert_eq!(slugify("株式会社"), "brand");
        assert_eq!(slugify("!!!"), "brand");
        assert_eq!(slugify(""), "brand");
    }

    #[test]
    fn test_slugify_no_edge_hyphens() {
        assert_eq!(slugify("-leading"), "leading");
        assert_eq!(slugify("trailing-"), "trailing");
        assert_eq!(slugify("--double--dash--"), "double-dash");
    }

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("acme-coffee"));
        assert!(validate_slug("a1"));
        assert!(!validate_slug("Acme"));
        assert!(!validate_slug("double--dash"));
        assert!(!validate_slug("-edge"));
        assert!(!validate_slug(""));
    }

    #[test]
    fn test_validate_brand_name() {
        assert!(validate_brand_name("Acme"));
        assert!(!validate_brand_name("   "));
        assert!(!validate_brand_name(&"x".repeat(81)));
    }

    #[test]
    fn test_validate_timezone() {
        assert!(validate_timezone("UTC"));
        assert!(validate_timezone("Europe/Berlin"));
        assert!(validate_timezone("America/New_York"));
        assert!(validate_timezone("America/Argentina/Buenos_Aires"));
        assert!(!validate_timezone("berlin"));
        assert!(!validate_timezone("Europe/"));
        assert!(!validate_timezone(""));
    }

    #[test]
    fn test_validate_file_name() {
        assert!(validate_file_name("summer-launch.mp4"));
        assert!(validate_file_name("weird name (1).png"));
        assert!(!validate_file_name("../escape.png"));
        assert!(!validate_file_name("a/b.png"));
        assert!(!validate_file_name("bad\\path.png"));
        assert!(!validate_file_name(""));
    }

    #[test]
    fn test_normalize_tags() {
        let tags = normalize_tags(["#summer", " Sale ", "summer", "#SALE", "", "#", "new"]);
        assert_eq!(tags, vec!["summer", "Sale", "new"]);
    }
}
