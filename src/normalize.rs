use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lowercase, NFKD with combining marks removed, non-alphanumeric runs
/// collapsed to a single space, trimmed. Idempotent.
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;

    for c in input
        .nfkd()
        .flat_map(char::to_lowercase)
        .filter(|c| !is_combining_mark(*c))
    {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }

    out
}

/// Exact-duplicate key for a record: `normalize(name)|normalize(city)`.
pub fn dedup_key(name: &str, city: &str) -> String {
    format!("{}|{}", normalize(name), normalize(city))
}

/// Identifier slug: normalized name and city, hyphen-joined. Empty parts are
/// skipped so a record without a city does not end in `-`.
pub fn slug(name: &str, city: &str) -> String {
    [name, city]
        .iter()
        .map(|part| normalize(part).replace(' ', "-"))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_collapses() {
        assert_eq!(normalize("  Sunshine   Playground!! "), "sunshine playground");
        assert_eq!(normalize("A--B__C"), "a b c");
    }

    #[test]
    fn strips_diacritics() {
        assert_eq!(normalize("Café Zürich"), "cafe zurich");
        assert_eq!(normalize("ŁÓDŹ"), "łodz");
    }

    #[test]
    fn keeps_non_latin_letters() {
        assert_eq!(normalize("桃園 市"), "桃園 市");
    }

    #[test]
    fn idempotent() {
        let inputs = [
            "Sunshine Playground",
            "  Café---Zürich  ",
            "ℌello Ⅻ ﬁsh",
            "İstanbul",
            "ÅNGSTRÖM",
            "桃園市 (Taoyuan)",
            "",
            "!!!",
            "x\u{0301}\u{0301}y",
        ];
        for s in inputs {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn case_and_accent_variants_share_key() {
        assert_eq!(
            dedup_key("SUNSHINE PLAYGROUND", "Taoyuan"),
            dedup_key("Sunshine Playground", "Táoyuán")
        );
    }

    #[test]
    fn slug_from_name_and_city() {
        assert_eq!(slug("Sunshine Playground", "Taoyuan"), "sunshine-playground-taoyuan");
        assert_eq!(slug("Farm", "New Taipei"), "farm-new-taipei");
        assert_eq!(slug("Farm", ""), "farm");
        assert_eq!(slug("", ""), "");
    }
}
