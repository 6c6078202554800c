//! Title-to-slug derivation.
//!
//! A slug is the URL-safe lookup key of a task: lowercase ASCII letters,
//! digits, hyphens and underscores, at most [`SLUG_MAX_LENGTH`] characters.
//!
//! Derivation is pure and deterministic:
//! 1. lowercase the title
//! 2. transliterate Cyrillic (Russian/Ukrainian) and common Latin diacritics
//!    to plain Latin letters
//! 3. collapse every run of whitespace/punctuation into a single `-`
//! 4. truncate to [`SLUG_MAX_LENGTH`]
//!
//! Characters with no mapping are dropped without introducing a separator,
//! so a title made only of such characters derives to an empty slug.

/// Maximum length of a slug, in characters.
pub const SLUG_MAX_LENGTH: usize = 100;

/// Latin replacement for a lowercase non-ASCII letter.
///
/// `ъ` and `ь` map to the empty string: they are consumed without output.
fn transliterate(ch: char) -> Option<&'static str> {
    let latin = match ch {
        // Russian
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "yo",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "j",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' | 'ь' => "",
        'ы' => "yi",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        // Ukrainian
        'є' => "ye",
        'ї' => "yi",
        'і' => "i",
        'ґ' => "g",
        // Latin-1 diacritics
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'æ' => "ae",
        'ç' => "c",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
        'œ' => "oe",
        'ß' => "ss",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'ý' | 'ÿ' => "y",
        _ => return None,
    };
    Some(latin)
}

/// Characters that split words: whitespace, ASCII punctuation and the
/// typographic marks commonly found in titles.
fn is_separator(ch: char) -> bool {
    ch.is_whitespace()
        || (ch.is_ascii_punctuation() && ch != '_' && ch != '&')
        || matches!(
            ch,
            '–' | '—' | '‒' | '−' | '«' | '»' | '“' | '”' | '„' | '‘' | '’' | '…' | '№' | '·'
        )
}

/// Accumulates slug pieces, inserting a single hyphen between words.
struct SlugBuilder {
    out: String,
    pending_separator: bool,
}

impl SlugBuilder {
    fn new(capacity: usize) -> Self {
        Self {
            out: String::with_capacity(capacity),
            pending_separator: false,
        }
    }

    fn push(&mut self, piece: &str) {
        if piece.is_empty() {
            return;
        }
        if self.pending_separator && !self.out.is_empty() {
            self.out.push('-');
        }
        self.pending_separator = false;
        self.out.push_str(piece);
    }

    fn separate(&mut self) {
        self.pending_separator = true;
    }

    fn finish(self) -> String {
        self.out
    }
}

/// Derive a slug from a task title.
///
/// Never fails; the result may be empty when the title has no
/// transliterable content.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let mut builder = SlugBuilder::new(lowered.len());
    let mut buf = [0u8; 4];

    for ch in lowered.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            builder.push(ch.encode_utf8(&mut buf));
        } else if ch == '&' {
            builder.separate();
            builder.push("and");
            builder.separate();
        } else if is_separator(ch) {
            builder.separate();
        } else if let Some(latin) = transliterate(ch) {
            builder.push(latin);
        }
    }

    truncate(&builder.finish())
}

/// Cut a slug to exactly [`SLUG_MAX_LENGTH`] when it runs past it.
fn truncate(slug: &str) -> String {
    // Derived slugs are pure ASCII, so byte and char positions agree.
    if slug.len() > SLUG_MAX_LENGTH {
        slug[..SLUG_MAX_LENGTH].to_string()
    } else {
        slug.to_string()
    }
}

/// Whether `value` uses only the slug alphabet (`[-a-zA-Z0-9_]+`).
pub fn is_valid_slug(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cyrillic_title_is_transliterated() {
        assert_eq!(slugify("Тестовый заголовок"), "testovyij-zagolovok");
    }

    #[test]
    fn test_expanding_title_is_truncated_to_max_length() {
        let slug = slugify(&"Ж".repeat(100));
        assert_eq!(slug, "zh".repeat(50));
        assert_eq!(slug.len(), SLUG_MAX_LENGTH);
    }

    #[test]
    fn test_latin_title() {
        assert_eq!(slugify("Fix the Login Page 2"), "fix-the-login-page-2");
    }

    #[test]
    fn test_punctuation_runs_collapse_to_one_hyphen() {
        assert_eq!(slugify("  Hello,   World!!  "), "hello-world");
        assert_eq!(slugify("a -- b"), "a-b");
        assert_eq!(slugify("Срочно — сегодня"), "srochno-segodnya");
    }

    #[test]
    fn test_ampersand_becomes_and() {
        assert_eq!(slugify("Fish&Chips"), "fish-and-chips");
    }

    #[test]
    fn test_soft_and_hard_signs_vanish() {
        assert_eq!(slugify("Объявление №5"), "obyavlenie-5");
        assert_eq!(slugify("Пьеса"), "pesa");
    }

    #[test]
    fn test_underscore_is_kept() {
        assert_eq!(slugify("snake_case title"), "snake_case-title");
    }

    #[test]
    fn test_diacritics() {
        assert_eq!(slugify("Café Straße"), "cafe-strasse");
    }

    #[test]
    fn test_unmappable_title_derives_empty() {
        assert_eq!(slugify("日本語"), "");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_truncation_keeps_full_length_when_cut_lands_on_separator() {
        let title = format!("{} b", "a".repeat(99));
        let slug = slugify(&title);
        assert_eq!(slug, format!("{}-", "a".repeat(99)));
        assert_eq!(slug.len(), SLUG_MAX_LENGTH);

        // "zhzh-" repeated: the 100th character is a hyphen.
        let slug = slugify(&"жж ".repeat(40));
        assert_eq!(slug.len(), SLUG_MAX_LENGTH);
        assert!(slug.ends_with("zhzh-"));
    }

    #[test]
    fn test_derived_slugs_are_valid() {
        for title in ["Тестовый заголовок", "Hello world", "Ёлка и щука", "x"] {
            let slug = slugify(title);
            assert!(is_valid_slug(&slug), "{slug:?} derived from {title:?}");
            assert!(slug.len() <= SLUG_MAX_LENGTH);
        }
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("first"));
        assert!(is_valid_slug("test-slug_2"));
        assert!(is_valid_slug("MixedCase"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("has space"));
        assert!(!is_valid_slug("кириллица"));
        assert!(!is_valid_slug("slash/inside"));
    }
}
