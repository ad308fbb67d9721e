use once_cell::sync::Lazy;
use regex::Regex;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"http\S+").expect("valid url regex"));
static NON_ALPHA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z\s]").expect("valid non-alpha regex"));

/// Normalizes feed and training text before classification.
///
/// URLs are stripped first so that their letters don't leak into the
/// vocabulary, then everything other than ASCII letters and whitespace is
/// dropped and the result lowercased. Whitespace runs are preserved.
pub fn clean_text(text: &str) -> String {
    let without_urls = URL_RE.replace_all(text, "");
    let letters_only = NON_ALPHA_RE.replace_all(&without_urls, "");
    letters_only.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clean_text_strips_urls() {
        assert_eq!(
            clean_text("Flood warning https://example.org/a?b=1 issued"),
            "flood warning  issued"
        );
    }

    #[test]
    fn test_clean_text_strips_digits_and_punctuation() {
        assert_eq!(
            clean_text("M 6.1 - 20 km SW of Tonga!"),
            "m    km sw of tonga"
        );
    }

    #[test]
    fn test_clean_text_lowercases_and_keeps_whitespace() {
        assert_eq!(clean_text("Red ALERT\tfor\nCyclone"), "red alert\tfor\ncyclone");
    }

    #[test]
    fn test_clean_text_empty() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("1234 ???"), " ");
    }

    #[test]
    fn test_clean_text_drops_non_ascii_letters() {
        assert_eq!(clean_text("Séisme à Nouméa"), "sisme  nouma");
    }
}
