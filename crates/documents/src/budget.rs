//! Fixed-prefix truncation of extracted text.

/// Return the first `max_chars` characters of `text`.
///
/// Counts Unicode scalar values, never splits one, and is idempotent:
/// `budget(budget(t, c), c) == budget(t, c)`.
pub fn budget(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_unchanged() {
        assert_eq!(budget("policy text", 8000), "policy text");
        assert_eq!(budget("", 10), "");
    }

    #[test]
    fn long_text_is_cut_to_prefix() {
        let text = "a".repeat(20_000);
        let out = budget(&text, 8000);
        assert_eq!(out.chars().count(), 8000);
        assert!(text.starts_with(out));
    }

    #[test]
    fn exact_length_is_unchanged() {
        assert_eq!(budget("abcde", 5), "abcde");
        assert_eq!(budget("abcde", 4), "abcd");
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "état→ß漢字";
        assert_eq!(budget(text, 3), "éta");
        assert_eq!(budget(text, 6), "état→ß");
    }

    #[test]
    fn idempotent() {
        let text = "Sum insured: ₹5,00,000 per policy year. ".repeat(400);
        let once = budget(&text, 8000);
        assert_eq!(budget(once, 8000), once);
    }
}
