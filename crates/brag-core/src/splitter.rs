//! Splitting of oversized text into smaller units.
//!
//! Paragraphs first, sentences as the fallback when a text has no blank lines.
//! Never calls the backend and never fails; empty input yields no units.

use regex::Regex;
use std::sync::OnceLock;

fn paragraph_break() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").expect("valid paragraph regex"))
}

fn sentence_break() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.?!]\s+").expect("valid sentence regex"))
}

fn non_blank(part: &str) -> Option<String> {
    let trimmed = part.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Split on blank-line boundaries.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    paragraph_break()
        .split(text)
        .filter_map(non_blank)
        .collect()
}

/// Split after sentence-terminal punctuation followed by whitespace.
///
/// The punctuation stays with the sentence it ends.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in sentence_break().find_iter(text) {
        // Terminators are single-byte ASCII
        let end = m.start() + 1;
        sentences.extend(non_blank(&text[start..end]));
        start = m.end();
    }
    sentences.extend(non_blank(&text[start..]));

    sentences
}

/// Break `text` into at least two smaller units.
///
/// Tries paragraphs, then sentences. Returns `None` when neither produces a
/// reduction, i.e. the text is a single run-on sentence.
pub fn split_oversized(text: &str) -> Option<Vec<String>> {
    let paragraphs = split_paragraphs(text);
    if paragraphs.len() > 1 {
        return Some(paragraphs);
    }

    log::debug!("No paragraph breaks found, falling back to sentence split");
    let sentences = split_sentences(text);
    if sentences.len() > 1 {
        return Some(sentences);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let text = "First paragraph.\nStill first.\n\nSecond paragraph.\n  \n\nThird.";

        let parts = split_paragraphs(text);

        assert_eq!(
            parts,
            vec!["First paragraph.\nStill first.", "Second paragraph.", "Third."]
        );
    }

    #[test]
    fn single_paragraph_is_not_split() {
        assert_eq!(split_paragraphs("One. Two. Three."), vec!["One. Two. Three."]);
    }

    #[test]
    fn sentences_keep_their_terminator() {
        let parts = split_sentences("Shipped the API. Cut costs by 30%! Was it worth it? Yes");

        assert_eq!(
            parts,
            vec!["Shipped the API.", "Cut costs by 30%!", "Was it worth it?", "Yes"]
        );
    }

    #[test]
    fn decimal_points_do_not_split() {
        assert_eq!(split_sentences("Latency fell 2.5x overall."), vec!["Latency fell 2.5x overall."]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(split_paragraphs("").is_empty());
        assert!(split_sentences("").is_empty());
        assert!(split_paragraphs("\n\n   \n").is_empty());
        assert!(split_oversized("").is_none());
    }

    #[test]
    fn oversized_prefers_paragraphs() {
        let parts = split_oversized("A. B.\n\nC. D.").unwrap();
        assert_eq!(parts, vec!["A. B.", "C. D."]);
    }

    #[test]
    fn oversized_falls_back_to_sentences() {
        let parts = split_oversized("A one. B two. C three.").unwrap();
        assert_eq!(parts, vec!["A one.", "B two.", "C three."]);
    }

    #[test]
    fn run_on_sentence_cannot_be_split() {
        assert!(split_oversized("no punctuation at all just words").is_none());
    }

    #[test]
    fn handles_multibyte_text() {
        let parts = split_sentences("Déployé l'API. Coût réduit de 30 %! 完成了。");
        assert_eq!(parts, vec!["Déployé l'API.", "Coût réduit de 30 %!", "完成了。"]);
    }
}
