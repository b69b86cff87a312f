//! Maps an extracted quote back to the nearest matching OCR word.

use super::types::SourceEvidence;
use crate::pipeline::ocr::OcrResult;

/// Punctuation stripped when normalizing tokens and words.
const STRIP_CHARS: &[char] = &[',', ':', '.', '$'];

/// Anchor a quote to the first OCR word matching its lookup token.
///
/// The lookup token is the first whitespace-delimited word of the quote's
/// final `:`-separated segment, lowercased, with trailing punctuation
/// stripped. Pages are scanned in order, words within a page in order; the
/// first word (carrying a bounding box) whose normalized text equals the
/// token wins. When nothing matches, the returned evidence still carries the
/// quote but no bounding box or page.
pub fn anchor_quote(quote: &str, ocr: &OcrResult) -> SourceEvidence {
    let token = lookup_token(quote);

    if !token.is_empty() {
        for page in &ocr.pages {
            for word in &page.words {
                if word.bbox.is_some() && normalize_word(&word.text) == token {
                    return SourceEvidence {
                        quote: Some(quote.to_string()),
                        bbox: word.bbox.clone(),
                        page_number: Some(page.page_number),
                    };
                }
            }
        }
    }

    SourceEvidence::quote_only(quote)
}

fn lookup_token(quote: &str) -> String {
    quote
        .rsplit(':')
        .next()
        .unwrap_or("")
        .trim()
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_lowercase()
        .trim_end_matches(STRIP_CHARS)
        .to_string()
}

fn normalize_word(text: &str) -> String {
    text.to_lowercase().trim_matches(STRIP_CHARS).to_string()
}
