//! Prompts for the hosted extractor and the LLM cleanup pass.
//!
//! Both texts are sent verbatim; wording changes shift what the model returns.
//! An archive with different documents can swap either prompt through
//! [`crate::config::PipelineConfigBuilder::extraction_prompt`] and
//! [`crate::config::PipelineConfigBuilder::cleanup_prompt`].

/// Extraction prompt: scanned pages in, `<p>` paragraphs out.
///
/// Used when `PipelineConfig::extraction_prompt` is `None`.
pub const EXTRACTION_PROMPT: &str = r#"Extract all the text from this PDF document. This is a historical speech, memo, or testimony by Admiral Hyman G. Rickover (1950s-1980s).

Rules:
- Extract the FULL text faithfully — do not summarize or skip anything
- Clean up OCR artifacts, page numbers, headers/footers, and repeated page titles
- Remove any copyright notices, boilerplate disclaimers, or "check against delivery" notes
- Remove any web browser artifacts (URLs, timestamps, "Open in Reader", etc.)
- Fix obvious OCR errors (like "tbe" → "the", "witb" → "with") but preserve Rickover's actual words
- Output ONLY the document text as clean HTML paragraphs using <p> tags
- Use <p> tags for each paragraph — do not use <br> tags
- Preserve paragraph breaks as they appear in the original
- Do not wrap output in ```html``` code blocks — just output the raw <p> tags
- Do not add any commentary, headers, or metadata — just the document text"#;

/// Cleanup prompt: existing `<p>` body in, cleaned `<p>` body out. The body
/// is appended directly after the trailing blank line.
///
/// Used when `PipelineConfig::cleanup_prompt` is `None`.
pub const CLEANUP_PROMPT: &str = r#"You are cleaning up the HTML text of a historical speech, memo, or testimony by Admiral Hyman G. Rickover.

The text below is already extracted and wrapped in <p> tags. Your job is to clean it up:

1. Remove any page numbers, page headers/footers, or paging artifacts that slipped through
2. Remove any OCR artifacts, garbled text, or nonsense characters
3. Remove any copyright notices, boilerplate disclaimers, "check against delivery" notes, or "for official use only" headers
4. Remove any web browser artifacts (URLs, timestamps, "Open in Reader", social media buttons, etc.)
5. Remove any repeated headers that appear on every page
6. Fix extraneous line breaks — merge paragraphs that were incorrectly split mid-sentence
7. Fix obvious typos or OCR errors (like "tbe" → "the") but preserve Rickover's actual words and style
8. Ensure each <p> tag contains a complete, logical paragraph
9. Do NOT add any markdown formatting (no *, **, _, `, #, etc.)
10. Do NOT add any commentary, headers, or metadata — just output the cleaned <p> tags
11. Do NOT summarize or shorten — preserve ALL of the original text content
12. Output ONLY <p>...</p> tags, nothing else

Here is the HTML to clean up:

"#;

/// Suffix appended to the extraction prompt when a document is sent in chunks.
///
/// `first` and `last` are 1-indexed and inclusive.
pub fn chunk_note(first: usize, last: usize, total: usize) -> String {
    format!(
        "\n\nNote: This is pages {first}-{last} of {total} of the document. Continue extracting faithfully."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_prompt_text() {
        assert!(EXTRACTION_PROMPT.starts_with(
            "Extract all the text from this PDF document. This is a historical speech, memo, \
             or testimony by Admiral Hyman G. Rickover (1950s-1980s).\n\nRules:\n"
        ));
        assert!(EXTRACTION_PROMPT.contains(
            "- Use <p> tags for each paragraph \u{2014} do not use <br> tags\n"
        ));
        assert!(EXTRACTION_PROMPT
            .ends_with("- Do not add any commentary, headers, or metadata \u{2014} just the document text"));
    }

    #[test]
    fn chunk_note_format() {
        assert_eq!(
            chunk_note(11, 20, 34),
            "\n\nNote: This is pages 11-20 of 34 of the document. Continue extracting faithfully."
        );
    }

    #[test]
    fn cleanup_prompt_text() {
        assert!(CLEANUP_PROMPT.starts_with(
            "You are cleaning up the HTML text of a historical speech, memo, or testimony by \
             Admiral Hyman G. Rickover.\n\n"
        ));
        assert!(CLEANUP_PROMPT.contains(
            "6. Fix extraneous line breaks \u{2014} merge paragraphs that were incorrectly split mid-sentence\n"
        ));
        assert!(CLEANUP_PROMPT.contains("12. Output ONLY <p>...</p> tags, nothing else\n"));
        assert!(CLEANUP_PROMPT.ends_with("Here is the HTML to clean up:\n\n"));
    }
}
