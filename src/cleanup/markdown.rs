//! Markdown decorator removal for summaries written by an LLM.
//!
//! Summaries end up in three places (manifest, meta description, summary
//! paragraph) where `**bold**` or `## Heading` shows up literally.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_BOLD_STARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static RE_BOLD_UNDERSCORES: Lazy<Regex> = Lazy::new(|| Regex::new(r"__(.+?)__").unwrap());
static RE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`(.+?)`").unwrap());
static RE_STRIKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"~~(.+?)~~").unwrap());
static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s+").unwrap());
static RE_DANGLING_BEFORE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*{1,2}(\w)").unwrap());
static RE_DANGLING_AFTER_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w)\*{1,2}").unwrap());

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Unwrap `<d>inner<d>` spans whose opening delimiter is not preceded by a
/// word character and whose closing delimiter is not followed by one.
///
/// The shortest span wins and spans never cross a newline, so `don't_care`
/// and `2*3*4` are left alone.
fn strip_emphasis(text: &str, delim: char) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let opens = chars[i] == delim && (i == 0 || !is_word_char(chars[i - 1]));
        if opens {
            let close = (i + 2..chars.len())
                .take_while(|&j| chars[j - 1] != '\n')
                .find(|&j| {
                    chars[j] == delim && chars.get(j + 1).map_or(true, |&c| !is_word_char(c))
                });
            if let Some(j) = close {
                out.extend(&chars[i + 1..j]);
                i = j + 1;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }

    out
}

fn strip_inline(text: &str) -> String {
    let s = RE_BOLD_STARS.replace_all(text, "$1");
    let s = RE_BOLD_UNDERSCORES.replace_all(&s, "$1");
    let s = strip_emphasis(&s, '*');
    let s = strip_emphasis(&s, '_');
    RE_CODE.replace_all(&s, "$1").into_owned()
}

/// Remove markdown from a plain-text summary, keeping the inner text.
///
/// ```
/// use corpus_press::cleanup::strip_markdown;
/// assert_eq!(strip_markdown("## Overview\nA **bold** claim"), "Overview\nA bold claim");
/// ```
pub fn strip_markdown(text: &str) -> String {
    let s = strip_inline(text);
    let s = RE_HEADING.replace_all(&s, "");
    RE_STRIKE.replace_all(&s, "$1").into_owned()
}

/// Remove markdown from text already embedded in HTML (a meta description or
/// a summary paragraph). Also drops stray `*`/`**` left where a summary was
/// truncated mid-span.
pub fn strip_markdown_fragment(text: &str) -> String {
    let s = strip_inline(text);
    let s = RE_STRIKE.replace_all(&s, "$1");
    let s = RE_DANGLING_BEFORE_WORD.replace_all(&s, "${1}");
    RE_DANGLING_AFTER_WORD.replace_all(&s, "${1}").into_owned()
}
