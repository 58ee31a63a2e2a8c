//! Case restoration for text that OCR (or a typewriter) left in ALL CAPS.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Words that stay uppercase whatever the surrounding case.
const KEEP_UPPER: &[&str] = &[
    "USS", "USN", "U.S.", "U.S", "USA", "UK", "NATO", "AEC", "CIA", "FBI", "DOD", "DOE", "NASA",
    "MIT", "NRC", "USNA", "SSN", "CGN", "CVN", "FY", "AEGIS", "ASW", "ICBM", "SLBM", "MX", "TV",
    "CBS", "NBC", "ABC", "DC", "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI",
    "XII", "XIII", "XIV", "XV", "ROTC", "GNP", "GDP", "PhD", "D.C.", "N.Y.", "H.G.", "H.R.", "S.",
    "R&D", "PWR", "BWR", "TMI", "GPU", "NIMITZ", "OHIO", "TRIDENT", "POLARIS", "POSEIDON",
    "NAUTILUS", "DNA", "RNA", "IBM", "AT&T", "GE", "LBJ", "FDR", "TR", "AM", "PM", "AD", "BC",
    "OPEC",
];

/// Small words left lowercase inside a title.
const TITLE_LOWER: &[&str] = &[
    "a", "an", "the", "and", "but", "or", "for", "nor", "on", "at", "to", "from", "by", "in",
    "of", "with", "as", "is",
];

/// `KEEP_UPPER` with dots removed, uppercased. A word matches when its
/// letters alone equal one of these, so entries holding `&` never match.
static ACRONYMS: Lazy<HashSet<String>> = Lazy::new(|| {
    KEEP_UPPER
        .iter()
        .map(|a| a.replace('.', "").to_ascii_uppercase())
        .collect()
});

static RE_ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"&[a-z]+;").unwrap());
static RE_DOTTED_INITIALS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]\.[A-Z]").unwrap());

fn letters_upper(word: &str) -> String {
    word.chars()
        .filter(char::is_ascii_alphabetic)
        .collect::<String>()
        .to_ascii_uppercase()
}

fn is_acronym(word: &str) -> bool {
    let bare = RE_ENTITY.replace_all(word, "");
    ACRONYMS.contains(&letters_upper(&bare)) || RE_DOTTED_INITIALS.is_match(word)
}

/// A word closes a sentence when it ends in `.`, `?` or `!` (ignoring
/// trailing commas and quotes) and is not a run of dotted initials.
fn ends_sentence(word: &str) -> bool {
    let stripped = word
        .trim_end_matches(',')
        .trim_end_matches('"')
        .trim_end_matches('\'');
    stripped.ends_with(['.', '?', '!']) && !RE_DOTTED_INITIALS.is_match(stripped)
}

/// At least four letters, and more than 70 % of them uppercase.
pub fn is_all_caps(text: &str) -> bool {
    let (letters, upper) = text
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(n, u), c| (n + 1, u + c.is_uppercase() as usize));
    letters >= 4 && upper as f64 / letters as f64 > 0.7
}

/// Uppercase the first alphabetic character, leaving leading punctuation alone.
///
/// ```
/// use corpus_press::cleanup::capitalize_first;
/// assert_eq!(capitalize_first("\"the"), "\"The");
/// ```
pub fn capitalize_first(word: &str) -> String {
    match word.char_indices().find(|(_, c)| c.is_alphabetic()) {
        Some((i, c)) => {
            let mut out = String::with_capacity(word.len());
            out.push_str(&word[..i]);
            out.extend(c.to_uppercase());
            out.push_str(&word[i + c.len_utf8()..]);
            out
        }
        None => word.to_string(),
    }
}

/// Sentence case for ALL CAPS prose. Text that is not all caps is returned as-is.
///
/// Known acronyms and dotted initials keep their case. Whitespace between
/// words collapses to single spaces.
pub fn sentence_case(text: &str) -> String {
    if !is_all_caps(text) {
        return text.to_string();
    }

    let mut out: Vec<String> = Vec::new();
    let mut sentence_start = true;

    for (i, word) in text.split_whitespace().enumerate() {
        if is_acronym(word) {
            out.push(word.to_string());
            sentence_start = ends_sentence(word);
            continue;
        }

        let mut lower = word.to_lowercase();
        if sentence_start || i == 0 {
            lower = capitalize_first(&lower);
            sentence_start = false;
        }
        out.push(lower);

        if ends_sentence(word) {
            sentence_start = true;
        }
    }

    out.join(" ")
}

/// Title case for an ALL CAPS title. Text that is not all caps is returned as-is.
pub fn title_case_smart(text: &str) -> String {
    if !is_all_caps(text) {
        return text.to_string();
    }

    text.split_whitespace()
        .enumerate()
        .map(|(i, word)| {
            if is_acronym(word) {
                return word.to_string();
            }
            let lower = word.to_lowercase();
            if i == 0 || !TITLE_LOWER.contains(&lower.as_str()) {
                capitalize_first(&lower)
            } else {
                lower
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
