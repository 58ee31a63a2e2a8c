//! Detectors for paragraphs that are OCR debris rather than document text.
//!
//! Scans of speeches saved from web pages carry page numbers, browser chrome,
//! URL headers repeated on every page, press-office disclaimers and runs of
//! garbled capitals. Each detector takes the plain (tag-free, unescaped) text
//! of one paragraph.

use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};

static RE_PAGE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,3}$").unwrap());

/// Start-anchored patterns; a paragraph matching any of them is noise.
static NOISE_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        // punctuation only
        r"^[;:.,\-=+*|]+$",
        // common OCR garbage
        r"^[oeao0O\s\-=]+$",
        r"^\d{1,3}$",
        r"^\s*$",
        // short garbled text ("oo 85 oy", "a = oe")
        r"^[a-z\d\s\-=+.,]{2,8}$",
        // timestamps from saved web pages ("6/12/2025, 10:48 PM", "1 of 12 6/12/2025")
        r"^\d{1,2}/\d{1,2}/\d{4},?\s*\d{1,2}:\d{2}\s*(AM|PM)?$",
        r"^\d{1,2}\s+of\s+\d{1,3}\s+\d{1,2}/\d{1,2}/\d{4}",
        // reader-mode chrome
        r"^.*Open\s*in\s*Reader",
        r"^.*Auto highlighting",
        r"^R\|.*Q[-+]",
        // URL-only lines
        r"^.*https?://\S+\.(htm|html|org|com|gov|pdf)\s*$",
        r"^.*https?:/[A-Za-z]\S+\.(htm|html|org|com|gov)\S*\s*$",
        // lines with no lowercase at all
        r"^[A-Z\s,.\-;:©®@>\d()]+$",
        // website banners
        r"^.*[Ll][ée]aders\.org",
        r"^Growing Leaders for the Public Service$",
        // social-media residue
        r"^@\s*\d+\s*O\s*\d+.*Share",
        r"^\.\s*\d\)\s*ae\s+ise\s+gettyimages",
        r"^G\d+\s+claude\s+berube",
    ])
    .unwrap()
});

/// Searched anywhere in the lowercased paragraph.
static BOILERPLATE_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"this speech reflects the views",
        r"does not\s+.*necessarily reflect the views",
        r"copyright\s+\d{4}",
        r"copyricht\s+\d{4}",
        r"no permission needed for newspaper",
        r"above copyright notice",
        r"if most of speech reprinted",
        r"department of the navy",
        r"department of energy",
        r"for official use only",
        r"not for publication",
        r"embargoed.*until",
        r"advance\s+text",
        r"delivery\s*copy",
        r"check\s+against\s+delivery",
        r"as\s+prepared\s+for\s+delivery",
    ])
    .unwrap()
});

static RE_HEADER_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://?[A-Za-z]?\S+\.(htm|html|org|com|gov)").unwrap());
static RE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());

/// A bare page number, or a tiny fragment with at most one letter.
pub fn is_page_number(text: &str) -> bool {
    let s = text.trim();
    if RE_PAGE_NUMBER.is_match(s) {
        return true;
    }
    s.chars().count() <= 4 && s.chars().filter(|c| c.is_alphabetic()).count() <= 1
}

/// OCR garbage, reader-mode chrome, timestamps, URL lines, banners.
pub fn is_ocr_noise(text: &str) -> bool {
    let s = text.trim();
    let is_word = !s.is_empty() && s.chars().all(char::is_alphabetic);
    (s.chars().count() <= 3 && !is_word) || NOISE_PATTERNS.is_match(s)
}

/// A title-plus-URL line repeated at the top of every page of a saved web page.
pub fn is_repeated_header(text: &str) -> bool {
    let s = text.trim();
    if !RE_HEADER_URL.is_match(s) {
        return false;
    }
    match RE_URL.find(s) {
        Some(url) => {
            let rest = s[..url.start()].trim().chars().count() + s[url.end()..].trim().chars().count();
            rest < 100
        }
        None => false,
    }
}

/// Disclaimers, copyright notices and delivery notes.
pub fn is_boilerplate(text: &str) -> bool {
    BOILERPLATE_PATTERNS.is_match(&text.trim().to_lowercase())
}

/// Four or more consecutive all-caps words of at least four letters.
pub fn has_garbled_caps(text: &str) -> bool {
    let mut run = 0;
    for word in text.split_whitespace() {
        let letters: Vec<char> = word.chars().filter(char::is_ascii_alphabetic).collect();
        if letters.len() >= 4 && letters.iter().all(char::is_ascii_uppercase) {
            run += 1;
            if run >= 4 {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}
