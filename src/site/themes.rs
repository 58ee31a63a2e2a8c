//! Theme tags assigned from title keywords.

use super::esc;

/// Lowercase title keyword → themes. The first keyword contained in the
/// lowercased title wins, so more specific keys come first.
const THEME_MAP: &[(&str, &[&str])] = &[
    ("1979 management magazine", &["Management", "Leadership"]),
    ("purpose of education", &["Education"]),
    ("some thoughts on the future", &["Government"]),
    ("accounting practices", &["Accountability", "Government"]),
    ("paper reactor memo", &["Navy", "Engineering"]),
    ("meaning of nautilus polar voyage", &["Navy"]),
    ("memo of conversation with jimmy carter", &["Government", "Navy"]),
    ("personal accountability in financial management", &["Accountability", "Government"]),
    ("humanistic technology", &["Technology", "Society"]),
    ("role of the critic", &["Society", "Education"]),
    ("lawyers versus society", &["Society", "Law"]),
    ("role of professional man", &["Society", "Work"]),
    ("energy speech at athens", &["Energy"]),
    ("nuclear power and bremerton", &["Navy", "Energy"]),
    ("rickover and education", &["Education"]),
    ("democracy and competence", &["Government", "Education"]),
    ("doing a job", &["Management", "Leadership"]),
    ("mans purpose in life", &["Society"]),
    ("what are schools for", &["Education"]),
    ("talented mind", &["Education"]),
    ("in defense of truth", &["Society", "Education"]),
    ("environmental perspective", &["Energy", "Environment"]),
    ("significance of electricity", &["Energy", "Technology"]),
    ("meaning of a university", &["Education"]),
    ("intellect in a democracy", &["Education", "Government"]),
    ("who protects the public", &["Accountability", "Government"]),
    ("summary of president nixon", &["Government", "Navy"]),
    ("administering large projects", &["Management", "Navy"]),
    ("our naval revolution", &["Navy", "Technology"]),
    ("americas goals", &["Society", "Education"]),
    ("never ending challenge", &["Navy", "Management"]),
    ("fact and fiction in american education", &["Education"]),
    ("technology and the citizen", &["Technology", "Society"]),
    ("nationsal scholastic standard", &["Education"]),
    ("freedom and the knowledge gap", &["Education", "Society"]),
    ("liberty, science, and law", &["Society", "Law"]),
    ("role of engineering in the navy", &["Navy", "Engineering"]),
    ("decline of the individual", &["Society"]),
    ("illusions cost too much", &["Navy", "Accountability"]),
    ("energy - a diminishing", &["Energy"]),
    ("business and freedom", &["Society", "Work"]),
    ("education and patriotism", &["Education"]),
];

const THEME_COLORS: &[(&str, &str)] = &[
    ("Energy", "bg-yellow-100 text-yellow-800"),
    ("Navy", "bg-blue-100 text-blue-800"),
    ("Education", "bg-green-100 text-green-800"),
    ("Management", "bg-purple-100 text-purple-800"),
    ("Leadership", "bg-purple-100 text-purple-800"),
    ("Government", "bg-red-100 text-red-800"),
    ("Technology", "bg-indigo-100 text-indigo-800"),
    ("Society", "bg-pink-100 text-pink-800"),
    ("Accountability", "bg-orange-100 text-orange-800"),
    ("Engineering", "bg-blue-100 text-blue-800"),
    ("Law", "bg-gray-100 text-gray-800"),
    ("Environment", "bg-green-100 text-green-800"),
    ("Work", "bg-purple-100 text-purple-800"),
];

const FALLBACK_COLOR: &str = "bg-gray-100 text-gray-800";

/// Themes for a title; empty when no keyword matches.
///
/// ```
/// use corpus_press::site::themes_for;
/// assert_eq!(themes_for("Doing a Job"), vec!["Management", "Leadership"]);
/// ```
pub fn themes_for(title: &str) -> Vec<String> {
    let lower = title.to_lowercase();
    THEME_MAP
        .iter()
        .find(|(key, _)| lower.contains(key))
        .map(|(_, themes)| themes.iter().map(|t| t.to_string()).collect())
        .unwrap_or_default()
}

/// Tailwind colour classes for a theme tag.
pub fn theme_color(theme: &str) -> &'static str {
    THEME_COLORS
        .iter()
        .find(|(name, _)| *name == theme)
        .map_or(FALLBACK_COLOR, |&(_, color)| color)
}

/// Year tag followed by one coloured tag per theme.
///
/// `padding` is the vertical padding class: `py-1` on posts, `py-0.5` on index cards.
pub(crate) fn tag_spans(year: &str, themes: &[String], padding: &str, year_class: &str) -> Vec<String> {
    let mut spans = vec![format!(
        "<span class=\"{year_class} px-2 {padding} rounded\">{}</span>",
        esc(year)
    )];
    spans.extend(themes.iter().map(|theme| {
        format!(
            "<span class=\"{} px-2 {padding} rounded\">{}</span>",
            theme_color(theme),
            esc(theme)
        )
    }));
    spans
}
