use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use super::digest::Digest;
use crate::config::Rules;

pub static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

const MAX_PERSON_HEADING_CHARS: usize = 50;
const MIN_AUTHOR_HEADING_CHARS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Person,
    News,
    Publication,
    Unknown,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Person => "person",
            Category::News => "news",
            Category::Publication => "publication",
            Category::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Signals shared by the heuristic rules, computed once per document.
pub struct Signals<'a> {
    pub slug: &'a str,
    pub h1: &'a str,
    pub has_author_heading: bool,
    pub has_year: bool,
}

impl<'a> Signals<'a> {
    pub fn new(slug: &'a str, digest: &'a Digest, rules: &Rules) -> Self {
        let has_author_heading = digest.headings(2).iter().any(|h| {
            h.contains(rules.author_glyph) && h.chars().count() > MIN_AUTHOR_HEADING_CHARS
        });
        let has_year = digest.paragraphs.iter().any(|p| YEAR_RE.is_match(p));
        Signals {
            slug,
            h1: digest.h1(),
            has_author_heading,
            has_year,
        }
    }
}

pub type Rule = fn(&Signals<'_>, &Rules) -> Option<Category>;

/// Evaluated in order; the first rule returning a category wins.
/// Allow-lists come before every structural heuristic.
pub const RULES: &[(&str, Rule)] = &[
    ("news-allow-list", news_allow_list),
    ("people-allow-list", people_allow_list),
    ("author-heading", author_heading),
    ("dated-paragraph", dated_paragraph),
    ("short-heading", short_heading),
];

pub fn classify(slug: &str, digest: &Digest, rules: &Rules) -> Category {
    let signals = Signals::new(slug, digest, rules);
    RULES
        .iter()
        .find_map(|(_, rule)| rule(&signals, rules))
        .unwrap_or(Category::Unknown)
}

fn news_allow_list(s: &Signals<'_>, rules: &Rules) -> Option<Category> {
    rules.is_news_slug(s.slug).then_some(Category::News)
}

fn people_allow_list(s: &Signals<'_>, rules: &Rules) -> Option<Category> {
    rules.is_people_slug(s.slug).then_some(Category::Person)
}

fn author_heading(s: &Signals<'_>, _: &Rules) -> Option<Category> {
    s.has_author_heading.then_some(Category::Publication)
}

fn dated_paragraph(s: &Signals<'_>, _: &Rules) -> Option<Category> {
    (s.has_year && !s.has_author_heading).then_some(Category::News)
}

fn short_heading(s: &Signals<'_>, _: &Rules) -> Option<Category> {
    (s.h1.chars().count() < MAX_PERSON_HEADING_CHARS && !s.has_year && !s.has_author_heading)
        .then_some(Category::Person)
}
