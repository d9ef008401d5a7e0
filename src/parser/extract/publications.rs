use std::sync::LazyLock;

use regex::Regex;

use super::{Context, PublicationRecord, SkipReason};
use crate::parser::classify::YEAR_RE;
use crate::parser::digest::PageMeta;
use crate::parser::text::truncate_chars;
use crate::site::Document;

static AUTHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:written by|by|authors?)[:\s]+([^.]+)").unwrap());
static AUTHOR_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[,&]").unwrap());

pub fn extract(doc: &Document, ctx: &Context<'_>) -> Result<PublicationRecord, SkipReason> {
    let html = ctx.source.page(&doc.slug).ok_or(SkipReason::MissingSource)?;
    let meta = PageMeta::from_html(&html);

    let title = clean_title(&meta.title, &ctx.rules.title_suffix);
    let year = YEAR_RE
        .find(&title)
        .and_then(|m| m.as_str().parse::<i32>().ok());
    let authors = parse_authors(&meta.main_text);

    Ok(PublicationRecord {
        id: doc.slug.clone(),
        title,
        slug: doc.slug.clone(),
        description: meta.description,
        content: truncate_chars(&meta.main_html, ctx.rules.max_text_chars),
        year,
        authors,
        url: ctx.settings.item_url(&doc.slug),
        date: None,
        category: "publication".to_string(),
    })
}

/// Page title without the site-name suffix.
pub fn clean_title(title: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        return title.trim().to_string();
    }
    title.replacen(suffix, "", 1).trim().to_string()
}

/// Best-effort author list from phrases like "by A, B & C".
pub fn parse_authors(text: &str) -> Vec<String> {
    let Some(caps) = AUTHOR_RE.captures(text) else {
        return Vec::new();
    };
    AUTHOR_SPLIT_RE
        .split(&caps[1])
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    const SUFFIX: &str = " - Banded Mongoose Research Project";

    #[test]
    fn scenario_population_dynamics() {
        let html = "<html><head><title>Population Dynamics - Banded Mongoose Research Project</title></head><body><p>Published by Jane Doe, John Smith.</p></body></html>";
        let fx = Fixture::new().page("population-dynamics", html);
        let d = doc("population-dynamics", "Population Dynamics", &[]);
        let p = extract(&d, &fx.ctx()).unwrap();
        assert_eq!(p.title, "Population Dynamics");
        assert_eq!(p.year, None);
        assert_eq!(p.authors, ["Jane Doe", "John Smith"]);
        assert_eq!(p.description, "");
        assert_eq!(p.category, "publication");
        assert_eq!(p.url, "/pubs-news-ppl/population-dynamics");
    }

    #[test]
    fn year_from_title_and_meta_description() {
        let html = r#"<html><head><title>Helping in 2016 - Banded Mongoose Research Project</title>
            <meta name="description" content="Cooperative care."></head>
            <body><div id="main"><p>Authors: Cant &amp; Nichols.</p></div><footer>Mongoose videos by Someone</footer></body></html>"#;
        let fx = Fixture::new().page("helping", html);
        let p = extract(&doc("helping", "", &[]), &fx.ctx()).unwrap();
        assert_eq!(p.title, "Helping in 2016");
        assert_eq!(p.year, Some(2016));
        assert_eq!(p.description, "Cooperative care.");
        assert_eq!(p.authors, ["Cant", "Nichols"]);
        assert!(p.content.starts_with("<p>Authors:"));
    }

    #[test]
    fn author_names_keep_nav_words() {
        let html = "<html><head><title>Dispersal - Banded Mongoose Research Project</title></head><body><p>Published by Ann Newsome &amp; Bob Peoples.</p></body></html>";
        let fx = Fixture::new().page("dispersal", html);
        let p = extract(&doc("dispersal", "", &[]), &fx.ctx()).unwrap();
        assert_eq!(p.authors, ["Ann Newsome", "Bob Peoples"]);
    }

    #[test]
    fn no_author_phrase_is_empty_list() {
        assert!(parse_authors("A study of cooperative breeding.").is_empty());
        assert!(parse_authors("").is_empty());
    }

    #[test]
    fn author_phrase_variants() {
        assert_eq!(parse_authors("Written by A. Smith"), ["A"]);
        assert_eq!(parse_authors("author: Faye Thompson & Hazel Nichols."), ["Faye Thompson", "Hazel Nichols"]);
        // "by" inside a word does not count.
        assert!(parse_authors("The hobby farm.").is_empty());
    }

    #[test]
    fn title_suffix_stripped_once() {
        assert_eq!(clean_title("  Paper - Banded Mongoose Research Project ", SUFFIX), "Paper");
        assert_eq!(clean_title("Paper", SUFFIX), "Paper");
        assert_eq!(clean_title(" Paper ", ""), "Paper");
    }

    #[test]
    fn content_bounded() {
        let body = "x".repeat(7000);
        let html = format!("<html><head><title>T</title></head><body><div id=\"main\">{}</div></body></html>", body);
        let fx = Fixture::new().page("big", &html);
        let p = extract(&doc("big", "", &[]), &fx.ctx()).unwrap();
        assert_eq!(p.content.chars().count(), 5000);
        assert!(body.starts_with(&p.content));
    }

    #[test]
    fn missing_page_is_skipped() {
        let fx = Fixture::new();
        assert_eq!(extract(&doc("gone", "", &[]), &fx.ctx()), Err(SkipReason::MissingSource));
    }
}
