use std::collections::BTreeMap;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use super::text::flatten;

/// Structural summary of one page: heading text by level plus paragraphs.
/// Serialized in the site-index shape (`{"h1": [...], "h2": [...], "p": [...]}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawDigest", into = "RawDigest")]
pub struct Digest {
    pub headings: BTreeMap<u8, Vec<String>>,
    pub paragraphs: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawDigest {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    h1: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    h2: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    h3: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    h4: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    h5: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    h6: Vec<String>,
    #[serde(default)]
    p: Vec<String>,
}

impl From<RawDigest> for Digest {
    fn from(raw: RawDigest) -> Self {
        let headings = [raw.h1, raw.h2, raw.h3, raw.h4, raw.h5, raw.h6]
            .into_iter()
            .zip(1u8..)
            .filter(|(texts, _)| !texts.is_empty())
            .map(|(texts, level)| (level, texts))
            .collect();
        Digest {
            headings,
            paragraphs: raw.p,
        }
    }
}

impl From<Digest> for RawDigest {
    fn from(mut digest: Digest) -> Self {
        let mut take = |level: u8| digest.headings.remove(&level).unwrap_or_default();
        RawDigest {
            h1: take(1),
            h2: take(2),
            h3: take(3),
            h4: take(4),
            h5: take(5),
            h6: take(6),
            p: digest.paragraphs,
        }
    }
}

impl Digest {
    pub fn headings(&self, level: u8) -> &[String] {
        self.headings.get(&level).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First first-level heading, or empty.
    pub fn h1(&self) -> &str {
        self.headings(1).first().map(String::as_str).unwrap_or("")
    }

    /// Digest built straight from page markup, used when no site index exists.
    pub fn from_html(html: &str) -> Self {
        let document = Html::parse_document(html);
        let mut headings: BTreeMap<u8, Vec<String>> = BTreeMap::new();
        let mut paragraphs = Vec::new();

        let selector = Selector::parse("h1, h2, h3, h4, h5, h6, p").unwrap();
        for element in document.select(&selector) {
            let text = element_text(&element);
            if text.is_empty() {
                continue;
            }
            match element.value().name() {
                "p" => paragraphs.push(text),
                tag => {
                    if let Ok(level) = tag[1..].parse::<u8>() {
                        headings.entry(level).or_default().push(text);
                    }
                }
            }
        }

        Digest {
            headings,
            paragraphs,
        }
    }
}

/// Page-level metadata used by the publication extractor.
#[derive(Debug, Clone, Default)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    /// Inner HTML of `#main`, else `<body>`.
    pub main_html: String,
    /// Flattened text of the same region.
    pub main_text: String,
}

impl PageMeta {
    pub fn from_html(html: &str) -> Self {
        let document = Html::parse_document(html);
        let title_sel = Selector::parse("title").unwrap();
        let meta_sel = Selector::parse(r#"meta[name="description"]"#).unwrap();
        let main_sel = Selector::parse("#main").unwrap();
        let body_sel = Selector::parse("body").unwrap();

        let title = document
            .select(&title_sel)
            .next()
            .map(|t| t.text().collect::<String>())
            .unwrap_or_default();
        let description = document
            .select(&meta_sel)
            .next()
            .and_then(|m| m.value().attr("content"))
            .unwrap_or_default()
            .to_string();
        let region = document
            .select(&main_sel)
            .next()
            .or_else(|| document.select(&body_sel).next());
        let (main_html, main_text) = region
            .map(|r| (r.inner_html(), element_text(&r)))
            .unwrap_or_default();

        PageMeta {
            title,
            description,
            main_html,
            main_text,
        }
    }
}

fn element_text(element: &ElementRef<'_>) -> String {
    // Join text nodes with spaces so adjacent blocks don't fuse into one word.
    let raw = element.text().collect::<Vec<_>>().join(" ");
    flatten(&raw)
}
