pub mod news;
pub mod people;
pub mod publications;

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use thiserror::Error;

use super::classify::Category;
use super::graph::StructuredGraph;
use super::text::Normalizer;
use crate::config::{Rules, Settings};
use crate::site::{Document, PageSource};

/// Everything an extractor may consult besides the document itself.
pub struct Context<'a> {
    pub settings: &'a Settings,
    pub rules: &'a Rules,
    pub normalizer: &'a Normalizer,
    pub source: &'a dyn PageSource,
    pub people: Option<&'a StructuredGraph>,
}

/// Why a document produced no record.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SkipReason {
    #[error("source page missing")]
    MissingSource,
    #[error("no category matched")]
    Unclassified,
    #[error("not on the news allow-list")]
    NotAllowListed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonRecord {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub link: Option<String>,
    pub position: Option<String>,
    pub category: Option<String>,
    pub description: String,
    pub image: Option<String>,
    pub url: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsRecord {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(serialize_with = "serialize_date")]
    pub date: Option<DateTime<Utc>>,
    pub description: String,
    pub body: String,
    pub url: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicationRecord {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub content: String,
    pub year: Option<i32>,
    pub authors: Vec<String>,
    pub url: String,
    pub date: Option<String>,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedRecord {
    Person(PersonRecord),
    News(NewsRecord),
    Publication(PublicationRecord),
}

/// Run the extractor matching `category`. Unknown never reaches an extractor.
pub fn extract(
    doc: &Document,
    category: Category,
    ctx: &Context<'_>,
) -> Result<ExtractedRecord, SkipReason> {
    match category {
        Category::Person => people::extract(doc, ctx).map(ExtractedRecord::Person),
        Category::News => news::extract(doc, ctx).map(ExtractedRecord::News),
        Category::Publication => {
            publications::extract(doc, ctx).map(ExtractedRecord::Publication)
        }
        Category::Unknown => Err(SkipReason::Unclassified),
    }
}

/// Output collections of one run, appended in document order.
#[derive(Debug, Default)]
pub struct Collections {
    pub people: Vec<PersonRecord>,
    pub news: Vec<NewsRecord>,
    pub publications: Vec<PublicationRecord>,
    pub skipped: BTreeMap<SkipReason, usize>,
}

impl Collections {
    pub fn push(&mut self, record: ExtractedRecord) {
        match record {
            ExtractedRecord::Person(p) => self.people.push(p),
            ExtractedRecord::News(n) => self.news.push(n),
            ExtractedRecord::Publication(p) => self.publications.push(p),
        }
    }

    pub fn skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_default() += 1;
    }

    pub fn print(&self) {
        println!(
            "Extracted {} people, {} news, {} publications.",
            self.people.len(),
            self.news.len(),
            self.publications.len(),
        );
        for (reason, count) in &self.skipped {
            println!("  skipped {:>3}: {}", count, reason);
        }
    }
}

fn serialize_date<S: Serializer>(date: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
    match date {
        Some(d) => s.serialize_some(&d.to_rfc3339_opts(SecondsFormat::Millis, true)),
        None => s.serialize_none(),
    }
}
