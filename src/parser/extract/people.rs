use tracing::debug;

use super::{Context, PersonRecord, SkipReason};
use crate::config::Rules;
use crate::parser::graph::StructuredGraph;
use crate::parser::text::truncate_chars;
use crate::site::Document;

/// Name and position recovered from the listing page's structured data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PersonMatch {
    pub name: Option<String>,
    pub position: Option<String>,
}

pub fn extract(doc: &Document, ctx: &Context<'_>) -> Result<PersonRecord, SkipReason> {
    let html = ctx.source.page(&doc.slug).ok_or(SkipReason::MissingSource)?;
    let h1 = doc.digest.h1();

    let mut name = h1.to_string();
    let mut position = None;
    if let Some(found) = ctx.people.and_then(|g| lookup(g, &doc.slug, ctx.rules)) {
        debug!(slug = %doc.slug, ?found, "Person resolved from structured data");
        name = found.name.unwrap_or_else(|| h1.to_string());
        position = found.position;
    }

    // Headings like "Professor" are a role, not a name.
    if position.is_none() && ctx.rules.has_role_keyword(h1) {
        position = Some(h1.to_string());
    }

    let description = truncate_chars(&ctx.normalizer.normalize(&html), ctx.rules.max_text_chars);

    Ok(PersonRecord {
        id: doc.slug.clone(),
        slug: doc.slug.clone(),
        title: name,
        link: None,
        position,
        category: None,
        body: description.clone(),
        description,
        image: None,
        url: ctx.settings.item_url(&doc.slug),
    })
}

/// Find the person record whose slug field resolves to `slug`.
pub fn lookup(graph: &StructuredGraph, slug: &str, rules: &Rules) -> Option<PersonMatch> {
    let slug_key = rules.person_slug_key.as_str();
    let name_key = rules.person_name_key.as_str();

    let record = graph.find_record(|node| {
        node.has_fields(&[slug_key, name_key])
            && node
                .field(slug_key)
                .and_then(|r| graph.resolve(r).as_text())
                .is_some_and(|s| s == slug)
    })?;

    let text_of = |key: &str| {
        record
            .field(key)
            .and_then(|r| graph.resolve(r).as_text())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Some(PersonMatch {
        name: text_of(name_key),
        position: text_of(&rules.person_position_key),
    })
}
