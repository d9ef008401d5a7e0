pub mod classify;
pub mod digest;
pub mod extract;
pub mod graph;
pub mod text;

use classify::Category;
use extract::{Context, ExtractedRecord, SkipReason};

use crate::site::Document;

/// Two-step pipeline for one document: classify from the digest, then run
/// the matching extractor. Classification never consults the raw HTML.
pub fn process_document(
    doc: &Document,
    ctx: &Context<'_>,
) -> (Category, Result<ExtractedRecord, SkipReason>) {
    let category = classify::classify(&doc.slug, &doc.digest, ctx.rules);
    let result = match category {
        Category::Unknown => Err(SkipReason::Unclassified),
        _ => extract::extract(doc, category, ctx),
    };
    (category, result)
}
