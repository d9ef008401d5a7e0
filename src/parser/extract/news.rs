use chrono::{DateTime, TimeZone, Utc};

use super::{Context, NewsRecord, SkipReason};
use crate::parser::classify::YEAR_RE;
use crate::parser::text::truncate_chars;
use crate::site::Document;

pub fn extract(doc: &Document, ctx: &Context<'_>) -> Result<NewsRecord, SkipReason> {
    if !ctx.rules.is_news_slug(&doc.slug) {
        return Err(SkipReason::NotAllowListed);
    }
    let html = ctx.source.page(&doc.slug).ok_or(SkipReason::MissingSource)?;
    let description = truncate_chars(&ctx.normalizer.normalize(&html), ctx.rules.max_text_chars);

    Ok(NewsRecord {
        id: doc.slug.clone(),
        slug: doc.slug.clone(),
        title: doc.digest.h1().to_string(),
        date: first_year_date(&doc.digest.paragraphs),
        body: description.clone(),
        description,
        url: ctx.settings.item_url(&doc.slug),
        image: None,
    })
}

/// January 1st (UTC midnight) of the first year mentioned in `paragraphs`.
pub fn first_year_date(paragraphs: &[String]) -> Option<DateTime<Utc>> {
    let year = paragraphs
        .iter()
        .find_map(|p| YEAR_RE.find(p))
        .and_then(|m| m.as_str().parse::<i32>().ok())?;
    Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()
}
