use std::path::{Path, PathBuf};

use anyhow::Result;
use config::Config;
use serde::Deserialize;

const DEFAULT_SITE_DIR: &str = "site";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_ITEMS_DIR: &str = "pubs-news-ppl";
const DEFAULT_PEOPLE_PAGE: &str = "people.html";
const DEFAULT_INDEX_FILE: &str = "searchIndex.json";

pub const NEWS_SLUGS: &[&str] = &[
    "new-grant",
    "new-funding-from-germany",
    "pioneering-next-generation-animal-tracking",
];

pub const PEOPLE_SLUGS: &[&str] = &[
    "mike-cant", "field-manager", "assistant-professor", "professor",
    "hazel-nichols", "faye-thompson", "emma-vitikainen", "laura-labarge",
    "leela-channer", "graham-birch", "neil-jordan", "monil-khera",
    "nikita-bedov-panasyuk", "dave-seager", "dr-michelle-hares", "dr-harry-marshall",
    "beth-preston", "catherine-sheppard", "jennifer-sanderson", "joe-hoffman",
    "dan-franks", "rufus-johnstone", "zoe-turner", "olivier-carter",
    "rahul-jaitly", "megan-nicholl", "erica-sininärhi", "patrick-green",
];

pub const ROLE_KEYWORDS: &[&str] = &[
    "professor", "student", "lecturer", "manager", "fellow", "director", "chair",
];

/// Site-wide chrome removed from page bodies before sentence filtering.
/// Each entry is a case-insensitive regex.
pub const BOILERPLATE_PATTERNS: &[&str] = &[
    r"←\s*Back to Home",
    r"Mongoose videos by[^\n]+",
    r"\d{4} BMPR\. All rights reserved\.",
    r"About|People|Research|News|Publications|Contact",
];

pub const AUTHOR_GLYPH: char = '‹';
pub const TITLE_SUFFIX: &str = " - Banded Mongoose Research Project";

/// Opaque field keys the site builder uses for person records in the
/// listing page's structured data.
pub const PERSON_SLUG_KEY: &str = "TAIvpALDu";
pub const PERSON_NAME_KEY: &str = "Hohw1kgab";
pub const PERSON_POSITION_KEY: &str = "MY38jWI86";

pub const MAX_TEXT_CHARS: usize = 5000;
pub const MIN_SENTENCE_CHARS: usize = 50;
pub const GRAPH_DEPTH_LIMIT: usize = 15;

/// Filesystem locations for one run. Environment variables prefixed with
/// `CMS_` (e.g. `CMS_SITE_DIR`) override the defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub site_dir: PathBuf,
    pub data_dir: PathBuf,
    pub items_dir: String,
    pub people_page: String,
    pub index_file: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            site_dir: PathBuf::from(DEFAULT_SITE_DIR),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            items_dir: DEFAULT_ITEMS_DIR.to_string(),
            people_page: DEFAULT_PEOPLE_PAGE.to_string(),
            index_file: DEFAULT_INDEX_FILE.to_string(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .set_default("site_dir", DEFAULT_SITE_DIR)?
            .set_default("data_dir", DEFAULT_DATA_DIR)?
            .set_default("items_dir", DEFAULT_ITEMS_DIR)?
            .set_default("people_page", DEFAULT_PEOPLE_PAGE)?
            .set_default("index_file", DEFAULT_INDEX_FILE)?
            .add_source(config::Environment::with_prefix("CMS"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Directory holding one HTML file per item.
    pub fn items_path(&self) -> PathBuf {
        self.site_dir.join(&self.items_dir)
    }

    pub fn people_page_path(&self) -> PathBuf {
        self.site_dir.join(&self.people_page)
    }

    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join(&self.index_file)
    }

    /// URL path segment that marks an index entry as an item page.
    pub fn items_prefix(&self) -> String {
        format!("/{}/", self.items_dir)
    }

    pub fn item_url(&self, slug: &str) -> String {
        format!("{}{}", self.items_prefix(), slug)
    }

    pub fn item_file(&self, slug: &str) -> PathBuf {
        self.items_path().join(format!("{}.html", slug))
    }

    pub fn with_dirs(mut self, site_dir: Option<&Path>, data_dir: Option<&Path>) -> Self {
        if let Some(dir) = site_dir {
            self.site_dir = dir.to_path_buf();
        }
        if let Some(dir) = data_dir {
            self.data_dir = dir.to_path_buf();
        }
        self
    }
}

/// Curated lists and thresholds driving classification and extraction.
#[derive(Debug, Clone)]
pub struct Rules {
    pub news_slugs: Vec<String>,
    pub people_slugs: Vec<String>,
    pub role_keywords: Vec<String>,
    pub boilerplate: Vec<String>,
    pub author_glyph: char,
    pub title_suffix: String,
    pub person_slug_key: String,
    pub person_name_key: String,
    pub person_position_key: String,
    pub max_text_chars: usize,
    pub min_sentence_chars: usize,
    pub graph_depth_limit: usize,
}

impl Default for Rules {
    fn default() -> Self {
        let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Rules {
            news_slugs: owned(NEWS_SLUGS),
            people_slugs: owned(PEOPLE_SLUGS),
            role_keywords: owned(ROLE_KEYWORDS),
            boilerplate: owned(BOILERPLATE_PATTERNS),
            author_glyph: AUTHOR_GLYPH,
            title_suffix: TITLE_SUFFIX.to_string(),
            person_slug_key: PERSON_SLUG_KEY.to_string(),
            person_name_key: PERSON_NAME_KEY.to_string(),
            person_position_key: PERSON_POSITION_KEY.to_string(),
            max_text_chars: MAX_TEXT_CHARS,
            min_sentence_chars: MIN_SENTENCE_CHARS,
            graph_depth_limit: GRAPH_DEPTH_LIMIT,
        }
    }
}

impl Rules {
    pub fn is_news_slug(&self, slug: &str) -> bool {
        self.news_slugs.iter().any(|s| s == slug)
    }

    pub fn is_people_slug(&self, slug: &str) -> bool {
        self.people_slugs.iter().any(|s| s == slug)
    }

    pub fn has_role_keyword(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.role_keywords.iter().any(|kw| lower.contains(kw.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths() {
        let s = Settings::default();
        assert_eq!(s.items_path(), PathBuf::from("site/pubs-news-ppl"));
        assert_eq!(s.index_path(), PathBuf::from("data/searchIndex.json"));
        assert_eq!(s.item_url("mike-cant"), "/pubs-news-ppl/mike-cant");
        assert_eq!(
            s.item_file("mike-cant"),
            PathBuf::from("site/pubs-news-ppl/mike-cant.html")
        );
    }

    #[test]
    fn cli_dirs_override() {
        let s = Settings::default().with_dirs(Some(Path::new("/tmp/site")), None);
        assert_eq!(s.site_dir, PathBuf::from("/tmp/site"));
        assert_eq!(s.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn role_keywords_case_insensitive() {
        let rules = Rules::default();
        assert!(rules.has_role_keyword("Assistant Professor"));
        assert!(rules.has_role_keyword("PhD Student"));
        assert!(!rules.has_role_keyword("Mike Cant"));
    }

    #[test]
    fn allow_lists() {
        let rules = Rules::default();
        assert!(rules.is_news_slug("new-grant"));
        assert!(rules.is_people_slug("erica-sininärhi"));
        assert!(!rules.is_people_slug("new-grant"));
    }
}
