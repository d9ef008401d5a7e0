use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::parser::digest::Digest;

/// One candidate item page. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub slug: String,
    pub digest: Digest,
}

/// Read access to raw item pages by slug.
pub trait PageSource {
    /// `None` when the page does not exist or cannot be read.
    fn page(&self, slug: &str) -> Option<String>;
}

/// Item pages on disk under the configured items directory.
pub struct SiteFiles<'a> {
    settings: &'a Settings,
}

impl<'a> SiteFiles<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        SiteFiles { settings }
    }
}

impl PageSource for SiteFiles<'_> {
    fn page(&self, slug: &str) -> Option<String> {
        let path = self.settings.item_file(slug);
        read_optional(&path)
    }
}

/// Read a file that may legitimately be absent.
pub fn read_optional(path: &Path) -> Option<String> {
    if !path.exists() {
        debug!("Missing source: {}", path.display());
        return None;
    }
    match fs::read_to_string(path) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            None
        }
    }
}

/// URL path → digest, in the order the index lists them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteIndex {
    pub entries: Vec<(String, Digest)>,
}

impl SiteIndex {
    /// Parse an index file. Entries whose digest is malformed are dropped.
    pub fn parse(json: &str) -> Result<Self> {
        let map: Map<String, Value> =
            serde_json::from_str(json).context("Site index is not a JSON object")?;
        let entries = map
            .into_iter()
            .filter_map(|(url, value)| match serde_json::from_value::<Digest>(value) {
                Ok(digest) => Some((url, digest)),
                Err(e) => {
                    warn!("Skipping index entry {}: {}", url, e);
                    None
                }
            })
            .collect();
        Ok(SiteIndex { entries })
    }

    /// Load the cached index, treating absence or corruption as "no index".
    pub fn load(path: &Path) -> Option<Self> {
        let raw = read_optional(path)?;
        match Self::parse(&raw) {
            Ok(index) => {
                info!("Loaded site index {} ({} entries)", path.display(), index.entries.len());
                Some(index)
            }
            Err(e) => {
                warn!("Ignoring site index {}: {:#}", path.display(), e);
                None
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut map = Map::new();
        for (url, digest) in &self.entries {
            map.insert(url.clone(), serde_json::to_value(digest)?);
        }
        let json = serde_json::to_string_pretty(&Value::Object(map))?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Item documents: entries under `prefix`, slug taken from the path tail.
    pub fn documents(&self, prefix: &str) -> Vec<Document> {
        self.entries
            .iter()
            .filter_map(|(url, digest)| {
                let slug = slug_from_url(url, prefix)?;
                Some(Document {
                    slug,
                    digest: digest.clone(),
                })
            })
            .collect()
    }
}

/// `/pubs-news-ppl/mike-cant.html` → `mike-cant`.
pub fn slug_from_url(url: &str, prefix: &str) -> Option<String> {
    let (_, rest) = url.split_once(prefix)?;
    let slug = rest.trim_end_matches('/');
    let slug = slug.strip_suffix(".html").unwrap_or(slug);
    if slug.is_empty() {
        None
    } else {
        Some(slug.to_string())
    }
}

/// Every `*.html` page in the items directory, sorted by file name, with a
/// digest parsed from its markup. A missing directory yields no documents.
pub fn scan_items(settings: &Settings) -> Vec<Document> {
    let dir = settings.items_path();
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot list {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "html"))
        .collect();
    paths.sort();

    paths
        .into_iter()
        .filter_map(|path| {
            let slug = path.file_stem()?.to_str()?.to_string();
            let html = read_optional(&path)?;
            let digest = Digest::from_html(&html);
            Some(Document { slug, digest })
        })
        .collect()
}

/// Index built from the items directory, keyed by canonical item URL.
pub fn build_index(settings: &Settings) -> SiteIndex {
    let entries = scan_items(settings)
        .into_iter()
        .map(|doc| (settings.item_url(&doc.slug), doc.digest))
        .collect();
    SiteIndex { entries }
}

/// Create the output directory. Failure here aborts the run.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create output directory {}", path.display()))
}

/// Write `items` as a pretty-printed JSON array to `dir/name`.
pub fn write_collection<T: Serialize>(dir: &Path, name: &str, items: &[T]) -> Result<PathBuf> {
    let path = dir.join(name);
    let json = serde_json::to_string_pretty(items)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_settings() -> Settings {
        Settings::default().with_dirs(Some(Path::new("tests/fixtures/site")), None)
    }

    #[test]
    fn slug_extraction() {
        let p = "/pubs-news-ppl/";
        assert_eq!(slug_from_url("/pubs-news-ppl/mike-cant", p).as_deref(), Some("mike-cant"));
        assert_eq!(slug_from_url("/pubs-news-ppl/new-grant.html", p).as_deref(), Some("new-grant"));
        assert_eq!(slug_from_url("https://example.org/pubs-news-ppl/x/", p).as_deref(), Some("x"));
        assert_eq!(slug_from_url("/people", p), None);
        assert_eq!(slug_from_url("/pubs-news-ppl/", p), None);
    }

    #[test]
    fn index_keeps_order_and_filters_prefix() {
        let json = r#"{
            "/pubs-news-ppl/zeta": {"h1": ["Zeta"]},
            "/people": {"h1": ["People"]},
            "/pubs-news-ppl/alpha": {"h1": ["Alpha"], "p": ["In 2020."]}
        }"#;
        let index = SiteIndex::parse(json).unwrap();
        let docs = index.documents("/pubs-news-ppl/");
        let slugs: Vec<&str> = docs.iter().map(|d| d.slug.as_str()).collect();
        assert_eq!(slugs, ["zeta", "alpha"]);
        assert_eq!(docs[1].digest.paragraphs, ["In 2020."]);
    }

    #[test]
    fn malformed_entry_dropped() {
        let json = r#"{"/pubs-news-ppl/a": {"h1": "not a list"}, "/pubs-news-ppl/b": {}}"#;
        let index = SiteIndex::parse(json).unwrap();
        assert_eq!(index.entries.len(), 1);
        assert_eq!(index.entries[0].0, "/pubs-news-ppl/b");
    }

    #[test]
    fn malformed_index_is_error() {
        assert!(SiteIndex::parse("[1, 2]").is_err());
        assert!(SiteIndex::parse("{nope").is_err());
    }

    #[test]
    fn missing_index_is_none() {
        assert!(SiteIndex::load(Path::new("tests/fixtures/does-not-exist.json")).is_none());
    }

    #[test]
    fn site_files_missing_page() {
        let settings = fixture_settings();
        let files = SiteFiles::new(&settings);
        assert!(files.page("mike-cant").is_some());
        assert!(files.page("not-a-page").is_none());
    }

    #[test]
    fn scan_sorted_html_only() {
        let settings = fixture_settings();
        let docs = scan_items(&settings);
        let slugs: Vec<&str> = docs.iter().map(|d| d.slug.as_str()).collect();
        let mut sorted = slugs.clone();
        sorted.sort();
        assert_eq!(slugs, sorted);
        assert!(slugs.contains(&"mike-cant"));
        assert!(!slugs.iter().any(|s| s.ends_with(".txt")));
    }

    #[test]
    fn scan_missing_dir_is_empty() {
        let settings = Settings::default().with_dirs(Some(Path::new("tests/fixtures/nowhere")), None);
        assert!(scan_items(&settings).is_empty());
    }

    #[test]
    fn index_round_trips_through_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("searchIndex.json");
        let index = build_index(&fixture_settings());
        assert!(!index.entries.is_empty());
        index.save(&path).unwrap();
        let loaded = SiteIndex::load(&path).unwrap();
        assert_eq!(loaded, index);
    }

    #[test]
    fn write_collection_pretty_array() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_collection(dir.path(), "news.json", &["a", "b"]).unwrap();
        let raw = fs::read_to_string(path).unwrap();
        assert_eq!(raw, "[\n  \"a\",\n  \"b\"\n]");
    }
}
