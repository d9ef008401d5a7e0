mod config;
mod parser;
mod site;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};

use config::{Rules, Settings};
use parser::classify::Category;
use parser::extract::{Collections, Context};
use parser::graph::StructuredGraph;
use parser::text::Normalizer;
use site::{Document, SiteFiles, SiteIndex};

#[derive(Parser)]
#[command(name = "cms_extract", about = "Static site export to CMS records")]
struct Cli {
    /// Exported site root (default: $CMS_SITE_DIR or ./site)
    #[arg(long, global = true)]
    site_dir: Option<PathBuf>,
    /// Output directory (default: $CMS_DATA_DIR or ./data)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Ignore the cached site index and parse every page
    #[arg(long, global = true)]
    no_index: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify and extract every item, writing people/news/publications JSON
    Extract,
    /// Show the category assigned to each item without writing anything
    Classify {
        /// Only show items in this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Digest every item page into the cached site index
    Index,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?.with_dirs(cli.site_dir.as_deref(), cli.data_dir.as_deref());
    let rules = Rules::default();
    debug!(?settings, "Settings loaded");

    let result = match cli.command {
        Commands::Extract => {
            site::ensure_dir(&settings.data_dir)?;
            let docs = load_documents(&settings, !cli.no_index);
            if docs.is_empty() {
                println!("No item pages found under {}.", settings.items_path().display());
            }
            println!("Extracting {} items...", docs.len());
            let collections = run_extraction(&settings, &rules, &docs);
            collections.print();
            write_outputs(&settings, &collections)
        }
        Commands::Classify { category } => {
            let docs = load_documents(&settings, !cli.no_index);
            if docs.is_empty() {
                println!("No item pages found.");
                return Ok(());
            }
            print_classification(&docs, &rules, category.as_deref());
            Ok(())
        }
        Commands::Index => {
            site::ensure_dir(&settings.data_dir)?;
            let index = site::build_index(&settings);
            let path = settings.index_path();
            index.save(&path)?;
            println!("Indexed {} pages into {}", index.entries.len(), path.display());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Candidate documents from the cached index, or from the items directory
/// when there is no usable index.
fn load_documents(settings: &Settings, use_index: bool) -> Vec<Document> {
    if use_index {
        if let Some(index) = SiteIndex::load(&settings.index_path()) {
            return index.documents(&settings.items_prefix());
        }
        info!("No site index, parsing item pages directly");
    }
    site::scan_items(settings)
}

fn load_people_graph(settings: &Settings, rules: &Rules) -> Option<StructuredGraph> {
    let html = site::read_optional(&settings.people_page_path())?;
    let graph = StructuredGraph::from_html(&html, rules.graph_depth_limit)?;
    if graph.is_empty() {
        warn!("People structured data is empty, using page headings only");
        return None;
    }
    info!("Loaded people structured data ({} entries)", graph.len());
    Some(graph)
}

/// Classify and extract documents one at a time, in order.
fn run_extraction(settings: &Settings, rules: &Rules, docs: &[Document]) -> Collections {
    use indicatif::{ProgressBar, ProgressStyle};

    let normalizer = Normalizer::new(rules);
    let files = SiteFiles::new(settings);
    let graph = load_people_graph(settings, rules);
    let ctx = Context {
        settings,
        rules,
        normalizer: &normalizer,
        source: &files,
        people: graph.as_ref(),
    };

    let pb = ProgressBar::new(docs.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let mut collections = Collections::default();
    for doc in docs {
        pb.set_message(doc.slug.clone());
        let (category, result) = parser::process_document(doc, &ctx);
        match result {
            Ok(record) => collections.push(record),
            Err(reason) => {
                debug!(slug = %doc.slug, %category, %reason, "Skipped");
                collections.skip(reason);
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    collections
}

fn write_outputs(settings: &Settings, collections: &Collections) -> anyhow::Result<()> {
    let dir = &settings.data_dir;
    let written = [
        site::write_collection(dir, "people.json", &collections.people)?,
        site::write_collection(dir, "news.json", &collections.news)?,
        site::write_collection(dir, "publications.json", &collections.publications)?,
    ];
    println!("Saved:");
    for path in &written {
        println!("  - {}", path.display());
    }
    Ok(())
}

fn print_classification(docs: &[Document], rules: &Rules, only: Option<&str>) {
    let mut totals = [0usize; 4];
    println!("{:>3} | {:<40} | {:<11} | {:<40}", "#", "Slug", "Category", "Heading");
    println!("{}", "-".repeat(102));

    let mut shown = 0;
    for doc in docs {
        let category = parser::classify::classify(&doc.slug, &doc.digest, rules);
        totals[category_slot(category)] += 1;
        if only.is_some_and(|c| !c.eq_ignore_ascii_case(&category.to_string())) {
            continue;
        }
        shown += 1;
        println!(
            "{:>3} | {:<40} | {:<11} | {:<40}",
            shown,
            truncate(&doc.slug, 40),
            category,
            truncate(doc.digest.h1(), 40)
        );
    }

    println!(
        "\n{} person | {} news | {} publication | {} unknown",
        totals[0], totals[1], totals[2], totals[3]
    );
}

fn category_slot(category: Category) -> usize {
    match category {
        Category::Person => 0,
        Category::News => 1,
        Category::Publication => 2,
        Category::Unknown => 3,
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::*;

    fn fixture_settings(data_dir: &Path) -> Settings {
        Settings::default().with_dirs(Some(Path::new("tests/fixtures/site")), Some(data_dir))
    }

    fn index_docs(settings: &Settings) -> Vec<Document> {
        let raw = fs::read_to_string("tests/fixtures/searchIndex.json").unwrap();
        SiteIndex::parse(&raw).unwrap().documents(&settings.items_prefix())
    }

    #[test]
    fn extraction_from_index() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = fixture_settings(dir.path());
        let rules = Rules::default();
        let c = run_extraction(&settings, &rules, &index_docs(&settings));

        let mike = c.people.iter().find(|p| p.slug == "mike-cant").unwrap();
        assert_eq!(mike.title, "Mike Cant");
        assert_eq!(mike.position.as_deref(), Some("Professor"));
        assert!(!mike.description.is_empty());

        let grant = c.news.iter().find(|n| n.slug == "new-grant").unwrap();
        assert_eq!(grant.title, "New grant from the research council");
        assert_eq!(
            grant.date.map(|d| d.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)).as_deref(),
            Some("2019-01-01T00:00:00.000Z")
        );

        let pubs: Vec<&str> = c.publications.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(pubs, ["population-dynamics"]);
        assert_eq!(c.publications[0].authors, ["Jane Doe", "John Smith"]);

        // Listed in the index but no page on disk.
        assert_eq!(c.skipped.get(&parser::extract::SkipReason::MissingSource), Some(&1));
        assert_eq!(c.skipped.get(&parser::extract::SkipReason::Unclassified), Some(&1));
        assert!(c.people.iter().all(|p| p.slug != "patrick-green"));
    }

    #[test]
    fn extraction_is_deterministic() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = fixture_settings(dir.path());
        let rules = Rules::default();
        let docs = index_docs(&settings);
        let a = run_extraction(&settings, &rules, &docs);
        let b = run_extraction(&settings, &rules, &docs);
        assert_eq!(a.people, b.people);
        assert_eq!(a.news, b.news);
        assert_eq!(a.publications, b.publications);
    }

    #[test]
    fn directory_fallback_without_index() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = fixture_settings(dir.path());
        let docs = load_documents(&settings, true);
        assert!(docs.iter().any(|d| d.slug == "mike-cant"));
        let mike = docs.iter().find(|d| d.slug == "mike-cant").unwrap();
        assert_eq!(mike.digest.h1(), "Professor");
    }

    #[test]
    fn outputs_written_as_arrays() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("out");
        let settings = fixture_settings(&out);
        let rules = Rules::default();
        site::ensure_dir(&settings.data_dir).unwrap();
        let c = run_extraction(&settings, &rules, &index_docs(&settings));
        write_outputs(&settings, &c).unwrap();

        for name in ["people.json", "news.json", "publications.json"] {
            let raw = fs::read_to_string(out.join(name)).unwrap();
            let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
            assert!(v.is_array(), "{} is not an array", name);
        }
        let news: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("news.json")).unwrap()).unwrap();
        assert_eq!(news[0]["date"], "2019-01-01T00:00:00.000Z");
    }

    #[test]
    fn ensure_dir_fails_under_a_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("blocker");
        fs::write(&file, "x").unwrap();
        assert!(site::ensure_dir(&file.join("data")).is_err());
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }
}
