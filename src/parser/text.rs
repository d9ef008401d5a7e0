use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::config::Rules;

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap());
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").unwrap());
static BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body[^>]*>(.+?)</body>").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Plain-text normalizer for exported pages.
///
/// Boilerplate patterns and the sentence threshold come from [`Rules`];
/// the regexes are compiled once per run.
pub struct Normalizer {
    boilerplate: Vec<Regex>,
    sentence: Regex,
}

impl Normalizer {
    pub fn new(rules: &Rules) -> Self {
        let boilerplate = rules
            .boilerplate
            .iter()
            .filter_map(|p| match RegexBuilder::new(p).case_insensitive(true).build() {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("Skipping invalid boilerplate pattern {:?}: {}", p, e);
                    None
                }
            })
            .collect();
        // A sentence starts on a non-space so rejoined output re-matches identically.
        let min = rules.min_sentence_chars.max(1);
        let sentence = Regex::new(&format!(r"[^.!?\s][^.!?]{{{},}}[.!?]", min - 1))
            .expect("sentence pattern is static apart from a numeric bound");
        Normalizer {
            boilerplate,
            sentence,
        }
    }

    /// Raw HTML → meaningful sentences joined by single spaces.
    /// Returns an empty string when the page has no `<body>`.
    pub fn normalize(&self, html: &str) -> String {
        let without_scripts = SCRIPT_RE.replace_all(html, "");
        let clean = STYLE_RE.replace_all(&without_scripts, "");
        let Some(caps) = BODY_RE.captures(&clean) else {
            return String::new();
        };
        self.clean_text(&caps[1])
    }

    pub fn strip_boilerplate(&self, text: &str) -> String {
        let mut text = text.to_string();
        for re in &self.boilerplate {
            text = re.replace_all(&text, "").into_owned();
        }
        text
    }

    /// Boilerplate, tags and short fragments removed from a body fragment.
    pub fn clean_text(&self, body: &str) -> String {
        let text = self.strip_boilerplate(body);
        let text = TAG_RE.replace_all(&text, " ");
        let text = decode_entities(&text);
        let text = WS_RE.replace_all(&text, " ");
        let text = text.trim();

        self.sentence
            .find_iter(text)
            .map(|m| m.as_str().trim())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Tags stripped and whitespace collapsed, without sentence filtering.
pub fn flatten(fragment: &str) -> String {
    let text = TAG_RE.replace_all(fragment, " ");
    let text = decode_entities(&text);
    WS_RE.replace_all(&text, " ").trim().to_string()
}

/// Decode the handful of entities static exports actually emit.
pub fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Exact prefix of at most `max` characters, cut on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
