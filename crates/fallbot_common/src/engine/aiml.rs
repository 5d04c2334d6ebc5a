//! AIML-subset file reader.
//!
//! Extracts `<category>` blocks (also inside `<topic>` wrappers) and turns
//! each into a normalized pattern plus a parsed template. `<that>` clauses
//! are read past and ignored.

use once_cell::sync::Lazy;
use regex::Regex;

use super::template::{decode_entities, parse_template, TemplateNode};

static CATEGORY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<category\b[^>]*>(.*?)</category\s*>").expect("category regex"));

static PATTERN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<pattern\b[^>]*>(.*?)</pattern\s*>").expect("pattern regex"));

static TEMPLATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<template\b[^>]*>(.*?)</template\s*>").expect("template regex"));

static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment regex"));

static ANY_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));

static ROOT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<aiml\b").expect("root regex"));

static CATEGORY_OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<category\b").expect("category open regex"));

/// One stimulus/response rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCategory {
    /// Normalized pattern words joined by single spaces
    pub pattern: String,
    pub template: Vec<TemplateNode>,
}

/// Tokens of an utterance: original spelling plus match key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokens {
    pub original: Vec<String>,
    pub upper: Vec<String>,
}

impl Tokens {
    pub fn is_empty(&self) -> bool {
        self.upper.is_empty()
    }

    pub fn key(&self) -> String {
        self.upper.join(" ")
    }
}

/// Split user input into words; punctuation and wildcard characters vanish
pub fn normalize_input(input: &str) -> Tokens {
    let cleaned: String = input
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '\'' { c } else { ' ' })
        .collect();
    let original: Vec<String> = cleaned.split_whitespace().map(|w| w.to_string()).collect();
    let upper = original.iter().map(|w| w.to_uppercase()).collect();
    Tokens { original, upper }
}

/// Normalize a pattern, keeping `*` and `_` as standalone wildcard words
pub fn normalize_pattern(pattern: &str) -> String {
    let mut cleaned = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '*' | '_' => {
                cleaned.push(' ');
                cleaned.push(c);
                cleaned.push(' ');
            }
            c if c.is_alphanumeric() || c == '\'' => cleaned.extend(c.to_uppercase()),
            _ => cleaned.push(' '),
        }
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Read every category out of an AIML document
pub fn parse_document(content: &str) -> Result<Vec<ParsedCategory>, String> {
    let content = COMMENT_RE.replace_all(content, "");
    if !ROOT_RE.is_match(&content) {
        return Err("missing <aiml> root element".to_string());
    }

    let mut categories = Vec::new();
    for (n, caps) in CATEGORY_RE.captures_iter(&content).enumerate() {
        let body = &caps[1];
        let raw_pattern = PATTERN_RE
            .captures(body)
            .map(|c| c[1].to_string())
            .ok_or_else(|| format!("category {} has no <pattern>", n + 1))?;
        let raw_template = TEMPLATE_RE
            .captures(body)
            .map(|c| c[1].to_string())
            .ok_or_else(|| format!("category {} has no <template>", n + 1))?;

        let pattern_text = decode_entities(&ANY_TAG_RE.replace_all(&raw_pattern, " "));
        let pattern = normalize_pattern(&pattern_text);
        if pattern.is_empty() {
            return Err(format!("category {} has an empty pattern", n + 1));
        }
        let template = parse_template(&raw_template)
            .map_err(|e| format!("category {} ({}): {}", n + 1, pattern, e))?;

        categories.push(ParsedCategory { pattern, template });
    }

    let opened = CATEGORY_OPEN_RE.find_iter(&content).count();
    if opened != categories.len() {
        return Err(format!(
            "{} of {} categories are not terminated",
            opened - categories.len(),
            opened
        ));
    }
    Ok(categories)
}
