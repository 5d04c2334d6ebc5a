//! Bundled matching engine.
//!
//! Categories are kept in learn order and indexed by a word trie
//! ("graphmaster"). Matching precedence at every word position is `_`, then
//! the literal word, then `*`; both wildcards consume one or more words,
//! shortest first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::debug;

use super::aiml::{normalize_input, normalize_pattern, parse_document, Tokens};
use super::template::TemplateNode;
use super::{EngineError, MatchingEngine};
use crate::predicates::Predicate;

/// Snapshot layout version written by this engine
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Maximum `<srai>` nesting before a branch gives up
pub const MAX_SRAI_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub pattern: String,
    pub template: Vec<TemplateNode>,
}

/// On-disk brain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrainSnapshot {
    pub format_version: u32,
    pub saved_at: DateTime<Utc>,
    pub categories: Vec<Category>,
    pub predicates: BTreeMap<Predicate, String>,
}

#[derive(Debug, Default)]
struct Node {
    children: HashMap<String, Node>,
    category: Option<usize>,
}

impl Node {
    fn insert(&mut self, words: &[&str], category: usize) {
        match words.split_first() {
            None => self.category = Some(category),
            Some((word, rest)) => self
                .children
                .entry((*word).to_string())
                .or_default()
                .insert(rest, category),
        }
    }

    fn find(&self, words: &[String], stars: &mut Vec<(usize, usize)>, offset: usize) -> Option<usize> {
        if words.is_empty() {
            return self.category;
        }

        if let Some(found) = self.find_wildcard("_", words, stars, offset) {
            return Some(found);
        }
        if let Some(child) = self.children.get(&words[0]) {
            if let Some(found) = child.find(&words[1..], stars, offset + 1) {
                return Some(found);
            }
        }
        self.find_wildcard("*", words, stars, offset)
    }

    fn find_wildcard(
        &self,
        wildcard: &str,
        words: &[String],
        stars: &mut Vec<(usize, usize)>,
        offset: usize,
    ) -> Option<usize> {
        let child = self.children.get(wildcard)?;
        for taken in 1..=words.len() {
            stars.push((offset, offset + taken));
            if let Some(found) = child.find(&words[taken..], stars, offset + taken) {
                return Some(found);
            }
            stars.pop();
        }
        None
    }
}

/// AIML-subset engine with JSON snapshots
#[derive(Debug, Default)]
pub struct PatternEngine {
    categories: Vec<Category>,
    by_pattern: HashMap<String, usize>,
    root: Node,
    predicates: BTreeMap<Predicate, String>,
}

impl PatternEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one rule; an identical pattern replaces the earlier template
    pub fn add_category(&mut self, pattern: &str, template: Vec<TemplateNode>) {
        let pattern = normalize_pattern(pattern);
        if let Some(&idx) = self.by_pattern.get(&pattern) {
            self.categories[idx].template = template;
            return;
        }
        let idx = self.categories.len();
        let words: Vec<&str> = pattern.split(' ').collect();
        self.root.insert(&words, idx);
        self.by_pattern.insert(pattern.clone(), idx);
        self.categories.push(Category { pattern, template });
    }

    pub fn predicate(&self, predicate: Predicate) -> Option<&str> {
        self.predicates.get(&predicate).map(|v| v.as_str())
    }

    pub fn to_snapshot(&self) -> BrainSnapshot {
        BrainSnapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            saved_at: Utc::now(),
            categories: self.categories.clone(),
            predicates: self.predicates.clone(),
        }
    }

    pub fn from_snapshot(snapshot: BrainSnapshot) -> Self {
        let mut engine = Self::new();
        for category in snapshot.categories {
            engine.add_category(&category.pattern, category.template);
        }
        engine.predicates = snapshot.predicates;
        engine
    }

    fn respond_at(&self, input: &str, depth: usize) -> String {
        if depth > MAX_SRAI_DEPTH {
            debug!("srai depth exceeded for {:?}", input);
            return String::new();
        }
        let tokens = normalize_input(input);
        if tokens.is_empty() {
            return String::new();
        }

        let mut spans = Vec::new();
        let Some(idx) = self.root.find(&tokens.upper, &mut spans, 0) else {
            return String::new();
        };
        let stars: Vec<String> = spans
            .iter()
            .map(|(start, end)| tokens.original[*start..*end].join(" "))
            .collect();

        let mut out = String::new();
        let seed = seed_from_tokens(&tokens);
        self.evaluate(&self.categories[idx].template, &stars, seed, depth, &mut out);
        collapse_whitespace(&out)
    }

    fn evaluate(&self, nodes: &[TemplateNode], stars: &[String], seed: u64, depth: usize, out: &mut String) {
        for node in nodes {
            match node {
                TemplateNode::Text { text } => out.push_str(text),
                TemplateNode::Star { index } => {
                    if let Some(star) = index.checked_sub(1).and_then(|i| stars.get(i)) {
                        out.push_str(star);
                    }
                }
                TemplateNode::Bot { name } => {
                    if let Some(value) = Predicate::from_key(name).and_then(|p| self.predicate(p)) {
                        out.push_str(value);
                    }
                }
                TemplateNode::Srai { children } => {
                    let mut query = String::new();
                    self.evaluate(children, stars, seed, depth, &mut query);
                    out.push_str(&self.respond_at(&query, depth + 1));
                }
                TemplateNode::Random { choices } => {
                    if !choices.is_empty() {
                        let pick = (seed as usize) % choices.len();
                        self.evaluate(&choices[pick], stars, seed, depth, out);
                    }
                }
                TemplateNode::Think { children } => {
                    let mut discarded = String::new();
                    self.evaluate(children, stars, seed, depth, &mut discarded);
                }
            }
        }
    }
}

/// Seed for `<random>` picks, stable for a given input
fn seed_from_tokens(tokens: &Tokens) -> u64 {
    fnv1a(tokens.key().as_bytes())
}

/// 64-bit FNV-1a; fixed across toolchains, unlike `DefaultHasher`
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes.iter().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(PRIME)
    })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl MatchingEngine for PatternEngine {
    fn learn(&mut self, source: &Path) -> Result<(), EngineError> {
        let content = fs::read_to_string(source).map_err(|e| EngineError::Read {
            path: source.to_path_buf(),
            source: e,
        })?;
        let parsed = parse_document(&content).map_err(|reason| EngineError::Parse {
            path: source.to_path_buf(),
            reason,
        })?;
        let count = parsed.len();
        for category in parsed {
            self.add_category(&category.pattern, category.template);
        }
        debug!("Learned {} categories from {}", count, source.display());
        Ok(())
    }

    fn load_snapshot(&mut self, path: &Path) -> Result<(), EngineError> {
        let bytes = fs::read(path).map_err(|e| EngineError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let snapshot: BrainSnapshot =
            serde_json::from_slice(&bytes).map_err(|e| EngineError::CorruptSnapshot {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(EngineError::CorruptSnapshot {
                path: path.to_path_buf(),
                reason: format!("unsupported format version {}", snapshot.format_version),
            });
        }
        *self = Self::from_snapshot(snapshot);
        Ok(())
    }

    fn save_snapshot(&mut self, path: &Path) -> Result<(), EngineError> {
        let write_err = |e: std::io::Error| EngineError::Write {
            path: path.to_path_buf(),
            source: e,
        };
        let bytes = serde_json::to_vec(&self.to_snapshot())
            .map_err(|e| write_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }
        // Write beside the target, then swap it in
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes).map_err(write_err)?;
        fs::rename(&tmp, path).map_err(write_err)?;
        Ok(())
    }

    fn reset_state(&mut self) -> Result<(), EngineError> {
        *self = Self::new();
        Ok(())
    }

    fn set_predicate(&mut self, predicate: Predicate, value: &str) {
        self.predicates.insert(predicate, value.to_string());
    }

    fn respond(&mut self, utterance: &str) -> String {
        self.respond_at(utterance, 0)
    }

    fn category_count(&self) -> usize {
        self.categories.len()
    }
}
