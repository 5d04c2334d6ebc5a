//! Template trees for the pattern engine.
//!
//! A `<template>` body is parsed once at learn time into [`TemplateNode`]s,
//! which are also what the snapshot stores.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Matches one start, end or empty-element tag
static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<(/?)([A-Za-z_][\w.-]*)((?:\s+[\w.-]+\s*=\s*(?:"[^"]*"|'[^']*'))*)\s*(/?)>"#)
        .expect("tag regex")
});

static ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([\w.-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("attr regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemplateNode {
    Text { text: String },
    /// 1-based wildcard capture
    Star { index: usize },
    /// Bot predicate lookup
    Bot { name: String },
    /// Recursive query with the evaluated children as input
    Srai { children: Vec<TemplateNode> },
    Random { choices: Vec<Vec<TemplateNode>> },
    /// Evaluated for effect, output discarded
    Think { children: Vec<TemplateNode> },
}

struct Frame {
    tag: String,
    attrs: HashMap<String, String>,
    children: Vec<TemplateNode>,
    choices: Vec<Vec<TemplateNode>>,
}

impl Frame {
    fn new(tag: &str, attrs: HashMap<String, String>) -> Self {
        Self {
            tag: tag.to_string(),
            attrs,
            children: Vec::new(),
            choices: Vec::new(),
        }
    }
}

fn attributes(raw: &str) -> HashMap<String, String> {
    ATTR_RE
        .captures_iter(raw)
        .map(|c| {
            let value = c.get(2).or_else(|| c.get(3)).map(|m| m.as_str()).unwrap_or("");
            (c[1].to_ascii_lowercase(), decode_entities(value))
        })
        .collect()
}

/// Replace the five predefined XML entities
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn empty_element(tag: &str, attrs: &HashMap<String, String>) -> Option<TemplateNode> {
    match tag {
        "star" => Some(TemplateNode::Star {
            index: attrs
                .get("index")
                .and_then(|i| i.trim().parse().ok())
                .filter(|i| *i > 0)
                .unwrap_or(1),
        }),
        "sr" => Some(TemplateNode::Srai {
            children: vec![TemplateNode::Star { index: 1 }],
        }),
        "bot" => Some(TemplateNode::Bot {
            name: attrs.get("name").cloned().unwrap_or_default(),
        }),
        "br" => Some(TemplateNode::Text {
            text: " ".to_string(),
        }),
        _ => None,
    }
}

/// Open elements above the template root
struct FrameStack {
    root: Frame,
    open: Vec<Frame>,
}

impl FrameStack {
    fn top(&mut self) -> &mut Frame {
        match self.open.last_mut() {
            Some(frame) => frame,
            None => &mut self.root,
        }
    }

    fn push_text(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        self.top().children.push(TemplateNode::Text {
            text: decode_entities(raw),
        });
    }

    fn close(&mut self, frame: Frame) {
        let parent = self.top();
        match frame.tag.as_str() {
            "srai" => parent.children.push(TemplateNode::Srai {
                children: frame.children,
            }),
            "random" => parent.children.push(TemplateNode::Random {
                choices: frame.choices,
            }),
            "think" => parent.children.push(TemplateNode::Think {
                children: frame.children,
            }),
            "li" if parent.tag == "random" => parent.choices.push(frame.children),
            "star" | "bot" => {
                // <star></star> written long-hand
                if let Some(node) = empty_element(&frame.tag, &frame.attrs) {
                    parent.children.push(node);
                }
            }
            _ => parent.children.extend(frame.children),
        }
    }
}

/// Parse a template body into nodes
///
/// Unknown elements are transparent: their content stays, the tag goes.
pub fn parse_template(body: &str) -> Result<Vec<TemplateNode>, String> {
    let mut stack = FrameStack {
        root: Frame::new("", HashMap::new()),
        open: Vec::new(),
    };
    let mut cursor = 0;

    for caps in TAG_RE.captures_iter(body) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        stack.push_text(&body[cursor..whole.start()]);
        cursor = whole.end();

        let closing = !caps[1].is_empty();
        let tag = caps[2].to_ascii_lowercase();
        let self_closing = !caps[4].is_empty();
        let attrs = attributes(caps.get(3).map(|m| m.as_str()).unwrap_or(""));

        if self_closing {
            if let Some(node) = empty_element(&tag, &attrs) {
                stack.top().children.push(node);
            }
            continue;
        }

        if !closing {
            stack.open.push(Frame::new(&tag, attrs));
            continue;
        }

        let Some(frame) = stack.open.pop() else {
            return Err(format!("unexpected </{}>", tag));
        };
        if frame.tag != tag {
            return Err(format!("expected </{}>, found </{}>", frame.tag, tag));
        }
        stack.close(frame);
    }
    stack.push_text(&body[cursor..]);

    if let Some(open) = stack.open.last() {
        return Err(format!("unclosed <{}>", open.tag));
    }
    Ok(stack.root.children)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> TemplateNode {
        TemplateNode::Text { text: s.to_string() }
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(parse_template("Hi there").unwrap(), vec![text("Hi there")]);
    }

    #[test]
    fn test_star_and_bot() {
        let nodes = parse_template(r#"I am <bot name="name"/>, you said <star index="2"/>"#).unwrap();
        assert_eq!(
            nodes,
            vec![
                text("I am "),
                TemplateNode::Bot { name: "name".to_string() },
                text(", you said "),
                TemplateNode::Star { index: 2 },
            ]
        );
    }

    #[test]
    fn test_long_hand_star_and_bot_keep_attributes() {
        let nodes = parse_template(r#"I am <bot name="name"></bot>, you said <star index="2"></star>"#).unwrap();
        assert_eq!(
            nodes,
            vec![
                text("I am "),
                TemplateNode::Bot { name: "name".to_string() },
                text(", you said "),
                TemplateNode::Star { index: 2 },
            ]
        );
    }

    #[test]
    fn test_random_collects_choices() {
        let nodes = parse_template("<random>\n<li>a</li>\n<li>b</li>\n</random>").unwrap();
        match &nodes[0] {
            TemplateNode::Random { choices } => {
                assert_eq!(choices.len(), 2);
                assert_eq!(choices[1], vec![text("b")]);
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_sr_is_srai_of_star() {
        let nodes = parse_template("<sr/>").unwrap();
        assert_eq!(
            nodes,
            vec![TemplateNode::Srai {
                children: vec![TemplateNode::Star { index: 1 }]
            }]
        );
    }

    #[test]
    fn test_unknown_tags_are_transparent() {
        let nodes = parse_template("<formal>hello</formal> world").unwrap();
        assert_eq!(nodes, vec![text("hello"), text(" world")]);
    }

    #[test]
    fn test_entities_decoded() {
        let nodes = parse_template("a &lt;b&gt; &amp; c").unwrap();
        assert_eq!(nodes, vec![text("a <b> & c")]);
    }

    #[test]
    fn test_mismatched_close_is_error() {
        assert!(parse_template("<srai>x</think>").is_err());
        assert!(parse_template("<srai>x").is_err());
        assert!(parse_template("x</srai>").is_err());
    }
}
