//! Response decoder.
//!
//! Turns one raw completion into a [`ParsedResponse`]. Each field is
//! extracted independently by scanning for its tag; `content` then falls
//! through a fixed cascade of strategies so that it is always populated
//! with something, in the worst case the whole trimmed input.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;
use tutor_core::types::ParsedResponse;

use crate::tags::{
    self, find_ci, find_earliest_ci, label_value, skip_whitespace, strip_leading_answer_label,
};

// =============================================================================
// Section terminators
// =============================================================================

/// Where an `[answer]:` section stops.
const ANSWER_TERMINATORS: &[&str] = &[
    "[code]",
    "[code-title]",
    "[fixed-code]",
    "[explanation]",
    "[annotated-code]",
    tags::TOPICS_COVERED,
];

/// Where an `[explanation]:` section stops.
const EXPLANATION_TERMINATORS: &[&str] = &[
    "[annotated-code]",
    "[code]",
    "[code-title]",
    "[fixed-code]",
    tags::TOPICS_COVERED,
];

/// Where post-code prose stops.
const POST_CODE_TERMINATORS: &[&str] = &[
    "Topics covered:",
    "Main topics:",
    "Key concepts:",
    "Programming topics:",
    "Concepts discussed:",
    "[topics]:",
    "Topics:",
    tags::PROBABLE_QUESTION_TYPE,
];

/// Markers that end the untagged lead-in of a response.
const LEAD_IN_TERMINATORS: &[&str] = &[
    "[code]",
    "[fixed-code]",
    "[annotated-code]",
    "[code-title]",
    "[explanation]",
    tags::TOPICS_COVERED,
];

const FIX_OR_ANNOTATED_OPENERS: &[&str] = &["[fixed-code]", "[annotated-code]"];

/// Minimum length for prose recovered around a fixed or annotated block.
const MIN_RECOVERED_LEN: usize = 10;

// =============================================================================
// Compiled patterns
// =============================================================================

static FENCED_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:[a-zA-Z]*\n)?(.*?)```").unwrap());

static NESTED_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[code-title\]:[^\n]*\n?").unwrap());

static FENCE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^```\s*$").unwrap());

static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*\n+").unwrap());

static TAGGED_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\[(?:fixed-)?(?:annotated-)?code\].*?\[(?:end-)?(?:fixed-)?(?:annotated-)?code\]")
        .unwrap()
});

static FIX_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)###?\s*(?:Explanation|Changes|Fixes?)[:\s]*").unwrap()
});

static LEADING_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^###?\s*").unwrap());

static TOPICS_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)Topics covered:.*$").unwrap());

static TYPE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)Probable Question Type:.*$").unwrap());

static CLOSING_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:Topics covered|Main topics|Key concepts|Probable Question Type):.*$").unwrap()
});

// =============================================================================
// ResponseDecoder
// =============================================================================

/// Stateless parser for raw completions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseDecoder;

impl ResponseDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode a raw completion. Never fails.
    pub fn decode(&self, raw: &str) -> ParsedResponse {
        let tagged = section_after(raw, tags::ANSWER, ANSWER_TERMINATORS)
            .or_else(|| section_after(raw, tags::EXPLANATION, EXPLANATION_TERMINATORS));

        let code_title = extract_code_title(raw);
        let raw_code = extract_code(raw);
        let post_code = extract_post_code(raw);
        let topics = extract_topics(raw);
        let probable_question_type = extract_question_type(raw);

        let content = match tagged {
            Some(content) => {
                trace!("content from tagged section");
                content
            }
            None => fallback_content(raw, post_code.as_deref(), !topics.is_empty()),
        };
        let content = clean_content(&content);

        // Title and trailing prose only make sense next to a code block.
        let has_code = raw_code.is_some();
        ParsedResponse {
            content,
            raw_code,
            code_title: code_title.filter(|_| has_code),
            post_code_content: post_code.filter(|_| has_code),
            topics,
            probable_question_type,
        }
    }

    /// Decode several completions in order.
    pub fn decode_all<'a, I>(&self, raws: I) -> Vec<ParsedResponse>
    where
        I: IntoIterator<Item = &'a str>,
    {
        raws.into_iter().map(|raw| self.decode(raw)).collect()
    }
}

/// Decode a raw completion with the default decoder.
pub fn decode(raw: &str) -> ParsedResponse {
    ResponseDecoder.decode(raw)
}

// -----------------------------------------------------------------
// Field extraction
// -----------------------------------------------------------------

/// Text after `label` up to the earliest terminator, trimmed; `None` when empty.
fn section_after(raw: &str, label: &str, terminators: &[&str]) -> Option<String> {
    let pos = find_ci(raw, label, 0)?;
    let start = skip_whitespace(raw, pos + label.len());
    let end = find_earliest_ci(raw, terminators, start).map_or(raw.len(), |(end, _)| end);
    non_empty(raw[start..end].trim())
}

fn extract_code_title(raw: &str) -> Option<String> {
    let pos = find_ci(raw, tags::CODE_TITLE, 0)?;
    non_empty(label_value(raw, pos, tags::CODE_TITLE).trim())
}

/// An annotated block wins; otherwise the first generic block.
fn extract_code(raw: &str) -> Option<String> {
    annotated_block(raw).or_else(|| generic_block(raw))
}

fn annotated_block(raw: &str) -> Option<String> {
    let pos = find_ci(raw, tags::ANNOTATED_CODE, 0)?;
    let start = skip_whitespace(raw, pos + tags::ANNOTATED_CODE.len());
    let end = find_ci(raw, tags::END_ANNOTATED_CODE, start)?;
    clean_code_body(&raw[start..end])
}

fn generic_block(raw: &str) -> Option<String> {
    let (pos, opener) = find_earliest_ci(raw, tags::CODE_OPENERS, 0)?;
    let start = skip_whitespace(raw, pos + opener.len());
    let (end, _) = find_earliest_ci(raw, tags::CODE_CLOSERS, start)?;
    clean_code_body(&raw[start..end])
}

/// Drop nested title lines and unwrap a fenced span if there is one.
fn clean_code_body(body: &str) -> Option<String> {
    let mut code = NESTED_TITLE_RE.replace_all(body.trim(), "").into_owned();
    if code.contains("```") {
        if let Some(inner) = FENCED_BLOCK_RE
            .captures(&code)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .filter(|inner| !inner.is_empty())
        {
            code = inner.to_string();
        }
    }
    non_empty(code.trim())
}

fn extract_post_code(raw: &str) -> Option<String> {
    let (pos, terminator) = find_earliest_ci(raw, tags::CODE_TERMINATORS, 0)?;
    let start = skip_whitespace(raw, pos + terminator.len());
    let end = find_earliest_ci(raw, POST_CODE_TERMINATORS, start).map_or(raw.len(), |(end, _)| end);
    let body = raw[start..end].trim();
    if body.is_empty() {
        return None;
    }
    let body = FENCE_LINE_RE.replace_all(body, "");
    let body = BLANK_RUN_RE.replace_all(body.trim(), "\n");
    non_empty(body.trim())
}

/// First topic label with at least one usable topic wins.
fn extract_topics(raw: &str) -> Vec<String> {
    for label in tags::TOPIC_LABELS {
        let Some(pos) = find_ci(raw, label, 0) else {
            continue;
        };
        let topics: Vec<String> = label_value(raw, pos, label)
            .split([',', ';'])
            .map(str::trim)
            .filter(|t| !t.is_empty() && t.chars().count() < 100)
            .take(6)
            .map(str::to_string)
            .collect();
        if !topics.is_empty() {
            return topics;
        }
    }
    Vec::new()
}

fn extract_question_type(raw: &str) -> Option<String> {
    for label in tags::QUESTION_TYPE_LABELS {
        let Some(pos) = find_ci(raw, label, 0) else {
            continue;
        };
        let value = label_value(raw, pos, label);
        let value = if label.starts_with('[') {
            value
        } else {
            let unbracketed = value.strip_prefix('[').unwrap_or(value);
            unbracketed.split(']').next().unwrap_or_default()
        };
        if let Some(label) = non_empty(value.trim().trim_matches(['[', ']']).trim()) {
            return Some(label);
        }
    }
    None
}

// -----------------------------------------------------------------
// Content fallback cascade
// -----------------------------------------------------------------

fn fallback_content(raw: &str, post_code: Option<&str>, has_topics: bool) -> String {
    let has_fixed = raw.contains("[fixed-code]");
    let has_fixed_or_annotated = has_fixed || raw.contains("[annotated-code]");

    // Untagged lead-in before the first code, explanation, or topics marker.
    if raw.contains("[code")
        || raw.contains("[fixed-code")
        || raw.contains("[annotated-code")
        || raw.contains(tags::TOPICS_COVERED)
    {
        if let Some(content) = text_before(raw, LEAD_IN_TERMINATORS).filter(|c| !c.is_empty()) {
            trace!("content from lead-in");
            return content;
        }
    }

    // Fix responses often explain themselves after the block.
    if has_fixed {
        if let Some(content) = post_code.and_then(fix_explanation) {
            trace!("content from fix explanation");
            return content;
        }
    }

    if has_fixed_or_annotated {
        if let Some(content) = text_before(raw, FIX_OR_ANNOTATED_OPENERS)
            .filter(|c| c.chars().count() > MIN_RECOVERED_LEN)
        {
            trace!("content from prose before fixed/annotated block");
            return content;
        }
    }

    if has_topics {
        if let Some(content) = text_before(raw, POST_CODE_TERMINATORS) {
            let content = TAGGED_BLOCK_RE.replace_all(&content, "").trim().to_string();
            if !content.is_empty() {
                trace!("content from text before topics");
                return content;
            }
        }
    }

    if has_fixed_or_annotated {
        if let Some(post) = post_code {
            trace!("content from post-code prose");
            return post.to_string();
        }
    }

    trace!("content from whole response");
    let content = TOPICS_LINE_RE.replace_all(raw.trim(), "");
    let content = TYPE_LINE_RE.replace_all(content.trim(), "");
    TAGGED_BLOCK_RE.replace_all(content.trim(), "").trim().to_string()
}

/// Trimmed text before the earliest marker, without a leading answer label.
fn text_before(raw: &str, markers: &[&str]) -> Option<String> {
    let (pos, _) = find_earliest_ci(raw, markers, 0)?;
    if pos == 0 {
        return None;
    }
    Some(strip_leading_answer_label(raw[..pos].trim()).to_string())
}

/// Prose after an "Explanation"/"Changes"/"Fixes" heading, or the whole
/// post-code text.
fn fix_explanation(post: &str) -> Option<String> {
    let long_enough = |s: &str| s.chars().count() > MIN_RECOVERED_LEN;

    if let Some(m) = FIX_HEADING_RE.find(post) {
        let text = post[m.end()..].trim();
        if long_enough(text) {
            return Some(text.to_string());
        }
    }
    if let Some(m) = LEADING_HEADING_RE.find(post) {
        let text = post[m.end()..].trim();
        if long_enough(text) {
            return Some(text.to_string());
        }
    }
    let text = post.trim();
    long_enough(text).then(|| text.to_string())
}

/// Strip closing lines and bare fence markers that leaked into `content`.
fn clean_content(content: &str) -> String {
    let content = CLOSING_LINE_RE.replace_all(content, "");
    let content = FENCE_LINE_RE.replace_all(content.trim(), "");
    let mut content = content.trim();
    for marker in [tags::TOPICS_COVERED, tags::PROBABLE_QUESTION_TYPE] {
        if let Some(pos) = find_ci(content, marker, 0) {
            content = content[..pos].trim();
        }
    }
    content.to_string()
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}
