//! Bracketed tag vocabulary and a small case-insensitive scanner over it.
//!
//! Tags are ASCII, so every match position returned here falls on a UTF-8
//! character boundary of the haystack.

// =============================================================================
// Turn tags (user side)
// =============================================================================

pub const QUESTION: &str = "[question]:";
pub const FOLLOW_UP_QUESTION: &str = "[follow-up-question]:";
pub const CODE: &str = "[code]:";
pub const FOLLOW_UP_CODE: &str = "[follow-up-code]:";
pub const INTENDED_BEHAVIOR: &str = "[intended-behavior]:";

// =============================================================================
// Answer tags (assistant side)
// =============================================================================

pub const ANSWER: &str = "[answer]:";
pub const EXPLANATION: &str = "[explanation]:";
pub const CODE_TITLE: &str = "[code-title]:";
pub const FIXED_CODE: &str = "[fixed-code]:";
pub const ANNOTATED_CODE: &str = "[annotated-code]:";
pub const END_CODE: &str = "[end-code]";
pub const END_FIXED_CODE: &str = "[end-fixed-code]";
pub const END_ANNOTATED_CODE: &str = "[end-annotated-code]";

/// Openers of a code block, in the order they are tried.
pub const CODE_OPENERS: &[&str] = &[CODE, FIXED_CODE, ANNOTATED_CODE];

/// Anything that closes a code block. Bare opener names count as closers.
pub const CODE_CLOSERS: &[&str] = &[
    "[code]",
    "[fixed-code]",
    "[annotated-code]",
    END_CODE,
    END_FIXED_CODE,
    END_ANNOTATED_CODE,
];

/// Explicit `end-` terminators that start the post-code section.
pub const CODE_TERMINATORS: &[&str] = &[END_CODE, END_FIXED_CODE, END_ANNOTATED_CODE];

// =============================================================================
// Closing lines
// =============================================================================

pub const TOPICS_COVERED: &str = "Topics covered:";
pub const PROBABLE_QUESTION_TYPE: &str = "Probable Question Type:";

/// Topic labels in priority order; an earlier label always wins.
pub const TOPIC_LABELS: &[&str] = &[
    TOPICS_COVERED,
    "Main topics:",
    "Key concepts:",
    "Programming topics:",
    "Concepts discussed:",
    "[topics]:",
    "Topics:",
];

/// Question-type labels in priority order.
pub const QUESTION_TYPE_LABELS: &[&str] = &[
    PROBABLE_QUESTION_TYPE,
    "Question Type:",
    "Type:",
    "[question-type]:",
    "[type]:",
];

// =============================================================================
// Sentinels
// =============================================================================

pub const STOP_QUESTION_ANSWER: &str = "[STOP-end-question-answer-STOP]";
pub const END_QUESTION_ANSWER: &str = "[end-question-answer]";
pub const STOP_FIXED_CODE: &str = "[STOP-end-fixed-code-STOP]";
pub const STOP_EXPLAIN_CODE: &str = "[STOP-end-explain-code-STOP]";

// =============================================================================
// Scanner
// =============================================================================

/// Find `needle` in `haystack` at or after byte offset `from`, ignoring ASCII case.
pub fn find_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let hay = haystack.as_bytes();
    let pat = needle.as_bytes();
    if pat.is_empty() || from > hay.len() || pat.len() > hay.len() - from {
        return None;
    }
    (from..=hay.len() - pat.len()).find(|&i| hay[i..i + pat.len()].eq_ignore_ascii_case(pat))
}

/// Earliest match of any needle at or after `from`, with the needle that matched.
///
/// Ties go to the needle listed first.
pub fn find_earliest_ci<'n>(
    haystack: &str,
    needles: &[&'n str],
    from: usize,
) -> Option<(usize, &'n str)> {
    let mut best: Option<(usize, &'n str)> = None;
    for needle in needles {
        if let Some(pos) = find_ci(haystack, needle, from) {
            if best.map_or(true, |(b, _)| pos < b) {
                best = Some((pos, needle));
            }
        }
    }
    best
}

/// Advance past any whitespace, including line breaks.
pub fn skip_whitespace(s: &str, from: usize) -> usize {
    s[from..]
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map_or(s.len(), |(i, _)| from + i)
}

/// Byte offset of the end of the line containing `from` (exclusive of `\r`/`\n`).
pub fn line_end(s: &str, from: usize) -> usize {
    s[from..]
        .find(['\n', '\r'])
        .map_or(s.len(), |i| from + i)
}

/// The value of a `label: value` field: whitespace after the label is skipped
/// (line breaks included), then the rest of that line is returned.
pub fn label_value<'a>(s: &'a str, label_pos: usize, label: &str) -> &'a str {
    let start = skip_whitespace(s, label_pos + label.len());
    &s[start..line_end(s, start)]
}

/// Strip a single leading `[answer]:` or `[explanation]:` label and the
/// whitespace after it.
pub fn strip_leading_answer_label(s: &str) -> &str {
    for label in [ANSWER, EXPLANATION] {
        if s.len() >= label.len() && s.as_bytes()[..label.len()].eq_ignore_ascii_case(label.as_bytes()) {
            return s[label.len()..].trim_start();
        }
    }
    s
}

/// Strip `tag` from the start of a line, plus one separating space.
pub fn strip_tag<'a>(line: &'a str, tag: &str) -> Option<&'a str> {
    line.trim_start()
        .strip_prefix(tag)
        .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
}

/// Whether a line, ignoring leading indentation, opens with `tag`.
pub fn line_starts_with_tag(line: &str, tag: &str) -> bool {
    line.trim_start().starts_with(tag)
}
