//! Text helpers shared by every extractor.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Node};

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<[^>]+>").expect("valid tags regex"));

/// Collapses runs of whitespace to single spaces and trims.
pub(crate) fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strips markup from an HTML fragment and collapses whitespace.
pub(crate) fn clean_text(input: &str) -> String {
    collapse_whitespace(&TAG_RE.replace_all(input, " "))
}

/// Visible text of an element with block boundaries preserved as newlines.
///
/// Line structure matters to `specs::extract_location`: location patterns stop at
/// line ends, so cells and list items must not run together.
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    collect_text(*element, &mut lines, &mut current);
    push_line(&mut lines, &mut current);
    lines.join("\n")
}

fn collect_text(element: ElementRef<'_>, lines: &mut Vec<String>, current: &mut String) {
    for child in element.children() {
        if let Node::Text(text) = child.value() {
            current.push_str(text);
            continue;
        }
        let Some(child_el) = ElementRef::wrap(child) else {
            continue;
        };
        let name = child_el.value().name();
        if matches!(name, "script" | "style" | "noscript" | "template") {
            continue;
        }
        let block = is_block_tag(name);
        if block {
            push_line(lines, current);
        }
        collect_text(child_el, lines, current);
        if block {
            push_line(lines, current);
        }
    }
}

fn push_line(lines: &mut Vec<String>, current: &mut String) {
    let line = collapse_whitespace(current);
    if !line.is_empty() {
        lines.push(line);
    }
    current.clear();
}

/// Single-line visible text of an element.
pub(crate) fn inline_text(element: &ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

pub(crate) fn is_block_tag(name: &str) -> bool {
    matches!(
        name,
        "div"
            | "p"
            | "li"
            | "ul"
            | "ol"
            | "tr"
            | "td"
            | "th"
            | "table"
            | "section"
            | "article"
            | "header"
            | "footer"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "br"
            | "dl"
            | "dt"
            | "dd"
    )
}

/// Truncates to at most `max_chars` characters without splitting a code point.
pub(crate) fn truncate_chars(input: &str, max_chars: usize) -> String {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => input[..idx].to_string(),
        None => input.to_string(),
    }
}

/// Returns `None` for empty or whitespace-only strings.
pub(crate) fn non_empty(input: &str) -> Option<String> {
    let trimmed = collapse_whitespace(input);
    (!trimmed.is_empty()).then_some(trimmed)
}
