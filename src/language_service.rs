//! Editor language-service adapter.
//!
//! The host editor tooling calls through these functions for `.dribble` files:
//! snapshot resolution, diagnostics filtering, completions and hover text.
//! Nothing here fails. A component that does not compile resolves to a
//! one-line comment module so the host keeps working.

#[cfg(feature = "napi")]
use napi_derive::napi;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::compile::compile;
use crate::config::SOURCE_EXTENSION;
use crate::ir::{ComponentKind, ComponentSource};
use crate::parse::extract_header;
use crate::scanner::{is_ident_continue, is_ident_start, Scanner};
use crate::static_eval::{eval_condition, static_eval};

lazy_static! {
    /// `const x`, `let x`, `var x` and `function x` declarations in the prelude.
    static ref BINDING_RE: Regex =
        Regex::new(r"\b(?:const|let|var|function)\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap();

    /// `const x = <initializer>` up to the end of the statement or line.
    static ref CONST_RE: Regex =
        Regex::new(r"\bconst\s+([A-Za-z_][A-Za-z0-9_]*)\s*=\s*([^;\n]+)").unwrap();
}

const HTML_TAGS: &[&str] = &[
    "a", "article", "aside", "button", "code", "div", "em", "footer", "form", "h1", "h2", "h3",
    "header", "img", "input", "label", "li", "main", "nav", "ol", "option", "p", "pre",
    "section", "select", "small", "span", "strong", "table", "tbody", "td", "textarea", "th",
    "thead", "tr", "ul",
];

const HTML_ATTRIBUTES: &[&str] = &[
    "alt", "aria-label", "checked", "class", "disabled", "for", "href", "id", "name",
    "placeholder", "role", "src", "style", "tabindex", "title", "type", "value",
];

// ═══════════════════════════════════════════════════════════════════════════════
// TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompletionKind {
    Keyword,
    Snippet,
    Tag,
    Attribute,
    Variable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionEntry {
    pub name: String,
    pub kind: CompletionKind,
    /// Snippet text in editor placeholder syntax; `None` inserts `name`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_text: Option<String>,
}

impl CompletionEntry {
    fn plain(name: &str, kind: CompletionKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            insert_text: None,
        }
    }

    fn snippet(name: &str, insert_text: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: CompletionKind::Snippet,
            insert_text: Some(insert_text.to_string()),
        }
    }
}

/// Hover text for the token spanning `start..start + length`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickInfo {
    pub start: usize,
    pub length: usize,
    pub text: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SNAPSHOTS AND DIAGNOSTICS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn is_dribble_file(path: &str) -> bool {
    path.rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && ext == SOURCE_EXTENSION)
}

/// Module text the host should parse in place of the component source.
pub fn resolve_snapshot(path: &str, source: &str) -> String {
    match compile(path, source) {
        Ok(module) => module.code,
        Err(e) => format!("// Dribble compile error: {}", e.to_string().replace('\n', " ")),
    }
}

/// Positions in the snapshot do not map back to the component source, so every
/// diagnostic for a Dribble file is dropped.
pub fn filter_diagnostics<D>(path: &str, diagnostics: Vec<D>) -> Vec<D> {
    if is_dribble_file(path) {
        Vec::new()
    } else {
        diagnostics
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPLETIONS
// ═══════════════════════════════════════════════════════════════════════════════

enum CompletionContext {
    Interpolation,
    TagName,
    Attribute,
    General,
}

pub fn completions(path: &str, source: &str, offset: usize) -> Vec<CompletionEntry> {
    if !is_dribble_file(path) {
        return Vec::new();
    }

    let offset = clamp_offset(source, offset);
    let bytes = source.as_bytes();
    let mut word_start = offset;
    while word_start > 0 && is_ident_continue(bytes[word_start - 1]) {
        word_start -= 1;
    }

    match completion_context(&source[..word_start]) {
        CompletionContext::Interpolation => {
            let mut entries: Vec<CompletionEntry> = scope_identifiers(source)
                .iter()
                .map(|name| CompletionEntry::plain(name, CompletionKind::Variable))
                .collect();
            entries.push(CompletionEntry::snippet("if", "if (${1:condition}) {\n\t$0\n}"));
            entries.push(CompletionEntry::snippet("else", "else {\n\t$0\n}"));
            entries
        }
        CompletionContext::TagName => HTML_TAGS
            .iter()
            .map(|tag| CompletionEntry::plain(tag, CompletionKind::Tag))
            .collect(),
        CompletionContext::Attribute => HTML_ATTRIBUTES
            .iter()
            .map(|attr| CompletionEntry::plain(attr, CompletionKind::Attribute))
            .collect(),
        CompletionContext::General => vec![
            CompletionEntry::plain("ephemeral", CompletionKind::Keyword),
            CompletionEntry::plain("persistent", CompletionKind::Keyword),
            CompletionEntry::plain("render", CompletionKind::Keyword),
            CompletionEntry::snippet("@if", "@if (${1:condition}) {\n\t$0\n}"),
            CompletionEntry::snippet(
                "component",
                "export ${1|ephemeral,persistent|} ${2:Name}(${3}) {\n\trender(\n\t\t$0\n\t);\n}",
            ),
        ],
    }
}

fn completion_context(before: &str) -> CompletionContext {
    if before.ends_with('@') {
        return CompletionContext::Interpolation;
    }
    if before.ends_with('<') {
        return CompletionContext::TagName;
    }

    // Inside an open tag: the last `<` is after the last `>` and the cursor
    // follows whitespace.
    let open = before.rfind('<');
    let close = before.rfind('>');
    let in_tag = match (open, close) {
        (Some(o), Some(c)) => o > c,
        (Some(_), None) => true,
        _ => false,
    };
    if in_tag && before.ends_with(|c: char| c.is_ascii_whitespace()) {
        let tag_start = open.map_or(0, |o| o + 1);
        if before[tag_start..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            return CompletionContext::Attribute;
        }
    }

    CompletionContext::General
}

/// Identifiers usable after `@`: `params`, the header parameters and the
/// prelude bindings, in source order without duplicates.
pub fn scope_identifiers(source: &str) -> Vec<String> {
    let mut names = vec!["params".to_string()];
    let mut search_from = 0;

    if let Ok(header) = extract_header(ComponentSource::new("", source)) {
        for param in split_top_level(&header.raw_parameter_list) {
            let param = param.trim_start().trim_start_matches("...");
            let end = param
                .bytes()
                .position(|b| !is_ident_continue(b))
                .unwrap_or(param.len());
            if end > 0 && is_ident_start(param.as_bytes()[0]) {
                names.push(param[..end].to_string());
            }
        }
        search_from = header.body_start_offset.min(source.len());
    }

    for cap in BINDING_RE.captures_iter(&source[search_from..]) {
        if let Some(m) = cap.get(1) {
            names.push(m.as_str().to_string());
        }
    }

    let mut seen = std::collections::HashSet::new();
    names.retain(|name| seen.insert(name.clone()));
    names
}

/// Split a parameter list on commas outside brackets.
fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut last = 0;
    for (i, b) in list.bytes().enumerate() {
        match b {
            b'(' | b'[' | b'{' | b'<' => depth += 1,
            b')' | b']' | b'}' | b'>' => depth -= 1,
            b',' if depth == 0 => {
                parts.push(&list[last..i]);
                last = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[last..]);
    parts
}

// ═══════════════════════════════════════════════════════════════════════════════
// QUICK INFO
// ═══════════════════════════════════════════════════════════════════════════════

pub fn quick_info(path: &str, source: &str, offset: usize) -> Option<QuickInfo> {
    if !is_dribble_file(path) {
        return None;
    }

    let bytes = source.as_bytes();
    let mut offset = clamp_offset(source, offset);
    // Hovering the `@` itself describes the directive after it.
    if bytes.get(offset) == Some(&b'@') {
        offset += 1;
    }

    let mut start = offset;
    while start > 0 && is_ident_continue(bytes[start - 1]) {
        start -= 1;
    }
    let mut end = offset;
    while end < bytes.len() && is_ident_continue(bytes[end]) {
        end += 1;
    }
    if start == end || !is_ident_start(bytes[start]) {
        return None;
    }

    let word = &source[start..end];
    let directive = start > 0 && bytes[start - 1] == b'@';

    let text = if directive {
        match word {
            "if" => {
                let mut text =
                    "@if (condition) { markup }\nRenders the block when the condition is truthy."
                        .to_string();
                if let Some(note) = constant_condition_note(source, start - 1) {
                    text.push('\n');
                    text.push_str(&note);
                }
                text
            }
            "else" => "@else { markup }\nRenders the block when the preceding @if condition is falsy.".to_string(),
            _ => {
                let origin = if scope_identifiers(source).iter().any(|n| n == word) {
                    "in scope"
                } else {
                    "not declared in this component"
                };
                let mut text =
                    format!("@{}\nInterpolates the value of `{}` ({}).", word, word, origin);
                if let Some(value) = static_scope(source).get(word) {
                    text.push_str(&format!("\nStatic value: `{}`", value));
                }
                text
            }
        }
    } else if let Some(kind) = ComponentKind::from_keyword(word) {
        let summary = match kind {
            ComponentKind::Ephemeral => "Component without persisted state.",
            ComponentKind::Persistent => "Component whose state is kept across renders.",
        };
        format!(
            "{}\n{} Compiles to a class extending `{}`.",
            kind.keyword(),
            summary,
            kind.base_class()
        )
    } else if word == "render" {
        "render(markup)\nThe component's markup template. Must be the last statement of the body.".to_string()
    } else {
        return None;
    };

    let start = if directive { start - 1 } else { start };
    Some(QuickInfo {
        start,
        length: end - start,
        text,
    })
}

/// Values of prelude `const` bindings whose initializers resolve statically.
pub fn static_scope(source: &str) -> HashMap<String, String> {
    let mut scope = HashMap::new();
    for cap in CONST_RE.captures_iter(source) {
        let (Some(name), Some(init)) = (cap.get(1), cap.get(2)) else {
            continue;
        };
        if let Some(value) = static_eval(init.as_str(), &scope) {
            scope.insert(name.as_str().to_string(), value);
        }
    }
    scope
}

/// Describe an `@if` at `at` whose condition is constant given `static_scope`.
fn constant_condition_note(source: &str, at: usize) -> Option<String> {
    let scanner = Scanner::new(source);
    let paren = scanner.conditional_at(at)?;
    let close = scanner.find_closing(paren)?;
    let condition = source[paren + 1..close].trim();
    let note = if eval_condition(condition, &static_scope(source))? {
        format!("Condition `{}` is always true; the block always renders.", condition)
    } else {
        format!("Condition `{}` is always false; the block never renders.", condition)
    };
    Some(note)
}

fn clamp_offset(source: &str, offset: usize) -> usize {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
#[napi]
pub fn resolve_snapshot_native(filename: String, source: String) -> String {
    resolve_snapshot(&filename, &source)
}
