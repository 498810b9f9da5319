//! Markup lowering.
//!
//! Turns a parsed markup tree into a single expression that evaluates to the
//! rendered string at runtime. The top level becomes a template literal;
//! conditional bodies become string concatenations inside an immediately
//! invoked arrow function.

use crate::ir::MarkupNode;
use crate::markup::{parse_markup, MarkupError};

/// Translate a render directive argument into a string-producing expression.
pub fn translate_markup(render_argument: &str) -> Result<String, MarkupError> {
    let nodes = parse_markup(trim_blank_lines(render_argument))?;
    Ok(lower_template(&nodes))
}

/// Drop leading and trailing blank lines while keeping the indentation of the
/// first and last content lines.
pub fn trim_blank_lines(text: &str) -> &str {
    let mut start = 0;
    for line in text.split_inclusive('\n') {
        if !line.trim().is_empty() {
            break;
        }
        start += line.len();
    }

    let rest = &text[start..];
    let mut end = rest.len();
    while let Some(nl) = rest[..end].rfind('\n') {
        if !rest[nl..end].trim().is_empty() {
            break;
        }
        end = nl;
    }

    let kept = &rest[..end];
    if kept.trim().is_empty() {
        return "";
    }
    kept.trim_end_matches('\r')
}

// ═══════════════════════════════════════════════════════════════════════════════
// ESCAPING
// ═══════════════════════════════════════════════════════════════════════════════

/// Escape markup text for embedding in a template literal: backslashes,
/// backticks and `${` would otherwise change or end the literal.
pub fn escape_template_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            _ => out.push(c),
        }
    }
    out
}

/// Quote text as a string literal. JSON string syntax is valid JavaScript and
/// round-trips every character, including whitespace.
fn quote_string(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOWERING
// ═══════════════════════════════════════════════════════════════════════════════

/// Lower top-level nodes to a template literal.
pub fn lower_template(nodes: &[MarkupNode]) -> String {
    let mut out = String::from("`");
    for node in nodes {
        match node {
            MarkupNode::Text { content } => out.push_str(&escape_template_text(content)),
            MarkupNode::Interpolation { name } => {
                out.push_str("${");
                out.push_str(name);
                out.push('}');
            }
            MarkupNode::Conditional {
                condition,
                body,
                alternate,
            } => {
                out.push_str("${");
                out.push_str(&lower_conditional(condition, body, alternate));
                out.push('}');
            }
        }
    }
    out.push('`');
    out
}

fn lower_conditional(condition: &str, body: &[MarkupNode], alternate: &[MarkupNode]) -> String {
    format!(
        "(() => {{ if ({}) {{ return {}; }} return {}; }})()",
        condition,
        lower_concat(body),
        lower_concat(alternate)
    )
}

/// Lower nodes to a `+` concatenation of string operands.
fn lower_concat(nodes: &[MarkupNode]) -> String {
    let mut operands: Vec<String> = Vec::new();
    for node in nodes {
        match node {
            MarkupNode::Text { content } if content.is_empty() => {}
            MarkupNode::Text { content } => operands.push(quote_string(content)),
            MarkupNode::Interpolation { name } => operands.push(format!("({})", name)),
            MarkupNode::Conditional {
                condition,
                body,
                alternate,
            } => operands.push(lower_conditional(condition, body, alternate)),
        }
    }

    if operands.is_empty() {
        return "\"\"".to_string();
    }
    // `(a) + (b)` would add numbers; anchor the chain on a string.
    if !operands[0].starts_with('"') {
        operands.insert(0, "\"\"".to_string());
    }
    operands.join(" + ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_literal() {
        assert_eq!(translate_markup("<p>hi</p>").unwrap(), "`<p>hi</p>`");
    }

    #[test]
    fn test_interpolation_placeholder() {
        assert_eq!(
            translate_markup("<div>@itemId</div>").unwrap(),
            "`<div>${itemId}</div>`"
        );
    }

    #[test]
    fn test_conditional_expression() {
        assert_eq!(
            translate_markup("@if (itemId > 0) { <span>Item @itemId</span> }").unwrap(),
            "`${(() => { if (itemId > 0) { return \" <span>Item \" + (itemId) + \"</span> \"; } return \"\"; })()}`"
        );
    }

    #[test]
    fn test_conditional_whitespace_round_trips() {
        let out = translate_markup("@if (a) {\r\n  <b>\t@x</b>\r\n}").unwrap();
        assert!(out.contains("return \"\\r\\n  <b>\\t\" + (x) + \"</b>\\r\\n\";"));
    }

    #[test]
    fn test_conditional_leading_identifier_is_string_anchored() {
        let out = translate_markup("@if (a) {@x@y}").unwrap();
        assert!(out.contains("return \"\" + (x) + (y);"));
    }

    #[test]
    fn test_empty_conditional_body() {
        let out = translate_markup("@if (a) {}").unwrap();
        assert_eq!(
            out,
            "`${(() => { if (a) { return \"\"; } return \"\"; })()}`"
        );
    }

    #[test]
    fn test_else_branch_lowering() {
        let out = translate_markup("@if (a) {yes} @else {no @n}").unwrap();
        assert_eq!(
            out,
            "`${(() => { if (a) { return \"yes\"; } return \"no \" + (n); })()}`"
        );
    }

    #[test]
    fn test_nested_conditional_lowering() {
        let out = translate_markup("@if (a) {A@if (b) {B}}").unwrap();
        assert_eq!(
            out,
            "`${(() => { if (a) { return \"A\" + (() => { if (b) { return \"B\"; } return \"\"; })(); } return \"\"; })()}`"
        );
    }

    #[test]
    fn test_escapes_template_delimiters() {
        assert_eq!(
            translate_markup("<code>`x` ${y} \\n</code>").unwrap(),
            "`<code>\\`x\\` \\${y} \\\\n</code>`"
        );
    }

    #[test]
    fn test_backtick_in_condition_not_escaped() {
        let out = translate_markup("@if (a === `x`) {y}").unwrap();
        assert!(out.contains("if (a === `x`)"));
    }

    #[test]
    fn test_bare_if_and_stray_else_stay_literal() {
        assert_eq!(
            translate_markup("<p>@if</p> @else {x} @this").unwrap(),
            "`<p>@if</p> @else {x} @this`"
        );
    }

    #[test]
    fn test_trim_blank_lines() {
        assert_eq!(trim_blank_lines("\n\n  <p>a</p>\n  \n"), "  <p>a</p>");
        assert_eq!(trim_blank_lines("<p>a</p>"), "<p>a</p>");
        assert_eq!(trim_blank_lines("  \r\n<p>\n</p>\r\n"), "<p>\n</p>");
        assert_eq!(trim_blank_lines("\n \n"), "");
    }

    #[test]
    fn test_translation_is_deterministic() {
        let input = "<ul>@if (a) { <li>@b</li> @if (c) { @d } }</ul>";
        assert_eq!(translate_markup(input).unwrap(), translate_markup(input).unwrap());
    }

    #[test]
    fn test_malformed_markup_propagates() {
        assert!(translate_markup("@if (a) { open").is_err());
    }
}
