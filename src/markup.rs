//! Markup parser for render directive arguments.
//!
//! Grammar (recursive descent, one left-to-right pass):
//!
//! ```text
//! nodes       := (conditional | interpolation | text)*
//! conditional := "@if" ws? "(" <code> ")" ws? "{" nodes "}" (ws? "@else" ws? ("{" nodes "}" | conditional))?
//! interpolation := "@" identifier
//! text        := anything else; `{`/`}` pairs inside text stay balanced
//! ```
//!
//! Conditional bodies use the same grammar as the outer markup, so `@if`
//! blocks nest to any depth.

use thiserror::Error;

use crate::ir::MarkupNode;
use crate::scanner::{is_ident_continue, Scanner};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {offset}")]
pub struct MarkupError {
    pub offset: usize,
    pub message: String,
}

impl MarkupError {
    fn new(offset: usize, message: &str) -> Self {
        Self {
            offset,
            message: message.to_string(),
        }
    }
}

/// Parse markup text into a node tree.
pub fn parse_markup(input: &str) -> Result<Vec<MarkupNode>, MarkupError> {
    let mut parser = MarkupParser {
        scanner: Scanner::new(input),
        pos: 0,
    };
    parser.parse_nodes(None)
}

struct MarkupParser<'a> {
    scanner: Scanner<'a>,
    pos: usize,
}

/// JavaScript reserved words cannot be interpolated; `@if` without a condition
/// and a stray `@else` stay literal text.
fn is_reserved_word(name: &str) -> bool {
    matches!(
        name,
        "break" | "case" | "catch" | "class" | "const" | "continue" | "debugger" | "default"
            | "delete" | "do" | "else" | "enum" | "export" | "extends" | "false" | "finally"
            | "for" | "function" | "if" | "import" | "in" | "instanceof" | "new" | "null"
            | "return" | "super" | "switch" | "this" | "throw" | "true" | "try" | "typeof"
            | "var" | "void" | "while" | "with" | "yield" | "let" | "static" | "await"
    )
}

fn flush_text(text: &mut String, nodes: &mut Vec<MarkupNode>) {
    if !text.is_empty() {
        nodes.push(MarkupNode::Text {
            content: std::mem::take(text),
        });
    }
}

impl<'a> MarkupParser<'a> {
    fn src(&self) -> &'a str {
        self.scanner.source()
    }

    /// Parse nodes until end of input, or until the `}` closing the block opened
    /// at `block_open` (which is consumed).
    fn parse_nodes(&mut self, block_open: Option<usize>) -> Result<Vec<MarkupNode>, MarkupError> {
        let mut nodes = Vec::new();
        let mut text = String::new();
        let mut brace_depth = 0usize;

        loop {
            let Some(b) = self.scanner.byte(self.pos) else {
                if let Some(open) = block_open {
                    return Err(MarkupError::new(open, "unterminated @if block"));
                }
                break;
            };

            match b {
                b'@' => {
                    if let Some(paren) = self.scanner.conditional_at(self.pos) {
                        flush_text(&mut text, &mut nodes);
                        let node = self.parse_conditional(paren)?;
                        nodes.push(node);
                        continue;
                    }
                    let end = self.scanner.ident_end(self.pos + 1);
                    if end > self.pos + 1 && !is_reserved_word(&self.src()[self.pos + 1..end]) {
                        flush_text(&mut text, &mut nodes);
                        nodes.push(MarkupNode::Interpolation {
                            name: self.src()[self.pos + 1..end].to_string(),
                        });
                        self.pos = end;
                    } else {
                        text.push('@');
                        self.pos += 1;
                    }
                }
                b'{' => {
                    brace_depth += 1;
                    text.push('{');
                    self.pos += 1;
                }
                b'}' if brace_depth == 0 && block_open.is_some() => {
                    self.pos += 1;
                    break;
                }
                b'}' => {
                    brace_depth = brace_depth.saturating_sub(1);
                    text.push('}');
                    self.pos += 1;
                }
                _ => {
                    let rest = &self.src()[self.pos..];
                    let run = rest
                        .find(|c: char| c == '@' || c == '{' || c == '}')
                        .unwrap_or(rest.len());
                    text.push_str(&rest[..run]);
                    self.pos += run;
                }
            }
        }

        flush_text(&mut text, &mut nodes);
        Ok(nodes)
    }

    /// Parse `@if (...) { ... }` whose condition opens at `paren`, plus any `@else` branch.
    fn parse_conditional(&mut self, paren: usize) -> Result<MarkupNode, MarkupError> {
        let close = self
            .scanner
            .find_closing(paren)
            .ok_or_else(|| MarkupError::new(paren, "unterminated @if condition"))?;

        let condition = self.src()[paren + 1..close].trim().to_string();
        if condition.is_empty() {
            return Err(MarkupError::new(paren, "empty @if condition"));
        }

        let brace = self.scanner.skip_whitespace(close + 1);
        if self.scanner.byte(brace) != Some(b'{') {
            return Err(MarkupError::new(brace, "expected `{` after @if condition"));
        }
        self.pos = brace + 1;
        let body = self.parse_nodes(Some(brace))?;
        let alternate = self.parse_else()?;

        Ok(MarkupNode::Conditional {
            condition,
            body,
            alternate,
        })
    }

    fn parse_else(&mut self) -> Result<Vec<MarkupNode>, MarkupError> {
        let at = self.scanner.skip_whitespace(self.pos);
        let is_else = self.src()[at..].starts_with("@else")
            && !self.scanner.byte(at + 5).is_some_and(is_ident_continue);
        if !is_else {
            return Ok(Vec::new());
        }

        let next = self.scanner.skip_whitespace(at + 5);
        if let Some(paren) = self.scanner.conditional_at(next) {
            return Ok(vec![self.parse_conditional(paren)?]);
        }
        if self.scanner.byte(next) != Some(b'{') {
            return Err(MarkupError::new(next, "expected `{` after @else"));
        }
        self.pos = next + 1;
        self.parse_nodes(Some(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> MarkupNode {
        MarkupNode::Text {
            content: s.to_string(),
        }
    }

    fn interp(s: &str) -> MarkupNode {
        MarkupNode::Interpolation {
            name: s.to_string(),
        }
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(parse_markup("<p>hello</p>").unwrap(), vec![text("<p>hello</p>")]);
        assert_eq!(parse_markup("").unwrap(), vec![]);
    }

    #[test]
    fn test_interpolation() {
        assert_eq!(
            parse_markup("<div>@itemId</div>").unwrap(),
            vec![text("<div>"), interp("itemId"), text("</div>")]
        );
    }

    #[test]
    fn test_interpolation_stops_at_non_identifier() {
        assert_eq!(
            parse_markup("@a.b @_x1-@2").unwrap(),
            vec![interp("a"), text(".b "), interp("_x1"), text("-@2")]
        );
    }

    #[test]
    fn test_lone_at_is_text() {
        assert_eq!(parse_markup("a @ b @").unwrap(), vec![text("a @ b @")]);
    }

    #[test]
    fn test_reserved_words_are_text() {
        assert_eq!(
            parse_markup("@if not a condition @else @class @item").unwrap(),
            vec![text("@if not a condition @else @class "), interp("item")]
        );
    }

    #[test]
    fn test_conditional() {
        let nodes = parse_markup("@if (itemId > 0) { <span>Item @itemId</span> }").unwrap();
        assert_eq!(
            nodes,
            vec![MarkupNode::Conditional {
                condition: "itemId > 0".to_string(),
                body: vec![text(" <span>Item "), interp("itemId"), text("</span> ")],
                alternate: vec![],
            }]
        );
    }

    #[test]
    fn test_conditional_without_space() {
        let nodes = parse_markup("@if(a){x}").unwrap();
        assert_eq!(
            nodes,
            vec![MarkupNode::Conditional {
                condition: "a".to_string(),
                body: vec![text("x")],
                alternate: vec![],
            }]
        );
    }

    #[test]
    fn test_nested_conditionals() {
        let nodes = parse_markup("@if (a) { A @if (b) { B } C } D").unwrap();
        assert_eq!(
            nodes,
            vec![
                MarkupNode::Conditional {
                    condition: "a".to_string(),
                    body: vec![
                        text(" A "),
                        MarkupNode::Conditional {
                            condition: "b".to_string(),
                            body: vec![text(" B ")],
                            alternate: vec![],
                        },
                        text(" C "),
                    ],
                    alternate: vec![],
                },
                text(" D"),
            ]
        );
    }

    #[test]
    fn test_condition_with_parens_and_braces() {
        let nodes = parse_markup("@if (f(a) && g({ x: ')' })) { ok }").unwrap();
        match &nodes[0] {
            MarkupNode::Conditional { condition, .. } => {
                assert_eq!(condition, "f(a) && g({ x: ')' })");
            }
            other => panic!("expected conditional, got {:?}", other),
        }
    }

    #[test]
    fn test_balanced_braces_in_block_text() {
        let nodes = parse_markup("@if (a) { <style>p { color: red }</style> }").unwrap();
        assert_eq!(
            nodes,
            vec![MarkupNode::Conditional {
                condition: "a".to_string(),
                body: vec![text(" <style>p { color: red }</style> ")],
                alternate: vec![],
            }]
        );
    }

    #[test]
    fn test_else_branch() {
        let nodes = parse_markup("@if (a) { yes }\n@else { no }!").unwrap();
        assert_eq!(
            nodes,
            vec![
                MarkupNode::Conditional {
                    condition: "a".to_string(),
                    body: vec![text(" yes ")],
                    alternate: vec![text(" no ")],
                },
                text("!"),
            ]
        );
    }

    #[test]
    fn test_else_if_chain() {
        let nodes = parse_markup("@if (a) {1} @else @if (b) {2} @else {3}").unwrap();
        assert_eq!(
            nodes,
            vec![MarkupNode::Conditional {
                condition: "a".to_string(),
                body: vec![text("1")],
                alternate: vec![MarkupNode::Conditional {
                    condition: "b".to_string(),
                    body: vec![text("2")],
                    alternate: vec![text("3")],
                }],
            }]
        );
    }

    #[test]
    fn test_elsewhere_is_interpolation() {
        let nodes = parse_markup("@if (a) {1} @elsewhere").unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[2], interp("elsewhere"));
    }

    #[test]
    fn test_top_level_stray_brace_is_text() {
        assert_eq!(parse_markup("a } b").unwrap(), vec![text("a } b")]);
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            parse_markup("@if (a) { never closed").unwrap_err().message,
            "unterminated @if block"
        );
        assert_eq!(
            parse_markup("@if (a <p>").unwrap_err().message,
            "unterminated @if condition"
        );
        assert_eq!(
            parse_markup("@if (a) <p>").unwrap_err().message,
            "expected `{` after @if condition"
        );
        assert_eq!(
            parse_markup("@if () { x }").unwrap_err().message,
            "empty @if condition"
        );
        assert_eq!(
            parse_markup("@if (a) { x } @else <p>").unwrap_err().message,
            "expected `{` after @else"
        );
    }

    #[test]
    fn test_unicode_text_preserved() {
        assert_eq!(
            parse_markup("<p>héllo — @name ✓</p>").unwrap(),
            vec![text("<p>héllo — "), interp("name"), text(" ✓</p>")]
        );
    }
}
