//! Parse Module for the Dribble Compiler
//!
//! Locates the component declaration and splits its body into the prelude and
//! the render directive argument. Both steps use the delimiter-aware
//! [`Scanner`], so braces and parentheses inside strings, comments and
//! template literals never end a span early.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{CompilerError, ErrorKind, SourceLocation};
use crate::ir::{ComponentBody, ComponentHeader, ComponentKind, ComponentSource};
use crate::scanner::{is_ident_continue, is_ident_start, Scanner};

lazy_static! {
    /// Header candidate, up to and including the parameter list's `(`.
    static ref HEADER_RE: Regex =
        Regex::new(r"\bexport\s+(ephemeral|persistent)\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap();

    /// `render( ... )` closing the body, optionally followed by `;`.
    static ref RENDER_RE: Regex = Regex::new(r"(?s)^render\s*\((.*)\)\s*;?\s*$").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// HEADER EXTRACTOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Find the first `export <kind> <Name>(<params>) {` declaration in code position.
pub fn extract_header(source: ComponentSource<'_>) -> Result<ComponentHeader, CompilerError> {
    let text = source.text;
    let scanner = Scanner::new(text);

    for caps in HEADER_RE.captures_iter(text) {
        let (Some(whole), Some(keyword), Some(name)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };

        if !scanner.is_code_position(whole.start()) {
            continue;
        }

        let open_paren = whole.end() - 1;
        let Some(close_paren) = scanner.find_closing(open_paren) else {
            continue;
        };

        let open_brace = scanner.skip_whitespace(close_paren + 1);
        if scanner.byte(open_brace) != Some(b'{') {
            continue;
        }

        let Some(kind) = ComponentKind::from_keyword(keyword.as_str()) else {
            continue;
        };

        return Ok(ComponentHeader {
            kind,
            name: name.as_str().to_string(),
            raw_parameter_list: text[open_paren + 1..close_paren].to_string(),
            body_start_offset: open_brace + 1,
        });
    }

    Err(CompilerError::new(
        ErrorKind::InvalidHeader,
        source.path,
        SourceLocation::at(text, 0),
    ))
}

// ═══════════════════════════════════════════════════════════════════════════════
// BODY SPLITTER
// ═══════════════════════════════════════════════════════════════════════════════

/// Where the top-level scan of the body stopped.
enum BodyScan {
    /// Offset of the `render` identifier and of its `(`.
    Render { at: usize, paren: usize },
    /// The body closed at this `}` without a render directive.
    Closed(usize),
    Unterminated,
}

/// Scan the body in code mode until a top-level `render(` or the body's closing brace.
fn scan_body(scanner: &Scanner<'_>, start: usize) -> BodyScan {
    let mut depth = 0usize;
    let mut i = start;

    while let Some(b) = scanner.byte(i) {
        if let Some(next) = scanner.skip_literal(i) {
            i = next;
            continue;
        }

        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b'}' if depth == 0 => return BodyScan::Closed(i),
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            _ if is_ident_start(b) => {
                let prev = i.checked_sub(1).and_then(|p| scanner.byte(p));
                let member_or_word = prev.is_some_and(|p| is_ident_continue(p) || p == b'.' || p == b'$');
                let end = scanner.ident_end(i);
                if !member_or_word && depth == 0 && &scanner.source()[i..end] == "render" {
                    let paren = scanner.skip_whitespace(end);
                    if scanner.byte(paren) == Some(b'(') {
                        return BodyScan::Render { at: i, paren };
                    }
                }
                i = end;
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    BodyScan::Unterminated
}

/// Split the component body into its prelude and render argument.
pub fn split_body(
    source: ComponentSource<'_>,
    header: &ComponentHeader,
) -> Result<ComponentBody, CompilerError> {
    let text = source.text;
    let scanner = Scanner::new(text);
    let start = header.body_start_offset;
    let unterminated = || {
        CompilerError::new(
            ErrorKind::UnterminatedBody,
            source.path,
            SourceLocation::at(text, start.saturating_sub(1)),
        )
    };

    let (render_at, paren) = match scan_body(&scanner, start) {
        BodyScan::Render { at, paren } => (at, paren),
        BodyScan::Closed(end) if end <= start => return Err(unterminated()),
        BodyScan::Closed(_) => {
            return Err(CompilerError::new(
                ErrorKind::MissingRender,
                source.path,
                SourceLocation::at(text, start),
            ))
        }
        BodyScan::Unterminated => return Err(unterminated()),
    };

    // A `}` closes the body only where the render call ends right before it.
    // Other braces, balanced or not, belong to the markup text.
    let ends_render = |end: usize| RENDER_RE.is_match(&text[render_at..end]);
    let body_end = scanner
        .find_markup_close(paren + 1, ends_render)
        .or_else(|| {
            text[paren..]
                .rmatch_indices('}')
                .map(|(i, _)| paren + i)
                .find(|&end| ends_render(end))
        });

    let Some(body_end) = body_end else {
        if !text[paren..].contains('}') {
            return Err(unterminated());
        }
        return Err(CompilerError::with_context(
            ErrorKind::MalformedRender,
            source.path,
            SourceLocation::at(text, render_at),
            Some("render() must be the last statement of the component body".to_string()),
        ));
    };

    let argument = RENDER_RE
        .captures(&text[render_at..body_end])
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or_default();

    Ok(ComponentBody {
        prelude: text[start..render_at].trim().to_string(),
        render_argument: argument.trim().to_string(),
        render_offset: render_at,
    })
}
