//! Static Markup Preview for the Dribble Compiler
//!
//! Evaluates a parsed markup tree at compile time against known values,
//! producing the string the generated module would render. Only simple
//! expressions resolve: literals, identifiers from the scope, `!`, `&&`, `||`,
//! comparisons, `+` concatenation and ternaries. Anything else yields `None`.
//!
//! Used by editor hover previews and by tests of the lowering semantics.

use std::collections::HashMap;

use crate::ir::MarkupNode;

/// Render markup nodes with the given scope. Returns `None` if any
/// interpolation or condition cannot be resolved statically.
pub fn preview_markup(nodes: &[MarkupNode], scope: &HashMap<String, String>) -> Option<String> {
    let mut out = String::new();
    for node in nodes {
        match node {
            MarkupNode::Text { content } => out.push_str(content),
            MarkupNode::Interpolation { name } => out.push_str(scope.get(name)?),
            MarkupNode::Conditional {
                condition,
                body,
                alternate,
            } => {
                let branch = if eval_condition(condition, scope)? {
                    body
                } else {
                    alternate
                };
                out.push_str(&preview_markup(branch, scope)?);
            }
        }
    }
    Some(out)
}

/// Evaluate a condition to its JavaScript truthiness.
pub fn eval_condition(expr: &str, scope: &HashMap<String, String>) -> Option<bool> {
    static_eval(expr, scope).map(|value| is_truthy(&value))
}

/// Try to evaluate an expression to a static string value.
pub fn static_eval(expr: &str, scope: &HashMap<String, String>) -> Option<String> {
    let mut trimmed = expr.trim();
    while let Some(stripped) = trimmed.strip_suffix(';') {
        trimmed = stripped.trim_end();
    }

    if trimmed.is_empty() {
        return Some(String::new());
    }

    if let Some(inner) = strip_outer_parens(trimmed) {
        return static_eval(inner, scope);
    }

    if let Some(resolved) = try_resolve_ternary(trimmed, scope) {
        return Some(resolved);
    }

    // Lowest precedence first.
    let groups: [&[&'static str]; 4] = [
        &["||"],
        &["&&"],
        &["===", "!==", "==", "!="],
        &[">=", "<=", ">", "<"],
    ];
    for ops in groups {
        if let Some((left, op, right)) = split_binary(trimmed, ops) {
            return eval_binary(left, op, right, scope);
        }
    }

    if let Some(resolved) = try_resolve_concatenation(trimmed, scope) {
        return Some(resolved);
    }

    if let Some(operand) = trimmed.strip_prefix('!') {
        let value = static_eval(operand, scope)?;
        return Some((!is_truthy(&value)).to_string());
    }

    if let Some(literal) = try_parse_string_literal(trimmed) {
        return Some(literal);
    }

    if let Ok(num) = trimmed.parse::<f64>() {
        return Some(format_number(num));
    }

    match trimmed {
        "true" | "false" | "null" | "undefined" => return Some(trimmed.to_string()),
        _ => {}
    }

    if is_valid_identifier(trimmed) {
        return scope.get(trimmed).cloned();
    }

    None
}

fn is_truthy(value: &str) -> bool {
    !matches!(value, "" | "false" | "null" | "undefined" | "0" | "NaN")
}

fn format_number(num: f64) -> String {
    if num.fract() == 0.0 && num.abs() < 1e15 {
        format!("{}", num as i64)
    } else {
        num.to_string()
    }
}

fn eval_binary(left: &str, op: &str, right: &str, scope: &HashMap<String, String>) -> Option<String> {
    let l = static_eval(left, scope)?;
    match op {
        "||" => return if is_truthy(&l) { Some(l) } else { static_eval(right, scope) },
        "&&" => return if is_truthy(&l) { static_eval(right, scope) } else { Some(l) },
        _ => {}
    }

    let r = static_eval(right, scope)?;
    let numeric = l.parse::<f64>().ok().zip(r.parse::<f64>().ok());
    let result = match (op, numeric) {
        ("===" | "==", Some((a, b))) => a == b,
        ("!==" | "!=", Some((a, b))) => a != b,
        ("===" | "==", None) => l == r,
        ("!==" | "!=", None) => l != r,
        (">", Some((a, b))) => a > b,
        ("<", Some((a, b))) => a < b,
        (">=", Some((a, b))) => a >= b,
        ("<=", Some((a, b))) => a <= b,
        (">", None) => l > r,
        ("<", None) => l < r,
        (">=", None) => l >= r,
        ("<=", None) => l <= r,
        _ => return None,
    };
    Some(result.to_string())
}

/// Visit each top-level byte offset of `expr` (outside strings and brackets).
fn top_level_offsets(expr: &str) -> Vec<usize> {
    let bytes = expr.as_bytes();
    let mut offsets = Vec::new();
    let mut depth: i32 = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            b'"' | b'\'' | b'`' => {
                let quote = bytes[i];
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            _ if depth == 0 && expr.is_char_boundary(i) => offsets.push(i),
            _ => {}
        }
        i += 1;
    }

    offsets
}

/// Split at the rightmost top-level occurrence of any operator in `ops`, so
/// operators of equal precedence associate left.
fn split_binary<'e>(expr: &'e str, ops: &[&'static str]) -> Option<(&'e str, &'static str, &'e str)> {
    let offsets = top_level_offsets(expr);
    for &i in offsets.iter().rev() {
        for &op in ops {
            if !expr[i..].starts_with(op) || i == 0 {
                continue;
            }
            // Keep `>=` from also matching as `>` followed by `=`, and `!==` as `==`.
            let prev = expr.as_bytes()[i - 1];
            let next = expr.as_bytes().get(i + op.len()).copied();
            if matches!(prev, b'=' | b'!' | b'<' | b'>') || next == Some(b'=') {
                continue;
            }
            if (op == ">" || op == "<") && next == Some(b'>') {
                continue;
            }
            let left = &expr[..i];
            let right = &expr[i + op.len()..];
            if left.trim().is_empty() || right.trim().is_empty() {
                continue;
            }
            return Some((left, op, right));
        }
    }
    None
}

/// `(inner)` where the outer parens enclose the whole expression.
fn strip_outer_parens(expr: &str) -> Option<&str> {
    let inner = expr.strip_prefix('(')?.strip_suffix(')')?;
    let mut depth = 0i32;
    for b in inner.bytes() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            _ => {}
        }
    }
    (depth == 0).then_some(inner)
}

/// Try to parse a string literal (single, double, or backtick quoted)
fn try_parse_string_literal(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.len() < 2 {
        return None;
    }

    if (trimmed.starts_with('"') && trimmed.ends_with('"'))
        || (trimmed.starts_with('\'') && trimmed.ends_with('\''))
    {
        let inner = &trimmed[1..trimmed.len() - 1];
        return Some(unescape_string(inner));
    }

    if trimmed.starts_with('`') && trimmed.ends_with('`') {
        let inner = &trimmed[1..trimmed.len() - 1];
        if !inner.contains("${") {
            return Some(unescape_string(inner));
        }
    }

    None
}

/// Unescape basic string escape sequences
fn unescape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some('\'') => result.push('\''),
                Some('`') => result.push('`'),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Try to resolve a ternary expression
fn try_resolve_ternary(expr: &str, scope: &HashMap<String, String>) -> Option<String> {
    let bytes = expr.as_bytes();
    let offsets = top_level_offsets(expr);
    let question = offsets.iter().copied().find(|&i| {
        bytes[i] == b'?' && !matches!(bytes.get(i + 1), Some(b'?') | Some(b'.'))
            && (i == 0 || bytes[i - 1] != b'?')
    })?;
    let colon = offsets
        .iter()
        .copied()
        .find(|&i| i > question && bytes[i] == b':')?;

    let condition = &expr[..question];
    let consequent = &expr[question + 1..colon];
    let alternate = &expr[colon + 1..];

    if eval_condition(condition, scope)? {
        static_eval(consequent, scope)
    } else {
        static_eval(alternate, scope)
    }
}

/// Try to resolve string concatenation
fn try_resolve_concatenation(expr: &str, scope: &HashMap<String, String>) -> Option<String> {
    let bytes = expr.as_bytes();
    let splits: Vec<usize> = top_level_offsets(expr)
        .into_iter()
        .filter(|&i| bytes[i] == b'+')
        .collect();
    if splits.is_empty() {
        return None;
    }

    // Left to right: numbers add until a string operand is reached.
    let mut sum: Option<f64> = Some(0.0);
    let mut result = String::new();
    let mut last = 0;
    for i in splits.into_iter().chain(std::iter::once(expr.len())) {
        let operand = &expr[last..i];
        let value = static_eval(operand, scope)?;
        match (sum, value.parse::<f64>()) {
            (Some(acc), Ok(num)) if try_parse_string_literal(operand).is_none() => {
                sum = Some(acc + num)
            }
            (Some(acc), _) => {
                if last > 0 {
                    result.push_str(&format_number(acc));
                }
                result.push_str(&value);
                sum = None;
            }
            (None, _) => result.push_str(&value),
        }
        last = i + 1;
    }
    Some(sum.map(format_number).unwrap_or(result))
}

/// Check if a string is a valid identifier
fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();

    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }

    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse_markup;

    fn scope(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_string_literals() {
        let s = HashMap::new();
        assert_eq!(static_eval("\"Hello\"", &s), Some("Hello".to_string()));
        assert_eq!(static_eval("'World'", &s), Some("World".to_string()));
    }

    #[test]
    fn test_identifier_resolution() {
        let s = scope(&[("title", "Home")]);
        assert_eq!(static_eval("title", &s), Some("Home".to_string()));
        assert_eq!(static_eval("missing", &s), None);
    }

    #[test]
    fn test_concatenation() {
        let s = scope(&[("title", "Home")]);
        assert_eq!(
            static_eval("\"Dribble | \" + title", &s),
            Some("Dribble | Home".to_string())
        );
        assert_eq!(static_eval("1 + 2", &s), Some("3".to_string()));
        assert_eq!(static_eval("1 + 2 + \"px\"", &s), Some("3px".to_string()));
        assert_eq!(static_eval("\"#\" + 1 + 2", &s), Some("#12".to_string()));
    }

    #[test]
    fn test_comparisons() {
        let s = scope(&[("itemId", "2")]);
        assert_eq!(eval_condition("itemId > 0", &s), Some(true));
        assert_eq!(eval_condition("itemId >= 3", &s), Some(false));
        assert_eq!(eval_condition("itemId === 2", &s), Some(true));
        assert_eq!(eval_condition("itemId !== 2", &s), Some(false));
        assert_eq!(eval_condition("itemId < 10 && itemId > 1", &s), Some(true));
        assert_eq!(eval_condition("!itemId || itemId == 2", &s), Some(true));
        assert_eq!(eval_condition("(itemId > 5)", &s), Some(false));
    }

    #[test]
    fn test_truthiness() {
        let s = scope(&[("zero", "0"), ("empty", ""), ("name", "x")]);
        assert_eq!(eval_condition("zero", &s), Some(false));
        assert_eq!(eval_condition("empty", &s), Some(false));
        assert_eq!(eval_condition("name", &s), Some(true));
        assert_eq!(eval_condition("!name", &s), Some(false));
    }

    #[test]
    fn test_ternary() {
        let s = HashMap::new();
        assert_eq!(static_eval("true ? 'Yes' : 'No'", &s), Some("Yes".to_string()));
        assert_eq!(static_eval("false ? 'Yes' : 'No'", &s), Some("No".to_string()));
    }

    #[test]
    fn test_non_ascii_expressions() {
        let s = scope(&[("café", "1"), ("label", "é"), ("name", "ü")]);
        assert_eq!(static_eval("é", &HashMap::new()), None);
        assert_eq!(eval_condition("café", &s), Some(true));
        assert_eq!(eval_condition("label === 'é'", &s), Some(true));
        assert_eq!(eval_condition("label !== \"ö\" && café", &s), Some(true));
        assert_eq!(
            static_eval("\"naïve \" + name", &s),
            Some("naïve ü".to_string())
        );

        let nodes = parse_markup("@if (café > 0) {<p>ok</p>}").unwrap();
        assert_eq!(preview_markup(&nodes, &s), Some("<p>ok</p>".to_string()));
    }

    #[test]
    fn test_unresolvable() {
        let s = HashMap::new();
        assert_eq!(static_eval("items.length", &s), None);
        assert_eq!(eval_condition("f(x)", &s), None);
    }

    #[test]
    fn test_preview_interpolation() {
        let nodes = parse_markup("<div>@itemId</div>").unwrap();
        assert_eq!(
            preview_markup(&nodes, &scope(&[("itemId", "2")])),
            Some("<div>2</div>".to_string())
        );
    }

    #[test]
    fn test_preview_conditional_branches() {
        let nodes = parse_markup("@if (itemId > 0) {<span>Item @itemId</span>}").unwrap();
        assert_eq!(
            preview_markup(&nodes, &scope(&[("itemId", "2")])),
            Some("<span>Item 2</span>".to_string())
        );
        assert_eq!(
            preview_markup(&nodes, &scope(&[("itemId", "0")])),
            Some(String::new())
        );
    }

    #[test]
    fn test_preview_else_and_nesting() {
        let nodes = parse_markup("@if (a) {A@if (b) {B} @else {b}} @else {none}").unwrap();
        assert_eq!(
            preview_markup(&nodes, &scope(&[("a", "1"), ("b", "false")])),
            Some("Ab".to_string())
        );
        assert_eq!(
            preview_markup(&nodes, &scope(&[("a", "0"), ("b", "1")])),
            Some("none".to_string())
        );
    }

    #[test]
    fn test_preview_unknown_identifier() {
        let nodes = parse_markup("<p>@missing</p>").unwrap();
        assert_eq!(preview_markup(&nodes, &HashMap::new()), None);
    }
}
