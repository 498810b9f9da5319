//! Delimiter-aware scanning over component source.
//!
//! Host-language spans (header parameters, the prelude, `@if` conditions) are
//! scanned in *code mode*: string literals, template literals and comments are
//! skipped as units, and `(`/`[`/`{` are balanced against their closers.
//! Markup spans are scanned in *markup mode*, where only braces count, since
//! text like `Don't` must not open a string.
//!
//! All delimiters are ASCII, so scanning works on bytes and every returned
//! offset is a char boundary.

/// Cursor-free scanner over one source text.
#[derive(Debug, Clone, Copy)]
pub struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
}

pub fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

pub fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
        }
    }

    pub fn source(&self) -> &'a str {
        self.src
    }

    pub fn byte(&self, i: usize) -> Option<u8> {
        self.bytes.get(i).copied()
    }

    /// Index of the first non-whitespace byte at or after `i`.
    pub fn skip_whitespace(&self, mut i: usize) -> usize {
        while i < self.bytes.len() && self.bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        i
    }

    /// Index just past the identifier starting at `i` (or `i` if none starts there).
    pub fn ident_end(&self, i: usize) -> usize {
        if i >= self.bytes.len() || !is_ident_start(self.bytes[i]) {
            return i;
        }
        let mut j = i + 1;
        while j < self.bytes.len() && is_ident_continue(self.bytes[j]) {
            j += 1;
        }
        j
    }

    /// If a comment or string literal starts at `i`, returns the index just past
    /// it. Unterminated literals run to the end of input.
    pub fn skip_literal(&self, i: usize) -> Option<usize> {
        let b = self.byte(i)?;
        match b {
            b'/' => match self.byte(i + 1) {
                Some(b'/') => {
                    let end = self.src[i..]
                        .find('\n')
                        .map(|n| i + n + 1)
                        .unwrap_or(self.bytes.len());
                    Some(end)
                }
                Some(b'*') => {
                    let end = self.src[i + 2..]
                        .find("*/")
                        .map(|n| i + 2 + n + 2)
                        .unwrap_or(self.bytes.len());
                    Some(end)
                }
                _ => None,
            },
            b'"' | b'\'' => Some(self.skip_quoted(i, b)),
            b'`' => Some(self.skip_template(i)),
            _ => None,
        }
    }

    fn skip_quoted(&self, open: usize, quote: u8) -> usize {
        let mut i = open + 1;
        while i < self.bytes.len() {
            match self.bytes[i] {
                b'\\' => i += 2,
                b if b == quote => return i + 1,
                // A raw newline ends a broken single-line string.
                b'\n' => return i + 1,
                _ => i += 1,
            }
        }
        self.bytes.len()
    }

    fn skip_template(&self, open: usize) -> usize {
        let mut i = open + 1;
        while i < self.bytes.len() {
            match self.bytes[i] {
                b'\\' => i += 2,
                b'`' => return i + 1,
                b'$' if self.byte(i + 1) == Some(b'{') => match self.find_closing(i + 1) {
                    Some(close) => i = close + 1,
                    None => return self.bytes.len(),
                },
                _ => i += 1,
            }
        }
        self.bytes.len()
    }

    /// Code mode: index of the delimiter that balances the `(`, `[` or `{` at `open`.
    pub fn find_closing(&self, open: usize) -> Option<usize> {
        if !matches!(self.byte(open)?, b'(' | b'[' | b'{') {
            return None;
        }
        // Mismatched closer kinds are tolerated; host code is opaque text.
        let mut depth = 0usize;
        let mut i = open;
        while i < self.bytes.len() {
            if let Some(next) = self.skip_literal(i) {
                i = next;
                continue;
            }
            match self.bytes[i] {
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
            i += 1;
        }
        None
    }

    /// Whether `target` lies outside every comment and string literal, scanning
    /// in code mode from the start of the source.
    pub fn is_code_position(&self, target: usize) -> bool {
        let mut i = 0;
        while i < target && i < self.bytes.len() {
            match self.skip_literal(i) {
                Some(next) => {
                    if next > target {
                        return false;
                    }
                    i = next;
                }
                None => i += 1,
            }
        }
        true
    }

    /// Whether an `@if` directive (`@if` + optional whitespace + `(`) starts at `i`.
    /// Returns the index of its `(`.
    pub fn conditional_at(&self, i: usize) -> Option<usize> {
        if self.byte(i)? != b'@' || !self.src[i + 1..].starts_with("if") {
            return None;
        }
        let after = i + 3;
        if self.byte(after).is_some_and(is_ident_continue) {
            return None;
        }
        let paren = self.skip_whitespace(after);
        (self.byte(paren)? == b'(').then_some(paren)
    }

    /// Markup mode: starting inside a brace group at `from`, returns the first
    /// depth-0 `}` for which `accept` holds. Rejected braces are markup text.
    /// `@if (...)` conditions are skipped in code mode.
    pub fn find_markup_close(&self, from: usize, accept: impl Fn(usize) -> bool) -> Option<usize> {
        let mut depth = 0usize;
        let mut i = from;
        while i < self.bytes.len() {
            if let Some(paren) = self.conditional_at(i) {
                i = self.find_closing(paren)? + 1;
                continue;
            }
            match self.bytes[i] {
                b'{' => depth += 1,
                b'}' if depth == 0 && accept(i) => return Some(i),
                b'}' => depth = depth.saturating_sub(1),
                _ => {}
            }
            i += 1;
        }
        None
    }
}
