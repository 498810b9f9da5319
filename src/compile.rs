//! Compile entry point.
//!
//! `compile` is the only interface the front ends call. It is pure: no I/O, no
//! shared state, and identical input always yields byte-identical output.

#[cfg(feature = "napi")]
use napi_derive::napi;

use crate::codegen::generate_module;
use crate::config::CompileOptions;
use crate::error::{CompilerError, ErrorKind, SourceLocation};
use crate::ir::{ComponentBody, ComponentHeader, ComponentSource, GeneratedModule, MarkupNode};
use crate::markup::parse_markup;
use crate::parse::{extract_header, split_body};
use crate::transform::{lower_template, trim_blank_lines};

pub type CompileResult = Result<GeneratedModule, CompilerError>;

/// Compile one component file with default options.
pub fn compile(path: &str, source: &str) -> CompileResult {
    compile_with_options(path, source, &CompileOptions::default())
}

pub fn compile_with_options(path: &str, source: &str, options: &CompileOptions) -> CompileResult {
    let component = analyze(path, source)?;
    let markup_expr = lower_template(&component.markup);
    let code = generate_module(&component.header, &component.body, &markup_expr, options);

    Ok(GeneratedModule {
        code,
        source_map: options.source_map.clone(),
    })
}

/// A component parsed up to the markup tree, before code generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentAnalysis {
    pub header: ComponentHeader,
    pub body: ComponentBody,
    pub markup: Vec<MarkupNode>,
}

/// Run every parsing stage and return the intermediate results.
pub fn analyze(path: &str, source: &str) -> Result<ComponentAnalysis, CompilerError> {
    let component = ComponentSource::new(path, source);
    let header = extract_header(component)?;
    let body = split_body(component, &header)?;
    let markup = parse_markup(trim_blank_lines(&body.render_argument)).map_err(|e| {
        CompilerError::with_context(
            ErrorKind::MalformedRender,
            path,
            SourceLocation::at(source, body.render_offset),
            Some(e.message),
        )
    })?;

    Ok(ComponentAnalysis {
        header,
        body,
        markup,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
#[napi]
pub fn compile_dribble_native(
    filename: String,
    source: String,
    options: Option<serde_json::Value>,
) -> napi::Result<GeneratedModule> {
    let options: CompileOptions = match options {
        Some(value) => serde_json::from_value(value)
            .map_err(|e| napi::Error::from_reason(e.to_string()))?,
        None => CompileOptions::default(),
    };
    compile_with_options(&filename, &source, &options)
        .map_err(|e| napi::Error::from_reason(e.to_string()))
}
