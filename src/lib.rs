//! # Dribble Compiler
//!
//! Compiles `.dribble` component files into TypeScript modules for the Dribble
//! client runtime.
//!
//! ## Pipeline
//!
//! 1. **Header**: `export ephemeral|persistent Name(params) {` is located with a
//!    string- and comment-aware scan. The kind picks the runtime base class.
//! 2. **Body**: the prelude statements are split from the final
//!    `render(markup)` call by balanced-delimiter scanning.
//! 3. **Markup**: the render argument is parsed into a tree of text,
//!    `@identifier` interpolations and `@if (cond) { ... } @else { ... }` blocks,
//!    nested to any depth.
//! 4. **Lowering**: the tree becomes one expression producing the rendered
//!    string: a template literal at the top level and immediately invoked
//!    arrow functions for conditionals.
//! 5. **Module**: imports, the component class and its lifecycle methods are
//!    assembled around the prelude and the markup expression.
//!
//! The prelude and the parameter list are opaque text. They are copied into
//! the module unchanged and checked by the downstream TypeScript toolchain.
//!
//! `compile` is pure and deterministic. The front ends (`dribblec`, `batch`,
//! `language_service`) are thin I/O shells around it.

pub mod batch;
pub mod cache;
pub mod codegen;
pub mod compile;
pub mod config;
pub mod discovery;
pub mod error;
pub mod ir;
pub mod language_service;
pub mod markup;
pub mod parse;
pub mod scanner;
pub mod static_eval;
pub mod transform;


pub use batch::{build_project, BuildFailure, BuildReport};
pub use compile::{analyze, compile, compile_with_options, ComponentAnalysis, CompileResult};
pub use config::{BuildConfig, CompileOptions};
pub use error::{BuildError, CompilerError, ErrorKind, SourceLocation};
pub use ir::{ComponentKind, GeneratedModule, MarkupNode};
pub use static_eval::preview_markup;
