//! Directive-resolution engine for a C-like source language.
//!
//! This crate is the preprocessing stage of a compiler: it consumes raw
//! source text plus a grammar-driven parse tree and produces a fully
//! resolved token stream in which includes are inlined, inactive
//! conditional branches are pruned and macros are expanded.
//!
//! The single entry point is [`Resolver::resolve`]:
//!
//! ```no_run
//! use std::path::Path;
//! use c_pp::Resolver;
//!
//! let mut resolver = Resolver::new();
//! resolver.search_paths_mut().push("include".into());
//! resolver.predefine("VERSION", "3");
//! match resolver.resolve(Path::new("main.c")) {
//!     Ok(expanded) => print!("{}", expanded.text),
//!     Err(aborted) => {
//!         for diagnostic in &aborted.diagnostics {
//!             eprintln!("{}", diagnostic);
//!         }
//!     }
//! }
//! ```
#![warn(missing_docs)]

pub use crate::builder::TreeBuilder;
pub use crate::condition::{ConditionalFrame, ConditionalStack, FrameKind};
pub use crate::context::FileContext;
pub use crate::directives::{
    Define, Directive, Elif, Else, Endif, ErrorDirective, If, Ifdef, Ifndef, Include,
    IncludeStyle, Pragma, Undef, WarningDirective,
};
pub use crate::error::{Diagnostic, Error, Result, Severity};
pub use crate::expr::{eval_condition, Evaluated};
pub use crate::include::IncludeEdge;
pub use crate::macros::{MacroDef, MacroTable};
pub use crate::node::{CodeBlock, NodeData, NodeId, TokenNode};
pub use crate::resolver::{Aborted, Expanded, FsReader, Resolver, SourceReader};
pub use crate::scanner::{LineScanner, ParseNode, ParseTreeSource};
pub use crate::types::{render, tokenize, Lexeme, LexemeKind, Position, PositionRange};

mod builder;
mod condition;
mod context;
mod directives;
mod error;
mod expr;
mod include;
mod macros;
mod node;
mod resolver;
mod scanner;
mod token_reader;
mod types;
mod util;
