//! The resolution driver.
use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::builder::TreeBuilder;
use crate::condition::FrameKind;
use crate::context::FileContext;
use crate::directives::Directive;
use crate::error::Diagnostic;
use crate::expr;
use crate::include::{self, IncludeEdge};
use crate::macros::{MacroDef, MacroTable};
use crate::node::NodeData;
use crate::scanner::{LineScanner, ParseTreeSource};
use crate::types::{render, tokenize, Position, PositionRange};
use crate::util;
use crate::{Error, Result};

/// Reads source text for the resolver.
///
/// The default implementation is [`FsReader`]; tests substitute an
/// in-memory reader.
pub trait SourceReader {
    /// Reads the file at `path`.
    fn read(&self, path: &Path) -> std::io::Result<String>;

    /// Whether `path` names a readable file.
    fn exists(&self, path: &Path) -> bool;

    /// Normalizes `path` for include-chain bookkeeping.
    fn canonicalize(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }
}

/// [`SourceReader`] backed by the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsReader;
impl SourceReader for FsReader {
    fn read(&self, path: &Path) -> std::io::Result<String> {
        util::read_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn canonicalize(&self, path: &Path) -> PathBuf {
        std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    }
}

/// A successfully resolved translation unit.
#[derive(Debug)]
pub struct Expanded {
    /// The fully expanded token stream.
    pub text: String,
    /// Non-fatal diagnostics, in source order.
    pub diagnostics: Vec<Diagnostic>,
    /// Every include edge traversed, in resolution order.
    pub includes: Vec<IncludeEdge>,
}

/// A resolution pass that hit a fatal error.
///
/// No output stream is produced; `diagnostics` holds everything collected
/// up to the abort point, the fatal error included.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
#[allow(missing_docs)]
pub struct Aborted {
    #[source]
    pub error: Error,
    pub diagnostics: Vec<Diagnostic>,
}

/// Mutable state of one resolution pass, shared across the include chain.
#[derive(Debug)]
struct Pass {
    macros: MacroTable,
    diagnostics: Vec<Diagnostic>,
    chain: Vec<PathBuf>,
    includes: Vec<IncludeEdge>,
    output: String,
    fatal_recorded: bool,
}

/// The directive-resolution engine's public entry point.
///
/// Orchestrates tree building, conditional tracking, macro expansion and
/// include resolution into one depth-first pass over the entry file and
/// everything it includes.
#[derive(Debug)]
pub struct Resolver<R = FsReader, P = LineScanner> {
    reader: R,
    parser: P,
    search_paths: Vec<PathBuf>,
    predefined: Vec<MacroDef>,
}

impl Resolver<FsReader, LineScanner> {
    /// Makes a resolver reading from the filesystem with the built-in
    /// line scanner.
    pub fn new() -> Self {
        Resolver::with_collaborators(FsReader, LineScanner)
    }
}
impl Default for Resolver<FsReader, LineScanner> {
    fn default() -> Self {
        Resolver::new()
    }
}

impl<R: SourceReader, P: ParseTreeSource> Resolver<R, P> {
    /// Makes a resolver with explicit collaborators.
    pub fn with_collaborators(reader: R, parser: P) -> Self {
        Resolver {
            reader,
            parser,
            search_paths: Vec::new(),
            predefined: Vec::new(),
        }
    }

    /// The ordered include search paths. Entries may be glob patterns.
    pub fn search_paths_mut(&mut self) -> &mut Vec<PathBuf> {
        &mut self.search_paths
    }

    /// Seeds an object-like macro before resolution starts.
    pub fn predefine(&mut self, name: &str, replacement: &str) {
        self.predefined.push(MacroDef {
            name: name.to_owned(),
            params: None,
            replacement: tokenize(replacement, Position::default()),
            path: PathBuf::from("<predefined>"),
            position: Position::default(),
        });
    }

    /// Resolves the translation unit rooted at `entry`.
    ///
    /// Returns the expanded stream plus non-fatal diagnostics, or an
    /// [`Aborted`] carrying the fatal error and every diagnostic collected
    /// before it.
    pub fn resolve(&mut self, entry: &Path) -> std::result::Result<Expanded, Aborted> {
        let mut pass = Pass {
            macros: MacroTable::new(),
            diagnostics: Vec::new(),
            chain: Vec::new(),
            includes: Vec::new(),
            output: String::new(),
            fatal_recorded: false,
        };
        for def in &self.predefined {
            if let Err(error) = pass.macros.define(def.clone()) {
                let position = error.position().unwrap_or_default();
                pass.diagnostics
                    .push(Diagnostic::error(&def.path, position, error.to_string()));
                return Err(Aborted {
                    error,
                    diagnostics: pass.diagnostics,
                });
            }
        }
        match self.resolve_file(entry, None, &mut pass) {
            Ok(()) => Ok(Expanded {
                text: pass.output,
                diagnostics: pass.diagnostics,
                includes: pass.includes,
            }),
            Err(error) => Err(Aborted {
                error,
                diagnostics: pass.diagnostics,
            }),
        }
    }

    /// Builds and resolves one file, recursing into its includes.
    fn resolve_file(
        &mut self,
        path: &Path,
        included_at: Option<Position>,
        pass: &mut Pass,
    ) -> Result<()> {
        let result = self.resolve_file_inner(path, pass);
        if let Err(error) = &result {
            if !pass.fatal_recorded {
                pass.fatal_recorded = true;
                let position = error
                    .position()
                    .or(included_at)
                    .unwrap_or_default();
                pass.diagnostics
                    .push(Diagnostic::error(path, position, error.to_string()));
            }
        }
        result
    }

    fn resolve_file_inner(&mut self, path: &Path, pass: &mut Pass) -> Result<()> {
        let canonical = self.reader.canonicalize(path);
        debug!("resolving {:?}", canonical);
        let source = self
            .reader
            .read(path)
            .map_err(|e| Error::read_file(e, path))?;
        let nodes = self.parser.parse(path, &source)?;
        let mut ctx = FileContext::begin(canonical.clone(), source, &pass.chain)?;
        TreeBuilder::new(&mut ctx).build(&nodes)?;
        pass.chain.push(canonical);
        let result = self.resolve_tokens(&mut ctx, pass);
        pass.chain.pop();
        result
    }

    /// Walks one finished token tree in source order, maintaining the
    /// file's conditional stack and the pass-wide macro table.
    fn resolve_tokens(&mut self, ctx: &mut FileContext, pass: &mut Pass) -> Result<()> {
        let path = ctx.path().to_path_buf();
        for id in ctx.traversal_order() {
            let data = ctx.node(id)?.data().clone();
            let active = ctx.conditionals().is_active();
            match data {
                NodeData::CodeBlock(block) => {
                    if active {
                        let expanded = pass.macros.expand(&block.lexemes)?;
                        pass.output.push_str(&render(&expanded));
                    }
                }
                NodeData::Directive(Directive::Include(d)) => {
                    if active {
                        let (resolved, search_order) = include::resolve_target(
                            &self.reader,
                            &d,
                            path.parent(),
                            &self.search_paths,
                        )?;
                        pass.includes.push(IncludeEdge {
                            from: path.clone(),
                            target: d.target.clone(),
                            resolved: resolved.clone(),
                            style: d.style,
                            search_order,
                        });
                        self.resolve_file(&resolved, Some(d.start_position()), pass)?;
                    }
                }
                NodeData::Directive(Directive::Define(d)) => {
                    if active {
                        trace!("define {:?} in {:?}", d.name, path);
                        pass.macros.define(MacroDef {
                            name: d.name.clone(),
                            params: d.params.clone(),
                            replacement: d.replacement.clone(),
                            path: path.clone(),
                            position: d.start_position(),
                        })?;
                    }
                }
                NodeData::Directive(Directive::Undef(d)) => {
                    if active {
                        pass.macros.undef(&d.name);
                    }
                }
                NodeData::Directive(Directive::If(d)) => {
                    let macros = &pass.macros;
                    let diagnostics = &mut pass.diagnostics;
                    ctx.conditionals_mut()
                        .push(FrameKind::If, d.start_position(), || {
                            evaluate(&d.expr, macros, &path, diagnostics)
                        })?;
                }
                NodeData::Directive(Directive::Ifdef(d)) => {
                    let defined = pass.macros.is_defined(&d.name);
                    ctx.conditionals_mut()
                        .push(FrameKind::Ifdef, d.start_position(), || Ok(defined))?;
                }
                NodeData::Directive(Directive::Ifndef(d)) => {
                    let defined = pass.macros.is_defined(&d.name);
                    ctx.conditionals_mut()
                        .push(FrameKind::Ifndef, d.start_position(), || Ok(!defined))?;
                }
                NodeData::Directive(Directive::Elif(d)) => {
                    let macros = &pass.macros;
                    let diagnostics = &mut pass.diagnostics;
                    ctx.conditionals_mut().on_elif(d.start_position(), || {
                        evaluate(&d.expr, macros, &path, diagnostics)
                    })?;
                }
                NodeData::Directive(Directive::Else(d)) => {
                    ctx.conditionals_mut().on_else(d.start_position())?;
                }
                NodeData::Directive(Directive::Endif(d)) => {
                    ctx.conditionals_mut().on_endif(d.start_position())?;
                }
                NodeData::Directive(Directive::Error(d)) => {
                    if active {
                        let at = d.start_position();
                        pass.fatal_recorded = true;
                        pass.diagnostics
                            .push(Diagnostic::error(&path, at, d.message.clone()));
                        return Err(Error::user_error(d.message, at));
                    }
                }
                NodeData::Directive(Directive::Warning(d)) => {
                    if active {
                        pass.diagnostics.push(Diagnostic::warning(
                            &path,
                            d.start_position(),
                            d.message,
                        ));
                    }
                }
                NodeData::Directive(Directive::Pragma(_)) => {
                    // Pragmas are for downstream phases; pass them through.
                    if active {
                        pass.output.push_str(ctx.node(id)?.get_as_str());
                        pass.output.push('\n');
                    }
                }
            }
        }
        ctx.conditionals().finish()
    }
}

/// Evaluates an `#if`/`#elif` expression, reporting undefined identifiers
/// as non-fatal warnings.
fn evaluate(
    expr: &[crate::types::Lexeme],
    macros: &MacroTable,
    path: &Path,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<bool> {
    let evaluated = expr::eval_condition(expr, macros)?;
    for (name, position) in &evaluated.undefined {
        diagnostics.push(Diagnostic::warning(
            path,
            *position,
            format!("{:?} is not defined, evaluating to 0", name),
        ));
    }
    Ok(evaluated.is_true())
}
