//! Directive payloads.
//!
//! One struct per directive kind, each parsed from the lexemes of a single
//! (logically joined) directive line. The closed [`Directive`] enum gives
//! resolution exhaustive, compiler-checked handling of every kind.
use std::fmt;

use crate::token_reader::TokenReader;
use crate::types::{render, tokenize, Lexeme, LexemeKind, Position, PositionRange};
use crate::{Error, Result};

/// Quote style of an `include` target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeStyle {
    /// `#include "path"`: the including file's directory is searched first.
    Quoted,
    /// `#include <path>`: only the configured search paths are used.
    Angled,
}

/// `#include` directive.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub struct Include {
    pub target: String,
    pub style: IncludeStyle,
    pub start: Position,
    pub end: Position,
}
impl PositionRange for Include {
    fn start_position(&self) -> Position {
        self.start
    }
    fn end_position(&self) -> Position {
        self.end
    }
}
impl fmt::Display for Include {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.style {
            IncludeStyle::Quoted => write!(f, "#include {:?}", self.target),
            IncludeStyle::Angled => write!(f, "#include <{}>", self.target),
        }
    }
}
impl Include {
    fn read_from(reader: &mut TokenReader, start: Position) -> Result<Self> {
        reader.skip_blank();
        let (target, style) = match reader.read() {
            Some(l) if l.kind == LexemeKind::Str => {
                let target = l.text.trim_matches('"').to_owned();
                (target, IncludeStyle::Quoted)
            }
            Some(l) if l.is_punct("<") => {
                let mut target = String::new();
                loop {
                    match reader.read() {
                        Some(l) if l.is_punct(">") => break,
                        Some(l) if l.is_blank() => continue,
                        Some(l) => target.push_str(&l.text),
                        None => {
                            return Err(Error::syntax(
                                "missing `>` in `#include` target",
                                reader.end_position(),
                            ))
                        }
                    }
                }
                (target, IncludeStyle::Angled)
            }
            Some(l) => {
                return Err(Error::syntax(
                    format!("expected include target, found {:?}", l.text),
                    l.position,
                ))
            }
            None => {
                return Err(Error::syntax(
                    "expected include target",
                    reader.end_position(),
                ))
            }
        };
        if target.is_empty() {
            return Err(Error::syntax("empty include target", start));
        }
        reader.expect_eof("include")?;
        Ok(Include {
            target,
            style,
            start,
            end: reader.end_position(),
        })
    }
}

/// `#define` directive.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub struct Define {
    pub name: String,
    /// `Some` for a function-like macro (possibly with zero parameters).
    pub params: Option<Vec<String>>,
    pub replacement: Vec<Lexeme>,
    pub start: Position,
    pub end: Position,
}
impl PositionRange for Define {
    fn start_position(&self) -> Position {
        self.start
    }
    fn end_position(&self) -> Position {
        self.end
    }
}
impl fmt::Display for Define {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#define {}", self.name)?;
        if let Some(params) = &self.params {
            write!(f, "({})", params.join(", "))?;
        }
        write!(f, " {}", render(&self.replacement))
    }
}
impl Define {
    fn read_from(reader: &mut TokenReader, start: Position) -> Result<Self> {
        reader.skip_blank();
        let name = reader.read_ident("macro name")?;
        // A parameter list only counts when the `(` hugs the macro name.
        let params = if reader.peek().map_or(false, |l| l.is_punct("(")) {
            reader.read();
            Some(Self::read_params(reader)?)
        } else {
            None
        };
        let replacement = reader.rest_trimmed();
        Ok(Define {
            name: name.text,
            params,
            replacement,
            start,
            end: reader.end_position(),
        })
    }

    fn read_params(reader: &mut TokenReader) -> Result<Vec<String>> {
        let mut params = Vec::new();
        reader.skip_blank();
        if reader.try_read_punct(")").is_some() {
            return Ok(params);
        }
        loop {
            reader.skip_blank();
            let param = reader.read_ident("macro parameter")?;
            if params.contains(&param.text) {
                return Err(Error::syntax(
                    format!("duplicate macro parameter {:?}", param.text),
                    param.position,
                ));
            }
            params.push(param.text);
            reader.skip_blank();
            if reader.try_read_punct(",").is_some() {
                continue;
            }
            reader.read_expected_punct(")")?;
            return Ok(params);
        }
    }
}

/// `#undef` directive.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub struct Undef {
    pub name: String,
    pub start: Position,
    pub end: Position,
}
impl PositionRange for Undef {
    fn start_position(&self) -> Position {
        self.start
    }
    fn end_position(&self) -> Position {
        self.end
    }
}
impl fmt::Display for Undef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#undef {}", self.name)
    }
}
impl Undef {
    fn read_from(reader: &mut TokenReader, start: Position) -> Result<Self> {
        reader.skip_blank();
        let name = reader.read_ident("macro name")?;
        reader.expect_eof("undef")?;
        Ok(Undef {
            name: name.text,
            start,
            end: reader.end_position(),
        })
    }
}

/// `#if` directive.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub struct If {
    pub expr: Vec<Lexeme>,
    pub start: Position,
    pub end: Position,
}
impl PositionRange for If {
    fn start_position(&self) -> Position {
        self.start
    }
    fn end_position(&self) -> Position {
        self.end
    }
}
impl fmt::Display for If {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#if {}", render(&self.expr))
    }
}
impl If {
    fn read_from(reader: &mut TokenReader, start: Position) -> Result<Self> {
        let expr = reader.rest_trimmed();
        if expr.is_empty() {
            return Err(Error::syntax("expected expression after `#if`", start));
        }
        Ok(If {
            expr,
            start,
            end: reader.end_position(),
        })
    }
}

/// `#ifdef` directive.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub struct Ifdef {
    pub name: String,
    pub start: Position,
    pub end: Position,
}
impl PositionRange for Ifdef {
    fn start_position(&self) -> Position {
        self.start
    }
    fn end_position(&self) -> Position {
        self.end
    }
}
impl fmt::Display for Ifdef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#ifdef {}", self.name)
    }
}
impl Ifdef {
    fn read_from(reader: &mut TokenReader, start: Position) -> Result<Self> {
        reader.skip_blank();
        let name = reader.read_ident("macro name")?;
        reader.expect_eof("ifdef")?;
        Ok(Ifdef {
            name: name.text,
            start,
            end: reader.end_position(),
        })
    }
}

/// `#ifndef` directive.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub struct Ifndef {
    pub name: String,
    pub start: Position,
    pub end: Position,
}
impl PositionRange for Ifndef {
    fn start_position(&self) -> Position {
        self.start
    }
    fn end_position(&self) -> Position {
        self.end
    }
}
impl fmt::Display for Ifndef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#ifndef {}", self.name)
    }
}
impl Ifndef {
    fn read_from(reader: &mut TokenReader, start: Position) -> Result<Self> {
        reader.skip_blank();
        let name = reader.read_ident("macro name")?;
        reader.expect_eof("ifndef")?;
        Ok(Ifndef {
            name: name.text,
            start,
            end: reader.end_position(),
        })
    }
}

/// `#elif` directive.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub struct Elif {
    pub expr: Vec<Lexeme>,
    pub start: Position,
    pub end: Position,
}
impl PositionRange for Elif {
    fn start_position(&self) -> Position {
        self.start
    }
    fn end_position(&self) -> Position {
        self.end
    }
}
impl fmt::Display for Elif {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#elif {}", render(&self.expr))
    }
}
impl Elif {
    fn read_from(reader: &mut TokenReader, start: Position) -> Result<Self> {
        let expr = reader.rest_trimmed();
        if expr.is_empty() {
            return Err(Error::syntax("expected expression after `#elif`", start));
        }
        Ok(Elif {
            expr,
            start,
            end: reader.end_position(),
        })
    }
}

/// `#else` directive.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub struct Else {
    pub start: Position,
    pub end: Position,
}
impl PositionRange for Else {
    fn start_position(&self) -> Position {
        self.start
    }
    fn end_position(&self) -> Position {
        self.end
    }
}
impl fmt::Display for Else {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#else")
    }
}

/// `#endif` directive.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub struct Endif {
    pub start: Position,
    pub end: Position,
}
impl PositionRange for Endif {
    fn start_position(&self) -> Position {
        self.start
    }
    fn end_position(&self) -> Position {
        self.end
    }
}
impl fmt::Display for Endif {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#endif")
    }
}

/// `#error` directive.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub struct ErrorDirective {
    pub message: String,
    pub start: Position,
    pub end: Position,
}
impl PositionRange for ErrorDirective {
    fn start_position(&self) -> Position {
        self.start
    }
    fn end_position(&self) -> Position {
        self.end
    }
}
impl fmt::Display for ErrorDirective {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#error {}", self.message)
    }
}

/// `#warning` directive.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub struct WarningDirective {
    pub message: String,
    pub start: Position,
    pub end: Position,
}
impl PositionRange for WarningDirective {
    fn start_position(&self) -> Position {
        self.start
    }
    fn end_position(&self) -> Position {
        self.end
    }
}
impl fmt::Display for WarningDirective {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#warning {}", self.message)
    }
}

/// `#pragma` directive.
///
/// The resolver passes pragma lines through to the output verbatim; they
/// are meaningful only to downstream phases.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub struct Pragma {
    pub text: String,
    pub start: Position,
    pub end: Position,
}
impl PositionRange for Pragma {
    fn start_position(&self) -> Position {
        self.start
    }
    fn end_position(&self) -> Position {
        self.end
    }
}
impl fmt::Display for Pragma {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#pragma {}", self.text)
    }
}

/// A fully classified directive.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub enum Directive {
    Include(Include),
    Define(Define),
    Undef(Undef),
    If(If),
    Ifdef(Ifdef),
    Ifndef(Ifndef),
    Elif(Elif),
    Else(Else),
    Endif(Endif),
    Error(ErrorDirective),
    Warning(WarningDirective),
    Pragma(Pragma),
}
impl Directive {
    /// Parses one directive line. `at` is the position of the leading `#`.
    ///
    /// Returns `Ok(None)` for the null directive (a lone `#`).
    pub fn parse(line: &str, at: Position) -> Result<Option<Self>> {
        let mut reader = TokenReader::new(tokenize(line, at), at);
        reader.skip_blank();
        reader.read_expected_punct("#")?;
        reader.skip_blank();
        if reader.is_eof() {
            return Ok(None);
        }
        let name = reader.read_ident("directive name")?;
        let start = at;
        let directive = match name.text.as_str() {
            "include" => Directive::Include(Include::read_from(&mut reader, start)?),
            "define" => Directive::Define(Define::read_from(&mut reader, start)?),
            "undef" => Directive::Undef(Undef::read_from(&mut reader, start)?),
            "if" => Directive::If(If::read_from(&mut reader, start)?),
            "ifdef" => Directive::Ifdef(Ifdef::read_from(&mut reader, start)?),
            "ifndef" => Directive::Ifndef(Ifndef::read_from(&mut reader, start)?),
            "elif" => Directive::Elif(Elif::read_from(&mut reader, start)?),
            "else" => {
                reader.expect_eof("else")?;
                Directive::Else(Else {
                    start,
                    end: reader.end_position(),
                })
            }
            "endif" => {
                reader.expect_eof("endif")?;
                Directive::Endif(Endif {
                    start,
                    end: reader.end_position(),
                })
            }
            "error" => Directive::Error(ErrorDirective {
                message: render(&reader.rest_trimmed()),
                start,
                end: reader.end_position(),
            }),
            "warning" => Directive::Warning(WarningDirective {
                message: render(&reader.rest_trimmed()),
                start,
                end: reader.end_position(),
            }),
            "pragma" => Directive::Pragma(Pragma {
                text: render(&reader.rest_trimmed()),
                start,
                end: reader.end_position(),
            }),
            other => {
                return Err(Error::syntax(
                    format!("unknown directive `#{}`", other),
                    name.position,
                ))
            }
        };
        Ok(Some(directive))
    }

    /// The directive kind as it appears in source.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Directive::Include(_) => "include",
            Directive::Define(_) => "define",
            Directive::Undef(_) => "undef",
            Directive::If(_) => "if",
            Directive::Ifdef(_) => "ifdef",
            Directive::Ifndef(_) => "ifndef",
            Directive::Elif(_) => "elif",
            Directive::Else(_) => "else",
            Directive::Endif(_) => "endif",
            Directive::Error(_) => "error",
            Directive::Warning(_) => "warning",
            Directive::Pragma(_) => "pragma",
        }
    }

    /// Whether a trailing code block may be attached as this token's child.
    pub fn has_code_block_scope(&self) -> bool {
        matches!(
            self,
            Directive::If(_)
                | Directive::Ifdef(_)
                | Directive::Ifndef(_)
                | Directive::Elif(_)
                | Directive::Else(_)
        )
    }
}
impl PositionRange for Directive {
    fn start_position(&self) -> Position {
        match self {
            Directive::Include(d) => d.start_position(),
            Directive::Define(d) => d.start_position(),
            Directive::Undef(d) => d.start_position(),
            Directive::If(d) => d.start_position(),
            Directive::Ifdef(d) => d.start_position(),
            Directive::Ifndef(d) => d.start_position(),
            Directive::Elif(d) => d.start_position(),
            Directive::Else(d) => d.start_position(),
            Directive::Endif(d) => d.start_position(),
            Directive::Error(d) => d.start_position(),
            Directive::Warning(d) => d.start_position(),
            Directive::Pragma(d) => d.start_position(),
        }
    }
    fn end_position(&self) -> Position {
        match self {
            Directive::Include(d) => d.end_position(),
            Directive::Define(d) => d.end_position(),
            Directive::Undef(d) => d.end_position(),
            Directive::If(d) => d.end_position(),
            Directive::Ifdef(d) => d.end_position(),
            Directive::Ifndef(d) => d.end_position(),
            Directive::Elif(d) => d.end_position(),
            Directive::Else(d) => d.end_position(),
            Directive::Endif(d) => d.end_position(),
            Directive::Error(d) => d.end_position(),
            Directive::Warning(d) => d.end_position(),
            Directive::Pragma(d) => d.end_position(),
        }
    }
}
impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Directive::Include(d) => d.fmt(f),
            Directive::Define(d) => d.fmt(f),
            Directive::Undef(d) => d.fmt(f),
            Directive::If(d) => d.fmt(f),
            Directive::Ifdef(d) => d.fmt(f),
            Directive::Ifndef(d) => d.fmt(f),
            Directive::Elif(d) => d.fmt(f),
            Directive::Else(d) => d.fmt(f),
            Directive::Endif(d) => d.fmt(f),
            Directive::Error(d) => d.fmt(f),
            Directive::Warning(d) => d.fmt(f),
            Directive::Pragma(d) => d.fmt(f),
        }
    }
}
