//! Macro definitions and expansion.
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;

use crate::types::{render, Lexeme, LexemeKind, Position, PositionRange};
use crate::{Error, Result};

/// Macro definition.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub struct MacroDef {
    pub name: String,
    /// `Some` for a function-like macro (possibly with zero parameters).
    pub params: Option<Vec<String>>,
    pub replacement: Vec<Lexeme>,
    /// File the definition came from.
    pub path: PathBuf,
    /// Position of the defining directive.
    pub position: Position,
}
impl MacroDef {
    /// Redefinition-compatibility fingerprint: parameter list plus the
    /// replacement with whitespace runs collapsed. Two definitions with
    /// equal fingerprints may coexist; unequal ones conflict.
    pub fn fingerprint(&self) -> String {
        let params = match &self.params {
            Some(p) => format!("({})", p.join(",")),
            None => String::new(),
        };
        let mut body = String::new();
        for lexeme in &self.replacement {
            if lexeme.is_blank() {
                if !body.ends_with(' ') {
                    body.push(' ');
                }
            } else {
                body.push_str(&lexeme.text);
            }
        }
        format!("{}{}|{}", self.name, params, body.trim())
    }
}
impl fmt::Display for MacroDef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#define {}", self.name)?;
        if let Some(params) = &self.params {
            write!(f, "({})", params.join(", "))?;
        }
        write!(f, " {}", render(&self.replacement))
    }
}

/// The macro table of one resolution pass.
///
/// A single table is shared across the whole include chain, so definitions
/// made inside an included file stay visible to sibling content after the
/// include point.
#[derive(Debug, Default)]
pub struct MacroTable {
    defs: HashMap<String, MacroDef>,
}
impl MacroTable {
    /// Makes an empty table.
    pub fn new() -> Self {
        MacroTable {
            defs: HashMap::new(),
        }
    }

    /// Registers a definition. Redefinition succeeds only when the new
    /// fingerprint matches the existing one.
    pub fn define(&mut self, def: MacroDef) -> Result<()> {
        if let Some(existing) = self.defs.get(&def.name) {
            if existing.fingerprint() != def.fingerprint() {
                return Err(Error::MacroRedefinition {
                    name: def.name,
                    previous: existing.position,
                    previous_path: existing.path.clone(),
                    redefined: def.position,
                });
            }
        }
        self.defs.insert(def.name.clone(), def);
        Ok(())
    }

    /// Removes a definition. Removing an undefined name is a no-op.
    pub fn undef(&mut self, name: &str) {
        self.defs.remove(name);
    }

    /// Whether `name` is currently defined.
    pub fn is_defined(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    /// Looks up the definition of `name`.
    pub fn get(&self, name: &str) -> Option<&MacroDef> {
        self.defs.get(name)
    }

    /// The number of live definitions.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Whether the table holds no definitions.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Rescans `lexemes` left to right, substituting every identifier that
    /// names a defined macro.
    pub fn expand(&self, lexemes: &[Lexeme]) -> Result<Vec<Lexeme>> {
        let hidden = HashSet::new();
        self.expand_inner(lexemes, &hidden)
    }

    fn expand_inner(&self, lexemes: &[Lexeme], hidden: &HashSet<String>) -> Result<Vec<Lexeme>> {
        let mut out = Vec::with_capacity(lexemes.len());
        let mut i = 0;
        while i < lexemes.len() {
            let lexeme = &lexemes[i];
            let def = if lexeme.kind == LexemeKind::Ident && !hidden.contains(&lexeme.text) {
                self.defs.get(&lexeme.text)
            } else {
                None
            };
            let def = match def {
                Some(def) => def,
                None => {
                    out.push(lexeme.clone());
                    i += 1;
                    continue;
                }
            };
            match &def.params {
                None => {
                    // Painting: the macro's own name stays unexpandable for
                    // the remainder of this expansion.
                    let mut repainted = hidden.clone();
                    repainted.insert(def.name.clone());
                    out.extend(self.expand_inner(&def.replacement, &repainted)?);
                    i += 1;
                }
                Some(params) => {
                    // A function-like macro name without a following `(`
                    // is left alone.
                    let mut j = i + 1;
                    while j < lexemes.len() && lexemes[j].is_blank() {
                        j += 1;
                    }
                    if j >= lexemes.len() || !lexemes[j].is_punct("(") {
                        out.push(lexeme.clone());
                        i += 1;
                        continue;
                    }
                    let (args, next) = collect_args(lexemes, j, &def.name)?;
                    if args.len() != params.len() {
                        return Err(Error::macro_args_mismatched(
                            &def.name,
                            params.len(),
                            args.len(),
                            lexeme.position,
                        ));
                    }
                    // Argument prescan: each argument is expanded before
                    // substitution into the replacement.
                    let mut expanded_args = Vec::with_capacity(args.len());
                    for arg in &args {
                        expanded_args.push(self.expand_inner(arg, hidden)?);
                    }
                    let mut substituted = Vec::new();
                    for r in &def.replacement {
                        let param_index = if r.kind == LexemeKind::Ident {
                            params.iter().position(|p| p == &r.text)
                        } else {
                            None
                        };
                        match param_index {
                            Some(k) => substituted.extend(expanded_args[k].iter().cloned()),
                            None => substituted.push(r.clone()),
                        }
                    }
                    let mut repainted = hidden.clone();
                    repainted.insert(def.name.clone());
                    out.extend(self.expand_inner(&substituted, &repainted)?);
                    i = next;
                }
            }
        }
        Ok(out)
    }
}

/// Collects the comma-separated arguments of a macro invocation.
///
/// `open` indexes the opening parenthesis; the returned index is just past
/// the matching close. Arguments are trimmed of surrounding blanks.
fn collect_args(
    lexemes: &[Lexeme],
    open: usize,
    name: &str,
) -> Result<(Vec<Vec<Lexeme>>, usize)> {
    let mut args = Vec::new();
    let mut current: Vec<Lexeme> = Vec::new();
    let mut depth = 1usize;
    let mut i = open + 1;
    loop {
        let lexeme = match lexemes.get(i) {
            Some(l) => l,
            None => {
                return Err(Error::syntax(
                    format!("unbalanced parentheses in invocation of macro {:?}", name),
                    lexemes[open].position,
                ))
            }
        };
        if lexeme.is_punct("(") {
            depth += 1;
        } else if lexeme.is_punct(")") {
            depth -= 1;
            if depth == 0 {
                args.push(trim_blanks(current));
                i += 1;
                break;
            }
        } else if lexeme.is_punct(",") && depth == 1 {
            args.push(trim_blanks(std::mem::take(&mut current)));
            i += 1;
            continue;
        }
        current.push(lexeme.clone());
        i += 1;
    }
    // `F()` is an invocation with zero arguments, not one empty argument.
    if args.len() == 1 && args[0].is_empty() {
        args.clear();
    }
    Ok((args, i))
}

fn trim_blanks(mut lexemes: Vec<Lexeme>) -> Vec<Lexeme> {
    while lexemes.first().map_or(false, Lexeme::is_blank) {
        lexemes.remove(0);
    }
    while lexemes.last().map_or(false, Lexeme::is_blank) {
        lexemes.pop();
    }
    lexemes
}
