//! Evaluation of `#if`/`#elif` controlling expressions.
//!
//! The grammar is the restricted integer/boolean subset: literals,
//! `defined`, unary `! ~ + -`, the usual binary operators and grouping
//! parentheses. `defined` operands are resolved before macro expansion;
//! every other identifier left after expansion evaluates to zero.
use crate::macros::MacroTable;
use crate::types::{Lexeme, LexemeKind, Position};
use crate::{Error, Result};

/// Outcome of evaluating one controlling expression.
#[derive(Debug)]
#[allow(missing_docs)]
pub struct Evaluated {
    pub value: i64,
    /// Identifiers that were undefined and evaluated as zero, reported as
    /// non-fatal diagnostics by the resolver.
    pub undefined: Vec<(String, Position)>,
}
impl Evaluated {
    /// Whether the expression evaluated to a non-zero value.
    pub fn is_true(&self) -> bool {
        self.value != 0
    }
}

/// Evaluates the lexemes of an `#if`/`#elif` expression against `macros`.
pub fn eval_condition(lexemes: &[Lexeme], macros: &MacroTable) -> Result<Evaluated> {
    let resolved = resolve_defined(lexemes, macros)?;
    let expanded = macros.expand(&resolved)?;
    let significant: Vec<Lexeme> = expanded.into_iter().filter(|l| !l.is_blank()).collect();
    let end = significant
        .last()
        .map(|l| l.position)
        .or_else(|| lexemes.first().map(|l| l.position))
        .unwrap_or_default();
    let mut parser = ExprParser {
        lexemes: significant,
        index: 0,
        end,
        undefined: Vec::new(),
    };
    let value = parser.parse_expr(0, true)?;
    if let Some(extra) = parser.peek() {
        return Err(Error::syntax(
            format!("unexpected {:?} in conditional expression", extra.text),
            extra.position,
        ));
    }
    Ok(Evaluated {
        value,
        undefined: parser.undefined,
    })
}

/// Replaces `defined NAME` / `defined(NAME)` with `1` or `0` before macro
/// expansion, so the operand itself is never expanded.
fn resolve_defined(lexemes: &[Lexeme], macros: &MacroTable) -> Result<Vec<Lexeme>> {
    let mut out = Vec::with_capacity(lexemes.len());
    let mut i = 0;
    while i < lexemes.len() {
        let lexeme = &lexemes[i];
        if !lexeme.is_ident("defined") {
            out.push(lexeme.clone());
            i += 1;
            continue;
        }
        let at = lexeme.position;
        i += 1;
        while lexemes.get(i).map_or(false, Lexeme::is_blank) {
            i += 1;
        }
        let parenthesized = lexemes.get(i).map_or(false, |l| l.is_punct("("));
        if parenthesized {
            i += 1;
            while lexemes.get(i).map_or(false, Lexeme::is_blank) {
                i += 1;
            }
        }
        let name = match lexemes.get(i) {
            Some(l) if l.kind == LexemeKind::Ident => l.text.clone(),
            other => {
                return Err(Error::syntax(
                    "expected identifier after `defined`",
                    other.map_or(at, |l| l.position),
                ))
            }
        };
        i += 1;
        if parenthesized {
            while lexemes.get(i).map_or(false, Lexeme::is_blank) {
                i += 1;
            }
            match lexemes.get(i) {
                Some(l) if l.is_punct(")") => i += 1,
                other => {
                    return Err(Error::syntax(
                        "expected `)` after `defined` operand",
                        other.map_or(at, |l| l.position),
                    ))
                }
            }
        }
        out.push(Lexeme {
            kind: LexemeKind::Number,
            text: if macros.is_defined(&name) { "1" } else { "0" }.to_owned(),
            position: at,
        });
    }
    Ok(out)
}

struct ExprParser {
    lexemes: Vec<Lexeme>,
    index: usize,
    end: Position,
    undefined: Vec<(String, Position)>,
}
impl ExprParser {
    fn peek(&self) -> Option<&Lexeme> {
        self.lexemes.get(self.index)
    }

    fn bump(&mut self) -> Option<Lexeme> {
        let lexeme = self.lexemes.get(self.index).cloned();
        if lexeme.is_some() {
            self.index += 1;
        }
        lexeme
    }

    /// Precedence climbing. `live` is false inside a short-circuited
    /// operand: the operand is still parsed for syntax, but division by
    /// zero is forgiven and undefined identifiers go unreported.
    fn parse_expr(&mut self, min_prec: u8, live: bool) -> Result<i64> {
        let mut lhs = self.parse_unary(live)?;
        loop {
            let (text, prec, position) = match self.peek() {
                Some(l) => match binary_prec(&l.text) {
                    Some(p) => (l.text.clone(), p, l.position),
                    None => break,
                },
                None => break,
            };
            if prec < min_prec {
                break;
            }
            self.index += 1;
            let rhs_live = match text.as_str() {
                "&&" => live && lhs != 0,
                "||" => live && lhs == 0,
                _ => live,
            };
            let rhs = self.parse_expr(prec + 1, rhs_live)?;
            lhs = apply_binary(&text, lhs, rhs, live, position)?;
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self, live: bool) -> Result<i64> {
        let lexeme = match self.bump() {
            Some(l) => l,
            None => {
                return Err(Error::syntax(
                    "unexpected end of conditional expression",
                    self.end,
                ))
            }
        };
        match lexeme.kind {
            LexemeKind::Punct if lexeme.text == "!" => Ok((self.parse_unary(live)? == 0) as i64),
            LexemeKind::Punct if lexeme.text == "~" => Ok(!self.parse_unary(live)?),
            LexemeKind::Punct if lexeme.text == "-" => {
                Ok(self.parse_unary(live)?.wrapping_neg())
            }
            LexemeKind::Punct if lexeme.text == "+" => self.parse_unary(live),
            LexemeKind::Punct if lexeme.text == "(" => {
                let value = self.parse_expr(0, live)?;
                match self.bump() {
                    Some(l) if l.is_punct(")") => Ok(value),
                    Some(l) => Err(Error::syntax(
                        format!("expected `)`, found {:?}", l.text),
                        l.position,
                    )),
                    None => Err(Error::syntax("missing `)`", self.end)),
                }
            }
            LexemeKind::Number => parse_int(&lexeme.text, lexeme.position),
            LexemeKind::Char => char_value(&lexeme.text, lexeme.position),
            LexemeKind::Ident => {
                if live {
                    self.undefined.push((lexeme.text.clone(), lexeme.position));
                }
                Ok(0)
            }
            _ => Err(Error::syntax(
                format!("unexpected {:?} in conditional expression", lexeme.text),
                lexeme.position,
            )),
        }
    }
}

fn binary_prec(op: &str) -> Option<u8> {
    let prec = match op {
        "||" => 1,
        "&&" => 2,
        "|" => 3,
        "^" => 4,
        "&" => 5,
        "==" | "!=" => 6,
        "<" | ">" | "<=" | ">=" => 7,
        "<<" | ">>" => 8,
        "+" | "-" => 9,
        "*" | "/" | "%" => 10,
        _ => return None,
    };
    Some(prec)
}

fn apply_binary(op: &str, lhs: i64, rhs: i64, live: bool, at: Position) -> Result<i64> {
    let value = match op {
        "||" => ((lhs != 0) || (rhs != 0)) as i64,
        "&&" => ((lhs != 0) && (rhs != 0)) as i64,
        "|" => lhs | rhs,
        "^" => lhs ^ rhs,
        "&" => lhs & rhs,
        "==" => (lhs == rhs) as i64,
        "!=" => (lhs != rhs) as i64,
        "<" => (lhs < rhs) as i64,
        ">" => (lhs > rhs) as i64,
        "<=" => (lhs <= rhs) as i64,
        ">=" => (lhs >= rhs) as i64,
        "<<" => lhs.wrapping_shl(rhs as u32),
        ">>" => lhs.wrapping_shr(rhs as u32),
        "+" => lhs.wrapping_add(rhs),
        "-" => lhs.wrapping_sub(rhs),
        "*" => lhs.wrapping_mul(rhs),
        "/" | "%" => {
            if rhs == 0 {
                if !live {
                    return Ok(0);
                }
                return Err(Error::syntax(
                    "division by zero in conditional expression",
                    at,
                ));
            }
            if op == "/" {
                lhs.wrapping_div(rhs)
            } else {
                lhs.wrapping_rem(rhs)
            }
        }
        _ => return Err(Error::internal(format!("unhandled operator {:?}", op))),
    };
    Ok(value)
}

fn parse_int(text: &str, at: Position) -> Result<i64> {
    let stripped = text.trim_end_matches(|c| matches!(c, 'u' | 'U' | 'l' | 'L'));
    let (digits, radix) = if let Some(hex) = stripped
        .strip_prefix("0x")
        .or_else(|| stripped.strip_prefix("0X"))
    {
        (hex, 16)
    } else if let Some(bin) = stripped
        .strip_prefix("0b")
        .or_else(|| stripped.strip_prefix("0B"))
    {
        (bin, 2)
    } else if stripped.len() > 1 && stripped.starts_with('0') {
        (&stripped[1..], 8)
    } else {
        (stripped, 10)
    };
    i64::from_str_radix(digits, radix)
        .map_err(|_| Error::syntax(format!("invalid integer literal {:?}", text), at))
}

fn char_value(text: &str, at: Position) -> Result<i64> {
    let inner = text.trim_matches('\'');
    let mut chars = inner.chars();
    let value = match (chars.next(), chars.next()) {
        (Some('\\'), Some(esc)) => match esc {
            'n' => '\n' as i64,
            't' => '\t' as i64,
            'r' => '\r' as i64,
            '0' => 0,
            '\\' => '\\' as i64,
            '\'' => '\'' as i64,
            '"' => '"' as i64,
            other => other as i64,
        },
        (Some(c), None) => c as i64,
        _ => {
            return Err(Error::syntax(
                format!("invalid character literal {:?}", text),
                at,
            ))
        }
    };
    Ok(value)
}
