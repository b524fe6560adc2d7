use crate::types::{Lexeme, LexemeKind, Position, PositionRange};
use crate::{Error, Result};

/// A cursor over the lexemes of one directive line.
///
/// Directive payload parsers consume from this reader; whitespace and
/// comments are skipped explicitly so the grammar stays visible at the
/// call sites.
#[derive(Debug)]
pub struct TokenReader {
    lexemes: Vec<Lexeme>,
    index: usize,
    end: Position,
}
impl TokenReader {
    pub fn new(lexemes: Vec<Lexeme>, fallback: Position) -> Self {
        let end = lexemes.last().map(|l| l.end_position()).unwrap_or(fallback);
        TokenReader {
            lexemes,
            index: 0,
            end,
        }
    }

    /// The position just past the last lexeme.
    pub fn end_position(&self) -> Position {
        self.end
    }

    pub fn peek(&self) -> Option<&Lexeme> {
        self.lexemes.get(self.index)
    }

    pub fn read(&mut self) -> Option<Lexeme> {
        let lexeme = self.lexemes.get(self.index).cloned();
        if lexeme.is_some() {
            self.index += 1;
        }
        lexeme
    }

    pub fn skip_blank(&mut self) {
        while self.peek().map_or(false, Lexeme::is_blank) {
            self.index += 1;
        }
    }

    pub fn is_eof(&self) -> bool {
        self.index >= self.lexemes.len()
    }

    /// Reads an identifier or fails with a syntax error naming `expected`.
    pub fn read_ident(&mut self, expected: &str) -> Result<Lexeme> {
        match self.peek() {
            Some(l) if l.kind == LexemeKind::Ident => Ok(self.read().ok_or_else(|| {
                Error::internal("peeked lexeme disappeared")
            })?),
            Some(l) => Err(Error::syntax(
                format!("expected {}, found {:?}", expected, l.text),
                l.position,
            )),
            None => Err(Error::syntax(format!("expected {}", expected), self.end)),
        }
    }

    /// Reads the given punctuator or fails with a syntax error.
    pub fn read_expected_punct(&mut self, punct: &str) -> Result<Lexeme> {
        match self.peek() {
            Some(l) if l.is_punct(punct) => Ok(self.read().ok_or_else(|| {
                Error::internal("peeked lexeme disappeared")
            })?),
            Some(l) => Err(Error::syntax(
                format!("expected {:?}, found {:?}", punct, l.text),
                l.position,
            )),
            None => Err(Error::syntax(format!("expected {:?}", punct), self.end)),
        }
    }

    /// Consumes the given punctuator if it is next.
    pub fn try_read_punct(&mut self, punct: &str) -> Option<Lexeme> {
        if self.peek().map_or(false, |l| l.is_punct(punct)) {
            self.read()
        } else {
            None
        }
    }

    /// Fails unless only blanks remain.
    pub fn expect_eof(&mut self, directive: &str) -> Result<()> {
        self.skip_blank();
        if let Some(l) = self.peek() {
            Err(Error::syntax(
                format!("extra tokens after `#{}`: {:?}", directive, l.text),
                l.position,
            ))
        } else {
            Ok(())
        }
    }

    /// Returns all remaining lexemes, trimmed of leading and trailing blanks.
    pub fn rest_trimmed(&mut self) -> Vec<Lexeme> {
        self.skip_blank();
        let mut rest: Vec<Lexeme> = self.lexemes.split_off(self.index);
        self.index = self.lexemes.len();
        while rest.last().map_or(false, Lexeme::is_blank) {
            rest.pop();
        }
        rest
    }
}
