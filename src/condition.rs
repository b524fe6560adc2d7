//! Conditional-compilation state.
//!
//! One stack per file, pushed and popped as conditional directives are
//! encountered in source order. Branch activation follows
//! first-true-branch-wins semantics: once any branch of an
//! `#if`/`#elif`/`#else` chain has been taken, every later sibling is
//! forced inactive regardless of its own condition.
use crate::types::Position;
use crate::{Error, Result};

/// The directive kind that opened a conditional level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum FrameKind {
    If,
    Ifdef,
    Ifndef,
}

/// One `#if`/`#elif`/`#else` region and its activation state.
#[derive(Debug, Clone)]
pub struct ConditionalFrame {
    kind: FrameKind,
    /// `None` when the branch was skipped without evaluating its condition
    /// (the enclosing scope was inactive).
    condition: Option<bool>,
    active: bool,
    parent_active: bool,
    any_branch_taken: bool,
    else_seen: bool,
    opened_at: Position,
}
impl ConditionalFrame {
    /// The directive kind that opened this frame.
    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    /// The current branch's condition; `None` if never evaluated.
    pub fn condition(&self) -> Option<bool> {
        self.condition
    }

    /// Whether this frame's current branch contributes to the output.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Position of the opening directive.
    pub fn opened_at(&self) -> Position {
        self.opened_at
    }
}

/// Tracks nested conditional scopes for one file.
#[derive(Debug, Default)]
pub struct ConditionalStack {
    stack: Vec<ConditionalFrame>,
}
impl ConditionalStack {
    /// Makes an empty stack.
    pub fn new() -> Self {
        ConditionalStack { stack: Vec::new() }
    }

    /// Whether tokens at the current point belong to the expanded output.
    pub fn is_active(&self) -> bool {
        self.stack.last().map_or(true, |f| f.active)
    }

    /// The current nesting depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Opens a new conditional level. `eval` runs only when the enclosing
    /// scope is active; a skipped condition stays unevaluated.
    pub fn push<F>(&mut self, kind: FrameKind, at: Position, eval: F) -> Result<()>
    where
        F: FnOnce() -> Result<bool>,
    {
        let parent_active = self.is_active();
        let condition = if parent_active { Some(eval()?) } else { None };
        self.stack.push(ConditionalFrame {
            kind,
            condition,
            active: parent_active && condition == Some(true),
            parent_active,
            any_branch_taken: condition == Some(true),
            else_seen: false,
            opened_at: at,
        });
        Ok(())
    }

    /// Switches the top level to an `#elif` branch.
    pub fn on_elif<F>(&mut self, at: Position, eval: F) -> Result<()>
    where
        F: FnOnce() -> Result<bool>,
    {
        let (parent_active, taken, else_seen, opened_at) = match self.stack.last() {
            Some(f) => (f.parent_active, f.any_branch_taken, f.else_seen, f.opened_at),
            None => {
                return Err(Error::unbalanced_conditional(
                    "`#elif` without matching `#if`",
                    at,
                ))
            }
        };
        if else_seen {
            return Err(Error::dangling_else("elif", at, opened_at));
        }
        let condition = if parent_active && !taken {
            Some(eval()?)
        } else {
            None
        };
        if let Some(frame) = self.stack.last_mut() {
            frame.condition = condition;
            frame.active = condition == Some(true);
            if condition == Some(true) {
                frame.any_branch_taken = true;
            }
        }
        Ok(())
    }

    /// Switches the top level to its `#else` branch.
    pub fn on_else(&mut self, at: Position) -> Result<()> {
        let frame = match self.stack.last_mut() {
            Some(f) => f,
            None => {
                return Err(Error::unbalanced_conditional(
                    "`#else` without matching `#if`",
                    at,
                ))
            }
        };
        if frame.else_seen {
            return Err(Error::dangling_else("else", at, frame.opened_at));
        }
        frame.else_seen = true;
        frame.condition = Some(frame.parent_active && !frame.any_branch_taken);
        frame.active = frame.parent_active && !frame.any_branch_taken;
        frame.any_branch_taken = true;
        Ok(())
    }

    /// Closes the top conditional level.
    pub fn on_endif(&mut self, at: Position) -> Result<()> {
        if self.stack.pop().is_none() {
            return Err(Error::unbalanced_conditional(
                "`#endif` without matching `#if`",
                at,
            ));
        }
        Ok(())
    }

    /// End-of-file check: every opened level must have been closed.
    pub fn finish(&self) -> Result<()> {
        if let Some(frame) = self.stack.last() {
            return Err(Error::unbalanced_conditional(
                "unterminated conditional",
                frame.opened_at,
            ));
        }
        Ok(())
    }
}
