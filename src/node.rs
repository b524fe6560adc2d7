//! The token-node tree built for each file.
use std::fmt;

use crate::directives::Directive;
use crate::types::{tokenize, Lexeme, Position, PositionRange};

/// Index of a [`TokenNode`] inside its owning [`FileContext`](crate::FileContext) arena.
///
/// Parent and child links are plain indices, never owning references, so
/// the tree cannot form reference cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// A contiguous span of non-directive source text.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub struct CodeBlock {
    pub text: String,
    pub position: Position,
    pub lexemes: Vec<Lexeme>,
}
impl CodeBlock {
    /// Makes a code block, splitting `text` into lexemes.
    pub fn new(text: String, position: Position) -> Self {
        let lexemes = tokenize(&text, position);
        CodeBlock {
            text,
            position,
            lexemes,
        }
    }
}
impl PositionRange for CodeBlock {
    fn start_position(&self) -> Position {
        self.position
    }
    fn end_position(&self) -> Position {
        self.position.advanced(&self.text)
    }
}

/// Payload of a token node: a directive or a literal code block.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub enum NodeData {
    Directive(Directive),
    CodeBlock(CodeBlock),
}

/// One directive or code-block unit of a file's token tree.
///
/// Nodes are created by the tree builder during the parse-tree walk and
/// are not mutated once the walk for their file completes.
#[derive(Debug, Clone)]
pub struct TokenNode {
    data: NodeData,
    raw_text: String,
    position: Position,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}
impl TokenNode {
    pub(crate) fn new(data: NodeData, raw_text: String, position: Position) -> Self {
        TokenNode {
            data,
            raw_text,
            position,
            parent: None,
            children: Vec::new(),
        }
    }

    /// The directive kind, or `"code-block"` for a non-directive node.
    pub fn name(&self) -> &'static str {
        match &self.data {
            NodeData::Directive(d) => d.kind_name(),
            NodeData::CodeBlock(_) => "code-block",
        }
    }

    /// The exact original source slice spanned by this node.
    pub fn get_as_str(&self) -> &str {
        &self.raw_text
    }

    /// The directive or code-block payload.
    pub fn data(&self) -> &NodeData {
        &self.data
    }

    /// Whether this node is a directive rather than a code block.
    pub fn is_directive(&self) -> bool {
        matches!(self.data, NodeData::Directive(_))
    }

    /// Whether other token nodes are attached under this one.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Whether a trailing code block may be attached as this node's child.
    pub fn has_code_block_scope(&self) -> bool {
        match &self.data {
            NodeData::Directive(d) => d.has_code_block_scope(),
            NodeData::CodeBlock(_) => false,
        }
    }

    /// The parent token node, `None` at the tree root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes, ordered by source position.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub(crate) fn set_parent(&mut self, parent: NodeId) {
        self.parent = Some(parent);
    }

    pub(crate) fn push_child(&mut self, child: NodeId) {
        self.children.push(child);
    }
}
impl PositionRange for TokenNode {
    fn start_position(&self) -> Position {
        self.position
    }
    fn end_position(&self) -> Position {
        self.position.advanced(&self.raw_text)
    }
}
impl fmt::Display for TokenNode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.data {
            NodeData::Directive(d) => d.fmt(f),
            NodeData::CodeBlock(c) => write!(f, "{}", c.text),
        }
    }
}
