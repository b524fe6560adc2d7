//! Tree construction from the external parse tree.
use crate::context::FileContext;
use crate::directives::Directive;
use crate::node::{CodeBlock, NodeData, TokenNode};
use crate::scanner::ParseNode;
use crate::types::Position;
use crate::Result;

/// Walks the externally supplied parse tree in source order and builds the
/// token-node tree inside a [`FileContext`].
///
/// The builder only classifies and structures; it never evaluates
/// conditions or expands macros. A code block immediately following a
/// scope-bearing directive becomes that directive's child rather than a
/// sibling.
#[derive(Debug)]
pub struct TreeBuilder<'a> {
    ctx: &'a mut FileContext,
    open_scope: Option<crate::node::NodeId>,
}
impl<'a> TreeBuilder<'a> {
    /// Makes a builder that records into `ctx`.
    pub fn new(ctx: &'a mut FileContext) -> Self {
        TreeBuilder {
            ctx,
            open_scope: None,
        }
    }

    /// Builds the whole tree from the parse nodes of one file.
    pub fn build(mut self, nodes: &[ParseNode]) -> Result<()> {
        self.visit_all(nodes)
    }

    fn visit_all(&mut self, nodes: &[ParseNode]) -> Result<()> {
        for node in nodes {
            self.visit(node)?;
            self.visit_all(&node.children)?;
        }
        Ok(())
    }

    fn visit(&mut self, node: &ParseNode) -> Result<()> {
        let at = Position::new(node.line, node.column);
        if node.text.trim_start().starts_with('#') {
            // Null directives (a lone `#`) produce no node at all.
            if let Some(directive) = Directive::parse(&node.text, at)? {
                let scoped = directive.has_code_block_scope();
                let token =
                    TokenNode::new(NodeData::Directive(directive), node.text.clone(), at);
                let id = self.ctx.record_token(token);
                self.open_scope = if scoped { Some(id) } else { None };
            } else {
                self.open_scope = None;
            }
        } else {
            let block = CodeBlock::new(node.text.clone(), at);
            let token = TokenNode::new(NodeData::CodeBlock(block), node.text.clone(), at);
            match self.open_scope.take() {
                Some(parent) => {
                    self.ctx.record_child(parent, token)?;
                }
                None => {
                    self.ctx.record_token(token);
                }
            }
        }
        Ok(())
    }
}
