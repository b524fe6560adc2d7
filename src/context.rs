//! Per-file preprocessing state.
use std::path::{Path, PathBuf};

use crate::condition::ConditionalStack;
use crate::node::{NodeData, NodeId, TokenNode};
use crate::{Error, Result};

/// One source file's preprocessing state: the node arena, the root token
/// sequence and the file's own conditional stack.
///
/// A context is the unit of include recursion. It is created when an
/// include is resolved (or once for the entry file) and discarded as soon
/// as its tree has been resolved and merged into the output.
#[derive(Debug)]
pub struct FileContext {
    path: PathBuf,
    source: String,
    nodes: Vec<TokenNode>,
    roots: Vec<NodeId>,
    conditionals: ConditionalStack,
}
impl FileContext {
    /// Opens a file context, validating that `path` is not already on the
    /// active include chain.
    pub fn begin(path: PathBuf, source: String, chain: &[PathBuf]) -> Result<Self> {
        if chain.iter().any(|p| p == &path) {
            let mut full = chain.to_vec();
            full.push(path.clone());
            return Err(Error::cyclic_include(path, full));
        }
        Ok(FileContext {
            path,
            source,
            nodes: Vec::new(),
            roots: Vec::new(),
            conditionals: ConditionalStack::new(),
        })
    }

    /// The canonical path of this file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The raw source text of this file.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Appends a node to the root token sequence.
    pub fn record_token(&mut self, node: TokenNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.roots.push(id);
        id
    }

    /// Appends a node as a child of `parent` instead of the root sequence.
    pub fn record_child(&mut self, parent: NodeId, mut node: TokenNode) -> Result<NodeId> {
        if !self.node(parent)?.has_code_block_scope() {
            return Err(Error::internal(format!(
                "node `{}` cannot hold a code-block child",
                self.node(parent)?.name()
            )));
        }
        let id = NodeId(self.nodes.len());
        node.set_parent(parent);
        self.nodes.push(node);
        self.node_mut(parent)?.push_child(id);
        Ok(id)
    }

    /// Looks a node up by arena index.
    pub fn node(&self, id: NodeId) -> Result<&TokenNode> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| Error::internal(format!("dangling node id {:?}", id)))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut TokenNode> {
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| Error::internal(format!("dangling node id {:?}", id)))
    }

    /// The root token sequence in source order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Whether a code block is actually attached under `id`.
    pub fn has_code_block_child(&self, id: NodeId) -> Result<bool> {
        for child in self.node(id)?.children() {
            if let NodeData::CodeBlock(_) = self.node(*child)?.data() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// All nodes in resolution order: each root followed by its subtree.
    pub fn traversal_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            if let Some(node) = self.nodes.get(id.0) {
                stack.extend(node.children().iter().rev().copied());
            }
        }
        order
    }

    /// This file's conditional stack.
    pub fn conditionals(&self) -> &ConditionalStack {
        &self.conditionals
    }

    /// Mutable access to this file's conditional stack.
    pub fn conditionals_mut(&mut self) -> &mut ConditionalStack {
        &mut self.conditionals
    }

    /// Hands the fully built, unresolved root sequence off for resolution.
    pub fn finish(&self) -> &[NodeId] {
        &self.roots
    }
}
