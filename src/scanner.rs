//! The parse-tree contract and its built-in line scanner.
use std::path::Path;

use crate::Result;

/// One node of the externally produced parse tree.
///
/// The engine never parses raw source itself; it consumes a tree of nodes
/// carrying a grammar kind, the covered text and the start position, and
/// classifies them during the build walk.
#[derive(Debug, Clone)]
pub struct ParseNode {
    /// Grammar-rule kind, opaque to this engine.
    pub kind: String,
    /// Exact source text covered by the node.
    pub text: String,
    /// 1-based start line.
    pub line: u32,
    /// 1-based start column.
    pub column: u32,
    /// Nested nodes in source order.
    pub children: Vec<ParseNode>,
}

/// Supplies the parse tree for one file.
///
/// Implementations must yield nodes in pre-order, source order.
pub trait ParseTreeSource {
    /// Produces the parse tree for `text`, which was read from `path`.
    fn parse(&self, path: &Path, text: &str) -> Result<Vec<ParseNode>>;
}

/// Built-in [`ParseTreeSource`]: one node per directive line, one node per
/// run of ordinary code lines.
///
/// A directive line may be continued with a trailing backslash; the
/// continuation lines are joined into a single logical directive node.
/// Code-block nodes keep their text verbatim, newlines included, so a
/// directive-free file round-trips unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineScanner;
impl ParseTreeSource for LineScanner {
    fn parse(&self, _path: &Path, text: &str) -> Result<Vec<ParseNode>> {
        let lines: Vec<&str> = text.split_inclusive('\n').collect();
        let mut nodes = Vec::new();
        let mut code = String::new();
        let mut code_line = 1u32;
        let mut i = 0;
        let mut line_no = 1u32;
        while i < lines.len() {
            let raw = lines[i];
            let stripped = raw.trim_end_matches('\n').trim_end_matches('\r');
            let trimmed = stripped.trim_start();
            if trimmed.starts_with('#') {
                flush_code(&mut nodes, &mut code, code_line);
                let column = (stripped.len() - trimmed.len()) as u32 + 1;
                let start_line = line_no;
                let mut joined = trimmed.to_owned();
                while joined.ends_with('\\') && i + 1 < lines.len() {
                    joined.pop();
                    i += 1;
                    line_no += 1;
                    joined.push_str(lines[i].trim_end_matches('\n').trim_end_matches('\r'));
                }
                nodes.push(ParseNode {
                    kind: "directive".to_owned(),
                    text: joined,
                    line: start_line,
                    column,
                    children: Vec::new(),
                });
            } else {
                if code.is_empty() {
                    code_line = line_no;
                }
                code.push_str(raw);
            }
            i += 1;
            line_no += 1;
        }
        flush_code(&mut nodes, &mut code, code_line);
        Ok(nodes)
    }
}

fn flush_code(nodes: &mut Vec<ParseNode>, code: &mut String, line: u32) {
    if code.is_empty() {
        return;
    }
    nodes.push(ParseNode {
        kind: "code-block".to_owned(),
        text: std::mem::take(code),
        line,
        column: 1,
        children: Vec::new(),
    });
}
