//! Include-target resolution.
use std::path::{Path, PathBuf};

use glob::glob;
use log::debug;

use crate::directives::{Include, IncludeStyle};
use crate::resolver::SourceReader;
use crate::types::PositionRange;
use crate::util;
use crate::{Error, Result};

/// One resolved edge of the include graph.
#[derive(Debug, Clone)]
pub struct IncludeEdge {
    /// File that issued the `#include`.
    pub from: PathBuf,
    /// Target as written in the directive.
    pub target: String,
    /// Fully resolved path.
    pub resolved: PathBuf,
    /// Quote style the directive used.
    pub style: IncludeStyle,
    /// Search roots tried, in order, ending with the one that resolved.
    /// Empty when the target was an absolute path.
    pub search_order: Vec<PathBuf>,
}

/// Resolves an include directive to a concrete path, also returning the
/// ordered search roots tried along the way.
///
/// Quoted targets try the issuing file's directory first, then the
/// configured search paths; angle-bracket targets use only the search
/// paths. `$VAR` components in the target are substituted from the
/// environment, and search-path entries may be glob patterns.
pub fn resolve_target<R: SourceReader>(
    reader: &R,
    directive: &Include,
    issuing_dir: Option<&Path>,
    search_paths: &[PathBuf],
) -> Result<(PathBuf, Vec<PathBuf>)> {
    let target = util::substitute_path_variables(&directive.target);
    if target.is_absolute() && reader.exists(&target) {
        return Ok((target, Vec::new()));
    }

    let mut searched = Vec::new();
    let mut roots: Vec<PathBuf> = Vec::new();
    if directive.style == IncludeStyle::Quoted {
        if let Some(dir) = issuing_dir {
            roots.push(dir.to_path_buf());
        }
    }
    roots.extend(search_paths.iter().cloned());

    for root in &roots {
        for expanded in expand_root(root)? {
            let candidate = expanded.join(&target);
            searched.push(expanded);
            if reader.exists(&candidate) {
                debug!("resolved include {:?} -> {:?}", directive.target, candidate);
                return Ok((candidate, searched));
            }
        }
    }
    Err(Error::unresolved_include(
        &directive.target,
        directive.start_position(),
        searched,
    ))
}

/// Expands a search-path entry that contains glob metacharacters into the
/// matching directories; plain entries pass through unchanged.
fn expand_root(root: &Path) -> Result<Vec<PathBuf>> {
    let text = root
        .to_str()
        .ok_or_else(|| Error::non_utf8_path(root))?;
    if !text.contains(|c| matches!(c, '*' | '?' | '[')) {
        return Ok(vec![root.to_path_buf()]);
    }
    let mut expanded = Vec::new();
    for entry in glob(text)? {
        expanded.push(entry?);
    }
    Ok(expanded)
}
