use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::config::AnalyzerConfig;
use crate::errors::{FreqError, FreqResult};
use crate::filters::should_include_file;

/// Finds the corpus files under `config.root_path`.
///
/// Hidden files and VCS ignore files are honored. Ignore patterns are matched
/// against the path relative to the root. A root that is itself a file is a
/// one-file corpus and bypasses the filters. The result is sorted so that runs
/// over the same tree see the files in the same order.
pub fn discover_files(config: &AnalyzerConfig) -> FreqResult<Vec<PathBuf>> {
    let root = config.root_path.as_path();

    let metadata = std::fs::metadata(root)
        .map_err(|e| FreqError::discovery(root, format!("cannot access root: {}", e)))?;
    if metadata.is_file() {
        debug!("Root {} is a single file", root.display());
        return Ok(vec![root.to_path_buf()]);
    }

    let mut walker = WalkBuilder::new(root);
    walker
        .hidden(true)
        .ignore(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true);

    let mut files = Vec::new();
    for entry in walker.build() {
        let entry = entry.map_err(|e| FreqError::discovery(root, e.to_string()))?;
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.path();
        if should_include_file(
            relative_to(path, root),
            &config.file_extensions,
            &config.ignore_patterns,
        ) {
            trace!("Including {}", path.display());
            files.push(entry.into_path());
        }
    }

    files.sort();
    debug!("Found {} files under {}", files.len(), root.display());
    Ok(files)
}

fn relative_to<'a>(path: &'a Path, root: &Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}
