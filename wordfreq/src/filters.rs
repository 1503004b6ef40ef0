//! Path predicates used by file discovery.
use glob::Pattern;
use std::path::Path;

/// Extensions never treated as text, whatever the extension filter says
const BINARY_EXTENSIONS: &[&str] = &[
    "exe", "dll", "so", "dylib", "bin", "obj", "o", "class", "jar", "war", "ear", "png", "jpg",
    "jpeg", "gif", "bmp", "ico", "pdf", "doc", "docx", "xls", "xlsx", "zip", "tar", "gz", "7z",
    "rar", "epub", "mobi",
];

/// Checks the extension against the allow-list. `None` allows every extension.
pub fn has_valid_extension(path: &Path, extensions: &Option<Vec<String>>) -> bool {
    match extensions {
        None => true,
        Some(exts) => path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                exts.iter()
                    .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(ext))
            }),
    }
}

/// Checks if a path matches any of the glob ignore patterns
pub fn should_ignore(path: &Path, ignore_patterns: &[String]) -> bool {
    let normalized_path = path.to_string_lossy().replace('\\', "/");
    ignore_patterns.iter().any(|pattern| {
        Pattern::new(pattern)
            .map(|p| p.matches(&normalized_path))
            .unwrap_or(false)
    })
}

/// Checks if a file is likely to be binary, judging by its extension
pub fn is_likely_binary(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            BINARY_EXTENSIONS
                .iter()
                .any(|&bin_ext| bin_ext.eq_ignore_ascii_case(ext))
        })
}

/// Determines if a file belongs to the corpus
pub fn should_include_file(
    path: &Path,
    extensions: &Option<Vec<String>>,
    ignore_patterns: &[String],
) -> bool {
    !is_likely_binary(path)
        && has_valid_extension(path, extensions)
        && !should_ignore(path, ignore_patterns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_valid_extension() {
        let extensions = Some(vec!["txt".to_string()]);
        assert!(has_valid_extension(Path::new("book.txt"), &extensions));
        assert!(!has_valid_extension(Path::new("book.md"), &extensions));
        assert!(has_valid_extension(Path::new("BOOK.TXT"), &extensions)); // Case insensitive
        assert!(!has_valid_extension(Path::new("README"), &extensions)); // No extension

        let dotted = Some(vec![".md".to_string()]);
        assert!(has_valid_extension(Path::new("notes.md"), &dotted));

        assert!(has_valid_extension(Path::new("anything.xyz"), &None));
    }

    #[test]
    fn test_should_ignore() {
        let ignore_patterns = vec![
            "**/draft_[0-4].txt".to_string(),
            "archive/**/*.txt".to_string(),
            "**/*.tmp".to_string(),
        ];

        // Should ignore
        assert!(should_ignore(Path::new("draft_0.txt"), &ignore_patterns));
        assert!(should_ignore(Path::new("dir/draft_2.txt"), &ignore_patterns));
        assert!(should_ignore(
            Path::new("archive/2019/old.txt"),
            &ignore_patterns
        ));
        assert!(should_ignore(Path::new("notes/scratch.tmp"), &ignore_patterns));

        // Should not ignore
        assert!(!should_ignore(Path::new("draft_5.txt"), &ignore_patterns));
        assert!(!should_ignore(Path::new("books/novel.txt"), &ignore_patterns));
        assert!(!should_ignore(Path::new(".gitignore"), &ignore_patterns));
        assert!(!should_ignore(Path::new("corpus/target/chapter.txt"), &[]));
    }

    #[test]
    fn test_invalid_glob_is_skipped() {
        let ignore_patterns = vec!["[".to_string()];
        assert!(!should_ignore(Path::new("book.txt"), &ignore_patterns));
    }

    #[test]
    fn test_is_likely_binary() {
        assert!(is_likely_binary(Path::new("scan.pdf")));
        assert!(is_likely_binary(Path::new("cover.PNG"))); // Case insensitive
        assert!(is_likely_binary(Path::new("bundle.zip")));
        assert!(!is_likely_binary(Path::new("book.txt")));
        assert!(!is_likely_binary(Path::new("README")));
    }

    #[test]
    fn test_should_include_file() {
        let extensions = Some(vec!["txt".to_string()]);
        let ignore_patterns = vec!["archive/**".to_string()];

        assert!(should_include_file(
            Path::new("books/novel.txt"),
            &extensions,
            &ignore_patterns
        ));
        assert!(!should_include_file(
            Path::new("books/novel.md"),
            &extensions,
            &ignore_patterns
        ));
        assert!(!should_include_file(
            Path::new("archive/novel.txt"),
            &extensions,
            &ignore_patterns
        ));
        // Binary blocklist wins over an open extension filter
        assert!(!should_include_file(
            Path::new("books/scan.pdf"),
            &None,
            &ignore_patterns
        ));
    }
}
