//! Discovery Module for the Dribble Compiler
//!
//! Recursively scans a directory for component sources and maps each one to
//! the sibling file its compiled module is written to.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursively find all files with the given extension, sorted by path.
pub fn find_dribble_files(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).follow_links(true).into_iter().flatten() {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    files
}

/// `routes/home.dribble` -> `routes/home.ts`
pub fn output_path_for(source: &Path, target_extension: &str) -> PathBuf {
    source.with_extension(target_extension)
}

/// Path shown in logs: relative to `root` when possible.
pub fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_find_dribble_files_recursive_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let routes = dir.path().join("routes");
        fs::create_dir_all(routes.join("items/detail")).unwrap();
        fs::write(routes.join("home.dribble"), "").unwrap();
        fs::write(routes.join("items/detail/view.dribble"), "").unwrap();
        fs::write(routes.join("items/list.dribble"), "").unwrap();
        fs::write(routes.join("items/list.ts"), "").unwrap();
        fs::write(routes.join("notes.md"), "").unwrap();

        let found: Vec<String> = find_dribble_files(&routes, "dribble")
            .iter()
            .map(|p| display_path(p, &routes))
            .collect();
        assert_eq!(
            found,
            vec!["home.dribble", "items/detail/view.dribble", "items/list.dribble"]
        );
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_dribble_files(&dir.path().join("nope"), "dribble").is_empty());
    }

    #[test]
    fn test_output_path_for() {
        assert_eq!(
            output_path_for(Path::new("src/routes/home.dribble"), "ts"),
            PathBuf::from("src/routes/home.ts")
        );
    }

    #[test]
    fn test_display_path_outside_root() {
        assert_eq!(
            display_path(Path::new("/a/b.dribble"), Path::new("/c")),
            "/a/b.dribble"
        );
    }
}
