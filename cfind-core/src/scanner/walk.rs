use std::ffi::OsStr;
use std::path::Path;

use walkdir::{DirEntry, WalkDir};

use crate::{FinderError, Result};

/// Depth-first walker: within each directory, files come before
/// subdirectories, each group sorted by name.
pub(crate) fn walker(root: &Path) -> WalkDir {
    WalkDir::new(root).follow_links(true).sort_by(|a, b| {
        a.file_type()
            .is_dir()
            .cmp(&b.file_type().is_dir())
            .then_with(|| a.file_name().cmp(b.file_name()))
    })
}

/// Hidden files: dot-prefixed names, plus the hidden attribute on Windows.
/// Only files are filtered; hidden directories are still descended into.
pub fn is_hidden(entry: &DirEntry) -> bool {
    is_hidden_name(entry.file_name()) || has_hidden_attribute(entry)
}

/// Check if a file name is hidden (starts with . but is not . or ..)
pub fn is_hidden_name(name: &OsStr) -> bool {
    let name = name.to_string_lossy();
    name.starts_with('.') && name != "." && name != ".."
}

#[cfg(windows)]
fn has_hidden_attribute(entry: &DirEntry) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;

    entry
        .metadata()
        .map(|m| m.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0)
        .unwrap_or(false)
}

#[cfg(not(windows))]
fn has_hidden_attribute(_entry: &DirEntry) -> bool {
    false
}

/// Whether the scan will visit this entry
pub(crate) fn is_visitable(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_type().is_file() && !is_hidden(entry)
}

pub(crate) fn root_unreadable(root: &Path, err: &walkdir::Error) -> FinderError {
    FinderError::RootUnreadable {
        path: root.to_path_buf(),
        message: err.to_string(),
    }
}

/// Count every file the scan will visit, regardless of the extension filter
///
/// Unreadable subdirectories are skipped here too, so a clean tree ends the
/// scan phase at exactly 100%.
pub fn count_files(root: &Path) -> Result<usize> {
    let mut total = 0;
    for entry in walker(root) {
        match entry {
            Ok(entry) if is_visitable(&entry) => total += 1,
            Ok(_) => {}
            Err(err) if err.depth() == 0 => return Err(root_unreadable(root, &err)),
            Err(err) => tracing::debug!("Not counting unreadable entry: {}", err),
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_is_hidden_name() {
        assert!(is_hidden_name(OsStr::new(".hidden")));
        assert!(is_hidden_name(OsStr::new(".gitignore")));

        assert!(!is_hidden_name(OsStr::new("normal.txt")));
        assert!(!is_hidden_name(OsStr::new("dir.with.dots")));
        assert!(!is_hidden_name(OsStr::new(".")));
        assert!(!is_hidden_name(OsStr::new("..")));
    }

    #[test]
    fn test_walk_order_files_before_subdirectories() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("a_sub")).unwrap();
        fs::write(root.join("a_sub/inner.txt"), "x").unwrap();
        fs::write(root.join("z.txt"), "x").unwrap();
        fs::write(root.join("b.txt"), "x").unwrap();

        let names: Vec<String> = walker(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(is_visitable)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["b.txt", "z.txt", "inner.txt"]);
    }

    #[test]
    fn test_count_skips_hidden_files() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("a.txt"), "x").unwrap();
        fs::write(root.join(".secret"), "x").unwrap();
        fs::write(root.join("sub/b.csv"), "x").unwrap();

        assert_eq!(count_files(root).unwrap(), 2);
    }

    #[test]
    fn test_count_missing_root_is_error() {
        let dir = TempDir::new().unwrap();
        let err = count_files(&dir.path().join("gone")).unwrap_err();
        assert!(matches!(err, FinderError::RootUnreadable { .. }));
    }
}
