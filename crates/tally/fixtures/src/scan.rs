use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{DirectiveError, Result};

/// File extension of contract fixtures.
pub const FIXTURE_EXTENSION: &str = "vy";

/// Expand files and directories into the fixture files they name.
///
/// Directories are searched recursively for `.vy` files; explicitly named
/// files are kept whatever their extension. The result is sorted.
pub fn discover(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for path in paths {
        if path.is_dir() {
            walk(path, &mut found)?;
        } else {
            found.push(path.clone());
        }
    }
    found.sort();
    found.dedup();
    debug!(count = found.len(), "Fixtures discovered");
    Ok(found)
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|source| DirectiveError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| DirectiveError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            walk(&path, found)?;
        } else if path.extension().is_some_and(|ext| ext == FIXTURE_EXTENSION) {
            found.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_nested_fixtures_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("b.vy"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::write(dir.path().join("nested").join("a.vy"), "").unwrap();

        let found = discover(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"a.vy".to_string()));
        assert!(names.contains(&"b.vy".to_string()));
    }

    #[test]
    fn explicit_files_are_kept() {
        let path = PathBuf::from("/does/not/matter.txt");
        assert_eq!(discover(&[path.clone()]).unwrap(), vec![path]);
    }
}
