// file: src/source/scanner.rs
// description: expands command line paths into intake files
// reference: https://docs.rs/walkdir

use crate::config::FileKind;
use crate::error::Result;
use crate::models::IntakeFile;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

const READ_CONCURRENCY: usize = 4;

pub struct FileScanner {
    kind: FileKind,
}

impl FileScanner {
    pub fn new(kind: FileKind) -> Self {
        Self { kind }
    }

    /// Explicit files are kept as given, whatever their extension, so the
    /// validator can report on them. Directories are walked and filtered by kind.
    pub fn collect_paths(&self, inputs: &[PathBuf]) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        for input in inputs {
            if !input.is_dir() {
                paths.push(input.clone());
                continue;
            }

            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|path| self.matches_kind(path))
                .collect();
            found.sort();

            debug!("Found {} file(s) under {}", found.len(), input.display());
            paths.extend(found);
        }

        paths
    }

    /// Reads every path, preserving input order.
    pub async fn load(&self, inputs: &[PathBuf]) -> Result<Vec<IntakeFile>> {
        let paths = self.collect_paths(inputs);
        info!("Reading {} file(s)", paths.len());

        stream::iter(paths)
            .map(|path| async move { IntakeFile::from_path(&path).await })
            .buffered(READ_CONCURRENCY)
            .try_collect()
            .await
    }

    fn matches_kind(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.kind.accepts_extension(ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_directories_are_filtered_by_kind() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("nested")).unwrap();
        fs::write(temp.path().join("b.pdf"), "%PDF-").unwrap();
        fs::write(temp.path().join("nested/a.PDF"), "%PDF-").unwrap();
        fs::write(temp.path().join("notes.txt"), "text").unwrap();

        let scanner = FileScanner::new(FileKind::Pdf);
        let paths = scanner.collect_paths(&[temp.path().to_path_buf()]);

        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.extension().is_some()));
        assert!(!paths.iter().any(|p| p.ends_with("notes.txt")));
    }

    #[test]
    fn test_explicit_files_are_kept() {
        let temp = TempDir::new().unwrap();
        let txt = temp.path().join("notes.txt");
        fs::write(&txt, "text").unwrap();

        let scanner = FileScanner::new(FileKind::Pdf);
        assert_eq!(scanner.collect_paths(&[txt.clone()]), vec![txt]);
    }

    #[tokio::test]
    async fn test_load_preserves_order() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("z.pdf");
        let second = temp.path().join("a.pdf");
        fs::write(&first, "first").unwrap();
        fs::write(&second, "second").unwrap();

        let scanner = FileScanner::new(FileKind::Pdf);
        let files = scanner.load(&[first, second]).await.unwrap();

        let names: Vec<&str> = files.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["z.pdf", "a.pdf"]);
        assert_eq!(files[0].size(), 5);
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let scanner = FileScanner::new(FileKind::Pdf);
        let result = scanner.load(&[PathBuf::from("/definitely/missing.pdf")]).await;
        assert!(result.is_err());
    }
}
