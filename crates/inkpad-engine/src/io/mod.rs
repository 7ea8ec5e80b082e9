pub mod store;

pub use store::{DocumentStore, SaveRequest, SaveResponse, document_file_name};

use relative_path::RelativePath;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid documents directory: {0}")]
    InvalidDocumentsDir(String),
    #[error("Title '{0}' leaves no usable file name")]
    InvalidTitle(String),
}

/// Read a saved document and return its markup
pub fn read_file(relative_path: &RelativePath, documents_root: &Path) -> Result<String, IoError> {
    let absolute_path = relative_path.to_path(documents_root);
    if !absolute_path.exists() {
        return Err(IoError::NotFound(absolute_path));
    }
    fs::read_to_string(&absolute_path).map_err(IoError::Io)
}

/// Write markup to a document file, replacing any previous content
pub fn write_file(
    relative_path: &RelativePath,
    documents_root: &Path,
    content: &str,
) -> Result<(), IoError> {
    let absolute_path = relative_path.to_path(documents_root);

    // Create parent directories if they don't exist
    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }

    fs::write(&absolute_path, content).map_err(IoError::Io)
}

/// Scan for saved `.md` documents under the documents directory
pub fn scan_documents(documents_root: &Path) -> Result<Vec<PathBuf>, IoError> {
    if !documents_root.exists() {
        return Err(IoError::InvalidDocumentsDir(
            "documents directory not found".to_string(),
        ));
    }

    let mut files = Vec::new();
    scan_directory_recursive(documents_root, &mut files)?;
    files.sort();
    Ok(files)
}

fn scan_directory_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), IoError> {
    let entries = fs::read_dir(dir).map_err(IoError::Io)?;

    for entry in entries {
        let entry = entry.map_err(IoError::Io)?;
        let path = entry.path();

        if path.is_dir() {
            scan_directory_recursive(&path, files)?;
        } else if let Some(ext) = path.extension()
            && ext == "md"
        {
            files.push(path);
        }
    }

    Ok(())
}

pub fn validate_documents_dir(path: &Path) -> Result<(), IoError> {
    if !path.exists() || !path.is_dir() {
        return Err(IoError::InvalidDocumentsDir(
            "Directory does not exist".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{create_test_documents_dir, create_test_file};

    #[test]
    fn test_scan_finds_saved_documents() {
        // Given a documents directory with saved documents
        let documents_dir = create_test_documents_dir();
        create_test_file(&documents_dir, "first.md", "<p>one</p>");
        create_test_file(&documents_dir, "second.md", "<h1>two</h1>");

        // When scanning for documents
        let files = scan_documents(documents_dir.path()).unwrap();

        // Then both are found
        assert_eq!(files.len(), 2);
        assert!(files.iter().any(|f| f.file_name().unwrap() == "first.md"));
        assert!(files.iter().any(|f| f.file_name().unwrap() == "second.md"));
    }

    #[test]
    fn test_handle_missing_documents_directory() {
        let result = scan_documents(Path::new("/this/path/does/not/exist"));
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("documents directory")
        );
    }

    #[test]
    fn test_scan_nested_directories() {
        // Given a documents directory with a nested folder
        let documents_dir = create_test_documents_dir();
        create_test_file(&documents_dir, "root.md", "root");
        let sub_dir = documents_dir.path().join("drafts");
        std::fs::create_dir(&sub_dir).unwrap();
        std::fs::write(sub_dir.join("nested.md"), "nested").unwrap();

        // When scanning
        let files = scan_documents(documents_dir.path()).unwrap();

        // Then documents at both levels are found
        assert_eq!(files.len(), 2);
        assert!(files.iter().any(|f| f.file_name().unwrap() == "nested.md"));
    }

    #[test]
    fn test_ignore_other_files() {
        let documents_dir = create_test_documents_dir();
        create_test_file(&documents_dir, "document.md", "<p>x</p>");
        create_test_file(&documents_dir, "image.png", "fake image data");

        let files = scan_documents(documents_dir.path()).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name().unwrap(), "document.md");
    }

    #[test]
    fn test_validate_documents_dir() {
        let documents_dir = create_test_documents_dir();
        assert!(validate_documents_dir(documents_dir.path()).is_ok());
        assert!(matches!(
            validate_documents_dir(Path::new("/nonexistent/path")),
            Err(IoError::InvalidDocumentsDir(_))
        ));
    }

    #[test]
    fn test_read_file_not_found() {
        let documents_dir = create_test_documents_dir();
        let result = read_file(RelativePath::new("nonexistent.md"), documents_dir.path());
        assert!(matches!(result, Err(IoError::NotFound(_))));
    }

    #[test]
    fn test_write_file_creates_parent_directories_and_overwrites() {
        let documents_dir = create_test_documents_dir();
        let relative_path = RelativePath::new("folder/sub/note.md");

        write_file(relative_path, documents_dir.path(), "<p>first</p>").unwrap();
        write_file(relative_path, documents_dir.path(), "<p>second</p>").unwrap();

        let written = read_file(relative_path, documents_dir.path()).unwrap();
        assert_eq!(written, "<p>second</p>");
        assert!(documents_dir.path().join("folder").join("sub").is_dir());
    }
}
