//! Saving editor content into the documents folder.
//!
//! A save request carries a title and the editor's markup; the markup is
//! written verbatim to a `.md` file named after the title. Saving never
//! returns an error to the caller: failures come back as a response with
//! `success: false` and a message suitable for showing to the user.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::{info, warn};
use regex::Regex;
use relative_path::{RelativePath, RelativePathBuf};
use serde::{Deserialize, Serialize};

use crate::io::{self, IoError};
use crate::models::{DocumentEntry, DocumentIndex, SavedDocument};

pub const MISSING_FIELDS_MESSAGE: &str = "Both title and content are required";
pub const SAVE_FAILED_MESSAGE: &str = "Failed to save document";
pub const SAVED_MESSAGE: &str = "Document saved";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl SaveRequest {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<RelativePathBuf>,
}

impl SaveResponse {
    fn failure(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            file_path: None,
        }
    }
}

/// File name for a document titled `title`: punctuation is dropped,
/// whitespace runs become `-` and `.md` is appended.
pub fn document_file_name(title: &str) -> Result<String, IoError> {
    // ASCII word characters, whitespace and Hangul syllables survive
    static DISALLOWED: OnceLock<Regex> = OnceLock::new();
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let disallowed = DISALLOWED
        .get_or_init(|| Regex::new(r"[^A-Za-z0-9_\s가-힣]").expect("Invalid title regex"));
    let whitespace =
        WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

    // Whitespace left next to removed punctuation still becomes a hyphen
    let kept = disallowed.replace_all(title.trim(), "");
    let stem = whitespace.replace_all(&kept, "-");
    if stem.is_empty() {
        return Err(IoError::InvalidTitle(title.to_string()));
    }
    Ok(format!("{stem}.md"))
}

/// The documents folder.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `request.content` to the file derived from its title.
    pub fn save(&self, request: &SaveRequest) -> SaveResponse {
        if request.title.is_empty() || request.content.is_empty() {
            return SaveResponse::failure(MISSING_FIELDS_MESSAGE);
        }
        match self.write_document(&request.title, &request.content) {
            Ok(path) => {
                info!("Saved '{}' to {}", request.title, path);
                SaveResponse {
                    success: true,
                    message: SAVED_MESSAGE.to_string(),
                    file_path: Some(path),
                }
            }
            Err(e) => {
                warn!("Failed to save '{}': {}", request.title, e);
                SaveResponse::failure(SAVE_FAILED_MESSAGE)
            }
        }
    }

    fn write_document(&self, title: &str, content: &str) -> Result<RelativePathBuf, IoError> {
        let path = RelativePathBuf::from(document_file_name(title)?);
        io::write_file(&path, &self.root, content)?;
        Ok(path)
    }

    /// Saved documents for the sidebar, in path order.
    pub fn list_documents(&self) -> Result<Vec<DocumentEntry>, IoError> {
        let files = io::scan_documents(&self.root)?;
        let index: DocumentIndex = files
            .iter()
            .filter_map(|file| file.strip_prefix(&self.root).ok())
            .filter_map(|relative| RelativePathBuf::from_path(relative).ok())
            .map(SavedDocument::new)
            .collect();
        Ok(index.entries())
    }

    pub fn read_document(&self, relative_path: &RelativePath) -> Result<String, IoError> {
        io::read_file(relative_path, &self.root)
    }
}
