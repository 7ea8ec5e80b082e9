use relative_path::RelativePathBuf;
use std::collections::BTreeMap;

use crate::models::SavedDocument;

/// A row of the documents sidebar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEntry {
    /// 1-based position in path order
    pub id: usize,
    pub name: String,
    pub path: RelativePathBuf,
}

/// Saved documents known to the sidebar, kept sorted by path
#[derive(Debug, Default)]
pub struct DocumentIndex {
    documents: BTreeMap<RelativePathBuf, SavedDocument>,
}

impl DocumentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document, replacing any entry with the same path
    pub fn add(&mut self, document: SavedDocument) {
        self.documents
            .insert(document.relative_path().to_relative_path_buf(), document);
    }

    pub fn entries(&self) -> Vec<DocumentEntry> {
        self.documents
            .values()
            .enumerate()
            .map(|(i, document)| DocumentEntry {
                id: i + 1,
                name: document.display_name().to_string(),
                path: document.relative_path().to_relative_path_buf(),
            })
            .collect()
    }
}

impl FromIterator<SavedDocument> for DocumentIndex {
    fn from_iter<I: IntoIterator<Item = SavedDocument>>(iter: I) -> Self {
        let mut index = Self::new();
        for document in iter {
            index.add(document);
        }
        index
    }
}
