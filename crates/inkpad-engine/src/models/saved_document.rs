use relative_path::{RelativePath, RelativePathBuf};

/// A document saved in the documents folder, identified by its path
/// relative to that folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDocument {
    relative_path: RelativePathBuf,
    display_name: String,
}

impl SavedDocument {
    pub fn new(relative_path: RelativePathBuf) -> Self {
        let display_name = Self::extract_display_name(&relative_path);
        Self {
            relative_path,
            display_name,
        }
    }

    pub fn relative_path(&self) -> &RelativePath {
        &self.relative_path
    }

    /// File name without the `.md` extension
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    fn extract_display_name(path: &RelativePath) -> String {
        path.file_name()
            .map(|name| name.strip_suffix(".md").unwrap_or(name))
            .unwrap_or("Untitled")
            .to_string()
    }
}

impl From<RelativePathBuf> for SavedDocument {
    fn from(path: RelativePathBuf) -> Self {
        Self::new(path)
    }
}

impl From<&str> for SavedDocument {
    fn from(path: &str) -> Self {
        Self::new(RelativePathBuf::from(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_drops_extension() {
        let document = SavedDocument::from("drafts/오늘의-메모.md");
        assert_eq!(document.display_name(), "오늘의-메모");
        assert_eq!(document.relative_path().as_str(), "drafts/오늘의-메모.md");
    }

    #[test]
    fn test_name_without_extension_is_kept() {
        let document = SavedDocument::from("README");
        assert_eq!(document.display_name(), "README");
    }
}
