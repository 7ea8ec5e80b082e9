pub mod document_index;
pub mod saved_document;

pub use document_index::{DocumentEntry, DocumentIndex};
pub use saved_document::SavedDocument;
