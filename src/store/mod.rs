//! Document lookup.
//!
//! The pipeline only needs to resolve a [`DocumentId`] to a stored image path.
//! Persistence belongs to the embedding application; [`InMemoryDocumentStore`]
//! covers tools and tests.

use crate::core::{ForensicsError, ForensicsResult};
use crate::domain::{Document, DocumentId, OwnerId};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Read access to uploaded documents.
pub trait DocumentStore: Send + Sync {
    /// Looks up a document.
    ///
    /// # Errors
    ///
    /// Returns [`ForensicsError::NotFound`] if no document has this id.
    fn get_document(&self, id: DocumentId) -> ForensicsResult<Document>;
}

/// Thread-safe store keeping documents in a map.
#[derive(Debug)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<DocumentId, Document>>,
    next_id: AtomicU64,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentStore {
    /// Creates an empty store. Ids start at 1.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers an uploaded image under a fresh id and returns its record.
    ///
    /// Ids already taken through [`InMemoryDocumentStore::insert_document`] are
    /// skipped, so an existing record is never replaced.
    pub fn insert(&self, path: impl Into<PathBuf>, owner: OwnerId) -> Document {
        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let id = loop {
            let id = DocumentId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
            if !documents.contains_key(&id) {
                break id;
            }
        };
        let document = Document::new(id, path, owner);
        documents.insert(id, document.clone());
        document
    }

    /// Stores a record with a caller-assigned id, replacing any previous one.
    ///
    /// Later calls to [`InMemoryDocumentStore::insert`] allocate ids above it.
    pub fn insert_document(&self, document: Document) {
        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.next_id.fetch_max(document.id.get().saturating_add(1), Ordering::SeqCst);
        documents.insert(document.id, document);
    }

    /// Removes a record, returning it if present.
    pub fn remove(&self, id: DocumentId) -> Option<Document> {
        self.documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&id)
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn get_document(&self, id: DocumentId) -> ForensicsResult<Document> {
        self.documents
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&id)
            .cloned()
            .ok_or_else(|| ForensicsError::not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorKind;

    #[test]
    fn test_insert_assigns_unique_ids() {
        let store = InMemoryDocumentStore::new();
        let a = store.insert("uploads/a.png", OwnerId::new(1));
        let b = store.insert("uploads/b.jpg", OwnerId::new(1));

        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get_document(a.id).unwrap().path, PathBuf::from("uploads/a.png"));
        assert_eq!(store.get_document(b.id).unwrap().owner, OwnerId::new(1));
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let store = InMemoryDocumentStore::new();
        let err = store.get_document(DocumentId::new(99)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_remove() {
        let store = InMemoryDocumentStore::new();
        let doc = store.insert("uploads/a.tiff", OwnerId::new(3));

        assert_eq!(store.remove(doc.id).map(|d| d.id), Some(doc.id));
        assert!(store.is_empty());
        assert!(store.remove(doc.id).is_none());
        assert_eq!(
            store.get_document(doc.id).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_insert_document_replaces_existing() {
        let store = InMemoryDocumentStore::new();
        let id = DocumentId::new(5);
        store.insert_document(Document::new(id, "old.png", OwnerId::new(1)));
        store.insert_document(Document::new(id, "new.png", OwnerId::new(1)));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get_document(id).unwrap().path, PathBuf::from("new.png"));
    }

    #[test]
    fn test_generated_ids_skip_caller_assigned_ones() {
        let store = InMemoryDocumentStore::new();
        let manual = DocumentId::new(1);
        store.insert_document(Document::new(manual, "manual.png", OwnerId::new(1)));

        let generated = store.insert("auto.png", OwnerId::new(2));

        assert_ne!(generated.id, manual);
        assert_eq!(store.len(), 2);
        assert_eq!(
            store.get_document(manual).unwrap().path,
            PathBuf::from("manual.png")
        );
        assert_eq!(
            store.get_document(generated.id).unwrap().path,
            PathBuf::from("auto.png")
        );
    }

    #[test]
    fn test_generated_ids_continue_above_assigned_id() {
        let store = InMemoryDocumentStore::new();
        store.insert_document(Document::new(DocumentId::new(7), "a.png", OwnerId::new(1)));

        assert_eq!(store.insert("b.png", OwnerId::new(1)).id, DocumentId::new(8));
    }
}
