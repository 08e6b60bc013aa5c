use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::parser::{ExtractedDocument, FileType};

/// Listing entry for a stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub id: String,
    pub file_type: FileType,
    pub page_count: usize,
    pub chunk_count: usize,
    pub word_count: usize,
}

impl DocumentInfo {
    fn describe(id: &str, document: &ExtractedDocument) -> Self {
        Self {
            id: id.to_string(),
            file_type: document.file_type,
            page_count: document.page_count,
            chunk_count: document.chunks.len(),
            word_count: document.word_count(),
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store a document and return its new id
    async fn put(&self, document: ExtractedDocument) -> Result<String>;

    async fn get(&self, id: &str) -> Result<Option<Arc<ExtractedDocument>>>;

    async fn list(&self) -> Result<Vec<DocumentInfo>>;
}

/// Process-wide registry keyed by `doc_<n>`, n counting up from 1.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    next_id: AtomicU64,
    documents: RwLock<HashMap<String, Arc<ExtractedDocument>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn put(&self, document: ExtractedDocument) -> Result<String> {
        let id = format!("doc_{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.documents
            .write()
            .await
            .insert(id.clone(), Arc::new(document));
        debug!(id = %id, "stored document");
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<Arc<ExtractedDocument>>> {
        Ok(self.documents.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<DocumentInfo>> {
        let documents = self.documents.read().await;
        let mut infos: Vec<(u64, DocumentInfo)> = documents
            .iter()
            .map(|(id, document)| {
                let n = id
                    .strip_prefix("doc_")
                    .and_then(|n| n.parse().ok())
                    .unwrap_or(u64::MAX);
                (n, DocumentInfo::describe(id, document))
            })
            .collect();
        infos.sort_by_key(|(n, _)| *n);
        Ok(infos.into_iter().map(|(_, info)| info).collect())
    }
}
