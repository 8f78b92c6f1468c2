use crate::models::{Chunk, ChunkDraft, SourceDocument};
use crate::traits::ChunkStore;
use crate::StoreError;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Chunk store kept in process memory. Documents are listed in the order they
/// were first stored; re-ingesting a document keeps its position.
///
/// A document's chunks are written under a single write guard, so readers
/// never observe a partially stored document and concurrent ingestion of
/// the same document cannot interleave indices.
#[derive(Debug, Default)]
pub struct InMemoryChunkStore {
    documents: RwLock<Vec<StoredDocument>>,
}

#[derive(Debug)]
struct StoredDocument {
    document_id: String,
    chunks: Vec<Chunk>,
}

impl InMemoryChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn document_count(&self) -> usize {
        self.documents.read().await.len()
    }
}

fn check_contiguous(document_id: &str, drafts: &[ChunkDraft]) -> Result<(), StoreError> {
    for (expected, draft) in drafts.iter().enumerate() {
        let expected = expected as u32;
        if draft.index != expected {
            return Err(StoreError::NonContiguousIndex {
                document_id: document_id.to_string(),
                expected,
                found: draft.index,
            });
        }
    }
    Ok(())
}

#[async_trait]
impl ChunkStore for InMemoryChunkStore {
    async fn replace_document(
        &self,
        document: &SourceDocument,
        drafts: &[ChunkDraft],
    ) -> Result<Vec<Chunk>, StoreError> {
        if drafts.is_empty() {
            return Err(StoreError::EmptyBatch(document.document_id.clone()));
        }
        check_contiguous(&document.document_id, drafts)?;

        let created_at = Utc::now();
        let chunks: Vec<Chunk> = drafts
            .iter()
            .map(|draft| Chunk {
                id: Uuid::new_v4().to_string(),
                document_id: document.document_id.clone(),
                document_title: document.title.clone(),
                index: draft.index,
                content: draft.content.clone(),
                embedding: draft.embedding.clone(),
                created_at,
            })
            .collect();

        let mut documents = self.documents.write().await;
        match documents
            .iter()
            .position(|stored| stored.document_id == document.document_id)
        {
            Some(position) => documents[position].chunks = chunks.clone(),
            None => documents.push(StoredDocument {
                document_id: document.document_id.clone(),
                chunks: chunks.clone(),
            }),
        }
        Ok(chunks)
    }

    async fn all_chunks(&self) -> Vec<Chunk> {
        self.documents
            .read()
            .await
            .iter()
            .flat_map(|stored| stored.chunks.iter().cloned())
            .collect()
    }

    async fn document_chunks(&self, document_id: &str) -> Vec<Chunk> {
        self.documents
            .read()
            .await
            .iter()
            .find(|stored| stored.document_id == document_id)
            .map(|stored| stored.chunks.clone())
            .unwrap_or_default()
    }

    async fn remove_document(&self, document_id: &str) -> usize {
        let mut documents = self.documents.write().await;
        match documents
            .iter()
            .position(|stored| stored.document_id == document_id)
        {
            Some(position) => documents.remove(position).chunks.len(),
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn document(id: &str) -> SourceDocument {
        SourceDocument {
            document_id: id.to_string(),
            title: format!("{id}.txt"),
            content: String::new(),
        }
    }

    fn drafts(count: u32) -> Vec<ChunkDraft> {
        (0..count)
            .map(|index| ChunkDraft {
                content: format!("passage {index}"),
                index,
                embedding: None,
            })
            .collect()
    }

    #[tokio::test]
    async fn stores_and_lists_chunks_in_index_order() {
        let store = InMemoryChunkStore::new();
        let stored = store.replace_document(&document("a"), &drafts(3)).await.unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[0].document_title, "a.txt");

        let listed = store.document_chunks("a").await;
        let indices: Vec<u32> = listed.iter().map(|chunk| chunk.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_ne!(listed[0].id, listed[1].id);
    }

    #[tokio::test]
    async fn documents_are_listed_in_ingestion_order() {
        let store = InMemoryChunkStore::new();
        store.replace_document(&document("zzz"), &drafts(2)).await.unwrap();
        store.replace_document(&document("aaa"), &drafts(1)).await.unwrap();

        let order: Vec<String> = store
            .all_chunks()
            .await
            .into_iter()
            .map(|chunk| chunk.document_id)
            .collect();
        assert_eq!(order, vec!["zzz", "zzz", "aaa"]);

        store.replace_document(&document("zzz"), &drafts(1)).await.unwrap();
        let first = &store.all_chunks().await[0];
        assert_eq!(first.document_id, "zzz");
    }

    #[tokio::test]
    async fn gaps_in_indices_are_rejected_without_writing() {
        let store = InMemoryChunkStore::new();
        let mut batch = drafts(3);
        batch[2].index = 5;

        let error = store.replace_document(&document("a"), &batch).await.unwrap_err();
        assert_eq!(
            error,
            StoreError::NonContiguousIndex {
                document_id: "a".to_string(),
                expected: 2,
                found: 5,
            }
        );
        assert!(store.all_chunks().await.is_empty());
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let store = InMemoryChunkStore::new();
        let result = store.replace_document(&document("a"), &[]).await;
        assert!(matches!(result, Err(StoreError::EmptyBatch(_))));
    }

    #[tokio::test]
    async fn replacing_a_document_drops_old_chunks() {
        let store = InMemoryChunkStore::new();
        store.replace_document(&document("a"), &drafts(4)).await.unwrap();
        store.replace_document(&document("a"), &drafts(2)).await.unwrap();
        assert_eq!(store.document_chunks("a").await.len(), 2);
    }

    #[tokio::test]
    async fn removing_a_document_cascades() {
        let store = InMemoryChunkStore::new();
        store.replace_document(&document("a"), &drafts(2)).await.unwrap();
        store.replace_document(&document("b"), &drafts(1)).await.unwrap();

        assert_eq!(store.remove_document("a").await, 2);
        assert_eq!(store.remove_document("a").await, 0);
        assert_eq!(store.all_chunks().await.len(), 1);
        assert_eq!(store.document_count().await, 1);
    }

    #[tokio::test]
    async fn concurrent_ingestion_keeps_indices_contiguous() {
        let store = Arc::new(InMemoryChunkStore::new());
        let mut handles = Vec::new();
        for count in [3u32, 5, 2, 4] {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.replace_document(&document("shared"), &drafts(count)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let chunks = store.document_chunks("shared").await;
        let indices: Vec<u32> = chunks.iter().map(|chunk| chunk.index).collect();
        let expected: Vec<u32> = (0..chunks.len() as u32).collect();
        assert_eq!(indices, expected);
    }
}
