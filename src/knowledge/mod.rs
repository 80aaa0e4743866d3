//! Knowledge 모듈 - 검색 대상 벡터 스냅샷
//!
//! - LanceDB: 디스크 기반 벡터 검색 (ANN)
//! - Memory: 인메모리 코사인 유사도 검색
//! - Retriever: 질문 임베딩 + top-K 검색

mod lance;
mod memory;
mod retriever;
mod vector;

// Re-exports
pub use lance::LanceVectorStore;
pub use memory::MemoryVectorStore;
pub use retriever::{ChunkRetriever, EmbeddingRetriever};
pub use vector::{cosine_similarity, sort_by_score, RetrievedChunk, VectorEntry, VectorStore};
