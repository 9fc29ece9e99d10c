/// Collection-oriented document storage and its backends.
pub mod document_store;
/// Typed league entities decoded from stored documents.
pub mod models;
/// Storage abstraction layer errors.
pub mod storage;
