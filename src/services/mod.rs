pub mod document_service;

pub use document_service::{DocumentService, Translator, DEFAULT_QUERY_LIMIT};
