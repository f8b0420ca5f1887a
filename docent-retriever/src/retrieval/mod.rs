pub mod assembler;
pub mod change_detector;
pub mod chunker;
pub mod fallback;
pub mod hasher;
pub mod indexer;
pub mod retriever;
pub mod search;
