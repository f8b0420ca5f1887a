//! Tool implementations for the docent MCP server.
//!
//! Each tool is a plain async function over a [`docent_retriever::DocRetriever`],
//! so it can be called without an MCP transport.

pub mod refresh_index;
pub mod search_docs;
