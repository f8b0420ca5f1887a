use docent_retriever::DocRetriever;
use rmcp::schemars;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct SearchDocsRequest {
    /// Natural-language question about the documentation
    pub query: String,
}

/// Answer the question with documentation excerpts, or keyword matches when
/// semantic search is unavailable.
pub async fn search_docs(retriever: &DocRetriever, request: SearchDocsRequest) -> String {
    let query = request.query.trim();
    info!("search_docs: {:?}", query);
    retriever.retrieve(query).await
}
