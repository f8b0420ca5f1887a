use crate::tools::{
    self, refresh_index::RefreshIndexRequest, search_docs::SearchDocsRequest,
};
use anyhow::Result;
use docent_retriever::DocRetriever;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ErrorData as McpError, *},
    tool, tool_handler, tool_router,
    transport::stdio,
};
use std::sync::Arc;
use tracing::{info, warn};

/// MCP server exposing documentation retrieval to an agent
#[derive(Clone)]
pub struct DocentMcpServer {
    retriever: Arc<DocRetriever>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl DocentMcpServer {
    pub fn new(retriever: Arc<DocRetriever>) -> Self {
        Self {
            retriever,
            tool_router: Self::tool_router(),
        }
    }

    pub fn retriever(&self) -> &Arc<DocRetriever> {
        &self.retriever
    }

    #[tool(
        description = "Answer a question from the project documentation. Returns the most relevant excerpts with their file names and relevance, or keyword matches when semantic search is unavailable."
    )]
    pub async fn search_docs(
        &self,
        Parameters(request): Parameters<SearchDocsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let answer = tools::search_docs::search_docs(&self.retriever, request).await;
        Ok(CallToolResult::success(vec![Content::text(answer)]))
    }

    #[tool(
        description = "Rebuild the documentation index from scratch. Optionally takes a directory to index instead of the configured documents directory."
    )]
    pub async fn refresh_index(
        &self,
        Parameters(request): Parameters<RefreshIndexRequest>,
    ) -> Result<CallToolResult, McpError> {
        match tools::refresh_index::refresh_index(&self.retriever, request).await {
            Ok(message) => Ok(CallToolResult::success(vec![Content::text(message)])),
            Err(message) => Ok(CallToolResult::error(vec![Content::text(message)])),
        }
    }

    /// Serve over stdio until the client disconnects or the process is
    /// interrupted, then close the index.
    pub async fn serve_stdio(self) -> Result<()> {
        let retriever = Arc::clone(&self.retriever);
        info!("Starting MCP server with stdio transport");

        let result = match self.serve(stdio()).await {
            Ok(service) => {
                tokio::select! {
                    quit = service.waiting() => match quit {
                        Ok(reason) => {
                            info!("MCP server quit: {:?}", reason);
                            Ok(())
                        }
                        Err(e) => Err(anyhow::anyhow!("MCP server task failed: {e}")),
                    },
                    _ = tokio::signal::ctrl_c() => {
                        warn!("Interrupted, closing index");
                        Ok(())
                    }
                }
            }
            Err(e) => Err(anyhow::anyhow!("Failed to start MCP server: {e}")),
        };

        retriever.close().await;
        result
    }
}

#[tool_handler]
impl ServerHandler for DocentMcpServer {
    fn get_info(&self) -> ServerInfo {
        let mut server_info = Implementation::default();
        server_info.name = "docent".to_string();
        server_info.version = env!("CARGO_PKG_VERSION").to_string();
        server_info.title = Some("Docent Documentation Retrieval".to_string());

        let mut info = ServerInfo::default();
        info.protocol_version = ProtocolVersion::V_2024_11_05;
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info = server_info;
        info.instructions = Some(
            "This server answers questions from the project's documentation. \
            Call 'search_docs' with a natural-language question before answering anything \
            about the project, and quote the excerpts it returns. \
            Call 'refresh_index' after the documentation changes substantially."
                .to_string(),
        );
        info
    }
}
