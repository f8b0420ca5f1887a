use docent_retriever::DocRetriever;
use rmcp::schemars;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Debug, Default, Deserialize, Serialize, schemars::JsonSchema)]
pub struct RefreshIndexRequest {
    /// Directory to index instead of the configured documents directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

/// Clear the index and index every document again.
///
/// A directory that does not exist is rejected before the index is touched.
pub async fn refresh_index(
    retriever: &DocRetriever,
    request: RefreshIndexRequest,
) -> Result<String, String> {
    let dir = request
        .directory
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .map(PathBuf::from);
    let target = dir
        .clone()
        .unwrap_or_else(|| retriever.config().docs_dir.clone());

    if !target.is_dir() {
        let message = format!("Index refresh failed: {} is not a directory", target.display());
        error!("{}", message);
        return Err(message);
    }

    info!("refresh_index: rebuilding from {}", target.display());
    match retriever.refresh_index(dir.as_deref()).await {
        Ok(report) => {
            let mut message = format!(
                "Index refreshed from {}: {} of {} documents indexed, {} chunks written.",
                target.display(),
                report.files_indexed,
                report.files_total,
                report.chunks_written
            );
            if report.files_failed > 0 {
                message.push_str(&format!(" {} documents failed.", report.files_failed));
            }
            Ok(message)
        }
        Err(e) => {
            error!("Index refresh failed: {:#}", e);
            Err(format!("Index refresh failed: {e:#}"))
        }
    }
}
