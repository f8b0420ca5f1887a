//! Keyword search over the raw documents, used when vector search cannot run.

use super::change_detector::list_documents;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, error, warn};

/// Returned when the keyword scan finds nothing.
pub const DEGRADED_SERVICE_MESSAGE: &str = "Semantic search is temporarily unavailable and no \
     keyword matches were found in the documentation. Try rephrasing the question or rebuilding the index.";

/// Returned when the keyword scan itself fails.
pub const SEARCH_FAILED_MESSAGE: &str = "Documentation search failed. Please try again later.";

const MATCHES_HEADER: &str = "Semantic search is unavailable; keyword matches from the documentation:";

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "how", "what", "when",
    "where", "which", "who", "why", "with", "this", "that", "these", "those", "from", "into",
    "about", "does", "have", "has", "was", "were", "will", "would", "should", "could", "there",
    "their", "then", "than", "them", "your", "our", "its", "use", "using",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Domain keywords used when the query itself has none
    pub keywords: Vec<String>,
    /// Matching lines returned at most
    pub max_matches: usize,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            keywords: ["install", "setup", "configuration", "usage", "error", "example"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_matches: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FallbackSearcher {
    docs_dir: PathBuf,
    extensions: Vec<String>,
    config: FallbackConfig,
}

impl FallbackSearcher {
    pub fn new(docs_dir: PathBuf, extensions: Vec<String>, config: FallbackConfig) -> Self {
        Self {
            docs_dir,
            extensions,
            config,
        }
    }

    /// Search the documents for keywords of `query`. Never fails; problems
    /// are reported through the returned text.
    pub async fn search(&self, query: &str) -> String {
        match self.scan(query).await {
            Ok(matches) if matches.is_empty() => DEGRADED_SERVICE_MESSAGE.to_string(),
            Ok(matches) => format!("{MATCHES_HEADER}\n{}", matches.join("\n")),
            Err(e) => {
                error!("Keyword fallback failed: {:#}", e);
                SEARCH_FAILED_MESSAGE.to_string()
            }
        }
    }

    /// Lowercased keywords for `query`.
    pub fn keywords(&self, query: &str) -> Vec<String> {
        let query = query.to_lowercase();
        let mut keywords: Vec<String> = Vec::new();

        for term in query.split(|c: char| !c.is_alphanumeric()) {
            if term.chars().count() >= 3
                && !STOP_WORDS.contains(&term)
                && !keywords.iter().any(|k| k == term)
            {
                keywords.push(term.to_string());
            }
        }
        for keyword in &self.config.keywords {
            let keyword = keyword.to_lowercase();
            if query.contains(&keyword) && !keywords.contains(&keyword) {
                keywords.push(keyword);
            }
        }

        if keywords.is_empty() {
            keywords = self.config.keywords.iter().map(|k| k.to_lowercase()).collect();
        }
        keywords
    }

    async fn scan(&self, query: &str) -> Result<Vec<String>> {
        let keywords = self.keywords(query);
        debug!("Keyword fallback for {:?} using {:?}", query, keywords);
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let mut matches = Vec::new();
        for path in list_documents(&self.docs_dir, &self.extensions)? {
            let content = match tokio::fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) => {
                    warn!("Skipping unreadable document {}: {}", path.display(), e);
                    continue;
                }
            };
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();

            for line in content.lines().map(str::trim).filter(|line| !line.is_empty()) {
                let lowered = line.to_lowercase();
                if keywords.iter().any(|keyword| lowered.contains(keyword.as_str())) {
                    matches.push(format!("{file_name}: {line}"));
                    if matches.len() >= self.config.max_matches {
                        return Ok(matches);
                    }
                }
            }
        }
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn searcher(dir: PathBuf) -> FallbackSearcher {
        FallbackSearcher::new(dir, vec!["md".to_string()], FallbackConfig::default())
    }

    #[test]
    fn test_keywords_from_query() {
        let searcher = searcher(PathBuf::from("docs"));

        assert_eq!(
            searcher.keywords("How do I install Rust?"),
            vec!["install", "rust"]
        );
        assert_eq!(searcher.keywords("setup"), vec!["setup"]);
        assert_eq!(
            searcher.keywords("how is it?"),
            FallbackConfig::default().keywords
        );
    }

    #[tokio::test]
    async fn test_matching_lines_are_prefixed() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        fs::write(
            temp_dir.path().join("setup.md"),
            "# Setup\n\nInstall Node.js.\nThen install Rust.\nNothing else.",
        )?;

        let answer = searcher(temp_dir.path().to_path_buf())
            .search("How to install Rust")
            .await;
        assert_eq!(
            answer,
            format!("{MATCHES_HEADER}\nsetup.md: Install Node.js.\nsetup.md: Then install Rust.")
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_match_count_is_capped() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        fs::write(temp_dir.path().join("log.md"), "error line\n".repeat(20))?;

        let answer = searcher(temp_dir.path().to_path_buf()).search("error").await;
        assert_eq!(answer.lines().count(), 1 + 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_no_match_is_degraded_message() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        fs::write(temp_dir.path().join("a.md"), "Completely unrelated text.")?;

        let answer = searcher(temp_dir.path().to_path_buf())
            .search("kubernetes deployment")
            .await;
        assert_eq!(answer, DEGRADED_SERVICE_MESSAGE);

        let missing = searcher(temp_dir.path().join("missing")).search("install").await;
        assert_eq!(missing, DEGRADED_SERVICE_MESSAGE);
        Ok(())
    }
}
