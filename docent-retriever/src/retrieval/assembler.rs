//! Turns ranked search results into the text handed back to callers.

use super::search::SearchResult;

/// Returned when no result clears the assembly threshold.
pub const NO_RELEVANT_INFORMATION: &str = "No relevant information found in the documentation.";

const SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Clone)]
pub struct ResultAssembler {
    threshold: f32,
}

impl Default for ResultAssembler {
    fn default() -> Self {
        Self::new(0.2)
    }
}

impl ResultAssembler {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// Format results at or above the threshold, in the given order.
    pub fn assemble(&self, results: &[SearchResult]) -> String {
        let sections: Vec<String> = results
            .iter()
            .filter(|result| result.score >= self.threshold)
            .enumerate()
            .map(|(i, result)| {
                format!(
                    "[{}] {} (relevance: {}%)\n{}",
                    i + 1,
                    result.metadata.file_name,
                    (result.score * 100.0).round() as u32,
                    result.text.trim()
                )
            })
            .collect();

        if sections.is_empty() {
            NO_RELEVANT_INFORMATION.to_string()
        } else {
            sections.join(SEPARATOR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::search::ResultMetadata;

    fn result(file_name: &str, score: f32, text: &str) -> SearchResult {
        SearchResult {
            text: text.to_string(),
            score,
            metadata: ResultMetadata {
                file_name: file_name.to_string(),
                file_path: format!("docs/{file_name}"),
                chunk_index: 0,
            },
        }
    }

    #[test]
    fn test_formats_survivors_with_ordinals() {
        let assembled = ResultAssembler::default().assemble(&[
            result("setup.md", 0.874, "Install Node.js. Then install Rust."),
            result("noise.md", 0.15, "Unrelated"),
            result("usage.md", 0.5, "  Run the binary.  "),
        ]);

        assert_eq!(
            assembled,
            "[1] setup.md (relevance: 87%)\nInstall Node.js. Then install Rust.\n\n---\n\n\
             [2] usage.md (relevance: 50%)\nRun the binary."
        );
    }

    #[test]
    fn test_sentinel_when_nothing_survives() {
        let assembler = ResultAssembler::default();
        assert_eq!(assembler.assemble(&[]), NO_RELEVANT_INFORMATION);
        assert_eq!(
            assembler.assemble(&[result("a.md", 0.19, "weak match")]),
            NO_RELEVANT_INFORMATION
        );
    }
}
