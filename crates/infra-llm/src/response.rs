// generateContent response parsing and code clean-up
use animagen_core::domain::source::RENDERER_IMPORT;
use animagen_core::port::GenerationError;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate
    pub(crate) fn into_text(self) -> Result<String, GenerationError> {
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::Malformed(
                "response has no text candidate".to_string(),
            ));
        }
        Ok(text)
    }
}

/// Strip markdown fences and make sure the renderer import is present
pub fn clean_code(raw: &str) -> String {
    let code: String = raw
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n");
    let code = code.trim();

    if code.contains(RENDERER_IMPORT) {
        format!("{}\n", code)
    } else {
        format!("{}\n\n{}\n", RENDERER_IMPORT, code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_fences() {
        let raw = "```python\nfrom manim import *\n\nclass ManimScene(Scene):\n    pass\n```\n";
        assert_eq!(
            clean_code(raw),
            "from manim import *\n\nclass ManimScene(Scene):\n    pass\n"
        );
    }

    #[test]
    fn test_prepends_import() {
        let cleaned = clean_code("class ManimScene(Scene):\n    pass");
        assert!(cleaned.starts_with("from manim import *\n\nclass ManimScene"));
    }

    #[test]
    fn test_extracts_first_candidate_text() {
        let body = serde_json::json!({
            "candidates": [
                {"content": {"parts": [{"text": "from manim"}, {"text": " import *"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        });
        let response: GenerateContentResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.into_text().unwrap(), "from manim import *");
    }

    #[test]
    fn test_empty_candidates_are_malformed() {
        let response: GenerateContentResponse =
            serde_json::from_value(serde_json::json!({"candidates": []})).unwrap();
        assert!(matches!(
            response.into_text(),
            Err(GenerationError::Malformed(_))
        ));

        let blocked: GenerateContentResponse =
            serde_json::from_value(serde_json::json!({"promptFeedback": {"blockReason": "SAFETY"}}))
                .unwrap();
        assert!(blocked.into_text().is_err());
    }
}
