//! Extraction of JSON payloads from model responses.

/// Pull the JSON payload out of a model response.
///
/// Prefers a ```json fenced block, falls back to any fenced block that looks
/// like JSON, and otherwise returns the trimmed response unchanged.
pub fn extract_json_block(response: &str) -> &str {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find("```json") {
        let body = &trimmed[start + 7..];
        if let Some(end) = body.find("```") {
            return body[..end].trim();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let body = &trimmed[start + 3..];
        if let Some(end) = body.find("```") {
            let candidate = body[..end].trim();
            if candidate.starts_with('{') || candidate.starts_with('[') {
                return candidate;
            }
        }
    }

    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_json_fence() {
        let response = "Here is the result:\n```json\n{\"a\": 1}\n```\nDone.";
        assert_eq!(extract_json_block(response), "{\"a\": 1}");
    }

    #[test]
    fn test_generic_fence_must_look_like_json() {
        let response = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_json_block(response), "{\"a\": 1}");

        let response = "```\nnot json\n```";
        assert_eq!(extract_json_block(response), response.trim());
    }

    #[test]
    fn test_bare_json_passes_through() {
        let response = "  {\"files\": []}  ";
        assert_eq!(extract_json_block(response), "{\"files\": []}");
    }

    #[test]
    fn test_array_payload() {
        let response = "```\n[1, 2, 3]\n```";
        assert_eq!(extract_json_block(response), "[1, 2, 3]");
    }
}
