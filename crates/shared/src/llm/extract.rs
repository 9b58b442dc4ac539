/// Extracts the JSON payload from generated text that may be wrapped in a
/// markdown code fence. Handles ```json ... ```, plain ``` ... ```, bare
/// objects/arrays, and as a last resort the substring between the first
/// `{` and the last `}`.
pub fn extract_json_payload(text: &str) -> &str {
    if let Some(inner) = fenced_block(text) {
        return inner;
    }

    let trimmed = text.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed;
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            return trimmed[start..=end].trim();
        }
    }

    trimmed
}

fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let mut body = &text[open + 3..];
    if let Some(stripped) = body.strip_prefix("json") {
        body = stripped;
    }
    let close = body.find("```")?;
    Some(body[..close].trim())
}

#[cfg(test)]
mod tests {
    use super::extract_json_payload;

    #[test]
    fn strips_json_tagged_fence() {
        let text = "```json\n{\"origin\": \"DEL\"}\n```";
        assert_eq!(extract_json_payload(text), "{\"origin\": \"DEL\"}");
    }

    #[test]
    fn strips_untagged_fence() {
        let text = "Here you go:\n```\n[1, 2]\n```\nanything else";
        assert_eq!(extract_json_payload(text), "[1, 2]");
    }

    #[test]
    fn accepts_bare_object() {
        assert_eq!(extract_json_payload("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn accepts_bare_array() {
        assert_eq!(extract_json_payload("[{\"a\": 1}]"), "[{\"a\": 1}]");
    }

    #[test]
    fn falls_back_to_brace_span_inside_prose() {
        let text = "The parameters are {\"origin\": \"CCU\"} as requested.";
        assert_eq!(extract_json_payload(text), "{\"origin\": \"CCU\"}");
    }

    #[test]
    fn returns_trimmed_input_when_no_json_found() {
        assert_eq!(extract_json_payload("  no json here  "), "no json here");
    }
}
