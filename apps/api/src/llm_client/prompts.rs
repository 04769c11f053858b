// Prompt constants for text improvement.

/// System instruction for every rewrite request.
pub const IMPROVE_SYSTEM: &str = "You are an assistant that rewrites user-provided text for clarity, grammar, and concision. \
    Preserve all factual details and specific accomplishments. Avoid adding new facts. \
    Return ONLY the improved text, with no markdown or additional commentary.";

/// User message for rewriting one resume field.
pub fn improve_prompt(text: &str, property: &str) -> String {
    format!("Improve the following resume {property}:\n\n{text}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_improve_prompt() {
        assert_eq!(
            improve_prompt("I did stuff", "description"),
            "Improve the following resume description:\n\nI did stuff"
        );
    }
}
