// Shared prompt fragments.
// Each module that calls a provider keeps its own templates in a prompts.rs alongside it.

/// Appended to every system prompt whose template promises JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Builds a system prompt, adding the JSON-only instruction when required.
pub fn system_prompt(base: &str, json_output: bool) -> String {
    if json_output {
        format!("{base}\n\n{JSON_ONLY_INSTRUCTION}")
    } else {
        base.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_json_mentions_json() {
        assert!(system_prompt("coach", true).contains("valid JSON only"));
    }

    #[test]
    fn test_system_prompt_text_is_unchanged() {
        assert_eq!(system_prompt("coach", false), "coach");
    }
}
