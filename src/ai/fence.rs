// ── AI Client: markdown fence stripping ─────────────────────────────────────
// Many providers wrap structured output in a ```json ... ``` fence even when
// explicitly asked for raw JSON. Strip it before attempted validation
// (spec.md §4.4).

pub fn strip_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_prefix('\n').unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        let raw = "```json\n{\"a\":1}\n```";
        assert_eq!(strip_fences(raw), "{\"a\":1}");
    }

    #[test]
    fn strips_bare_fence_without_language_tag() {
        let raw = "```\n{\"a\":1}\n```";
        assert_eq!(strip_fences(raw), "{\"a\":1}");
    }

    #[test]
    fn passes_through_unfenced_json_unchanged() {
        let raw = "{\"a\":1}";
        assert_eq!(strip_fences(raw), "{\"a\":1}");
    }
}
