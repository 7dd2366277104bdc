//! Wait analysis for recorded scripts
//!
//! The session only depends on the [`WaitAnalyzer`] trait. The bundled
//! [`HeuristicWaitAnalyzer`] is a line-based stand-in so the recorder runs
//! without an external analysis engine.

/// Analyzer that suggests and inserts synchronization statements
pub trait WaitAnalyzer: Send + Sync {
    /// Human-readable hints, possibly empty
    fn suggest_waits(&self, code: &str) -> Vec<String>;

    /// Code with wait statements added. Must be safe to re-run on its own output.
    fn enhance(&self, code: &str) -> String;
}

const LOAD_STATE_WAIT: &str = "await page.waitForLoadState();";

/// Line-prefix heuristics over Playwright-style JavaScript
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicWaitAnalyzer;

impl HeuristicWaitAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl WaitAnalyzer for HeuristicWaitAnalyzer {
    fn suggest_waits(&self, code: &str) -> Vec<String> {
        let mut suggestions = Vec::new();
        let mut waited: Vec<String> = Vec::new();

        for (index, line) in code.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.contains("waitFor") {
                if let Some(selector) = first_string_literal(trimmed) {
                    waited.push(selector.to_string());
                }
                continue;
            }

            let action = ["click(", "fill("]
                .into_iter()
                .find(|action| trimmed.contains(&format!(".{}", action)));
            if let Some(action) = action {
                if let Some(selector) = first_string_literal(trimmed) {
                    if !waited.iter().any(|w| w == selector) {
                        suggestions.push(format!(
                            "line {}: consider waiting for '{}' before {}",
                            index + 1,
                            selector,
                            action.trim_end_matches('(')
                        ));
                    }
                }
            }
        }

        suggestions
    }

    fn enhance(&self, code: &str) -> String {
        let lines: Vec<&str> = code.lines().collect();
        let mut out = Vec::with_capacity(lines.len());

        for (index, line) in lines.iter().enumerate() {
            out.push(line.to_string());

            let trimmed = line.trim_start();
            if !trimmed.starts_with("await page.goto(") {
                continue;
            }
            let already_waits = lines
                .get(index + 1)
                .map(|next| next.trim() == LOAD_STATE_WAIT)
                .unwrap_or(false);
            if !already_waits {
                let indent = &line[..line.len() - trimmed.len()];
                out.push(format!("{}{}", indent, LOAD_STATE_WAIT));
            }
        }

        let mut enhanced = out.join("\n");
        if code.ends_with('\n') {
            enhanced.push('\n');
        }
        enhanced
    }
}

/// First single- or double-quoted literal on a line
fn first_string_literal(line: &str) -> Option<&str> {
    let start = line.find(['\'', '"'])?;
    let quote = line[start..].chars().next()?;
    let rest = &line[start + 1..];
    let end = rest.find(quote)?;
    Some(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enhance_adds_load_state_after_goto() {
        let code = "  await page.goto('https://example.com/');\n  await page.click('#a');\n";
        let enhanced = HeuristicWaitAnalyzer.enhance(code);

        assert_eq!(
            enhanced,
            "  await page.goto('https://example.com/');\n  await page.waitForLoadState();\n  await page.click('#a');\n"
        );
    }

    #[test]
    fn test_enhance_is_idempotent() {
        let code = "await page.goto('/a');\nawait page.goto('/b');";
        let once = HeuristicWaitAnalyzer.enhance(code);
        let twice = HeuristicWaitAnalyzer.enhance(&once);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_suggest_waits_skips_waited_selectors() {
        let code = "await page.waitForSelector('#a');\nawait page.click('#a');\nawait page.fill('#b', 'x');";
        let suggestions = HeuristicWaitAnalyzer.suggest_waits(code);

        assert_eq!(suggestions.len(), 1);
        assert!(suggestions[0].contains("'#b'"));
        assert!(suggestions[0].starts_with("line 3"));
    }

    #[test]
    fn test_first_string_literal() {
        assert_eq!(first_string_literal("page.click(\"#x\")"), Some("#x"));
        assert_eq!(first_string_literal("page.click(sel)"), None);
    }
}
