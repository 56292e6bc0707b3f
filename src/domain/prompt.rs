use crate::domain::{DomainError, Result, SearchResult};

/// A prompt with `{name}` placeholders, filled in a single pass so text
/// substituted for one placeholder is never expanded again.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Fails when the template lacks any of the `required` placeholders.
    pub fn require(self, required: &[&str]) -> Result<Self> {
        for name in required {
            if !self.template.contains(&format!("{{{name}}}")) {
                return Err(DomainError::configuration(format!(
                    "prompt template is missing the {{{name}}} placeholder"
                )));
            }
        }
        Ok(self)
    }

    /// Unknown placeholders are left as written.
    pub fn render(&self, vars: &[(&str, &str)]) -> String {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            let substituted = after.find('}').and_then(|close| {
                let name = &after[..close];
                vars.iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| (*value, close))
            });

            match substituted {
                Some((value, close)) => {
                    out.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        out
    }
}

/// Joins retrieved chunk texts into the context block of a prompt.
pub fn format_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| r.chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DocumentChunk;

    #[test]
    fn test_render_substitutes_placeholders() {
        let tpl = PromptTemplate::new("Context:\n{context}\n\nQuestion: {question}\n\nAnswer:");
        let out = tpl.render(&[("context", "Revenue rose."), ("question", "Did revenue rise?")]);
        assert_eq!(out, "Context:\nRevenue rose.\n\nQuestion: Did revenue rise?\n\nAnswer:");
    }

    #[test]
    fn test_render_does_not_reexpand_values() {
        let tpl = PromptTemplate::new("{context}|{question}");
        let out = tpl.render(&[("context", "literal {question}"), ("question", "q")]);
        assert_eq!(out, "literal {question}|q");
    }

    #[test]
    fn test_render_keeps_unknown_braces() {
        let tpl = PromptTemplate::new("json {\"a\": 1} {missing} {question");
        let out = tpl.render(&[("question", "q")]);
        assert_eq!(out, "json {\"a\": 1} {missing} {question");
    }

    #[test]
    fn test_require_reports_missing_placeholder() {
        let err = PromptTemplate::new("Question: {question}")
            .require(&["context", "question"])
            .unwrap_err();
        assert!(matches!(err, DomainError::Configuration(_)));
    }

    #[test]
    fn test_format_context_joins_with_blank_lines() {
        let results = vec![
            SearchResult {
                chunk: DocumentChunk::new(0, "one", 1),
                score: 0.9,
            },
            SearchResult {
                chunk: DocumentChunk::new(1, "two", 2),
                score: 0.8,
            },
        ];
        assert_eq!(format_context(&results), "one\n\ntwo");
    }
}
