/// Built-in answer prompt. Placeholders are filled by [`PromptTemplate::render`].
pub const DEFAULT_TEMPLATE: &str = r#"
Eres un asistente experto en {domain}. Usa el siguiente contexto (extraído de {corpus}) para responder la pregunta del usuario.

Contexto:
{context}

Pregunta: {question}

Responde de forma clara, objetiva y en {language}, citando los artículos relevantes cuando corresponda.
No presentes tu respuesta como asesoría jurídica profesional.
"#;

pub const DEFAULT_DOMAIN: &str = "derecho constitucional peruano";
pub const DEFAULT_CORPUS: &str = "la Constitución Política del Perú";
pub const DEFAULT_LANGUAGE: &str = "español";

/// Placeholders every template must contain.
pub const REQUIRED_PLACEHOLDERS: &[&str] = &["{context}", "{question}"];

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub template: String,
    pub domain: String,
    pub corpus: String,
    pub language: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            domain: DEFAULT_DOMAIN.to_string(),
            corpus: DEFAULT_CORPUS.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl PromptTemplate {
    /// Names of required placeholders absent from the template.
    pub fn missing_placeholders(&self) -> Vec<&'static str> {
        REQUIRED_PLACEHOLDERS
            .iter()
            .copied()
            .filter(|p| !self.template.contains(*p))
            .collect()
    }

    /// Substitute placeholders in a single left-to-right pass. Substituted
    /// values are never rescanned, so braces in the context or question are
    /// kept literally.
    pub fn render(&self, context: &str, question: &str) -> String {
        let mut out = String::with_capacity(self.template.len() + context.len() + question.len());
        let mut rest = self.template.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open..];
            let Some(close) = after.find('}') else {
                rest = after;
                break;
            };
            let value = match &after[1..close] {
                "domain" => Some(self.domain.as_str()),
                "corpus" => Some(self.corpus.as_str()),
                "language" => Some(self.language.as_str()),
                "context" => Some(context),
                "question" => Some(question),
                _ => None,
            };
            match value {
                Some(v) => {
                    out.push_str(v);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = &after[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_renders_all_fields() {
        let prompt = PromptTemplate::default().render("Artículo 1.- ...", "¿Qué dice?");
        assert!(prompt.contains("experto en derecho constitucional peruano"));
        assert!(prompt.contains("extraído de la Constitución Política del Perú"));
        assert!(prompt.contains("Contexto:\nArtículo 1.- ..."));
        assert!(prompt.contains("Pregunta: ¿Qué dice?"));
        assert!(prompt.contains("en español"));
        assert!(prompt.contains("asesoría jurídica profesional"));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn test_braces_in_values_are_not_expanded() {
        let t = PromptTemplate {
            template: "C={context} Q={question}".to_string(),
            ..Default::default()
        };
        assert_eq!(t.render("{question}", "{domain}"), "C={question} Q={domain}");
    }

    #[test]
    fn test_unknown_and_unclosed_placeholders_are_kept() {
        let t = PromptTemplate {
            template: "{foo} {context} {question} {tail".to_string(),
            ..Default::default()
        };
        assert_eq!(t.render("c", "q"), "{foo} c q {tail");
    }

    #[test]
    fn test_missing_placeholders() {
        let t = PromptTemplate {
            template: "solo {context}".to_string(),
            ..Default::default()
        };
        assert_eq!(t.missing_placeholders(), vec!["{question}"]);
        assert!(PromptTemplate::default().missing_placeholders().is_empty());
    }
}
