use serde::{Deserialize, Serialize};

/// Request body posted to the translation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
}

impl TranslationRequest {
    pub fn new(text: &str, source_lang: &str, target_lang: &str) -> Self {
        Self {
            text: text.to_string(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
        }
    }
}

/// Decoded success response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
}

/// Last successful call, keyed by the exact request triple.
#[derive(Debug, Clone)]
pub(crate) struct CachedTranslation {
    pub request: TranslationRequest,
    pub response: Translation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_wire_format() {
        let body = serde_json::to_value(TranslationRequest::new("hello", "ru", "en")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"text": "hello", "source_lang": "ru", "target_lang": "en"})
        );
    }

    #[test]
    fn response_requires_all_fields() {
        let missing = serde_json::from_str::<Translation>(r#"{"text": "hola", "source_lang": "en"}"#);
        assert!(missing.is_err());

        let ok: Translation =
            serde_json::from_str(r#"{"text": "hola", "source_lang": "en", "target_lang": "es"}"#).unwrap();
        assert_eq!(ok.text, "hola");
    }
}
