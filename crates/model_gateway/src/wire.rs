//! Request/response shaping per backend family.
//!
//! Each [`RequestShape`] maps to one [`WireFormat`]; providers pick theirs
//! from configuration instead of carrying their own copy of the mapping.

use serde_json::{json, Value};

use webs_core::{
    config::RequestShape,
    types::{Role, Turn},
};

/// Translation between the shared conversation and one backend's JSON.
pub trait WireFormat: Send + Sync {
    /// Build the request body for `conversation`.
    fn request_body(&self, model: &str, conversation: &[Turn]) -> Value;

    /// Pull the reply text out of a response body. Blank replies are `None`.
    fn extract_reply(&self, body: &Value) -> Option<String>;
}

/// OpenAI-compatible chat completions (OpenRouter, Groq, Together, ...).
pub struct OpenAiChatFormat;

impl WireFormat for OpenAiChatFormat {
    fn request_body(&self, model: &str, conversation: &[Turn]) -> Value {
        let messages: Vec<Value> = conversation
            .iter()
            .map(|turn| {
                json!({
                    "role": turn.role.as_str(),
                    "content": turn.content,
                })
            })
            .collect();

        json!({
            "model": model,
            "messages": messages,
        })
    }

    fn extract_reply(&self, body: &Value) -> Option<String> {
        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// Gemini `generateContent`.
pub struct GeminiGenerateFormat;

impl GeminiGenerateFormat {
    fn role(role: Role) -> &'static str {
        match role {
            Role::User => "user",
            Role::Assistant => "model",
        }
    }
}

impl WireFormat for GeminiGenerateFormat {
    fn request_body(&self, _model: &str, conversation: &[Turn]) -> Value {
        let contents: Vec<Value> = conversation
            .iter()
            .map(|turn| {
                json!({
                    "role": Self::role(turn.role),
                    "parts": [{ "text": turn.content }],
                })
            })
            .collect();

        json!({ "contents": contents })
    }

    fn extract_reply(&self, body: &Value) -> Option<String> {
        let parts = body["candidates"][0]["content"]["parts"].as_array()?;
        let text: String = parts
            .iter()
            .filter_map(|p| p["text"].as_str())
            .collect::<Vec<_>>()
            .join("");

        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}

/// Wire format for a configured request shape.
pub fn wire_format(shape: RequestShape) -> &'static dyn WireFormat {
    match shape {
        RequestShape::OpenAiChat => &OpenAiChatFormat,
        RequestShape::GeminiGenerate => &GeminiGenerateFormat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation() -> Vec<Turn> {
        vec![
            Turn::user("What is Rust?"),
            Turn::assistant("A systems language."),
            Turn::user("Who uses it?"),
        ]
    }

    #[test]
    fn test_openai_request_body() {
        let body = OpenAiChatFormat.request_body("llama3-70b-8192", &conversation());

        assert_eq!(body["model"], "llama3-70b-8192");
        assert_eq!(body["messages"].as_array().unwrap().len(), 3);
        assert_eq!(body["messages"][1]["role"], "assistant");
        assert_eq!(body["messages"][2]["content"], "Who uses it?");
    }

    #[test]
    fn test_openai_extract_reply_trims() {
        let body = json!({"choices": [{"message": {"content": "  Hello!\n"}}]});
        assert_eq!(OpenAiChatFormat.extract_reply(&body), Some("Hello!".into()));
    }

    #[test]
    fn test_openai_extract_reply_missing_or_blank() {
        assert_eq!(OpenAiChatFormat.extract_reply(&json!({"choices": []})), None);
        assert_eq!(
            OpenAiChatFormat.extract_reply(&json!({"error": {"message": "rate limited"}})),
            None
        );
        let blank = json!({"choices": [{"message": {"content": "   "}}]});
        assert_eq!(OpenAiChatFormat.extract_reply(&blank), None);
    }

    #[test]
    fn test_gemini_request_renames_roles() {
        let body = GeminiGenerateFormat.request_body("gemini-2.0-flash", &conversation());

        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][0]["text"], "A systems language.");
        assert!(body.get("model").is_none());
    }

    #[test]
    fn test_gemini_extract_reply() {
        let body = json!({
            "candidates": [{"content": {"parts": [{"text": "Many "}, {"text": "companies."}]}}]
        });
        assert_eq!(
            GeminiGenerateFormat.extract_reply(&body),
            Some("Many companies.".into())
        );
        assert_eq!(GeminiGenerateFormat.extract_reply(&json!({"candidates": []})), None);
    }

    #[test]
    fn test_wire_format_dispatch() {
        let body = json!({"choices": [{"message": {"content": "ok"}}]});
        assert_eq!(
            wire_format(RequestShape::OpenAiChat).extract_reply(&body),
            Some("ok".into())
        );
        assert_eq!(wire_format(RequestShape::GeminiGenerate).extract_reply(&body), None);
    }
}
