use serde::{Deserialize, Serialize};

/// Result of classifying a message against the identity phrase set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentMatch {
    /// Whether the message asks about the assistant's identity or origin.
    pub is_match: bool,
    /// Fixed reply, present only on a match.
    pub reply: Option<String>,
}

impl IntentMatch {
    /// A match carrying the canned reply.
    pub fn matched(reply: impl Into<String>) -> Self {
        Self {
            is_match: true,
            reply: Some(reply.into()),
        }
    }

    /// No match.
    pub fn none() -> Self {
        Self {
            is_match: false,
            reply: None,
        }
    }
}
