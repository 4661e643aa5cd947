use serde::{Deserialize, Serialize};

// =============================================================================
// Session & Conversation Types
// =============================================================================

/// Default number of turns kept per session.
pub const DEFAULT_MAX_HISTORY_TURNS: usize = 20;

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The caller.
    User,
    /// The gateway (identity, cached, or backend reply).
    Assistant,
}

impl Role {
    /// Wire name used by OpenAI-compatible backends.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Entry in conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Who said it.
    pub role: Role,
    /// Message content.
    pub content: String,
    /// Timestamp (unix millis).
    pub timestamp: i64,
}

impl Turn {
    /// Create a user turn stamped now.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant turn stamped now.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: now_millis(),
        }
    }
}

/// Per-session conversation state and usage counter.
///
/// Sessions are created lazily by the session store and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Caller-supplied session key.
    pub id: String,

    /// Conversation history, oldest first.
    pub history: Vec<Turn>,

    /// Number of countable replies served to this session.
    pub used_count: u32,

    /// Maximum number of turns retained in `history`.
    pub max_history_turns: usize,

    /// Creation timestamp (unix millis).
    pub created_at: i64,

    /// Last updated timestamp (unix millis).
    pub updated_at: i64,
}

impl Session {
    /// Create an empty session with the default history cap.
    pub fn new(id: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: id.into(),
            history: Vec::new(),
            used_count: 0,
            max_history_turns: DEFAULT_MAX_HISTORY_TURNS,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the history cap.
    pub fn with_history_cap(mut self, max_turns: usize) -> Self {
        self.max_history_turns = max_turns;
        self
    }

    /// Append a turn, dropping the oldest turns beyond the cap.
    ///
    /// History never starts with an assistant turn after trimming.
    pub fn append_turn(&mut self, role: Role, content: impl Into<String>) {
        self.history.push(Turn::new(role, content));

        if self.history.len() > self.max_history_turns {
            let excess = self.history.len() - self.max_history_turns;
            self.history.drain(..excess);
        }
        while self
            .history
            .first()
            .is_some_and(|t| t.role == Role::Assistant)
        {
            self.history.remove(0);
        }

        self.touch();
    }

    /// Append a user turn and the assistant reply to it.
    pub fn append_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.append_turn(Role::User, user);
        self.append_turn(Role::Assistant, assistant);
    }

    /// History plus a pending user turn, as sent to a backend.
    pub fn conversation_with(&self, user_message: &str) -> Vec<Turn> {
        let mut turns = self.history.clone();
        turns.push(Turn::user(user_message));
        turns
    }

    /// Count one served reply and return the new count.
    pub fn increment_usage(&mut self) -> u32 {
        self.used_count = self.used_count.saturating_add(1);
        self.touch();
        self.used_count
    }

    /// Whether the session has used up its quota.
    pub fn is_over_limit(&self, limit: u32) -> bool {
        self.used_count >= limit
    }

    /// Milliseconds since the session was last updated.
    pub fn idle_millis(&self, now: i64) -> i64 {
        now.saturating_sub(self.updated_at)
    }

    /// Mark the session as active.
    pub fn touch(&mut self) {
        self.updated_at = now_millis();
    }
}

/// Current unix time in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
