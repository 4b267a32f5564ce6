use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Repository-assigned identifier. Positive and never reused within one store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct TodoId(pub i64);

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: TodoId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CreateTodo {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UpdateTodo {
    pub text: String,
}

/// Text is acceptable when something other than whitespace remains.
/// Only the check trims; stored text is kept as submitted.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_detection() {
        assert!(is_blank(""));
        assert!(is_blank("   "));
        assert!(is_blank("\t\n "));
        assert!(!is_blank(" milk "));
    }

    #[test]
    fn todo_serializes_with_flat_integer_id() {
        let now = Utc::now();
        let todo = Todo { id: TodoId(7), text: "milk".into(), created_at: now, updated_at: now };
        let value = serde_json::to_value(&todo).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["text"], "milk");
        assert!(value["created_at"].is_string());
        assert!(value["updated_at"].is_string());
    }
}
