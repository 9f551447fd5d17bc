//! The prompt text field of a workflow.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Holds the text the user is typing.
///
/// Exposes only the edits a workflow needs: replace, read, and clear.
#[derive(Debug, Default)]
pub struct PromptInput {
    text: Mutex<String>,
}

impl PromptInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, text: impl Into<String>) {
        *self.lock() = text.into();
    }

    pub fn text(&self) -> String {
        self.lock().clone()
    }

    /// Whether the text is empty once surrounding whitespace is removed.
    pub fn is_blank(&self) -> bool {
        self.lock().trim().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, String> {
        self.text.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_read_clear() {
        let input = PromptInput::new();
        assert!(input.is_blank());

        input.set("  a red fox ");
        assert_eq!(input.text(), "  a red fox ");
        assert!(!input.is_blank());

        input.set(" \n ");
        assert!(input.is_blank());

        input.set("x");
        input.clear();
        assert_eq!(input.text(), "");
    }
}
