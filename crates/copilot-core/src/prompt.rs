//! Prompt input state: length cap, refine toggle, and what a submit resolves to.

use crate::controller::SubmitMode;

/// Backend rejects longer prompts and instructions.
pub const MAX_PROMPT_CHARS: usize = 1000;

#[derive(Debug, Clone, Default)]
pub struct PromptDraft {
    pub text: String,
    /// "Refine existing model" toggle. Only honoured when a script exists.
    pub refine: bool,
}

impl PromptDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Truncate to [`MAX_PROMPT_CHARS`] characters. Call after every edit.
    pub fn enforce_limit(&mut self) {
        if let Some((idx, _)) = self.text.char_indices().nth(MAX_PROMPT_CHARS) {
            self.text.truncate(idx);
        }
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn at_limit(&self) -> bool {
        self.char_count() >= MAX_PROMPT_CHARS
    }

    /// The instruction and mode to submit, or `None` if the prompt is blank or a
    /// request is already running.
    pub fn submission(&self, has_script: bool, generating: bool) -> Option<(String, SubmitMode)> {
        let trimmed = self.text.trim();
        if trimmed.is_empty() || generating {
            return None;
        }
        let mode = if self.refine && has_script {
            SubmitMode::Refine
        } else {
            SubmitMode::Fresh
        };
        Some((trimmed.to_string(), mode))
    }

    pub fn placeholder(&self, has_script: bool) -> &'static str {
        if self.refine && has_script {
            "E.g., Make the hole 2mm wider..."
        } else {
            "E.g., Create a parametric gear with 12 teeth and a 5mm central hole..."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_or_busy_does_not_submit() {
        let mut draft = PromptDraft::new();
        draft.text = "   \n".into();
        assert!(draft.submission(false, false).is_none());
        draft.text = "a cube".into();
        assert!(draft.submission(false, true).is_none());
    }

    #[test]
    fn refine_needs_toggle_and_script() {
        let mut draft = PromptDraft::new();
        draft.text = "  wider hole ".into();
        draft.refine = true;
        assert_eq!(
            draft.submission(false, false),
            Some(("wider hole".to_string(), SubmitMode::Fresh))
        );
        assert_eq!(
            draft.submission(true, false),
            Some(("wider hole".to_string(), SubmitMode::Refine))
        );
    }

    #[test]
    fn limit_counts_characters_not_bytes() {
        let mut draft = PromptDraft::new();
        draft.text = "é".repeat(MAX_PROMPT_CHARS + 5);
        draft.enforce_limit();
        assert_eq!(draft.char_count(), MAX_PROMPT_CHARS);
        assert!(draft.at_limit());
    }
}
