//! Interactive wizard session: transient selection, confirm, back and prefill.

use std::collections::HashMap;

use serde::Serialize;

use super::answers::AnswerSet;
use super::graph::{self, Progress};
use super::questions::{Question, QuestionId, question};
use crate::error::WizardError;

/// One user's walk through the wizard.
///
/// A selection is only transient until `confirm`; the answer set never holds
/// an unconfirmed choice.
#[derive(Debug, Clone, Default)]
pub struct WizardSession {
    answers: AnswerSet,
    pending: Option<String>,
    suggestions: HashMap<QuestionId, String>,
}

/// Serializable snapshot of a session for tool responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub question: Option<&'static Question>,
    pub pending: Option<String>,
    pub suggestion: Option<String>,
    pub answers: AnswerSet,
    pub progress: Progress,
    pub complete: bool,
    pub endpoint: Option<&'static str>,
}

impl WizardSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn current_question(&self) -> Option<QuestionId> {
        graph::next_question(&self.answers)
    }

    pub fn is_complete(&self) -> bool {
        self.current_question().is_none()
    }

    pub fn endpoint(&self) -> Option<&'static str> {
        graph::resolve_endpoint(&self.answers)
    }

    pub fn progress(&self) -> Progress {
        graph::progress(&self.answers)
    }

    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn suggestion(&self, id: QuestionId) -> Option<&str> {
        self.suggestions.get(&id).map(String::as_str)
    }

    /// Choose an option for the current question without committing it.
    pub fn select(&mut self, value: &str) -> Result<(), WizardError> {
        let id = self.current_question().ok_or(WizardError::Complete)?;
        if !question(id).has_option(value) {
            return Err(WizardError::InvalidOption {
                question: id.to_string(),
                value: value.to_string(),
            });
        }
        self.pending = Some(value.to_string());
        Ok(())
    }

    /// Commit the pending selection for the current question.
    pub fn confirm(&mut self) -> Result<QuestionId, WizardError> {
        let id = self.current_question().ok_or(WizardError::Complete)?;
        let value = self.pending.take().ok_or(WizardError::NothingSelected)?;
        tracing::debug!(question = %id, value = %value, "answer confirmed");
        self.answers.confirm(id, value);
        Ok(id)
    }

    /// Drop the latest answer and restore it as the pending selection.
    pub fn back(&mut self) -> Result<QuestionId, WizardError> {
        let (id, value) = self.answers.pop_last().ok_or(WizardError::NothingToUndo)?;
        tracing::debug!(question = %id, "stepped back");
        self.pending = Some(value);
        Ok(id)
    }

    /// Record suggested answers. Unknown ids and invalid values are skipped;
    /// nothing is confirmed. Returns the questions that received a suggestion.
    pub fn prefill<'a, I>(&mut self, suggested: I) -> Vec<QuestionId>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut applied = Vec::new();
        for (key, value) in suggested {
            let Ok(id) = key.parse::<QuestionId>() else {
                tracing::debug!("ignoring suggestion for unknown question {}", key);
                continue;
            };
            if !question(id).has_option(value) {
                tracing::debug!("ignoring invalid suggestion {}={}", key, value);
                continue;
            }
            self.suggestions.insert(id, value.to_string());
            applied.push(id);
        }
        applied
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn view(&self) -> SessionView {
        let current = self.current_question();
        SessionView {
            question: current.map(question),
            pending: self.pending.clone(),
            suggestion: current.and_then(|q| self.suggestion(q)).map(str::to_string),
            answers: self.answers.clone(),
            progress: self.progress(),
            complete: current.is_none(),
            endpoint: self.endpoint(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_is_transient_until_confirmed() {
        let mut s = WizardSession::new();
        s.select("single").unwrap();
        assert!(s.answers().is_empty());
        assert_eq!(s.confirm().unwrap(), QuestionId::DocType);
        assert_eq!(s.answers().get(QuestionId::DocType), Some("single"));
        assert_eq!(s.current_question(), Some(QuestionId::TemplateUsage));
        assert_eq!(s.confirm(), Err(WizardError::NothingSelected));
    }

    #[test]
    fn rejects_options_from_other_questions() {
        let mut s = WizardSession::new();
        let err = s.select("addressCapture").unwrap_err();
        assert!(matches!(err, WizardError::InvalidOption { .. }));
    }

    #[test]
    fn back_restores_the_previous_choice() {
        let mut s = WizardSession::new();
        s.select("pdfSplit").unwrap();
        s.confirm().unwrap();
        s.select("addressCapture").unwrap();
        s.confirm().unwrap();
        assert!(s.is_complete());
        assert_eq!(s.endpoint(), Some("/jobs/single-pdf-split-addressCapture"));

        assert_eq!(s.back().unwrap(), QuestionId::RecipientStyle);
        assert_eq!(s.pending(), Some("addressCapture"));
        assert_eq!(s.current_question(), Some(QuestionId::RecipientStyle));
        s.back().unwrap();
        assert_eq!(s.back(), Err(WizardError::NothingToUndo));
    }

    #[test]
    fn prefill_only_highlights_valid_suggestions() {
        let mut s = WizardSession::new();
        let applied = s.prefill([
            ("docType", "merge"),
            ("templateUsage", "maybe"),
            ("speed", "fast"),
        ]);
        assert_eq!(applied, vec![QuestionId::DocType]);
        assert!(s.answers().is_empty());
        let view = s.view();
        assert_eq!(view.suggestion.as_deref(), Some("merge"));
        assert_eq!(view.progress.total, 3);
        assert!(!view.complete);
    }
}
