//! Edit and delete flow of a single egg or expense record.
//!
//! ```text
//! Viewing --begin_edit--> Editing --submit--> Saving --ok--> Viewing
//!                            ^                  |
//!                            +------failed------+
//! Viewing --request_delete--> PendingDelete --confirm--> Deleted
//!                                   |
//!                                   +--cancel--> Viewing
//! ```
//!
//! Deleting always takes two steps. No local change is applied before the
//! store confirms a save.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{EggEvent, EngineError, ExpenseCategory, ExpenseEvent, MoneyCents, ResultEngine};

/// Mutable fields of an egg event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EggDraft {
    pub weight: f64,
    pub quantity: u32,
    pub timestamp: i64,
}

/// Mutable fields of an expense.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseDraft {
    pub category: ExpenseCategory,
    pub amount: MoneyCents,
    pub date: NaiveDate,
}

impl From<&EggEvent> for EggDraft {
    fn from(event: &EggEvent) -> Self {
        Self {
            weight: event.weight,
            quantity: event.quantity,
            timestamp: event.timestamp,
        }
    }
}

impl From<&ExpenseEvent> for ExpenseDraft {
    fn from(expense: &ExpenseEvent) -> Self {
        Self {
            category: expense.category,
            amount: expense.amount,
            date: expense.date,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EditState<D> {
    Viewing,
    Editing { draft: D, error: Option<String> },
    Saving { draft: D },
    PendingDelete,
    Deleted,
}

impl<D> EditState<D> {
    fn name(&self) -> &'static str {
        match self {
            Self::Viewing => "viewing",
            Self::Editing { .. } => "editing",
            Self::Saving { .. } => "saving",
            Self::PendingDelete => "pending delete",
            Self::Deleted => "deleted",
        }
    }
}

#[derive(Clone, Debug)]
pub struct RecordEditor<D> {
    record_id: String,
    state: EditState<D>,
}

impl<D: Clone> RecordEditor<D> {
    pub fn new(record_id: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            state: EditState::Viewing,
        }
    }

    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    pub fn state(&self) -> &EditState<D> {
        &self.state
    }

    fn invalid(&self, event: &str) -> EngineError {
        EngineError::InvalidTransition(format!(
            "cannot {event} record {} while {}",
            self.record_id,
            self.state.name()
        ))
    }

    pub fn begin_edit(&mut self, draft: D) -> ResultEngine<()> {
        match self.state {
            EditState::Viewing => {
                self.state = EditState::Editing { draft, error: None };
                Ok(())
            }
            _ => Err(self.invalid("edit")),
        }
    }

    /// The draft being edited, if any.
    pub fn draft_mut(&mut self) -> Option<&mut D> {
        match &mut self.state {
            EditState::Editing { draft, .. } => Some(draft),
            _ => None,
        }
    }

    pub fn cancel_edit(&mut self) -> ResultEngine<()> {
        match self.state {
            EditState::Editing { .. } => {
                self.state = EditState::Viewing;
                Ok(())
            }
            _ => Err(self.invalid("cancel editing")),
        }
    }

    /// Move to `Saving` and hand out the draft to persist.
    pub fn submit(&mut self) -> ResultEngine<D> {
        match &self.state {
            EditState::Editing { draft, .. } => {
                let draft = draft.clone();
                self.state = EditState::Saving {
                    draft: draft.clone(),
                };
                Ok(draft)
            }
            _ => Err(self.invalid("submit")),
        }
    }

    pub fn save_succeeded(&mut self) -> ResultEngine<()> {
        match self.state {
            EditState::Saving { .. } => {
                self.state = EditState::Viewing;
                Ok(())
            }
            _ => Err(self.invalid("complete saving")),
        }
    }

    /// Back to `Editing` with the draft intact and the error surfaced.
    pub fn save_failed(&mut self, error: &EngineError) -> ResultEngine<()> {
        match &self.state {
            EditState::Saving { draft } => {
                self.state = EditState::Editing {
                    draft: draft.clone(),
                    error: Some(error.to_string()),
                };
                Ok(())
            }
            _ => Err(self.invalid("fail saving")),
        }
    }

    pub fn request_delete(&mut self) -> ResultEngine<()> {
        match self.state {
            EditState::Viewing => {
                self.state = EditState::PendingDelete;
                Ok(())
            }
            _ => Err(self.invalid("request deletion of")),
        }
    }

    pub fn cancel_delete(&mut self) -> ResultEngine<()> {
        match self.state {
            EditState::PendingDelete => {
                self.state = EditState::Viewing;
                Ok(())
            }
            _ => Err(self.invalid("cancel deletion of")),
        }
    }

    pub fn confirm_delete(&mut self) -> ResultEngine<()> {
        match self.state {
            EditState::PendingDelete => {
                self.state = EditState::Deleted;
                Ok(())
            }
            _ => Err(self.invalid("delete")),
        }
    }

    pub fn is_pending_delete(&self) -> bool {
        matches!(self.state, EditState::PendingDelete)
    }

    /// Fails unless a delete was requested and not yet confirmed.
    pub fn ensure_pending_delete(&self) -> ResultEngine<()> {
        if self.is_pending_delete() {
            Ok(())
        } else {
            Err(self.invalid("delete"))
        }
    }
}
