//! Per-user conversation state.
//!
//! A user with no `Session` has not started (or has finished) the flow.

/// Where the user is in the lead-capture flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Menu shown, waiting for a button press.
    AwaitingOption,
    /// Option picked, waiting for a Telegram contact.
    AwaitingContact { selected_option: String },
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AwaitingOption => "awaiting_option",
            Self::AwaitingContact { .. } => "awaiting_contact",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Payload after `/start`, empty when none was given.
    pub start_param: String,
    pub stage: Stage,
}

impl Session {
    /// Fresh session right after `/start`.
    pub fn started(start_param: impl Into<String>) -> Self {
        Self {
            start_param: start_param.into(),
            stage: Stage::AwaitingOption,
        }
    }

    /// Record the chosen option and move on to contact collection.
    pub fn select(mut self, label: impl Into<String>) -> Self {
        self.stage = Stage::AwaitingContact {
            selected_option: label.into(),
        };
        self
    }

    pub fn selected_option(&self) -> Option<&str> {
        match &self.stage {
            Stage::AwaitingContact { selected_option } => Some(selected_option),
            Stage::AwaitingOption => None,
        }
    }
}
