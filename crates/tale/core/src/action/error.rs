//! Errors raised by actions while they run.
//!
//! The scheduler never handles these: a failing `run` stops the current
//! pass and the error travels up to the host frame driver, wrapped once per
//! task it passes through so the outermost layer names the top-level task.

use std::borrow::Cow;

use super::ActionId;

pub type ActionResult = Result<bool, ActionError>;

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("{message}")]
    Failed { message: Cow<'static, str> },

    #[error("action {id} ({description}) failed")]
    InAction {
        id: ActionId,
        description: String,
        #[source]
        source: Box<ActionError>,
    },
}

impl ActionError {
    /// A plain failure with a message.
    pub fn msg(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Fails with `message` unless `condition` holds.
    ///
    /// Meant for `run` bodies: `ActionError::check(target.is_some(), "no target")?;`
    pub fn check(condition: bool, message: &'static str) -> Result<(), Self> {
        if condition {
            Ok(())
        } else {
            Err(Self::msg(message))
        }
    }

    /// Id of the outermost task the error passed through, if any.
    pub fn action_id(&self) -> Option<ActionId> {
        match self {
            Self::Failed { .. } => None,
            Self::InAction { id, .. } => Some(*id),
        }
    }

    /// Ids from the outermost task down to the one that failed.
    pub fn trail(&self) -> Vec<ActionId> {
        let mut trail = Vec::new();
        let mut current = self;
        while let Self::InAction { id, source, .. } = current {
            trail.push(*id);
            current = source;
        }
        trail
    }

    /// The innermost error, as raised by the failing `run`.
    pub fn root_cause(&self) -> &ActionError {
        let mut current = self;
        while let Self::InAction { source, .. } = current {
            current = source;
        }
        current
    }
}
