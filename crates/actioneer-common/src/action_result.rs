// Outcome recorded for every invoked action.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionResult {
    Success,
    Failure,
}

impl fmt::Display for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionResult::Success => write!(f, "Success"),
            ActionResult::Failure => write!(f, "Failure"),
        }
    }
}

impl ActionResult {
    pub fn from_ok(ok: bool) -> Self {
        if ok {
            ActionResult::Success
        } else {
            ActionResult::Failure
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ActionResult::Success)
    }
}
