use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CommandError;

/// Actions a caller can ask the backend worker to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    CreateUser,
    ReadUser,
    UpdateUser,
    DeleteUser,
    StartTrip,
    StopTrip,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::CreateUser,
        Action::ReadUser,
        Action::UpdateUser,
        Action::DeleteUser,
        Action::StartTrip,
        Action::StopTrip,
    ];

    /// Wire name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::CreateUser => "create_user",
            Action::ReadUser => "read_user",
            Action::UpdateUser => "update_user",
            Action::DeleteUser => "delete_user",
            Action::StartTrip => "start_trip",
            Action::StopTrip => "stop_trip",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| CommandError::UnknownAction(s.to_string()))
    }
}
