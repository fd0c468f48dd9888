use serde::{Deserialize, Serialize};

/// Fixed negotiation role of one side of a pair.
///
/// The later arrival in a room offers, the incumbent answers.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Offerer,
    Answerer,
}

impl Role {
    /// Role of a participant that was told the peer joined after it.
    pub const INCUMBENT: Role = Role::Answerer;

    /// Role of a participant that found the peer already present.
    pub const JOINER: Role = Role::Offerer;

    pub fn is_offerer(self) -> bool {
        matches!(self, Role::Offerer)
    }
}
