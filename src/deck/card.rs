use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A single proposal as delivered by the backend.
///
/// `id` is the stable identity. The counters only change through an accepted
/// vote (optimistically, on the client) or through a fresh load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub yes_count: u32,
    #[serde(default)]
    pub no_count: u32,
}

impl Card {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            yes_count: 0,
            no_count: 0,
        }
    }

    pub fn with_counts(mut self, yes_count: u32, no_count: u32) -> Self {
        self.yes_count = yes_count;
        self.no_count = no_count;
        self
    }

    /// Applies one vote to the local counters
    pub fn record_vote(&mut self, direction: VoteDirection) {
        match direction {
            VoteDirection::Yes => self.yes_count = self.yes_count.saturating_add(1),
            VoteDirection::No => self.no_count = self.no_count.saturating_add(1),
        }
    }
}

/// Direction of a committed vote. Serialized as `"yes"` / `"no"` on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Yes,
    No,
}

impl VoteDirection {
    /// Right is yes, left is no. A zero (or non-finite) offset has no direction.
    pub fn from_offset(dx: f32) -> Option<Self> {
        if dx > 0.0 {
            Some(VoteDirection::Yes)
        } else if dx < 0.0 {
            Some(VoteDirection::No)
        } else {
            None
        }
    }

    pub fn sign(self) -> f32 {
        match self {
            VoteDirection::Yes => 1.0,
            VoteDirection::No => -1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VoteDirection::Yes => "yes",
            VoteDirection::No => "no",
        }
    }
}

impl Display for VoteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
