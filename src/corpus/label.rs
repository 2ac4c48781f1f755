use std::fmt;

use serde::{Deserialize, Serialize};

/// The two classes a sample can be assigned to.
///
/// The snake_case form doubles as the name of the training sub-directory
/// holding reference images for the class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Infected,
    NotInfected,
}

impl Label {
    pub const ALL: [Label; 2] = [Label::Infected, Label::NotInfected];

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Infected    => "infected",
            Label::NotInfected => "not_infected",
        }
    }

    /// Label with underscores replaced by spaces, for messages.
    pub fn human(self) -> &'static str {
        match self {
            Label::Infected    => "infected",
            Label::NotInfected => "not infected",
        }
    }

    pub fn dir_name(self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
