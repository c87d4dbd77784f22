use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;

/// What the prospect wants to do. Decides which of the goal-specific fields
/// are collected and which subject line the notification gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Tokenize,
    Invest,
}

impl Goal {
    pub fn parse(goal: &str) -> Result<Self, String> {
        match goal {
            "tokenize" => Ok(Self::Tokenize),
            "invest" => Ok(Self::Invest),
            // fixed text: it is shown to the user as-is
            _ => Err("Invalid goal".to_string()),
        }
    }

    /// Human-readable label, used in both the subject and the body
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tokenize => "Tokenize my own assets",
            Self::Invest => "Invest in tokenized assets",
        }
    }
}

impl Display for Goal {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Tokenize => "tokenize",
                Self::Invest => "invest",
            }
        )
    }
}
