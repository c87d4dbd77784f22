use super::EmailAddress;
use super::Goal;
use super::IntentPayload;
use super::ProspectName;

/// The goal-specific part of a submission. Only the fields belonging to the
/// chosen goal survive parsing; the others are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interest {
    Tokenize {
        asset_type: Option<String>,
        other_asset_type: Option<String>,
        asset_value: Option<String>,
    },
    Invest {
        investment: Option<String>,
    },
}

/// A parsed `IntentPayload`. Lives for a single request: it is rendered into
/// a notification and dropped.
#[derive(Debug, Clone)]
pub struct Submission {
    pub name: ProspectName,
    pub email: EmailAddress,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub interest: Interest,
}

impl Submission {
    pub fn goal(&self) -> Goal {
        match self.interest {
            Interest::Tokenize { .. } => Goal::Tokenize,
            Interest::Invest { .. } => Goal::Invest,
        }
    }
}

/// Empty strings are as good as absent; the form posts "" for untouched
/// inputs.
fn present(field: Option<String>) -> Option<String> { field.filter(|f| !f.is_empty()) }

impl TryFrom<IntentPayload> for Submission {
    type Error = String;
    fn try_from(value: IntentPayload) -> Result<Self, Self::Error> {
        let (Some(goal), Some(name), Some(email)) = (
            present(value.goal),
            present(value.full_name),
            present(value.email),
        ) else {
            return Err("Missing required fields".to_string());
        };

        // the exact message is what the form shows to the user
        let email = EmailAddress::parse(email).map_err(|_| "Invalid email format".to_string())?;
        let goal = Goal::parse(&goal)?;
        let name = ProspectName::parse(name)?;

        let interest = match goal {
            Goal::Tokenize => Interest::Tokenize {
                asset_type: present(value.asset_type),
                other_asset_type: present(value.other_asset_type),
                asset_value: present(value.asset_value),
            },
            Goal::Invest => Interest::Invest {
                investment: present(value.investment),
            },
        };

        Ok(Self {
            name,
            email,
            company: present(value.company),
            phone: present(value.phone),
            interest,
        })
    }
}
