use super::IntentClient;
use super::SubmissionFailure;
use crate::domain::EmailAddress;
use crate::domain::Goal;
use crate::domain::IntentPayload;

pub const ASSET_TYPES: [&str; 7] = [
    "Real Estate",
    "Art & Collectibles",
    "Intellectual Property",
    "Commodities",
    "Private Equity",
    "Bonds & Securities",
    OTHER_ASSET_TYPE,
];

/// Picking this asset type unlocks the free-text `OtherAssetType` field
pub const OTHER_ASSET_TYPE: &str = "Other";

pub const ASSET_VALUES: [&str; 6] = [
    "$10K - $25K",
    "$25K - $50K",
    "$50K - $100K",
    "$100K - $500K",
    "$500K - $1M",
    "$1M+",
];

pub const INVESTMENT_RANGES: [&str; 4] = ["$1K - $5K", "$5K - $10K", "$10K - $25K", "$25K - $50K"];

/// Replaces the form once a submission went through
pub const CONFIRMATION: &str =
    "Thank You! Your submission has been received. We'll reach out to you shortly.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    FullName,
    Email,
    Company,
    Phone,
    AssetType,
    OtherAssetType,
    AssetValue,
    Investment,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Self::FullName => "Full Name",
            Self::Email => "Email Address",
            Self::Company => "Company/Organization",
            Self::Phone => "Phone Number",
            Self::AssetType => "Asset Type",
            Self::OtherAssetType => "Other Asset Type",
            Self::AssetValue => "Estimated Asset Value (USD)",
            Self::Investment => "Investment Range (USD)",
        }
    }

    /// Goal-specific fields are only shown for their goal
    pub fn applies_to(
        &self,
        goal: Goal,
    ) -> bool {
        match self {
            Self::AssetType | Self::OtherAssetType | Self::AssetValue => goal == Goal::Tokenize,
            Self::Investment => goal == Goal::Invest,
            _ => true,
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum FormError {
    #[error("Choose whether you want to tokenize or invest first")]
    NoGoal,
    #[error("{} is required", .0.label())]
    Required(Field),
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("{value:?} is not an option for {}", .field.label())]
    InvalidChoice { field: Field, value: String },
    #[error("{} does not apply to this goal", .0.label())]
    NotApplicable(Field),
    #[error("A submission is already in progress")]
    Busy,
    #[error("This form has already been submitted")]
    AlreadySubmitted,
}

/// Where the form is at.
///
/// ```text
/// SelectingGoal -> Filling -> Submitting -> Success
///                     ^           |
///                     |           v
///                     +------- Failed
/// ```
///
/// `Failed` behaves like `Filling` (fields stay editable, resubmission is
/// allowed) but carries the message to show. `Success` is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    SelectingGoal,
    Filling { goal: Goal },
    Submitting { goal: Goal },
    Failed { goal: Goal, message: String },
    Success,
}

#[derive(Debug, Clone, Default)]
struct Fields {
    full_name: String,
    email: String,
    company: String,
    phone: String,
    asset_type: String,
    other_asset_type: String,
    asset_value: String,
    investment: String,
}

impl Fields {
    fn slot(
        &mut self,
        field: Field,
    ) -> &mut String {
        match field {
            Field::FullName => &mut self.full_name,
            Field::Email => &mut self.email,
            Field::Company => &mut self.company,
            Field::Phone => &mut self.phone,
            Field::AssetType => &mut self.asset_type,
            Field::OtherAssetType => &mut self.other_asset_type,
            Field::AssetValue => &mut self.asset_value,
            Field::Investment => &mut self.investment,
        }
    }

    fn get(
        &self,
        field: Field,
    ) -> &str {
        match field {
            Field::FullName => &self.full_name,
            Field::Email => &self.email,
            Field::Company => &self.company,
            Field::Phone => &self.phone,
            Field::AssetType => &self.asset_type,
            Field::OtherAssetType => &self.other_asset_type,
            Field::AssetValue => &self.asset_value,
            Field::Investment => &self.investment,
        }
    }
}

fn optional(value: &str) -> Option<String> {
    match value.trim().is_empty() {
        true => None,
        false => Some(value.to_string()),
    }
}

/// Client-side controller of the intent form. Holds what the user typed and
/// enforces the same required fields the browser form does, before anything
/// is sent.
///
/// Errors from the server are surfaced to the user as-is (with a generic
/// fallback); a failed submission is never reported as a success.
#[derive(Debug, Clone)]
pub struct IntentForm {
    state: FormState,
    fields: Fields,
}

impl Default for IntentForm {
    fn default() -> Self { Self::new() }
}

impl IntentForm {
    pub fn new() -> Self {
        Self {
            state: FormState::SelectingGoal,
            fields: Fields::default(),
        }
    }

    pub fn state(&self) -> &FormState { &self.state }

    /// Submit control is disabled and a spinner shown while this is true
    pub fn is_busy(&self) -> bool { matches!(self.state, FormState::Submitting { .. }) }

    pub fn goal(&self) -> Option<Goal> {
        match &self.state {
            FormState::Filling { goal }
            | FormState::Submitting { goal }
            | FormState::Failed { goal, .. } => Some(*goal),
            FormState::SelectingGoal | FormState::Success => None,
        }
    }

    pub fn value(
        &self,
        field: Field,
    ) -> &str {
        self.fields.get(field)
    }

    /// The goal whose fields may currently be edited
    fn editable_goal(&self) -> Result<Goal, FormError> {
        match &self.state {
            FormState::SelectingGoal => Err(FormError::NoGoal),
            FormState::Filling { goal } | FormState::Failed { goal, .. } => Ok(*goal),
            FormState::Submitting { .. } => Err(FormError::Busy),
            FormState::Success => Err(FormError::AlreadySubmitted),
        }
    }

    /// Switching goals throws away everything entered so far, including
    /// fields both goals share.
    pub fn select_goal(
        &mut self,
        goal: Goal,
    ) -> Result<(), FormError> {
        match self.editable_goal() {
            Ok(_) | Err(FormError::NoGoal) => {
                self.fields = Fields::default();
                self.state = FormState::Filling { goal };
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub fn set(
        &mut self,
        field: Field,
        value: impl Into<String>,
    ) -> Result<(), FormError> {
        let goal = self.editable_goal()?;
        if !field.applies_to(goal) {
            return Err(FormError::NotApplicable(field));
        }
        *self.fields.slot(field) = value.into();
        Ok(())
    }

    fn require(
        &self,
        field: Field,
    ) -> Result<&str, FormError> {
        let value = self.fields.get(field);
        match value.trim().is_empty() {
            true => Err(FormError::Required(field)),
            false => Ok(value),
        }
    }

    fn require_choice(
        &self,
        field: Field,
        options: &[&str],
    ) -> Result<(), FormError> {
        let value = self.require(field)?;
        match options.contains(&value) {
            true => Ok(()),
            false => Err(FormError::InvalidChoice {
                field,
                value: value.to_string(),
            }),
        }
    }

    fn validate(
        &self,
        goal: Goal,
    ) -> Result<(), FormError> {
        self.require(Field::FullName)?;
        let email = self.require(Field::Email)?;
        EmailAddress::parse(email.to_string()).map_err(|_| FormError::InvalidEmail)?;
        match goal {
            Goal::Tokenize => {
                self.require_choice(Field::AssetType, &ASSET_TYPES)?;
                self.require_choice(Field::AssetValue, &ASSET_VALUES)?;
            }
            Goal::Invest => self.require_choice(Field::Investment, &INVESTMENT_RANGES)?,
        }
        Ok(())
    }

    fn payload(
        &self,
        goal: Goal,
    ) -> IntentPayload {
        let f = &self.fields;
        let mut payload = IntentPayload {
            goal: Some(goal.to_string()),
            full_name: Some(f.full_name.clone()),
            email: Some(f.email.clone()),
            company: optional(&f.company),
            phone: optional(&f.phone),
            ..Default::default()
        };
        match goal {
            Goal::Tokenize => {
                payload.asset_type = Some(f.asset_type.clone());
                // only meaningful next to "Other"; a leftover value from
                // before the user changed their mind is dropped
                if f.asset_type == OTHER_ASSET_TYPE {
                    payload.other_asset_type = optional(&f.other_asset_type);
                }
                payload.asset_value = Some(f.asset_value.clone());
            }
            Goal::Invest => payload.investment = Some(f.investment.clone()),
        }
        payload
    }

    /// Validate and move to `Submitting`, returning the body to post. On a
    /// validation error the state is left untouched.
    pub fn begin_submit(&mut self) -> Result<IntentPayload, FormError> {
        let goal = self.editable_goal()?;
        self.validate(goal)?;
        self.state = FormState::Submitting { goal };
        Ok(self.payload(goal))
    }

    /// Record the server's answer. Entered data survives a failure. Calls
    /// outside of `Submitting` are ignored.
    pub fn finish_submit(
        &mut self,
        outcome: Result<String, SubmissionFailure>,
    ) {
        let FormState::Submitting { goal } = self.state else {
            return;
        };
        self.state = match outcome {
            Ok(_) => FormState::Success,
            Err(e) => {
                tracing::warn!(error.cause_chain=?e, "Form submission failed");
                FormState::Failed {
                    goal,
                    message: e.user_message(),
                }
            }
        };
    }

    /// One full round trip: validate, post, record the outcome
    pub async fn submit(
        &mut self,
        client: &IntentClient,
    ) -> Result<(), FormError> {
        let payload = self.begin_submit()?;
        let outcome = client.submit_intent(&payload).await;
        self.finish_submit(outcome);
        Ok(())
    }
}
