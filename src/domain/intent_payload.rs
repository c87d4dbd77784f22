use serde::Deserialize;
use serde::Serialize;

/// The JSON body of `POST /api/submit-intent`, exactly as the form sends it.
///
/// Every field is optional at this level so that a missing field becomes a
/// validation error (400) rather than a deserialization error; see
/// `Submission::try_from` for the actual rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_asset_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub investment: Option<String>,
}
