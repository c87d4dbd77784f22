mod email_address;
mod goal;
mod intent_payload;
mod prospect_name;
mod submission;
// allow external `use` statements to skip `email_address` etc
pub use email_address::EmailAddress;
pub use goal::Goal;
pub use intent_payload::IntentPayload;
pub use prospect_name::ProspectName;
pub use submission::Interest;
pub use submission::Submission;
