/// The full name a prospect typed into the form. Any non-empty string is
/// accepted as-is: whitespace, punctuation and length are the reader's
/// problem, not ours. The value is escaped when rendered into the
/// notification.
#[derive(Debug, Clone)]
pub struct ProspectName(String);

impl ProspectName {
    pub fn parse(name: String) -> Result<Self, String> {
        match name.is_empty() {
            true => Err("Missing required fields".to_string()),
            false => Ok(Self(name)),
        }
    }
}

impl AsRef<str> for ProspectName {
    fn as_ref(&self) -> &str { &self.0 }
}
