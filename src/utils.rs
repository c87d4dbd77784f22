use serde::Deserialize;
use serde::Serialize;

/// Body of every successful JSON response
#[derive(Serialize, Deserialize, Debug)]
pub struct ResponseMessage {
    pub message: String,
}

/// Body of every failed JSON response. The form shows `error` verbatim.
#[derive(Serialize, Deserialize, Debug)]
pub struct ResponseErrorMessage {
    pub error: String,
}

/// Walk the `source` chain of an error, so that `Debug` output (which is what
/// ends up in the logs) shows every underlying cause, not just the outermost
/// message.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
