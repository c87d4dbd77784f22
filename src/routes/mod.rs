mod health_check;
mod submit_intent;

pub use health_check::*;
pub use submit_intent::*;
