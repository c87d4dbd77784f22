//! Backend of the "Intent to Tokenize / Invest" form: validates submissions
//! and emails them to a fixed list of recipients. Also ships the client side
//! of the form (`intent_form`), for anything that wants to drive it from Rust.

pub mod configuration;
pub mod domain;
pub mod email_client;
pub mod intent_form;
pub mod notification;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod utils;
