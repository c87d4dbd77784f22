mod client;
mod controller;

pub use client::*;
pub use controller::*;
