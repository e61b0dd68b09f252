mod client;
mod key;

pub use client::{InvocationError, LlmClient, LlmError};
pub use key::read_api_key;
