pub use client::MockServerClient;
pub use error::Error;

mod client;
mod error;
