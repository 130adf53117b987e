/// Failures of a control-plane exchange. Every operation reports exactly one
/// of these; nothing is retried or recovered internally.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The control document could not be encoded to JSON.
    #[error("cannot serialize control-plane payload: {0}")]
    Serialization(#[source] serde_json::Error),
    /// The mock server could not be reached or the exchange failed on the
    /// wire (includes an exceeded per-request max-wait).
    #[error("cannot reach mock server: {0}")]
    Transport(#[from] crate::common::http::Error),
    /// The mock server answered with a status code outside 200..=299.
    #[error("mock server rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    /// A retrieve response body was not a valid JSON array of recorded
    /// requests.
    #[error("cannot deserialize recorded requests: {0}")]
    Deserialization(#[source] serde_json::Error),
}
