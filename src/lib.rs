//! `mockserver-client` is a Rust client for the REST control plane of an
//! external HTTP mock/proxy service (wire-compatible with MockServer). It
//! contains two major components:
//!
//! * a set of **fluent builders** that describe expectations, verification
//!   queries and retrieval filters, and
//! * a **client** that `PUT`s those documents to the service's mock-control
//!   and proxy-control endpoints and classifies the answer.
//!
//! The library holds no state of its own: a document is built, sent once
//! and not reused. The external service owns the lifetime of everything
//! that was registered.
//!
//! # Getting Started
//! Add `mockserver-client` to your `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! mockserver-client = "0.1"
//! ```
//!
//! Register an expectation and reset the server between tests:
//!
//! ```no_run
//! use mockserver_client::prelude::*;
//!
//! let client = MockServerClient::new("http://127.0.0.1:1080", "http://127.0.0.1:1090");
//!
//! client
//!     .mock_any_response(
//!         &Expectation::new()
//!             .when(
//!                 RequestMatcher::new(Method::GET, "/search")
//!                     .query_param("query", "metallica"),
//!             )
//!             .respond(
//!                 ResponseTemplate::new(200)
//!                     .header("Content-Type", "text/html")
//!                     .body("ohi"),
//!             ),
//!     )
//!     .unwrap();
//!
//! // ... exercise the code under test against the mock endpoint ...
//!
//! client.reset_mocks().unwrap();
//! ```
//!
//! When the service runs as a forward proxy, the proxy-control endpoint can
//! assert on and replay the traffic that passed through it:
//!
//! ```no_run
//! use mockserver_client::prelude::*;
//!
//! let client = MockServerClient::from_env();
//!
//! client
//!     .verify_proxy(
//!         &Verify::new()
//!             .match_request(RequestMatcher::new(Method::GET, "/"))
//!             .times(1, true),
//!     )
//!     .unwrap();
//!
//! let recorded = client
//!     .retrieve_proxy(&Retrieve::new().match_request(RequestMatcher::new(Method::POST, "/")))
//!     .unwrap();
//! assert!(recorded.is_empty());
//! ```
//!
//! # Blocking and async
//! Every operation has a blocking flavor (`reset_mocks`) that works without
//! an async runtime, an async flavor (`reset_mocks_async`), and a panicking
//! `must_` flavor for test-setup call sites where an unreachable mock
//! server is unrecoverable anyway.
//!
//! # Errors
//! Operations fail with exactly one of four [`Error`] kinds: the document
//! could not be serialized, the server could not be reached, the server
//! rejected the request (carrying the status code and response body), or a
//! retrieve response could not be deserialized. The client never retries.
//!
//! # Debugging
//! The crate logs every control-plane exchange against the `tracing` crate
//! (with `log` compatibility). For example, with the `env_logger` backend,
//! set `RUST_LOG=debug` and call `env_logger::try_init()` to see the JSON
//! payloads that go over the wire.

mod api;
mod common;

pub use api::{Error, MockServerClient};
pub use common::{
    data::{
        Body, BodyType, Delay, Expectation, Method, NameValue, RecordedRequest, RequestMatcher,
        ResponseTemplate, Retrieve, TimeToLive, Times, Verify, VerifyTimes,
    },
    http::{Error as HttpError, HttpClient, HyperHttpClient},
};

pub mod prelude {
    //! Commonly used imports: `use mockserver_client::prelude::*;`
    pub use crate::{
        Expectation, Method, MockServerClient, RequestMatcher, ResponseTemplate, Retrieve, Verify,
    };
}
