use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

use bytes::Bytes;
use http::{header::CONTENT_TYPE, Request};
use serde::Serialize;
use tokio::runtime::Runtime;

use crate::{
    api::Error,
    common::{
        data::{Expectation, RecordedRequest, Retrieve, Verify},
        http::{HttpClient, HyperHttpClient},
        runtime,
        util::{read_env, Join},
    },
};

// One process-wide runtime drives control-plane IO so the blocking surface
// works without an ambient tokio context.
static CLIENT_RUNTIME: OnceLock<Arc<Runtime>> = OnceLock::new();

fn client_runtime() -> Arc<Runtime> {
    CLIENT_RUNTIME
        .get_or_init(|| {
            Arc::new(
                runtime::new(1, 1).expect("Cannot build tokio runtime for the mock server client"),
            )
        })
        .clone()
}

/// A client for the administrative REST API of an external HTTP mock/proxy
/// service.
///
/// The client addresses two base URLs: the *mock control* endpoint, where
/// expectations are registered and reset, and the *proxy control* endpoint,
/// where proxied traffic is verified, retrieved and reset. Every operation
/// is a single `PUT` of a JSON document to a fixed path; a response status
/// in 200..=299 is success, anything else is reported as
/// [`Error::Rejected`].
///
/// All operations exist in three flavors: blocking (`verify_proxy`), async
/// (`verify_proxy_async`), and panicking for test-setup call sites
/// (`must_verify_proxy`).
///
/// ```no_run
/// use mockserver_client::prelude::*;
///
/// let client = MockServerClient::new("http://127.0.0.1:1080", "http://127.0.0.1:1090");
///
/// client
///     .mock_any_response(
///         &Expectation::new()
///             .when(RequestMatcher::new(Method::GET, "/test"))
///             .respond(ResponseTemplate::new(200)),
///     )
///     .unwrap();
/// ```
pub struct MockServerClient {
    mock_base_url: String,
    proxy_base_url: String,
    http_client: Arc<dyn HttpClient + Send + Sync>,
}

impl MockServerClient {
    /// Creates a client for the given mock-control and proxy-control base
    /// URLs (e.g. `http://127.0.0.1:1080`).
    pub fn new<M: Into<String>, P: Into<String>>(mock_base_url: M, proxy_base_url: P) -> Self {
        Self::with_http_client(
            mock_base_url,
            proxy_base_url,
            Arc::new(HyperHttpClient::new(Some(client_runtime()), None)),
        )
    }

    /// Creates a client using connection parameters stored in the
    /// `MOCKSERVER_URL` and `MOCKSERVER_PROXY_URL` environment variables,
    /// falling back to `http://127.0.0.1:1080` / `http://127.0.0.1:1090`.
    pub fn from_env() -> Self {
        Self::new(
            read_env("MOCKSERVER_URL", "http://127.0.0.1:1080"),
            read_env("MOCKSERVER_PROXY_URL", "http://127.0.0.1:1090"),
        )
    }

    /// Creates a client with a custom transport. The caller is responsible
    /// for making the transport usable from the contexts it will be called
    /// in (see [`HyperHttpClient`]).
    pub fn with_http_client<M: Into<String>, P: Into<String>>(
        mock_base_url: M,
        proxy_base_url: P,
        http_client: Arc<dyn HttpClient + Send + Sync>,
    ) -> Self {
        Self {
            mock_base_url: mock_base_url.into(),
            proxy_base_url: proxy_base_url.into(),
            http_client,
        }
    }

    /// Bounds every control-plane exchange to the given duration. There is
    /// no default limit; an exceeded limit is reported as
    /// [`Error::Transport`].
    pub fn with_request_timeout(mut self, max_wait: Duration) -> Self {
        self.http_client = Arc::new(HyperHttpClient::new(Some(client_runtime()), Some(max_wait)));
        self
    }

    /// Builds the URL for a path on the mock-control endpoint.
    pub fn mock_url<S: Into<String>>(&self, path: S) -> String {
        format!("{}{}", self.mock_base_url, path.into())
    }

    /// Builds the URL for a path on the proxy-control endpoint.
    pub fn proxy_url<S: Into<String>>(&self, path: S) -> String {
        format!("{}{}", self.proxy_base_url, path.into())
    }

    /// Registers an expectation with the mock server: requests matching the
    /// expectation's matcher are answered with its response template.
    pub fn mock_any_response(&self, expectation: &Expectation) -> Result<(), Error> {
        self.mock_any_response_async(expectation).join()
    }

    /// Async variant of [`MockServerClient::mock_any_response`].
    pub async fn mock_any_response_async(&self, expectation: &Expectation) -> Result<(), Error> {
        self.put(&self.mock_base_url, "/expectation", Some(encode(expectation)?))
            .await?;
        Ok(())
    }

    /// Like [`MockServerClient::mock_any_response`], but panics on failure.
    pub fn must_mock_any_response(&self, expectation: &Expectation) {
        self.mock_any_response(expectation)
            .expect("cannot register expectation with the mock server");
    }

    /// Deletes all expectations registered with the mock server.
    pub fn reset_mocks(&self) -> Result<(), Error> {
        self.reset_mocks_async().join()
    }

    /// Async variant of [`MockServerClient::reset_mocks`].
    pub async fn reset_mocks_async(&self) -> Result<(), Error> {
        self.put(&self.mock_base_url, "/reset", None).await?;
        Ok(())
    }

    /// Like [`MockServerClient::reset_mocks`], but panics on failure.
    pub fn must_reset_mocks(&self) {
        self.reset_mocks().expect("cannot reset the mock server");
    }

    /// Asserts that the proxy observed requests matching the query the
    /// required number of times. A non-2xx answer (the assertion failed on
    /// the server side) is reported as [`Error::Rejected`].
    pub fn verify_proxy(&self, verify: &Verify) -> Result<(), Error> {
        self.verify_proxy_async(verify).join()
    }

    /// Async variant of [`MockServerClient::verify_proxy`].
    pub async fn verify_proxy_async(&self, verify: &Verify) -> Result<(), Error> {
        self.put(&self.proxy_base_url, "/verify", Some(encode(verify)?))
            .await?;
        Ok(())
    }

    /// Like [`MockServerClient::verify_proxy`], but panics on failure.
    pub fn must_verify_proxy(&self, verify: &Verify) {
        self.verify_proxy(verify)
            .expect("cannot verify requests against the proxy");
    }

    /// Fetches the requests recorded by the proxy that match the query's
    /// filter, in the order the proxy observed them. No matches is an empty
    /// list, not an error.
    pub fn retrieve_proxy(&self, retrieve: &Retrieve) -> Result<Vec<RecordedRequest>, Error> {
        self.retrieve_proxy_async(retrieve).join()
    }

    /// Async variant of [`MockServerClient::retrieve_proxy`].
    pub async fn retrieve_proxy_async(
        &self,
        retrieve: &Retrieve,
    ) -> Result<Vec<RecordedRequest>, Error> {
        // The wire format takes the bare filter; a query without one
        // serializes as JSON null, which the service treats as match-all.
        let response = self
            .put(
                &self.proxy_base_url,
                "/retrieve",
                Some(encode(&retrieve.http_request)?),
            )
            .await?;
        serde_json::from_slice(&response).map_err(Error::Deserialization)
    }

    /// Like [`MockServerClient::retrieve_proxy`], but panics on failure.
    pub fn must_retrieve_proxy(&self, retrieve: &Retrieve) -> Vec<RecordedRequest> {
        self.retrieve_proxy(retrieve)
            .expect("cannot retrieve recorded requests from the proxy")
    }

    /// Deletes the proxy's recorded request history.
    pub fn reset_proxy(&self) -> Result<(), Error> {
        self.reset_proxy_async().join()
    }

    /// Async variant of [`MockServerClient::reset_proxy`].
    pub async fn reset_proxy_async(&self) -> Result<(), Error> {
        self.put(&self.proxy_base_url, "/reset", None).await?;
        Ok(())
    }

    /// Like [`MockServerClient::reset_proxy`], but panics on failure.
    pub fn must_reset_proxy(&self) {
        self.reset_proxy().expect("cannot reset the proxy");
    }

    async fn put(
        &self,
        base_url: &str,
        path: &str,
        payload: Option<Vec<u8>>,
    ) -> Result<Bytes, Error> {
        let url = format!("{}{}", base_url, path);
        let body = payload.map(Bytes::from).unwrap_or_default();
        tracing::debug!(
            "sending PUT {} (body: {})",
            url,
            String::from_utf8_lossy(&body)
        );

        let request = Request::builder()
            .method("PUT")
            .uri(&url)
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .body(body)
            .map_err(|err| Error::Transport(err.into()))?;

        let response = self.http_client.send(request).await?;

        let status = response.status().as_u16();
        let body = response.into_body();
        if !(200..=299).contains(&status) {
            return Err(Error::Rejected {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        tracing::debug!(
            "mock server response ({}): {}",
            status,
            String::from_utf8_lossy(&body)
        );
        Ok(body)
    }
}

fn encode<T: Serialize + ?Sized>(document: &T) -> Result<Vec<u8>, Error> {
    serde_json::to_vec(document).map_err(Error::Serialization)
}
