use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::{BodyExt, Full};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tokio::runtime::Runtime;

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot build request: {0}")]
    InvalidRequest(#[from] http::Error),
    #[error("cannot send request: {0}")]
    HyperError(#[from] hyper::Error),
    #[error("cannot send request: {0}")]
    HyperUtilError(#[from] hyper_util::client::legacy::Error),
    #[error("runtime error: {0}")]
    RuntimeError(#[from] tokio::task::JoinError),
    #[error("request did not complete within {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait HttpClient {
    async fn send(&self, req: Request<Bytes>) -> Result<Response<Bytes>, Error>;
}

/// Default [`HttpClient`] over hyper's pooled legacy client. When an owned
/// runtime is provided, the exchange is spawned onto it so callers do not
/// need an ambient tokio context (this is what the blocking API surface
/// relies on).
pub struct HyperHttpClient {
    runtime: Option<Arc<Runtime>>,
    max_wait: Option<Duration>,
    client: Arc<Client<HttpConnector, Full<Bytes>>>,
}

impl HyperHttpClient {
    pub fn new(runtime: Option<Arc<Runtime>>, max_wait: Option<Duration>) -> Self {
        Self {
            runtime,
            max_wait,
            client: Arc::new(Client::builder(TokioExecutor::new()).build(HttpConnector::new())),
        }
    }
}

#[async_trait]
impl HttpClient for HyperHttpClient {
    async fn send(&self, req: Request<Bytes>) -> Result<Response<Bytes>, Error> {
        let (parts, body) = req.into_parts();
        let req = Request::from_parts(parts, Full::new(body));

        if let Some(rt) = self.runtime.clone() {
            let client = self.client.clone();
            let max_wait = self.max_wait;
            rt.spawn(async move { exchange(client, req, max_wait).await })
                .await?
        } else {
            exchange(self.client.clone(), req, self.max_wait).await
        }
    }
}

async fn exchange(
    client: Arc<Client<HttpConnector, Full<Bytes>>>,
    req: Request<Full<Bytes>>,
    max_wait: Option<Duration>,
) -> Result<Response<Bytes>, Error> {
    let send_and_collect = async move {
        let res = client.request(req).await?;
        let (parts, body) = res.into_parts();
        let body = body.collect().await?.to_bytes();
        Ok(Response::from_parts(parts, body))
    };

    match max_wait {
        Some(limit) => tokio::time::timeout(limit, send_and_collect)
            .await
            .map_err(|_| Error::Timeout(limit))?,
        None => send_and_collect.await,
    }
}
