use std::{
    net::SocketAddr,
    sync::{mpsc, Arc, Mutex},
    thread,
};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{body::Incoming, service::service_fn, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

/// One request as received by the stub control plane.
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// A minimal in-process stand-in for the mock server's control plane: it
/// answers every request with a fixed status and body and records what it
/// received. Runs on its own thread with its own runtime so tests can use
/// the blocking client API.
pub struct ControlPlaneStub {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
}

impl ControlPlaneStub {
    pub fn start(status: u16, response_body: &'static str) -> Self {
        let received: Arc<Mutex<Vec<ReceivedRequest>>> = Arc::new(Mutex::new(Vec::new()));
        let (addr_tx, addr_rx) = mpsc::channel();

        let log = received.clone();
        thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("cannot build stub runtime");

            rt.block_on(async move {
                let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
                addr_tx.send(listener.local_addr().unwrap()).unwrap();

                loop {
                    let (stream, _) = listener.accept().await.unwrap();
                    let log = log.clone();

                    tokio::spawn(async move {
                        let service = service_fn(move |req: Request<Incoming>| {
                            let log = log.clone();
                            async move {
                                let (parts, body) = req.into_parts();
                                let body = body.collect().await.unwrap().to_bytes().to_vec();
                                let content_type = parts
                                    .headers
                                    .get(http::header::CONTENT_TYPE)
                                    .and_then(|value| value.to_str().ok())
                                    .map(str::to_string);

                                log.lock().unwrap().push(ReceivedRequest {
                                    method: parts.method.to_string(),
                                    path: parts.uri.path().to_string(),
                                    content_type,
                                    body,
                                });

                                Ok::<_, std::convert::Infallible>(
                                    Response::builder()
                                        .status(StatusCode::from_u16(status).unwrap())
                                        .body(Full::new(Bytes::from(response_body)))
                                        .unwrap(),
                                )
                            }
                        });

                        hyper::server::conn::http1::Builder::new()
                            .serve_connection(TokioIo::new(stream), service)
                            .await
                            .ok();
                    });
                }
            });
        });

        let addr = addr_rx.recv().expect("stub control plane did not start");
        Self { addr, received }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn received(&self) -> Vec<ReceivedRequest> {
        self.received.lock().unwrap().clone()
    }
}
