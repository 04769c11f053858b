//! In-process HTTP server that records requests and answers with a canned response.

use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Router;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Recorded {
    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decoded query parameters, in request order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let url = reqwest::Url::parse(&format!("http://localhost{}", self.uri)).unwrap();
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }
}

pub type Requests = Arc<Mutex<Vec<Recorded>>>;

/// Serves every path with `status`, `headers` and `body`. Returns the base URL
/// (`http://127.0.0.1:<port>`) and the shared request log.
pub async fn serve_canned(
    status: u16,
    headers: &[(&str, &str)],
    body: &str,
) -> (String, Requests) {
    let status = StatusCode::from_u16(status).unwrap();
    let requests: Requests = Arc::default();
    let log = requests.clone();

    let mut response_headers = HeaderMap::new();
    for (name, value) in headers {
        response_headers.insert(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
    }
    let body = body.to_string();

    let app = Router::new().fallback(
        move |method: Method, uri: Uri, headers: HeaderMap, request_body: Bytes| {
            let log = log.clone();
            let response_headers = response_headers.clone();
            let body = body.clone();
            async move {
                log.lock().unwrap().push(Recorded {
                    method,
                    uri,
                    headers,
                    body: request_body,
                });
                (status, response_headers, body).into_response()
            }
        },
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), requests)
}

/// The single request the server received.
pub fn only_request(requests: &Requests) -> Recorded {
    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1, "expected exactly one request");
    requests[0].clone()
}
