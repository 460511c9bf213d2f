//! `reqwest`-backed transport for native processes.

use std::time::Duration;

use super::http::{Body, FormData, FormPart, Headers, HttpRequest, HttpResponse, Method};
use super::transport::{Fetch, FetchError};
use crate::config::TransportTimeouts;

pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client with the given default timeouts. A request's own
    /// `timeout` overrides the request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend fails to initialize.
    pub fn new(timeouts: TransportTimeouts) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self { http })
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn to_multipart(form: FormData) -> Result<reqwest::multipart::Form, FetchError> {
    let mut out = reqwest::multipart::Form::new();
    for part in form.parts() {
        out = match part.clone() {
            FormPart::Text { name, value } => out.text(name, value),
            FormPart::File { name, file_name, content_type, bytes } => {
                let mut file = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
                if let Some(ct) = content_type {
                    file = file
                        .mime_str(&ct)
                        .map_err(|e| FetchError::InvalidRequest(e.to_string()))?;
                }
                out.part(name, file)
            }
        };
    }
    Ok(out)
}

fn map_send_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if e.is_builder() {
        FetchError::InvalidRequest(e.to_string())
    } else {
        FetchError::Network(e.to_string())
    }
}

#[cfg_attr(feature = "hydrate", async_trait::async_trait(?Send))]
#[cfg_attr(not(feature = "hydrate"), async_trait::async_trait)]
impl Fetch for ReqwestTransport {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let HttpRequest { method, url, headers, body, credentials: _, timeout } = request;

        let mut builder = self.http.request(to_reqwest_method(method), &url);
        for (name, value) in headers.iter() {
            builder = builder.header(name, value);
        }
        builder = match body {
            Body::Empty => builder,
            Body::Text(text) => builder.body(text),
            Body::Bytes(bytes) => builder.body(bytes),
            Body::Form(form) => builder.multipart(to_multipart(form)?),
        };
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let resp = builder.send().await.map_err(map_send_error)?;
        let status = resp.status().as_u16();
        let headers: Headers = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_owned(), v.to_owned())))
            .collect();
        let body = resp.bytes().await.map_err(map_send_error)?.to_vec();

        Ok(HttpResponse { status, headers, body })
    }
}
