//! `gloo-net` transport for the browser (`hydrate`).
//!
//! Timeouts race the request against a `gloo-timers` delay. When the delay
//! wins, the request's `AbortController` is fired so the browser cancels the
//! underlying fetch; dropping the future alone would leave it running.

use futures::future::{Either, select};
use gloo_net::http::{Method as GlooMethod, RequestBuilder};
use wasm_bindgen::JsValue;

use super::http::{Body, Credentials, FormData, FormPart, Headers, HttpRequest, HttpResponse, Method};
use super::transport::{Fetch, FetchError};

#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserTransport;

fn to_gloo_method(method: Method) -> GlooMethod {
    match method {
        Method::Get => GlooMethod::GET,
        Method::Post => GlooMethod::POST,
        Method::Put => GlooMethod::PUT,
        Method::Patch => GlooMethod::PATCH,
        Method::Delete => GlooMethod::DELETE,
    }
}

fn to_credentials(credentials: Credentials) -> web_sys::RequestCredentials {
    match credentials {
        Credentials::SameOrigin => web_sys::RequestCredentials::SameOrigin,
        Credentials::Include => web_sys::RequestCredentials::Include,
        Credentials::Omit => web_sys::RequestCredentials::Omit,
    }
}

fn to_form_data(form: &FormData) -> Result<web_sys::FormData, FetchError> {
    let js_err = |e: JsValue| FetchError::InvalidRequest(format!("{e:?}"));
    let out = web_sys::FormData::new().map_err(js_err)?;
    for part in form.parts() {
        match part {
            FormPart::Text { name, value } => out.append_with_str(name, value).map_err(js_err)?,
            FormPart::File { name, file_name, content_type, bytes } => {
                let array = js_sys::Array::of1(&js_sys::Uint8Array::from(bytes.as_slice()));
                let options = web_sys::BlobPropertyBag::new();
                if let Some(ct) = content_type {
                    options.set_type(ct);
                }
                let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&array, &options)
                    .map_err(js_err)?;
                out.append_with_blob_and_filename(name, &blob, file_name)
                    .map_err(js_err)?;
            }
        }
    }
    Ok(out)
}

#[async_trait::async_trait(?Send)]
impl Fetch for BrowserTransport {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let HttpRequest { method, url, headers, body, credentials, timeout } = request;

        let mut builder = RequestBuilder::new(&url)
            .method(to_gloo_method(method))
            .credentials(to_credentials(credentials));
        for (name, value) in headers.iter() {
            builder = builder.header(name, value);
        }
        let controller = match timeout {
            Some(_) => Some(
                web_sys::AbortController::new()
                    .map_err(|e| FetchError::InvalidRequest(format!("{e:?}")))?,
            ),
            None => None,
        };
        if let Some(controller) = &controller {
            builder = builder.abort_signal(Some(&controller.signal()));
        }
        let built = match body {
            Body::Empty => builder.build(),
            Body::Text(text) => builder.body(JsValue::from_str(&text)),
            Body::Bytes(bytes) => builder.body(js_sys::Uint8Array::from(bytes.as_slice())),
            Body::Form(form) => builder.body(to_form_data(&form)?),
        }
        .map_err(|e| FetchError::InvalidRequest(e.to_string()))?;

        let send = Box::pin(built.send());
        let resp = match (timeout, &controller) {
            (Some(limit), Some(controller)) => {
                let millis = u32::try_from(limit.as_millis()).unwrap_or(u32::MAX);
                let delay = Box::pin(gloo_timers::future::TimeoutFuture::new(millis));
                match select(send, delay).await {
                    Either::Left((resp, _)) => resp,
                    Either::Right(((), _)) => {
                        controller.abort();
                        return Err(FetchError::Timeout);
                    }
                }
            }
            _ => send.await,
        }
        .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = resp.status();
        let headers: Headers = resp.headers().entries().collect();
        let body = resp
            .binary()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(HttpResponse { status, headers, body })
    }
}
