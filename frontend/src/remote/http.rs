//! Thin wrapper over the browser's `fetch`.

use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

use crate::error::{error_message, RemoteError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::Patch, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, RemoteError> {
        self.body = Some(serde_json::to_string(body)?);
        Ok(self.header("Content-Type", "application/json"))
    }
}

/// Sends the request and returns the response body of a 2xx reply.
pub async fn send(request: HttpRequest) -> Result<String, RemoteError> {
    let opts = RequestInit::new();
    opts.set_method(request.method.as_str());
    if let Some(body) = &request.body {
        opts.set_body(&JsValue::from_str(body));
    }

    let fetch_request = Request::new_with_str_and_init(&request.url, &opts).map_err(network_error)?;
    for (name, value) in &request.headers {
        fetch_request.headers().set(name, value).map_err(network_error)?;
    }

    let window = web_sys::window().ok_or_else(|| RemoteError::Network("no window".to_string()))?;
    let response: Response = JsFuture::from(window.fetch_with_request(&fetch_request))
        .await
        .map_err(network_error)?
        .dyn_into()
        .map_err(network_error)?;

    let text = JsFuture::from(response.text().map_err(network_error)?)
        .await
        .map_err(network_error)?
        .as_string()
        .unwrap_or_default();

    if !response.ok() {
        let status = response.status();
        let message = error_message(&text).unwrap_or_else(|| response.status_text());
        log::debug!("{} {} -> {}", request.method.as_str(), request.url, status);
        return Err(RemoteError::Status { status, message });
    }

    Ok(text)
}

pub(crate) fn network_error(value: JsValue) -> RemoteError {
    RemoteError::Network(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
}
