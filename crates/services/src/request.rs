//! Shapes of the injected request functions.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiResult;

/// The six functions the shell may inject.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ApiFunction {
    #[serde(rename = "getRequest")]
    GetRequest,
    #[serde(rename = "postRequest")]
    PostRequest,
    #[serde(rename = "putRequest")]
    PutRequest,
    #[serde(rename = "deleteRequest")]
    DeleteRequest,
    #[serde(rename = "getFileRequest")]
    GetFileRequest,
    #[serde(rename = "postFileRequest")]
    PostFileRequest,
}

impl ApiFunction {
    pub const ALL: [ApiFunction; 6] = [
        ApiFunction::GetRequest,
        ApiFunction::PostRequest,
        ApiFunction::PutRequest,
        ApiFunction::DeleteRequest,
        ApiFunction::GetFileRequest,
        ApiFunction::PostFileRequest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiFunction::GetRequest => "getRequest",
            ApiFunction::PostRequest => "postRequest",
            ApiFunction::PutRequest => "putRequest",
            ApiFunction::DeleteRequest => "deleteRequest",
            ApiFunction::GetFileRequest => "getFileRequest",
            ApiFunction::PostFileRequest => "postFileRequest",
        }
    }
}

impl core::fmt::Display for ApiFunction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call options forwarded untouched to the shell's HTTP stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestConfig {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl RequestConfig {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }
}

/// One call, as handed to an injected function.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub function: ApiFunction,
    pub url: String,
    pub body: Option<Value>,
    pub file_name: Option<String>,
    pub config: RequestConfig,
}

impl ApiRequest {
    pub fn new(function: ApiFunction, url: impl Into<String>) -> Self {
        Self {
            function,
            url: url.into(),
            body: None,
            file_name: None,
            config: RequestConfig::default(),
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_file_name(mut self, file_name: Option<String>) -> Self {
        self.file_name = file_name;
        self
    }

    pub fn with_config(mut self, config: Option<RequestConfig>) -> Self {
        self.config = config.unwrap_or_default();
        self
    }
}

/// Result of an injected call. Failures are values, never panics.
pub type ApiFuture = Pin<Box<dyn Future<Output = ApiResult> + Send>>;

/// An injected request function.
pub type RequestFn = Arc<dyn Fn(ApiRequest) -> ApiFuture + Send + Sync>;

/// Wrap an async closure as a [`RequestFn`].
pub fn request_fn<F, Fut>(f: F) -> RequestFn
where
    F: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ApiResult> + Send + 'static,
{
    Arc::new(move |req| Box::pin(f(req)) as ApiFuture)
}
