//! Per-URL data holder for screens (list/detail/form) backed by the
//! injected API functions.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api_service::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::request::ApiFuture;

/// What a screen renders from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<ApiError>,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

type ErrorHook = Arc<dyn Fn(&ApiError) + Send + Sync>;

/// Remote resource at a fixed URL.
///
/// Each operation clears the previous error, marks the resource as loading,
/// and records either the decoded response or the failure. Failures are also
/// returned so the caller can react, and passed to the error hook (typically
/// a shell notification).
pub struct ApiResource<T> {
    client: ApiClient,
    url: String,
    state: ResourceState<T>,
    on_error: Option<ErrorHook>,
}

impl<T> ApiResource<T>
where
    T: DeserializeOwned,
{
    pub fn new(client: ApiClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            state: ResourceState::default(),
            on_error: None,
        }
    }

    pub fn with_error_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ApiError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> &ResourceState<T> {
        &self.state
    }

    pub fn data(&self) -> Option<&T> {
        self.state.data.as_ref()
    }

    /// `GET` the resource.
    pub async fn fetch(&mut self) -> ApiResult<()> {
        let call = Ok(self.client.get_request(self.url.clone(), None));
        self.run(call, false).await
    }

    /// `POST` `body` to the resource URL; the response becomes the data.
    pub async fn create<B: Serialize>(&mut self, body: &B) -> ApiResult<()> {
        let call = encode(body).map(|body| self.client.post_request(self.url.clone(), body, None));
        self.run(call, false).await
    }

    /// `PUT` `body` to the resource URL; the response becomes the data.
    pub async fn update<B: Serialize>(&mut self, body: &B) -> ApiResult<()> {
        let call = encode(body).map(|body| self.client.put_request(self.url.clone(), body, None));
        self.run(call, false).await
    }

    /// `DELETE` the resource; clears the data on success.
    pub async fn remove(&mut self) -> ApiResult<()> {
        let call = Ok(self.client.delete_request(self.url.clone(), None));
        self.run(call, true).await
    }

    /// Await `call` with `loading` set. Dropping the returned future
    /// mid-flight leaves the resource idle again.
    async fn run(&mut self, call: ApiResult<ApiFuture>, clear: bool) -> ApiResult<()> {
        self.state.error = None;
        let outcome = match call {
            Ok(pending) => {
                let _loading = LoadingGuard::start(&mut self.state.loading);
                pending.await
            }
            Err(err) => Err(err),
        };
        self.finish(outcome, clear)
    }

    fn finish(&mut self, outcome: ApiResult, clear: bool) -> ApiResult<()> {
        self.state.loading = false;
        let decoded = outcome.and_then(|value| {
            if clear {
                Ok(None)
            } else {
                decode::<T>(value).map(Some)
            }
        });
        match decoded {
            Ok(data) => {
                self.state.data = data;
                Ok(())
            }
            Err(err) => {
                if let Some(hook) = &self.on_error {
                    hook(&err);
                }
                self.state.error = Some(err.clone());
                Err(err)
            }
        }
    }
}

/// Holds `loading` high until dropped.
struct LoadingGuard<'a> {
    loading: &'a mut bool,
}

impl<'a> LoadingGuard<'a> {
    fn start(loading: &'a mut bool) -> Self {
        *loading = true;
        Self { loading }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        *self.loading = false;
    }
}

fn encode<B: Serialize>(body: &B) -> ApiResult<Value> {
    serde_json::to_value(body)
        .map_err(|e| ApiError::transport(format!("failed to encode request body: {e}")))
}

fn decode<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
    serde_json::from_value(value)
        .map_err(|e| ApiError::transport(format!("unexpected response shape: {e}")))
}
