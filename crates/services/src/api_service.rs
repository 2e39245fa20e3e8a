//! Runtime API injection layer.
//!
//! [`ApiService`] is the container holding the current request functions.
//! It starts with stubs that fail with [`ApiError::NotImplemented`] and is
//! updated by [`ApiService::set_api_service`] whenever the shell answers
//! `micro:request-api-functions`.
//!
//! Call sites never hold a function directly; they hold an [`ApiClient`],
//! which looks the function up at call time. A client obtained before the
//! shell injected anything therefore uses the real implementation as soon as
//! it arrives.

use std::collections::BTreeSet;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde_json::Value;

use crate::error::ApiError;
use crate::request::{ApiFunction, ApiFuture, ApiRequest, RequestConfig, RequestFn};

/// A partial set of request functions, as delivered by the shell.
///
/// Functions left as `None` keep their previous implementation when merged.
#[derive(Clone, Default)]
pub struct ApiFunctions {
    pub get_request: Option<RequestFn>,
    pub post_request: Option<RequestFn>,
    pub put_request: Option<RequestFn>,
    pub delete_request: Option<RequestFn>,
    pub get_file_request: Option<RequestFn>,
    pub post_file_request: Option<RequestFn>,
}

impl ApiFunctions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the implementation for `function`.
    pub fn with(mut self, function: ApiFunction, f: RequestFn) -> Self {
        *self.slot_mut(function) = Some(f);
        self
    }

    pub fn get(&self, function: ApiFunction) -> Option<&RequestFn> {
        match function {
            ApiFunction::GetRequest => self.get_request.as_ref(),
            ApiFunction::PostRequest => self.post_request.as_ref(),
            ApiFunction::PutRequest => self.put_request.as_ref(),
            ApiFunction::DeleteRequest => self.delete_request.as_ref(),
            ApiFunction::GetFileRequest => self.get_file_request.as_ref(),
            ApiFunction::PostFileRequest => self.post_file_request.as_ref(),
        }
    }

    /// Functions present in this partial set.
    pub fn provided(&self) -> Vec<ApiFunction> {
        ApiFunction::ALL
            .into_iter()
            .filter(|f| self.get(*f).is_some())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.provided().is_empty()
    }

    fn slot_mut(&mut self, function: ApiFunction) -> &mut Option<RequestFn> {
        match function {
            ApiFunction::GetRequest => &mut self.get_request,
            ApiFunction::PostRequest => &mut self.post_request,
            ApiFunction::PutRequest => &mut self.put_request,
            ApiFunction::DeleteRequest => &mut self.delete_request,
            ApiFunction::GetFileRequest => &mut self.get_file_request,
            ApiFunction::PostFileRequest => &mut self.post_file_request,
        }
    }
}

impl core::fmt::Debug for ApiFunctions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiFunctions")
            .field("provided", &self.provided())
            .finish()
    }
}

/// Complete function set; always has an implementation for every function.
#[derive(Clone)]
struct FunctionSet {
    functions: ApiFunctions,
    injected: BTreeSet<ApiFunction>,
}

impl FunctionSet {
    fn stubs() -> Self {
        let functions = ApiFunction::ALL
            .into_iter()
            .fold(ApiFunctions::new(), |acc, f| acc.with(f, stub(f)));
        Self {
            functions,
            injected: BTreeSet::new(),
        }
    }

    fn resolve(&self, function: ApiFunction) -> RequestFn {
        match self.functions.get(function) {
            Some(f) => f.clone(),
            None => stub(function),
        }
    }

    fn merged(&self, partial: &ApiFunctions) -> Self {
        let mut next = self.clone();
        for function in partial.provided() {
            if let Some(f) = partial.get(function) {
                *next.functions.slot_mut(function) = Some(f.clone());
                next.injected.insert(function);
            }
        }
        next
    }
}

fn stub(function: ApiFunction) -> RequestFn {
    Arc::new(move |_req: ApiRequest| -> ApiFuture {
        tracing::warn!(%function, "{function} not implemented, using fallback");
        Box::pin(std::future::ready(Err(ApiError::not_implemented(function))))
    })
}

/// Container of the shell-provided request functions.
pub struct ApiService {
    current: ArcSwap<FunctionSet>,
}

impl ApiService {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(FunctionSet::stubs()),
        }
    }

    /// Shallow-merge `partial` over the current functions.
    ///
    /// The merged set is published with a single pointer swap; concurrent
    /// callers see the old set or the new one, never a mix.
    pub fn set_api_service(&self, partial: ApiFunctions) {
        let provided = partial.provided();
        if provided.is_empty() {
            tracing::warn!("shell provided an empty API function set; keeping current functions");
            return;
        }
        self.current.rcu(|prev| prev.merged(&partial));
        tracing::info!(updated = ?provided, "API service updated");
    }

    /// Whether `function` has been injected by the shell (vs. still a stub).
    pub fn is_injected(&self, function: ApiFunction) -> bool {
        self.current.load().injected.contains(&function)
    }

    /// Functions injected so far.
    pub fn injected(&self) -> Vec<ApiFunction> {
        self.current.load().injected.iter().copied().collect()
    }

    fn resolve(&self, function: ApiFunction) -> RequestFn {
        self.current.load().resolve(function)
    }
}

impl Default for ApiService {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for ApiService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiService")
            .field("injected", &self.injected())
            .finish()
    }
}

/// Stable call-site handle over an [`ApiService`].
///
/// Cheap to clone. Every call resolves the *current* implementation.
#[derive(Debug, Clone)]
pub struct ApiClient {
    service: Arc<ApiService>,
}

impl ApiClient {
    pub fn new(service: Arc<ApiService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<ApiService> {
        &self.service
    }

    /// Dispatch `request` to the current implementation and translate its
    /// failure (if any) into the module's error taxonomy.
    pub fn call(&self, request: ApiRequest) -> ApiFuture {
        let function = request.function;
        let implementation = self.service.resolve(function);
        tracing::debug!(%function, url = %request.url, "API call");
        let pending = implementation(request);
        Box::pin(async move { pending.await.map_err(|err| err.translate(function)) })
    }

    pub fn get_request(&self, url: impl Into<String>, config: Option<RequestConfig>) -> ApiFuture {
        self.call(ApiRequest::new(ApiFunction::GetRequest, url).with_config(config))
    }

    pub fn post_request(
        &self,
        url: impl Into<String>,
        data: Value,
        config: Option<RequestConfig>,
    ) -> ApiFuture {
        self.call(
            ApiRequest::new(ApiFunction::PostRequest, url)
                .with_body(data)
                .with_config(config),
        )
    }

    pub fn put_request(
        &self,
        url: impl Into<String>,
        data: Value,
        config: Option<RequestConfig>,
    ) -> ApiFuture {
        self.call(
            ApiRequest::new(ApiFunction::PutRequest, url)
                .with_body(data)
                .with_config(config),
        )
    }

    pub fn delete_request(
        &self,
        url: impl Into<String>,
        config: Option<RequestConfig>,
    ) -> ApiFuture {
        self.call(ApiRequest::new(ApiFunction::DeleteRequest, url).with_config(config))
    }

    pub fn get_file_request(
        &self,
        url: impl Into<String>,
        config: Option<RequestConfig>,
        file_name: Option<String>,
    ) -> ApiFuture {
        self.call(
            ApiRequest::new(ApiFunction::GetFileRequest, url)
                .with_config(config)
                .with_file_name(file_name),
        )
    }

    pub fn post_file_request(
        &self,
        url: impl Into<String>,
        data: Value,
        file_name: Option<String>,
        config: Option<RequestConfig>,
    ) -> ApiFuture {
        self.call(
            ApiRequest::new(ApiFunction::PostFileRequest, url)
                .with_body(data)
                .with_file_name(file_name)
                .with_config(config),
        )
    }
}

impl From<Arc<ApiService>> for ApiClient {
    fn from(service: Arc<ApiService>) -> Self {
        Self::new(service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiErrorKind, CONNECTION_ERROR_MESSAGE, SESSION_EXPIRED_MESSAGE};
    use crate::request::request_fn;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn client() -> ApiClient {
        ApiClient::new(Arc::new(ApiService::new()))
    }

    #[tokio::test]
    async fn every_stub_rejects_with_not_implemented() {
        let api = client();
        let results = vec![
            api.get_request("/a", None).await,
            api.post_request("/a", json!({}), None).await,
            api.put_request("/a", json!({}), None).await,
            api.delete_request("/a", None).await,
            api.get_file_request("/a", None, Some("a.pdf".into())).await,
            api.post_file_request("/a", json!({}), None, None).await,
        ];

        for (result, function) in results.into_iter().zip(ApiFunction::ALL) {
            assert_eq!(result, Err(ApiError::not_implemented(function)));
        }
        assert!(api.service().injected().is_empty());
    }

    #[tokio::test]
    async fn client_obtained_before_injection_sees_the_new_function() {
        let service = Arc::new(ApiService::new());
        let get = ApiClient::new(service.clone());

        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        service.set_api_service(ApiFunctions::new().with(
            ApiFunction::GetRequest,
            request_fn(move |req: ApiRequest| {
                c.fetch_add(1, Ordering::SeqCst);
                async move { Ok(json!({ "url": req.url })) }
            }),
        ));

        let value = get.get_request("/api/v1/users", None).await.unwrap();
        assert_eq!(value, json!({ "url": "/api/v1/users" }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn merge_keeps_functions_not_in_the_partial_set() {
        let service = Arc::new(ApiService::new());
        let api = ApiClient::new(service.clone());

        service.set_api_service(ApiFunctions::new().with(
            ApiFunction::GetRequest,
            request_fn(|_| async { Ok(json!(1)) }),
        ));
        service.set_api_service(ApiFunctions::new().with(
            ApiFunction::PostRequest,
            request_fn(|_| async { Ok(json!(2)) }),
        ));

        assert_eq!(api.get_request("/x", None).await, Ok(json!(1)));
        assert_eq!(api.post_request("/x", json!({}), None).await, Ok(json!(2)));
        assert_eq!(
            api.put_request("/x", json!({}), None).await.unwrap_err().kind(),
            ApiErrorKind::NotImplemented
        );
        assert_eq!(
            service.injected(),
            vec![ApiFunction::GetRequest, ApiFunction::PostRequest]
        );
    }

    #[tokio::test]
    async fn re_injection_replaces_the_previous_implementation() {
        let service = Arc::new(ApiService::new());
        let api = ApiClient::new(service.clone());

        service.set_api_service(ApiFunctions::new().with(
            ApiFunction::GetRequest,
            request_fn(|_| async { Ok(json!("old")) }),
        ));
        service.set_api_service(ApiFunctions::new().with(
            ApiFunction::GetRequest,
            request_fn(|_| async { Ok(json!("new")) }),
        ));

        assert_eq!(api.get_request("/x", None).await, Ok(json!("new")));
    }

    #[tokio::test]
    async fn unauthorized_responses_become_session_expired() {
        let service = Arc::new(ApiService::new());
        let api = ApiClient::new(service.clone());
        service.set_api_service(ApiFunctions::new().with(
            ApiFunction::DeleteRequest,
            request_fn(|_| async { Err(ApiError::http(401, "Unauthorized")) }),
        ));

        let err = api.delete_request("/x", None).await.unwrap_err();
        assert_eq!(err.kind(), ApiErrorKind::Unauthenticated);
        assert_eq!(err.to_string(), SESSION_EXPIRED_MESSAGE);
    }

    #[tokio::test]
    async fn shell_dialog_failures_surface_as_connection_errors() {
        let service = Arc::new(ApiService::new());
        service.set_api_service(ApiFunctions::new().with(
            ApiFunction::PostRequest,
            request_fn(|_| async {
                Err::<serde_json::Value, _>(ApiError::transport(
                    "Error: Modal instance is not set. Call setModal first.",
                ))
            }),
        ));

        let err = ApiClient::new(service)
            .post_request("/orders", json!({}), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ApiErrorKind::Transport);
        assert_eq!(err.to_string(), CONNECTION_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn request_shape_reaches_the_injected_function() {
        let service = Arc::new(ApiService::new());
        let api = ApiClient::new(service.clone());
        let seen = Arc::new(Mutex::new(None));
        let s = seen.clone();
        service.set_api_service(ApiFunctions::new().with(
            ApiFunction::PostFileRequest,
            request_fn(move |req: ApiRequest| {
                *s.lock().unwrap() = Some(req);
                async { Ok(Value::Null) }
            }),
        ));

        api.post_file_request(
            "/upload",
            json!({ "id": 7 }),
            Some("contract.pdf".into()),
            Some(RequestConfig::default().header("X-Trace", "1")),
        )
        .await
        .unwrap();

        let req = seen.lock().unwrap().take().unwrap();
        assert_eq!(req.url, "/upload");
        assert_eq!(req.body, Some(json!({ "id": 7 })));
        assert_eq!(req.file_name.as_deref(), Some("contract.pdf"));
        assert_eq!(req.config.headers.get("X-Trace").map(String::as_str), Some("1"));
    }

    #[test]
    fn empty_partial_set_is_ignored() {
        let service = ApiService::new();
        service.set_api_service(ApiFunctions::new());
        assert!(service.injected().is_empty());
        assert!(!service.is_injected(ApiFunction::GetRequest));
    }
}
