//! `microapp-services` — runtime-injected backend access.
//!
//! The module does not ship an HTTP stack. The shell hands over its request
//! functions at runtime (`shell:api-functions`) and every screen calls
//! through the [`ApiClient`] handle, which always delegates to whatever
//! implementation is current.

pub mod api_service;
pub mod error;
pub mod request;
pub mod resource;

pub use api_service::{ApiClient, ApiFunctions, ApiService};
pub use error::{
    ApiError, ApiErrorKind, ApiResult, CONNECTION_ERROR_MESSAGE, SESSION_EXPIRED_MESSAGE,
};
pub use request::{
    ApiFunction, ApiFuture, ApiRequest, RequestConfig, RequestFn, request_fn,
};
pub use resource::{ApiResource, ResourceState};
