//! The inbound surface used by endpoint wrappers.
//!
//! Generated wrappers only build a path and optional query/body, then call one
//! of the verb helpers here. They never see retry counters or pagination.

use std::sync::Arc;

use protocol::{
    ApiResponse, ClientConfig, ConfigError, DispatchError, HttpTransport, QueryParams,
    RequestOptions, ResponseEnvelope,
};
use serde_json::Value;

use crate::RequestDispatcher;

/// Cheaply cloneable handle to a configured dispatcher.
#[derive(Clone)]
pub struct ApiClient {
    dispatcher: Arc<RequestDispatcher>,
}

impl ApiClient {
    /// Validates `config` and builds a client over `transport`.
    pub fn new(transport: Arc<dyn HttpTransport>, config: &ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            dispatcher: Arc::new(RequestDispatcher::new(transport, config)),
        })
    }

    /// Issues an arbitrary request. `method` is matched case-insensitively.
    pub async fn dispatch(
        &self,
        method: &str,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, DispatchError> {
        self.dispatcher.dispatch(method, path, options).await
    }

    /// Same as [`ApiClient::dispatch`], normalised into a [`ResponseEnvelope`].
    pub async fn envelope(&self, method: &str, path: &str, options: RequestOptions) -> ResponseEnvelope {
        self.dispatch(method, path, options).await.into()
    }

    /// `GET path?query`, following pagination.
    pub async fn get(&self, path: &str, query: Option<QueryParams>) -> Result<ApiResponse, DispatchError> {
        let options = RequestOptions {
            query,
            data: None,
        };
        self.dispatch("GET", path, options).await
    }

    /// `POST path` with a JSON body.
    pub async fn post(&self, path: &str, data: Value) -> Result<ApiResponse, DispatchError> {
        self.dispatch("POST", path, RequestOptions::new().with_data(data))
            .await
    }

    /// `PUT path` with a JSON body.
    pub async fn put(&self, path: &str, data: Value) -> Result<ApiResponse, DispatchError> {
        self.dispatch("PUT", path, RequestOptions::new().with_data(data))
            .await
    }

    /// `DELETE path`.
    pub async fn delete(&self, path: &str) -> Result<ApiResponse, DispatchError> {
        self.dispatch("DELETE", path, RequestOptions::new()).await
    }
}
