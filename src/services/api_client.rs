use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio::sync::watch;
use tracing::{debug, error};

use crate::config::Config;
use crate::dto::application_dto::CvAttachment;
use crate::error::{ApiError, Error, Result};
use crate::services::session_service::SessionState;

/// Multipart field carrying the JSON-encoded application text.
pub const APPLICATION_PART: &str = "application";
/// Multipart field carrying the résumé file.
pub const CV_PART: &str = "cvFile";

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(JsonValue),
    Multipart {
        application: JsonValue,
        cv: Option<CvAttachment>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: RequestBody::Empty,
        }
    }

    pub fn post_json<T: Serialize>(path: impl Into<String>, body: &T) -> std::result::Result<Self, ApiError> {
        Ok(Self {
            method: Method::POST,
            path: path.into(),
            body: RequestBody::Json(serde_json::to_value(body)?),
        })
    }

    pub fn put_json<T: Serialize>(path: impl Into<String>, body: &T) -> std::result::Result<Self, ApiError> {
        Ok(Self {
            method: Method::PUT,
            path: path.into(),
            body: RequestBody::Json(serde_json::to_value(body)?),
        })
    }

    pub fn post_multipart<T: Serialize>(
        path: impl Into<String>,
        application: &T,
        cv: Option<CvAttachment>,
    ) -> std::result::Result<Self, ApiError> {
        Ok(Self {
            method: Method::POST,
            path: path.into(),
            body: RequestBody::Multipart {
                application: serde_json::to_value(application)?,
                cv,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Json(JsonValue),
    Text(String),
}

impl ApiResponse {
    pub fn into_json<T: DeserializeOwned>(self) -> std::result::Result<T, ApiError> {
        match self {
            ApiResponse::Json(value) => Ok(serde_json::from_value(value)?),
            ApiResponse::Text(text) => Ok(serde_json::from_str(&text)?),
        }
    }

    /// Decodes a collection; an empty or `null` body is an empty list.
    pub fn into_list<T: DeserializeOwned>(self) -> std::result::Result<Vec<T>, ApiError> {
        match self {
            ApiResponse::Json(JsonValue::Null) => Ok(Vec::new()),
            ApiResponse::Text(text) if text.trim().is_empty() => Ok(Vec::new()),
            other => other.into_json(),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ApiResponse::Text(text) => text,
            ApiResponse::Json(JsonValue::String(text)) => text,
            ApiResponse::Json(JsonValue::Null) => String::new(),
            ApiResponse::Json(value) => value.to_string(),
        }
    }
}

/// The single door to the remote API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn call(&self, request: ApiRequest) -> std::result::Result<ApiResponse, ApiError>;

    /// Fetches a binary resource such as a stored résumé.
    async fn download(&self, path: &str) -> std::result::Result<Bytes, ApiError>;
}

pub struct HttpGateway {
    client: Client,
    base_url: String,
    session: watch::Receiver<SessionState>,
}

impl HttpGateway {
    pub fn new(config: &Config, session: watch::Receiver<SessionState>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            session,
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn bearer(&self) -> Option<String> {
        self.session
            .borrow()
            .credential()
            .map(|credential| credential.expose().to_string())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> std::result::Result<Response, ApiError> {
        let url = self.url(path);
        debug!(%method, %path, "API request");

        let mut builder = self.client.request(method, &url);
        if let Some(token) = self.bearer() {
            builder = builder.bearer_auth(token);
        }
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart { application, cv } => {
                builder.multipart(build_form(&application, cv)?)
            }
        };

        let response = builder.send().await.map_err(|e| {
            error!("API call to {} failed: {}", url, e);
            ApiError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = ApiError::from_response(status, body);
            error!("API call to {} failed: {}", url, err.message);
            return Err(err);
        }
        Ok(response)
    }
}

fn build_form(application: &JsonValue, cv: Option<CvAttachment>) -> std::result::Result<Form, ApiError> {
    let text = Part::text(serde_json::to_string(application)?).mime_str("application/json")?;
    let mut form = Form::new().part(APPLICATION_PART, text);
    if let Some(cv) = cv {
        let file = Part::bytes(cv.bytes.to_vec())
            .file_name(cv.file_name)
            .mime_str(&cv.content_type)?;
        form = form.part(CV_PART, file);
    }
    Ok(form)
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false)
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn call(&self, request: ApiRequest) -> std::result::Result<ApiResponse, ApiError> {
        let response = self.send(request.method, &request.path, request.body).await?;
        let json = is_json(&response);
        let text = response.text().await?;

        if !json {
            return Ok(ApiResponse::Text(text));
        }
        if text.trim().is_empty() {
            return Ok(ApiResponse::Json(JsonValue::Null));
        }
        Ok(ApiResponse::Json(serde_json::from_str(&text)?))
    }

    async fn download(&self, path: &str) -> std::result::Result<Bytes, ApiError> {
        let response = self.send(Method::GET, path, RequestBody::Empty).await?;
        Ok(response.bytes().await?)
    }
}
