//! REST adapter for the page persistence API.
//!
//! # Responsibility
//! - Map `PageStore` calls onto `/pages` HTTP endpoints.
//! - Attach the session bearer credential to every request.
//! - Classify HTTP failures into `StoreError` kinds.
//!
//! # Invariants
//! - HTTP 401 and 403 always map to `StoreError::Unauthorized`.
//! - Request and response bodies are never logged.

use crate::config::EditorConfig;
use crate::model::page::{NewPage, PageId, PageRecord, PageUpdate};
use crate::session::Session;
use crate::sync::page_store::{PageStore, StoreError, StoreResult};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use web_time::Instant;

const FALLBACK_ERROR_MESSAGE: &str = "request failed";

#[derive(Debug, Deserialize)]
struct CreatedPage {
    id: PageId,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Blocking HTTP implementation of [`PageStore`].
pub struct HttpPageStore {
    agent: ureq::Agent,
    base_url: String,
    session: Session,
}

impl HttpPageStore {
    pub fn new(base_url: impl Into<String>, session: Session, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn from_config(config: &EditorConfig, session: Session) -> Self {
        Self::new(
            config.api_base_url.as_str(),
            session,
            Duration::from_millis(config.request_timeout_ms),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send(&self, method: &str, path: &str, body: Option<String>) -> StoreResult<String> {
        let started_at = Instant::now();
        let mut request = self
            .agent
            .request(method, &self.endpoint(path))
            .set("Content-Type", "application/json");
        if let Some(header) = self.session.authorization_header() {
            request = request.set("Authorization", &header);
        }

        let result = match body {
            Some(body) => request.send_string(&body),
            None => request.call(),
        };

        match result {
            Ok(response) => {
                debug!(
                    "event=http_request module=http_store status=ok method={} path={} duration_ms={}",
                    method,
                    path,
                    started_at.elapsed().as_millis()
                );
                response
                    .into_string()
                    .map_err(|err| StoreError::network(err.to_string()))
            }
            Err(ureq::Error::Status(code, response)) => {
                let body = response.into_string().unwrap_or_default();
                let error = classify_status(code, &body);
                warn!(
                    "event=http_request module=http_store status=error method={} path={} http_status={} error_code={} duration_ms={}",
                    method,
                    path,
                    code,
                    error.code(),
                    started_at.elapsed().as_millis()
                );
                Err(error)
            }
            Err(ureq::Error::Transport(transport)) => {
                warn!(
                    "event=http_request module=http_store status=error method={} path={} error_code=network duration_ms={}",
                    method,
                    path,
                    started_at.elapsed().as_millis()
                );
                Err(StoreError::network(transport.to_string()))
            }
        }
    }
}

impl PageStore for HttpPageStore {
    fn list_pages(&self) -> StoreResult<Vec<PageRecord>> {
        let body = self.send("GET", "/pages", None)?;
        parse_json(&body)
    }

    fn create_page(&self, page: &NewPage) -> StoreResult<PageId> {
        let body = self.send("POST", "/pages", Some(to_json(page)?))?;
        let created: CreatedPage = parse_json(&body)?;
        Ok(created.id)
    }

    fn update_page(&self, id: PageId, update: &PageUpdate) -> StoreResult<()> {
        self.send("PUT", &format!("/pages?id={id}"), Some(to_json(update)?))?;
        Ok(())
    }

    fn delete_page(&self, id: PageId) -> StoreResult<()> {
        self.send("DELETE", &format!("/pages?id={id}"), None)?;
        Ok(())
    }
}

/// Maps a non-success HTTP status and its body to a store error.
pub(crate) fn classify_status(status: u16, body: &str) -> StoreError {
    if status == 401 || status == 403 {
        return StoreError::Unauthorized;
    }
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string());
    StoreError::server(status, message)
}

fn parse_json<T: DeserializeOwned>(body: &str) -> StoreResult<T> {
    serde_json::from_str(body).map_err(|err| StoreError::InvalidResponse(err.to_string()))
}

fn to_json<T: serde::Serialize>(value: &T) -> StoreResult<String> {
    serde_json::to_string(value).map_err(|err| StoreError::InvalidResponse(err.to_string()))
}
