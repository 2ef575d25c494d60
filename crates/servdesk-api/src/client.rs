// REST collection client
//
// Wraps `reqwest::Client` with collection URL construction, `{ data }`
// envelope unwrapping, and uniform non-2xx handling. The backend is
// treated as a set of conventional collection resources:
//
//   GET    /{collection}?{query}
//   POST   /{collection}              (JSON, or multipart with files)
//   PUT    /{collection}/{id}
//   PATCH  /{collection}/{id}/status
//   DELETE /{collection}/{id}

use std::fmt::Display;

use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{Attachment, DataEnvelope, DeleteResponse, ErrorBody, ListPage};
use crate::transport::TransportConfig;

/// Async client for the back-office REST API.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RestClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client from a base URL and transport config.
    ///
    /// The base URL may carry a path prefix (e.g. `https://host/api/v1`);
    /// collection paths are appended to it.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(base_url, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn with_client(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Ensure the base URL ends in `/` so relative joins keep its path.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/{collection}`
    pub fn collection_url(&self, collection: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(collection.trim_matches('/'))?)
    }

    /// `{base}/{collection}/{id}{suffix}`
    fn item_url(&self, collection: &str, id: &impl Display, suffix: &str) -> Result<Url, Error> {
        let collection = collection.trim_matches('/');
        Ok(self.base_url.join(&format!("{collection}/{id}{suffix}"))?)
    }

    // ── Collection operations ────────────────────────────────────────

    /// `GET /{collection}?{params}`
    ///
    /// Params are sent exactly as given; omitting empty filters is the
    /// caller's job.
    pub async fn list<T: DeserializeOwned>(
        &self,
        collection: &str,
        params: &[(String, String)],
    ) -> Result<ListPage<T>, Error> {
        let url = self.collection_url(collection)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        let envelope: DataEnvelope<ListPage<T>> = handle_response(resp).await?;
        Ok(envelope.data)
    }

    /// `POST /{collection}`
    ///
    /// Sent as JSON when there are no attachments. With attachments the
    /// body is flattened into text parts and each file becomes its own part.
    pub async fn create<T, B>(
        &self,
        collection: &str,
        body: &B,
        attachments: &[Attachment],
    ) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + Sync,
    {
        let url = self.collection_url(collection)?;

        let request = if attachments.is_empty() {
            debug!("POST {url}");
            self.http.post(url).json(body)
        } else {
            debug!("POST {url} (multipart, {} files)", attachments.len());
            self.http
                .post(url)
                .multipart(multipart_form(body, attachments)?)
        };

        let resp = request.send().await?;
        let envelope: DataEnvelope<T> = handle_response(resp).await?;
        Ok(envelope.data)
    }

    /// `PUT /{collection}/{id}`
    pub async fn update<T, B>(&self, collection: &str, id: &impl Display, body: &B) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + Sync,
    {
        let url = self.item_url(collection, id, "")?;
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        let envelope: DataEnvelope<T> = handle_response(resp).await?;
        Ok(envelope.data)
    }

    /// `PATCH /{collection}/{id}/status`
    ///
    /// The backend accepts an empty body and flips the flag itself;
    /// a body pins the new value explicitly.
    pub async fn patch_status<T>(
        &self,
        collection: &str,
        id: &impl Display,
        body: Option<&serde_json::Value>,
    ) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let url = self.item_url(collection, id, "/status")?;
        debug!("PATCH {url}");

        let mut request = self.http.patch(url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let resp = request.send().await?;
        let envelope: DataEnvelope<T> = handle_response(resp).await?;
        Ok(envelope.data)
    }

    /// `DELETE /{collection}/{id}`
    ///
    /// An empty 2xx body is treated as success.
    pub async fn delete(&self, collection: &str, id: &impl Display) -> Result<DeleteResponse, Error> {
        let url = self.item_url(collection, id, "")?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(parse_error(status, resp).await);
        }

        // A 2xx with an empty or non-JSON body still deleted the row.
        let body = resp.text().await?;
        match serde_json::from_str::<DeleteResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                if !body.trim().is_empty() {
                    debug!("DELETE body not understood, treating as success: {e}");
                }
                Ok(DeleteResponse::default())
            }
        }
    }
}

// ── Response handling ────────────────────────────────────────────────

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    if status.is_success() {
        let body = resp.text().await?;
        decode(&body)
    } else {
        Err(parse_error(status, resp).await)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    })
}

/// Any non-2xx is a failure. The message comes from `body.message` when
/// the backend sent JSON with one; otherwise it stays empty and the
/// caller picks a fallback.
async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
    let raw = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&raw)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty());

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Error::Authentication {
            message: message.unwrap_or_else(|| "session expired or invalid token".into()),
        };
    }

    Error::Api {
        status: status.as_u16(),
        message,
    }
}

/// Flatten a JSON object body into text parts and append one file part
/// per attachment. Nested values are sent as their JSON text.
fn multipart_form<B: Serialize>(body: &B, attachments: &[Attachment]) -> Result<Form, Error> {
    let value = serde_json::to_value(body).map_err(|e| Error::Encoding(e.to_string()))?;
    let serde_json::Value::Object(fields) = value else {
        return Err(Error::Encoding(
            "multipart body must serialize to a JSON object".into(),
        ));
    };

    let mut form = Form::new();
    for (key, value) in fields {
        let text = match value {
            serde_json::Value::Null => continue,
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        form = form.text(key, text);
    }

    for file in attachments {
        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime)
            .map_err(|e| Error::Encoding(format!("invalid MIME type {:?}: {e}", file.mime)))?;
        form = form.part(file.field.clone(), part);
    }

    Ok(form)
}
