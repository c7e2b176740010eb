use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart::{Form, Part}, Client, Url};
use thiserror::Error;
use tracing::{info, error};

use crate::models::{ClothingItem, Size};

pub const PERSON_FIELD: &str = "person_image";
pub const SIZE_FIELD: &str = "size";
pub const CLOTHING_FIELD: &str = "clothing_images";

#[derive(Debug, Error)]
pub enum TryOnError {
    #[error("could not load {name}: {reason}")] Asset { name: String, reason: String },
    #[error("network error: {0}")] Transport(String),
    /// Message reported by the try-on service, shown verbatim.
    #[error("{0}")] Service(String),
    #[error("invalid response from try-on service: {0}")] InvalidResponse(String),
    #[error("could not build request: {0}")] Request(String),
}

/// One file part of the multipart submission.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub filename: String,
    pub mime: String,
    pub bytes: Bytes,
}

/// The assembled submission, in the order it is sent.
#[derive(Debug, Clone)]
pub struct SubmissionForm {
    pub person: FilePart,
    pub size: Size,
    pub clothing: Vec<FilePart>,
}

impl SubmissionForm {
    pub fn into_multipart(self) -> Result<Form, TryOnError> {
        let mut form = Form::new()
            .part(PERSON_FIELD, file_part(self.person)?)
            .text(SIZE_FIELD, self.size.code().to_string());
        for part in self.clothing {
            form = form.part(CLOTHING_FIELD, file_part(part)?);
        }
        Ok(form)
    }
}

fn file_part(part: FilePart) -> Result<Part, TryOnError> {
    Part::bytes(part.bytes.to_vec())
        .file_name(part.filename)
        .mime_str(&part.mime)
        .map_err(|e| TryOnError::Request(format!("bad mime type: {e}")))
}

/// Raw reply of the synthesis call; interpreting it is the caller's job.
#[derive(Debug, Clone)]
pub struct BackendReply {
    pub status: u16,
    pub body: Bytes,
}

impl BackendReply {
    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }
}

#[async_trait]
pub trait TryOnBackend: Send + Sync {
    /// Downloads the binary content behind a catalog item's `src`.
    async fn fetch_asset(&self, item: &ClothingItem) -> Result<FilePart, TryOnError>;

    /// Sends the one multipart POST of a submission.
    async fn submit(&self, form: SubmissionForm) -> Result<BackendReply, TryOnError>;
}

pub struct HttpBackend {
    client: Client,
    endpoint: Url,
    asset_base: Url,
}

impl HttpBackend {
    pub fn new(endpoint: Url, asset_base: Url) -> Self {
        Self { client: Client::new(), endpoint, asset_base }
    }
}

#[async_trait]
impl TryOnBackend for HttpBackend {
    async fn fetch_asset(&self, item: &ClothingItem) -> Result<FilePart, TryOnError> {
        let asset_err = |reason: String| TryOnError::Asset { name: item.name.clone(), reason };
        let url = self.asset_base
            .join(&item.src)
            .map_err(|e| asset_err(format!("bad source '{}': {}", item.src, e)))?;

        info!("📥 Fetching clothing asset {} from {}", item.id, url);
        let response = self.client.get(url).send().await.map_err(|e| asset_err(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            error!("❌ Asset {} returned status {}", item.id, status);
            return Err(asset_err(format!("status {status}")));
        }
        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response.bytes().await.map_err(|e| asset_err(e.to_string()))?;
        Ok(FilePart { filename: item.name.clone(), mime, bytes })
    }

    async fn submit(&self, form: SubmissionForm) -> Result<BackendReply, TryOnError> {
        info!(
            "🔗 Posting try-on request to {} ({} clothing images, size {})",
            self.endpoint, form.clothing.len(), form.size
        );
        let response = self.client
            .post(self.endpoint.clone())
            .multipart(form.into_multipart()?)
            .send()
            .await
            .map_err(|e| TryOnError::Transport(e.to_string()))?;

        let status = response.status();
        info!("📥 Response status: {}", status);
        let body = response.bytes().await.map_err(|e| TryOnError::Transport(e.to_string()))?;
        Ok(BackendReply { status: status.as_u16(), body })
    }
}

/// Shortens `data:` URLs and other long strings for log lines.
pub fn preview(s: &str) -> String {
    if s.len() > 50 {
        let mut cut = 50;
        while !s.is_char_boundary(cut) { cut -= 1; }
        format!("{}...[{} chars total]", &s[..cut], s.len())
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Multipart, http::StatusCode, routing::{get, post}, Json, Router};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    async fn spawn(app: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        Url::parse(&format!("http://{addr}/")).unwrap()
    }

    async fn echo_form(mut multipart: Multipart) -> Json<Value> {
        let mut fields = Vec::new();
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            let file = field.file_name().map(str::to_string);
            let data = field.bytes().await.unwrap();
            fields.push(json!({ "name": name, "file": file, "data": String::from_utf8_lossy(&data) }));
        }
        Json(json!({ "fields": fields }))
    }

    fn part(name: &str, data: &'static [u8]) -> FilePart {
        FilePart { filename: name.into(), mime: "image/png".into(), bytes: Bytes::from_static(data) }
    }

    #[tokio::test]
    async fn submit_sends_fields_in_order() {
        let base = spawn(Router::new().route("/api/swap-clothing", post(echo_form))).await;
        let backend = HttpBackend::new(base.join("/api/swap-clothing").unwrap(), base.clone());

        let reply = backend
            .submit(SubmissionForm {
                person: part("me.png", b"person"),
                size: Size::L,
                clothing: vec![part("Navy Blazer", b"one"), part("Grey Hoodie", b"two")],
            })
            .await
            .unwrap();

        assert!(reply.is_success());
        let body: Value = serde_json::from_slice(&reply.body).unwrap();
        assert_eq!(
            body["fields"],
            json!([
                { "name": "person_image", "file": "me.png", "data": "person" },
                { "name": "size", "file": null, "data": "L" },
                { "name": "clothing_images", "file": "Navy Blazer", "data": "one" },
                { "name": "clothing_images", "file": "Grey Hoodie", "data": "two" },
            ])
        );
    }

    #[tokio::test]
    async fn fetch_asset_resolves_relative_sources() {
        let app = Router::new()
            .route("/clothes/shirt1.jpg", get(|| async { ([("content-type", "image/jpeg")], "jpegbytes") }))
            .route("/clothes/gone.jpg", get(|| async { StatusCode::NOT_FOUND }));
        let base = spawn(app).await;
        let backend = HttpBackend::new(base.join("/api/swap-clothing").unwrap(), base);

        let shirt = ClothingItem { id: "shirt1".into(), name: "Oxford".into(), src: "/clothes/shirt1.jpg".into() };
        let fetched = backend.fetch_asset(&shirt).await.unwrap();
        assert_eq!(fetched.filename, "Oxford");
        assert_eq!(fetched.mime, "image/jpeg");
        assert_eq!(fetched.bytes, Bytes::from_static(b"jpegbytes"));

        let gone = ClothingItem { id: "gone".into(), name: "Gone".into(), src: "/clothes/gone.jpg".into() };
        let err = backend.fetch_asset(&gone).await.unwrap_err();
        assert!(matches!(err, TryOnError::Asset { ref name, .. } if name == "Gone"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let base = Url::parse(&format!("http://{addr}/")).unwrap();
        let backend = HttpBackend::new(base.join("/api/swap-clothing").unwrap(), base);

        let err = backend
            .submit(SubmissionForm { person: part("me.png", b"p"), size: Size::M, clothing: vec![] })
            .await
            .unwrap_err();
        assert!(matches!(err, TryOnError::Transport(_)));
    }

    #[test]
    fn preview_truncates_long_strings() {
        assert_eq!(preview("short"), "short");
        let long = "x".repeat(120);
        assert_eq!(preview(&long), format!("{}...[120 chars total]", "x".repeat(50)));
    }
}
