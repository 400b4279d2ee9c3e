use axum::extract::multipart::{Field, Multipart, MultipartError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use edumarket::config::UploadConfig;
use edumarket::error::ServiceError;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

/// Accepted image types and the extension each is stored under.
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/avif", "avif"),
    ("image/bmp", "bmp"),
];

const UNTYPED: &str = "application/octet-stream";

#[derive(Debug, thiserror::Error)]
pub(crate) enum UploadError {
    #[error("malformed upload: {0}")]
    Multipart(#[from] MultipartError),
    #[error("No files uploaded")]
    Empty,
    #[error("Only image uploads are allowed")]
    NotAnImage,
    #[error("{0}")]
    Fields(String),
    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Rejected(#[from] ServiceError),
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let error = match self {
            UploadError::Rejected(err) => return err.into_response(),
            other => other,
        };
        let status = match &error {
            UploadError::Multipart(err) => err.status(),
            UploadError::Empty | UploadError::NotAnImage | UploadError::Fields(_) => {
                StatusCode::BAD_REQUEST
            }
            UploadError::Io(_) | UploadError::Rejected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = if status.is_server_error() {
            tracing::error!(%error, "upload write failed");
            "Upload failed".to_string()
        } else {
            error.to_string()
        };
        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}

/// Extension for an allowed image. A declared content type decides; the filename is consulted
/// only when the client sent none or a generic one.
pub(crate) fn image_extension(
    file_name: Option<&str>,
    content_type: Option<&str>,
) -> Option<&'static str> {
    let declared = content_type
        .and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| !value.is_empty() && value != UNTYPED);
    let essence = match declared {
        Some(declared) => declared,
        None => mime_guess::from_path(file_name?)
            .first()?
            .essence_str()
            .to_string(),
    };
    IMAGE_TYPES
        .iter()
        .find(|(mime, _)| *mime == essence)
        .map(|(_, extension)| *extension)
}

/// `<millis>-<random>.<ext>`
pub(crate) fn stored_name(extension: &str) -> String {
    let suffix = rand::thread_rng().gen_range(0..1_000_000_000u32);
    format!("{}-{suffix}.{extension}", Utc::now().timestamp_millis())
}

/// Public URL for a stored file. Uploads live under the public directory.
pub(crate) fn public_url(name: &str) -> String {
    format!("/public/uploads/{name}")
}

/// Files written while handling one request, removed again if the request fails.
struct Batch<'a> {
    dir: &'a Path,
    written: Vec<PathBuf>,
}

impl<'a> Batch<'a> {
    fn new(dir: &'a Path) -> Self {
        Self {
            dir,
            written: Vec::new(),
        }
    }

    async fn store(&mut self, field: Field<'_>) -> Result<String, UploadError> {
        let extension = image_extension(field.file_name(), field.content_type())
            .ok_or(UploadError::NotAnImage)?;
        let name = stored_name(extension);
        let bytes = field.bytes().await?;
        let path = self.dir.join(&name);
        tokio::fs::write(&path, &bytes).await?;
        self.written.push(path);
        tracing::info!(file = %name, size = bytes.len(), "upload stored");
        Ok(public_url(&name))
    }

    async fn discard(self) {
        for path in self.written {
            if let Err(err) = tokio::fs::remove_file(&path).await {
                tracing::warn!(path = %path.display(), error = %err, "could not remove upload");
            }
        }
    }
}

async fn collect_files(
    batch: &mut Batch<'_>,
    multipart: &mut Multipart,
) -> Result<Vec<String>, UploadError> {
    let mut urls = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.file_name().is_none() {
            continue;
        }
        urls.push(batch.store(field).await?);
    }
    if urls.is_empty() {
        return Err(UploadError::Empty);
    }
    Ok(urls)
}

/// Writes every file field to the upload directory and returns their public URLs. Nothing is
/// kept when any field is refused.
pub(crate) async fn store_all(
    config: &UploadConfig,
    mut multipart: Multipart,
) -> Result<Vec<String>, UploadError> {
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let mut batch = Batch::new(&config.upload_dir);
    match collect_files(&mut batch, &mut multipart).await {
        Ok(urls) => Ok(urls),
        Err(err) => {
            batch.discard().await;
            Err(err)
        }
    }
}

/// How a multipart form maps onto a JSON document.
pub(crate) struct FormShape<'a> {
    /// File fields as `(multipart name, document key, files kept)`. A field keeping one file
    /// becomes a URL string, otherwise an array of URLs.
    pub(crate) files: &'a [(&'a str, &'a str, usize)],
    /// Text fields carrying JSON (numbers, objects) instead of plain text. Unparsable values are
    /// dropped.
    pub(crate) typed: &'a [&'a str],
}

async fn collect_form(
    batch: &mut Batch<'_>,
    multipart: &mut Multipart,
    shape: &FormShape<'_>,
) -> Result<Map<String, Value>, UploadError> {
    let mut fields = Map::new();
    let mut files: Vec<(&str, Vec<Value>)> = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if field.file_name().is_some() {
            let Some((_, key, limit)) = shape.files.iter().find(|(file, _, _)| *file == name)
            else {
                continue;
            };
            let slot = match files.iter().position(|(existing, _)| existing == key) {
                Some(index) => index,
                None => {
                    files.push((key, Vec::new()));
                    files.len() - 1
                }
            };
            if files[slot].1.len() < *limit {
                let url = batch.store(field).await?;
                files[slot].1.push(Value::String(url));
            }
            continue;
        }

        let text = field.text().await?;
        if shape.typed.contains(&name.as_str()) {
            if let Ok(value) = serde_json::from_str::<Value>(&text) {
                fields.insert(name, value);
            }
        } else {
            fields.insert(name, Value::String(text));
        }
    }

    for (key, mut urls) in files {
        let single = shape
            .files
            .iter()
            .any(|(_, file_key, limit)| *file_key == key && *limit == 1);
        let value = match urls.pop() {
            Some(url) if single => url,
            Some(last) => {
                urls.push(last);
                Value::Array(urls)
            }
            None => continue,
        };
        fields.insert(key.to_string(), value);
    }
    Ok(fields)
}

/// Decodes a multipart form into `T`, storing its image fields on the way. Stored images are
/// removed again when the form is refused.
pub(crate) async fn decode_form<T: DeserializeOwned>(
    config: &UploadConfig,
    mut multipart: Multipart,
    shape: &FormShape<'_>,
) -> Result<T, UploadError> {
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let mut batch = Batch::new(&config.upload_dir);
    let decoded = match collect_form(&mut batch, &mut multipart, shape).await {
        Ok(fields) => serde_json::from_value(Value::Object(fields))
            .map_err(|err| UploadError::Fields(err.to_string())),
        Err(err) => Err(err),
    };
    if decoded.is_err() {
        batch.discard().await;
    }
    decoded
}

/// Removes a file stored by this module, given its public URL.
pub(crate) async fn remove(config: &UploadConfig, url: &str) {
    let Some(name) = url.strip_prefix("/public/uploads/") else {
        return;
    };
    Batch {
        dir: &config.upload_dir,
        written: vec![config.upload_dir.join(name)],
    }
    .discard()
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_carry_a_timestamp_and_the_image_extension() {
        let name = stored_name("jpg");
        let (millis, rest) = name.split_once('-').expect("timestamp prefix");
        assert!(millis.parse::<i64>().is_ok());
        assert!(rest.trim_end_matches(".jpg").parse::<u32>().is_ok());
    }

    #[test]
    fn declared_image_types_decide_the_extension() {
        assert_eq!(image_extension(Some("Campus Photo.JPG"), Some("image/jpeg")), Some("jpg"));
        assert_eq!(image_extension(Some("blob"), Some("image/png")), Some("png"));
        assert_eq!(image_extension(Some("page.html"), Some("image/png")), Some("png"));
    }

    #[test]
    fn untyped_files_fall_back_to_the_filename() {
        assert_eq!(image_extension(Some("logo.webp"), None), Some("webp"));
        assert_eq!(image_extension(Some("logo.gif"), Some(UNTYPED)), Some("gif"));
        assert_eq!(image_extension(Some("page.html"), Some(UNTYPED)), None);
        assert_eq!(image_extension(None, None), None);
    }

    #[test]
    fn markup_and_scripts_are_refused() {
        assert_eq!(image_extension(Some("x.svg"), Some("image/svg+xml")), None);
        assert_eq!(image_extension(Some("x.html"), Some("text/html")), None);
        assert_eq!(image_extension(Some("x.png"), Some("text/html; charset=utf-8")), None);
        assert_eq!(image_extension(Some("x.svg"), None), None);
    }

    #[test]
    fn urls_point_into_the_public_tree() {
        assert_eq!(public_url("1-2.png"), "/public/uploads/1-2.png");
    }
}
