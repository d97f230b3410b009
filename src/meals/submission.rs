use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    Form,
};
use serde_json::Value;

use super::dto::AnalyzeMealRequest;
use crate::{
    ai::prompts::ImageUpload,
    error::{body_error, ApiError},
};

const DEFAULT_LANG: &str = "pt";
const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// A meal description taken from a JSON, multipart or urlencoded body.
#[derive(Debug, Clone)]
pub struct MealSubmission {
    pub lang: String,
    pub text: String,
    pub image: Option<ImageUpload>,
}

impl MealSubmission {
    fn new(lang: Option<String>, text: Option<String>, image: Option<ImageUpload>) -> Self {
        let lang = lang
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LANG.into());
        Self {
            lang,
            text: text.unwrap_or_default(),
            image,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.image.is_none()
    }
}

#[async_trait]
impl<S> FromRequest<S> for MealSubmission
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| body_error(e.status(), e.body_text()))?;
            return from_multipart(multipart).await;
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let fields = match Form::<AnalyzeMealRequest>::from_request(req, state).await {
                Ok(Form(fields)) => fields,
                Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                    return Err(ApiError::PayloadTooLarge)
                }
                Err(_) => AnalyzeMealRequest::default(),
            };
            return Ok(Self::new(fields.lang, fields.text, None));
        }

        if is_json(&content_type) {
            let body = Bytes::from_request(req, state)
                .await
                .map_err(|e| body_error(e.status(), e.body_text()))?;
            return Ok(from_json(&body));
        }

        Ok(Self::new(None, None, None))
    }
}

fn is_json(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    essence == "application/json" || essence.ends_with("+json")
}

/// Unparseable JSON, or fields of the wrong type, count as absent.
fn from_json(body: &[u8]) -> MealSubmission {
    let value: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    let field = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_string);
    MealSubmission::new(field("lang"), field("text"), None)
}

async fn from_multipart(mut multipart: Multipart) -> Result<MealSubmission, ApiError> {
    let mut lang = None;
    let mut text = None;
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| body_error(e.status(), e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("lang") => lang = Some(read_text(field).await?),
            Some("text") => text = Some(read_text(field).await?),
            Some("image") => {
                let mime = field
                    .content_type()
                    .map(str::to_string)
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| DEFAULT_IMAGE_MIME.into());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| body_error(e.status(), e.body_text()))?;
                // Browsers send an empty part when no file was picked.
                if !bytes.is_empty() {
                    image = Some(ImageUpload { bytes, mime });
                }
            }
            _ => {}
        }
    }

    Ok(MealSubmission::new(lang, text, image))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| body_error(e.status(), e.body_text()))
}
