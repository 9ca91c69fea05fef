use std::{collections::HashMap, str::FromStr};

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::header,
    Form,
};
use bytes::Bytes;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn is_chosen(&self) -> bool {
        !self.bytes.is_empty() && self.file_name.as_deref().is_some_and(|name| !name.trim().is_empty())
    }
}

#[derive(Debug, Default)]
pub struct UploadForm {
    files: HashMap<String, UploadedFile>,
    fields: HashMap<String, Vec<String>>,
}

#[async_trait]
impl<S> FromRequest<S> for UploadForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::validation(format!("Malformed form data: {}", e.body_text())))?;
            Self::read(multipart).await
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| AppError::validation(format!("Malformed form data: {}", e.body_text())))?;
            Ok(Self::from_pairs(pairs))
        } else {
            Ok(Self::default())
        }
    }
}

impl UploadForm {
    // A part with a file name is a file, everything else is text.
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::validation(format!("Malformed form data: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::validation(format!("Could not read {}: {}", name, e)))?;
                    form.files.insert(name, UploadedFile { file_name: Some(file_name), bytes });
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::validation(format!("Could not read {}: {}", name, e)))?;
                    form.fields.entry(name).or_default().push(text);
                }
            }
        }
        Ok(form)
    }

    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = UploadForm::default();
        for (name, value) in pairs {
            form.fields.entry(name).or_default().push(value);
        }
        form
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }

    pub fn chosen_file(&self, name: &str) -> Option<&UploadedFile> {
        self.file(name).filter(|file| file.is_chosen())
    }

    // First value of a text field, trimmed; blank counts as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn text_owned(&self, name: &str) -> Option<String> {
        self.text(name).map(str::to_string)
    }

    pub fn all(&self, name: &str) -> Vec<String> {
        self.fields
            .get(name)
            .map(|values| {
                values
                    .iter()
                    .map(|value| value.trim())
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    // Checkbox semantics: only the literal `true` is true.
    pub fn flag(&self, name: &str) -> bool {
        self.text(name) == Some("true")
    }

    pub fn parse_or<T: FromStr>(&self, name: &str, default: T) -> Result<T, AppError> {
        Ok(self.parse(name)?.unwrap_or(default))
    }

    pub fn parse<T: FromStr>(&self, name: &str) -> Result<Option<T>, AppError> {
        self.text(name)
            .map(|value| {
                value
                    .parse()
                    .map_err(|_| AppError::validation(format!("Invalid value for {}: {}", name, value)))
            })
            .transpose()
    }

    #[cfg(test)]
    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.fields.entry(name.to_string()).or_default().push(value.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use pretty_assertions::assert_eq;

    #[test]
    fn text_accessors() {
        let form = UploadForm::default()
            .with_field("prompt", "  a lamp  ")
            .with_field("sku", "")
            .with_field("pos", "upper_left")
            .with_field("pos", "bottom_right");

        assert_eq!(form.text("prompt"), Some("a lamp"));
        assert_eq!(form.text("sku"), None);
        assert_eq!(form.text("missing"), None);
        assert_eq!(form.all("pos"), vec!["upper_left", "bottom_right"]);
        assert!(form.file("prompt").is_none());
    }

    #[test]
    fn flags_and_numbers() {
        let form = UploadForm::default()
            .with_field("sync_mode", "true")
            .with_field("force_rmbg", "false")
            .with_field("seed", "42")
            .with_field("num_results", "many");

        assert!(form.flag("sync_mode"));
        assert!(!form.flag("force_rmbg"));
        assert!(!form.flag("content_moderation"));
        assert_eq!(form.parse_or("seed", 0i64).unwrap(), 42);
        assert_eq!(form.parse_or("offset_y", 15i64).unwrap(), 15);

        let err = form.parse_or("num_results", 1u32).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for num_results: many");
    }

    #[tokio::test]
    async fn reads_url_encoded_bodies() {
        let req = axum::http::Request::post("/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("prompt=a+desk+lamp&num_images=2&pos=a&pos=b"))
            .unwrap();
        let form = UploadForm::from_request(req, &()).await.unwrap();

        assert_eq!(form.text("prompt"), Some("a desk lamp"));
        assert_eq!(form.parse_or("num_images", 1u32).unwrap(), 2);
        assert_eq!(form.all("pos"), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn other_bodies_read_as_empty_form() {
        let req = axum::http::Request::post("/").body(Body::from("{}")).unwrap();
        let form = UploadForm::from_request(req, &()).await.unwrap();
        assert_eq!(form.text("prompt"), None);
    }
}
