use base64::Engine;
use reqwest::{multipart, Client, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, info};

use crate::models::{
    EraseParams, FillParams, GenerateParams, LifestyleParams, LifestyleScene, PackshotParams,
    ShadowParams,
};
use crate::storage::sniff_format;

#[derive(Debug, Error)]
pub enum BriaError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("invalid response: {0}")]
    Decode(String),
}

impl BriaError {
    // Bria rejects inputs that fail its moderation check with 422.
    pub fn is_content_moderation(&self) -> bool {
        matches!(self, BriaError::Status { status, .. } if *status == StatusCode::UNPROCESSABLE_ENTITY)
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn encode(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[derive(Serialize)]
struct ImageRequest<'a, P: Serialize> {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    mask_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mask_type: Option<&'static str>,
    #[serde(flatten)]
    params: &'a P,
}

impl<'a, P: Serialize> ImageRequest<'a, P> {
    fn new(image: &[u8], params: &'a P) -> Self {
        Self { file: encode(image), mask_file: None, mask_type: None, params }
    }

    fn with_mask(image: &[u8], mask: &[u8], params: &'a P) -> Self {
        Self {
            file: encode(image),
            mask_file: Some(encode(mask)),
            mask_type: Some("manual"),
            params,
        }
    }
}

pub struct BriaClient {
    client: Client,
    base_url: String,
}

impl BriaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: Client::new(), base_url: base_url.into() }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        api_key: &str,
        path: &str,
        body: &T,
    ) -> Result<Value, BriaError> {
        let url = self.endpoint(path);
        info!("🔗 POST {}", url);
        let response = self
            .client
            .post(&url)
            .header("api_token", api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| BriaError::Http(e.to_string()))?;
        read_json(path, response).await
    }

    async fn post_multipart(
        &self,
        api_key: &str,
        path: &str,
        form: multipart::Form,
    ) -> Result<Value, BriaError> {
        let url = self.endpoint(path);
        info!("🔗 POST {} (multipart)", url);
        let response = self
            .client
            .post(&url)
            .header("api_token", api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| BriaError::Http(e.to_string()))?;
        read_json(path, response).await
    }

    pub async fn generate_hd_image(
        &self,
        api_key: &str,
        params: &GenerateParams,
    ) -> Result<Value, BriaError> {
        info!(
            "🎨 Generating {} image(s), aspect {}: {}",
            params.num_results,
            params.aspect_ratio,
            truncate(&params.prompt, 100)
        );
        self.post_json(api_key, "text-to-image/hd/2.2", params).await
    }

    pub async fn enhance_prompt(&self, api_key: &str, prompt: &str) -> Result<Value, BriaError> {
        self.post_json(api_key, "prompt_enhancer", &json!({ "prompt": prompt })).await
    }

    pub async fn create_packshot(
        &self,
        api_key: &str,
        image: &[u8],
        params: &PackshotParams,
    ) -> Result<Value, BriaError> {
        let format = sniff_format(image);
        let file = multipart::Part::bytes(image.to_vec())
            .file_name(format!("product.{}", format.extensions_str()[0]))
            .mime_str(format.to_mime_type())
            .map_err(|e| BriaError::Http(e.to_string()))?;

        let mut form = multipart::Form::new()
            .part("file", file)
            .text("force_rmbg", params.force_rmbg.to_string())
            .text("content_moderation", params.content_moderation.to_string());
        if let Some(color) = &params.background_color {
            form = form.text("background_color", color.clone());
        }
        if let Some(sku) = &params.sku {
            form = form.text("sku", sku.clone());
        }
        self.post_multipart(api_key, "product/packshot", form).await
    }

    pub async fn add_shadow(
        &self,
        api_key: &str,
        image: &[u8],
        params: &ShadowParams,
    ) -> Result<Value, BriaError> {
        info!("🌓 Adding {} shadow", params.shadow_type);
        self.post_json(api_key, "product/shadow", &ImageRequest::new(image, params)).await
    }

    pub async fn generative_fill(
        &self,
        api_key: &str,
        image: &[u8],
        mask: &[u8],
        params: &FillParams,
    ) -> Result<Value, BriaError> {
        info!("🖌️ Generative fill (sync={}): {}", params.sync, truncate(&params.prompt, 100));
        self.post_json(api_key, "gen_fill", &ImageRequest::with_mask(image, mask, params)).await
    }

    pub async fn erase(
        &self,
        api_key: &str,
        image: &[u8],
        mask: &[u8],
        params: &EraseParams,
    ) -> Result<Value, BriaError> {
        self.post_json(api_key, "eraser", &ImageRequest::with_mask(image, mask, params)).await
    }

    pub async fn lifestyle_shot(
        &self,
        api_key: &str,
        image: &[u8],
        scene: &LifestyleScene,
        params: &LifestyleParams,
    ) -> Result<Value, BriaError> {
        let mut body = serde_json::to_value(ImageRequest::new(image, params))
            .map_err(|e| BriaError::Decode(e.to_string()))?;
        let (path, extra) = match scene {
            LifestyleScene::Text { scene_description, fast, optimize_description, exclude_elements } => {
                info!("🏞️ Lifestyle shot by text: {}", truncate(scene_description, 100));
                let mut extra = json!({
                    "scene_description": scene_description,
                    "fast": fast,
                    "optimize_description": optimize_description,
                });
                if let Some(exclude) = exclude_elements {
                    extra["exclude_elements"] = json!(exclude);
                }
                ("product/lifestyle_shot_by_text", extra)
            }
            LifestyleScene::Reference { image: reference, enhance_ref_image, ref_image_influence } => {
                info!("🏞️ Lifestyle shot by reference image ({} bytes)", reference.len());
                (
                    "product/lifestyle_shot_by_image",
                    json!({
                        "ref_image_file": encode(reference),
                        "enhance_ref_image": enhance_ref_image,
                        "ref_image_influence": ref_image_influence,
                    }),
                )
            }
        };
        if let (Some(map), Value::Object(extra)) = (body.as_object_mut(), extra) {
            map.extend(extra);
        }
        self.post_json(api_key, path, &body).await
    }
}

async fn read_json(path: &str, response: reqwest::Response) -> Result<Value, BriaError> {
    let status = response.status();
    info!("📥 {} -> {}", path, status);

    let text = response.text().await.map_err(|e| BriaError::Http(e.to_string()))?;
    if !status.is_success() {
        error!("❌ Bria error response from {}: {}", path, truncate(&text, 500));
        return Err(BriaError::Status { status, body: text });
    }

    serde_json::from_str(&text)
        .map_err(|e| BriaError::Decode(format!("{}: {}", e, truncate(&text, 200))))
}
