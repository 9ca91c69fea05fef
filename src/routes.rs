use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::{
    error::{AppError, Reported},
    form::{UploadForm, UploadedFile},
    models::{
        Ack, EnhancePromptRequest, EnhancedPromptResponse, EraseParams, FillParams,
        GenerateParams, ImageUrlResponse, ImagesResponse, LifestyleParams, LifestyleScene, Medium,
        PackshotParams, PlacementType, SetApiKeyRequest, ShadowParams,
    },
    normalize::{extract_enhanced_prompt, extract_urls},
    session::{session_layer, Session},
    state::AppState,
    storage::{ArtifactFolder, STATIC_PREFIX},
};

const NO_RESULT_URL: &str =
    "No valid result URL found in the API response or API returned an unexpected format.";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/set_api_key", post(set_api_key))
        .route("/generate_image", post(generate_image))
        .route("/enhance_prompt", post(enhance_prompt))
        .route("/create_packshot", post(create_packshot))
        .route("/add_shadow", post(add_shadow))
        .route("/lifestyle_shot", post(lifestyle_shot))
        .route("/generative_fill", post(generative_fill))
        .route("/erase_elements", post(erase_elements))
        .route_layer(middleware::from_fn_with_state(state.clone(), session_layer))
        .nest_service(STATIC_PREFIX, ServeDir::new(state.artifacts.root()))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

// --- helpers ---

async fn mirror(state: &AppState, urls: &[String]) -> Result<Vec<String>, AppError> {
    let mut local = Vec::with_capacity(urls.len());
    for url in urls {
        local.push(state.artifacts.materialize_from_url(url, ArtifactFolder::Generated).await?);
    }
    Ok(local)
}

// Async Bria jobs hand back URLs that are not populated yet; those are
// passed through for the page to poll instead of being mirrored.
async fn mirror_if_ready(state: &AppState, urls: Vec<String>, sync: bool) -> Result<Vec<String>, AppError> {
    if sync {
        mirror(state, &urls).await
    } else {
        info!("⏳ Returning {} pending remote URL(s)", urls.len());
        Ok(urls)
    }
}

async fn keep_upload(state: &AppState, file: &UploadedFile) -> Result<(), AppError> {
    if state.keep_uploads {
        state.artifacts.materialize(&file.bytes, ArtifactFolder::Uploads, None).await?;
    }
    Ok(())
}

fn first_url(response: &serde_json::Value, message: &'static str) -> Result<String, AppError> {
    extract_urls(response).into_iter().next().ok_or(AppError::NoResult(message))
}

fn image_and_mask(form: &UploadForm) -> Result<(&UploadedFile, &UploadedFile), AppError> {
    match (form.chosen_file("original_image"), form.chosen_file("mask_image")) {
        (Some(image), Some(mask)) => Ok((image, mask)),
        _ => Err(AppError::validation("Original image and mask image are required.")),
    }
}

// --- handlers ---

// Every visit to the home page starts over with a fresh session.
pub async fn index(State(state): State<AppState>, mut session: Session) -> Response {
    session.reset();
    match state.pages.render_index(&session.state) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, "rendering index page failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "page unavailable").into_response()
        }
    }
}

pub async fn set_api_key(mut session: Session, body: Option<Json<SetApiKeyRequest>>) -> Json<Ack> {
    session.state.api_key = body.and_then(|Json(body)| body.api_key);
    session.commit();
    info!("🔑 API key updated for session");
    Json(Ack { success: true })
}

pub async fn generate_image(
    State(state): State<AppState>,
    mut session: Session,
    form: Result<UploadForm, AppError>,
) -> Result<Json<ImagesResponse>, Reported> {
    let api_key = session.state.api_key()?;
    let form = form?;

    let prompt = session
        .state
        .effective_prompt(form.text("prompt"))
        .ok_or_else(|| AppError::validation("Please enter a prompt."))?;

    let params = GenerateParams {
        prompt,
        num_results: form.parse_or("num_images", 1)?,
        aspect_ratio: form.text("aspect_ratio").unwrap_or("1:1").to_string(),
        sync: true,
        enhance_image: form.flag("enhance_img"),
        medium: Medium::from_style(form.text("style").unwrap_or("Realistic")),
        prompt_enhancement: false,
        content_moderation: true,
    };

    let response = state.bria.generate_hd_image(&api_key, &params).await?;
    let urls = extract_urls(&response);
    if urls.is_empty() {
        return Err(AppError::NoResult("No valid result format found in the API response.").into());
    }
    info!("✅ Bria returned {} image(s)", urls.len());

    let images = mirror(&state, &urls).await?;
    session.state.record_results(&images);
    session.commit();
    Ok(Json(ImagesResponse { success: true, images }))
}

pub async fn enhance_prompt(
    State(state): State<AppState>,
    mut session: Session,
    body: Option<Json<EnhancePromptRequest>>,
) -> Result<Json<EnhancedPromptResponse>, Reported> {
    let api_key = session.state.api_key()?;
    let prompt = body
        .and_then(|Json(body)| body.prompt)
        .map(|prompt| prompt.trim().to_string())
        .filter(|prompt| !prompt.is_empty())
        .ok_or_else(|| AppError::validation("Please enter a prompt to enhance."))?;

    let response = state.bria.enhance_prompt(&api_key, &prompt).await?;
    let enhanced = extract_enhanced_prompt(&response).ok_or(AppError::NoResult("Failed to enhance prompt."))?;

    session.state.original_prompt = prompt;
    session.state.enhanced_prompt = Some(enhanced.clone());
    session.commit();
    Ok(Json(EnhancedPromptResponse { success: true, enhanced_prompt: enhanced }))
}

pub async fn create_packshot(
    State(state): State<AppState>,
    mut session: Session,
    form: Result<UploadForm, AppError>,
) -> Result<Json<ImageUrlResponse>, Reported> {
    let api_key = session.state.api_key()?;
    let form = form?;

    let product = form
        .file("product_image")
        .ok_or_else(|| AppError::validation("No product image uploaded."))?;
    if !product.is_chosen() {
        return Err(AppError::validation("No selected file.").into());
    }
    keep_upload(&state, product).await?;

    let params = PackshotParams {
        background_color: form.text_owned("bg_color"),
        sku: form.text_owned("sku"),
        force_rmbg: form.flag("force_rmbg"),
        content_moderation: form.flag("content_moderation"),
    };

    let response = state.bria.create_packshot(&api_key, &product.bytes, &params).await?;
    let remote = first_url(&response, "No result URL in the API response.")?;
    let image_url = state.artifacts.materialize_from_url(&remote, ArtifactFolder::Generated).await?;

    session.state.set_current_image(&image_url);
    session.commit();
    Ok(Json(ImageUrlResponse { success: true, image_url }))
}

pub async fn add_shadow(
    State(state): State<AppState>,
    mut session: Session,
    form: Result<UploadForm, AppError>,
) -> Result<Json<ImageUrlResponse>, AppError> {
    let api_key = session.state.api_key()?;
    let form = form?;

    let product = form
        .chosen_file("product_image")
        .ok_or_else(|| AppError::validation("Product image is required."))?;
    keep_upload(&state, product).await?;

    let shadow_type = form.text("shadow_type").unwrap_or("Natural");
    let is_float = shadow_type.eq_ignore_ascii_case("float");
    let params = ShadowParams {
        shadow_type: shadow_type.to_lowercase(),
        background_color: if form.flag("use_transparent_bg") {
            None
        } else {
            form.text_owned("bg_color")
        },
        shadow_color: form.text_owned("shadow_color"),
        shadow_offset: [form.parse_or("offset_x", 0)?, form.parse_or("offset_y", 15)?],
        shadow_intensity: form.parse_or("shadow_intensity", 60)?,
        shadow_blur: form.parse_or("shadow_blur", 20)?,
        shadow_width: if is_float { Some(form.parse_or("shadow_width", 0)?) } else { None },
        shadow_height: if is_float { Some(form.parse_or("shadow_height", 70)?) } else { None },
        sku: form.text_owned("sku"),
        force_rmbg: form.flag("force_rmbg"),
        content_moderation: form.flag("content_moderation"),
    };

    let response = state.bria.add_shadow(&api_key, &product.bytes, &params).await?;
    let remote = first_url(&response, NO_RESULT_URL)?;
    let image_url = state.artifacts.materialize_from_url(&remote, ArtifactFolder::Generated).await?;

    session.state.set_current_image(&image_url);
    session.commit();
    Ok(Json(ImageUrlResponse { success: true, image_url }))
}

pub async fn lifestyle_shot(
    State(state): State<AppState>,
    mut session: Session,
    form: Result<UploadForm, AppError>,
) -> Result<Json<ImagesResponse>, Reported> {
    let api_key = session.state.api_key()?;
    let form = form?;

    let product = form
        .chosen_file("product_image")
        .ok_or_else(|| AppError::validation("Please upload a product image first."))?;
    keep_upload(&state, product).await?;

    let scene = match form.text("shot_type").unwrap_or("Text Prompt") {
        "Reference Image" => {
            let reference = form.chosen_file("reference_image").ok_or_else(|| {
                AppError::validation("Please upload a reference image for the lifestyle shot.")
            })?;
            LifestyleScene::Reference {
                image: reference.bytes.clone(),
                enhance_ref_image: form.flag("enhance_ref"),
                ref_image_influence: form.parse_or("ref_influence", 1.0)?,
            }
        }
        _ => {
            let scene_description = form.text_owned("scene_description").ok_or_else(|| {
                AppError::validation("Please describe the environment for the lifestyle shot.")
            })?;
            let fast = form.flag("fast_mode");
            LifestyleScene::Text {
                scene_description,
                fast,
                optimize_description: form.flag("optimize_desc"),
                exclude_elements: if fast { None } else { form.text_owned("exclude_elements") },
            }
        }
    };

    let placement_type = match form.text("placement_type") {
        Some(label) => PlacementType::from_label(label)
            .ok_or_else(|| AppError::validation(format!("Unknown placement type: {}", label)))?,
        None => PlacementType::default(),
    };

    let mut params = LifestyleParams {
        placement_type,
        num_results: form.parse_or("num_results", 4)?,
        sync: form.flag("sync_mode"),
        original_quality: form.flag("original_quality"),
        shot_size: match (form.parse("shot_width")?, form.parse("shot_height")?) {
            (Some(width), Some(height)) => Some([width, height]),
            _ => None,
        },
        sku: form.text_owned("sku"),
        force_rmbg: form.flag("force_rmbg"),
        content_moderation: form.flag("content_moderation"),
        ..Default::default()
    };
    match placement_type {
        PlacementType::ManualPlacement => {
            params.manual_placement_selection = form.all("manual_placements[]");
            if params.manual_placement_selection.is_empty() {
                return Err(AppError::validation("Please select at least one placement position.").into());
            }
        }
        PlacementType::ManualPadding => {
            params.padding_values = Some([
                form.parse_or("pad_left", 0)?,
                form.parse_or("pad_right", 0)?,
                form.parse_or("pad_top", 0)?,
                form.parse_or("pad_bottom", 0)?,
            ]);
        }
        PlacementType::CustomCoordinates => {
            params.foreground_image_size =
                Some([form.parse_or("fg_width", 500)?, form.parse_or("fg_height", 500)?]);
            params.foreground_image_location =
                Some([form.parse_or("fg_x", 0)?, form.parse_or("fg_y", 0)?]);
        }
        PlacementType::Original | PlacementType::Automatic => {}
    }

    let response = state.bria.lifestyle_shot(&api_key, &product.bytes, &scene, &params).await?;
    let urls = extract_urls(&response);
    if urls.is_empty() {
        return Err(AppError::NoResult(NO_RESULT_URL).into());
    }

    let images = mirror_if_ready(&state, urls, params.sync).await?;
    session.state.record_results(&images);
    session.commit();
    Ok(Json(ImagesResponse { success: true, images }))
}

pub async fn generative_fill(
    State(state): State<AppState>,
    mut session: Session,
    form: Result<UploadForm, AppError>,
) -> Result<Json<ImagesResponse>, AppError> {
    let api_key = session.state.api_key()?;
    let form = form?;

    let (image, mask) = image_and_mask(&form)?;
    let prompt = form
        .text_owned("prompt")
        .ok_or_else(|| AppError::validation("Please enter a prompt for Generative Fill."))?;
    keep_upload(&state, image).await?;

    let seed: i64 = form.parse_or("seed", 0)?;
    let params = FillParams {
        prompt,
        negative_prompt: form.text_owned("negative_prompt"),
        num_results: form.parse_or("num_results", 1)?,
        sync: form.flag("sync_mode"),
        seed: (seed != 0).then_some(seed),
        content_moderation: form.flag("content_moderation"),
    };

    let response = state.bria.generative_fill(&api_key, &image.bytes, &mask.bytes, &params).await?;
    let urls = extract_urls(&response);
    if urls.is_empty() {
        return Err(AppError::NoResult(NO_RESULT_URL));
    }

    let images = mirror_if_ready(&state, urls, params.sync).await?;
    session.state.record_results(&images);
    session.commit();
    Ok(Json(ImagesResponse { success: true, images }))
}

pub async fn erase_elements(
    State(state): State<AppState>,
    mut session: Session,
    form: Result<UploadForm, AppError>,
) -> Result<Json<ImageUrlResponse>, AppError> {
    let api_key = session.state.api_key()?;
    let form = form?;

    let (image, mask) = image_and_mask(&form)?;
    keep_upload(&state, image).await?;

    let params = EraseParams { content_moderation: form.flag("content_moderation") };
    let response = state.bria.erase(&api_key, &image.bytes, &mask.bytes, &params).await?;
    let remote = first_url(&response, NO_RESULT_URL)?;
    let image_url = state.artifacts.materialize_from_url(&remote, ArtifactFolder::Generated).await?;

    session.state.set_current_image(&image_url);
    session.commit();
    Ok(Json(ImageUrlResponse { success: true, image_url }))
}
