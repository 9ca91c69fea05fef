use serde::{Deserialize, Serialize};

// --- Browser-facing payloads ---

#[derive(Debug, Deserialize, Clone)]
pub struct SetApiKeyRequest {
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EnhancePromptRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Ack {
    pub success: bool,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ImagesResponse {
    pub success: bool,
    pub images: Vec<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ImageUrlResponse {
    pub success: bool,
    pub image_url: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct EnhancedPromptResponse {
    pub success: bool,
    pub enhanced_prompt: String,
}

// --- Bria request bodies ---
//
// Field names follow the Bria v1 REST contract. Optional fields are left out
// of the body entirely rather than sent as null.

#[derive(Debug, Serialize, Clone)]
pub struct GenerateParams {
    pub prompt: String,
    pub num_results: u32,
    pub aspect_ratio: String,
    pub sync: bool,
    pub enhance_image: bool,
    pub medium: Medium,
    pub prompt_enhancement: bool,
    pub content_moderation: bool,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Medium {
    Photography,
    Art,
}

impl Medium {
    // The UI offers named styles; everything but "Realistic" is rendered as art.
    pub fn from_style(style: &str) -> Self {
        if style == "Realistic" {
            Medium::Photography
        } else {
            Medium::Art
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PackshotParams {
    pub background_color: Option<String>,
    pub sku: Option<String>,
    pub force_rmbg: bool,
    pub content_moderation: bool,
}

#[derive(Debug, Serialize, Clone, Default)]
pub struct ShadowParams {
    #[serde(rename = "type")]
    pub shadow_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_color: Option<String>,
    pub shadow_offset: [i64; 2],
    pub shadow_intensity: i64,
    pub shadow_blur: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_width: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_height: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub force_rmbg: bool,
    pub content_moderation: bool,
}

#[derive(Debug, Serialize, Clone, Default)]
pub struct FillParams {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    pub num_results: u32,
    pub sync: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    pub content_moderation: bool,
}

#[derive(Debug, Serialize, Clone, Default)]
pub struct EraseParams {
    pub content_moderation: bool,
}

#[derive(Debug, Serialize, Clone, Default)]
pub struct LifestyleParams {
    pub placement_type: PlacementType,
    pub num_results: u32,
    pub sync: bool,
    pub original_quality: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shot_size: Option<[u32; 2]>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub manual_placement_selection: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding_values: Option<[i64; 4]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreground_image_size: Option<[u32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreground_image_location: Option<[i64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub force_rmbg: bool,
    pub content_moderation: bool,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlacementType {
    Original,
    #[default]
    Automatic,
    ManualPlacement,
    ManualPadding,
    CustomCoordinates,
}

impl PlacementType {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Original" => Some(PlacementType::Original),
            "Automatic" => Some(PlacementType::Automatic),
            "Manual Placement" => Some(PlacementType::ManualPlacement),
            "Manual Padding" => Some(PlacementType::ManualPadding),
            "Custom Coordinates" => Some(PlacementType::CustomCoordinates),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum LifestyleScene {
    Text {
        scene_description: String,
        fast: bool,
        optimize_description: bool,
        exclude_elements: Option<String>,
    },
    Reference {
        image: bytes::Bytes,
        enhance_ref_image: bool,
        ref_image_influence: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn shadow_params_skip_unset_options() {
        let params = ShadowParams {
            shadow_type: "regular".into(),
            shadow_color: Some("#000000".into()),
            shadow_offset: [0, 15],
            shadow_intensity: 60,
            shadow_blur: 20,
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({
                "type": "regular",
                "shadow_color": "#000000",
                "shadow_offset": [0, 15],
                "shadow_intensity": 60,
                "shadow_blur": 20,
                "force_rmbg": false,
                "content_moderation": false,
            })
        );
    }

    #[test]
    fn style_and_placement_labels() {
        assert_eq!(Medium::from_style("Realistic"), Medium::Photography);
        assert_eq!(Medium::from_style("Cartoon"), Medium::Art);
        assert_eq!(PlacementType::from_label("Manual Padding"), Some(PlacementType::ManualPadding));
        assert_eq!(PlacementType::from_label("Sideways"), None);
        assert_eq!(
            serde_json::to_value(PlacementType::CustomCoordinates).unwrap(),
            json!("custom_coordinates")
        );
    }
}
