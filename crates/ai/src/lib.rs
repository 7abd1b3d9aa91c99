//! Vision-model HTTP boundary.
//!
//! Blocking reqwest client (no async runtime required). The model drafts
//! catalog metadata for an image; when it is not confident (`is_done ==
//! false`) it returns follow-up questions, and the caller may re-request
//! with accumulated question/answer pairs. The grid engine only ever
//! consumes `metadata` as candidate default cell values.

use std::collections::HashMap;
use std::fmt;

use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Error type for vision-model calls.
#[derive(Debug)]
pub enum AiError {
    /// Network error
    Network(String),
    /// HTTP error with status code
    Http(u16, String),
    /// JSON parsing error
    Parse(String),
}

impl fmt::Display for AiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiError::Network(msg) => write!(f, "Network error: {}", msg),
            AiError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            AiError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for AiError {}

/// Request body for a metadata draft.
#[derive(Debug, Clone, Serialize)]
pub struct ImageRequest {
    /// Base64-encoded image bytes, no data-URL prefix.
    pub image: String,
    /// Model identifier; omitted = server default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Accumulated question/answer pairs from earlier rounds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qna: Option<Vec<(String, String)>>,
}

/// The fixed metadata field set the model fills in.
///
/// Field names match the default archival field titles, so values map onto
/// sheet columns by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImageMetadata {
    #[serde(rename = "fileTitle")]
    pub file_title: String,
    pub title: String,
    pub field_linked_agent: String,
    pub field_extent: String,
    pub field_description: String,
    pub field_rights: String,
    pub field_resource_type: String,
    pub field_language: String,
    pub field_note: String,
    pub field_subject: String,
    pub field_subjects_name: String,
    #[serde(rename = "field_subject_name__organization")]
    pub field_subject_name_organization: String,
    pub field_geographic_subject: String,
    pub field_coordinates: String,
}

impl ImageMetadata {
    /// Candidate default value for a field title, if this response carries
    /// one. Empty strings are not candidates.
    pub fn value_for(&self, field_title: &str) -> Option<&str> {
        let value = match field_title {
            "fileTitle" => &self.file_title,
            "title" => &self.title,
            "field_linked_agent" => &self.field_linked_agent,
            "field_extent" => &self.field_extent,
            "field_description" => &self.field_description,
            "field_rights" => &self.field_rights,
            "field_resource_type" => &self.field_resource_type,
            "field_language" => &self.field_language,
            "field_note" => &self.field_note,
            "field_subject" => &self.field_subject,
            "field_subjects_name" => &self.field_subjects_name,
            "field_subject_name__organization" => &self.field_subject_name_organization,
            "field_geographic_subject" => &self.field_geographic_subject,
            "field_coordinates" => &self.field_coordinates,
            _ => return None,
        };
        if value.is_empty() { None } else { Some(value) }
    }
}

/// Model response for one image.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImageResponse {
    /// False when the model wants answers to `questions` before committing.
    pub is_done: bool,
    #[serde(default)]
    pub metadata: ImageMetadata,
    #[serde(default)]
    pub questions: Vec<String>,
}

/// Responses cached per filename, the shape persisted under `ai-results`.
pub type AiResults = HashMap<String, ImageResponse>;

/// Vision-model API client (blocking).
#[derive(Clone)]
pub struct VisionClient {
    http: reqwest::blocking::Client,
    api_base: String,
    api_key: Option<String>,
    model: Option<String>,
}

impl VisionClient {
    pub fn new(api_base: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            api_base: api_base.into(),
            api_key,
            model: None,
        }
    }

    /// Pin a model identifier; every request carries it.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Request a metadata draft for raw image bytes.
    pub fn describe_image(
        &self,
        image_bytes: &[u8],
        qna: Option<Vec<(String, String)>>,
    ) -> Result<ImageResponse, AiError> {
        let body = ImageRequest {
            image: base64::engine::general_purpose::STANDARD.encode(image_bytes),
            model: self.model.clone(),
            qna,
        };
        self.describe_encoded(&body)
    }

    /// Request a metadata draft for an already-encoded request body.
    pub fn describe_encoded(&self, request: &ImageRequest) -> Result<ImageResponse, AiError> {
        let url = format!("{}/api/image", self.api_base.trim_end_matches('/'));

        let mut req = self.http.post(&url).json(request);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().map_err(|e| AiError::Network(e.to_string()))?;
        let status = resp.status();
        let text = resp.text().map_err(|e| AiError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(AiError::Http(status.as_u16(), text));
        }

        serde_json::from_str(&text).map_err(|e| AiError::Parse(e.to_string()))
    }
}
