use serde::{Deserialize, Serialize};

use crate::geometry::Region;

/// One line written to the worker's stdin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRequest {
    pub screenshot_path: String,
    pub region_x: i32,
    pub region_y: i32,
    pub region_width: u32,
    pub region_height: u32,
    /// Assigned by the worker manager when the request is written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<u64>,
}

impl WorkerRequest {
    pub fn new(screenshot_path: impl Into<String>, region: Region) -> Self {
        Self {
            screenshot_path: screenshot_path.into(),
            region_x: region.x(),
            region_y: region.y(),
            region_width: region.width(),
            region_height: region.height(),
            request_id: None,
        }
    }
}

/// One line read from the worker's stdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerResponse {
    pub success: bool,
    #[serde(default)]
    pub text_blocks: Vec<TextBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<u64>,
}

impl WorkerResponse {
    pub fn ok(text_blocks: Vec<TextBlock>) -> Self {
        Self {
            success: true,
            text_blocks,
            error: None,
            request_id: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            text_blocks: Vec::new(),
            error: Some(error.into()),
            request_id: None,
        }
    }
}

/// A recognised text span, positioned relative to the captured region's origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    #[serde(alias = "original")]
    pub original_text: String,
    #[serde(alias = "translated")]
    pub translated_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}
