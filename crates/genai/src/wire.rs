//! Request bodies and response normalization for the service's REST shapes.
//!
//! The service answers with its own operation layout
//! (`response.generateVideoResponse.generatedSamples[].video.uri`). Callers
//! only ever see the normalized [`OperationHandle`] layout
//! (`response.generatedVideos[].video.uri`).

use serde_json::{json, Value};
use vidgen_core::generation::GenerationRequest;
use vidgen_core::operation::{GeneratedVideo, OperationHandle};

/// Body of `POST models/{model}:predictLongRunning`.
pub fn predict_body(request: &GenerationRequest) -> Value {
    let mut instance = json!({ "prompt": request.prompt });
    if let Some(image) = &request.reference_image {
        instance["image"] = json!({
            "bytesBase64Encoded": image.bytes_base64,
            "mimeType": image.mime_type,
        });
    }
    json!({
        "instances": [instance],
        "parameters": { "sampleCount": request.artifact_count },
    })
}

/// Convert a raw service operation into an [`OperationHandle`].
///
/// Returns `None` when the payload is not an operation at all (no name).
pub fn normalize_operation(raw: Value) -> Option<OperationHandle> {
    let samples = raw
        .pointer("/response/generateVideoResponse/generatedSamples")
        .cloned();
    let filtered = raw
        .pointer("/response/generateVideoResponse/raiMediaFilteredReasons")
        .cloned();

    let mut handle: OperationHandle = serde_json::from_value(raw).ok()?;
    if handle.name.is_empty() {
        return None;
    }

    if let Some(samples) = samples {
        let videos: Vec<GeneratedVideo> = serde_json::from_value(samples).unwrap_or_default();
        let response = handle.response.get_or_insert_with(Default::default);
        if response.generated_videos.is_none() {
            response.generated_videos = Some(videos);
        }
    }
    if let Some(filtered) = filtered {
        let reasons: Vec<String> = serde_json::from_value(filtered).unwrap_or_default();
        if !reasons.is_empty() {
            let response = handle.response.get_or_insert_with(Default::default);
            response.filtered_reasons.get_or_insert(reasons);
        }
    }
    Some(handle)
}

/// Whether an operation name is safe to splice into a service URL path.
pub fn is_valid_operation_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('/')
        && !name.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '_' | '.'))
}
