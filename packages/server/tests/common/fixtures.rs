//! Request fixtures shared across suites.

use server_core::kernel::jobs::GenerationRequest;

/// The canonical end-to-end request: explicit outline, one keyword.
pub fn sample_request() -> GenerationRequest {
    GenerationRequest {
        title: "Example".to_string(),
        outline: vec![
            "intro".to_string(),
            "body".to_string(),
            "conclusion".to_string(),
        ],
        keywords: vec!["k1".to_string()],
        category: "c".to_string(),
    }
}

/// A request with no outline, forcing the outline generation step.
pub fn request_without_outline() -> GenerationRequest {
    GenerationRequest {
        outline: vec![],
        ..sample_request()
    }
}
