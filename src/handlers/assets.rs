//! Static asset serving.
//!
//! Assets live under the configured `assets.root_dir`: `index.html` and
//! `admin.html` at the top level, everything else under `resources/`.
//! Files are served verbatim with a content type derived from the file
//! extension; unknown extensions and missing files yield 404.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::errors::ApiError;
use crate::AppState;

/// `GET /` -- serve the index page.
pub async fn serve_index(state: Arc<AppState>) -> Result<Response, ApiError> {
    serve_file(&state, Path::new("index.html"), "text/html").await
}

/// `GET /admin` -- serve the admin page.
///
/// Served without the shared-secret check, matching the original route
/// table.  Known authorization gap; see DESIGN.md.
pub async fn serve_admin(state: Arc<AppState>) -> Result<Response, ApiError> {
    serve_file(&state, Path::new("admin.html"), "text/html").await
}

/// `GET /resources/<path>` -- serve an asset by extension.
///
/// The wildcard capture arrives already percent-decoded from the router.
pub async fn serve_resource(state: Arc<AppState>, tail: &str) -> Result<Response, ApiError> {
    let relative = sanitize_resource_path(tail).ok_or(ApiError::NotFound)?;

    let content_type = content_type_for(&relative).ok_or(ApiError::NotFound)?;

    serve_file(&state, &Path::new("resources").join(relative), content_type).await
}

/// Read a file under the asset root and serve it with the given content type.
async fn serve_file(
    state: &AppState,
    relative: &Path,
    content_type: &'static str,
) -> Result<Response, ApiError> {
    let path = PathBuf::from(&state.config.assets.root_dir).join(relative);

    debug!("Serving asset {:?}", path);

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(ApiError::NotFound),
        Err(e) => {
            return Err(ApiError::Internal(anyhow::anyhow!(
                "Failed to read asset {path:?}: {e}"
            )))
        }
    };

    Ok((StatusCode::OK, [("content-type", content_type)], bytes).into_response())
}

/// Validate a decoded resource path: plain relative components only.
///
/// Rejects traversal (`..`), absolute paths, and embedded NUL bytes.
fn sanitize_resource_path(decoded: &str) -> Option<PathBuf> {
    if decoded.is_empty() || decoded.contains('\0') {
        return None;
    }
    let path = Path::new(decoded);
    if !path
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(path.to_path_buf())
}

/// Content type for a served asset, by extension.  `None` means the
/// extension is not recognized and the request is refused.
fn content_type_for(path: &Path) -> Option<&'static str> {
    match path.extension()?.to_str()? {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "svg" => Some("image/svg+xml"),
        "css" => Some("text/css"),
        "html" => Some("text/html"),
        _ => None,
    }
}

// -- Tests ---------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for(Path::new("a.png")), Some("image/png"));
        assert_eq!(content_type_for(Path::new("a.jpg")), Some("image/jpeg"));
        assert_eq!(content_type_for(Path::new("a.jpeg")), Some("image/jpeg"));
        assert_eq!(content_type_for(Path::new("a.svg")), Some("image/svg+xml"));
        assert_eq!(content_type_for(Path::new("a.css")), Some("text/css"));
        assert_eq!(content_type_for(Path::new("a.html")), Some("text/html"));
    }

    #[test]
    fn test_unknown_extension_refused() {
        assert_eq!(content_type_for(Path::new("a.exe")), None);
        assert_eq!(content_type_for(Path::new("noext")), None);
    }

    #[test]
    fn test_sanitize_accepts_nested() {
        assert!(sanitize_resource_path("img/logo.png").is_some());
        assert!(sanitize_resource_path("style.css").is_some());
    }

    #[test]
    fn test_sanitize_rejects_traversal() {
        assert!(sanitize_resource_path("../secret.css").is_none());
        assert!(sanitize_resource_path("a/../../b.css").is_none());
        assert!(sanitize_resource_path("/etc/passwd").is_none());
        assert!(sanitize_resource_path("").is_none());
        assert!(sanitize_resource_path("a\0b.css").is_none());
    }
}
