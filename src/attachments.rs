//! Attachment resolution: turn an attachment descriptor into inline base64
//! content with a validated media type. Inline data is used as-is; URLs are
//! fetched through the gateway's storage client when one is configured, or a
//! direct unauthenticated fetch otherwise.

use crate::errors::{GatewayError, GatewayResult};
use crate::models::attachment::Attachment;
use crate::storage::{self, FileStorage};

pub const IMAGE_MEDIA_TYPES: [&str; 4] =
    ["image/png", "image/jpeg", "image/gif", "image/webp"];

pub const IMAGE_FILE_EXTENSIONS: [&str; 5] = ["png", "jpeg", "jpg", "gif", "webp"];

/// An attachment reduced to inline content: base64 data plus its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAttachment {
    pub media_type: String,
    pub data: String,
}

pub fn get_usage_message(supported_exts: &[&str]) -> String {
    format!(
        "The application answers queries about attached images.\n\
         Attach images and ask questions about them in the same message.\n\n\
         Supported image types: {}.\n\n\
         Examples of queries:\n\
         - \"Describe this picture\" for one image,\n\
         - \"What are in these images? Is there any difference between them?\" for multiple images.",
        supported_exts.join(", ")
    )
}

fn validate_media_type(media_type: &str) -> GatewayResult<()> {
    if IMAGE_MEDIA_TYPES.contains(&media_type) {
        Ok(())
    } else {
        Err(GatewayError::User {
            message: format!("Unsupported media type: {}", media_type),
            usage: get_usage_message(&IMAGE_FILE_EXTENSIONS),
        })
    }
}

/// Infer a media type from the URL's file extension, ignoring any query
/// string or fragment.
pub fn guess_media_type(url: &str) -> Option<&'static str> {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url);
    let extension = path.rsplit('.').next()?;
    match extension.to_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpeg" | "jpg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

async fn download(url: &str, file_storage: Option<&dyn FileStorage>) -> GatewayResult<String> {
    match file_storage {
        Some(file_storage) => file_storage.download_as_base64(url).await,
        None => storage::download_as_base64(url).await,
    }
}

/// Resolve an attachment to inline base64 content.
///
/// Inline data requires an explicit, supported media type. URL attachments
/// take the declared type or fall back to extension inference; an
/// uninferable type is a validation error.
pub async fn resolve_attachment(
    attachment: &Attachment,
    file_storage: Option<&dyn FileStorage>,
) -> GatewayResult<ResolvedAttachment> {
    if let Some(data) = &attachment.data {
        let media_type = attachment.content_type.as_deref().ok_or_else(|| {
            GatewayError::validation("Attachment type is required for provided data")
        })?;
        validate_media_type(media_type)?;
        return Ok(ResolvedAttachment {
            media_type: media_type.to_string(),
            data: data.clone(),
        });
    }

    if let Some(url) = &attachment.url {
        let media_type = attachment
            .content_type
            .as_deref()
            .or_else(|| guess_media_type(url))
            .ok_or_else(|| {
                GatewayError::validation(format!("Cannot guess attachment type for {}", url))
            })?;
        validate_media_type(media_type)?;
        let data = download(url, file_storage).await?;
        return Ok(ResolvedAttachment {
            media_type: media_type.to_string(),
            data,
        });
    }

    Err(GatewayError::validation("Attachment data or URL is required"))
}
