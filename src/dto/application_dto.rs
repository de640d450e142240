use bytes::Bytes;
use serde::Serialize;
use std::path::Path;
use validator::Validate;

use super::auth_dto::non_blank;
use crate::models::ApplicationStatus;

/// Text half of an application; sent as the JSON `application` part.
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationForm {
    #[validate(length(min = 1, message = "La carta de presentación es requerida"))]
    pub cover_letter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<String>,
}

impl ApplicationForm {
    pub fn new(cover_letter: &str, experience: Option<String>, skills: Option<String>) -> Self {
        Self {
            cover_letter: cover_letter.trim().to_string(),
            experience: non_blank(experience),
            skills: non_blank(skills),
        }
    }
}

/// Résumé file attached to an application as the `cvFile` part.
#[derive(Debug, Clone, PartialEq)]
pub struct CvAttachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl CvAttachment {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type_for(&file_name).to_string();
        Self {
            file_name,
            content_type,
            bytes: bytes.into(),
        }
    }

    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("cv.bin")
            .to_string();
        Ok(Self::new(file_name, bytes))
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateApplicationStatusPayload {
    pub status: ApplicationStatus,
    pub message: Option<String>,
}
