use serde::{Deserialize, Serialize};
use validator::Validate;

use super::auth_dto::non_blank;
use crate::models::JobStatus;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JobDraft {
    #[validate(length(min = 1, message = "El título es requerido"))]
    pub title: String,
    #[validate(length(min = 1, message = "El departamento es requerido"))]
    pub department: String,
    #[validate(length(min = 1, message = "La ubicación es requerida"))]
    pub location: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "El tipo de contrato es requerido"))]
    pub job_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[validate(length(min = 1, message = "La descripción es requerida"))]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
}

impl JobDraft {
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            department: self.department.trim().to_string(),
            location: self.location.trim().to_string(),
            job_type: self.job_type.trim().to_string(),
            salary: non_blank(self.salary),
            description: self.description.trim().to_string(),
            requirements: non_blank(self.requirements),
        }
    }

    pub fn with_status(self, status: JobStatus) -> CreateJobPayload {
        CreateJobPayload {
            draft: self,
            status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateJobPayload {
    #[serde(flatten)]
    pub draft: JobDraft,
    pub status: JobStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateJobStatusPayload {
    pub status: JobStatus,
}
