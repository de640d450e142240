use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Submitted,
    Reviewing,
    Interview,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Submitted,
        ApplicationStatus::Reviewing,
        ApplicationStatus::Interview,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
    ];

    /// Non-terminal stages in display order.
    pub const TIMELINE: [ApplicationStatus; 3] = [
        ApplicationStatus::Submitted,
        ApplicationStatus::Reviewing,
        ApplicationStatus::Interview,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Accepted | ApplicationStatus::Rejected)
    }

    /// Position on the progress timeline. Terminal outcomes sit past the last
    /// stage so every stage renders as reached.
    pub fn timeline_position(&self) -> usize {
        match self {
            ApplicationStatus::Submitted => 0,
            ApplicationStatus::Reviewing => 1,
            ApplicationStatus::Interview => 2,
            ApplicationStatus::Accepted | ApplicationStatus::Rejected => Self::TIMELINE.len(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::Reviewing => "reviewing",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "Enviada",
            ApplicationStatus::Reviewing => "En Revisión",
            ApplicationStatus::Interview => "Entrevista",
            ApplicationStatus::Accepted => "Aceptada",
            ApplicationStatus::Rejected => "Rechazada",
        }
    }

    /// Wording shown to the candidate, which celebrates an acceptance.
    pub fn candidate_label(&self) -> &'static str {
        match self {
            ApplicationStatus::Accepted => "¡Aceptado!",
            other => other.label(),
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| format!("unknown application status: {}", s.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub id: EntityId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "type", default)]
    pub job_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantRef {
    pub id: EntityId,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMessage {
    #[serde(default)]
    pub id: Option<EntityId>,
    pub text: String,
    #[serde(
        default,
        deserialize_with = "crate::utils::time::deserialize_flexible_opt"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: EntityId,
    #[serde(default)]
    pub job: Option<JobSummary>,
    #[serde(default)]
    pub candidate: Option<ApplicantRef>,
    #[serde(default)]
    pub cover_letter: String,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default)]
    pub cv_file_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "crate::utils::time::deserialize_flexible_opt"
    )]
    pub applied_at: Option<DateTime<Utc>>,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub messages: Vec<StatusMessage>,
}

impl Application {
    pub fn job_id(&self) -> Option<&EntityId> {
        self.job.as_ref().map(|j| &j.id)
    }

    pub fn candidate_id(&self) -> Option<&EntityId> {
        self.candidate.as_ref().map(|c| &c.id)
    }

    pub fn is_for_job(&self, job_id: &EntityId) -> bool {
        self.job_id() == Some(job_id)
    }

    pub fn belongs_to(&self, candidate_id: &EntityId) -> bool {
        self.candidate_id() == Some(candidate_id)
    }
}
