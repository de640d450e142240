use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::{EntityId, Role};

/// Salaries arrive either as free text ("S/ 1,500") or as bare numbers.
fn deserialize_salary<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Int(i64),
        Float(f64),
        String(String),
    }

    Ok(match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(NumberOrString::Int(i)) => Some(i.to_string()),
        Some(NumberOrString::Float(f)) => Some(f.to_string()),
        Some(NumberOrString::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Approved,
    Rejected,
}

impl JobStatus {
    /// Status a freshly created posting is submitted with. HR postings skip
    /// the approval queue.
    pub fn initial_for(role: Role) -> Self {
        match role {
            Role::Hr => JobStatus::Approved,
            Role::Manager | Role::Candidate => JobStatus::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }

    /// Only pending postings can be decided, and only by HR.
    pub fn can_transition(&self, next: JobStatus, actor: Role) -> bool {
        matches!(actor, Role::Hr)
            && matches!(self, JobStatus::Pending)
            && matches!(next, JobStatus::Approved | JobStatus::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Approved => "approved",
            JobStatus::Rejected => "rejected",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobStatus::Pending => "Pendiente",
            JobStatus::Approved => "Aprobado",
            JobStatus::Rejected => "Rechazado",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "approved" => Ok(JobStatus::Approved),
            "rejected" => Ok(JobStatus::Rejected),
            other => Err(format!("unknown job status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobAuthor {
    #[serde(default)]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub location: String,
    #[serde(rename = "type", default)]
    pub job_type: String,
    #[serde(default, deserialize_with = "deserialize_salary")]
    pub salary: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: Option<String>,
    pub status: JobStatus,
    #[serde(default)]
    pub created_by: Option<JobAuthor>,
    #[serde(
        default,
        deserialize_with = "crate::utils::time::deserialize_flexible_opt"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl JobPosting {
    /// Public and candidate listings only ever show approved postings.
    pub fn is_publicly_visible(&self) -> bool {
        self.status == JobStatus::Approved
    }

    pub fn created_by_email(&self) -> Option<&str> {
        self.created_by.as_ref().and_then(|a| a.email.as_deref())
    }
}
