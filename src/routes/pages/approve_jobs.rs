use tracing::warn;

use crate::error::{Error, Result};
use crate::models::{EntityId, JobPosting, JobStatus};
use crate::routes::{require_identity, Route};
use crate::services::jobs_service::PortalCache;
use crate::Portal;

/// Postings waiting for an HR decision, in the order the API returned them.
pub fn pending_jobs(cache: &PortalCache) -> Vec<JobPosting> {
    cache
        .jobs_with_status(JobStatus::Pending)
        .into_iter()
        .cloned()
        .collect()
}

pub async fn approve(portal: &Portal, job_id: &EntityId) -> Result<()> {
    decide(portal, job_id, JobStatus::Approved).await
}

pub async fn reject(portal: &Portal, job_id: &EntityId) -> Result<()> {
    decide(portal, job_id, JobStatus::Rejected).await
}

async fn decide(portal: &Portal, job_id: &EntityId, next: JobStatus) -> Result<()> {
    let identity = require_identity(Route::ApproveJobs, &portal.session_state())?;
    let (success_title, success_text, failure_text) = match next {
        JobStatus::Approved => (
            "¡Trabajo Aprobado!",
            "El trabajo ha sido aprobado y ahora está visible para los candidatos.",
            "No se pudo aprobar el trabajo.",
        ),
        JobStatus::Rejected => (
            "Trabajo Rechazado",
            "La solicitud de trabajo ha sido rechazada.",
            "No se pudo rechazar el trabajo.",
        ),
        JobStatus::Pending => {
            return Err(Error::BadRequest("a posting cannot return to pending".into()))
        }
    };

    if let Some(job) = portal.store.snapshot().job(job_id) {
        if !job.status.can_transition(next, identity.role) {
            portal.notifications.error("Error", failure_text);
            return Err(Error::BadRequest(format!(
                "job {} is already {}",
                job_id, job.status
            )));
        }
    }

    match portal.store.update_job_status(job_id, next).await {
        Ok(()) => {
            portal.notifications.success(success_title, success_text);
            Ok(())
        }
        Err(err) => {
            warn!(%job_id, status = %next, "job decision failed: {}", err);
            portal.notifications.error("Error", failure_text);
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::models::Role;
    use crate::routes::pages::test_support::portal_as;
    use crate::services::api_client::{ApiResponse, MockGateway};
    use crate::services::notification_service::NoticeLevel;
    use reqwest::Method;
    use serde_json::json;

    fn jobs() -> serde_json::Value {
        json!([
            { "id": 1, "title": "Cajero", "status": "pending" },
            { "id": 2, "title": "Vendedor", "status": "approved" },
            { "id": 3, "title": "Almacenero", "status": "pending" }
        ])
    }

    #[test]
    fn queue_lists_only_pending() {
        let cache = PortalCache {
            jobs: serde_json::from_value(jobs()).unwrap(),
            ..Default::default()
        };
        let titles: Vec<String> = pending_jobs(&cache).into_iter().map(|j| j.title).collect();
        assert_eq!(titles, vec!["Cajero", "Almacenero"]);
    }

    #[tokio::test]
    async fn managers_cannot_decide() {
        let portal = portal_as(Some(Role::Manager), MockGateway::new());
        let err = approve(&portal, &EntityId::from(1)).await.unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[tokio::test]
    async fn decided_jobs_are_not_sent_again() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_call()
            .withf(|req| req.method == Method::GET)
            .returning(|req| {
                if req.path == "/jobs" {
                    Ok(ApiResponse::Json(jobs()))
                } else {
                    Ok(ApiResponse::Json(json!([])))
                }
            });
        gateway.expect_call().withf(|req| req.method == Method::PUT).never();
        let portal = portal_as(Some(Role::Hr), gateway);
        portal.store.refresh().await;

        let err = reject(&portal, &EntityId::from(2)).await.unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[tokio::test]
    async fn failed_approval_reports_generic_error() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_call()
            .withf(|req| req.method == Method::PUT && req.path == "/jobs/1/status")
            .times(1)
            .returning(|_| Err(ApiError::new("Internal Server Error")));
        let portal = portal_as(Some(Role::Hr), gateway);
        let mut notices = portal.notifications.subscribe();

        assert!(approve(&portal, &EntityId::from(1)).await.is_err());
        let notice = notices.recv().await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.description, "No se pudo aprobar el trabajo.");
    }
}
