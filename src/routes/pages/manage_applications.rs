use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use tracing::warn;

use super::failure_text;
use crate::dto::auth_dto::non_blank;
use crate::error::{Error, Result};
use crate::models::{Application, ApplicationStatus, EntityId, Identity, JobPosting, Role};
use crate::routes::{require_identity, Route};
use crate::services::jobs_service::PortalCache;
use crate::Portal;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    /// Everything except rejected applications.
    #[default]
    Active,
    All,
    Only(ApplicationStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: ApplicationStatus) -> bool {
        match self {
            StatusFilter::Active => status != ApplicationStatus::Rejected,
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => status == *wanted,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(StatusFilter::Active),
            "" | "all" => Ok(StatusFilter::All),
            other => other.parse().map(StatusFilter::Only),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::Active => f.write_str("active"),
            StatusFilter::All => f.write_str("all"),
            StatusFilter::Only(status) => write!(f, "{}", status),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationFilters {
    pub job: Option<EntityId>,
    pub status: StatusFilter,
}

/// HR sees every posting; a manager only the ones they created.
pub fn relevant_jobs<'a>(cache: &'a PortalCache, identity: &Identity) -> Vec<&'a JobPosting> {
    match identity.role {
        Role::Hr => cache.jobs.iter().collect(),
        Role::Manager => cache
            .jobs
            .iter()
            .filter(|job| job.created_by_email() == Some(identity.email.as_str()))
            .collect(),
        Role::Candidate => Vec::new(),
    }
}

pub fn relevant_applications<'a>(cache: &'a PortalCache, identity: &Identity) -> Vec<&'a Application> {
    let job_ids: HashSet<&EntityId> = relevant_jobs(cache, identity)
        .into_iter()
        .map(|job| &job.id)
        .collect();
    cache
        .applications
        .iter()
        .filter(|app| app.job_id().map_or(false, |id| job_ids.contains(id)))
        .collect()
}

pub fn filtered_applications(
    cache: &PortalCache,
    identity: &Identity,
    filters: &ApplicationFilters,
) -> Vec<Application> {
    relevant_applications(cache, identity)
        .into_iter()
        .filter(|app| filters.job.as_ref().map_or(true, |job| app.is_for_job(job)))
        .filter(|app| filters.status.matches(app.status))
        .cloned()
        .collect()
}

/// Suggested notification for the candidate when moving to `status`.
pub fn default_message(application: &Application, status: ApplicationStatus) -> String {
    let username = application
        .candidate
        .as_ref()
        .map(|c| c.username.as_str())
        .unwrap_or_default();
    let title = application
        .job
        .as_ref()
        .map(|j| j.title.as_str())
        .unwrap_or_default();

    let mut message = format!(
        "Hola {},\n\nEl estado de tu postulación para el puesto de \"{}\" ha sido actualizado a: {}.",
        username,
        title,
        status.label()
    );
    match status {
        ApplicationStatus::Interview => message.push_str(
            "\n\nNos pondremos en contacto contigo pronto para coordinar los detalles.",
        ),
        ApplicationStatus::Accepted => message.push_str(
            "\n\n¡Felicidades! Has sido seleccionado. Te contactaremos con los siguientes pasos.",
        ),
        ApplicationStatus::Rejected => message.push_str(
            "\n\nAgradecemos tu interés. En esta ocasión, hemos decidido continuar con otros candidatos.",
        ),
        ApplicationStatus::Submitted | ApplicationStatus::Reviewing => {}
    }
    message.push_str("\n\nSaludos cordiales,\nEl equipo de Reclutamiento de SODIMAC");
    message
}

/// Moves an application to `status` and sends `message` to the candidate.
pub async fn change_status(
    portal: &Portal,
    application_id: &EntityId,
    status: ApplicationStatus,
    message: Option<String>,
) -> Result<()> {
    require_identity(Route::ManageApplications, &portal.session_state())?;

    match portal
        .store
        .update_application_status(application_id, status, non_blank(message))
        .await
    {
        Ok(()) => {
            portal
                .notifications
                .success("¡Éxito!", "La postulación ha sido actualizada.");
            Ok(())
        }
        Err(err) => {
            warn!(%application_id, %status, "status change failed: {}", err);
            portal.notifications.error(
                "Error",
                failure_text(&err, "No se pudo actualizar la postulación."),
            );
            Err(err.into())
        }
    }
}

pub async fn download_cv(portal: &Portal, file_name: &str) -> Result<Bytes> {
    require_identity(Route::ManageApplications, &portal.session_state())?;

    portal.store.fetch_cv(file_name).await.map_err(|err| {
        portal.notifications.error(
            "Error al abrir CV",
            failure_text(&err, "No se pudo obtener el archivo."),
        );
        Error::from(err)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::pages::test_support::portal_as;
    use crate::services::api_client::{ApiResponse, MockGateway, RequestBody};
    use reqwest::Method;
    use serde_json::json;

    fn cache() -> PortalCache {
        PortalCache {
            jobs: serde_json::from_value(json!([
                { "id": 1, "title": "Cajero", "status": "approved",
                  "createdBy": { "email": "manager@sodimac.pe" } },
                { "id": 2, "title": "Vendedor", "status": "approved",
                  "createdBy": { "email": "otro@sodimac.pe" } }
            ]))
            .unwrap(),
            applications: serde_json::from_value(json!([
                { "id": 10, "job": { "id": 1, "title": "Cajero" },
                  "candidate": { "id": 5, "username": "ana" }, "status": "submitted" },
                { "id": 11, "job": { "id": 1, "title": "Cajero" },
                  "candidate": { "id": 6, "username": "luis" }, "status": "rejected" },
                { "id": 12, "job": { "id": 2, "title": "Vendedor" },
                  "candidate": { "id": 5, "username": "ana" }, "status": "interview" },
                { "id": 13, "candidate": { "id": 8, "username": "eva" }, "status": "submitted" }
            ]))
            .unwrap(),
            loading: false,
        }
    }

    fn staff(role: Role) -> Identity {
        Identity {
            id: EntityId::from(7),
            name: "Staff".into(),
            email: format!("{}@sodimac.pe", role),
            role,
        }
    }

    fn ids(apps: &[Application]) -> Vec<String> {
        apps.iter().map(|a| a.id.to_string()).collect()
    }

    #[test]
    fn manager_sees_only_own_postings() {
        let cache = cache();
        let jobs = relevant_jobs(&cache, &staff(Role::Manager));
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "Cajero");
    }

    #[test]
    fn default_filter_hides_rejected() {
        let apps = filtered_applications(&cache(), &staff(Role::Hr), &ApplicationFilters::default());
        assert_eq!(ids(&apps), vec!["10", "12"]);
    }

    #[test]
    fn empty_filter_shows_everything_relevant() {
        let filters = ApplicationFilters {
            job: None,
            status: "".parse().unwrap(),
        };
        let apps = filtered_applications(&cache(), &staff(Role::Manager), &filters);
        assert_eq!(ids(&apps), vec!["10", "11"]);
    }

    #[test]
    fn job_and_exact_status_filters_combine() {
        let filters = ApplicationFilters {
            job: Some(EntityId::from(2)),
            status: "interview".parse().unwrap(),
        };
        let apps = filtered_applications(&cache(), &staff(Role::Hr), &filters);
        assert_eq!(ids(&apps), vec!["12"]);
        assert!("archived".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn default_message_adds_interview_followup() {
        let cache = cache();
        let app = &cache.applications[0];
        let message = default_message(app, ApplicationStatus::Interview);
        assert!(message.starts_with("Hola ana,"));
        assert!(message.contains("\"Cajero\" ha sido actualizado a: Entrevista."));
        assert!(message.contains("coordinar los detalles"));
        assert!(message.ends_with("El equipo de Reclutamiento de SODIMAC"));

        let reviewing = default_message(app, ApplicationStatus::Reviewing);
        assert!(!reviewing.contains("Felicidades"));
    }

    #[tokio::test]
    async fn status_change_sends_message_and_notifies() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_call()
            .withf(|req| {
                req.method == Method::PUT
                    && req.path == "/applications/10"
                    && req.body
                        == RequestBody::Json(json!({ "status": "accepted", "message": "Bienvenida" }))
            })
            .times(1)
            .returning(|_| Ok(ApiResponse::Json(json!({}))));
        gateway
            .expect_call()
            .withf(|req| req.method == Method::GET)
            .returning(|_| Ok(ApiResponse::Json(json!([]))));
        let portal = portal_as(Some(Role::Hr), gateway);
        let mut notices = portal.notifications.subscribe();

        change_status(
            &portal,
            &EntityId::from(10),
            ApplicationStatus::Accepted,
            Some(" Bienvenida ".into()),
        )
        .await
        .unwrap();
        assert_eq!(notices.recv().await.unwrap().title, "¡Éxito!");
    }

    #[tokio::test]
    async fn candidates_cannot_download_cvs() {
        let portal = portal_as(Some(Role::Candidate), MockGateway::new());
        let err = download_cv(&portal, "cv.pdf").await.unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[tokio::test]
    async fn cv_download_returns_bytes() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_download()
            .withf(|path| path == "/files/cvs/ana.pdf")
            .times(1)
            .returning(|_| Ok(Bytes::from_static(b"%PDF")));
        let portal = portal_as(Some(Role::Manager), gateway);

        let bytes = download_cv(&portal, "ana.pdf").await.unwrap();
        assert_eq!(&bytes[..], b"%PDF");
    }
}
