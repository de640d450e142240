use std::collections::BTreeSet;

use tracing::warn;
use validator::Validate;

use super::failure_text;
use crate::dto::application_dto::{ApplicationForm, CvAttachment};
use crate::error::{Error, Result};
use crate::models::{Application, EntityId, Identity, JobPosting, Role};
use crate::services::jobs_service::PortalCache;
use crate::utils::validation::first_message;
use crate::Portal;

/// Search box plus the two dropdowns. Empty values match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilters {
    pub search: String,
    pub department: Option<String>,
    pub location: Option<String>,
}

impl JobFilters {
    pub fn matches(&self, job: &JobPosting) -> bool {
        let needle = self.search.trim().to_lowercase();
        let matches_search = needle.is_empty()
            || job.title.to_lowercase().contains(&needle)
            || job.description.to_lowercase().contains(&needle);
        let matches_department = self
            .department
            .as_deref()
            .map_or(true, |d| d.is_empty() || job.department == d);
        let matches_location = self
            .location
            .as_deref()
            .map_or(true, |l| l.is_empty() || job.location == l);
        matches_search && matches_department && matches_location
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobCard {
    pub job: JobPosting,
    /// The signed-in candidate already applied; the apply button is disabled.
    pub applied: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobBoard {
    pub cards: Vec<JobCard>,
    pub departments: Vec<String>,
    pub locations: Vec<String>,
    pub show_dashboard_link: bool,
    pub loading: bool,
}

pub fn has_applied(cache: &PortalCache, identity: &Identity, job_id: &EntityId) -> bool {
    cache
        .applications
        .iter()
        .any(|app| app.is_for_job(job_id) && app.belongs_to(&identity.id))
}

fn unique_sorted<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn job_board(cache: &PortalCache, identity: Option<&Identity>, filters: &JobFilters) -> JobBoard {
    let approved: Vec<&JobPosting> = cache
        .jobs
        .iter()
        .filter(|job| job.is_publicly_visible())
        .collect();

    let departments = unique_sorted(approved.iter().map(|job| job.department.as_str()));
    let locations = unique_sorted(approved.iter().map(|job| job.location.as_str()));

    let cards = approved
        .iter()
        .filter(|job| filters.matches(job))
        .map(|job| JobCard {
            applied: identity.map_or(false, |id| has_applied(cache, id, &job.id)),
            job: (*job).clone(),
        })
        .collect();

    JobBoard {
        cards,
        departments,
        locations,
        show_dashboard_link: identity.map(|id| id.role) == Some(Role::Hr),
        loading: cache.loading,
    }
}

/// Submits the candidate's application. Anonymous callers get
/// [`Error::Unauthenticated`] so the caller can send them to the login page.
/// On success the created record is returned when the server echoed one.
pub async fn apply(
    portal: &Portal,
    job_id: &EntityId,
    form: ApplicationForm,
    cv: Option<CvAttachment>,
) -> Result<Option<Application>> {
    let Some(identity) = portal.session.identity() else {
        return Err(Error::Unauthenticated);
    };
    if identity.role != Role::Candidate {
        portal.notifications.error(
            "Acceso denegado",
            "Solo los candidatos pueden postular a trabajos",
        );
        return Err(Error::Forbidden("apply".to_string()));
    }
    if let Err(errors) = form.validate() {
        portal.notifications.error("Error", first_message(&errors));
        return Err(errors.into());
    }

    let title = portal
        .store
        .snapshot()
        .job(job_id)
        .map(|job| job.title.clone())
        .unwrap_or_else(|| format!("el trabajo {}", job_id));

    match portal.store.apply_to_job(job_id, &form, cv).await {
        Ok(application) => {
            portal.notifications.success(
                "¡Postulación enviada!",
                format!("Tu postulación para {} ha sido enviada exitosamente", title),
            );
            Ok(application)
        }
        Err(err) => {
            warn!(%job_id, "application rejected: {}", err);
            portal.notifications.error(
                "Error al postular",
                failure_text(
                    &err,
                    "No se pudo enviar tu postulación. Inténtalo de nuevo.",
                ),
            );
            Err(err.into())
        }
    }
}
