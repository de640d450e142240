use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::dto::application_dto::{ApplicationForm, CvAttachment, UpdateApplicationStatusPayload};
use crate::dto::job_dto::{CreateJobPayload, UpdateJobStatusPayload};
use crate::error::ApiError;
use crate::models::{Application, ApplicationStatus, EntityId, Identity, JobPosting, JobStatus, Role};
use crate::services::api_client::{ApiRequest, ApiResponse, Gateway};
use crate::services::notification_service::NotificationService;
use crate::services::session_service::SessionState;
use crate::services::Subscription;

const JOBS_PATH: &str = "/jobs";
const APPLICATIONS_PATH: &str = "/applications";

/// Client-side copy of what the current identity is allowed to see.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortalCache {
    pub jobs: Vec<JobPosting>,
    pub applications: Vec<Application>,
    pub loading: bool,
}

impl PortalCache {
    pub fn job(&self, id: &EntityId) -> Option<&JobPosting> {
        self.jobs.iter().find(|job| &job.id == id)
    }

    pub fn application(&self, id: &EntityId) -> Option<&Application> {
        self.applications.iter().find(|app| &app.id == id)
    }

    pub fn jobs_with_status(&self, status: JobStatus) -> Vec<&JobPosting> {
        self.jobs.iter().filter(|job| job.status == status).collect()
    }
}

/// Resets `loading` however the refresh future ends, including when it is
/// dropped mid-flight.
struct LoadingGuard<'a> {
    cache: &'a watch::Sender<PortalCache>,
}

impl<'a> LoadingGuard<'a> {
    fn start(cache: &'a watch::Sender<PortalCache>) -> Self {
        cache.send_modify(|c| c.loading = true);
        Self { cache }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.cache.send_modify(|c| c.loading = false);
    }
}

/// Decodes the record echoed back by a successful create. The mutation has
/// already happened, so an unreadable body is only logged.
fn created_record<T: DeserializeOwned>(response: ApiResponse, what: &str) -> Option<T> {
    match response.into_json() {
        Ok(record) => Some(record),
        Err(err) => {
            warn!("{} accepted but the response is not a record: {}", what, err);
            None
        }
    }
}

fn applications_path(identity: &Identity) -> String {
    match identity.role {
        Role::Candidate => format!("{}/candidate/{}", APPLICATIONS_PATH, identity.id),
        Role::Manager | Role::Hr => APPLICATIONS_PATH.to_string(),
    }
}

/// Jobs and applications cache plus the mutations that change them.
///
/// Every mutation calls the API first and, only if that succeeds, reloads the
/// whole cache before returning.
pub struct RecruitmentStore {
    gateway: Arc<dyn Gateway>,
    session: watch::Receiver<SessionState>,
    notifications: NotificationService,
    cache: watch::Sender<PortalCache>,
}

impl RecruitmentStore {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        session: watch::Receiver<SessionState>,
        notifications: NotificationService,
    ) -> Self {
        let (cache, _) = watch::channel(PortalCache::default());
        Self {
            gateway,
            session,
            notifications,
            cache,
        }
    }

    pub fn snapshot(&self) -> PortalCache {
        self.cache.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PortalCache> {
        self.cache.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.cache.borrow().loading
    }

    /// Reloads jobs and, for a signed-in identity, the applications it may
    /// see. Failures are reported as notices and never returned.
    pub async fn refresh(&self) {
        let session = self.session.borrow().clone();
        let _loading = LoadingGuard::start(&self.cache);

        if let Err(err) = self.load(&session).await {
            error!("Error loading portal data: {}", err);
            let description = if session.is_authenticated() {
                "No se pudieron cargar los datos."
            } else {
                "No se pudieron cargar las ofertas de trabajo."
            };
            self.notifications.error("Error de red", description);
        }
    }

    async fn load(&self, session: &SessionState) -> Result<(), ApiError> {
        let jobs: Vec<JobPosting> = self
            .gateway
            .call(ApiRequest::get(JOBS_PATH))
            .await?
            .into_list()?;
        debug!(count = jobs.len(), "jobs loaded");
        self.cache.send_modify(|c| c.jobs = jobs);

        let Some(identity) = session.identity() else {
            self.clear_applications();
            return Ok(());
        };

        let applications: Vec<Application> = self
            .gateway
            .call(ApiRequest::get(applications_path(identity)))
            .await?
            .into_list()?;
        debug!(count = applications.len(), role = %identity.role, "applications loaded");
        self.cache.send_modify(|c| c.applications = applications);
        Ok(())
    }

    fn clear_applications(&self) {
        self.cache.send_if_modified(|c| {
            if c.applications.is_empty() {
                false
            } else {
                c.applications.clear();
                true
            }
        });
    }

    /// Submits an application with an optional résumé. Returns the record
    /// the server created when its reply can be read as one.
    pub async fn apply_to_job(
        &self,
        job_id: &EntityId,
        form: &ApplicationForm,
        cv: Option<CvAttachment>,
    ) -> Result<Option<Application>, ApiError> {
        let request =
            ApiRequest::post_multipart(format!("{}/{}", APPLICATIONS_PATH, job_id), form, cv)?;
        let response = self.gateway.call(request).await?;
        info!(%job_id, "application submitted");
        self.refresh().await;
        Ok(created_record(response, "application"))
    }

    /// Posts a job. The payload's status is chosen by the caller.
    pub async fn create_job(&self, payload: &CreateJobPayload) -> Result<Option<JobPosting>, ApiError> {
        let response = self
            .gateway
            .call(ApiRequest::post_json(JOBS_PATH, payload)?)
            .await?;
        info!(title = %payload.draft.title, status = %payload.status, "job created");
        self.refresh().await;
        Ok(created_record(response, "job"))
    }

    pub async fn update_job_status(&self, job_id: &EntityId, status: JobStatus) -> Result<(), ApiError> {
        let body = UpdateJobStatusPayload { status };
        self.gateway
            .call(ApiRequest::put_json(format!("{}/{}/status", JOBS_PATH, job_id), &body)?)
            .await?;
        info!(%job_id, %status, "job status updated");
        self.refresh().await;
        Ok(())
    }

    /// Changes an application's status. The message is appended by the
    /// server and shows up after the refresh.
    pub async fn update_application_status(
        &self,
        application_id: &EntityId,
        status: ApplicationStatus,
        message: Option<String>,
    ) -> Result<(), ApiError> {
        let body = UpdateApplicationStatusPayload { status, message };
        self.gateway
            .call(ApiRequest::put_json(
                format!("{}/{}", APPLICATIONS_PATH, application_id),
                &body,
            )?)
            .await?;
        info!(%application_id, %status, "application status updated");
        self.refresh().await;
        Ok(())
    }

    /// Downloads a stored résumé.
    pub async fn fetch_cv(&self, file_name: &str) -> Result<Bytes, ApiError> {
        let name = file_name.trim();
        if name.is_empty() || name.contains('/') || name.contains("..") {
            return Err(ApiError::new(format!("Invalid file name: {}", file_name)));
        }
        self.gateway.download(&format!("/files/cvs/{}", name)).await
    }

    /// Reloads once now and again whenever the signed-in identity changes.
    pub fn watch_identity(self: &Arc<Self>) -> Subscription {
        let store = Arc::clone(self);
        let mut session = self.session.clone();
        let handle = tokio::spawn(async move {
            let mut current = session.borrow_and_update().identity().cloned();
            store.refresh().await;

            while session.changed().await.is_ok() {
                let next = session.borrow_and_update().identity().cloned();
                if next == current {
                    continue;
                }
                debug!(signed_in = next.is_some(), "identity changed, reloading");
                current = next;
                store.clear_applications();
                store.refresh().await;
            }
        });
        Subscription::new(handle)
    }
}
