use crate::models::{Application, ApplicationStatus, Identity};
use crate::services::jobs_service::PortalCache;
use crate::utils::time::format_display_opt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineStep {
    pub status: ApplicationStatus,
    pub label: &'static str,
    pub reached: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub text: String,
    pub sent: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationView {
    pub application: Application,
    pub status_label: &'static str,
    pub applied: String,
    pub timeline: Vec<TimelineStep>,
    /// Accepted or rejected, shown after the last timeline step.
    pub outcome: Option<ApplicationStatus>,
    pub messages: Vec<MessageView>,
}

pub fn timeline(status: ApplicationStatus) -> Vec<TimelineStep> {
    let current = status.timeline_position();
    ApplicationStatus::TIMELINE
        .iter()
        .enumerate()
        .map(|(idx, step)| TimelineStep {
            status: *step,
            label: step.label(),
            reached: idx <= current,
        })
        .collect()
}

impl ApplicationView {
    fn new(application: &Application) -> Self {
        let status = application.status;
        Self {
            status_label: status.candidate_label(),
            applied: format_display_opt(application.applied_at.as_ref()),
            timeline: timeline(status),
            outcome: status.is_terminal().then_some(status),
            messages: application
                .messages
                .iter()
                .map(|msg| MessageView {
                    text: msg.text.clone(),
                    sent: format_display_opt(msg.created_at.as_ref()),
                })
                .collect(),
            application: application.clone(),
        }
    }
}

/// The candidate's own applications. Records whose job summary is missing
/// cannot be displayed and are skipped.
pub fn my_applications(cache: &PortalCache, identity: &Identity) -> Vec<ApplicationView> {
    cache
        .applications
        .iter()
        .filter(|app| app.belongs_to(&identity.id) && app.job.is_some())
        .map(ApplicationView::new)
        .collect()
}
