use crate::models::{ApplicationStatus, JobStatus};
use crate::services::jobs_service::PortalCache;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashboardStats {
    pub active_jobs: usize,
    pub total_applications: usize,
    /// Accepted over total, as a percentage rounded to one decimal.
    pub acceptance_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobApplicationCount {
    pub title: String,
    pub applications: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCount {
    pub status: ApplicationStatus,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analytics {
    pub stats: Option<DashboardStats>,
    pub per_job: Vec<JobApplicationCount>,
    pub by_status: Vec<StatusCount>,
}

impl Analytics {
    pub fn is_empty(&self) -> bool {
        self.stats.is_none()
    }
}

pub fn acceptance_rate(accepted: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (accepted as f64 / total as f64 * 1000.0).round() / 10.0
}

pub fn analytics(cache: &PortalCache) -> Analytics {
    if cache.loading || cache.jobs.is_empty() {
        return Analytics::default();
    }

    let applications = &cache.applications;
    let count_with = |status: ApplicationStatus| {
        applications.iter().filter(|app| app.status == status).count()
    };

    let stats = DashboardStats {
        active_jobs: cache.jobs_with_status(JobStatus::Approved).len(),
        total_applications: applications.len(),
        acceptance_rate: acceptance_rate(count_with(ApplicationStatus::Accepted), applications.len()),
    };

    let mut per_job: Vec<JobApplicationCount> = cache
        .jobs
        .iter()
        .map(|job| JobApplicationCount {
            title: job.title.clone(),
            applications: applications.iter().filter(|app| app.is_for_job(&job.id)).count(),
        })
        .filter(|entry| entry.applications > 0)
        .collect();
    per_job.sort_by(|a, b| b.applications.cmp(&a.applications));

    let by_status = ApplicationStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            label: status.label(),
            count: count_with(status),
        })
        .filter(|entry| entry.count > 0)
        .collect();

    Analytics {
        stats: Some(stats),
        per_job,
        by_status,
    }
}
