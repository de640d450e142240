//! View models for each page. Reads are plain functions over a cache
//! snapshot; actions go through [`crate::Portal`] and report to the user
//! through notices.

pub mod applications;
pub mod approve_jobs;
pub mod auth;
pub mod create_job;
pub mod dashboard;
pub mod jobs;
pub mod manage_applications;
pub mod nav;

use crate::error::ApiError;

/// Server text when there is any, otherwise the page's own wording.
pub(crate) fn failure_text(err: &ApiError, fallback: &str) -> String {
    if err.message.trim().is_empty() {
        fallback.to_string()
    } else {
        err.message.clone()
    }
}
