pub mod application;
pub mod id;
pub mod job;
pub mod user;

pub use application::{Application, ApplicationStatus, ApplicantRef, JobSummary, StatusMessage};
pub use id::EntityId;
pub use job::{JobAuthor, JobPosting, JobStatus};
pub use user::{Credential, Identity, Role};
