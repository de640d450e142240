pub mod api_client;
pub mod jobs_service;
pub mod notification_service;
pub mod session_service;
pub mod session_storage;

use tokio::task::JoinHandle;

/// Owns a background listener and stops it when dropped.
#[derive(Debug)]
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
