use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A short user-facing message, the client's equivalent of a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub level: NoticeLevel,
}

#[derive(Clone)]
pub struct NotificationService {
    sender: broadcast::Sender<Notice>,
}

impl Default for NotificationService {
    fn default() -> Self {
        Self::new(64)
    }
}

impl NotificationService {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }

    /// Publishes without waiting for anyone to listen. Notices sent while
    /// nobody is subscribed are dropped.
    pub fn notify(&self, notice: Notice) {
        tracing::debug!(title = %notice.title, level = ?notice.level, "notice");
        let _ = self.sender.send(notice);
    }

    pub fn info(&self, title: &str, description: impl Into<String>) {
        self.notify(Notice {
            title: title.to_string(),
            description: description.into(),
            level: NoticeLevel::Info,
        });
    }

    pub fn success(&self, title: &str, description: impl Into<String>) {
        self.notify(Notice {
            title: title.to_string(),
            description: description.into(),
            level: NoticeLevel::Success,
        });
    }

    pub fn error(&self, title: &str, description: impl Into<String>) {
        self.notify(Notice {
            title: title.to_string(),
            description: description.into(),
            level: NoticeLevel::Error,
        });
    }
}
