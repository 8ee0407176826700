// --- User-Visible Notifications (collaborator interface) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Rendering of toasts/readouts is host-environment work; the engine only
/// states what happened and how loudly.
pub trait Notifier: Send {
    fn notify(&self, level: NoticeLevel, message: &str);

    fn info(&self, message: &str) {
        self.notify(NoticeLevel::Info, message);
    }
    fn success(&self, message: &str) {
        self.notify(NoticeLevel::Success, message);
    }
    fn warning(&self, message: &str) {
        self.notify(NoticeLevel::Warning, message);
    }
    fn error(&self, message: &str) {
        self.notify(NoticeLevel::Error, message);
    }
}

/// Default sink: route notices into the log stream.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info | NoticeLevel::Success => log::info!("{}", message),
            NoticeLevel::Warning => log::warn!("{}", message),
            NoticeLevel::Error => log::error!("{}", message),
        }
    }
}
