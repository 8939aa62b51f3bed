use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::DEFAULT_TOAST_MS;

const MAX_TOASTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastStatus {
    Info,
    Success,
    Warning,
    Error,
}

impl ToastStatus {
    pub fn label(self) -> &'static str {
        match self {
            ToastStatus::Info => "INFO",
            ToastStatus::Success => "OK",
            ToastStatus::Warning => "WARN",
            ToastStatus::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub status: ToastStatus,
    pub duration: Duration,
    pub created: Instant,
}

impl Toast {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created) >= self.duration
    }
}

/// Ephemeral feedback queue, newest first.
#[derive(Debug, Clone)]
pub struct Toasts {
    items: VecDeque<Toast>,
    next_id: u64,
    default_duration: Duration,
}

impl Default for Toasts {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_TOAST_MS))
    }
}

impl Toasts {
    pub fn new(default_duration: Duration) -> Self {
        Self {
            items: VecDeque::with_capacity(MAX_TOASTS),
            next_id: 1,
            default_duration,
        }
    }

    pub fn push(
        &mut self,
        status: ToastStatus,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> u64 {
        let duration = self.default_duration;
        self.push_for(status, title, description, duration)
    }

    pub fn push_for(
        &mut self,
        status: ToastStatus,
        title: impl Into<String>,
        description: impl Into<String>,
        duration: Duration,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.items.push_front(Toast {
            id,
            title: title.into(),
            description: description.into(),
            status,
            duration,
            created: Instant::now(),
        });
        self.items.truncate(MAX_TOASTS);
        id
    }

    pub fn success(&mut self, description: impl Into<String>) -> u64 {
        self.push(ToastStatus::Success, "Success", description)
    }

    pub fn error(&mut self, description: impl Into<String>) -> u64 {
        self.push(ToastStatus::Error, "Error", description)
    }

    pub fn warning(&mut self, description: impl Into<String>) -> u64 {
        self.push(ToastStatus::Warning, "Warning", description)
    }

    pub fn info(&mut self, title: impl Into<String>, description: impl Into<String>) -> u64 {
        self.push(ToastStatus::Info, title, description)
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|t| t.id != id);
        self.items.len() != before
    }

    pub fn dismiss_latest(&mut self) -> bool {
        self.items.pop_front().is_some()
    }

    pub fn expire(&mut self, now: Instant) {
        self.items.retain(|t| !t.is_expired(now));
    }

    pub fn visible(&self) -> impl Iterator<Item = &Toast> {
        self.items.iter()
    }

    pub fn latest(&self) -> Option<&Toast> {
        self.items.front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count(&self, status: ToastStatus) -> usize {
        self.items.iter().filter(|t| t.status == status).count()
    }
}
