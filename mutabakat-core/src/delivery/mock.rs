//! Recording worker host for tests

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use url::Url;

use super::host::{WindowClient, WorkerHost};
use super::payload::PresentedNotification;
use crate::error::PlatformError;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct HostState {
    shown: Vec<PresentedNotification>,
    closed: Vec<String>,
    windows: Vec<WindowClient>,
    focused: Vec<String>,
    opened: Vec<String>,
    claims: usize,
    fail_show: bool,
    fail_open: bool,
}

/// Host that records every call and keeps a scripted window list
#[derive(Debug, Default)]
pub struct MockHost {
    state: Mutex<HostState>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an open window
    pub fn add_window(&self, id: &str, url: &str) {
        lock(&self.state).windows.push(WindowClient {
            id: id.to_string(),
            url: url.to_string(),
        });
    }

    pub fn fail_show(&self, fail: bool) {
        lock(&self.state).fail_show = fail;
    }

    pub fn fail_open(&self, fail: bool) {
        lock(&self.state).fail_open = fail;
    }

    pub fn shown(&self) -> Vec<PresentedNotification> {
        lock(&self.state).shown.clone()
    }

    /// Tags of closed notifications
    pub fn closed(&self) -> Vec<String> {
        lock(&self.state).closed.clone()
    }

    /// Ids of focused windows
    pub fn focused(&self) -> Vec<String> {
        lock(&self.state).focused.clone()
    }

    /// URLs of opened windows
    pub fn opened(&self) -> Vec<String> {
        lock(&self.state).opened.clone()
    }

    pub fn claims(&self) -> usize {
        lock(&self.state).claims
    }
}

#[async_trait]
impl WorkerHost for MockHost {
    async fn show_notification(
        &self,
        notification: &PresentedNotification,
    ) -> Result<(), PlatformError> {
        let mut state = lock(&self.state);
        if state.fail_show {
            return Err(PlatformError::Unavailable("notifications".into()));
        }
        state.shown.push(notification.clone());
        Ok(())
    }

    async fn close_notification(&self, notification: &PresentedNotification) {
        lock(&self.state).closed.push(notification.tag.clone());
    }

    async fn windows(&self) -> Result<Vec<WindowClient>, PlatformError> {
        Ok(lock(&self.state).windows.clone())
    }

    async fn focus(&self, window: &WindowClient) -> Result<(), PlatformError> {
        lock(&self.state).focused.push(window.id.clone());
        Ok(())
    }

    async fn open_window(&self, url: &Url) -> Result<(), PlatformError> {
        let mut state = lock(&self.state);
        if state.fail_open {
            return Err(PlatformError::Failed("popup blocked".into()));
        }
        state.opened.push(url.to_string());
        let id = format!("opened-{}", state.opened.len());
        state.windows.push(WindowClient {
            id,
            url: url.to_string(),
        });
        Ok(())
    }

    async fn claim_clients(&self) -> Result<(), PlatformError> {
        lock(&self.state).claims += 1;
        Ok(())
    }
}
