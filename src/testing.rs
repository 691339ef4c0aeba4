//! In-memory fetcher and sink used across unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::Notification;
use crate::errors::{HeraldError, HeraldResult};
use crate::fetch::Fetcher;
use crate::sinks::DeliverySink;

/// Serves canned pages by URL; unknown URLs answer 404.
#[derive(Default)]
pub struct FakeFetcher {
    pages: Mutex<HashMap<String, Vec<u8>>>,
    unreachable: Mutex<HashSet<String>>,
    calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.set_page(url, body);
        self
    }

    pub fn set_page(&self, url: &str, body: impl Into<Vec<u8>>) {
        self.unreachable.lock().unwrap().remove(url);
        self.pages.lock().unwrap().insert(url.to_string(), body.into());
    }

    /// Make `url` fail with a network error until it is set again
    pub fn set_unreachable(&self, url: &str) {
        self.unreachable.lock().unwrap().insert(url.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> HeraldResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.unreachable.lock().unwrap().contains(url) {
            return Err(HeraldError::Network {
                url: url.to_string(),
                message: "connection refused".to_string(),
            });
        }

        self.pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| HeraldError::HttpStatus {
                status: 404,
                url: url.to_string(),
            })
    }
}

/// Keeps every notification it accepts.
#[derive(Default)]
pub struct RecordingSink {
    delivered: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.delivered().into_iter().map(|n| n.title).collect()
    }
}

#[async_trait]
impl DeliverySink for RecordingSink {
    async fn deliver(&self, notification: &Notification) -> HeraldResult<()> {
        self.delivered.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
