//! Session and view synchronization.
//!
//! The controller owns the [`Views`] the UI renders. Handlers validate local
//! input, call the gateway and re-synchronize views through the refresh
//! cascade. Failures never escape a handler: each one ends in an
//! [`Outcome`].

mod classify;
mod guard;
mod handlers;
mod refresh;
mod views;

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use tokio::time::Instant;

use crate::{
    client::Client,
    config::{AppConfig, StaleSelection},
    session::Session,
};

pub use classify::{Context, Failure, classify, user_message};
pub use guard::{InFlight, Resource, Slot};
pub use handlers::parse_amount;
pub use refresh::{Refresh, SelectionStatus};
pub use views::{
    AuthView, LoginForm, Notice, NoticeLevel, OperationForm, StatementView, Views,
};

/// How a handler invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// The cascade ran without a session.
    LoggedOut,
    /// A refresh was rejected; the session has been dropped.
    SessionExpired,
    /// A refresh could not reach the server; the session is kept.
    Unreachable,
    /// Local input was rejected before any request.
    Invalid(String),
    /// The server or the transport failed a mutation.
    Failed(String),
    /// Another call on the same resource is still running.
    Busy,
}

impl From<Refresh> for Outcome {
    fn from(value: Refresh) -> Self {
        match value {
            Refresh::Synced => Self::Done,
            Refresh::LoggedOut => Self::LoggedOut,
            Refresh::SessionExpired => Self::SessionExpired,
            Refresh::Unreachable => Self::Unreachable,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ControllerSettings {
    pub notice_ttl: Duration,
    pub stale_selection: StaleSelection,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ControllerSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            notice_ttl: config.notice_ttl(),
            stale_selection: config.stale_selection,
        }
    }
}

#[derive(Debug)]
struct Inner {
    client: Client,
    views: Mutex<Views>,
    in_flight: InFlight,
    settings: ControllerSettings,
}

/// Cheap to clone; clones drive the same session and views.
#[derive(Debug, Clone)]
pub struct Controller {
    inner: Arc<Inner>,
}

impl Controller {
    pub fn new(client: Client, settings: ControllerSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                views: Mutex::new(Views::default()),
                in_flight: InFlight::default(),
                settings,
            }),
        }
    }

    pub fn session(&self) -> &Session {
        self.inner.client.session()
    }

    pub fn settings(&self) -> ControllerSettings {
        self.inner.settings
    }

    /// Snapshot of the rendered state, busy resources included.
    pub fn views(&self) -> Views {
        let mut views = self.with_views(|views| views.clone());
        views.busy = self.inner.in_flight.active();
        views
    }

    /// Runs `f` on the live views. Never hold this across a request.
    pub fn with_views<R>(&self, f: impl FnOnce(&mut Views) -> R) -> R {
        let mut views = self
            .inner
            .views
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut views)
    }

    /// Drops notices whose display time is over.
    pub fn tick(&self) {
        let now = Instant::now();
        self.with_views(|views| views.prune_expired(now));
    }

    fn acquire(&self, resource: Resource) -> Option<Slot> {
        let slot = self.inner.in_flight.try_acquire(resource);
        if slot.is_none() {
            tracing::debug!(?resource, "busy, call ignored");
        }
        slot
    }

    fn notice_deadline(&self) -> Instant {
        Instant::now() + self.inner.settings.notice_ttl
    }
}
