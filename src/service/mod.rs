//! Mock service lifecycle.
//!
//! # Responsibilities
//! - Own a service's declared actions and its compiled scenario
//! - Drive start/stop, including the listener handshake for dedicated
//!   listeners
//! - Enforce scenario completeness at teardown
//!
//! # Design Decisions
//! - A service handle is a cheap `Arc` clone; the harness and the test hold
//!   the same state
//! - `start`/`stop` are idempotent no-ops when already in the target state
//! - Actions survive `stop`, so a fully consumed service can be started
//!   again and replays the same scenario
//! - `abort` (and drop) tears the listener down without the completeness
//!   check; an existing failure takes precedence over incompleteness

pub mod env;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::Router;

use crate::error::StubError;
use crate::model::{Action, OutboundRequest};
use crate::routing::Scenario;
use crate::server::{
    HandshakeWait, MockServer, ServerHandle, ServerSignal, DEFAULT_HANDSHAKE_TIMEOUT,
};

/// Where a service is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Running,
    Stopped,
}

/// Construction-time options for a service.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub name: String,
    /// Environment variable to point at the service's base URL.
    pub env_var: Option<String>,
    /// Give the service its own listener (and port) instead of the shared one.
    pub unique_url: bool,
    /// Surface handshake expiry as a protocol error instead of assuming the
    /// transition happened.
    pub strict_handshake: bool,
    pub actions: Vec<Action>,
}

impl ServiceConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn env_var(mut self, name: impl Into<String>) -> Self {
        self.env_var = Some(name.into());
        self
    }

    pub fn unique_url(mut self, unique: bool) -> Self {
        self.unique_url = unique;
        self
    }

    pub fn strict_handshake(mut self, strict: bool) -> Self {
        self.strict_handshake = strict;
        self
    }

    pub fn actions(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.actions.extend(actions);
        self
    }
}

struct ServiceInner {
    name: String,
    server: MockServer,
    unique_url: bool,
    strict_handshake: bool,
    actions: Vec<Action>,
    scenario: Option<Scenario>,
    handle: Option<ServerHandle>,
    state: LifecycleState,
}

/// Handle to one simulated upstream dependency.
#[derive(Clone)]
pub struct HttpService {
    inner: Arc<Mutex<ServiceInner>>,
}

impl HttpService {
    pub(crate) fn new(config: ServiceConfig, server: MockServer) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ServiceInner {
                name: config.name,
                server,
                unique_url: config.unique_url,
                strict_handshake: config.strict_handshake,
                actions: config.actions,
                scenario: None,
                handle: None,
                state: LifecycleState::Idle,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ServiceInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn name(&self) -> String {
        self.lock().name.clone()
    }

    pub fn url(&self) -> String {
        self.lock().server.url()
    }

    /// Append actions to the pending list. Takes effect at the next start.
    pub fn add_actions(&self, actions: impl IntoIterator<Item = Action>) {
        self.lock().actions.extend(actions);
    }

    pub fn state(&self) -> LifecycleState {
        self.lock().state
    }

    /// True when every declared response has been consumed (or nothing is
    /// running).
    pub fn is_complete(&self) -> bool {
        self.lock()
            .scenario
            .as_ref()
            .map(Scenario::is_complete)
            .unwrap_or(true)
    }

    pub fn start(&self) -> Result<(), StubError> {
        self.start_with_timeout(DEFAULT_HANDSHAKE_TIMEOUT)
    }

    /// Compile the scenario and, for a dedicated listener, spawn it and wait
    /// for the `started` acknowledgement.
    pub fn start_with_timeout(&self, timeout: Duration) -> Result<(), StubError> {
        let mut inner = self.lock();
        if inner.scenario.is_some() {
            tracing::trace!(service = %inner.name, "service already started");
            return Ok(());
        }

        let scenario = Scenario::from_actions(&inner.name, &inner.actions);

        if inner.unique_url {
            let router = scenario.router()?;
            let initial = scenario.initial_requests();
            tracing::debug!(service = %inner.name, url = %inner.server.url(), "starting dedicated mock server");
            let handle = inner.server.spawn(router, initial)?;
            wait_for(
                &handle,
                ServerSignal::Started,
                timeout,
                &inner.name,
                inner.strict_handshake,
            )?;
            inner.handle = Some(handle);
        }

        inner.scenario = Some(scenario);
        inner.state = LifecycleState::Running;
        Ok(())
    }

    pub fn stop(&self) -> Result<(), StubError> {
        self.stop_with_timeout(DEFAULT_HANDSHAKE_TIMEOUT)
    }

    /// Tear the listener down, then fail if declared responses were left
    /// unconsumed. Actions are retained for a later restart.
    pub fn stop_with_timeout(&self, timeout: Duration) -> Result<(), StubError> {
        let mut inner = self.lock();
        let Some(scenario) = inner.scenario.take() else {
            tracing::trace!(service = %inner.name, "service already stopped");
            return Ok(());
        };
        inner.state = LifecycleState::Stopped;

        if let Some(mut handle) = inner.handle.take() {
            tracing::debug!(service = %inner.name, "stopping dedicated mock server");
            handle.terminate();
            wait_for(
                &handle,
                ServerSignal::Stopped,
                timeout,
                &inner.name,
                inner.strict_handshake,
            )?;
            handle.join();
        }

        let remaining = scenario.remaining();
        if !remaining.is_empty() {
            return Err(StubError::IncompleteScenario {
                service: inner.name.clone(),
                remaining: remaining.join(", "),
            });
        }
        Ok(())
    }

    /// Teardown for failure paths: no handshake verdicts, no completeness
    /// check.
    pub fn abort(&self) {
        let mut inner = self.lock();
        inner.scenario = None;
        inner.state = LifecycleState::Stopped;
        if let Some(mut handle) = inner.handle.take() {
            handle.terminate();
            handle.join();
        }
    }

    /// Paths this service contributes to the shared listener; empty for
    /// dedicated or unstarted services.
    pub(crate) fn shared_paths(&self) -> Vec<String> {
        let inner = self.lock();
        if inner.unique_url {
            return Vec::new();
        }
        inner
            .scenario
            .as_ref()
            .map(Scenario::paths)
            .unwrap_or_default()
    }

    /// Router and startup batch for services riding the shared listener.
    pub(crate) fn shared_parts(
        &self,
    ) -> Result<Option<(Router, Vec<OutboundRequest>)>, StubError> {
        let inner = self.lock();
        if inner.unique_url {
            return Ok(None);
        }
        match &inner.scenario {
            Some(scenario) => Ok(Some((scenario.router()?, scenario.initial_requests()))),
            None => Ok(None),
        }
    }
}

fn wait_for(
    handle: &ServerHandle,
    expected: ServerSignal,
    timeout: Duration,
    service: &str,
    strict: bool,
) -> Result<(), StubError> {
    match handle.wait_signal(timeout) {
        HandshakeWait::Signal(signal) if signal == expected => Ok(()),
        HandshakeWait::Signal(signal) => Err(StubError::Protocol {
            service: service.to_string(),
            reason: format!("received {signal:?} while waiting for {expected:?}"),
        }),
        HandshakeWait::Empty if strict => Err(StubError::Protocol {
            service: service.to_string(),
            reason: format!("no {expected:?} acknowledgement within {timeout:?}"),
        }),
        HandshakeWait::Empty => {
            tracing::warn!(
                service,
                ?expected,
                ?timeout,
                "no acknowledgement within timeout, assuming transition happened"
            );
            Ok(())
        }
    }
}
