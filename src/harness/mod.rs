//! Scenario harness: one shared listener, many services.
//!
//! # Responsibilities
//! - Hand out service handles, on the shared listener or a dedicated one
//! - Patch environment variables with service base URLs for the run
//! - Drive start/stop of every service plus the shared listener
//!
//! # Design Decisions
//! - Services that do not need network isolation share one listener; their
//!   routers merge into a single dispatch table, so they must declare
//!   distinct paths — a collision fails `start` instead of being merged
//! - `stop` always tears everything down; the first failure is reported
//!   after remaining services have been stopped
//! - Dropping the harness aborts whatever is still running and restores the
//!   patched environment

use std::collections::HashMap;
use std::time::Duration;

use axum::Router;

use crate::error::StubError;
use crate::server::{HandshakeWait, MockServer, ServerHandle, ServerSignal, DEFAULT_HANDSHAKE_TIMEOUT};
use crate::service::env::EnvVarGuard;
use crate::service::{HttpService, ServiceConfig};

/// Owns the shared listener and every service created through it.
pub struct HttpMock {
    shared: MockServer,
    shared_handle: Option<ServerHandle>,
    services: Vec<HttpService>,
    env_guards: Vec<EnvVarGuard>,
}

impl HttpMock {
    pub fn new() -> Self {
        Self {
            shared: MockServer::new(),
            shared_handle: None,
            services: Vec::new(),
            env_guards: Vec::new(),
        }
    }

    /// Base URL of the shared listener.
    pub fn shared_url(&self) -> String {
        self.shared.url()
    }

    /// Create a service. A `unique_url` service gets its own listener
    /// address from the port cursor; others ride the shared listener. When
    /// an env var is configured it is patched immediately, so code under
    /// test can read the address before anything is started.
    pub fn new_service(&mut self, config: ServiceConfig) -> HttpService {
        let server = if config.unique_url {
            MockServer::new()
        } else {
            self.shared.clone()
        };

        if let Some(var) = &config.env_var {
            self.env_guards
                .push(EnvVarGuard::set(var.clone(), &server.url()));
        }

        let service = HttpService::new(config, server);
        self.services.push(service.clone());
        service
    }

    pub fn start(&mut self) -> Result<(), StubError> {
        self.start_with_timeout(DEFAULT_HANDSHAKE_TIMEOUT)
    }

    /// Start every service, then bring up the shared listener if any service
    /// rides it. Services added after the shared listener is up are not
    /// routed until the next full stop/start cycle.
    pub fn start_with_timeout(&mut self, timeout: Duration) -> Result<(), StubError> {
        for service in &self.services {
            service.start_with_timeout(timeout)?;
        }

        if self.shared_handle.is_some() {
            tracing::trace!("shared mock server already running");
            return Ok(());
        }

        let mut router = Router::new();
        let mut startup = Vec::new();
        let mut owners: HashMap<String, String> = HashMap::new();
        let mut any_shared = false;
        for service in &self.services {
            if let Some((service_router, initial)) = service.shared_parts()? {
                // colliding paths cannot merge into one dispatch table
                for path in service.shared_paths() {
                    if let Some(first) = owners.insert(path.clone(), service.name()) {
                        return Err(StubError::DuplicateEndpoint {
                            path,
                            first,
                            second: service.name(),
                        });
                    }
                }
                router = router.merge(service_router);
                startup.extend(initial);
                any_shared = true;
            }
        }
        if !any_shared {
            return Ok(());
        }

        tracing::debug!(url = %self.shared.url(), "starting shared mock server");
        let handle = self.shared.spawn(router, startup)?;
        match handle.wait_signal(timeout) {
            HandshakeWait::Signal(ServerSignal::Started) => {}
            HandshakeWait::Signal(signal) => {
                return Err(StubError::Protocol {
                    service: "shared server".into(),
                    reason: format!("received {signal:?} while waiting for Started"),
                });
            }
            HandshakeWait::Empty => {
                tracing::warn!(?timeout, "shared server gave no startup acknowledgement, assuming it is up");
            }
        }
        self.shared_handle = Some(handle);
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), StubError> {
        self.stop_with_timeout(DEFAULT_HANDSHAKE_TIMEOUT)
    }

    /// Stop the shared listener, then every service. All teardowns run even
    /// when one fails; the first error is returned.
    pub fn stop_with_timeout(&mut self, timeout: Duration) -> Result<(), StubError> {
        let mut first_error: Option<StubError> = None;

        if let Some(mut handle) = self.shared_handle.take() {
            tracing::debug!(url = %self.shared.url(), "stopping shared mock server");
            handle.terminate();
            match handle.wait_signal(timeout) {
                HandshakeWait::Signal(ServerSignal::Stopped) => {}
                HandshakeWait::Signal(signal) => {
                    first_error = Some(StubError::Protocol {
                        service: "shared server".into(),
                        reason: format!("received {signal:?} while waiting for Stopped"),
                    });
                }
                HandshakeWait::Empty => {
                    tracing::warn!(?timeout, "shared server gave no shutdown acknowledgement");
                }
            }
            handle.join();
        }

        for service in &self.services {
            if let Err(err) = service.stop_with_timeout(timeout) {
                tracing::error!(service = %service.name(), error = %err, "service teardown failed");
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Failure-path teardown: no handshake verdicts, no completeness checks.
    pub fn abort(&mut self) {
        self.shared_handle = None;
        for service in &self.services {
            service.abort();
        }
    }
}

impl Default for HttpMock {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for HttpMock {
    fn drop(&mut self) {
        self.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Action, RequestSpec, ResponseSpec};

    #[test]
    fn shared_and_dedicated_services_get_distinct_urls() {
        let mut mock = HttpMock::new();
        let shared_a = mock.new_service(ServiceConfig::named("a"));
        let shared_b = mock.new_service(ServiceConfig::named("b"));
        let dedicated = mock.new_service(ServiceConfig::named("c").unique_url(true));

        assert_eq!(shared_a.url(), shared_b.url());
        assert_eq!(shared_a.url(), mock.shared_url());
        assert_ne!(dedicated.url(), mock.shared_url());
    }

    #[test]
    fn env_var_is_patched_at_creation_and_restored_on_drop() {
        let var = "HTTPSTUB_HARNESS_ENV_TEST";
        std::env::remove_var(var);
        {
            let mut mock = HttpMock::new();
            let service = mock.new_service(ServiceConfig::named("a").env_var(var));
            assert_eq!(std::env::var(var).ok().as_deref(), Some(service.url().as_str()));
        }
        assert!(std::env::var(var).is_err());
    }

    #[test]
    fn colliding_shared_paths_fail_start_instead_of_panicking() {
        let mut mock = HttpMock::new();
        mock.new_service(ServiceConfig::named("a").actions([Action::Response(
            ResponseSpec::for_request(RequestSpec::get("/dup")),
        )]));
        mock.new_service(ServiceConfig::named("b").actions([Action::Response(
            ResponseSpec::for_request(RequestSpec::get("/dup")),
        )]));

        let err = mock.start().expect_err("colliding paths must fail start");
        assert!(matches!(err, StubError::DuplicateEndpoint { .. }));
        let text = err.to_string();
        assert!(text.contains("/dup"));
        assert!(text.contains("'a'"));
        assert!(text.contains("'b'"));
        mock.abort();
    }

    #[test]
    fn shared_path_collision_is_per_path_even_across_methods() {
        // same-path routers cannot merge even when their methods differ
        let mut mock = HttpMock::new();
        mock.new_service(ServiceConfig::named("reader").actions([Action::Response(
            ResponseSpec::for_request(RequestSpec::get("/resource")),
        )]));
        mock.new_service(ServiceConfig::named("writer").actions([Action::Response(
            ResponseSpec::for_request(RequestSpec::post("/resource")),
        )]));

        let err = mock.start().expect_err("same path from two services");
        assert!(matches!(err, StubError::DuplicateEndpoint { .. }));
        mock.abort();
    }

    #[test]
    fn stop_reports_the_first_incomplete_service() {
        let mut mock = HttpMock::new();
        let service = mock.new_service(ServiceConfig::named("a").actions([Action::Response(
            ResponseSpec::for_request(RequestSpec::get("/never-called")),
        )]));
        mock.start().expect("start");
        assert!(!service.is_complete());

        let err = mock.stop().expect_err("unconsumed response must fail stop");
        assert!(matches!(err, StubError::IncompleteScenario { .. }));
        // teardown still completed; a second stop is clean
        mock.stop().expect("idempotent stop");
    }
}
