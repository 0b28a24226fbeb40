//! Gateway service
//!
//! Top-level owner of the engine handle, the resource registry, and the
//! configuration. The mesh stack hands newly visible endpoints to
//! [`GatewayService::attach_resource`]; the host reactor drives
//! [`ReactorHandler::on_readable`] and [`ReactorHandler::on_timeout`].

use crate::config::GatewayConfig;
use crate::engine::CoapEngine;
use crate::error::{GatewayError, Result};
use crate::reactor::{Reactor, ReactorHandler};
use crate::register;
use crate::request::TokenGenerator;
use crate::resolve::{ResolveAddress, SystemResolver};
use crate::resource::{
    DeviceDescriptor, DeviceRef, MeshResource, RegistrationState, ResourceHandle, ResourceRegistry,
};
use log::{error, info, warn};

/// Service lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Uninitialized,
    Initialized,
    Closed,
}

/// The gateway: owns the engine, the registry, and the registration pipeline
#[derive(Debug)]
pub struct GatewayService<R: ResolveAddress = SystemResolver> {
    config: GatewayConfig,
    engine: Option<CoapEngine>,
    registry: ResourceRegistry,
    tokens: TokenGenerator,
    resolver: R,
    state: ServiceState,
}

impl GatewayService<SystemResolver> {
    /// Construct an uninitialized service with the blocking system resolver
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_resolver(config, SystemResolver)
    }
}

impl<R: ResolveAddress> GatewayService<R> {
    /// Construct with a substitute resolver
    pub fn with_resolver(config: GatewayConfig, resolver: R) -> Self {
        Self {
            config,
            engine: None,
            registry: ResourceRegistry::new(),
            tokens: TokenGenerator::new(),
            resolver,
            state: ServiceState::Uninitialized,
        }
    }

    /// Allocate and bind the engine, then hook into the reactor
    ///
    /// On error the service stays Uninitialized and must not be used to
    /// attach resources. A second init without an intervening close is
    /// refused rather than orphaning the first engine handle.
    pub fn init(&mut self, reactor: &mut Reactor) -> Result<()> {
        if self.state != ServiceState::Uninitialized {
            return Err(GatewayError::EngineAllocation(format!(
                "init on {:?} service",
                self.state
            )));
        }

        let mut engine = CoapEngine::bind(
            &self.config.bind_addr,
            self.config.bind_port,
            self.config.debug_level,
        )?;

        reactor.register(engine.socket_mut())?;
        reactor.schedule_timer(self.config.timer_interval());

        info!("gateway engine bound to {}", engine.local_addr()?);
        self.engine = Some(engine);
        self.state = ServiceState::Initialized;
        Ok(())
    }

    /// Entry point for the mesh stack: a new addressable unit appeared
    ///
    /// The resource is appended to the registry unconditionally, then
    /// initialized and registered with the Resource Directory. Failures are
    /// logged and leave only this entry Failed; other resources and the
    /// reactor integration are unaffected.
    pub fn attach_resource(
        &mut self,
        endpoint: u8,
        descriptor: DeviceDescriptor,
        device: DeviceRef,
    ) -> ResourceHandle {
        let resource = MeshResource::new(endpoint, descriptor, device);
        let handle = self.registry.push(resource);

        if self.state != ServiceState::Initialized {
            warn!("attach for endpoint {endpoint} while service is {:?}", self.state);
            self.set_state(handle, RegistrationState::Failed);
            return handle;
        }

        if let Some(resource) = self.registry.get_mut(handle)
            && let Err(reason) = resource.initialize()
        {
            error!("failed to initialize resource for endpoint {endpoint}: {reason}");
            resource.set_state(RegistrationState::Failed);
            return handle;
        }

        match self.register_with_directory(handle) {
            Ok(()) => self.set_state(handle, RegistrationState::Registered),
            Err(e) => {
                error!("registration failed for endpoint {endpoint}: {e}");
                self.set_state(handle, RegistrationState::Failed);
            }
        }
        handle
    }

    /// Run the registration workflow for one initialized registry entry
    fn register_with_directory(&mut self, handle: ResourceHandle) -> Result<()> {
        let (url, payload) = match self.registry.get(handle) {
            Some(resource) => (
                register::registration_url(
                    &self.config.rd_addr,
                    self.config.rd_port,
                    &resource.endpoint_name(),
                ),
                resource.payload().to_vec(),
            ),
            None => return Ok(()),
        };

        let engine = self
            .engine
            .as_mut()
            .ok_or_else(|| GatewayError::EngineAllocation("engine not initialized".to_string()))?;

        register::register_resource(
            engine,
            &self.resolver,
            &mut self.tokens,
            &url,
            &payload,
            self.config.uri_buffer_limit,
        )
    }

    /// Detach from the reactor and release the engine; idempotent
    pub fn close(&mut self, reactor: &mut Reactor) {
        if self.state != ServiceState::Initialized {
            self.state = ServiceState::Closed;
            return;
        }

        if let Some(mut engine) = self.engine.take() {
            if let Err(e) = reactor.deregister(engine.socket_mut()) {
                warn!("deregister during close failed: {e}");
            }
        }
        reactor.cancel_timer();

        for resource in self.registry.iter_mut() {
            if resource.state() == RegistrationState::Registered {
                resource.set_state(RegistrationState::Unregistered);
            }
        }

        info!("gateway service closed");
        self.state = ServiceState::Closed;
    }

    fn set_state(&mut self, handle: ResourceHandle, state: RegistrationState) {
        if let Some(resource) = self.registry.get_mut(handle) {
            resource.set_state(state);
        }
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Engine handle, present while Initialized
    pub fn engine(&self) -> Option<&CoapEngine> {
        self.engine.as_ref()
    }
}

impl<R: ResolveAddress> ReactorHandler for GatewayService<R> {
    fn on_readable(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.handle_input();
        }
    }

    fn on_timeout(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.handle_timeout();
        }
    }
}
