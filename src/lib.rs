//! coap-mesh-gateway - CoAP bridge for mesh-network endpoints
//!
//! This library exposes resource-constrained mesh devices (Zigbee-style
//! nodes) on a CoAP namespace and registers each of them with a CoAP
//! Resource Directory so external clients can discover them. The core is
//! the registration pipeline: URI compilation into a correctly ordered
//! option list, destination address resolution, non-confirmable request
//! assembly, and the reactor-driven service that owns it all.
//!
//! # Example
//!
//! ```no_run
//! use coap_mesh_gateway::{GatewayConfig, GatewayService, Reactor};
//! use coap_mesh_gateway::resource::{DeviceDescriptor, MeshNode};
//! use std::rc::Rc;
//!
//! let mut reactor = Reactor::new().unwrap();
//! let mut service = GatewayService::new(GatewayConfig::default());
//! service.init(&mut reactor).unwrap();
//!
//! // The mesh stack reports a new endpoint
//! let node = Rc::new(MeshNode { short_address: 0x4a3b, extended_address: 0x00124b0001020304 });
//! let descriptor = DeviceDescriptor {
//!     endpoint: 1,
//!     profile_id: 0x0104,
//!     device_id: 0x0302,
//!     in_clusters: vec![0x0402],
//!     out_clusters: vec![],
//! };
//! service.attach_resource(1, descriptor, Rc::downgrade(&node));
//!
//! // Drive I/O and housekeeping until the stop flag is set
//! reactor.run(&mut service).unwrap();
//! service.close(&mut reactor);
//! ```

pub mod config;
pub mod engine;
mod error;
pub mod options;
pub mod reactor;
pub mod register;
pub mod request;
pub mod resolve;
pub mod resource;
pub mod service;
pub mod uri;

pub use config::GatewayConfig;
pub use engine::CoapEngine;
pub use error::{GatewayError, Result};
pub use options::OptionList;
pub use reactor::{Reactor, ReactorHandler};
pub use request::TokenGenerator;
pub use resolve::{ResolveAddress, SystemResolver};
pub use resource::{MeshResource, RegistrationState, ResourceRegistry};
pub use service::{GatewayService, ServiceState};
