//! Mesh-backed CoAP resources and their registry
//!
//! Each addressable unit on the mesh becomes one [`MeshResource`] owned by
//! the registry. The registry is append-only and never deduplicates: a
//! device that attaches twice yields two entries, which is the documented
//! baseline behavior of this gateway.

use log::debug;
use std::rc::Weak;

/// Highest mesh application endpoint id; 0 is the device-management
/// endpoint and ids above 240 are reserved.
const MAX_APP_ENDPOINT: u8 = 240;

/// A device on the mesh network, owned by the mesh stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshNode {
    /// Network short address
    pub short_address: u16,
    /// IEEE extended address
    pub extended_address: u64,
}

/// Non-owning reference to a mesh device
pub type DeviceRef = Weak<MeshNode>;

/// Simple descriptor for one endpoint on a mesh device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub endpoint: u8,
    pub profile_id: u16,
    pub device_id: u16,
    pub in_clusters: Vec<u16>,
    pub out_clusters: Vec<u16>,
}

/// Registration lifecycle of one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    /// Allocated, not yet initialized or sent anywhere
    Created,
    /// Registration request handed to the engine
    Registered,
    /// Initialization or registration failed; kept for inspection
    Failed,
    /// Service closed while this entry was registered
    Unregistered,
}

/// One mesh endpoint exposed as a CoAP resource
#[derive(Debug, Clone)]
pub struct MeshResource {
    endpoint: u8,
    descriptor: DeviceDescriptor,
    device: DeviceRef,
    uri: String,
    payload: Vec<u8>,
    state: RegistrationState,
}

impl MeshResource {
    /// Allocate a resource bound to a device endpoint, in Created state
    pub fn new(endpoint: u8, descriptor: DeviceDescriptor, device: DeviceRef) -> Self {
        Self {
            endpoint,
            descriptor,
            device,
            uri: String::new(),
            payload: Vec::new(),
            state: RegistrationState::Created,
        }
    }

    /// Resource-specific initialization
    ///
    /// Derives the resource URI and the link-format description document
    /// from the device. Fails for reserved endpoint ids or when the device
    /// reference is gone; the caller leaves the entry Failed in that case.
    pub fn initialize(&mut self) -> std::result::Result<(), String> {
        if self.endpoint == 0 || self.endpoint > MAX_APP_ENDPOINT {
            return Err(format!("reserved mesh endpoint id {}", self.endpoint));
        }

        let node = self
            .device
            .upgrade()
            .ok_or_else(|| "device reference no longer valid".to_string())?;

        self.uri = format!("/{:04x}/{}", node.short_address, self.endpoint);
        self.payload = format!(
            "<{}>;rt=\"mesh.dev.{:04x}.{:04x}\";ep={}",
            self.uri, self.descriptor.profile_id, self.descriptor.device_id, self.endpoint
        )
        .into_bytes();

        Ok(())
    }

    /// Endpoint name used for RD registration: IEEE address plus endpoint id
    pub fn endpoint_name(&self) -> String {
        match self.device.upgrade() {
            Some(node) => format!("{:016x}-{}", node.extended_address, self.endpoint),
            None => format!("unknown-{}", self.endpoint),
        }
    }

    pub fn endpoint(&self) -> u8 {
        self.endpoint
    }

    pub fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    /// Resource path on this gateway
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Description document sent to the RD
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn state(&self) -> RegistrationState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: RegistrationState) {
        self.state = state;
    }
}

/// Stable handle into the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle(usize);

/// Append-only collection of mesh resources
///
/// Entries are owned here and addressed by handle. Duplicate attaches are
/// stored as independent entries; nothing is ever removed, so handles stay
/// valid for the registry's lifetime.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    resources: Vec<MeshResource>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resource unconditionally and return its handle
    pub fn push(&mut self, resource: MeshResource) -> ResourceHandle {
        let handle = ResourceHandle(self.resources.len());
        debug!(
            "registry entry {} for endpoint {}",
            handle.0,
            resource.endpoint()
        );
        self.resources.push(resource);
        handle
    }

    pub fn get(&self, handle: ResourceHandle) -> Option<&MeshResource> {
        self.resources.get(handle.0)
    }

    pub fn get_mut(&mut self, handle: ResourceHandle) -> Option<&mut MeshResource> {
        self.resources.get_mut(handle.0)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MeshResource> {
        self.resources.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, MeshResource> {
        self.resources.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
