//! CoAP message engine handle
//!
//! Owns the bound UDP transport, issues message ids, and performs the raw
//! send/receive work. Retransmission, ACK matching, and blockwise transfer
//! are out of scope here; registration traffic is non-confirmable and
//! fire-and-forget.

use crate::error::{GatewayError, Result};
use coap_lite::Packet;
use log::{debug, trace, warn};
use mio::net::UdpSocket;
use std::net::{IpAddr, SocketAddr};
use std::time::{SystemTime, UNIX_EPOCH};

/// Largest datagram the engine will accept
const RECV_BUFFER_SIZE: usize = 1500;

/// Handle to the CoAP engine: bound socket plus message-id issuance
#[derive(Debug)]
pub struct CoapEngine {
    socket: UdpSocket,
    message_id: u16,
    debug_level: u8,
    sent: u64,
    received: u64,
}

impl CoapEngine {
    /// Allocate the engine and bind its transport socket
    ///
    /// A bind address that is not a valid IP literal is an allocation
    /// failure; an OS-level bind error is a bind failure. Both are fatal to
    /// service init.
    pub fn bind(addr: &str, port: u16, debug_level: u8) -> Result<Self> {
        let ip: IpAddr = addr
            .parse()
            .map_err(|_| GatewayError::EngineAllocation(format!("invalid bind address '{addr}'")))?;

        let socket =
            UdpSocket::bind(SocketAddr::new(ip, port)).map_err(GatewayError::EngineBind)?;

        Ok(Self {
            socket,
            message_id: initial_message_id(),
            debug_level,
            sent: 0,
            received: 0,
        })
    }

    /// Issue a fresh message id, unique among in-flight exchanges
    pub fn next_message_id(&mut self) -> u16 {
        let id = self.message_id;
        self.message_id = self.message_id.wrapping_add(1);
        id
    }

    /// Allocate an empty PDU for the caller to populate
    pub fn allocate_pdu(&mut self) -> Result<Packet> {
        Ok(Packet::new())
    }

    /// Encode and transmit one PDU; no delivery tracking is retained
    pub fn send(&mut self, pdu: &Packet, dst: SocketAddr) -> Result<()> {
        let bytes = pdu.to_bytes()?;
        self.socket.send_to(&bytes, dst)?;
        self.sent += 1;

        if self.debug_level > 0 {
            debug!(
                "sent {} byte PDU mid={} to {}",
                bytes.len(),
                pdu.header.message_id,
                dst
            );
        }
        Ok(())
    }

    /// Drain and parse readable datagrams
    ///
    /// Inbound messages are logged and dropped: this subsystem consumes no
    /// responses.
    pub fn handle_input(&mut self) {
        let mut buf = [0u8; RECV_BUFFER_SIZE];
        loop {
            match self.socket.recv_from(&mut buf) {
                Ok((len, src)) => {
                    self.received += 1;
                    match Packet::from_bytes(&buf[..len]) {
                        Ok(packet) => {
                            if self.debug_level > 0 {
                                debug!(
                                    "received {:?} mid={} from {} ({} bytes, dropped)",
                                    packet.header.code, packet.header.message_id, src, len
                                );
                            }
                        }
                        Err(e) => warn!("undecodable datagram from {src}: {e}"),
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("engine receive error: {e}");
                    break;
                }
            }
        }
    }

    /// Time-based housekeeping
    ///
    /// Nothing to retransmit with NON-only traffic; this stays as the seam
    /// confirmable retries would hang off.
    pub fn handle_timeout(&mut self) {
        if self.debug_level > 1 {
            trace!(
                "engine housekeeping: {} sent, {} received",
                self.sent, self.received
            );
        }
    }

    /// Socket handle, for reactor registration
    pub fn socket_mut(&mut self) -> &mut UdpSocket {
        &mut self.socket
    }

    /// Bound local address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}

/// Seed the message-id counter from the clock so restarts don't replay ids
fn initial_message_id() -> u16 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u16)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_invalid_address_is_allocation_error() {
        let err = CoapEngine::bind("not-an-ip", 0, 0).unwrap_err();
        assert!(matches!(err, GatewayError::EngineAllocation(_)));
    }

    #[test]
    fn test_bind_ephemeral() {
        let engine = CoapEngine::bind("127.0.0.1", 0, 0).unwrap();
        let addr = engine.local_addr().unwrap();
        assert!(addr.port() != 0);
        assert!(addr.ip().is_loopback());
    }

    #[test]
    fn test_message_ids_advance() {
        let mut engine = CoapEngine::bind("127.0.0.1", 0, 0).unwrap();
        let a = engine.next_message_id();
        let b = engine.next_message_id();
        assert_eq!(b, a.wrapping_add(1));
    }
}
