//! Request assembly
//!
//! Builds complete non-confirmable request PDUs: fresh token, engine-issued
//! message id, the staged option list in its established order, and an
//! optional payload.

use crate::engine::CoapEngine;
use crate::error::Result;
use crate::options::OptionList;
use coap_lite::{MessageClass, MessageType, Packet, RequestType};

/// Monotonic token source
///
/// Each token is the counter rendered as lowercase hex: printable, at most
/// 8 bytes, and pairwise distinct for the counter's lifetime.
#[derive(Debug, Default)]
pub struct TokenGenerator {
    counter: u32,
}

impl TokenGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce the next token
    pub fn next_token(&mut self) -> Vec<u8> {
        let token = format!("{:x}", self.counter).into_bytes();
        self.counter = self.counter.wrapping_add(1);
        token
    }
}

/// Assemble a non-confirmable request PDU
///
/// Registration traffic is fire-and-forget, so the message type is always
/// NON. The options are applied in list order; the list's own invariant
/// keeps them ascending on the wire.
pub fn build_request(
    engine: &mut CoapEngine,
    tokens: &mut TokenGenerator,
    method: RequestType,
    options: &OptionList,
    payload: Option<&[u8]>,
) -> Result<Packet> {
    let mut pdu = engine.allocate_pdu()?;

    pdu.header.set_type(MessageType::NonConfirmable);
    pdu.header.message_id = engine.next_message_id();
    pdu.header.code = MessageClass::Request(method);
    pdu.set_token(tokens.next_token());

    options.apply_to(&mut pdu);

    if let Some(data) = payload
        && !data.is_empty()
    {
        pdu.payload = data.to_vec();
    }

    Ok(pdu)
}
