//! Resource Directory registration workflow
//!
//! Compiles the registration URI, resolves the directory's transport
//! address, builds a non-confirmable POST carrying the resource description,
//! and hands it to the engine. Nothing waits for or validates a response;
//! a failure at any step aborts only the registration at hand.

use crate::engine::CoapEngine;
use crate::error::Result;
use crate::options::OPTION_URI_HOST;
use crate::request::{TokenGenerator, build_request};
use crate::resolve::ResolveAddress;
use crate::uri;
use coap_lite::RequestType;
use log::debug;

/// Registration URL for one endpoint name
pub fn registration_url(rd_host: &str, rd_port: u16, endpoint_name: &str) -> String {
    format!("coap://{rd_host}:{rd_port}/rd?ep={endpoint_name}")
}

/// Register one resource description with the directory at `url`
pub fn register_resource(
    engine: &mut CoapEngine,
    resolver: &dyn ResolveAddress,
    tokens: &mut TokenGenerator,
    url: &str,
    payload: &[u8],
    staging_limit: usize,
) -> Result<()> {
    let mut compiled = uri::compile(url, staging_limit)?;

    let dst = resolver.resolve(&compiled.host, compiled.port)?;

    // Uri-Host only when the resolved address, rendered as text, is not the
    // host that was already in the URI
    if !compiled.host.is_empty() && dst.ip().to_string() != compiled.host {
        compiled
            .options
            .insert(OPTION_URI_HOST, compiled.host.clone().into_bytes());
    }

    let pdu = build_request(
        engine,
        tokens,
        RequestType::Post,
        &compiled.options,
        Some(payload),
    )?;

    engine.send(&pdu, dst)?;
    debug!("registration request for '{url}' handed off to {dst}");
    Ok(())
}
