//! Mesh CoAP gateway daemon
//!
//! Binds the CoAP engine, hooks it into the reactor, and keeps running
//! until interrupted. With `--demo-attach` a simulated mesh endpoint is
//! attached at startup so the registration path can be observed against a
//! real Resource Directory.
//!
//! Usage:
//!   coap-mesh-gateway [--config gateway.json] [--rd-addr host] [--rd-port 5683]

use clap::Parser;
use coap_mesh_gateway::resource::{DeviceDescriptor, MeshNode};
use coap_mesh_gateway::{GatewayConfig, GatewayService, Reactor};
use log::{error, info};
use std::rc::Rc;
use std::sync::atomic::Ordering;

#[derive(Parser, Debug)]
#[command(name = "coap-mesh-gateway")]
#[command(about = "CoAP gateway for mesh-network endpoints")]
struct Args {
    /// Path to a JSON configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Override the local bind address
    #[arg(long)]
    bind_addr: Option<String>,

    /// Override the local bind port
    #[arg(long)]
    bind_port: Option<u16>,

    /// Override the Resource Directory host
    #[arg(long)]
    rd_addr: Option<String>,

    /// Override the Resource Directory port
    #[arg(long)]
    rd_port: Option<u16>,

    /// Protocol debug verbosity
    #[arg(short, long, default_value = "0")]
    debug_level: u8,

    /// Attach one simulated mesh endpoint at startup
    #[arg(long)]
    demo_attach: bool,
}

fn main() -> coap_mesh_gateway::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GatewayConfig::from_file(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(addr) = args.bind_addr {
        config.bind_addr = addr;
    }
    if let Some(port) = args.bind_port {
        config.bind_port = port;
    }
    if let Some(addr) = args.rd_addr {
        config.rd_addr = addr;
    }
    if let Some(port) = args.rd_port {
        config.rd_port = port;
    }
    if args.debug_level > 0 {
        config.debug_level = args.debug_level;
    }

    let mut reactor = Reactor::new()?;
    let mut service = GatewayService::new(config);
    service.init(&mut reactor)?;
    info!(
        "registering against coap://{}:{}/rd",
        service.config().rd_addr,
        service.config().rd_port
    );

    let stop = reactor.stop_handle();
    if let Err(e) = ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed)) {
        error!("failed to install signal handler: {e}");
    }

    // the mesh stack would call attach_resource; simulate one endpoint
    if args.demo_attach {
        let demo_node = Rc::new(MeshNode {
            short_address: 0x4a3b,
            extended_address: 0x00124b0001020304,
        });
        let descriptor = DeviceDescriptor {
            endpoint: 1,
            profile_id: 0x0104,
            device_id: 0x0302,
            in_clusters: vec![0x0006, 0x0402],
            out_clusters: vec![],
        };
        service.attach_resource(1, descriptor, Rc::downgrade(&demo_node));
    }

    reactor.run(&mut service)?;
    service.close(&mut reactor);
    Ok(())
}
