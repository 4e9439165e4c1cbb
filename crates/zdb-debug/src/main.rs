use std::io::BufReader;
use std::net::TcpListener;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use zdb_debug::DebugAdapter;

/// DAP server for SDCC-compiled Z80 targets.
#[derive(Debug, Parser)]
#[command(name = "zdb-debug", version, about)]
struct Args {
    /// TCP port to listen on.
    #[arg(long, default_value_t = 4711)]
    port: u16,

    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    listen: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let listener = TcpListener::bind((args.listen.as_str(), args.port))
        .with_context(|| format!("failed to bind {}:{}", args.listen, args.port))?;
    info!(listen = %args.listen, port = args.port, "DAP server listening");

    // One debugging session at a time: accept, serve to completion, then
    // accept the next client. Sessions never share state.
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(err) => {
                warn!(error = %err, "accept failed");
                continue;
            }
        };
        match stream.peer_addr() {
            Ok(peer) => info!(%peer, "client connected"),
            Err(_) => info!("client connected"),
        }

        let reader_stream = match stream.try_clone() {
            Ok(clone) => clone,
            Err(err) => {
                warn!(error = %err, "failed to clone connection");
                continue;
            }
        };
        let mut reader = BufReader::new(reader_stream);
        let mut writer = stream;

        let mut adapter = DebugAdapter::new();
        if let Err(err) = adapter.run(&mut reader, &mut writer) {
            warn!(error = %err, "session ended with transport error");
        }
        info!("client disconnected");
    }

    Ok(())
}
