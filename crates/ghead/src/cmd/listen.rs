use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ghead_frame::{FrameError, FrameReader};
use tracing::{debug, info, warn};

use crate::cmd::ListenArgs;
use crate::exit::{io_error, CliError, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.limits.frame_config()?;
    let listener = TcpListener::bind(args.addr).map_err(|err| io_error("bind failed", err))?;
    info!(addr = %args.addr, "listening for frames");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let (stream, peer) = match listener.accept() {
            Ok(accepted) => accepted,
            Err(err) => return Err(io_error("accept failed", err)),
        };
        debug!(%peer, "accepted connection");

        let peer = peer.to_string();
        let mut reader = FrameReader::with_config(stream, config.clone());

        while running.load(Ordering::SeqCst) {
            let frame = match reader.read_frame() {
                Ok(frame) => frame,
                Err(err) => {
                    end_connection(&peer, &err);
                    break;
                }
            };

            print_frame(&frame, &peer, format);
            printed = printed.saturating_add(1);

            if let Some(count) = args.count {
                if printed >= count {
                    return Ok(SUCCESS);
                }
            }
        }
    }

    Ok(SUCCESS)
}

/// Every read failure ends the connection: after a bad header the stream
/// position is unknown, and a timeout means the peer went quiet.
fn end_connection(peer: &str, err: &FrameError) {
    match err {
        FrameError::PeerClosed => debug!(peer, "connection closed"),
        other => warn!(peer, error = %other, "dropping connection"),
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
