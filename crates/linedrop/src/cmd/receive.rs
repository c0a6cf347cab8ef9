use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use linedrop_session::{ServerSession, SessionError, SessionStats};
use linedrop_storage::{BatchSequence, DirStorage, StorageLimits};
use linedrop_transport::TcpSocket;
use tracing::{info, warn};

use crate::cmd::ReceiveArgs;
use crate::exit::{storage_error, transport_error, CliError, CliResult, SUCCESS};
use crate::output::{print_session, OutputFormat};

pub fn run(args: ReceiveArgs, format: OutputFormat) -> CliResult<i32> {
    let limits = StorageLimits {
        max_lines: args.max_lines,
        max_line_bytes: args.max_line_bytes,
    };
    let storage = DirStorage::with_limits(&args.dir, limits)
        .map_err(|err| storage_error("failed opening storage directory", err))?;
    let socket = TcpSocket::bind(args.addr.as_str())
        .map_err(|err| transport_error("bind failed", err))?;

    let storage = Arc::new(storage);
    let sequence = Arc::new(BatchSequence::new());

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut workers = Vec::new();
    let mut served = 0usize;

    while running.load(Ordering::SeqCst) {
        let stream = match socket.accept() {
            Ok(stream) => stream,
            Err(err) => return Err(transport_error("accept failed", err)),
        };
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let reader_half = match stream.try_clone() {
            Ok(half) => half,
            Err(err) => return Err(transport_error("failed splitting connection", err)),
        };
        let session = ServerSession::from_parts(reader_half, stream);

        // One worker per connection; sessions share only the storage
        // target and its index allocator.
        let storage = Arc::clone(&storage);
        let sequence = Arc::clone(&sequence);
        workers.push(std::thread::spawn(move || {
            match session.run(storage.as_ref(), sequence.as_ref()) {
                Ok(stats) => {
                    print_session(&peer, stats, true, format);
                }
                Err(SessionError::Disconnected(reason)) => {
                    // The client vanished without the termination frame.
                    warn!(%peer, %reason, "session ended abnormally");
                    print_session(&peer, SessionStats::default(), false, format);
                }
                Err(err) => {
                    warn!(%peer, error = %err, "session failed");
                }
            }
        }));

        served += 1;
        if let Some(sessions) = args.sessions {
            if served >= sessions {
                break;
            }
        }
    }

    for worker in workers {
        let _ = worker.join();
    }
    info!(served, "receiver shutting down");

    Ok(SUCCESS)
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
