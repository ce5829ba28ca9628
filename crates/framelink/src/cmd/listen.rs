use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use framelink_transport::{
    Client, DatagramListener, StreamListener, TransportError, TransportKind,
};
use tracing::info;

use crate::cmd::{install_ctrlc_handler, ListenArgs};
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_payload, OutputFormat, PayloadEncoding, Received};

/// Poll interval for idle sockets, so Ctrl+C is noticed while waiting.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let addr = SocketAddr::new(args.bind, args.port);
    let encoding = if args.text {
        PayloadEncoding::Utf16
    } else {
        PayloadEncoding::Auto
    };

    let running = install_ctrlc_handler()?;

    let mut printer = Printer {
        transport: args.transport,
        encoding,
        format,
        printed: 0,
        limit: args.count,
    };

    match args.transport {
        TransportKind::Stream => listen_stream(addr, &running, &mut printer),
        TransportKind::Datagram => listen_datagram(addr, &running, &mut printer),
    }
}

struct Printer {
    transport: TransportKind,
    encoding: PayloadEncoding,
    format: OutputFormat,
    printed: usize,
    limit: Option<usize>,
}

impl Printer {
    /// Print one payload. Returns true once the requested count is reached.
    fn print(&mut self, peer: &str, payload: &[u8]) -> bool {
        self.printed = self.printed.saturating_add(1);
        print_payload(
            &Received {
                transport: self.transport,
                peer,
                seq: self.printed,
                payload,
            },
            self.encoding,
            self.format,
        );
        self.limit.is_some_and(|limit| self.printed >= limit)
    }
}

fn listen_stream(addr: SocketAddr, running: &AtomicBool, printer: &mut Printer) -> CliResult<i32> {
    let listener = StreamListener::bind(addr).map_err(|err| transport_error("bind failed", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| transport_error("socket setup failed", err))?;

    while running.load(Ordering::SeqCst) {
        let mut peer = match listener.accept() {
            Ok(peer) => peer,
            Err(TransportError::Io(err)) if is_idle(&err) => {
                thread::sleep(POLL_INTERVAL);
                continue;
            }
            Err(err) => return Err(transport_error("accept failed", err)),
        };
        let label = peer.peer_addr().to_string();
        info!(peer = %label, "collector session started");

        while running.load(Ordering::SeqCst) {
            let ready = peer
                .wait_readable(POLL_INTERVAL)
                .map_err(|err| transport_error("receive failed", err))?;
            if !ready {
                continue;
            }

            let payload = peer
                .receive()
                .map_err(|err| transport_error("receive failed", err))?;
            if payload.is_empty() && !peer.is_started() {
                info!(peer = %label, "collector session ended");
                break;
            }
            if printer.print(&label, &payload) {
                return Ok(SUCCESS);
            }
        }
    }

    Ok(SUCCESS)
}

fn listen_datagram(
    addr: SocketAddr,
    running: &AtomicBool,
    printer: &mut Printer,
) -> CliResult<i32> {
    let mut socket =
        DatagramListener::bind(addr).map_err(|err| transport_error("bind failed", err))?;
    socket
        .set_read_timeout(Some(POLL_INTERVAL))
        .map_err(|err| transport_error("socket setup failed", err))?;

    while running.load(Ordering::SeqCst) {
        let (payload, from) = match socket.recv() {
            Ok(received) => received,
            Err(TransportError::Io(err)) if is_idle(&err) => continue,
            Err(err) => return Err(transport_error("receive failed", err)),
        };
        if printer.print(&from.to_string(), &payload) {
            return Ok(SUCCESS);
        }
    }

    Ok(SUCCESS)
}

fn is_idle(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}
