use std::fs;
use std::time::{Duration, Instant};

use framelink_transport::{AnyClient, Client};
use tracing::info;

use crate::cmd::{parse_duration, SendArgs};
use crate::exit::{io_error, transport_error, CliError, CliResult, FAILURE, SUCCESS, TIMEOUT};
use crate::output::{print_payload, OutputFormat, PayloadEncoding, Received};

enum Payload {
    Bytes(Vec<u8>),
    Text(String),
}

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = resolve_payload(&args)?;

    let mut config = args.target.client_config()?;
    let wait = if args.wait {
        Some(parse_duration(&args.wait_timeout)?)
    } else {
        None
    };
    config.read_timeout = wait;

    let endpoint = args.target.endpoint();
    let mut client = AnyClient::new(args.target.transport, endpoint, config)
        .map_err(|err| transport_error("invalid target", err))?;
    client
        .start()
        .map_err(|err| transport_error("start failed", err))?;

    let result = exchange(&mut client, &payload, wait, format);
    client.close();
    result
}

fn exchange(
    client: &mut AnyClient,
    payload: &Payload,
    wait: Option<Duration>,
    format: OutputFormat,
) -> CliResult<i32> {
    let (sent, encoding) = match payload {
        Payload::Bytes(bytes) => (client.send(bytes), PayloadEncoding::Auto),
        Payload::Text(text) => (client.send_string(text), PayloadEncoding::Utf16),
    };
    sent.map_err(|err| transport_error("send failed", err))?;

    // The stream client reports send failures by closing itself.
    if !client.is_started() {
        return Err(CliError::new(FAILURE, "send failed: connection lost"));
    }
    info!(endpoint = %client.endpoint(), transport = %client.kind(), "payload sent");

    if let Some(timeout) = wait {
        let waited = Instant::now();
        let reply = client
            .receive()
            .map_err(|err| transport_error("receive failed", err))?;
        if reply.is_empty() && !client.is_started() {
            // The stream client swallows the read timeout and closes itself.
            if waited.elapsed() >= timeout {
                return Err(CliError::new(
                    TIMEOUT,
                    format!("no reply within {timeout:?}"),
                ));
            }
            return Err(CliError::new(FAILURE, "no reply: connection closed"));
        }
        let peer = client.endpoint().to_string();
        print_payload(
            &Received {
                transport: client.kind(),
                peer: &peer,
                seq: 1,
                payload: reply.as_ref(),
            },
            encoding,
            format,
        );
    }

    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Payload> {
    if let Some(text) = &args.text {
        return Ok(Payload::Text(text.clone()));
    }
    if let Some(data) = &args.data {
        return Ok(Payload::Bytes(data.as_bytes().to_vec()));
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map(Payload::Bytes)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Ok(Payload::Bytes(Vec::new()))
}
