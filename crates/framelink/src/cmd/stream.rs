use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use framelink_transport::{AnyClient, Client};
use tracing::{info, warn};

use crate::cmd::{install_ctrlc_handler, StreamArgs};
use crate::exit::{io_error, transport_error, CliError, CliResult, FAILURE, SUCCESS, USAGE};

pub fn run(args: StreamArgs) -> CliResult<i32> {
    if args.fps == 0 {
        return Err(CliError::new(USAGE, "--fps must be greater than zero"));
    }
    let frames = frame_files(&args.frames)?;
    let interval = Duration::from_secs(1) / args.fps;

    let config = args.target.client_config()?;
    let mut client = AnyClient::new(args.target.transport, args.target.endpoint(), config)
        .map_err(|err| transport_error("invalid target", err))?;

    let running = install_ctrlc_handler()?;

    client
        .start()
        .map_err(|err| transport_error("start failed", err))?;
    info!(
        endpoint = %client.endpoint(),
        transport = %client.kind(),
        frames = frames.len(),
        "streaming started (Ctrl+C to stop)"
    );

    let result = pump(&mut client, &frames, interval, args.repeat, &running);
    client.close();

    let sent = result?;
    info!(sent, "streaming stopped");
    Ok(SUCCESS)
}

/// Send frames at a fixed pace until done, interrupted, or the link drops.
fn pump(
    client: &mut AnyClient,
    frames: &[PathBuf],
    interval: Duration,
    repeat: bool,
    running: &AtomicBool,
) -> CliResult<u64> {
    let mut sent = 0u64;

    loop {
        for path in frames {
            if !running.load(Ordering::SeqCst) {
                return Ok(sent);
            }
            let started = Instant::now();

            let frame = fs::read(path)
                .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
            client
                .send(&frame)
                .map_err(|err| transport_error("send failed", err))?;

            // No automatic reconnect: a dropped stream ends the run.
            if !client.is_started() {
                warn!(sent, "connection lost");
                return Err(CliError::new(
                    FAILURE,
                    format!("connection lost after {sent} frames"),
                ));
            }
            sent += 1;

            if let Some(rest) = interval.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }

        if !repeat {
            return Ok(sent);
        }
    }
}

/// JPEG files in `dir`, sorted by file name.
pub fn frame_files(dir: &Path) -> CliResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .map_err(|err| io_error(&format!("failed reading {}", dir.display()), err))?;

    let mut frames = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|err| io_error(&format!("failed reading {}", dir.display()), err))?
            .path();
        if path.is_file() && is_jpeg(&path) {
            frames.push(path);
        }
    }
    frames.sort();

    if frames.is_empty() {
        return Err(CliError::new(
            USAGE,
            format!("no .jpg/.jpeg frames in {}", dir.display()),
        ));
    }
    Ok(frames)
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
}

#[cfg(test)]
mod tests {
    use framelink_transport::{ClientConfig, Endpoint, StreamListener, TransportKind};

    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "framelink-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir
    }

    #[test]
    fn frame_files_are_sorted_jpegs_only() {
        let dir = temp_dir("frames");
        fs::write(dir.join("002.jpg"), b"b").unwrap();
        fs::write(dir.join("001.JPEG"), b"a").unwrap();
        fs::write(dir.join("notes.txt"), b"x").unwrap();

        let frames = frame_files(&dir).unwrap();
        let names: Vec<_> = frames
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["001.JPEG", "002.jpg"]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_directory_is_usage_error() {
        let dir = temp_dir("empty");
        assert_eq!(frame_files(&dir).unwrap_err().code, USAGE);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn pump_sends_every_frame_in_order() {
        let dir = temp_dir("pump");
        fs::write(dir.join("a.jpg"), b"\xFF\xD8\xFFone").unwrap();
        fs::write(dir.join("b.jpg"), b"\xFF\xD8\xFFtwo").unwrap();
        let frames = frame_files(&dir).unwrap();

        let listener = StreamListener::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let endpoint = Endpoint::from(listener.local_addr().unwrap());
        let mut client =
            AnyClient::new(TransportKind::Stream, endpoint, ClientConfig::default()).unwrap();
        client.start().unwrap();
        let mut peer = listener.accept().unwrap();

        let running = AtomicBool::new(true);
        let sent = pump(&mut client, &frames, Duration::ZERO, false, &running).unwrap();
        assert_eq!(sent, 2);

        assert_eq!(peer.receive().unwrap().as_ref(), b"\xFF\xD8\xFFone");
        assert_eq!(peer.receive().unwrap().as_ref(), b"\xFF\xD8\xFFtwo");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn pump_stops_when_interrupted() {
        let frames = vec![PathBuf::from("/never/read.jpg")];
        let endpoint = Endpoint::new("127.0.0.1", 9);
        let mut client =
            AnyClient::new(TransportKind::Datagram, endpoint, ClientConfig::default()).unwrap();

        let running = AtomicBool::new(false);
        let sent = pump(&mut client, &frames, Duration::ZERO, true, &running).unwrap();
        assert_eq!(sent, 0);
    }

    #[test]
    fn pump_ends_run_when_stream_drops() {
        let dir = temp_dir("lost");
        let mut frame = b"\xFF\xD8\xFF".to_vec();
        frame.resize(256 * 1024, 0x42);
        fs::write(dir.join("frame.jpg"), &frame).unwrap();
        let frames = frame_files(&dir).unwrap();

        let listener = StreamListener::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let endpoint = Endpoint::from(listener.local_addr().unwrap());
        let mut client =
            AnyClient::new(TransportKind::Stream, endpoint, ClientConfig::default()).unwrap();
        client.start().unwrap();
        drop(listener.accept().unwrap());

        let running = AtomicBool::new(true);
        let err = pump(&mut client, &frames, Duration::ZERO, true, &running).unwrap_err();
        assert_eq!(err.code, FAILURE);
        assert!(err.message.contains("connection lost"));
        assert!(!client.is_started());

        let _ = fs::remove_dir_all(&dir);
    }
}
