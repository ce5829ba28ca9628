//! End-to-end behaviour of both transports over loopback sockets.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream, UdpSocket};
use std::thread;
use std::time::Duration;

use framelink::frame::{FrameReader, FrameWriter};
use framelink::transport::{
    DatagramClient, DatagramListener, StreamClient, StreamListener, TransportError,
};
use framelink::{AnyClient, Client, ClientConfig, Endpoint, TransportKind};

fn stream_pair() -> (StreamClient, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
    let endpoint = Endpoint::from(listener.local_addr().expect("local addr"));
    let mut client = StreamClient::new(endpoint).expect("endpoint should resolve");
    client.start().expect("client should connect");
    let (server, _) = listener.accept().expect("listener should accept");
    (client, server)
}

#[test]
fn stream_payloads_survive_framing_unchanged() {
    let (mut client, server) = stream_pair();

    let payloads: Vec<Vec<u8>> = vec![
        Vec::new(),
        b"\x00\x00\x00\x04".to_vec(),
        b"line one\nline two\r\n\0".to_vec(),
        (0..=255u8).collect(),
        vec![0xEE; 1 << 20],
    ];

    let expected = payloads.clone();
    let reader = thread::spawn(move || {
        let mut reader = FrameReader::new(server);
        for want in expected {
            let got = reader.read_frame().expect("frame should arrive");
            assert_eq!(got.as_ref(), want.as_slice());
        }
    });

    for payload in &payloads {
        client.send(payload).expect("send should not error");
    }
    assert!(client.is_started());
    reader.join().expect("reader thread should finish");
}

#[test]
fn stream_wire_bytes_are_length_then_payload() {
    let (mut client, mut server) = stream_pair();

    client.send(b"abc").unwrap();
    client.send(b"").unwrap();
    client.close();

    let mut wire = Vec::new();
    server.read_to_end(&mut wire).unwrap();
    assert_eq!(wire, vec![0, 0, 0, 3, b'a', b'b', b'c', 0, 0, 0, 0]);
}

#[test]
fn stream_receive_handles_byte_at_a_time_delivery() {
    let (mut client, mut server) = stream_pair();

    let writer = thread::spawn(move || {
        let wire = [0u8, 0, 0, 5, b'h', b'e', b'l', b'l', b'o'];
        for byte in wire {
            server.write_all(&[byte]).unwrap();
            server.flush().unwrap();
            thread::sleep(Duration::from_millis(2));
        }
        server
    });

    assert_eq!(client.receive().unwrap().as_ref(), b"hello");
    drop(writer.join().unwrap());
}

#[test]
fn stream_peer_close_leaves_client_closed() {
    let (mut client, server) = stream_pair();
    drop(server);

    assert!(client.receive().unwrap().is_empty());
    assert!(!client.is_started());
    assert!(matches!(client.send(b"late"), Err(TransportError::NotStarted)));

    client.close();
    client.close();
}

#[test]
fn never_started_clients_reject_io_for_both_kinds() {
    for kind in [TransportKind::Stream, TransportKind::Datagram] {
        let mut client = AnyClient::new(kind, Endpoint::new("127.0.0.1", 9), ClientConfig::default())
            .expect("endpoint should resolve");

        assert!(matches!(client.send(b"x"), Err(TransportError::NotStarted)), "{kind}");
        assert!(matches!(client.receive(), Err(TransportError::NotStarted)), "{kind}");
        assert!(matches!(client.send_string("x"), Err(TransportError::NotStarted)), "{kind}");
        assert!(matches!(client.receive_string(), Err(TransportError::NotStarted)), "{kind}");
        client.close();
        client.close();
        assert!(!client.is_started());
    }
}

#[test]
fn text_round_trips_over_stream() {
    let listener = StreamListener::bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let endpoint = Endpoint::from(listener.local_addr().unwrap());

    let mut client = StreamClient::new(endpoint).unwrap();
    client.start().unwrap();
    let mut peer = listener.accept().unwrap();

    client.send_string("héllo").unwrap();
    client.send_string("").unwrap();
    assert_eq!(peer.receive_string().unwrap(), "héllo");
    assert_eq!(peer.receive_string().unwrap(), "");
    assert!(peer.is_started());
}

#[test]
fn text_round_trips_over_datagram() {
    let mut listener = DatagramListener::bind("127.0.0.1:0".parse().unwrap()).unwrap();
    listener.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let endpoint = Endpoint::from(listener.local_addr().unwrap());

    let mut client = DatagramClient::new(endpoint).unwrap();
    client.start().unwrap();
    client.send_string("héllo").unwrap();

    let (payload, _) = listener.recv().unwrap();
    assert_eq!(framelink::transport::decode_utf16(&payload).unwrap(), "héllo");
}

#[test]
fn datagram_carries_no_length_prefix() {
    let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
    peer.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let endpoint = Endpoint::from(peer.local_addr().unwrap());

    let mut client =
        AnyClient::new(TransportKind::Datagram, endpoint, ClientConfig::default()).unwrap();
    client.start().unwrap();
    client.send(b"abc").unwrap();

    let mut buf = [0u8; 16];
    let (len, from) = peer.recv_from(&mut buf).unwrap();
    assert_eq!(&buf[..len], b"abc");

    peer.send_to(b"abc", from).unwrap();
    assert_eq!(client.receive().unwrap().as_ref(), b"abc");
}

#[test]
fn stream_start_fails_fast_when_nobody_listens() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = Endpoint::from(listener.local_addr().unwrap());
    drop(listener);

    let config = ClientConfig {
        connect_timeout: Some(Duration::from_secs(2)),
        ..ClientConfig::default()
    };
    let mut client = AnyClient::new(TransportKind::Stream, endpoint, config).unwrap();
    assert!(matches!(client.start(), Err(TransportError::Connect { .. })));
    assert!(!client.is_started());
}

#[test]
fn unresolvable_host_fails_at_construction() {
    let endpoint = Endpoint::new("framelink-does-not-exist.invalid", 5005);
    assert!(matches!(
        StreamClient::new(endpoint),
        Err(TransportError::Resolve { .. })
    ));
}

#[test]
fn echo_through_writer_peer() {
    let (mut client, server) = stream_pair();
    let echo = thread::spawn(move || {
        let reader_side = server.try_clone().unwrap();
        let mut reader = FrameReader::new(reader_side);
        let mut writer = FrameWriter::new(server);
        let frame = reader.read_frame().unwrap();
        writer.send(&frame).unwrap();
    });

    client.send(b"\xFF\xD8\xFF frame").unwrap();
    assert_eq!(client.receive().unwrap().as_ref(), b"\xFF\xD8\xFF frame");
    echo.join().unwrap();
}
