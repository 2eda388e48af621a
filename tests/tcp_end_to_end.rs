//! End-to-end delivery over real TCP sockets.

use std::io::{BufRead, BufReader};
use std::net::{SocketAddr, TcpListener};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use rstest::{fixture, rstest};

use logferry::{MemorySettings, QueueRegistry, Shipper, TcpTransportFactory};

const TOKEN: &str = "2bfbea1e-10c3-4419-bdad-7e6435882e1f";

#[fixture]
fn tcp_listener() -> TcpListener {
    TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener")
}

fn spawn_line_server(listener: TcpListener, lines: usize) -> (SocketAddr, mpsc::Receiver<String>) {
    let addr = listener.local_addr().expect("listener has address");
    let (notify_tx, notify_rx) = mpsc::channel();
    thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept connection");
        let mut reader = BufReader::new(stream);
        for _ in 0..lines {
            let mut line = String::new();
            reader.read_line(&mut line).expect("read line");
            notify_tx.send(line).expect("send line");
        }
    });
    (addr, notify_rx)
}

#[rstest]
fn token_mode_over_real_tcp(tcp_listener: TcpListener) {
    let (addr, notify_rx) = spawn_line_server(tcp_listener, 1);
    let shipper = Shipper::builder()
        .with_token(TOKEN)
        .with_settings(MemorySettings::new())
        .with_registry(QueueRegistry::new())
        .with_transport_factory(TcpTransportFactory::new(
            addr.ip().to_string(),
            addr.port(),
            None,
        ))
        .build()
        .expect("build shipper");
    shipper.add_line("over the wire");

    let line = notify_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("line received");
    assert_eq!(line, format!("{TOKEN}over the wire\n"));
}

#[rstest]
fn relay_mode_uses_the_default_transport(tcp_listener: TcpListener) {
    let (addr, notify_rx) = spawn_line_server(tcp_listener, 2);
    let shipper = Shipper::builder()
        .with_data_hub(addr.ip().to_string(), addr.port())
        .with_log_id("app")
        .with_settings(MemorySettings::new())
        .with_registry(QueueRegistry::new())
        .build()
        .expect("build shipper");
    shipper.add_line("first");
    shipper.add_line("second");

    let first = notify_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("first line received");
    let second = notify_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("second line received");
    assert_eq!(first, "app first\n");
    assert_eq!(second, "app second\n");
}

#[rstest]
fn survives_a_dropped_connection(tcp_listener: TcpListener) {
    let addr = tcp_listener.local_addr().expect("listener has address");
    let (notify_tx, notify_rx) = mpsc::channel();
    thread::spawn(move || {
        // First connection is dropped without reading anything.
        let (stream, _) = tcp_listener.accept().expect("accept first connection");
        drop(stream);
        // The worker reconnects and redelivers.
        let (stream, _) = tcp_listener.accept().expect("accept second connection");
        let mut reader = BufReader::new(stream);
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap_or(0) == 0 {
                return;
            }
            if notify_tx.send(line).is_err() {
                return;
            }
        }
    });

    let shipper = Shipper::builder()
        .with_data_hub(addr.ip().to_string(), addr.port())
        .with_settings(MemorySettings::new())
        .with_registry(QueueRegistry::new())
        .build()
        .expect("build shipper");

    // Keep offering lines until one lands on the second connection; writes
    // into a closed socket may succeed locally before the failure shows up.
    let deadline = std::time::Instant::now() + Duration::from_secs(10);
    let mut received = None;
    while std::time::Instant::now() < deadline {
        shipper.add_line("retry me");
        if let Ok(line) = notify_rx.recv_timeout(Duration::from_millis(100)) {
            received = Some(line);
            break;
        }
    }
    assert_eq!(received.as_deref(), Some("retry me\n"));
}
