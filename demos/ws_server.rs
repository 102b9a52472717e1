//! Broadcast transformed poses to WebSocket clients.
//!
//! Each connected client receives one JSON object per cycle:
//!   {"x":..,"y":..,"z":..,"yaw":..,"pitch":..,"roll":..}
//! Sending the text "center" from a client re-centers the tracker.
//!
//! Usage:
//!   cargo run --release --example ws_server
//!   connect to ws://localhost:8765

use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex, TryLockError};
use std::time::{Duration, Instant};
use trackcore::{Axis, Mappings, Pipeline, Pose, Protocol, Settings, TrackError, Tracker};
use tungstenite::Message;

const PORT: u16 = 8765;

type WsClient = Arc<Mutex<tungstenite::WebSocket<TcpStream>>>;

/// Protocol that fans each pose out to every connected client.
///
/// Runs on the tracker thread, so it never waits: a client whose socket is
/// momentarily held by its reader is skipped for this cycle, and a full send
/// buffer keeps the frame queued. Clients that fail a send are dropped.
struct Broadcast {
    clients: Arc<Mutex<Vec<WsClient>>>,
}

impl Protocol for Broadcast {
    fn pose(&mut self, p: &Pose) -> trackcore::Result<()> {
        let json = format!(
            "{{\"x\":{:.4},\"y\":{:.4},\"z\":{:.4},\"yaw\":{:.2},\"pitch\":{:.2},\"roll\":{:.2}}}",
            p[Axis::X],
            p[Axis::Y],
            p[Axis::Z],
            p[Axis::Yaw],
            p[Axis::Pitch],
            p[Axis::Roll],
        );
        let mut list = self
            .clients
            .lock()
            .map_err(|_| TrackError::Protocol("client list poisoned".into()))?;
        list.retain(|client| match client.try_lock() {
            Ok(mut ws) => keep_after_send(ws.send(Message::text(json.clone()))),
            Err(TryLockError::WouldBlock) => true,
            Err(TryLockError::Poisoned(_)) => false,
        });
        Ok(())
    }
}

fn is_would_block(e: &tungstenite::Error) -> bool {
    matches!(e, tungstenite::Error::Io(io) if io.kind() == std::io::ErrorKind::WouldBlock)
}

/// Non-blocking sockets report a full buffer as WouldBlock; the frame stays
/// queued in the WebSocket and goes out with the next send.
fn keep_after_send(result: tungstenite::Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => is_would_block(&e),
    }
}

fn main() {
    env_logger::init();

    let clients: Arc<Mutex<Vec<WsClient>>> = Arc::new(Mutex::new(Vec::new()));
    let pipeline = Pipeline::new(Mappings::identity()).with_protocol(Broadcast {
        clients: clients.clone(),
    });

    let epoch = Instant::now();
    let source = move || -> trackcore::Result<[f64; 6]> {
        let t = epoch.elapsed().as_secs_f64();
        Ok([
            0.05 * (t * 0.8).sin(),
            0.0,
            0.02 * (t * 0.4).cos(),
            30.0 * (t * 0.5).sin(),
            8.0 * (t * 0.9).sin(),
            0.0,
        ])
    };

    // Cap the broadcast rate for browsers.
    let settings = Settings::from_env().with_period(Duration::from_millis(16));
    let tracker = match Tracker::start(pipeline, source, settings) {
        Ok(t) => Arc::new(t),
        Err(e) => {
            eprintln!("Failed to start tracker: {}", e);
            std::process::exit(1);
        }
    };

    let listener = TcpListener::bind(format!("0.0.0.0:{}", PORT)).unwrap_or_else(|e| {
        eprintln!("Failed to bind port {}: {}", PORT, e);
        std::process::exit(1);
    });
    eprintln!("[WS] Listening on ws://localhost:{}", PORT);

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(s) => s,
            Err(e) => {
                eprintln!("[TCP] accept error: {}", e);
                continue;
            }
        };
        stream.set_read_timeout(Some(Duration::from_secs(5))).ok();
        stream.set_nodelay(true).ok();

        let ws = match tungstenite::accept(stream) {
            Ok(ws) => ws,
            Err(e) => {
                eprintln!("[WS] handshake error: {}", e);
                continue;
            }
        };
        // After the handshake neither the reader nor the tracker thread may
        // block while holding the socket lock.
        if let Err(e) = ws.get_ref().set_nonblocking(true) {
            eprintln!("[WS] set_nonblocking failed: {}", e);
            continue;
        }
        let ws = Arc::new(Mutex::new(ws));

        if let Ok(mut list) = clients.lock() {
            list.push(ws.clone());
            eprintln!("[WS] Client connected ({} total)", list.len());
        }

        let clients = clients.clone();
        let tracker = tracker.clone();
        std::thread::spawn(move || client_reader(ws, clients, tracker));
    }
}

/// Poll a client for commands until it is dropped from the broadcast list.
fn client_reader(ws: WsClient, clients: Arc<Mutex<Vec<WsClient>>>, tracker: Arc<Tracker>) {
    loop {
        let still_active = clients
            .lock()
            .map(|list| list.iter().any(|c| Arc::ptr_eq(c, &ws)))
            .unwrap_or(false);
        if !still_active {
            break;
        }

        let msg = match ws.lock() {
            Ok(mut socket) => socket.read(),
            Err(_) => break,
        };
        match msg {
            Ok(Message::Text(text)) if text.trim() == "center" => {
                eprintln!("[WS] Center requested");
                tracker.request_center();
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) if is_would_block(&e) => {}
            Err(_) => break,
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    if let Ok(mut list) = clients.lock() {
        list.retain(|c| !Arc::ptr_eq(c, &ws));
        eprintln!("[WS] Client disconnected ({} total)", list.len());
    }
}
