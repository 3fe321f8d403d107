//! Loopback TCP collector capturing newline-terminated frames.

use std::io::{BufRead, BufReader};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Accept connections on `listener` and forward every received line,
/// terminator included, to the returned channel.
///
/// Each accepted connection is drained on its own thread so reconnects are
/// captured too.
pub fn spawn_collector(listener: TcpListener) -> (SocketAddr, mpsc::Receiver<Vec<u8>>) {
    let addr = listener.local_addr().expect("listener address");
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else {
                break;
            };
            let tx = tx.clone();
            thread::spawn(move || drain_lines(stream, tx));
        }
    });
    (addr, rx)
}

fn drain_lines(stream: TcpStream, tx: mpsc::Sender<Vec<u8>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(10)));
    let mut reader = BufReader::new(stream);
    loop {
        let mut line = Vec::new();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                if tx.send(line).is_err() {
                    break;
                }
            }
        }
    }
}

/// Collect `count` lines, failing the test if they do not arrive in time.
#[allow(dead_code)]
pub fn recv_lines(rx: &mpsc::Receiver<Vec<u8>>, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let line = rx
                .recv_timeout(Duration::from_secs(5))
                .unwrap_or_else(|err| panic!("line {i} of {count} not received: {err}"));
            String::from_utf8(line).expect("frame is UTF-8")
        })
        .collect()
}
