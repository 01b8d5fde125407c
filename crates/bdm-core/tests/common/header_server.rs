//! Minimal HTTP/1.1 server answering HEAD for filename-probe tests.
//!
//! Every path gets `200 OK` with the configured `Content-Disposition` (if any),
//! except paths containing "nohead", which get `404 Not Found`.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

/// Starts a server in a background thread. Returns the base URL
/// (e.g. "http://127.0.0.1:12345/"). The server runs until the process exits.
pub fn start(content_disposition: Option<&str>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let cd = Arc::new(content_disposition.map(str::to_string));
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let cd = Arc::clone(&cd);
            thread::spawn(move || handle(stream, cd.as_deref()));
        }
    });
    format!("http://127.0.0.1:{}/", port)
}

fn handle(mut stream: std::net::TcpStream, cd: Option<&str>) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let mut first = request.lines().next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("");
    let path = first.next().unwrap_or("/");

    let response = if !method.eq_ignore_ascii_case("HEAD") {
        "HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n".to_string()
    } else if path.contains("nohead") {
        "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n".to_string()
    } else {
        let disposition = cd
            .map(|v| format!("Content-Disposition: {}\r\n", v))
            .unwrap_or_default();
        format!(
            "HTTP/1.1 200 OK\r\nContent-Length: 4\r\nContent-Type: text/plain\r\n{}\r\n",
            disposition
        )
    };
    let _ = stream.write_all(response.as_bytes());
}
