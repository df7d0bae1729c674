#![allow(dead_code)] // each test binary uses a subset of these helpers

pub mod runtime {
    use std::sync::Once;

    static MAY_INIT: Once = Once::new();

    /// Configure the may runtime once per test binary.
    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }
}

pub mod net {
    use std::net::TcpListener;

    /// Pick a free localhost port.
    pub fn free_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind probe listener");
        listener
            .local_addr()
            .expect("probe listener has no local addr")
            .port()
    }
}

pub mod http {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    /// Minimal parsed HTTP response for assertions.
    #[derive(Debug)]
    pub struct HttpResponse {
        pub status: u16,
        pub headers: Vec<(String, String)>,
        pub body: String,
    }

    impl HttpResponse {
        /// Get a header by name (case-insensitive).
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }
    }

    /// Send a raw HTTP request and parse the response.
    pub fn send_request(addr: SocketAddr, raw: &str) -> HttpResponse {
        let mut stream = TcpStream::connect(addr).expect("failed to connect to test server");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("failed to set read timeout");
        stream
            .write_all(raw.as_bytes())
            .expect("failed to write request");

        // Read until the end of the header block, then exactly content-length
        // bytes of body (the server keeps connections alive).
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let header_end = loop {
            let n = stream.read(&mut chunk).expect("failed to read response");
            assert!(n > 0, "connection closed before headers were complete");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = find_header_end(&buf) {
                break pos;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let mut lines = head.split("\r\n");
        let status_line = lines.next().expect("missing status line");
        let status: u16 = status_line
            .split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .expect("malformed status line");
        let headers: Vec<(String, String)> = lines
            .filter_map(|line| {
                let (name, value) = line.split_once(':')?;
                Some((name.trim().to_string(), value.trim().to_string()))
            })
            .collect();

        let content_length: usize = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.parse().ok())
            .unwrap_or(0);

        let mut body = buf[header_end + 4..].to_vec();
        while body.len() < content_length {
            let n = stream.read(&mut chunk).expect("failed to read body");
            assert!(n > 0, "connection closed before body was complete");
            body.extend_from_slice(&chunk[..n]);
        }
        body.truncate(content_length);

        HttpResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&body).to_string(),
        }
    }

    /// GET helper with extra headers.
    pub fn get(addr: SocketAddr, path: &str, extra_headers: &[(&str, &str)]) -> HttpResponse {
        let mut raw = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n");
        for (name, value) in extra_headers {
            raw.push_str(&format!("{name}: {value}\r\n"));
        }
        raw.push_str("\r\n");
        send_request(addr, &raw)
    }

    fn find_header_end(buf: &[u8]) -> Option<usize> {
        buf.windows(4).position(|w| w == b"\r\n\r\n")
    }
}

pub mod tokens {
    use base64::{engine::general_purpose, Engine as _};

    /// Build a session token in the `header.payload.signature` format the
    /// gate's providers validate.
    pub fn session_token(signature: &str, sub: &str) -> String {
        let payload =
            general_purpose::STANDARD.encode(serde_json::json!({ "sub": sub }).to_string());
        format!("hdr.{payload}.{signature}")
    }

    /// A token whose payload is not valid base64 JSON.
    pub fn garbage_token(signature: &str) -> String {
        format!("hdr.!!not-base64!!.{signature}")
    }
}
