//! Test helper functions for integration tests
//!
//! Shared across the test files in this directory using the tests/common/
//! pattern.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Once;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Initialize logging for tests (only once per test run)
static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// A listing shaped like the Subversion directory pages of the ICU repository
pub const SVN_LISTING: &str = r#"<html><head><title>icu - Revision 22374: /data/trunk/tzdata/icu</title></head>
<body>
 <h2>icu - Revision 22374: /data/trunk/tzdata/icu</h2>
 <ul>
  <li><a href="../">..</a></li>
  <li><a href="2007h/">2007h/</a></li>
  <li><a href="2007k/">2007k/</a></li>
  <li><a href="2007j/">2007j/</a></li>
 </ul>
 <hr noshade><em>Powered by <a href="http://subversion.tigris.org/">Subversion</a> version 1.4.2 (r22196).</em>
</body></html>"#;

/// Serve one HTTP response on a local port and return the base URL
///
/// The server answers a single request with `status` and `body`, then
/// closes the connection.
pub async fn serve_once(status: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
    });

    format!("http://{addr}/tzdata/icu/")
}

/// Write a fake `zoneinfo.res` carrying `version` as a UTF-16BE string
pub fn write_resource(path: &Path, version: &str) {
    let mut bytes = vec![0x00, 0x20, 0xda, 0x27, 0x00, 0x14];
    for text in ["TZVersion", version] {
        bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
        bytes.extend([0x00, 0x00]);
    }
    std::fs::write(path, bytes).unwrap();
}
