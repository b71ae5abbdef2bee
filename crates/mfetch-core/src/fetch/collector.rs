//! Easy2 handler that buffers one response: header lines and body.

use std::str;

/// Handler state for one transfer. Implements curl's Handler for Easy2.
#[derive(Debug, Default)]
pub struct ResponseCollector {
    pub(crate) headers: Vec<String>,
    pub(crate) body: Vec<u8>,
}

impl ResponseCollector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl curl::easy::Handler for ResponseCollector {
    fn header(&mut self, data: &[u8]) -> bool {
        if let Ok(s) = str::from_utf8(data) {
            let line = s.trim_end();
            // A new status line starts a new header block (proxy CONNECT, 100-continue).
            if line.starts_with("HTTP/") {
                self.headers.clear();
            }
            if !line.is_empty() {
                self.headers.push(line.to_string());
            }
        }
        true
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, curl::easy::WriteError> {
        self.body.extend_from_slice(data);
        Ok(data.len())
    }
}
