//! Line format shared by the input and overflow files:
//! `URL` or `URL<space><JSON array of header lines>`.

/// One parsed queue line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueLine {
    pub url: String,
    pub headers: Option<Vec<String>>,
}

/// Parse one line. Blank lines yield None; a header part that is not a JSON
/// string array is treated as "no headers".
pub fn parse_line(line: &str) -> Option<QueueLine> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (url, headers) = match line.split_once(' ') {
        Some((url, rest)) => {
            let headers = match serde_json::from_str::<Option<Vec<String>>>(rest.trim()) {
                Ok(h) => h,
                Err(e) => {
                    tracing::debug!("ignoring unparsable headers for {}: {}", url, e);
                    None
                }
            };
            (url, headers)
        }
        None => (line, None),
    };
    Some(QueueLine {
        url: url.to_string(),
        headers: headers.filter(|h| !h.is_empty()),
    })
}

/// Format one line, including the trailing newline.
pub fn format_line(url: &str, headers: Option<&[String]>) -> String {
    match headers {
        Some(h) if !h.is_empty() => {
            let json = serde_json::to_string(h).unwrap_or_else(|_| "null".to_string());
            format!("{url} {json}\n")
        }
        _ => format!("{url}\n"),
    }
}
