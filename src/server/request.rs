//! Classification of the first buffer a client sends.

use httparse::{EMPTY_HEADER, Request, Status};

const MAX_HEADERS: usize = 64;

#[derive(Debug, PartialEq, Eq)]
pub enum Classified<'a> {
    /// Plain request; only the path is routed on.
    Http { method: &'a str, path: &'a str },
    /// WebSocket upgrade carrying the client's handshake key.
    Upgrade { path: &'a str, key: &'a str },
    /// Nothing usable was received.
    Unusable,
}

pub fn classify(buf: &[u8]) -> Classified<'_> {
    if buf.is_empty() {
        return Classified::Unusable;
    }

    let mut headers = [EMPTY_HEADER; MAX_HEADERS];
    let mut req = Request::new(&mut headers);
    let complete = match req.parse(buf) {
        Ok(Status::Complete(_)) => true,
        Ok(Status::Partial) => false,
        Err(_) => return Classified::Unusable,
    };

    let (Some(method), Some(path)) = (req.method, req.path) else {
        return Classified::Unusable;
    };

    // Header slots are only trustworthy once the head is complete.
    if complete && let Some(key) = upgrade_key(req.headers) {
        return Classified::Upgrade { path, key };
    }

    Classified::Http { method, path }
}

fn upgrade_key<'b>(headers: &[httparse::Header<'b>]) -> Option<&'b str> {
    let wants_websocket = headers.iter().any(|h| {
        h.name.eq_ignore_ascii_case("upgrade")
            && std::str::from_utf8(h.value)
                .map(|v| v.to_ascii_lowercase().contains("websocket"))
                .unwrap_or(false)
    });
    if !wants_websocket {
        return None;
    }

    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("sec-websocket-key"))
        .and_then(|h| std::str::from_utf8(h.value).ok())
        .map(str::trim)
        .filter(|key| !key.is_empty())
}
