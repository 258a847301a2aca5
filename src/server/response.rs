//! One-shot HTTP responses. Every response closes the connection.

pub const NOT_FOUND_BODY: &str = "404 Not Found";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Response {
    pub fn ok(content_type: &'static str, body: Vec<u8>) -> Self {
        Response {
            status: 200,
            content_type,
            body,
        }
    }

    pub fn not_found() -> Self {
        Response {
            status: 404,
            content_type: "text/plain",
            body: NOT_FOUND_BODY.as_bytes().to_vec(),
        }
    }

    pub fn internal_error() -> Self {
        Response {
            status: 500,
            content_type: "text/plain",
            body: b"500 Internal Server Error".to_vec(),
        }
    }

    pub fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            404 => "Not Found",
            500 => "Internal Server Error",
            _ => "Unknown",
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        let head = format!(
            "HTTP/1.1 {} {}\r\n\
             Content-Type: {}\r\n\
             Access-Control-Allow-Origin: *\r\n\
             Connection: close\r\n\
             Content-Length: {}\r\n\
             \r\n",
            self.status,
            self.reason(),
            self.content_type,
            self.body.len()
        );
        let mut out = Vec::with_capacity(head.len() + self.body.len());
        out.extend_from_slice(head.as_bytes());
        out.extend_from_slice(&self.body);
        out
    }
}
