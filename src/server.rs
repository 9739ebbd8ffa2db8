//! Minimal HTTP/1.1 front end.
//!
//! One thread per accepted connection, one request per connection
//! (`Connection: close`). Only the request line is interpreted; headers are
//! read and discarded. Routes:
//!
//! | Route | Response |
//! |---|---|
//! | `/` | Directory trees of all roots |
//! | `/default_style.css` | Embedded stylesheet |
//! | `/show_dir?path=P[&page=N][&tree=1]` | Directory view |
//! | `/show_image?path=P[&page=N][&tree=1]` | Image view |
//! | `/thumbnail?path=P` | Thumbnail JPEG |
//! | `/image?path=P` | Upright image |
//! | `/download?path=P` | Original file as an attachment |
//!
//! Status codes: a path that does not exist or lies outside every root is
//! 404, a missing `path` parameter or a failed conversion is 500, a method
//! other than GET/HEAD is 405.

use crate::imaging::{ImageBackend, Orientation};
use crate::library::PhotoLibrary;
use crate::navigation::NavigationRequest;
use crate::render::{
    self, DOWNLOAD_ROUTE, IMAGE_ROUTE, SHOW_DIR_ROUTE, SHOW_IMAGE_ROUTE, STYLESHEET,
    STYLESHEET_ROUTE, THUMBNAIL_ROUTE,
};
use maud::Markup;
use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on the request line plus headers.
const MAX_HEAD_BYTES: u64 = 8 * 1024;

// ============================================================================
// Percent encoding
// ============================================================================

/// Percent-encode a string for use in a query value.
///
/// Unreserved characters and `/` pass through; everything else, including
/// space and `+`, becomes `%XX`.
pub fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || b"-_.~/".contains(&byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// Decode a query component: `+` is a space, `%XX` a byte. Malformed
/// escapes are kept literally; invalid UTF-8 is replaced.
pub fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => match bytes.get(i + 1..i + 3).and_then(|h| hex_pair(h[0], h[1])) {
                Some(decoded) => {
                    out.push(decoded);
                    i += 2;
                }
                None => out.push(b'%'),
            },
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_pair(high: u8, low: u8) -> Option<u8> {
    let digit = |b: u8| (b as char).to_digit(16);
    Some((digit(high)? * 16 + digit(low)?) as u8)
}

/// Split a query string into decoded key/value pairs. The first occurrence
/// of a key wins.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params
            .entry(percent_decode(key))
            .or_insert_with(|| percent_decode(value));
    }
    params
}

// ============================================================================
// Request / Response
// ============================================================================

/// A parsed request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    /// The raw request target, as logged.
    pub target: String,
    pub route: String,
    pub query: HashMap<String, String>,
}

impl Request {
    /// Parse `METHOD target HTTP/x.y`. Returns `None` for anything else.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let method = parts.next()?;
        let target = parts.next()?;
        let version = parts.next()?;
        if !version.starts_with("HTTP/") || parts.next().is_some() {
            return None;
        }
        let (route, query) = target.split_once('?').unwrap_or((target, ""));
        Some(Self {
            method: method.to_string(),
            target: target.to_string(),
            route: percent_decode(route),
            query: parse_query(query),
        })
    }

    pub fn get(target: &str) -> Self {
        Self::parse(&format!("GET {target} HTTP/1.1")).unwrap_or_else(|| Self {
            method: "GET".to_string(),
            target: target.to_string(),
            route: target.to_string(),
            query: HashMap::new(),
        })
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn is_head(&self) -> bool {
        self.method == "HEAD"
    }

    fn page(&self) -> Option<usize> {
        self.param("page").and_then(|p| p.trim().parse().ok())
    }

    fn tree(&self) -> bool {
        matches!(self.param("tree"), Some("1" | "true" | "yes"))
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub headers: Vec<(String, String)>,
    pub body: Arc<[u8]>,
}

impl Response {
    pub fn bytes(content_type: &'static str, body: impl Into<Arc<[u8]>>) -> Self {
        Self {
            status: 200,
            content_type,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn html(status: u16, markup: Markup) -> Self {
        Self {
            status,
            ..Self::bytes("text/html; charset=utf-8", markup.into_string().into_bytes())
        }
    }

    pub fn error(status: u16, detail: &str) -> Self {
        Self::html(status, render::render_error(status, reason_phrase(status), detail))
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Write status line, headers and (unless `include_body` is false) the
    /// body.
    pub fn write_to(&self, out: &mut impl Write, include_body: bool) -> io::Result<()> {
        let mut head = format!(
            "HTTP/1.1 {} {}\r\n\
             Content-Type: {}\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n",
            self.status,
            reason_phrase(self.status),
            self.content_type,
            self.body.len()
        );
        for (name, value) in &self.headers {
            head.push_str(&format!("{name}: {value}\r\n"));
        }
        head.push_str("\r\n");
        out.write_all(head.as_bytes())?;
        if include_body {
            out.write_all(&self.body)?;
        }
        out.flush()
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

// ============================================================================
// Routing
// ============================================================================

/// Maps requests to responses. Shared by every connection thread.
pub struct Handler<B: ImageBackend> {
    library: Arc<PhotoLibrary<B>>,
    columns: usize,
}

impl<B: ImageBackend> Handler<B> {
    /// `columns` is the width of the thumbnail grid.
    pub fn new(library: Arc<PhotoLibrary<B>>, columns: usize) -> Self {
        Self {
            library,
            columns: columns.max(1),
        }
    }

    pub fn library(&self) -> &PhotoLibrary<B> {
        &self.library
    }

    pub fn handle(&self, request: &Request) -> Response {
        if request.method != "GET" && request.method != "HEAD" {
            return Response::error(405, "Only GET and HEAD are supported.")
                .with_header("Allow", "GET, HEAD");
        }

        let result = match request.route.as_str() {
            "/" => Ok(self.browse(NavigationRequest::default().with_directory_tree(request.tree()))),
            STYLESHEET_ROUTE => Ok(Response::bytes(
                "text/css; charset=utf-8",
                STYLESHEET.as_bytes(),
            )),
            SHOW_DIR_ROUTE => self.show(request, true),
            SHOW_IMAGE_ROUTE => self.show(request, false),
            THUMBNAIL_ROUTE => self.thumbnail(request),
            IMAGE_ROUTE => self.image(request),
            DOWNLOAD_ROUTE => self.download(request),
            _ => Err(Response::error(404, "No such page.")),
        };
        result.unwrap_or_else(|response| response)
    }

    /// The requested path, located inside the roots.
    fn target(&self, request: &Request) -> Result<PathBuf, Response> {
        let raw = request
            .param("path")
            .ok_or_else(|| Response::error(500, "Missing path parameter."))?;
        self.library
            .locate(Path::new(raw))
            .ok_or_else(|| Response::error(404, &format!("{raw} was not found.")))
    }

    fn browse(&self, navigation: NavigationRequest) -> Response {
        let state = self.library.resolve_navigation_state(&navigation);
        Response::html(200, render::render_browser(&self.library, &state, self.columns))
    }

    fn show(&self, request: &Request, is_directory_request: bool) -> Result<Response, Response> {
        let path = self.target(request)?;
        if path.is_dir() != is_directory_request {
            return Err(Response::error(404, &format!("{} was not found.", path.display())));
        }
        Ok(self.browse(NavigationRequest {
            path: Some(path),
            page: request.page(),
            is_directory_request,
            force_show_directory_tree: request.tree(),
        }))
    }

    fn media_file(&self, request: &Request) -> Result<PathBuf, Response> {
        let path = self.target(request)?;
        if !path.is_file() {
            return Err(Response::error(404, &format!("{} is not a file.", path.display())));
        }
        Ok(path)
    }

    fn thumbnail(&self, request: &Request) -> Result<Response, Response> {
        let file = self.library.resolve_file(&self.media_file(request)?);
        let bytes = self
            .library
            .thumbnail_bytes(&file)
            .map_err(|e| Response::error(500, &e.to_string()))?;
        Ok(Response::bytes("image/jpeg", bytes))
    }

    fn image(&self, request: &Request) -> Result<Response, Response> {
        let file = self.library.resolve_file(&self.media_file(request)?);
        let bytes = self
            .library
            .image_bytes(&file)
            .map_err(|e| Response::error(500, &e.to_string()))?;
        let content_type = match self.library.orientation(&file) {
            Orientation::Normal => content_type_for(file.path()),
            _ => "image/jpeg",
        };
        Ok(Response::bytes(content_type, bytes))
    }

    fn download(&self, request: &Request) -> Result<Response, Response> {
        let path = self.media_file(request)?;
        let bytes = std::fs::read(&path).map_err(|e| Response::error(500, &e.to_string()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().replace(['"', '\\'], "_"))
            .unwrap_or_default();
        Ok(Response::bytes(content_type_for(&path), bytes)
            .with_header("Content-Disposition", format!("attachment; filename=\"{name}\"")))
    }
}

// ============================================================================
// Server
// ============================================================================

pub struct Server<B: ImageBackend + 'static> {
    listener: TcpListener,
    handler: Arc<Handler<B>>,
}

impl<B: ImageBackend + 'static> Server<B> {
    /// Bind the listening socket. Port 0 picks a free port.
    pub fn bind(address: impl ToSocketAddrs, handler: Handler<B>) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(address)?;
        Ok(Self {
            listener,
            handler: Arc::new(handler),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections forever, one thread each.
    pub fn run(self) -> Result<(), ServerError> {
        log::info!("Listening on http://{}", self.local_addr()?);
        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    let handler = Arc::clone(&self.handler);
                    thread::spawn(move || {
                        if let Err(e) = handle_connection(&handler, stream) {
                            log::warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => log::warn!("Accept failed: {}", e),
            }
        }
        Ok(())
    }
}

/// Read a request head of at most [`MAX_HEAD_BYTES`], discarding the headers.
///
/// Returns the request line, which lacks its line terminator when the limit
/// cut it short, or `None` when the peer sent nothing.
fn read_head(input: impl Read) -> io::Result<Option<String>> {
    let mut reader = BufReader::new(input.take(MAX_HEAD_BYTES));
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header)? == 0 || header.trim_end().is_empty() {
            break;
        }
    }
    Ok(Some(line))
}

/// Read one request from `stream`, answer it, and let the stream close.
pub fn handle_connection<B: ImageBackend>(
    handler: &Handler<B>,
    stream: TcpStream,
) -> io::Result<()> {
    stream.set_read_timeout(Some(READ_TIMEOUT))?;
    let Some(line) = read_head(&stream)? else {
        return Ok(());
    };

    let mut writer = &stream;
    if !line.ends_with('\n') {
        log::warn!("Request head exceeds {} bytes", MAX_HEAD_BYTES);
        return Response::error(400, "Request too long.").write_to(&mut writer, true);
    }
    match Request::parse(&line) {
        Some(request) => {
            let response = handler.handle(&request);
            log::info!(
                "{} {} {} ({} bytes)",
                request.method,
                request.target,
                response.status,
                response.body.len()
            );
            response.write_to(&mut writer, !request.is_head())
        }
        None => {
            log::warn!("Malformed request line: {:?}", line.trim_end());
            Response::error(400, "Malformed request.").write_to(&mut writer, true)
        }
    }
}
