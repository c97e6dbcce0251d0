use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

/// Host-supplied file system lookups for `IsFile` / `IsDirectory` conditions.
///
/// The engine never touches the file system itself; implementations decide
/// how a request path maps to storage.
pub trait FileProbe: Send + Sync {
    fn is_file(&self, path: &str) -> bool;
    fn is_directory(&self, path: &str) -> bool;
}

/// The request a rule set is evaluated against.
///
/// Only `path` is required. Everything else feeds server variables such as
/// `{HTTP_HOST}` or `{QUERY_STRING}` and defaults to an empty or conventional
/// value when not set.
#[derive(Clone)]
pub struct Request {
    pub(crate) path: String,
    pub(crate) query: String,
    pub(crate) method: String,
    pub(crate) scheme: String,
    pub(crate) host: Option<String>,
    pub(crate) protocol: String,
    headers: HashMap<String, String>,
    remote_addr: Option<SocketAddr>,
    local_addr: Option<SocketAddr>,
    file_probe: Option<Arc<dyn FileProbe>>,
}

impl Request {
    /// Create a `GET` request for `path` over plain HTTP/1.1.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: String::new(),
            method: "GET".to_owned(),
            scheme: "http".to_owned(),
            host: None,
            protocol: "HTTP/1.1".to_owned(),
            headers: HashMap::new(),
            remote_addr: None,
            local_addr: None,
            file_probe: None,
        }
    }

    /// Set the query string. A leading `?` is stripped.
    #[must_use]
    pub fn query(mut self, query: impl AsRef<str>) -> Self {
        self.query = strip_query_prefix(query.as_ref()).to_owned();
        self
    }

    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    #[must_use]
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Set the host (with optional port). Also answers `{HTTP_HOST}` unless a
    /// `Host` header is set explicitly.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// Add a header. Names are case-insensitive; a repeated name replaces the
    /// earlier value.
    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    #[must_use]
    pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    #[must_use]
    pub fn local_addr(mut self, addr: SocketAddr) -> Self {
        self.local_addr = Some(addr);
        self
    }

    #[must_use]
    pub fn file_probe(mut self, probe: Arc<dyn FileProbe>) -> Self {
        self.file_probe = Some(probe);
        self
    }

    #[must_use]
    pub fn path_str(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn query_str(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn method_str(&self) -> &str {
        &self.method
    }

    #[must_use]
    pub fn scheme_str(&self) -> &str {
        &self.scheme
    }

    #[must_use]
    pub fn host_str(&self) -> Option<&str> {
        self.host.as_deref()
    }

    #[must_use]
    pub fn protocol_str(&self) -> &str {
        &self.protocol
    }

    /// Look up a header by case-insensitive name. `Host` falls back to the
    /// request host.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        let key = name.to_ascii_lowercase();
        match self.headers.get(&key) {
            Some(v) => Some(v.as_str()),
            None if key == "host" => self.host.as_deref(),
            None => None,
        }
    }

    #[must_use]
    pub fn remote_socket(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    #[must_use]
    pub fn local_socket(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub(crate) fn probe(&self) -> Option<&dyn FileProbe> {
        self.file_probe.as_deref()
    }

    /// `scheme://host/path` when a host is known, otherwise the bare path.
    #[must_use]
    pub fn absolute_url(&self) -> String {
        match &self.host {
            Some(host) => format!("{}://{}{}", self.scheme, host, self.path),
            None => self.path.clone(),
        }
    }

    /// Path followed by `?query` when the query is non-empty.
    #[must_use]
    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query)
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("headers", &self.headers)
            .field("file_probe", &self.file_probe.is_some())
            .finish_non_exhaustive()
    }
}

pub(crate) fn strip_query_prefix(query: &str) -> &str {
    query.strip_prefix('?').unwrap_or(query)
}
