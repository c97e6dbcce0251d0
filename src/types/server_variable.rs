use super::request::Request;

/// Which part of the URL a rule matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UriMatchPart {
    /// The request path, e.g. `/products/42`.
    #[default]
    Path,
    /// `scheme://host/path`, used by global rules.
    Full,
}

/// A request property addressable as `{NAME}` in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerVariable {
    Header(String),
    Https,
    QueryString,
    RequestUri,
    Url(UriMatchPart),
    RequestMethod,
    RequestScheme,
    RequestFilename,
    ServerProtocol,
    RemoteAddr,
    RemotePort,
    LocalAddr,
    LocalPort,
}

impl ServerVariable {
    /// Resolve an IIS server variable name. Returns `None` for names this
    /// engine cannot answer.
    #[must_use]
    pub fn from_name(name: &str, match_part: UriMatchPart) -> Option<Self> {
        let upper = name.to_ascii_uppercase();
        let var = match upper.as_str() {
            "HTTP_ACCEPT" => Self::Header("accept".to_owned()),
            "HTTP_COOKIE" => Self::Header("cookie".to_owned()),
            "HTTP_HOST" => Self::Header("host".to_owned()),
            "HTTP_REFERER" => Self::Header("referer".to_owned()),
            "HTTP_USER_AGENT" => Self::Header("user-agent".to_owned()),
            "HTTP_CONNECTION" => Self::Header("connection".to_owned()),
            "HTTP_URL" | "URL" => Self::Url(match_part),
            "HTTPS" => Self::Https,
            "QUERY_STRING" => Self::QueryString,
            "REQUEST_URI" => Self::RequestUri,
            "REQUEST_METHOD" => Self::RequestMethod,
            "REQUEST_SCHEME" => Self::RequestScheme,
            "REQUEST_FILENAME" => Self::RequestFilename,
            "SERVER_PROTOCOL" => Self::ServerProtocol,
            "REMOTE_ADDR" => Self::RemoteAddr,
            "REMOTE_PORT" => Self::RemotePort,
            "LOCAL_ADDR" | "SERVER_ADDR" => Self::LocalAddr,
            "SERVER_PORT" => Self::LocalPort,
            other => {
                let header = other.strip_prefix("HTTP_")?;
                if header.is_empty() {
                    return None;
                }
                Self::Header(header.replace('_', "-").to_ascii_lowercase())
            }
        };
        Some(var)
    }

    /// Read the variable from the request. Missing values are empty text.
    #[must_use]
    pub fn resolve(&self, request: &Request) -> String {
        match self {
            Self::Header(name) => request.header_value(name).unwrap_or_default().to_owned(),
            Self::Https => {
                if request.scheme_str().eq_ignore_ascii_case("https") {
                    "on".to_owned()
                } else {
                    "off".to_owned()
                }
            }
            Self::QueryString => request.query_str().to_owned(),
            Self::RequestUri => request.path_and_query(),
            Self::Url(UriMatchPart::Path) | Self::RequestFilename => request.path_str().to_owned(),
            Self::Url(UriMatchPart::Full) => request.absolute_url(),
            Self::RequestMethod => request.method_str().to_owned(),
            Self::RequestScheme => request.scheme_str().to_owned(),
            Self::ServerProtocol => request.protocol_str().to_owned(),
            Self::RemoteAddr => request
                .remote_socket()
                .map(|a| a.ip().to_string())
                .unwrap_or_default(),
            Self::RemotePort => request
                .remote_socket()
                .map(|a| a.port().to_string())
                .unwrap_or_default(),
            Self::LocalAddr => request
                .local_socket()
                .map(|a| a.ip().to_string())
                .unwrap_or_default(),
            Self::LocalPort => request
                .local_socket()
                .map(|a| a.port().to_string())
                .unwrap_or_default(),
        }
    }
}
