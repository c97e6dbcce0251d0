use std::fmt;

use super::action::CustomResponse;

/// The request URL after one or more rewrites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenUrl {
    pub scheme: String,
    pub host: Option<String>,
    pub path: String,
    pub query: String,
}

impl fmt::Display for RewrittenUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(host) = &self.host {
            write!(f, "{}://{}", self.scheme, host)?;
        }
        write!(f, "{}", self.path)?;
        if !self.query.is_empty() {
            write!(f, "?{}", self.query)?;
        }
        Ok(())
    }
}

/// What the host should do with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No rule changed anything; serve the original request.
    Continue,
    /// Serve the request under a new internal URL.
    Rewritten(RewrittenUrl),
    /// Answer with `status_code` and a `Location` header.
    Redirected { location: String, status_code: u16 },
    /// Drop the connection without a response.
    Aborted,
    CustomResponse(CustomResponse),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue => write!(f, "continue"),
            Self::Rewritten(url) => write!(f, "rewrite {url}"),
            Self::Redirected {
                location,
                status_code,
            } => write!(f, "redirect {status_code} {location}"),
            Self::Aborted => write!(f, "abort"),
            Self::CustomResponse(resp) => write!(f, "respond {}", resp.status_code),
        }
    }
}

/// Result of evaluating a rule set against one request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct RuleResult {
    outcome: Outcome,
    stop: bool,
}

impl fmt::Display for RuleResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.outcome)?;
        if self.stop {
            write!(f, " (stopped)")?;
        }
        Ok(())
    }
}

impl RuleResult {
    pub fn new(outcome: Outcome, stop: bool) -> Self {
        Self { outcome, stop }
    }

    #[must_use]
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    #[must_use]
    pub fn into_outcome(self) -> Outcome {
        self.outcome
    }

    /// Whether evaluation ended before the last rule, through a terminal
    /// action or `stopProcessing`.
    #[must_use]
    pub fn stopped(&self) -> bool {
        self.stop
    }

    /// The rewritten path, if the outcome is a rewrite.
    #[must_use]
    pub fn rewritten_path(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Rewritten(url) => Some(&url.path),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewritten(path: &str, query: &str) -> Outcome {
        Outcome::Rewritten(RewrittenUrl {
            scheme: "http".into(),
            host: None,
            path: path.into(),
            query: query.into(),
        })
    }

    #[test]
    fn result_accessors() {
        let r = RuleResult::new(rewritten("/new/abc", ""), false);
        assert_eq!(r.rewritten_path(), Some("/new/abc"));
        assert!(!r.stopped());

        let r = RuleResult::new(Outcome::Continue, false);
        assert_eq!(r.rewritten_path(), None);
    }

    #[test]
    fn result_equality() {
        let a = RuleResult::new(rewritten("/a", "x=1"), true);
        let b = RuleResult::new(rewritten("/a", "x=1"), true);
        assert_eq!(a, b);
        assert_ne!(a, RuleResult::new(rewritten("/a", "x=1"), false));
    }

    #[test]
    fn display_forms() {
        assert_eq!(rewritten("/a", "x=1").to_string(), "rewrite /a?x=1");
        let redirect = Outcome::Redirected {
            location: "/login".into(),
            status_code: 302,
        };
        assert_eq!(redirect.to_string(), "redirect 302 /login");
        assert_eq!(
            RuleResult::new(Outcome::Aborted, true).to_string(),
            "abort (stopped)"
        );
    }

    #[test]
    fn absolute_rewritten_url_display() {
        let url = RewrittenUrl {
            scheme: "https".into(),
            host: Some("cdn.example.com".into()),
            path: "/img/1.png".into(),
            query: String::new(),
        };
        assert_eq!(url.to_string(), "https://cdn.example.com/img/1.png");
    }
}
