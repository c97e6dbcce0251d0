//! Hot-reloadable holder for a compiled [`RuleSet`].
//!
//! Requests read the current set lock-free; a reload publishes a complete new
//! set with a single atomic swap. In-flight evaluations keep the snapshot
//! they loaded, and the old set is dropped once the last of them finishes.

use std::path::Path;
use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};
use tracing::{info, warn};

use crate::error::RewriteError;
use crate::parse::ParseError;
use crate::types::{Request, RuleResult, RuleSet};

/// A rule set that can be replaced while requests are being evaluated.
///
/// # Example
///
/// ```
/// use urlrewrite::{RewriteEngine, RuleSet};
///
/// let engine = RewriteEngine::new(RuleSet::default());
/// engine
///     .reload_xml(r#"<rewrite><rules>
///         <rule name="r"><match url="^/a$"/><action type="Rewrite" url="/b"/></rule>
///     </rules></rewrite>"#)
///     .unwrap();
/// assert_eq!(engine.evaluate("/a", "").rewritten_path(), Some("/b"));
///
/// // A broken document is rejected and the previous rules keep serving.
/// assert!(engine.reload_xml("<rewrite><rules><rule/></rules></rewrite>").is_err());
/// assert_eq!(engine.evaluate("/a", "").rewritten_path(), Some("/b"));
/// ```
#[derive(Debug)]
pub struct RewriteEngine {
    rules: ArcSwap<RuleSet>,
}

impl RewriteEngine {
    #[must_use]
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules: ArcSwap::from_pointee(rules),
        }
    }

    /// Build an engine from rule XML.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the document does not load completely.
    pub fn from_xml(input: &str) -> Result<Self, ParseError> {
        Ok(Self::new(RuleSet::from_xml(input)?))
    }

    /// The current rule set. The guard keeps that snapshot alive even if a
    /// reload happens meanwhile, so several evaluations can share one view.
    pub fn snapshot(&self) -> Guard<Arc<RuleSet>> {
        self.rules.load()
    }

    pub fn evaluate(&self, path: &str, query: &str) -> RuleResult {
        self.rules.load().evaluate(path, query)
    }

    pub fn evaluate_request(&self, request: &Request) -> RuleResult {
        self.rules.load().evaluate_request(request)
    }

    /// Swap in an already compiled rule set.
    pub fn reload(&self, rules: RuleSet) {
        info!(rules = rules.len(), "installed new rule set");
        self.rules.store(Arc::new(rules));
    }

    /// Load rule XML and install it. On error the current set stays in place.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the document does not load completely.
    pub fn reload_xml(&self, input: &str) -> Result<(), ParseError> {
        match RuleSet::from_xml(input) {
            Ok(rules) => {
                self.reload(rules);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "rejected rule set, keeping previous rules");
                Err(err)
            }
        }
    }

    /// Read and install an XML rule file. On error the current set stays in
    /// place.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError`] on I/O, parse, or compile failure.
    pub fn reload_file(&self, path: impl AsRef<Path>) -> Result<(), RewriteError> {
        let path = path.as_ref();
        match RuleSet::from_file(path) {
            Ok(rules) => {
                self.reload(rules);
                Ok(())
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "rejected rule file, keeping previous rules");
                Err(err)
            }
        }
    }
}

impl Default for RewriteEngine {
    fn default() -> Self {
        Self::new(RuleSet::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Outcome, RuleSetBuilder};

    const GOOD: &str = r#"<rewrite><rules>
        <rule name="r"><match url="^/a$"/><action type="Rewrite" url="/b"/></rule>
    </rules></rewrite>"#;

    #[test]
    fn empty_engine_passes_through() {
        let engine = RewriteEngine::default();
        assert_eq!(engine.evaluate("/a", "").outcome(), &Outcome::Continue);
    }

    #[test]
    fn reload_replaces_rules() {
        let engine = RewriteEngine::from_xml(GOOD).unwrap();
        assert_eq!(engine.evaluate("/a", "").rewritten_path(), Some("/b"));

        let next = RuleSetBuilder::new()
            .rule("abort", |r| r.matches("^/a$").abort())
            .compile()
            .unwrap();
        engine.reload(next);
        assert_eq!(engine.evaluate("/a", "").outcome(), &Outcome::Aborted);
    }

    #[test]
    fn failed_reload_keeps_previous_set() {
        let engine = RewriteEngine::from_xml(GOOD).unwrap();
        let broken = r#"<rewrite><rules>
            <rule name="ok"><match url="^/x$"/><action type="AbortRequest"/></rule>
            <rule name="bad"><match url="^/a$"/></rule>
        </rules></rewrite>"#;
        assert!(engine.reload_xml(broken).is_err());
        assert_eq!(engine.evaluate("/a", "").rewritten_path(), Some("/b"));
        assert_eq!(engine.evaluate("/x", "").outcome(), &Outcome::Continue);
    }

    #[test]
    fn snapshot_survives_reload() {
        let engine = RewriteEngine::from_xml(GOOD).unwrap();
        let snapshot = engine.snapshot();
        engine.reload(RuleSet::default());
        assert_eq!(snapshot.evaluate("/a", "").rewritten_path(), Some("/b"));
        assert_eq!(engine.evaluate("/a", "").outcome(), &Outcome::Continue);
    }

    #[test]
    fn reload_file_missing_path_is_io_error() {
        let engine = RewriteEngine::default();
        let err = engine
            .reload_file("/definitely/not/here/rules.xml")
            .unwrap_err();
        assert!(matches!(err, RewriteError::Io(_)));
    }
}
