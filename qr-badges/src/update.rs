//! Optional check for a newer release.
//!
//! The check runs on its own thread while badges are generated and is
//! collected afterwards with a bounded wait. It never fails a run.

use serde::Deserialize;
use std::cmp::Ordering;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Environment variable consulted when `--update-url` is not given.
pub const UPDATE_URL_ENV: &str = "QR_BADGES_UPDATE_URL";

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// How long to wait for the check once badges are written.
pub const COLLECT_TIMEOUT: Duration = Duration::from_millis(1500);

pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    pub version: String,
    pub url: String,
}

#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("invalid release document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid version `{0}`")]
    Version(String),
}

pub trait UpdateChecker {
    /// The newest published release, if the source knows one.
    fn latest(&self) -> Result<Option<Release>, UpdateError>;
}

/// Used when no update URL is configured, or checks are disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopUpdateChecker;

impl UpdateChecker for NoopUpdateChecker {
    fn latest(&self) -> Result<Option<Release>, UpdateError> {
        Ok(None)
    }
}

/// Fetches `{ "version": "x.y.z", "url": "..." }` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpUpdateChecker {
    url: String,
    timeout: Duration,
}

impl HttpUpdateChecker {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: REQUEST_TIMEOUT,
        }
    }
}

impl UpdateChecker for HttpUpdateChecker {
    fn latest(&self) -> Result<Option<Release>, UpdateError> {
        let agent = ureq::AgentBuilder::new().timeout(self.timeout).build();
        let body = agent
            .get(&self.url)
            .call()
            .map_err(|e| UpdateError::Request(e.to_string()))?
            .into_string()
            .map_err(|e| UpdateError::Request(e.to_string()))?;
        parse_release(&body).map(Some)
    }
}

pub fn parse_release(body: &str) -> Result<Release, UpdateError> {
    let release: Release = serde_json::from_str(body)?;
    parse_version(&release.version)?;
    Ok(release)
}

/// Numeric components of a dotted version, ignoring a leading `v`.
fn parse_version(version: &str) -> Result<Vec<u64>, UpdateError> {
    let trimmed = version.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    // Pre-release and build suffixes are not compared.
    let core = trimmed.split(['-', '+']).next().unwrap_or_default();
    core.split('.')
        .map(|part| part.parse::<u64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| UpdateError::Version(version.to_string()))
}

pub fn compare_versions(a: &str, b: &str) -> Result<Ordering, UpdateError> {
    let mut a = parse_version(a)?;
    let mut b = parse_version(b)?;
    let len = a.len().max(b.len());
    a.resize(len, 0);
    b.resize(len, 0);
    Ok(a.cmp(&b))
}

/// `true` when `latest` is strictly newer than `current`.
pub fn is_newer(current: &str, latest: &str) -> Result<bool, UpdateError> {
    Ok(compare_versions(latest, current)? == Ordering::Greater)
}

/// A check in flight on a background thread.
pub struct PendingCheck {
    receiver: Receiver<Result<Option<Release>, UpdateError>>,
}

/// Start `checker` on its own thread.
pub fn spawn_check(checker: Box<dyn UpdateChecker + Send>) -> PendingCheck {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        // The receiver may already be gone if the run finished first.
        let _ = sender.send(checker.latest());
    });
    PendingCheck { receiver }
}

impl PendingCheck {
    /// The release to announce, if a newer one arrived within `timeout`.
    pub fn collect(self, timeout: Duration) -> Option<Release> {
        let release = match self.receiver.recv_timeout(timeout) {
            Ok(Ok(Some(release))) => release,
            Ok(Ok(None)) => {
                log::debug!("No release information available");
                return None;
            }
            Ok(Err(e)) => {
                log::warn!("Update check failed: {}", e);
                return None;
            }
            Err(RecvTimeoutError::Timeout) => {
                log::debug!("Update check did not finish within {:?}", timeout);
                return None;
            }
            Err(RecvTimeoutError::Disconnected) => {
                log::debug!("Update check thread exited without a result");
                return None;
            }
        };

        match is_newer(CURRENT_VERSION, &release.version) {
            Ok(true) => {
                log::info!("Newer version available: {}", release.version);
                Some(release)
            }
            Ok(false) => {
                log::debug!("{} is up to date (latest {})", CURRENT_VERSION, release.version);
                None
            }
            Err(e) => {
                log::warn!("Update check failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    impl UpdateChecker for Fixed {
        fn latest(&self) -> Result<Option<Release>, UpdateError> {
            Ok(Some(Release {
                version: self.0.to_string(),
                url: "https://example.com/download".to_string(),
            }))
        }
    }

    struct Failing;

    impl UpdateChecker for Failing {
        fn latest(&self) -> Result<Option<Release>, UpdateError> {
            Err(UpdateError::Request("connection refused".to_string()))
        }
    }

    struct Slow;

    impl UpdateChecker for Slow {
        fn latest(&self) -> Result<Option<Release>, UpdateError> {
            thread::sleep(Duration::from_millis(500));
            Ok(None)
        }
    }

    #[test]
    fn noop_never_reports_a_release() {
        assert!(NoopUpdateChecker.latest().unwrap().is_none());
        assert!(spawn_check(Box::new(NoopUpdateChecker))
            .collect(COLLECT_TIMEOUT)
            .is_none());
    }

    #[test]
    fn versions_compare_numerically() {
        assert!(is_newer("1.9.3", "1.10.0").unwrap());
        assert!(!is_newer("1.10.0", "1.9.3").unwrap());
        assert!(!is_newer("1.2.0", "1.2").unwrap());
        assert!(is_newer("1.2", "v1.2.1").unwrap());
        assert!(!is_newer("2.0.0", "2.0.0-beta").unwrap());
        assert!(matches!(
            compare_versions("1.x", "1.0"),
            Err(UpdateError::Version(_))
        ));
    }

    #[test]
    fn release_document_parses() {
        let release =
            parse_release(r#"{ "version": "0.3.1", "url": "https://example.com/qr-badges" }"#)
                .unwrap();
        assert_eq!(release.version, "0.3.1");
        assert!(matches!(parse_release("{}"), Err(UpdateError::Parse(_))));
        assert!(matches!(
            parse_release(r#"{ "version": "latest", "url": "" }"#),
            Err(UpdateError::Version(_))
        ));
    }

    #[test]
    fn newer_release_is_announced() {
        let found = spawn_check(Box::new(Fixed("999.0.0"))).collect(COLLECT_TIMEOUT);
        assert_eq!(found.unwrap().version, "999.0.0");

        let current = spawn_check(Box::new(Fixed(CURRENT_VERSION))).collect(COLLECT_TIMEOUT);
        assert!(current.is_none());
    }

    #[test]
    fn failures_and_timeouts_are_swallowed() {
        assert!(spawn_check(Box::new(Failing)).collect(COLLECT_TIMEOUT).is_none());
        assert!(spawn_check(Box::new(Slow))
            .collect(Duration::from_millis(10))
            .is_none());
    }
}
