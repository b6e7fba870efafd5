use std::cmp::Ordering;
use std::time::Duration;

use log::{debug, info, warn};
use reqwest::StatusCode;
use semver::Version;
use serde::Deserialize;
use thiserror::Error;

pub const RELEASES_ENDPOINT: &str =
    "https://api.github.com/repos/mahmoudSalim/granola-sync/releases/latest";

/// Where users go when the package manager cannot apply an update.
pub const RELEASES_PAGE: &str = "https://github.com/mahmoudSalim/granola-sync/releases/latest";

pub const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// A release newer than the running build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub current_version: String,
    pub latest_version: String,
    pub release_url: String,
}

#[derive(Deserialize)]
struct GitHubRelease {
    tag_name: String,
    html_url: String,
}

/// Why a check produced no answer. Only used for display.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckFailure {
    #[error("could not reach the release server: {0}")]
    Request(String),
    #[error("release server answered HTTP {0}")]
    HttpStatus(u16),
    #[error("malformed release response: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateCheck {
    UpToDate { current: String },
    Available(VersionInfo),
    Failed(CheckFailure),
}

impl UpdateCheck {
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

#[derive(Debug, Clone)]
pub struct UpdateChecker {
    client: reqwest::Client,
    endpoint: String,
    current_version: String,
    timeout: Duration,
}

impl UpdateChecker {
    /// Checker against the public releases endpoint.
    #[must_use]
    pub fn new(current_version: &str) -> Self {
        Self::with_endpoint(current_version, RELEASES_ENDPOINT, CHECK_TIMEOUT)
    }

    #[must_use]
    pub fn with_endpoint(current_version: &str, endpoint: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("granola-sync-app/{current_version}"))
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoint: endpoint.to_string(),
            current_version: current_version.to_string(),
            timeout,
        }
    }

    #[must_use]
    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch the latest release and compare it with the running build.
    ///
    /// Never fails: transport, status and parse problems all end up in
    /// [`UpdateCheck::Failed`].
    pub async fn check(&self) -> UpdateCheck {
        match self.fetch_latest().await {
            Ok(release) => evaluate_release(
                &release.tag_name,
                &release.html_url,
                &self.current_version,
            ),
            Err(failure) => {
                warn!("Update check failed: {failure}");
                UpdateCheck::Failed(failure)
            }
        }
    }

    async fn fetch_latest(&self) -> Result<GitHubRelease, CheckFailure> {
        debug!("Fetching latest release from {}", self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .header("Accept", "application/vnd.github+json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|error| CheckFailure::Request(error.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(CheckFailure::HttpStatus(status.as_u16()));
        }

        response
            .json::<GitHubRelease>()
            .await
            .map_err(|error| CheckFailure::Parse(error.to_string()))
    }
}

/// Compare a release tag against `current`.
#[must_use]
pub fn evaluate_release(tag: &str, release_url: &str, current: &str) -> UpdateCheck {
    let latest = normalize_tag(tag);
    let current = normalize_tag(current);

    if is_newer_version(latest, current) {
        info!("Update available: {current} -> {latest}");
        UpdateCheck::Available(VersionInfo {
            current_version: current.to_string(),
            latest_version: latest.to_string(),
            release_url: release_url.to_string(),
        })
    } else {
        debug!("Up to date at {current} (latest {latest})");
        UpdateCheck::UpToDate {
            current: current.to_string(),
        }
    }
}

/// Strip one leading `v` from a release tag.
#[must_use]
pub fn normalize_tag(tag: &str) -> &str {
    let tag = tag.trim();
    tag.strip_prefix(['v', 'V']).unwrap_or(tag)
}

/// `latest` is strictly newer than `current`.
///
/// Semver ordering when both sides parse (`1.2` counts as `1.2.0`),
/// otherwise digit runs compare as numbers and the rest as text.
#[must_use]
pub fn is_newer_version(latest: &str, current: &str) -> bool {
    match (parse_semver(latest), parse_semver(current)) {
        (Some(latest), Some(current)) => latest > current,
        _ => compare_numeric_aware(latest, current) == Ordering::Greater,
    }
}

fn parse_semver(version: &str) -> Option<Version> {
    if let Ok(parsed) = Version::parse(version) {
        return Some(parsed);
    }

    let (core, suffix) = split_semver_core_and_suffix(version);
    let mut parts = core.split('.');
    let major = parts.next()?.parse::<u64>().ok()?;
    let minor = parts.next().map(str::parse::<u64>).transpose().ok()?;
    let patch = parts.next().map(str::parse::<u64>).transpose().ok()?;

    if parts.next().is_some() {
        return None;
    }

    let normalized = match (minor, patch) {
        (None, _) => format!("{major}.0.0{suffix}"),
        (Some(minor), None) => format!("{major}.{minor}.0{suffix}"),
        (Some(minor), Some(patch)) => format!("{major}.{minor}.{patch}{suffix}"),
    };

    Version::parse(&normalized).ok()
}

fn split_semver_core_and_suffix(version: &str) -> (&str, &str) {
    let suffix_idx = version.find(['-', '+']).unwrap_or(version.len());
    (&version[..suffix_idx], &version[suffix_idx..])
}

fn compare_numeric_aware(left: &str, right: &str) -> Ordering {
    let left = runs(left);
    let right = runs(right);

    for (a, b) in left.iter().zip(&right) {
        let ordering = compare_run(a, b);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    left.len().cmp(&right.len())
}

fn compare_run(left: &str, right: &str) -> Ordering {
    let numeric = |run: &str| run.bytes().all(|b| b.is_ascii_digit());
    if numeric(left) && numeric(right) {
        let left = left.trim_start_matches('0');
        let right = right.trim_start_matches('0');
        left.len().cmp(&right.len()).then_with(|| left.cmp(right))
    } else {
        left.cmp(right)
    }
}

/// Split into maximal runs of ASCII digits and non-digits.
fn runs(value: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut in_digits = None;

    for (idx, ch) in value.char_indices() {
        let digit = ch.is_ascii_digit();
        if in_digits.is_some_and(|previous| previous != digit) {
            runs.push(&value[start..idx]);
            start = idx;
        }
        in_digits = Some(digit);
    }
    if start < value.len() {
        runs.push(&value[start..]);
    }
    runs
}
