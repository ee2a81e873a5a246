//! Record naming and identification.
//!
//! This module derives the identifier a resource record gets in the shared control-plane
//! namespace from the resource's backend name and the identifier of its owning host.
//! Record identifiers follow the DNS-label convention used by the control plane: lowercase
//! alphanumerics and single hyphens, no leading or trailing hyphen, at most 63 bytes.
//!
//! ## Strategies
//!
//! **None**: the sanitized backend name only. Identical names on two hosts collide.
//!
//! **PrefixProvider**: the sanitized owner identifier, then the backend name.
//!
//! **PrefixHost**: a host name extracted from the owner identifier, then the backend name.
//!
//! **Hash**: the backend name, then a six hex digit digest of the owner identifier.
//!
//! ## Length Bound
//!
//! Identifiers longer than 63 bytes are cut to 59 bytes and suffixed with `-NNN`, where
//! `NNN` is a three digit tag computed over the whole untruncated identifier. Two long names
//! sharing the same 59 byte prefix therefore still end up with different identifiers in most
//! cases. The tag arithmetic is kept stable since existing records were named with it.
//!
//! Generation never fails: every input, including empty or fully invalid ones, maps to a
//! well-formed (possibly empty) identifier.

use std::{collections::BTreeMap, convert::Infallible, fmt::Display, str::FromStr};

use crate::admission::error::AdmissionError;

/// Maximum length of a record identifier.
pub const MAX_RECORD_ID_LEN: usize = 63;

/// Length of the `-NNN` tag appended to truncated identifiers.
const TRUNCATION_TAG_LEN: usize = 4;

/// Label holding the owning-host identifier of a record.
pub const LABEL_INSTANCE: &str = "hostscope.io/instance";

/// Label holding the host name extracted from the owning-host identifier.
pub const LABEL_HOST: &str = "hostscope.io/host";

/// Annotation holding the name of the resource on its backend host.
pub const ANNOTATION_ORIGINAL_NAME: &str = "hostscope.io/original-name";

const HOST_PREFIXES: [&str; 3] = ["libvirt-", "provider-", "config-"];
const HOST_SUFFIXES: [&str; 3] = ["-libvirt", "-provider", "-config"];

/// Strategy used to fold the owning host into record identifiers.
///
/// The strategy is a deployment-wide setting: it is parsed once at startup and then
/// passed explicitly to every generation call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamingStrategy {
    /// Backend name only (legacy behavior, may collide across hosts)
    #[default]
    None,
    /// Owner identifier prefix
    PrefixProvider,
    /// Extracted host name prefix
    PrefixHost,
    /// Owner digest suffix
    Hash,
}

impl NamingStrategy {
    /// Parses a strategy leniently.
    ///
    /// Matching is case-insensitive. Empty and unrecognized values resolve to
    /// [`NamingStrategy::None`] instead of failing, so a typo in the deployment
    /// configuration degrades to the legacy naming.
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "prefix-provider" => NamingStrategy::PrefixProvider,
            "prefix-host" => NamingStrategy::PrefixHost,
            "hash" => NamingStrategy::Hash,
            _ => NamingStrategy::None,
        }
    }

    /// Returns the configuration token for this strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            NamingStrategy::None => "none",
            NamingStrategy::PrefixProvider => "prefix-provider",
            NamingStrategy::PrefixHost => "prefix-host",
            NamingStrategy::Hash => "hash",
        }
    }
}

impl From<&str> for NamingStrategy {
    fn from(value: &str) -> Self {
        NamingStrategy::parse(value)
    }
}

impl From<Option<&str>> for NamingStrategy {
    fn from(value: Option<&str>) -> Self {
        value.map(NamingStrategy::parse).unwrap_or_default()
    }
}

impl FromStr for NamingStrategy {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(NamingStrategy::parse(s))
    }
}

impl Display for NamingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record identifier generator bound to a naming strategy.
///
/// The generator holds no state besides its strategy; cloning it is free and
/// the same inputs always produce the same identifier.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NameGenerator {
    strategy: NamingStrategy,
}

impl NameGenerator {
    /// Creates a generator for the given strategy
    pub fn new(strategy: NamingStrategy) -> Self {
        Self { strategy }
    }

    /// Returns the strategy of this generator
    pub fn strategy(&self) -> NamingStrategy {
        self.strategy
    }

    /// Generates the record identifier of a backend resource owned by `owner`.
    pub fn generate(&self, backend_name: &str, owner: &str) -> String {
        let combined = match self.strategy {
            NamingStrategy::None => sanitize(backend_name),
            NamingStrategy::PrefixProvider => join(&[&sanitize(owner), &sanitize(backend_name)]),
            NamingStrategy::PrefixHost => join(&[&extract_host(owner), &sanitize(backend_name)]),
            NamingStrategy::Hash => join(&[&sanitize(backend_name), &short_hash(owner)]),
        };
        truncate(&combined, MAX_RECORD_ID_LEN)
    }
}

/// Builds the operator-facing labels of a record owned by `owner`.
///
/// The host label is omitted when no host name can be extracted.
pub fn record_labels(owner: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::from([(LABEL_INSTANCE.to_string(), owner.to_string())]);
    let host = extract_host(owner);
    if !host.is_empty() {
        labels.insert(LABEL_HOST.to_string(), host);
    }
    labels
}

/// Builds the operator-facing annotations of a record named `backend_name` on its host.
pub fn record_annotations(backend_name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(ANNOTATION_ORIGINAL_NAME.to_string(), backend_name.to_string())])
}

/// Makes a string safe for use in a record identifier.
///
/// Lowercases the input, replaces every character outside `[a-z0-9-]` with a hyphen,
/// collapses hyphen runs and strips leading and trailing hyphens. The transform is
/// idempotent.
pub fn sanitize(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            sanitized.push(c);
        } else if !sanitized.is_empty() && !sanitized.ends_with('-') {
            sanitized.push('-');
        }
    }
    // Runs are collapsed while pushing, so at most one hyphen trails
    if sanitized.ends_with('-') {
        sanitized.pop();
    }
    sanitized
}

/// Extracts a host name from an owner identifier.
///
/// Strips the first matching wrapper prefix (`libvirt-`, `provider-`, `config-`), then the
/// first matching wrapper suffix (`-libvirt`, `-provider`, `-config`), each at most once,
/// and sanitizes the remainder. Identifiers without wrapper tokens are only sanitized.
///
/// This is a readability heuristic, not an identity: distinct owners may extract to the
/// same host name.
pub fn extract_host(owner: &str) -> String {
    let lower = owner.to_lowercase();
    let mut host = lower.as_str();
    if let Some(stripped) = HOST_PREFIXES.iter().find_map(|prefix| host.strip_prefix(prefix)) {
        host = stripped;
    }
    if let Some(stripped) = HOST_SUFFIXES.iter().find_map(|suffix| host.strip_suffix(suffix)) {
        host = stripped;
    }
    sanitize(host)
}

/// Returns a six hex digit digest of `input`.
///
/// Not cryptographic. Stable across platforms and restarts: characters are accumulated
/// as code points in wrapping 64-bit arithmetic, then mixed so that owners differing in a
/// single trailing character still get unrelated digests.
pub fn short_hash(input: &str) -> String {
    let hash = input.chars().fold(0u64, |hash, c| hash.wrapping_mul(31).wrapping_add(u64::from(c)));
    format!("{:06x}", avalanche(hash) >> 40)
}

fn avalanche(mut hash: u64) -> u64 {
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51_afd7_ed55_8ccd);
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    hash ^= hash >> 33;
    hash
}

/// Bounds `name` to `max_len` bytes.
///
/// Names within the bound are returned unchanged. Longer names keep their first
/// `max_len - 4` bytes followed by `-NNN`, with `NNN` derived from the whole name.
/// Bounds too small to hold a tag degrade to a plain cut. Hyphens left dangling by
/// the cut are dropped, so the result may be a few bytes shorter than `max_len`.
pub fn truncate(name: &str, max_len: usize) -> String {
    if name.len() <= max_len {
        return name.to_string();
    }

    let Some(keep) = max_len.checked_sub(TRUNCATION_TAG_LEN).filter(|keep| *keep >= 1) else {
        return prefix_within(name, max_len).trim_end_matches('-').to_string();
    };

    let tag = truncation_tag(name);
    let prefix = prefix_within(name, keep).trim_end_matches('-');
    if prefix.is_empty() { tag } else { format!("{prefix}-{tag}") }
}

/// Order-sensitive, position-weighted tag of `name`, reduced to three digits.
fn truncation_tag(name: &str) -> String {
    let hash = name.char_indices().fold(0i64, |hash, (i, c)| {
        hash.wrapping_mul(31).wrapping_add(i64::from(u32::from(c))).wrapping_add(i as i64)
    });
    format!("{:03}", hash.unsigned_abs() % 1000)
}

/// Longest prefix of `s` that fits in `max_bytes` and ends on a char boundary.
fn prefix_within(s: &str, max_bytes: usize) -> &str {
    let mut end = max_bytes.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Joins non-empty components with a single hyphen.
fn join(parts: &[&str]) -> String {
    parts.iter().filter(|part| !part.is_empty()).copied().collect::<Vec<_>>().join("-")
}

/// Checks that `record_id` is a well-formed record identifier.
///
/// Used for identifiers that were generated earlier and arrive with the resource
/// instead of being derived again.
pub fn check_record_id(record_id: &str) -> Result<(), AdmissionError> {
    let well_formed = !record_id.is_empty()
        && record_id.len() <= MAX_RECORD_ID_LEN
        && record_id.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        && !record_id.starts_with('-')
        && !record_id.ends_with('-')
        && !record_id.contains("--");
    if well_formed { Ok(()) } else { Err(AdmissionError::InvalidRecordId(record_id.to_string())) }
}
