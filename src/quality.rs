//! Quality token resolution.
//!
//! Maps a human-chosen quality preference (`max`, `1080p`, `4k`,
//! `custom:900`, ...) onto a yt-dlp format selector. Resolution is total:
//! every input yields exactly one [`QualityPolicy`], with unrecognized
//! tokens falling back to the unconstrained "best available" policy.
//!
//! # Example
//!
//! ```
//! use playlist_dl_core::quality::resolve_quality;
//!
//! let resolved = resolve_quality("1080p");
//! assert_eq!(resolved.policy.as_str(), "bv*[height<=1080]+ba/b[height<=1080]");
//! assert_eq!(resolved.height_cap, Some(1080));
//! assert!(resolved.warning.is_none());
//! ```

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

/// Selector used when no height cap applies: best video + best audio, else best combined.
pub const BEST_POLICY: &str = "bv*+ba/b";

/// Tokens that explicitly request the highest available quality.
const BEST_SYNONYMS: [&str; 3] = ["max", "best", "highest"];

/// Standard height tiers, highest first. Shown as menu hints.
pub const STANDARD_HEIGHTS: [u32; 9] = [4320, 2160, 1440, 1080, 720, 480, 360, 240, 144];

/// Fixed alias table mapping common tier names to pixel-height ceilings.
const TIER_ALIASES: &[(&str, u32)] = &[
    ("4320p", 4320),
    ("4320", 4320),
    ("8k", 4320),
    ("2160p", 2160),
    ("2160", 2160),
    ("4k", 2160),
    ("1440p", 1440),
    ("1440", 1440),
    ("2k", 1440),
    ("1080p", 1080),
    ("1080", 1080),
    ("720p", 720),
    ("720", 720),
    ("480p", 480),
    ("480", 480),
    ("360p", 360),
    ("360", 360),
    ("240p", 240),
    ("240", 240),
    ("144p", 144),
    ("144", 144),
];

/// Accepts `custom:900`, `900p` and bare `900` (3-4 digits).
#[allow(clippy::expect_used)]
static CUSTOM_HEIGHT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:custom:)?(\d{3,4})p?$").expect("custom height regex is valid")
});

/// Opaque format selector handed verbatim to the fetch backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualityPolicy(String);

impl QualityPolicy {
    /// The unconstrained "best available" policy.
    #[must_use]
    pub fn best() -> Self {
        Self(BEST_POLICY.to_string())
    }

    /// Best video at or below `height`, plus best audio; else best combined at or below `height`.
    #[must_use]
    pub fn capped(height: u32) -> Self {
        Self(format!("bv*[height<={height}]+ba/b[height<={height}]"))
    }

    /// Returns the selector string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QualityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raised when a token matches neither the synonyms, the tier table, nor the custom grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnrecognizedQuality {
    /// The normalized token that was rejected.
    pub token: String,
}

impl fmt::Display for UnrecognizedQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized quality '{}'; defaulting to max", self.token)
    }
}

/// Result of resolving a quality token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityResolution {
    /// The selector to hand to the backend.
    pub policy: QualityPolicy,
    /// Height ceiling, or `None` for the unconstrained policy.
    pub height_cap: Option<u32>,
    /// Present when the token was not understood and the default was substituted.
    pub warning: Option<UnrecognizedQuality>,
}

impl QualityResolution {
    fn best() -> Self {
        Self {
            policy: QualityPolicy::best(),
            height_cap: None,
            warning: None,
        }
    }

    fn capped(height: u32) -> Self {
        Self {
            policy: QualityPolicy::capped(height),
            height_cap: Some(height),
            warning: None,
        }
    }
}

/// Resolves a quality token into a format policy.
///
/// Unrecognized tokens produce the unconstrained policy, a `warn!` event,
/// and a populated [`QualityResolution::warning`].
#[must_use]
pub fn resolve_quality(token: &str) -> QualityResolution {
    let normalized = token.trim().to_lowercase();

    if normalized.is_empty() || BEST_SYNONYMS.contains(&normalized.as_str()) {
        return QualityResolution::best();
    }

    if let Some(height) = lookup_tier(&normalized) {
        return QualityResolution::capped(height);
    }

    if let Some(height) = parse_custom_height(&normalized) {
        return QualityResolution::capped(height);
    }

    let warning = UnrecognizedQuality { token: normalized };
    warn!(token = %warning.token, "Unrecognized quality; defaulting to max");
    QualityResolution {
        warning: Some(warning),
        ..QualityResolution::best()
    }
}

fn lookup_tier(token: &str) -> Option<u32> {
    TIER_ALIASES
        .iter()
        .find(|(alias, _)| *alias == token)
        .map(|(_, height)| *height)
}

fn parse_custom_height(token: &str) -> Option<u32> {
    let captures = CUSTOM_HEIGHT_PATTERN.captures(token)?;
    captures.get(1)?.as_str().parse().ok()
}
