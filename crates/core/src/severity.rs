use serde::{Deserialize, Serialize};

/// Canonical alert severity.
///
/// Producers send free-form severity labels; the ingress folds them into
/// this closed set via [`Severity::from_label`]. Ordering comparisons over
/// raw labels go through [`severity_level`] instead, which is the single
/// ranking table used everywhere in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Service-impacting, page-worthy.
    Critical,
    /// Degraded but not yet an outage.
    High,
    /// Needs attention during working hours.
    Medium,
    /// Informational with follow-up value.
    Low,
    /// Purely informational.
    Info,
}

impl Severity {
    /// Return the canonical lower-case label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Info => "info",
        }
    }

    /// Fold a producer-supplied severity label into the canonical set.
    ///
    /// Uses the [`severity_level`] ranking with one ingress-specific
    /// exception: `warning`/`warn` map to [`Severity::High`] rather than
    /// the rank-3 bucket. Unrecognized labels land on [`Severity::Info`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_ascii_lowercase();
        if normalized == "warning" || normalized == "warn" {
            return Self::High;
        }
        match severity_level(&normalized) {
            5 => Self::Critical,
            4 => Self::High,
            3 => Self::Medium,
            2 => Self::Low,
            _ => Self::Info,
        }
    }

    /// Rank of this severity on the shared ranking scale.
    #[must_use]
    pub fn rank(self) -> i64 {
        severity_level(self.as_str())
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rank a severity label on the canonical scale.
///
/// `critical|fatal|p1` → 5, `high|error|p2` → 4, `warning|warn|medium|p3` → 3,
/// `info|low|p4` → 2, `debug|p5` → 1, anything else → 0. Case-insensitive.
/// Every severity comparison in the system goes through this table.
#[must_use]
pub fn severity_level(label: &str) -> i64 {
    match label.trim().to_ascii_lowercase().as_str() {
        "critical" | "fatal" | "p1" => 5,
        "high" | "error" | "p2" => 4,
        "warning" | "warn" | "medium" | "p3" => 3,
        "info" | "low" | "p4" => 2,
        "debug" | "p5" => 1,
        _ => 0,
    }
}

/// Returns `true` if `label` ranks at least as high as `min`.
#[must_use]
pub fn severity_at_least(label: &str, min: &str) -> bool {
    severity_level(label) >= severity_level(min)
}
