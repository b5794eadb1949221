use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use alertflow_core::Alert;

use crate::typecheck::ExprType;
use crate::value::Value;

/// Site enrichment bound into the expression environment when the alert can
/// be attributed to a physical site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteContext {
    pub id: String,
    pub name: String,
    pub code: String,
    pub site_type: String,
    pub region: String,
    pub country: String,
    pub city: String,
    pub timezone: String,
    pub tier: i64,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub available: bool,
}

/// Customer enrichment bound into the expression environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerContext {
    pub id: String,
    pub name: String,
    pub tier: i64,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// The declared expression environment: every variable name with its type.
///
/// This list is the compile-time source of truth — referencing a name not
/// in it is a compile error — and [`Activation::for_alert`] binds every
/// entry on every call, so a compiled program can never hit an unbound
/// variable at runtime.
pub const VARIABLES: &[(&str, ExprType)] = &[
    ("alert_labels", ExprType::StringMap),
    ("alert_annotations", ExprType::StringMap),
    ("alert_severity", ExprType::String),
    ("alert_id", ExprType::String),
    ("alert_summary", ExprType::String),
    ("alert_details", ExprType::String),
    ("alert_service_id", ExprType::String),
    ("alert_source", ExprType::String),
    ("alert_fingerprint", ExprType::String),
    ("alert_generator_url", ExprType::String),
    ("alert_starts_at", ExprType::Timestamp),
    ("alert_ends_at", ExprType::Timestamp),
    ("now", ExprType::Timestamp),
    ("site_id", ExprType::String),
    ("site_name", ExprType::String),
    ("site_code", ExprType::String),
    ("site_type", ExprType::String),
    ("site_region", ExprType::String),
    ("site_country", ExprType::String),
    ("site_city", ExprType::String),
    ("site_timezone", ExprType::String),
    ("site_tier", ExprType::Int),
    ("site_metadata", ExprType::StringMap),
    ("site_available", ExprType::Bool),
    ("customer_id", ExprType::String),
    ("customer_name", ExprType::String),
    ("customer_tier", ExprType::Int),
    ("customer_metadata", ExprType::StringMap),
];

/// Look up the declared type of an environment variable.
pub fn variable_type(name: &str) -> Option<ExprType> {
    VARIABLES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, t)| t)
}

/// The binding of every declared variable to a concrete value for one
/// evaluation.
///
/// Absent site/customer context binds scalars to the empty string, integers
/// to 0, maps to empty, and `site_available` to false — absence is never a
/// runtime error.
#[derive(Debug, Clone)]
pub struct Activation {
    values: HashMap<&'static str, Value>,
}

impl Activation {
    /// Bind the full environment for one alert at the evaluation instant.
    #[allow(clippy::too_many_lines)]
    #[must_use]
    pub fn for_alert(
        alert: &Alert,
        site: Option<&SiteContext>,
        customer: Option<&CustomerContext>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut values: HashMap<&'static str, Value> = HashMap::with_capacity(VARIABLES.len());

        values.insert("alert_labels", Value::string_map(&alert.labels));
        values.insert("alert_annotations", Value::string_map(&alert.annotations));
        values.insert(
            "alert_severity",
            Value::String(alert.severity.as_str().to_owned()),
        );
        values.insert("alert_id", Value::String(alert.id.clone()));
        values.insert("alert_summary", Value::String(alert.summary.clone()));
        values.insert("alert_details", Value::String(alert.details.clone()));
        values.insert("alert_service_id", Value::String(alert.service_id.clone()));
        values.insert(
            "alert_source",
            Value::String(alert.source.as_str().to_owned()),
        );
        values.insert(
            "alert_fingerprint",
            Value::String(alert.fingerprint.clone()),
        );
        values.insert(
            "alert_generator_url",
            Value::String(alert.generator_url.clone().unwrap_or_default()),
        );
        values.insert(
            "alert_starts_at",
            Value::Int(alert.triggered_at.timestamp()),
        );
        // Zero unless the alert is resolved; firing endsAt values are kept
        // only in the raw payload.
        values.insert(
            "alert_ends_at",
            Value::Int(alert.resolved_at.map_or(0, |t| t.timestamp())),
        );
        values.insert("now", Value::Int(now.timestamp()));

        match site {
            Some(s) => {
                values.insert("site_id", Value::String(s.id.clone()));
                values.insert("site_name", Value::String(s.name.clone()));
                values.insert("site_code", Value::String(s.code.clone()));
                values.insert("site_type", Value::String(s.site_type.clone()));
                values.insert("site_region", Value::String(s.region.clone()));
                values.insert("site_country", Value::String(s.country.clone()));
                values.insert("site_city", Value::String(s.city.clone()));
                values.insert("site_timezone", Value::String(s.timezone.clone()));
                values.insert("site_tier", Value::Int(s.tier));
                values.insert("site_metadata", Value::string_map(&s.metadata));
                values.insert("site_available", Value::Bool(s.available));
            }
            None => {
                for name in [
                    "site_id",
                    "site_name",
                    "site_code",
                    "site_type",
                    "site_region",
                    "site_country",
                    "site_city",
                    "site_timezone",
                ] {
                    values.insert(name, Value::String(String::new()));
                }
                values.insert("site_tier", Value::Int(0));
                values.insert("site_metadata", Value::Map(HashMap::new()));
                values.insert("site_available", Value::Bool(false));
            }
        }

        match customer {
            Some(c) => {
                values.insert("customer_id", Value::String(c.id.clone()));
                values.insert("customer_name", Value::String(c.name.clone()));
                values.insert("customer_tier", Value::Int(c.tier));
                values.insert("customer_metadata", Value::string_map(&c.metadata));
            }
            None => {
                values.insert("customer_id", Value::String(String::new()));
                values.insert("customer_name", Value::String(String::new()));
                values.insert("customer_tier", Value::Int(0));
                values.insert("customer_metadata", Value::Map(HashMap::new()));
            }
        }

        Self { values }
    }

    /// Resolve a variable binding.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}

#[cfg(test)]
mod tests {
    use alertflow_core::{AlertSource, Severity};

    use super::*;

    fn test_alert() -> Alert {
        Alert::new("svc-1", "fp-1", "cpu high", AlertSource::Generic)
            .with_severity(Severity::Critical)
            .with_labels(HashMap::from([(
                "severity".to_owned(),
                "critical".to_owned(),
            )]))
    }

    #[test]
    fn binds_every_declared_variable() {
        let alert = test_alert();
        let activation = Activation::for_alert(&alert, None, None, Utc::now());
        for (name, _) in VARIABLES {
            assert!(
                activation.lookup(name).is_some(),
                "variable {name} is unbound"
            );
        }
    }

    #[test]
    fn absent_context_binds_zero_values() {
        let alert = test_alert();
        let activation = Activation::for_alert(&alert, None, None, Utc::now());
        assert_eq!(
            activation.lookup("site_name"),
            Some(&Value::String(String::new()))
        );
        assert_eq!(activation.lookup("site_tier"), Some(&Value::Int(0)));
        assert_eq!(
            activation.lookup("site_available"),
            Some(&Value::Bool(false))
        );
        assert_eq!(activation.lookup("customer_tier"), Some(&Value::Int(0)));
    }

    #[test]
    fn present_context_binds_real_values() {
        let alert = test_alert();
        let site = SiteContext {
            id: "site-9".into(),
            name: "fra1".into(),
            tier: 2,
            available: true,
            ..SiteContext::default()
        };
        let customer = CustomerContext {
            id: "cust-1".into(),
            name: "acme".into(),
            tier: 1,
            metadata: HashMap::new(),
        };
        let activation =
            Activation::for_alert(&alert, Some(&site), Some(&customer), Utc::now());
        assert_eq!(
            activation.lookup("site_name"),
            Some(&Value::String("fra1".into()))
        );
        assert_eq!(activation.lookup("site_tier"), Some(&Value::Int(2)));
        assert_eq!(
            activation.lookup("customer_name"),
            Some(&Value::String("acme".into()))
        );
    }

    #[test]
    fn ends_at_is_zero_unless_resolved() {
        let alert = test_alert();
        let activation = Activation::for_alert(&alert, None, None, Utc::now());
        assert_eq!(activation.lookup("alert_ends_at"), Some(&Value::Int(0)));

        let resolved_at = Utc::now();
        let resolved = test_alert().with_resolved_at(resolved_at);
        let activation = Activation::for_alert(&resolved, None, None, Utc::now());
        assert_eq!(
            activation.lookup("alert_ends_at"),
            Some(&Value::Int(resolved_at.timestamp()))
        );
    }

    #[test]
    fn variable_type_lookup() {
        assert_eq!(variable_type("alert_labels"), Some(ExprType::StringMap));
        assert_eq!(variable_type("site_tier"), Some(ExprType::Int));
        assert_eq!(variable_type("now"), Some(ExprType::Timestamp));
        assert_eq!(variable_type("nonsense"), None);
    }
}
