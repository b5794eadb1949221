use serde::{Deserialize, Serialize};

/// Comparison operator applied to the value a condition extracts from an
/// alert. Semantics are defined by the condition evaluator; the operator is
/// pure data here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchOperator {
    #[default]
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Regex,
    In,
    NotIn,
    Exists,
    NotExists,
    GreaterThan,
    LessThan,
}

impl MatchOperator {
    /// Return the canonical tag name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "EQUALS",
            Self::NotEquals => "NOT_EQUALS",
            Self::Contains => "CONTAINS",
            Self::NotContains => "NOT_CONTAINS",
            Self::StartsWith => "STARTS_WITH",
            Self::EndsWith => "ENDS_WITH",
            Self::Regex => "REGEX",
            Self::In => "IN",
            Self::NotIn => "NOT_IN",
            Self::Exists => "EXISTS",
            Self::NotExists => "NOT_EXISTS",
            Self::GreaterThan => "GREATER_THAN",
            Self::LessThan => "LESS_THAN",
        }
    }
}

impl std::fmt::Display for MatchOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The shared payload of every field-matching condition kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Matcher {
    /// Label/annotation key for the LABEL and ANNOTATION kinds; unused by
    /// kinds with a fixed extraction source.
    #[serde(default)]
    pub field: String,

    /// The operator to apply to the extracted value.
    pub operator: MatchOperator,

    /// Scalar comparand for the single-value operators.
    #[serde(default)]
    pub string_value: String,

    /// Membership list for IN / NOT_IN.
    #[serde(default)]
    pub string_list: Vec<String>,

    /// Pattern for REGEX (falls back to `string_value` when empty).
    #[serde(default)]
    pub regex_pattern: String,
}

impl Matcher {
    /// Create a matcher with the given operator and scalar comparand.
    #[must_use]
    pub fn new(operator: MatchOperator, string_value: impl Into<String>) -> Self {
        Self {
            field: String::new(),
            operator,
            string_value: string_value.into(),
            string_list: Vec::new(),
            regex_pattern: String::new(),
        }
    }

    /// Set the label/annotation key.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    /// Set the membership list.
    #[must_use]
    pub fn with_list(mut self, list: Vec<String>) -> Self {
        self.string_list = list;
        self
    }

    /// Set the regex pattern.
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.regex_pattern = pattern.into();
        self
    }
}

/// The expression payload of an EXPRESSION condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpressionCondition {
    /// A boolean predicate in the rule-expression language.
    pub expression: String,
}

/// Fieldless discriminant of [`Condition`], used in evaluation records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionKind {
    Label,
    Annotation,
    Severity,
    Source,
    Service,
    Site,
    Pop,
    CustomerTier,
    EquipmentType,
    Carrier,
    Expression,
}

impl ConditionKind {
    /// Return the canonical tag name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Label => "LABEL",
            Self::Annotation => "ANNOTATION",
            Self::Severity => "SEVERITY",
            Self::Source => "SOURCE",
            Self::Service => "SERVICE",
            Self::Site => "SITE",
            Self::Pop => "POP",
            Self::CustomerTier => "CUSTOMER_TIER",
            Self::EquipmentType => "EQUIPMENT_TYPE",
            Self::Carrier => "CARRIER",
            Self::Expression => "EXPRESSION",
        }
    }
}

impl std::fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed predicate over an alert, tagged by what it extracts.
///
/// All kinds except `Expression` carry a [`Matcher`]; the evaluator pairs
/// the kind's extraction rule with the matcher's operator. `Expression`
/// delegates to the expression engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
    Label(Matcher),
    Annotation(Matcher),
    Severity(Matcher),
    Source(Matcher),
    Service(Matcher),
    Site(Matcher),
    Pop(Matcher),
    CustomerTier(Matcher),
    EquipmentType(Matcher),
    Carrier(Matcher),
    Expression(ExpressionCondition),
}

impl Condition {
    /// A LABEL condition on the given key.
    #[must_use]
    pub fn label(field: impl Into<String>, operator: MatchOperator, value: impl Into<String>) -> Self {
        Self::Label(Matcher::new(operator, value).with_field(field))
    }

    /// An EXPRESSION condition with the given source.
    #[must_use]
    pub fn expression(expression: impl Into<String>) -> Self {
        Self::Expression(ExpressionCondition {
            expression: expression.into(),
        })
    }

    /// The fieldless discriminant.
    #[must_use]
    pub fn kind(&self) -> ConditionKind {
        match self {
            Self::Label(_) => ConditionKind::Label,
            Self::Annotation(_) => ConditionKind::Annotation,
            Self::Severity(_) => ConditionKind::Severity,
            Self::Source(_) => ConditionKind::Source,
            Self::Service(_) => ConditionKind::Service,
            Self::Site(_) => ConditionKind::Site,
            Self::Pop(_) => ConditionKind::Pop,
            Self::CustomerTier(_) => ConditionKind::CustomerTier,
            Self::EquipmentType(_) => ConditionKind::EquipmentType,
            Self::Carrier(_) => ConditionKind::Carrier,
            Self::Expression(_) => ConditionKind::Expression,
        }
    }

    /// The matcher payload, for every kind that carries one.
    #[must_use]
    pub fn matcher(&self) -> Option<&Matcher> {
        match self {
            Self::Label(m)
            | Self::Annotation(m)
            | Self::Severity(m)
            | Self::Source(m)
            | Self::Service(m)
            | Self::Site(m)
            | Self::Pop(m)
            | Self::CustomerTier(m)
            | Self::EquipmentType(m)
            | Self::Carrier(m) => Some(m),
            Self::Expression(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_serde_is_kind_tagged() {
        let cond = Condition::label("severity", MatchOperator::Equals, "critical");
        let json = serde_json::to_value(&cond).unwrap();
        assert_eq!(json["kind"], "LABEL");
        assert_eq!(json["field"], "severity");
        assert_eq!(json["operator"], "EQUALS");
        assert_eq!(json["string_value"], "critical");

        let back: Condition = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind(), ConditionKind::Label);
    }

    #[test]
    fn expression_condition_carries_only_source() {
        let cond = Condition::expression("alert_severity == \"critical\"");
        let json = serde_json::to_value(&cond).unwrap();
        assert_eq!(json["kind"], "EXPRESSION");
        assert_eq!(json["expression"], "alert_severity == \"critical\"");
        assert!(cond.matcher().is_none());
    }

    #[test]
    fn matcher_defaults_fill_optional_fields() {
        let json = serde_json::json!({
            "kind": "CUSTOMER_TIER",
            "operator": "IN",
            "string_list": ["1", "2"]
        });
        let cond: Condition = serde_json::from_value(json).unwrap();
        let m = cond.matcher().unwrap();
        assert_eq!(m.operator, MatchOperator::In);
        assert_eq!(m.string_list, vec!["1", "2"]);
        assert!(m.field.is_empty());
        assert!(m.regex_pattern.is_empty());
    }

    #[test]
    fn operator_tags() {
        assert_eq!(MatchOperator::NotExists.as_str(), "NOT_EXISTS");
        let json = serde_json::to_string(&MatchOperator::GreaterThan).unwrap();
        assert_eq!(json, "\"GREATER_THAN\"");
    }
}
