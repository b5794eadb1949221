use async_trait::async_trait;

use alertflow_core::Alert;
use alertflow_expr::{CustomerContext, SiteContext};

/// Site and customer enrichment for one alert.
#[derive(Debug, Default)]
pub struct ResolvedContext {
    pub site: Option<SiteContext>,
    pub customer: Option<CustomerContext>,
}

/// Maps an alert to its site/customer context for the expression
/// environment.
///
/// Inventory lookup is an external concern; the default resolver returns
/// nothing, which binds every site/customer variable to its zero value.
#[async_trait]
pub trait ContextResolver: Send + Sync {
    /// Resolve enrichment for an alert.
    async fn resolve(&self, alert: &Alert) -> ResolvedContext;
}

/// Resolver that never enriches.
pub struct NoopContextResolver;

#[async_trait]
impl ContextResolver for NoopContextResolver {
    async fn resolve(&self, _alert: &Alert) -> ResolvedContext {
        ResolvedContext::default()
    }
}
