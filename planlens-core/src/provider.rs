//! Provider resolution — maps a resource type to its provider key.

pub const UNKNOWN_PROVIDER: &str = "unknown";

/// Capability seam for provider inference, so ecosystems with other naming
/// conventions can plug in without touching the grouping engine.
pub trait ProviderResolver: Send + Sync {
    fn provider_of(&self, resource_type: &str) -> String;
}

/// Default resolver: the substring before the first `_` in a
/// `provider_resource`-shaped type name. Anything else maps to `unknown`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnderscorePrefixResolver;

impl ProviderResolver for UnderscorePrefixResolver {
    fn provider_of(&self, resource_type: &str) -> String {
        match resource_type.split_once('_') {
            Some((prefix, rest)) if !prefix.is_empty() && !rest.is_empty() => prefix.to_string(),
            _ => UNKNOWN_PROVIDER.to_string(),
        }
    }
}
