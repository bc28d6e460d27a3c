//! Query parameter rewriting for embedded addresses.

use crate::embedding::{Density, EmbeddingConfig, HostContext};
use url::Url;

pub const PARAM_THEME: &str = "sap-theme";
pub const PARAM_ACCESSIBILITY: &str = "sap-accessibility";
pub const PARAM_STATISTICS: &str = "sap-statistics";
pub const PARAM_TIMEOUT: &str = "sap-ushell-timeout";
pub const PARAM_IAPP_STATE: &str = "sap-iapp-state";
pub const PARAM_TOUCH: &str = "sap-touch";

/// Decoded query pairs in order.
pub fn query_pairs(url: &Url) -> Vec<(String, String)> {
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Replace the whole query; an empty list removes the `?`.
pub fn set_query(url: &mut Url, pairs: &[(String, String)]) {
    if pairs.is_empty() {
        url.set_query(None);
        return;
    }
    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
}

/// Drop every occurrence of the named parameters.
pub fn remove_params(url: &mut Url, names: &[String]) {
    let kept: Vec<_> = query_pairs(url)
        .into_iter()
        .filter(|(k, _)| !names.iter().any(|n| n == k))
        .collect();
    set_query(url, &kept);
}

/// Remove the named parameters and return them in their original order.
pub fn take_params(url: &mut Url, names: &[String]) -> Vec<(String, String)> {
    let (taken, kept): (Vec<_>, Vec<_>) = query_pairs(url)
        .into_iter()
        .partition(|(k, _)| names.iter().any(|n| n == k));
    set_query(url, &kept);
    taken
}

/// Parameters derived from the host context, in a fixed order.
pub fn derived_params(host: &HostContext) -> Vec<(String, String)> {
    let mut out = Vec::new();
    if let Some(theme) = &host.theme {
        out.push((PARAM_THEME.to_string(), theme.clone()));
    }
    if host.accessibility {
        out.push((PARAM_ACCESSIBILITY.to_string(), "X".to_string()));
    }
    if host.statistics {
        out.push((PARAM_STATISTICS.to_string(), "true".to_string()));
    }
    if let Some(minutes) = host.session_timeout_minutes {
        out.push((PARAM_TIMEOUT.to_string(), minutes.to_string()));
    }
    if let Some(key) = &host.iapp_state_key {
        out.push((PARAM_IAPP_STATE.to_string(), key.clone()));
    }
    if let Some(density) = host.density {
        let touch = match density {
            Density::Cozy => "1",
            Density::Compact => "0",
        };
        out.push((PARAM_TOUCH.to_string(), touch.to_string()));
    }
    out
}

/// Append derived parameters; a derived value replaces one already present.
pub fn append_derived(url: &mut Url, host: &HostContext) {
    let derived = derived_params(host);
    if derived.is_empty() {
        return;
    }
    let names: Vec<String> = derived.iter().map(|(k, _)| k.clone()).collect();
    let mut pairs: Vec<_> = query_pairs(url)
        .into_iter()
        .filter(|(k, _)| !names.contains(k))
        .collect();
    pairs.extend(derived);
    set_query(url, &pairs);
}

/// Denylisted parameters removed, derived ones appended.
pub fn resolve_navigation_url(url: &Url, config: &EmbeddingConfig, host: &HostContext) -> Url {
    let mut resolved = url.clone();
    remove_params(&mut resolved, &config.denylist);
    append_derived(&mut resolved, host);
    resolved
}
