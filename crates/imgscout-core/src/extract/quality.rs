//! Known-host quality rewrite for resizer CDNs.

use crate::config::QualityRule;

/// Rewrites the quality parameter of `raw` to the first matching rule's maximum.
///
/// Only the matching `param=value` pair changes; every other query pair keeps its original
/// encoding and order. Unparseable URLs and URLs without the parameter come back unchanged.
pub fn maximize_quality(raw: &str, rules: &[QualityRule]) -> String {
    let Ok(mut url) = url::Url::parse(raw) else {
        return raw.to_string();
    };
    let Some(host) = url.host_str() else {
        return raw.to_string();
    };
    let Some(rule) = rules
        .iter()
        .find(|r| host.contains(r.host_contains.as_str()) && url.path().starts_with(r.path_prefix.as_str()))
    else {
        return raw.to_string();
    };
    let Some(query) = url.query() else {
        return raw.to_string();
    };

    let mut changed = false;
    let rewritten: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) if name == rule.param && value != rule.max_value => {
                changed = true;
                format!("{}={}", name, rule.max_value)
            }
            _ => pair.to_string(),
        })
        .collect();
    if !changed {
        return raw.to_string();
    }
    url.set_query(Some(&rewritten.join("&")));
    url.to_string()
}
