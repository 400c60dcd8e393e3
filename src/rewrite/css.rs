//! CSS `url(...)` rewriting
//!
//! Shared by stylesheet files and inline `style` attributes: every `url(...)`
//! reference is resolved against the owning document's URL, rewritten to a
//! local relative path when in scope, and reported for discovery. `data:`
//! URIs and fragment references are left untouched.

use crate::frontier::{ResourceClass, ScopeFilter};
use crate::rewrite::DiscoveredRef;
use crate::url::{local_rel_path, relative_href, resolve_reference};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

fn css_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)url\(\s*(['"]?)([^'")]+)['"]?\s*\)"#).expect("valid regex"))
}

/// Rewrites `url(...)` references in CSS text.
///
/// `from_local` is the output-root-relative path of the file the CSS lives
/// in (the stylesheet itself, or the HTML page for inline styles); relative
/// references in the output are computed from there.
pub fn rewrite_css_text(
    text: &str,
    base_url: &Url,
    from_local: &str,
    scope: &ScopeFilter,
) -> (String, Vec<DiscoveredRef>) {
    let mut discovered = Vec::new();

    let rewritten = css_url_re().replace_all(text, |caps: &regex::Captures| {
        let raw = caps[2].trim();

        if raw.starts_with("data:") || raw.starts_with('#') {
            return caps[0].to_string();
        }

        let resolved = match resolve_reference(raw, base_url) {
            Some(url) => url,
            None => return caps[0].to_string(),
        };

        let class = ResourceClass::from_url_path(resolved.path());
        if !scope.admits(&resolved, class) {
            return caps[0].to_string();
        }

        let target_local = local_rel_path(&resolved);
        let rel = relative_href(from_local, &target_local);
        discovered.push(DiscoveredRef {
            url: resolved,
            class,
        });
        format!("url({})", rel)
    });

    (rewritten.into_owned(), discovered)
}
