//! Scope rules: which discovered URLs are eligible to become crawl units

use crate::frontier::ResourceClass;
use url::Url;

/// Admission filter applied before a key enters the frontier.
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    root_host: String,
    include_subdomains: bool,
    path_prefix: Option<String>,
    include_assets: bool,
    strip_js: bool,
}

impl ScopeFilter {
    /// Creates a filter rooted at `root_host` (lowercase).
    pub fn new(
        root_host: &str,
        include_subdomains: bool,
        path_prefix: Option<String>,
        include_assets: bool,
        strip_js: bool,
    ) -> Self {
        Self {
            root_host: root_host.to_lowercase(),
            include_subdomains,
            path_prefix,
            include_assets,
            strip_js,
        }
    }

    /// True when `host` is the seed domain or an allowed subdomain of it.
    pub fn host_in_scope(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        if host == self.root_host {
            return true;
        }
        self.include_subdomains && host.ends_with(&format!(".{}", self.root_host))
    }

    /// Full admission check for a resolved absolute URL.
    ///
    /// robots.txt is never mirrored regardless of the asset flags.
    pub fn admits(&self, url: &Url, class: ResourceClass) -> bool {
        let host = match url.host_str() {
            Some(h) => h,
            None => return false,
        };
        if !self.host_in_scope(host) {
            return false;
        }

        if let Some(prefix) = &self.path_prefix {
            if !url.path().starts_with(prefix.as_str()) {
                return false;
            }
        }

        if url.path().ends_with("/robots.txt") {
            return false;
        }

        match class {
            ResourceClass::Html => true,
            ResourceClass::Script => !self.strip_js && self.include_assets,
            _ => self.include_assets,
        }
    }
}
