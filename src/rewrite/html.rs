//! Streaming HTML rewriting
//!
//! One `lol_html` pass per page handles everything: link-bearing attributes
//! are rewritten to local relative paths and collected for discovery, the
//! archive's injected toolbar is dropped, a provenance banner is prepended
//! to the body, and script stripping removes both `<script>` elements and
//! inline event-handler attributes.

use crate::frontier::{ResourceClass, ScopeFilter};
use crate::rewrite::{css::rewrite_css_text, DiscoveredRef, RewriteOutput};
use crate::url::{local_rel_path, relative_href, resolve_reference};
use lol_html::html_content::{ContentType, Element};
use lol_html::{element, HtmlRewriter, Settings};
use std::cell::RefCell;
use url::Url;

type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// The provenance banner injected at the top of every mirrored page.
pub fn banner_html(domain: &str, date_ymd: &str) -> String {
    format!(
        r#"<div style="background:#222;color:#fff;padding:8px 16px;font-size:1rem;text-align:center;z-index:9999;position:relative;box-shadow:0 2px 6px #0003;">Snapshot <b>{}</b> from <a href="https://archive.org/web/" style="color:#ffd700;text-decoration:underline;">Archive.org</a> (Date: <b>{}</b>)</div>"#,
        domain, date_ymd
    )
}

/// Rewrites one HTML document, returning the new bytes and every same-scope
/// reference encountered.
pub fn rewrite_html(
    html: &[u8],
    page_url: &Url,
    scope: &ScopeFilter,
    strip_js: bool,
    banner: &str,
) -> Result<RewriteOutput, String> {
    let page_local = local_rel_path(page_url);
    let discovered = RefCell::new(Vec::new());
    let mut output = Vec::with_capacity(html.len() + banner.len());

    let mut handlers = vec![
        // The archive's replay toolbar must not survive into the mirror.
        element!("#wm-ipp", |el| {
            el.remove();
            Ok(())
        }),
        element!("body", |el| {
            el.prepend(banner, ContentType::Html);
            Ok(())
        }),
        element!("a[href]", |el| {
            rewrite_ref(el, "href", None, page_url, &page_local, scope, &discovered)
        }),
        element!("link[href]", |el| {
            let rel = el.get_attribute("rel").unwrap_or_default().to_lowercase();
            let class = if rel.contains("stylesheet") {
                ResourceClass::Stylesheet
            } else if rel.contains("icon") {
                ResourceClass::Image
            } else {
                return Ok(());
            };
            rewrite_ref(el, "href", Some(class), page_url, &page_local, scope, &discovered)
        }),
        element!("script", |el| {
            if strip_js {
                el.remove();
                return Ok(());
            }
            if el.has_attribute("src") {
                rewrite_ref(
                    el,
                    "src",
                    Some(ResourceClass::Script),
                    page_url,
                    &page_local,
                    scope,
                    &discovered,
                )?;
            }
            Ok(())
        }),
        element!("img[src]", |el| {
            rewrite_ref(
                el,
                "src",
                Some(ResourceClass::Image),
                page_url,
                &page_local,
                scope,
                &discovered,
            )?;
            rewrite_srcset(el, page_url, &page_local, scope, &discovered)
        }),
        element!("form[action]", |el| {
            rewrite_ref(el, "action", None, page_url, &page_local, scope, &discovered)
        }),
        element!("[style]", |el| {
            if let Some(style) = el.get_attribute("style") {
                let (rewritten, found) =
                    rewrite_css_text(&style, page_url, &page_local, scope);
                if rewritten != style {
                    el.set_attribute("style", &rewritten)?;
                }
                discovered.borrow_mut().extend(found);
            }
            Ok(())
        }),
    ];

    if strip_js {
        handlers.push(element!("*", |el| {
            let on_attrs: Vec<String> = el
                .attributes()
                .iter()
                .map(|a| a.name())
                .filter(|name| name.starts_with("on"))
                .collect();
            for name in on_attrs {
                el.remove_attribute(&name);
            }
            Ok(())
        }));
    }

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: handlers,
            ..Settings::default()
        },
        |chunk: &[u8]| output.extend_from_slice(chunk),
    );

    rewriter.write(html).map_err(|e| e.to_string())?;
    rewriter.end().map_err(|e| e.to_string())?;

    Ok(RewriteOutput {
        bytes: output,
        discovered: discovered.into_inner(),
    })
}

/// Rewrites a single link-bearing attribute and records the discovery.
///
/// Out-of-scope references are left at their absolute original target; the
/// mirror does not rewrite links it does not own.
fn rewrite_ref(
    el: &mut Element,
    attr: &str,
    class_hint: Option<ResourceClass>,
    page_url: &Url,
    page_local: &str,
    scope: &ScopeFilter,
    discovered: &RefCell<Vec<DiscoveredRef>>,
) -> Result<(), HandlerError> {
    let value = match el.get_attribute(attr) {
        Some(v) => v,
        None => return Ok(()),
    };
    let resolved = match resolve_reference(&value, page_url) {
        Some(url) => url,
        None => return Ok(()),
    };

    let class = class_hint.unwrap_or_else(|| ResourceClass::from_url_path(resolved.path()));
    if !scope.admits(&resolved, class) {
        return Ok(());
    }

    let rel = relative_href(page_local, &local_rel_path(&resolved));
    el.set_attribute(attr, &rel)?;
    discovered.borrow_mut().push(DiscoveredRef {
        url: resolved,
        class,
    });
    Ok(())
}

/// Rewrites each candidate of an `img` srcset, preserving descriptors.
fn rewrite_srcset(
    el: &mut Element,
    page_url: &Url,
    page_local: &str,
    scope: &ScopeFilter,
    discovered: &RefCell<Vec<DiscoveredRef>>,
) -> Result<(), HandlerError> {
    let srcset = match el.get_attribute("srcset") {
        Some(v) => v,
        None => return Ok(()),
    };

    let mut changed = false;
    let candidates: Vec<String> = srcset
        .split(',')
        .map(|candidate| {
            let candidate = candidate.trim();
            let mut parts = candidate.splitn(2, char::is_whitespace);
            let src = parts.next().unwrap_or_default();
            let descriptor = parts.next().unwrap_or_default().trim();

            let resolved = match resolve_reference(src, page_url) {
                Some(url) => url,
                None => return candidate.to_string(),
            };
            if !scope.admits(&resolved, ResourceClass::Image) {
                return candidate.to_string();
            }

            let rel = relative_href(page_local, &local_rel_path(&resolved));
            discovered.borrow_mut().push(DiscoveredRef {
                url: resolved,
                class: ResourceClass::Image,
            });
            changed = true;
            if descriptor.is_empty() {
                rel
            } else {
                format!("{} {}", rel, descriptor)
            }
        })
        .collect();

    if changed {
        el.set_attribute("srcset", &candidates.join(", "))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> ScopeFilter {
        ScopeFilter::new("example.org", true, None, true, false)
    }

    fn page() -> Url {
        Url::parse("https://example.org/docs/page.html").unwrap()
    }

    fn run(html: &str, strip_js: bool) -> (String, Vec<DiscoveredRef>) {
        let output = rewrite_html(
            html.as_bytes(),
            &page(),
            &scope(),
            strip_js,
            &banner_html("example.org", "2022-12-01"),
        )
        .unwrap();
        (String::from_utf8(output.bytes).unwrap(), output.discovered)
    }

    #[test]
    fn test_in_scope_anchor_rewritten_and_discovered() {
        let (out, discovered) = run(r#"<body><a href="/about">About</a></body>"#, false);

        assert!(out.contains(r#"href="../about""#));
        assert_eq!(discovered.len(), 1);
        assert_eq!(discovered[0].url.as_str(), "https://example.org/about");
        assert_eq!(discovered[0].class, ResourceClass::Html);
    }

    #[test]
    fn test_out_of_scope_anchor_untouched() {
        let (out, discovered) = run(r#"<body><a href="https://other.com/x">X</a></body>"#, false);

        assert!(out.contains(r#"href="https://other.com/x""#));
        assert!(discovered.is_empty());
    }

    #[test]
    fn test_stylesheet_link_rewritten() {
        let (out, discovered) = run(
            r#"<head><link rel="stylesheet" href="/assets/app.css"></head><body></body>"#,
            false,
        );

        assert!(out.contains(r#"href="../assets/app.css""#));
        assert_eq!(discovered.len(), 1);
        assert_eq!(discovered[0].class, ResourceClass::Stylesheet);
    }

    #[test]
    fn test_canonical_link_untouched() {
        let (out, discovered) = run(
            r#"<head><link rel="canonical" href="https://example.org/docs/page.html"></head><body></body>"#,
            false,
        );

        assert!(out.contains(r#"href="https://example.org/docs/page.html""#));
        assert!(discovered.is_empty());
    }

    #[test]
    fn test_img_src_and_srcset() {
        let (out, discovered) = run(
            r#"<body><img src="/img/a.png" srcset="/img/a.png 1x, /img/a@2x.png 2x"></body>"#,
            false,
        );

        assert!(out.contains(r#"src="../img/a.png""#));
        assert!(out.contains(r#"srcset="../img/a.png 1x, ../img/a@2x.png 2x""#));
        assert_eq!(discovered.len(), 3);
    }

    #[test]
    fn test_script_src_rewritten_when_not_stripping() {
        let (out, discovered) = run(r#"<body><script src="/js/app.js"></script></body>"#, false);

        assert!(out.contains(r#"src="../js/app.js""#));
        assert_eq!(discovered.len(), 1);
        assert_eq!(discovered[0].class, ResourceClass::Script);
    }

    #[test]
    fn test_strip_js_removes_scripts_and_handlers() {
        let (out, discovered) = run(
            r#"<body onload="init()"><script src="/js/app.js"></script><script>inline()</script><p onclick="go()">hi</p></body>"#,
            true,
        );

        assert!(!out.contains("<script"));
        assert!(!out.contains("onload"));
        assert!(!out.contains("onclick"));
        assert!(out.contains("<p"));
        assert!(discovered.is_empty());
    }

    #[test]
    fn test_banner_prepended_to_body() {
        let (out, _) = run(r#"<body><p>content</p></body>"#, false);

        let banner_pos = out.find("Snapshot <b>example.org</b>").unwrap();
        let content_pos = out.find("<p>content</p>").unwrap();
        assert!(banner_pos < content_pos);
        assert!(out.contains("2022-12-01"));
    }

    #[test]
    fn test_wayback_toolbar_removed() {
        let (out, _) = run(
            r#"<body><div id="wm-ipp">toolbar</div><p>real</p></body>"#,
            false,
        );

        assert!(!out.contains("toolbar"));
        assert!(out.contains("<p>real</p>"));
    }

    #[test]
    fn test_inline_style_url_rewritten() {
        let (out, discovered) = run(
            r#"<body><div style="background: url(/img/bg.png)">x</div></body>"#,
            false,
        );

        assert!(out.contains("url(../img/bg.png)"));
        assert_eq!(discovered.len(), 1);
        assert_eq!(discovered[0].class, ResourceClass::Image);
    }

    #[test]
    fn test_form_action_rewritten() {
        let (out, discovered) = run(r#"<body><form action="/search"></form></body>"#, false);

        assert!(out.contains(r#"action="../search""#));
        assert_eq!(discovered.len(), 1);
    }

    #[test]
    fn test_anchor_to_asset_classified_by_extension() {
        let (_, discovered) = run(r#"<body><a href="/files/report.pdf">dl</a></body>"#, false);

        assert_eq!(discovered.len(), 1);
        assert_eq!(discovered[0].class, ResourceClass::Document);
    }

    #[test]
    fn test_pseudo_scheme_links_untouched() {
        let (out, discovered) = run(
            r#"<body><a href="mailto:x@example.org">mail</a><a href="javascript:void(0)">js</a></body>"#,
            false,
        );

        assert!(out.contains("mailto:x@example.org"));
        assert!(discovered.is_empty());
    }
}
