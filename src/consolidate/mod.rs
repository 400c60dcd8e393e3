//! Stylesheet consolidation post-pass
//!
//! Runs once, strictly after the frontier drains: the first successfully
//! written stylesheet (discovery order) becomes the canonical stylesheet,
//! and every written HTML page is re-pointed at it with a relative prefix
//! computed from the page's own depth in the output tree. Pages that came
//! back from the archive with no stylesheet link at all get one injected.
//! Files are only rewritten when their bytes change, so re-running over an
//! already-consolidated tree is a no-op.

use crate::frontier::{ResourceClass, WrittenUnit};
use crate::url::relative_href;
use crate::Result;
use lol_html::html_content::ContentType;
use lol_html::{element, HtmlRewriter, Settings};
use scraper::{Html, Selector};
use std::fs;
use std::path::Path;

/// Canonical local path every page's stylesheet reference points at.
pub const CANONICAL_STYLESHEET: &str = "assets/stylesheets/application.css";

/// What the consolidation pass did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ConsolidationReport {
    /// Whether a canonical stylesheet was produced.
    pub canonical_written: bool,

    /// Number of HTML files whose bytes changed.
    pub pages_updated: usize,
}

/// Consolidates stylesheets across the written output tree.
pub fn consolidate(output_root: &Path, written: &[WrittenUnit]) -> Result<ConsolidationReport> {
    let mut report = ConsolidationReport::default();

    let first_css = written
        .iter()
        .filter(|u| u.class == ResourceClass::Stylesheet)
        .min_by_key(|u| u.sequence);

    let source = match first_css {
        Some(unit) => unit,
        None => {
            tracing::warn!("No stylesheet was mirrored; pages may be unstyled");
            return Ok(report);
        }
    };

    let canonical_abs = output_root.join(CANONICAL_STYLESHEET);
    if let Some(parent) = canonical_abs.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(output_root.join(&source.local_path), &canonical_abs)?;
    report.canonical_written = true;
    tracing::info!(
        "Canonical stylesheet: {} -> {}",
        source.local_path,
        CANONICAL_STYLESHEET
    );

    for unit in written.iter().filter(|u| u.class == ResourceClass::Html) {
        let path = output_root.join(&unit.local_path);
        let original = fs::read(&path)?;

        let updated = repoint_stylesheets(&original, &unit.local_path)?;
        if updated != original {
            fs::write(&path, &updated)?;
            report.pages_updated += 1;
        }
    }

    tracing::info!(
        "Consolidation updated {} page(s)",
        report.pages_updated
    );
    Ok(report)
}

/// Rewrites one page's stylesheet references to the canonical path,
/// injecting a link into `<head>` when the page has none.
fn repoint_stylesheets(html: &[u8], page_local: &str) -> Result<Vec<u8>> {
    let href = relative_href(page_local, CANONICAL_STYLESHEET);
    let has_link = has_stylesheet_link(html);

    let mut output = Vec::with_capacity(html.len());
    let handlers = if has_link {
        vec![element!("link[href]", |el| {
            let rel = el.get_attribute("rel").unwrap_or_default().to_lowercase();
            if rel.contains("stylesheet") {
                el.set_attribute("href", &href)?;
            }
            Ok(())
        })]
    } else {
        vec![element!("head", |el| {
            el.append(
                &format!(
                    r#"<link rel="stylesheet" type="text/css" href="{}">"#,
                    href
                ),
                ContentType::Html,
            );
            Ok(())
        })]
    };

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: handlers,
            ..Settings::default()
        },
        |chunk: &[u8]| output.extend_from_slice(chunk),
    );

    rewriter
        .write(html)
        .and_then(|_| rewriter.end())
        .map_err(|e| crate::MirrorError::Rewrite {
            url: page_local.to_string(),
            message: e.to_string(),
        })?;

    Ok(output)
}

/// Read-only check for an existing stylesheet link.
fn has_stylesheet_link(html: &[u8]) -> bool {
    let document = Html::parse_document(&String::from_utf8_lossy(html));
    let selector = match Selector::parse("link[rel]") {
        Ok(s) => s,
        Err(_) => return false,
    };
    document.select(&selector).any(|el| {
        el.value()
            .attr("rel")
            .map(|rel| rel.to_lowercase().contains("stylesheet"))
            .unwrap_or(false)
    })
}
