use std::path::Path;
use url::Url;

/// Maps an archived URL to its relative path under the output root.
///
/// The URL's path hierarchy is preserved; a path that denotes a directory
/// (empty or trailing slash) becomes `index.html` inside it. Query strings
/// and fragments never reach the filesystem.
pub fn local_rel_path(url: &Url) -> String {
    let mut path = url.path().to_string();

    if path.is_empty() || path.ends_with('/') {
        path.push_str("index.html");
    }

    path.trim_start_matches('/').to_string()
}

/// Computes the href that links one local file to another.
///
/// Both arguments are output-root-relative paths as produced by
/// [`local_rel_path`]. The result uses forward slashes regardless of
/// platform, since it is written into markup.
pub fn relative_href(from_local: &str, to_local: &str) -> String {
    let from_dir = Path::new(from_local).parent().unwrap_or(Path::new(""));

    let rel = pathdiff::diff_paths(Path::new(to_local), from_dir)
        .unwrap_or_else(|| Path::new(to_local).to_path_buf());

    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(url: &str) -> String {
        local_rel_path(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_root_becomes_index() {
        assert_eq!(local("https://example.org/"), "index.html");
    }

    #[test]
    fn test_directory_becomes_index() {
        assert_eq!(local("https://example.org/docs/"), "docs/index.html");
    }

    #[test]
    fn test_file_path_preserved() {
        assert_eq!(
            local("https://example.org/assets/app.css"),
            "assets/app.css"
        );
    }

    #[test]
    fn test_extensionless_path_preserved() {
        assert_eq!(local("https://example.org/about"), "about");
    }

    #[test]
    fn test_query_never_reaches_filesystem() {
        assert_eq!(local("https://example.org/page?x=1"), "page");
    }

    #[test]
    fn test_relative_href_same_dir() {
        assert_eq!(relative_href("index.html", "style.css"), "style.css");
    }

    #[test]
    fn test_relative_href_into_subdir() {
        assert_eq!(
            relative_href("index.html", "assets/app.css"),
            "assets/app.css"
        );
    }

    #[test]
    fn test_relative_href_up_one_level() {
        assert_eq!(
            relative_href("docs/page.html", "style.css"),
            "../style.css"
        );
    }

    #[test]
    fn test_relative_href_deep_page() {
        assert_eq!(
            relative_href("a/b/c.html", "assets/stylesheets/application.css"),
            "../../assets/stylesheets/application.css"
        );
    }

    #[test]
    fn test_relative_href_sibling_dirs() {
        assert_eq!(
            relative_href("docs/page.html", "img/logo.png"),
            "../img/logo.png"
        );
    }
}
