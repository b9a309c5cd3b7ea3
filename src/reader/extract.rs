//! The extraction rules, each a pure function over a string slice so they
//! can be tested in isolation. Tag handling is a best-effort text transform,
//! not a parser: malformed markup may under- or over-strip but never fails.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::reader::Link;

pub const MAX_PARAGRAPHS: usize = 50;
pub const MAX_LINKS: usize = 100;
pub const MAX_DIV_BLOCKS: usize = 30;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"));
static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("valid regex"));
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("valid regex"));
static NOSCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<noscript[^>]*>.*?</noscript>").expect("valid regex"));
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h[1-6][^>]*>(.*?)</h[1-6]>").expect("valid regex"));
static PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p[^>]*>(.*?)</p>").expect("valid regex"));
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a[^>]+href\s*=\s*["']([^"']+)["'][^>]*>(.*?)</a>"#).expect("valid regex")
});
static DIV_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<div[^>]*>(.*?)</div>").expect("valid regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

/// Remove `<script>`, `<style>` and `<noscript>` blocks. Runs once, before
/// any other rule, so noise content is never misclassified as body text.
pub fn strip_noise(html: &str) -> String {
    let cleaned = SCRIPT_RE.replace_all(html, "");
    let cleaned = STYLE_RE.replace_all(&cleaned, "");
    NOSCRIPT_RE.replace_all(&cleaned, "").into_owned()
}

/// Drop anything that looks like a tag.
pub fn strip_tags(fragment: &str) -> String {
    TAG_RE.replace_all(fragment, "").into_owned()
}

fn inner_text(fragment: &str) -> String {
    strip_tags(fragment).trim().to_string()
}

/// First `<title>` element, tags stripped; `"Article"` when absent or empty.
pub fn extract_title(html: &str) -> String {
    TITLE_RE
        .captures(html)
        .map(|caps| inner_text(caps.get(1).map_or("", |m| m.as_str())))
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| "Article".to_string())
}

/// All `<h1>`..`<h6>` bodies longer than 2 characters. Rendering applies a
/// stricter minimum on top of this.
pub fn extract_headings(html: &str) -> Vec<String> {
    HEADING_RE
        .captures_iter(html)
        .map(|caps| inner_text(caps.get(1).map_or("", |m| m.as_str())))
        .filter(|text| text.chars().count() > 2)
        .collect()
}

/// `<p>` bodies longer than 20 characters, first 50 only.
pub fn extract_paragraphs(html: &str) -> Vec<String> {
    PARAGRAPH_RE
        .captures_iter(html)
        .map(|caps| inner_text(caps.get(1).map_or("", |m| m.as_str())))
        .filter(|text| text.chars().count() > 20)
        .take(MAX_PARAGRAPHS)
        .collect()
}

/// `<a href>` pairs with visible text longer than 3 characters, first 100.
/// Root-relative hrefs are resolved against the base URL origin; absolute
/// http(s) hrefs pass through; everything else is dropped so every emitted
/// href is absolute.
pub fn extract_links(html: &str, base_url: &str) -> Vec<Link> {
    let base = Url::parse(base_url).ok();
    LINK_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let href = caps.get(1).map_or("", |m| m.as_str());
            let text = inner_text(caps.get(2).map_or("", |m| m.as_str()));
            if text.chars().count() <= 3 {
                return None;
            }
            let href = resolve_href(href, base.as_ref())?;
            Some(Link { text, href })
        })
        .take(MAX_LINKS)
        .collect()
}

fn resolve_href(href: &str, base: Option<&Url>) -> Option<String> {
    if href.starts_with('/') {
        base?.join(href).ok().map(String::from)
    } else {
        let parsed = Url::parse(href).ok()?;
        matches!(parsed.scheme(), "http" | "https").then(|| href.to_string())
    }
}

/// `<div>` bodies strictly between 30 and 500 characters that do not contain
/// "cookie" or "script" (lowercased), first 30.
pub fn extract_div_blocks(html: &str) -> Vec<String> {
    DIV_RE
        .captures_iter(html)
        .map(|caps| inner_text(caps.get(1).map_or("", |m| m.as_str())))
        .filter(|text| {
            let len = text.chars().count();
            if len <= 30 || len >= 500 {
                return false;
            }
            let lower = text.to_lowercase();
            !lower.contains("cookie") && !lower.contains("script")
        })
        .take(MAX_DIV_BLOCKS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_noise_spans_newlines_and_case() {
        let html = "<SCRIPT type='x'>\nevil()\n</Script>keep<style>a{}</style><noscript>n</noscript>";
        assert_eq!(strip_noise(html), "keep");
    }

    #[test]
    fn test_strip_tags_tolerates_malformed_markup() {
        assert_eq!(strip_tags("<div <p broken text"), "<div <p broken text");
        assert_eq!(strip_tags("a<b>c</b"), "ac</b");
    }

    #[test]
    fn test_title_default_and_stripping() {
        assert_eq!(extract_title("<p>no title</p>"), "Article");
        assert_eq!(extract_title("<title>  </title>"), "Article");
        assert_eq!(extract_title("<title><b>Hi</b> there</title>"), "Hi there");
    }

    #[test]
    fn test_heading_collection_threshold() {
        let html = "<h1>ab</h1><h2>abc</h2><h3>long heading</h3>";
        assert_eq!(extract_headings(html), vec!["abc", "long heading"]);
    }

    #[test]
    fn test_paragraph_boundary_20_21() {
        let exactly_20 = "a".repeat(20);
        let exactly_21 = "b".repeat(21);
        let html = format!("<p>{}</p><p>{}</p>", exactly_20, exactly_21);
        assert_eq!(extract_paragraphs(&html), vec![exactly_21]);
    }

    #[test]
    fn test_paragraph_cap_at_50() {
        let html: String = (0..60)
            .map(|i| format!("<p>paragraph number {i} with enough length</p>"))
            .collect();
        let paragraphs = extract_paragraphs(&html);
        assert_eq!(paragraphs.len(), 50);
        assert!(paragraphs[0].contains("number 0"));
        assert!(paragraphs[49].contains("number 49"));
    }

    #[test]
    fn test_div_boundaries_exclusive() {
        for (len, expected) in [(30, 0), (31, 1), (499, 1), (500, 0)] {
            let html = format!("<div>{}</div>", "x".repeat(len));
            assert_eq!(extract_div_blocks(&html).len(), expected, "len {}", len);
        }
    }

    #[test]
    fn test_div_blocklist() {
        let html = "<div>We use Cookie banners on this site, please accept</div>\
                    <div>This block mentions a SCRIPT somewhere in its text body</div>\
                    <div>A perfectly ordinary block of readable body text</div>";
        let blocks = extract_div_blocks(html);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].starts_with("A perfectly"));
    }

    #[test]
    fn test_div_cap_at_30() {
        let html: String = (0..40)
            .map(|i| format!("<div>miscellaneous text block number {i:03} here</div>"))
            .collect();
        assert_eq!(extract_div_blocks(&html).len(), 30);
    }

    #[test]
    fn test_link_text_threshold() {
        let html = r#"<a href="http://a.test/">abc</a><a href="http://b.test/">abcd</a>"#;
        let links = extract_links(html, "http://x.test/");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].text, "abcd");
    }

    #[test]
    fn test_root_relative_resolution_keeps_port() {
        let html = r#"<a href="/news/story">Story link</a>"#;
        let links = extract_links(html, "http://localhost:8080/index.html");
        assert_eq!(links[0].href, "http://localhost:8080/news/story");
    }

    #[test]
    fn test_non_absolute_hrefs_dropped() {
        let html = r#"<a href="page.html">relative page</a><a href="mailto:a@b.c">mail link</a>
                      <a href="https://x.test/ok">absolute link</a>"#;
        let links = extract_links(html, "http://x.test/");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].href, "https://x.test/ok");
    }

    #[test]
    fn test_link_cap_at_100() {
        let html: String = (0..120)
            .map(|i| format!(r#"<a href="http://x.test/{i}">link number {i}</a>"#))
            .collect();
        assert_eq!(extract_links(&html, "http://x.test/").len(), 100);
    }

    #[test]
    fn test_unresolvable_base_keeps_absolute_links_only() {
        let html = r#"<a href="/rel">relative link</a><a href="http://y.test/">absolute one</a>"#;
        let links = extract_links(html, "not a url");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].href, "http://y.test/");
    }
}
