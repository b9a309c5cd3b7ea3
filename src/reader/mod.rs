//! Reader mode: heuristic transformation of raw HTML into a simplified
//! article view.
//!
//! The pipeline is fixed: strip noise, then scan headings, paragraphs,
//! links, and div text in that order. [`extract`] is a pure function of its
//! inputs; it never fails, degrading to a title-and-source-only document on
//! binary or non-HTML bodies.

pub mod extract;

pub use extract::{
    extract_div_blocks, extract_headings, extract_links, extract_paragraphs, extract_title,
    strip_noise, strip_tags, MAX_DIV_BLOCKS, MAX_LINKS, MAX_PARAGRAPHS,
};

use html_escape::{encode_double_quoted_attribute, encode_safe};

/// Display threshold for headings; collection uses the weaker > 2 filter.
pub const HEADING_DISPLAY_MIN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub text: String,
    /// Always absolute.
    pub href: String,
}

/// Normalized output of the extraction pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleDocument {
    pub title: String,
    pub source_url: String,
    pub headings: Vec<String>,
    pub paragraphs: Vec<String>,
    pub misc_blocks: Vec<String>,
    pub links: Vec<Link>,
}

/// Run the full pipeline over a raw HTML body.
pub fn extract(html: &str, base_url: &str) -> ArticleDocument {
    let cleaned = strip_noise(html);
    ArticleDocument {
        title: extract_title(html),
        source_url: base_url.to_string(),
        headings: extract_headings(&cleaned),
        paragraphs: extract_paragraphs(&cleaned),
        misc_blocks: extract_div_blocks(&cleaned),
        links: extract_links(&cleaned, base_url),
    }
}

/// Assemble the article into display HTML. Every text node is escaped;
/// sections are emitted only when non-empty.
pub fn render_article(doc: &ArticleDocument) -> String {
    let mut out = String::new();
    out.push_str("<article>\n");
    out.push_str(&format!("<h1>{}</h1>\n", encode_safe(&doc.title)));
    out.push_str(&format!(
        "<p class=\"source\">Source: <a href=\"{}\">{}</a></p>\n",
        encode_double_quoted_attribute(&doc.source_url),
        encode_safe(&doc.source_url)
    ));
    out.push_str("<hr>\n");

    if !doc.headings.is_empty() {
        out.push_str("<section class=\"headings\">\n<h2>Headings</h2>\n");
        for heading in &doc.headings {
            if heading.chars().count() > HEADING_DISPLAY_MIN {
                out.push_str(&format!("<h3>{}</h3>\n", encode_safe(heading)));
            }
        }
        out.push_str("</section>\n");
    }

    if !doc.paragraphs.is_empty() {
        out.push_str("<section class=\"paragraphs\">\n<h2>Content</h2>\n");
        for paragraph in &doc.paragraphs {
            out.push_str(&format!("<p>{}</p>\n", encode_safe(paragraph)));
        }
        out.push_str("</section>\n");
    }

    if !doc.misc_blocks.is_empty() {
        out.push_str("<section class=\"misc\">\n<h2>Other text</h2>\n");
        for block in &doc.misc_blocks {
            out.push_str(&format!("<p>{}</p>\n", encode_safe(block)));
        }
        out.push_str("</section>\n");
    }

    if !doc.links.is_empty() {
        out.push_str(&format!(
            "<section class=\"links\">\n<h2>Links ({})</h2>\n<ul>\n",
            doc.links.len()
        ));
        for link in &doc.links {
            out.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                encode_double_quoted_attribute(&link.href),
                encode_safe(&link.text)
            ));
        }
        out.push_str("</ul>\n</section>\n");
    }

    out.push_str("</article>\n");
    out
}

/// Structured failure document rendered whenever a load fails; never a raw
/// error dump.
pub fn error_page(url: &str, message: &str) -> String {
    format!(
        "<article class=\"error\">\n\
         <h1>Cannot Load Page</h1>\n\
         <p class=\"url\">{}</p>\n\
         <p class=\"message\">{}</p>\n\
         <ul class=\"suggestions\">\n\
         <li>Check your internet connection</li>\n\
         <li>Verify the URL is correct</li>\n\
         <li>Try refreshing the page</li>\n\
         <li>The website might be down temporarily</li>\n\
         </ul>\n\
         </article>\n",
        encode_safe(url),
        encode_safe(message)
    )
}

/// Naive tag frequency counts over a raw body, case-insensitive prefix
/// matches on `<p`, `<div`, `<span`, `<img`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TagStats {
    pub p_tags: usize,
    pub div_tags: usize,
    pub span_tags: usize,
    pub img_tags: usize,
}

pub fn tag_stats(html: &str) -> TagStats {
    let lower = html.to_lowercase();
    TagStats {
        p_tags: count_tag(&lower, "<p"),
        div_tags: count_tag(&lower, "<div"),
        span_tags: count_tag(&lower, "<span"),
        img_tags: count_tag(&lower, "<img"),
    }
}

fn count_tag(lower_html: &str, tag: &str) -> usize {
    lower_html.matches(tag).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use html_escape::decode_html_entities;

    #[test]
    fn test_extract_strips_noise_before_scanning() {
        let html = "<title>Hi</title><script>evil()</script>\
                    <p>This paragraph is long enough to qualify.</p>";
        let doc = extract(html, "http://x.test/");
        assert_eq!(doc.title, "Hi");
        assert_eq!(
            doc.paragraphs,
            vec!["This paragraph is long enough to qualify."]
        );
        assert!(doc.headings.is_empty());
        assert!(doc.links.is_empty());
    }

    #[test]
    fn test_extract_is_idempotent() {
        let html = r#"<title>T</title><h1>Big headline</h1>
            <p>A paragraph with more than twenty characters in it.</p>
            <a href="/a">some link</a><div>a div block that is over thirty chars</div>"#;
        let first = extract(html, "http://x.test/");
        let second = extract(html, "http://x.test/");
        assert_eq!(first, second);
        assert_eq!(render_article(&first), render_article(&second));
    }

    #[test]
    fn test_non_html_body_degrades_gracefully() {
        let doc = extract("{\"json\": true}", "http://x.test/data");
        assert_eq!(doc.title, "Article");
        assert_eq!(doc.source_url, "http://x.test/data");
        assert!(doc.headings.is_empty());
        assert!(doc.paragraphs.is_empty());
        assert!(doc.misc_blocks.is_empty());
        assert!(doc.links.is_empty());
    }

    #[test]
    fn test_render_escapes_text_nodes() {
        let doc = extract(
            "<title>a & b</title><p>Tom <b>&</b> Jerry say 1 < 2 every day</p>",
            "http://x.test/",
        );
        let html = render_article(&doc);
        assert!(html.contains("a &amp; b"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_escape_round_trip() {
        let original = "plain ascii text without markup";
        let encoded = html_escape::encode_safe(original).into_owned();
        assert_eq!(decode_html_entities(&encoded), original);
    }

    #[test]
    fn test_heading_display_threshold() {
        let doc = extract(
            "<h1>abcd</h1><h2>long enough heading</h2>\
             <p>padding paragraph so the document is not empty</p>",
            "http://x.test/",
        );
        // Both collected, only the longer one rendered.
        assert_eq!(doc.headings.len(), 2);
        let html = render_article(&doc);
        assert!(!html.contains("<h3>abcd</h3>"));
        assert!(html.contains("<h3>long enough heading</h3>"));
    }

    #[test]
    fn test_render_skips_empty_sections() {
        let doc = extract("<title>Only title</title>", "http://x.test/");
        let html = render_article(&doc);
        assert!(!html.contains("<section"));
        assert!(html.contains("Source:"));
    }

    #[test]
    fn test_tag_stats_counts() {
        let html = "<p>a</p><P>b</P><div><span><img src='x'>";
        let stats = tag_stats(html);
        assert_eq!(stats.p_tags, 2);
        assert_eq!(stats.div_tags, 1);
        assert_eq!(stats.span_tags, 1);
        assert_eq!(stats.img_tags, 1);
    }

    #[test]
    fn test_error_page_escapes_inputs() {
        let html = error_page("http://x.test/<script>", "boom & bust");
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("boom &amp; bust"));
        assert!(html.contains("Cannot Load Page"));
    }
}
