use crate::parsers::html;

#[test]
fn test_extract_links() {
    let content = r#"<html><body>
        <a href="/a">A</a>
        <p>no link here</p>
        <a href="https://example.com/b">B</a>
    </body></html>"#;
    let links = html::extract_links(content);
    assert_eq!(links, vec!["/a", "https://example.com/b"]);
}

#[test]
fn test_links_are_deduplicated_and_sorted() {
    let content = r#"<html><body>
        <a href="/z">Z</a>
        <a href="/a">A first</a>
        <a href="/a">A again</a>
    </body></html>"#;
    let links = html::extract_links(content);
    assert_eq!(links, vec!["/a", "/z"]);
}

#[test]
fn test_anchors_without_href_are_skipped() {
    let content = r#"<html><body><a name="top">anchor</a><a href="/only">link</a></body></html>"#;
    let links = html::extract_links(content);
    assert_eq!(links, vec!["/only"]);
}

#[test]
fn test_empty_document() {
    assert!(html::extract_links("").is_empty());
    assert!(html::extract_links("<html><body></body></html>").is_empty());
}

#[test]
fn test_malformed_markup_still_yields_links() {
    // html5ever recovers from unclosed tags the way browsers do
    let content = r#"<html><body><div><a href="/kept">kept<p></div>"#;
    let links = html::extract_links(content);
    assert_eq!(links, vec!["/kept"]);
}
