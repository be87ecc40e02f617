use scraper::{Html, Selector};

/// Extracts the href values of a document's anchor elements
///
/// The returned list is deduplicated and sorted, so pages that repeat a
/// link contribute one candidate and extraction order is stable.
pub fn extract_links(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);

    let link_selector = Selector::parse("a[href]").expect("anchor selector should be valid");
    let mut links: Vec<String> = doc
        .select(&link_selector)
        .filter_map(|e| e.value().attr("href"))
        .map(|s| s.to_string())
        .collect();

    links.sort();
    links.dedup();

    ::log::debug!("HTML parser found {} links", links.len());
    links
}
