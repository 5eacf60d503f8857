use scraper::Html;

const IGNORED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Visible text of an HTML page, one non-empty chunk per line.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut text = String::new();

    for node in document.root_element().descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map_or(false, |el| IGNORED_ELEMENTS.contains(&el.name()))
        });
        if !hidden {
            text.push_str(fragment);
            text.push('\n');
        }
    }

    text.lines()
        .map(str::trim)
        .flat_map(|line| line.split("  "))
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
