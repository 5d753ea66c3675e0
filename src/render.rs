use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::publisher::BROWSE_ROUTE;
use crate::types::DirectoryListing;

const STYLE: &str = r#"
body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; background-color: #121212; color: #fff; margin: 0; padding: 20px; line-height: 1.6; }
.container { max-width: 800px; margin: 0 auto; background-color: #1e1e1e; padding: 30px; border-radius: 8px; }
h1 { text-align: center; color: #4CAF50; }
ul { list-style-type: none; padding: 0; }
li { margin-bottom: 15px; padding: 10px; background-color: #2c2c2c; border-radius: 4px; }
li:hover { background-color: #363636; }
.number { color: #4CAF50; font-weight: bold; margin-right: 10px; }
a { color: #4CAF50; text-decoration: none; }
a:hover { color: #45a049; text-decoration: underline; }
.button-container { display: flex; flex-wrap: wrap; margin-top: 30px; }
.button { background-color: #4CAF50; color: #fff; border: none; padding: 12px 20px; margin: 5px; cursor: pointer; border-radius: 4px; flex: 1; }
#progress { display: none; text-align: center; margin-top: 20px; }
"#;

const SCRIPT: &str = r#"
function fetchLinks(type) {
    const path = document.body.dataset.path;
    document.getElementById('progress').style.display = 'block';
    return fetch('/get_links?path=' + encodeURIComponent(path))
        .then(response => response.json())
        .then(data => data[type].join('\n'))
        .finally(() => { document.getElementById('progress').style.display = 'none'; });
}

function copyLinks(type) {
    fetchLinks(type)
        .then(links => navigator.clipboard.writeText(links))
        .then(() => alert('Links copied to clipboard!'))
        .catch(err => { console.error('Error copying links: ', err); alert('Failed to copy links.'); });
}

function downloadLinks(type) {
    fetchLinks(type).then(links => {
        const blob = new Blob([links], { type: 'text/plain' });
        const a = document.createElement('a');
        a.href = URL.createObjectURL(blob);
        a.download = `${type}_links.txt`;
        a.click();
    });
}
"#;

/// `/browse/` href for a relative path, segments percent-encoded
fn browse_href(relative_path: &str) -> String {
    let encoded: Vec<_> = relative_path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(urlencoding::encode)
        .collect();
    format!("{}{}", BROWSE_ROUTE, encoded.join("/"))
}

fn parent_of(path: &str) -> Option<&str> {
    if path.is_empty() {
        return None;
    }
    Some(path.rsplit_once('/').map_or("", |(parent, _)| parent))
}

/// Render the browsing page for a listing
pub fn listing_page(listing: &DirectoryListing) -> Markup {
    let title = if listing.path.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", listing.path)
    };

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Index of " (title) }
                style { (PreEscaped(STYLE)) }
            }
            body data-path=(listing.path) {
                div.container {
                    h1 { "Index of " (title) }
                    ul {
                        @if let Some(parent) = parent_of(&listing.path) {
                            li { a href=(browse_href(parent)) { ".." } }
                        }
                        @for (i, entry) in listing.entries.iter().enumerate() {
                            li {
                                span.number { (i + 1) "." }
                                @if entry.is_dir() {
                                    a href=(browse_href(&entry.relative_path)) { (entry.name) "/" }
                                } @else {
                                    a href=(browse_href(&entry.relative_path)) { (entry.name) }
                                    @if let Some(size) = &entry.size {
                                        " (" (size) ")"
                                    }
                                }
                            }
                        }
                    }
                    div.button-container {
                        button.button onclick="copyLinks('direct')" { "Copy Direct Links" }
                        button.button onclick="downloadLinks('direct')" { "Download Direct Links" }
                        button.button onclick="copyLinks('short')" { "Copy Short Links" }
                        button.button onclick="downloadLinks('short')" { "Download Short Links" }
                    }
                    div #progress { p { "Processing links... Please wait." } }
                }
                script { (PreEscaped(SCRIPT)) }
            }
        }
    }
}
