//! Date-grouped content listing.
//!
//! Read-only against the store: renders every metadata record as a
//! reverse-chronological list of links, grouped by creation day. Served as
//! the `/all` page by the dev server.

use crate::{
    compile::html_path,
    layout::Layout,
    meta::{Day, Metadata},
    store::{MetadataStore, StoreError},
};
use std::path::Path;

/// Shown when the store has no records to list.
const EMPTY_LISTING: &str = "<p>nothing to see here.</p>";

/// Render the full listing page.
pub fn render_listing(
    store: &dyn MetadataStore,
    layout: &Layout,
    site_name: &str,
) -> Result<String, StoreError> {
    let records = store.read_all_metadata()?;
    Ok(layout.render(&listing_fragment(&records), site_name))
}

/// Build the date-grouped fragment.
///
/// Records must already be sorted newest first (the store contract). The
/// root index document is skipped so the listing never links to itself.
fn listing_fragment(records: &[Metadata]) -> String {
    let mut groups: Vec<(Day, Vec<&Metadata>)> = Vec::new();
    for m in records {
        if is_root_index(&m.filepath) {
            continue;
        }
        if let Some((day, items)) = groups.last_mut() {
            if *day == m.created {
                items.push(m);
                continue;
            }
        }
        groups.push((m.created, vec![m]));
    }

    if groups.is_empty() {
        return EMPTY_LISTING.to_string();
    }

    let mut out = String::new();
    for (day, items) in &groups {
        out.push_str(&format!("<h4>{day}</h4>\n<ul>\n"));
        for m in items {
            out.push_str(&format!(
                "  <li><a href=\"/{}\">{}</a></li>\n",
                href_for(&m.filepath),
                m.title
            ));
        }
        out.push_str("</ul>\n");
    }
    out
}

fn is_root_index(filepath: &str) -> bool {
    html_path(Path::new(filepath)) == Path::new("index.html")
}

/// Forward-slash URL path of a record's output document.
fn href_for(filepath: &str) -> String {
    html_path(Path::new(filepath))
        .to_string_lossy()
        .replace('\\', "/")
}

// ============================================================================
// Tests
// ============================================================================
