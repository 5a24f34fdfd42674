use std::collections::BTreeSet;

use crate::error::PageRangeError;

/// Parse a page selection such as `"1-5, 8, 11-20"`.
///
/// Returns zero-based page indices, sorted and deduplicated. Pages outside
/// `1..=page_count` and unparsable parts are ignored.
pub fn parse_page_range(input: &str, page_count: usize) -> Vec<usize> {
    let mut pages = BTreeSet::new();

    for part in input.split(',') {
        let part = part.trim();
        if part.contains('-') {
            let bounds: Vec<&str> = part.split('-').collect();
            if bounds.len() != 2 {
                continue;
            }
            let (Some(start), Some(end)) = (parse_bound(bounds[0]), parse_bound(bounds[1]))
            else {
                continue;
            };
            if start > end {
                continue;
            }
            // Clamp so huge bounds don't iterate past the document
            let first = start.max(1);
            let last = end.min(page_count);
            pages.extend((first..=last).map(|p| p - 1));
        } else if let Some(page) = parse_bound(part) {
            if (1..=page_count).contains(&page) {
                pages.insert(page - 1);
            }
        }
    }

    pages.into_iter().collect()
}

/// Like [`parse_page_range`], but an empty selection is an error
pub fn select_pages(input: &str, page_count: usize) -> Result<Vec<usize>, PageRangeError> {
    if page_count == 0 {
        return Err(PageRangeError::NoPages);
    }
    let pages = parse_page_range(input, page_count);
    if pages.is_empty() {
        return Err(PageRangeError::Empty);
    }
    Ok(pages)
}

/// An empty bound counts as zero, so `"-3"` selects pages 1 through 3
fn parse_bound(s: &str) -> Option<usize> {
    let s = s.trim();
    if s.is_empty() {
        return Some(0);
    }
    s.parse().ok()
}

fn base_name(file_name: &str) -> String {
    file_name.replacen(".pdf", "", 1)
}

/// Name of the single document holding a range extraction
pub fn extracted_file_name(file_name: &str) -> String {
    format!("{}_extracted.pdf", base_name(file_name))
}

/// Name of the one-page document for zero-based `index`
pub fn page_file_name(file_name: &str, index: usize) -> String {
    format!("{}_page_{}.pdf", base_name(file_name), index + 1)
}

/// Name of the archive holding every page as its own document
pub fn split_archive_name(file_name: &str) -> String {
    format!("{}_split.zip", base_name(file_name))
}

/// One-page document names for a selection, in page order
pub fn split_file_names(file_name: &str, pages: &[usize]) -> Vec<String> {
    pages.iter().map(|&p| page_file_name(file_name, p)).collect()
}
