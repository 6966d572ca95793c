//! Content features derived from a classified page.

use crate::resources::PageResources;

const COPYRIGHT_SYMBOLS: [char; 3] = ['\u{00A9}', '\u{2122}', '\u{00AE}'];
const COPYRIGHT_WINDOW: usize = 50;

/// Features computed from the page's reference buckets, title and text
#[derive(Debug, Clone, PartialEq)]
pub struct ContentFeatures {
    pub nb_hyperlinks: usize,
    pub ratio_int_hyperlinks: f64,
    pub ratio_ext_hyperlinks: f64,
    pub nb_ext_css: usize,
    pub external_favicon: u8,
    pub links_in_tags: f64,
    pub ratio_int_media: f64,
    pub ratio_ext_media: f64,
    pub safe_anchor: f64,
    pub empty_title: u8,
    pub domain_in_title: u8,
    pub domain_with_copyright: u8,
}

/// Which half of the reference buckets to sum
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinkKind {
    Internal,
    External,
}

/// `domain_label` is the registrable label (e.g. `example`), matched
/// case-insensitively against the title and the copyright notice.
pub fn aggregate(page: &PageResources, domain_label: &str) -> ContentFeatures {
    ContentFeatures {
        nb_hyperlinks: nb_hyperlinks(page),
        ratio_int_hyperlinks: hyperlink_ratio(page, LinkKind::Internal),
        ratio_ext_hyperlinks: hyperlink_ratio(page, LinkKind::External),
        nb_ext_css: page.css.externals.len(),
        external_favicon: (!page.favicon.externals.is_empty()) as u8,
        links_in_tags: internal_percentage(page.link.internals.len(), page.link.externals.len()),
        ratio_int_media: internal_percentage(page.media.internals.len(), page.media.externals.len()),
        // Same formula as ratio_int_media; kept for compatibility with trained models
        ratio_ext_media: internal_percentage(page.media.internals.len(), page.media.externals.len()),
        safe_anchor: internal_percentage(page.anchor.unsafe_refs.len(), page.anchor.safe.len()),
        empty_title: page.title.is_empty() as u8,
        domain_in_title: (!page.title.to_lowercase().contains(&domain_label.to_lowercase())) as u8,
        domain_with_copyright: domain_with_copyright(domain_label, &page.text),
    }
}

pub fn nb_hyperlinks(page: &PageResources) -> usize {
    page.hyperlink_buckets().iter().map(|b| b.link_count()).sum()
}

/// Share of `kind` among all hyperlinks, 0 without hyperlinks
pub fn hyperlink_ratio(page: &PageResources, kind: LinkKind) -> f64 {
    let total = nb_hyperlinks(page);
    if total == 0 {
        return 0.0;
    }
    let count: usize = page
        .hyperlink_buckets()
        .iter()
        .map(|b| match kind {
            LinkKind::Internal => b.internals.len(),
            LinkKind::External => b.externals.len(),
        })
        .sum();
    count as f64 / total as f64
}

/// `100 * part / (part + rest)`, 0 when both are empty
pub fn internal_percentage(part: usize, rest: usize) -> f64 {
    let total = part + rest;
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}

/// 1 when the first copyright-like symbol has no mention of the domain
/// within 50 characters on either side, 0 otherwise or with no symbol
pub fn domain_with_copyright(domain_label: &str, text: &str) -> u8 {
    let chars: Vec<char> = text.chars().collect();
    let Some(pos) = chars.iter().position(|c| COPYRIGHT_SYMBOLS.contains(c)) else {
        return 0;
    };

    let start = pos.saturating_sub(COPYRIGHT_WINDOW);
    let end = (pos + COPYRIGHT_WINDOW).min(chars.len());
    let window: String = chars[start..end].iter().collect();

    (!window.to_lowercase().contains(&domain_label.to_lowercase())) as u8
}
