//! Classification of the resources referenced by a page.
//!
//! Every `href`/`src`/`action` value found in the DOM is sorted into an
//! internal, external or null region of a per-kind [`ReferenceBucket`].
//! Anchors are additionally sorted into safe/unsafe, and iframes into
//! visible/invisible.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Placeholder hrefs that carry no real destination
pub const NULL_ANCHORS: [&str; 12] = [
    "", "#", "#nothing", "#doesnotexist", "#null", "#void", "#whatever",
    "#content", "javascript::void(0)", "javascript::void(0);", "javascript::;", "javascript",
];

const CSS_IMPORT: &str = "@import url(";

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static IMG_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("img[src]"));
static AUDIO_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("audio[src]"));
static EMBED_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("embed[src]"));
static IFRAME_SRC_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("iframe[src]"));
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("link[href]"));
static LINK_REL_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("link[href][rel]"));
static SCRIPT_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("script[src]"));
static STYLESHEET_SELECTOR: Lazy<Selector> = Lazy::new(|| selector(r#"link[rel~="stylesheet"][href]"#));
static FORM_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("form[action]"));
static STYLE_SELECTOR: Lazy<Selector> = Lazy::new(|| selector(r#"style[type="text/css"]"#));
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("title"));

/// `<head>` start tags as written in the source. The parsed DOM always has a
/// head element, so it cannot tell whether the page declared one.
static HEAD_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<head[\s>/]").unwrap());

/// (selector, attribute, value that makes the iframe invisible)
static IFRAME_SCANS: Lazy<[(Selector, &'static str, &'static str); 3]> = Lazy::new(|| [
    (selector("iframe[width][height][frameborder]"), "frameborder", "0"),
    (selector("iframe[width][height][border]"), "border", "0"),
    (selector("iframe[width][height][style]"), "style", "border:none;"),
]);

/// Internal / external / null partition of reference strings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceBucket {
    pub internals: Vec<String>,
    pub externals: Vec<String>,
    pub null: Vec<String>,
}

impl ReferenceBucket {
    /// Internals plus externals; null references are not links
    pub fn link_count(&self) -> usize {
        self.internals.len() + self.externals.len()
    }
}

/// Anchor hrefs split by destination safety
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnchorBucket {
    pub safe: Vec<String>,
    pub unsafe_refs: Vec<String>,
    pub null: Vec<String>,
}

/// Serialized iframe elements split by visibility
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IframeBucket {
    pub visible: Vec<String>,
    pub invisible: Vec<String>,
}

/// Everything the aggregator needs from one page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageResources {
    pub href: ReferenceBucket,
    pub link: ReferenceBucket,
    pub anchor: AnchorBucket,
    pub media: ReferenceBucket,
    pub form: ReferenceBucket,
    pub css: ReferenceBucket,
    pub favicon: ReferenceBucket,
    pub iframe: IframeBucket,
    pub title: String,
    pub text: String,
}

impl PageResources {
    /// The six buckets that count as hyperlinks
    pub fn hyperlink_buckets(&self) -> [&ReferenceBucket; 6] {
        [&self.href, &self.link, &self.media, &self.form, &self.css, &self.favicon]
    }
}

/// How a `/`-prefixed internal value is joined to the hostname
#[derive(Debug, Clone, Copy, PartialEq)]
enum RootJoin {
    /// `{hostname}/{value}`
    Slash,
    /// `{hostname}{value}`
    Direct,
}

/// Sorts references relative to one page's hostname and registrable domain
#[derive(Debug, Clone, Copy)]
pub struct ResourceClassifier<'a> {
    hostname: &'a str,
    domain: &'a str,
}

impl<'a> ResourceClassifier<'a> {
    pub fn new(hostname: &'a str, domain: &'a str) -> Self {
        Self { hostname, domain }
    }

    /// The same-site test applied to every non-anchor reference. The trailing
    /// scheme guard dominates: only values without an `http` prefix pass.
    pub fn is_internal_leaning(&self, value: &str) -> bool {
        let absolute = value.starts_with("http");
        let dots = value.matches('.').count();
        (value.contains(self.hostname) || value.contains(self.domain) || dots == 1 || !absolute)
            && !absolute
    }

    /// Classify a media/link/script/form/stylesheet/favicon reference
    pub fn classify(&self, value: &str, bucket: &mut ReferenceBucket) {
        self.classify_with(value, bucket, RootJoin::Slash);
    }

    fn classify_with(&self, value: &str, bucket: &mut ReferenceBucket, join: RootJoin) {
        if !self.is_internal_leaning(value) {
            bucket.externals.push(value.to_string());
            return;
        }
        self.record_internal(value, bucket, join);
    }

    fn record_internal(&self, value: &str, bucket: &mut ReferenceBucket, join: RootJoin) {
        if !value.starts_with('/') {
            bucket.internals.push(format!("{}/{}", self.hostname, value));
        } else if NULL_ANCHORS.contains(&value) {
            bucket.null.push(value.to_string());
        } else {
            match join {
                RootJoin::Slash => bucket.internals.push(format!("{}/{}", self.hostname, value)),
                RootJoin::Direct => bucket.internals.push(format!("{}{}", self.hostname, value)),
            }
        }
    }

    /// Classify an anchor href. Absolute `http` hrefs are external and safe
    /// without further checks; everything else is internal-leaning and may be
    /// flagged unsafe.
    pub fn classify_anchor(&self, value: &str, href: &mut ReferenceBucket, anchor: &mut AnchorBucket) {
        if value.starts_with("http") {
            href.externals.push(value.to_string());
            anchor.safe.push(value.to_string());
            return;
        }

        if is_unsafe_anchor(value) {
            anchor.unsafe_refs.push(value.to_string());
        }
        self.record_internal(value, href, RootJoin::Direct);
    }

    /// Parse `html` and classify everything it references
    pub fn extract(&self, html: &str) -> PageResources {
        let document = Html::parse_document(html);
        let mut page = PageResources::default();

        self.fill_media(&document, &mut page.media);
        self.fill_links(&document, &mut page);
        self.fill_favicons(&document, HEAD_TAG_RE.find_iter(html).count(), &mut page.favicon);
        self.fill_anchors(&document, &mut page);
        self.fill_style_imports(&document, &mut page.css);
        fill_iframes(&document, &mut page.iframe);

        page.title = document
            .select(&TITLE_SELECTOR)
            .next()
            .map(|t| t.text().collect::<String>())
            .unwrap_or_default();
        page.text = document.root_element().text().collect::<String>();

        debug!(
            "Classified page for {}: {} anchors, {} media, {} links, {} forms",
            self.hostname,
            page.href.link_count(),
            page.media.link_count(),
            page.link.link_count(),
            page.form.link_count()
        );

        page
    }

    fn classify_all(&self, document: &Html, sel: &Selector, attr: &str, bucket: &mut ReferenceBucket) {
        for el in document.select(sel) {
            if let Some(value) = el.value().attr(attr) {
                self.classify(value, bucket);
            }
        }
    }

    fn fill_media(&self, document: &Html, media: &mut ReferenceBucket) {
        self.classify_all(document, &IMG_SELECTOR, "src", media);
        self.classify_all(document, &AUDIO_SELECTOR, "src", media);
        self.classify_all(document, &EMBED_SELECTOR, "src", media);
        self.classify_all(document, &IFRAME_SRC_SELECTOR, "src", media);
    }

    fn fill_links(&self, document: &Html, page: &mut PageResources) {
        self.classify_all(document, &LINK_SELECTOR, "href", &mut page.link);
        self.classify_all(document, &SCRIPT_SELECTOR, "src", &mut page.link);
        self.classify_all(document, &STYLESHEET_SELECTOR, "href", &mut page.css);
        self.classify_all(document, &FORM_SELECTOR, "action", &mut page.form);
    }

    /// Per `<head>` in the source: every link once, then icon links a second time
    fn fill_favicons(&self, document: &Html, heads: usize, favicon: &mut ReferenceBucket) {
        for _ in 0..heads {
            self.classify_all(document, &LINK_SELECTOR, "href", favicon);

            for link in document.select(&LINK_REL_SELECTOR) {
                if rel_is_icon(&link) {
                    if let Some(value) = link.value().attr("href") {
                        self.classify(value, favicon);
                    }
                }
            }
        }
    }

    fn fill_anchors(&self, document: &Html, page: &mut PageResources) {
        for el in document.select(&ANCHOR_SELECTOR) {
            if let Some(value) = el.value().attr("href") {
                self.classify_anchor(value, &mut page.href, &mut page.anchor);
            }
        }
    }

    fn fill_style_imports(&self, document: &Html, css: &mut ReferenceBucket) {
        for style in document.select(&STYLE_SELECTOR) {
            let body = style.text().collect::<String>();
            if let Some(target) = css_import_target(&body) {
                self.classify_with(target, css, RootJoin::Direct);
            }
        }
    }
}

/// `#`, or `javascript`/`mailto` in any case
pub fn is_unsafe_anchor(value: &str) -> bool {
    let lower = value.to_lowercase();
    value.contains('#') || lower.contains("javascript") || lower.contains("mailto")
}

fn rel_is_icon(link: &ElementRef<'_>) -> bool {
    link.value()
        .attr("rel")
        .map(|rel| rel.split_whitespace().any(|token| token.ends_with("icon")))
        .unwrap_or(false)
}

/// The text between `@import url(` and the next `)`
fn css_import_target(body: &str) -> Option<&str> {
    let start = body.find(CSS_IMPORT)? + CSS_IMPORT.len();
    let len = body[start..].find(')')?;
    Some(&body[start..start + len])
}

/// Three independent scans; an iframe matching several lands once per scan
fn fill_iframes(document: &Html, iframe: &mut IframeBucket) {
    for (sel, attr, hidden_value) in IFRAME_SCANS.iter() {
        for el in document.select(sel) {
            let attrs = el.value();
            let hidden = attrs.attr("width") == Some("0")
                && attrs.attr("height") == Some("0")
                && attrs.attr(attr) == Some(*hidden_value);
            if hidden {
                iframe.invisible.push(el.html());
            } else {
                iframe.visible.push(el.html());
            }
        }
    }
}
