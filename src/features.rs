//! The feature record emitted per URL
//!
//! Column names and order are fixed: downstream models are trained on this
//! exact layout.

use serde::Serialize;

use crate::aggregate::ContentFeatures;
use crate::lexical::LexicalFeatures;
use crate::probes::ReputationReport;
use crate::probes::links::ExternalLinkReport;

pub const COLUMNS: [&str; 46] = [
    "url",
    "length_url",
    "length_hostname",
    "nb_dots",
    "nb_hyphens",
    "nb_slash",
    "nb_www",
    "https_token",
    "ratio_digits_url",
    "ratio_digits_host",
    "nb_subdomains",
    "prefix_suffix",
    "shortening_service",
    "nb_redirection",
    "length_words_raw",
    "char_repeat",
    "shortest_words_raw",
    "shortest_word_host",
    "shortest_word_path",
    "longest_words_raw",
    "longest_word_host",
    "longest_word_path",
    "avg_words_raw",
    "avg_word_host",
    "avg_word_path",
    "phish_hints",
    "domain_in_brand",
    "nb_hyperlinks",
    "ratio_intHyperlinks",
    "ratio_extHyperlinks",
    "nb_extCSS",
    "ratio_extRedirection",
    "ratio_extErrors",
    "external_favicon",
    "links_in_tags",
    "ratio_intMedia",
    "ratio_extMedia",
    "safe_anchor",
    "empty_title",
    "domain_in_title",
    "domain_with_copyright",
    "domain_registration_length",
    "domain_age",
    "web_traffic",
    "google_index",
    "page_rank",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRecord {
    pub url: String,
    pub length_url: usize,
    pub length_hostname: usize,
    pub nb_dots: usize,
    pub nb_hyphens: usize,
    pub nb_slash: usize,
    pub nb_www: usize,
    pub https_token: u8,
    pub ratio_digits_url: f64,
    pub ratio_digits_host: f64,
    pub nb_subdomains: usize,
    pub prefix_suffix: u8,
    pub shortening_service: u8,
    pub nb_redirection: usize,
    pub length_words_raw: usize,
    pub char_repeat: usize,
    pub shortest_words_raw: usize,
    pub shortest_word_host: usize,
    pub shortest_word_path: usize,
    pub longest_words_raw: usize,
    pub longest_word_host: usize,
    pub longest_word_path: usize,
    pub avg_words_raw: f64,
    pub avg_word_host: f64,
    pub avg_word_path: f64,
    pub phish_hints: usize,
    pub domain_in_brand: u8,
    pub nb_hyperlinks: usize,
    #[serde(rename = "ratio_intHyperlinks")]
    pub ratio_int_hyperlinks: f64,
    #[serde(rename = "ratio_extHyperlinks")]
    pub ratio_ext_hyperlinks: f64,
    #[serde(rename = "nb_extCSS")]
    pub nb_ext_css: usize,
    #[serde(rename = "ratio_extRedirection")]
    pub ratio_ext_redirection: f64,
    #[serde(rename = "ratio_extErrors")]
    pub ratio_ext_errors: f64,
    pub external_favicon: u8,
    pub links_in_tags: f64,
    #[serde(rename = "ratio_intMedia")]
    pub ratio_int_media: f64,
    #[serde(rename = "ratio_extMedia")]
    pub ratio_ext_media: f64,
    pub safe_anchor: f64,
    pub empty_title: u8,
    pub domain_in_title: u8,
    pub domain_with_copyright: u8,
    pub domain_registration_length: i64,
    pub domain_age: i64,
    pub web_traffic: i64,
    pub google_index: i64,
    pub page_rank: i64,
}

impl FeatureRecord {
    pub fn assemble(
        url: &str,
        lexical: &LexicalFeatures,
        content: &ContentFeatures,
        nb_redirection: usize,
        links: &ExternalLinkReport,
        reputation: &ReputationReport,
    ) -> Self {
        Self {
            url: url.to_string(),
            length_url: lexical.length_url,
            length_hostname: lexical.length_hostname,
            nb_dots: lexical.nb_dots,
            nb_hyphens: lexical.nb_hyphens,
            nb_slash: lexical.nb_slash,
            nb_www: lexical.nb_www,
            https_token: lexical.https_token,
            ratio_digits_url: lexical.ratio_digits_url,
            ratio_digits_host: lexical.ratio_digits_host,
            nb_subdomains: lexical.nb_subdomains,
            prefix_suffix: lexical.prefix_suffix,
            shortening_service: lexical.shortening_service,
            nb_redirection,
            length_words_raw: lexical.length_words_raw,
            char_repeat: lexical.char_repeat,
            shortest_words_raw: lexical.words_raw.shortest,
            shortest_word_host: lexical.words_host.shortest,
            shortest_word_path: lexical.words_path.shortest,
            longest_words_raw: lexical.words_raw.longest,
            longest_word_host: lexical.words_host.longest,
            longest_word_path: lexical.words_path.longest,
            avg_words_raw: lexical.words_raw.average,
            avg_word_host: lexical.words_host.average,
            avg_word_path: lexical.words_path.average,
            phish_hints: lexical.phish_hints,
            domain_in_brand: lexical.domain_in_brand,
            nb_hyperlinks: content.nb_hyperlinks,
            ratio_int_hyperlinks: content.ratio_int_hyperlinks,
            ratio_ext_hyperlinks: content.ratio_ext_hyperlinks,
            nb_ext_css: content.nb_ext_css,
            ratio_ext_redirection: links.ratio_redirection(),
            ratio_ext_errors: links.ratio_errors(),
            external_favicon: content.external_favicon,
            links_in_tags: content.links_in_tags,
            ratio_int_media: content.ratio_int_media,
            ratio_ext_media: content.ratio_ext_media,
            safe_anchor: content.safe_anchor,
            empty_title: content.empty_title,
            domain_in_title: content.domain_in_title,
            domain_with_copyright: content.domain_with_copyright,
            domain_registration_length: reputation.domain_registration_length,
            domain_age: reputation.domain_age,
            web_traffic: reputation.web_traffic,
            google_index: reputation.google_index,
            page_rank: reputation.page_rank,
        }
    }

    /// Values in `COLUMNS` order. Floats keep a fractional part (`25.0`).
    pub fn row(&self) -> Vec<String> {
        let f = |v: f64| format!("{:?}", v);
        vec![
            self.url.clone(),
            self.length_url.to_string(),
            self.length_hostname.to_string(),
            self.nb_dots.to_string(),
            self.nb_hyphens.to_string(),
            self.nb_slash.to_string(),
            self.nb_www.to_string(),
            self.https_token.to_string(),
            f(self.ratio_digits_url),
            f(self.ratio_digits_host),
            self.nb_subdomains.to_string(),
            self.prefix_suffix.to_string(),
            self.shortening_service.to_string(),
            self.nb_redirection.to_string(),
            self.length_words_raw.to_string(),
            self.char_repeat.to_string(),
            self.shortest_words_raw.to_string(),
            self.shortest_word_host.to_string(),
            self.shortest_word_path.to_string(),
            self.longest_words_raw.to_string(),
            self.longest_word_host.to_string(),
            self.longest_word_path.to_string(),
            f(self.avg_words_raw),
            f(self.avg_word_host),
            f(self.avg_word_path),
            self.phish_hints.to_string(),
            self.domain_in_brand.to_string(),
            self.nb_hyperlinks.to_string(),
            f(self.ratio_int_hyperlinks),
            f(self.ratio_ext_hyperlinks),
            self.nb_ext_css.to_string(),
            f(self.ratio_ext_redirection),
            f(self.ratio_ext_errors),
            self.external_favicon.to_string(),
            f(self.links_in_tags),
            f(self.ratio_int_media),
            f(self.ratio_ext_media),
            f(self.safe_anchor),
            self.empty_title.to_string(),
            self.domain_in_title.to_string(),
            self.domain_with_copyright.to_string(),
            self.domain_registration_length.to_string(),
            self.domain_age.to_string(),
            self.web_traffic.to_string(),
            self.google_index.to_string(),
            self.page_rank.to_string(),
        ]
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::brands::BrandList;
    use crate::domain_utils::UrlParts;
    use crate::lexical;
    use crate::resources::PageResources;
    use std::collections::BTreeSet;

    pub(crate) fn sample_record() -> FeatureRecord {
        let url = "http://www.example.com/wp-login.php";
        let parts = UrlParts::parse(url).unwrap();
        let lexical = lexical::analyze(url, &parts, &BrandList::from_lines(["example.com"]));
        let content = crate::aggregate::aggregate(&PageResources::default(), &parts.domain_label);
        let reputation = ReputationReport {
            domain_registration_length: 120,
            domain_age: -2,
            web_traffic: 0,
            google_index: 1,
            page_rank: -1,
        };
        FeatureRecord::assemble(url, &lexical, &content, 1, &ExternalLinkReport::default(), &reputation)
    }

    #[test]
    fn test_row_matches_columns() {
        let record = sample_record();
        let row = record.row();
        assert_eq!(row.len(), COLUMNS.len());
        assert_eq!(row[0], "http://www.example.com/wp-login.php");
        assert_eq!(row[COLUMNS.iter().position(|c| *c == "nb_redirection").unwrap()], "1");
        assert_eq!(row[COLUMNS.iter().position(|c| *c == "domain_age").unwrap()], "-2");
        assert_eq!(row[COLUMNS.iter().position(|c| *c == "safe_anchor").unwrap()], "0.0");
    }

    #[test]
    fn test_json_keys_match_columns() {
        let value = serde_json::to_value(sample_record()).unwrap();
        let keys: BTreeSet<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        let expected: BTreeSet<&str> = COLUMNS.iter().copied().collect();
        assert_eq!(keys, expected);
    }
}
