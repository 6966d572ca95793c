//! Lexical features of the URL string and its hostname.
//!
//! Everything here is a pure function of the URL text; nothing touches the
//! network.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::brands::BrandList;
use crate::domain_utils::UrlParts;

/// Substrings commonly found in phishing kit paths
pub const PHISH_HINTS: [&str; 16] = [
    "wp", "login", "includes", "admin", "content", "site", "images", "js",
    "alibaba", "css", "myaccount", "dropbox", "themes", "plugins", "signin", "view",
];

/// Word delimiters: - . / ? = @ & % : _
static WORD_SPLIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[-./?=@&%:_]").unwrap()
});

static PREFIX_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://[^\-]+-[^\-]+/").unwrap()
});

// Case-sensitive on purpose: entries like `BudURL\.com` only match as written
static SHORTENING_SERVICE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"bit\.ly|goo\.gl|shorte\.st|go2l\.ink|x\.co|ow\.ly|t\.co|tinyurl|tr\.im|is\.gd|cli\.gs|",
        r"yfrog\.com|migre\.me|ff\.im|tiny\.cc|url4\.eu|twit\.ac|su\.pr|twurl\.nl|snipurl\.com|",
        r"short\.to|BudURL\.com|ping\.fm|post\.ly|Just\.as|bkite\.com|snipr\.com|fic\.kr|loopt\.us|",
        r"doiop\.com|short\.ie|kl\.am|wp\.me|rubyurl\.com|om\.ly|to\.ly|bit\.do|t\.co|lnkd\.in|",
        r"db\.tt|qr\.ae|adf\.ly|goo\.gl|bitly\.com|cur\.lv|tinyurl\.com|ow\.ly|bit\.ly|ity\.im|",
        r"q\.gs|is\.gd|po\.st|bc\.vc|twitthis\.com|u\.to|j\.mp|buzurl\.com|cutt\.us|u\.bb|yourls\.org|",
        r"x\.co|prettylinkpro\.com|scrnch\.me|filoops\.info|vzturl\.com|qr\.net|1url\.com|tweez\.me|v\.gd|",
        r"tr\.im|link\.zip\.net",
    ))
    .unwrap()
});

/// Tokenized words of a URL
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordTokens {
    /// domain + path + subdomain tokens, in that order
    pub raw: Vec<String>,
    /// domain + subdomain tokens
    pub host: Vec<String>,
    /// path tokens
    pub path: Vec<String>,
}

impl WordTokens {
    pub fn extract(domain: &str, subdomain: &str, path: &str) -> Self {
        let w_domain = split_words(domain);
        let w_subdomain = split_words(subdomain);
        let w_path = split_words(path);

        let raw = [w_domain.as_slice(), w_path.as_slice(), w_subdomain.as_slice()].concat();
        let host = [w_domain.as_slice(), w_subdomain.as_slice()].concat();

        Self { raw, host, path: w_path }
    }
}

fn split_words(text: &str) -> Vec<String> {
    WORD_SPLIT_RE
        .split(&text.to_lowercase())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Word length statistics over one token list
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WordStats {
    pub shortest: usize,
    pub longest: usize,
    pub average: f64,
}

impl WordStats {
    /// All zero for an empty list
    pub fn of(words: &[String]) -> Self {
        if words.is_empty() {
            return Self::default();
        }
        let lengths: Vec<usize> = words.iter().map(|w| w.chars().count()).collect();
        let total: usize = lengths.iter().sum();
        Self {
            shortest: lengths.iter().copied().min().unwrap_or(0),
            longest: lengths.iter().copied().max().unwrap_or(0),
            average: total as f64 / lengths.len() as f64,
        }
    }
}

/// URL-string features
#[derive(Debug, Clone, PartialEq)]
pub struct LexicalFeatures {
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
    pub length_words_raw: usize,
    pub char_repeat: usize,
    pub words_raw: WordStats,
    pub words_host: WordStats,
    pub words_path: WordStats,
    pub phish_hints: usize,
    pub domain_in_brand: u8,
}

/// Compute every lexical feature for `url`
pub fn analyze(url: &str, parts: &UrlParts, brands: &BrandList) -> LexicalFeatures {
    let words = WordTokens::extract(&parts.domain_label, &parts.subdomain, &parts.word_path);

    LexicalFeatures {
        length_url: url.chars().count(),
        length_hostname: parts.hostname.chars().count(),
        nb_dots: url.matches('.').count(),
        nb_hyphens: url.matches('-').count(),
        nb_slash: url.matches('/').count(),
        nb_www: words.raw.iter().filter(|w| w.contains("www")).count(),
        https_token: (parts.scheme != "https") as u8,
        ratio_digits_url: digit_ratio(url),
        ratio_digits_host: digit_ratio(&parts.hostname),
        nb_subdomains: count_subdomains(url),
        prefix_suffix: PREFIX_SUFFIX_RE.is_match(url) as u8,
        shortening_service: shortening_service(url),
        length_words_raw: words.raw.len(),
        char_repeat: char_repeat(&words.raw),
        words_raw: WordStats::of(&words.raw),
        words_host: WordStats::of(&words.host),
        words_path: WordStats::of(&words.path),
        phish_hints: phish_hints(url),
        domain_in_brand: brands.contains(&parts.registrable_domain) as u8,
    }
}

/// Share of ASCII digits in `text`, 0 for empty input
pub fn digit_ratio(text: &str) -> f64 {
    let length = text.chars().count();
    if length == 0 {
        return 0.0;
    }
    let digits = text.chars().filter(|c| c.is_ascii_digit()).count();
    digits as f64 / length as f64
}

/// Dot count reported as 1 or 2, anything else as 3
pub fn count_subdomains(url: &str) -> usize {
    match url.matches('.').count() {
        n @ 1..=2 => n,
        _ => 3,
    }
}

pub fn shortening_service(url: &str) -> u8 {
    SHORTENING_SERVICE_RE.is_match(url) as u8
}

/// Number of windows of length 2 to 5 made of a single repeated character
pub fn char_repeat(words: &[String]) -> usize {
    let mut total = 0;
    for word in words {
        let chars: Vec<char> = word.chars().collect();
        for run in 2..=5 {
            total += chars
                .windows(run)
                .filter(|w| w.iter().all(|c| *c == w[0]))
                .count();
        }
    }
    total
}

/// Total hint occurrences in the lowercased URL
pub fn phish_hints(url: &str) -> usize {
    let lower = url.to_lowercase();
    PHISH_HINTS.iter().map(|hint| lower.matches(hint).count()).sum()
}
