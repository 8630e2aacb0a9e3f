//! Extracting repositories from the trending page fragment.
//!
//! This is a pattern extractor for one page layout, not an HTML parser.
//! Markup that stops matching simply ends the scan.

use regex::Regex;

use super::types::TrendingEntry;
use crate::error::Result;

/// Hard cap on entries returned from one page.
pub const MAX_TRENDING: usize = 25;

const TRENDING_PATTERN: &str = concat!(
    r#"(?s)<span itemprop="programmingLanguage">(\S+)</span>"#,
    r#".*?<a href="/(\S+/\S+)/stargazers"#,
    r#".*?([\d,]+) stars (?:today|this)"#,
);

/// Compiled once, reused for every page.
#[derive(Debug, Clone)]
pub struct TrendingScraper {
    pattern: Regex,
}

impl TrendingScraper {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(TRENDING_PATTERN)?,
        })
    }

    /// Lazily yield entries in page order, at most [`MAX_TRENDING`].
    ///
    /// Each match resumes scanning after the previous star count; calling
    /// again on the same text starts over from the beginning.
    pub fn entries<'h>(&'h self, html: &'h str) -> impl Iterator<Item = TrendingEntry> + 'h {
        self.pattern
            .captures_iter(html)
            .take(MAX_TRENDING)
            .map(|caps| TrendingEntry {
                language: caps[1].to_string(),
                full_name: caps[2].to_string(),
                stars: parse_star_count(&caps[3]),
            })
    }

    pub fn scrape(&self, html: &str) -> Vec<TrendingEntry> {
        self.entries(html).collect()
    }
}

/// `"1,234"` is 1234. Anything unparsable counts as zero.
fn parse_star_count(text: &str) -> i64 {
    text.chars()
        .filter(|c| *c != ',')
        .collect::<String>()
        .parse()
        .unwrap_or(0)
}
