//! Listing page extractor
//!
//! Turns the HTML of one listing page into [`Record`]s. The layout is fixed:
//! every item is a `tr.athing` row whose `id` is the item id, followed by a
//! sibling row holding score, author, age and the discussion link.
//!
//! Malformed items are skipped, never reported as errors. An empty result is
//! how the coordinator recognises the last page.

use crate::record::Record;
use crate::ExtractError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

const ITEM_SELECTOR: &str = "tr.athing";
const TITLE_SELECTOR: &str = "span.titleline a";
const LEGACY_TITLE_SELECTOR: &str = "a.storylink";
const SCORE_SELECTOR: &str = "span.score";
const AUTHOR_SELECTOR: &str = "a.hnuser";
const AGE_SELECTOR: &str = "span.age a";

/// Extracts records from listing pages
#[derive(Debug)]
pub struct Extractor {
    base_url: Url,
    item: Selector,
    title: Selector,
    legacy_title: Selector,
    score: Selector,
    author: Selector,
    age: Selector,
    digits: Regex,
}

fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector {
        selector: css.to_string(),
        message: format!("{:?}", e),
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

impl Extractor {
    /// Creates an extractor resolving relative links against `base_url`
    pub fn new(base_url: Url) -> Result<Self, ExtractError> {
        Ok(Self {
            base_url,
            item: selector(ITEM_SELECTOR)?,
            title: selector(TITLE_SELECTOR)?,
            legacy_title: selector(LEGACY_TITLE_SELECTOR)?,
            score: selector(SCORE_SELECTOR)?,
            author: selector(AUTHOR_SELECTOR)?,
            age: selector(AGE_SELECTOR)?,
            digits: Regex::new(r"\d+")?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Extracts every well-formed item, in document order
    ///
    /// # Example
    ///
    /// ```
    /// use hn_harvest::crawler::Extractor;
    /// use url::Url;
    ///
    /// let extractor = Extractor::new(Url::parse("https://news.ycombinator.com/").unwrap()).unwrap();
    /// let html = r#"<table>
    ///   <tr class="athing" id="1"><td><span class="titleline"><a href="item?id=1">Ask HN</a></span></td></tr>
    ///   <tr><td><span class="score">5 points</span></td></tr>
    /// </table>"#;
    /// let records = extractor.extract(html);
    /// assert_eq!(records[0].url, "https://news.ycombinator.com/item?id=1");
    /// assert_eq!(records[0].points, 5);
    /// ```
    pub fn extract(&self, html: &str) -> Vec<Record> {
        let document = Html::parse_document(html);
        let mut records = Vec::new();
        let mut skipped = 0usize;

        for row in document.select(&self.item) {
            match self.extract_item(row) {
                Some(record) => records.push(record),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::debug!("Skipped {} malformed item(s)", skipped);
        }

        records
    }

    fn extract_item(&self, row: ElementRef<'_>) -> Option<Record> {
        let item_id = row.value().attr("id").unwrap_or("").trim();
        if item_id.is_empty() {
            tracing::debug!("Skipping item row without id");
            return None;
        }

        let Some(anchor) = row
            .select(&self.title)
            .next()
            .or_else(|| row.select(&self.legacy_title).next())
        else {
            tracing::debug!("Skipping item {}: no title link", item_id);
            return None;
        };

        let Some(meta) = self.metadata_row(row) else {
            tracing::debug!("Skipping item {}: no metadata row", item_id);
            return None;
        };

        let points = meta
            .select(&self.score)
            .next()
            .map(|score| self.parse_points(&element_text(score)))
            .unwrap_or(0);

        let author = meta
            .select(&self.author)
            .next()
            .map(element_text)
            .unwrap_or_default();

        let (age_text, comments_link) = match meta.select(&self.age).next() {
            Some(age) => (
                element_text(age),
                age.value()
                    .attr("href")
                    .map(|href| resolve_link(href, &self.base_url))
                    .unwrap_or_default(),
            ),
            None => (String::new(), String::new()),
        };

        Some(Record {
            item_id: item_id.to_string(),
            title: element_text(anchor),
            url: anchor
                .value()
                .attr("href")
                .map(|href| resolve_link(href, &self.base_url))
                .unwrap_or_default(),
            points,
            author,
            age_text,
            comments_link,
        })
    }

    /// The row right after an item row, unless that row is itself an item
    fn metadata_row<'a>(&self, row: ElementRef<'a>) -> Option<ElementRef<'a>> {
        let next = row.next_siblings().find_map(ElementRef::wrap)?;
        let is_row = next.value().name() == "tr";
        let is_item = next.value().classes().any(|class| class == "athing");
        (is_row && !is_item).then_some(next)
    }

    /// First run of digits in `text`, 0 when there is none or it overflows
    pub fn parse_points(&self, text: &str) -> u32 {
        self.digits
            .find(text)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    }
}

/// Resolves a link against the base origin
///
/// Relative references are joined to `base_url`; absolute links (any scheme)
/// are returned verbatim.
pub fn resolve_link(href: &str, base_url: &Url) -> String {
    let href = href.trim();
    if href.is_empty() {
        return String::new();
    }

    match Url::parse(href) {
        Ok(_) => href.to_string(),
        Err(url::ParseError::RelativeUrlWithoutBase) => base_url
            .join(href)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| href.to_string()),
        Err(_) => href.to_string(),
    }
}
