//! Listing extraction from store search pages.
//!
//! Each store is described by a `SelectorProfile`: a card selector matching
//! one product tile and per-field selectors evaluated inside the card.
//! Extraction produces raw `ListingText`; normalization happens afterwards.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{Result, ShopError};
use crate::normalize::{normalize_whitespace, ListingText};

/// Where a field's value lives inside the matched element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Read {
    /// Concatenated text content
    Text,
    /// Value of the named attribute
    Attr(&'static str),
}

/// One CSS selector plus how to read the matched element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSelector {
    pub css: &'static str,
    pub read: Read,
}

impl FieldSelector {
    pub const fn text(css: &'static str) -> Self {
        Self {
            css,
            read: Read::Text,
        }
    }

    pub const fn attr(css: &'static str, attr: &'static str) -> Self {
        Self {
            css,
            read: Read::Attr(attr),
        }
    }
}

/// Selectors describing a store's search result page
///
/// For every field, candidates are tried in order and the first non-empty
/// value wins. `title` is the exception: every part is read and the
/// non-empty ones are joined with a space (brand + product name layouts).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorProfile {
    /// Base URL for resolving relative links
    pub base_url: &'static str,
    pub card: &'static str,
    pub title: &'static [FieldSelector],
    pub link: &'static [FieldSelector],
    pub price: &'static [FieldSelector],
    pub rating: &'static [FieldSelector],
    pub reviews: &'static [FieldSelector],
    pub image: &'static [FieldSelector],
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| ShopError::ExtractionError(format!("Invalid selector '{}': {:?}", css, e)))
}

/// Parsed form of a `FieldSelector` list
struct CompiledField(Vec<(Selector, Read)>);

impl CompiledField {
    fn compile(fields: &[FieldSelector]) -> Result<Self> {
        fields
            .iter()
            .map(|f| Ok((parse_selector(f.css)?, f.read)))
            .collect::<Result<Vec<_>>>()
            .map(CompiledField)
    }

    fn read(element: ElementRef<'_>, read: Read) -> Option<String> {
        let value = match read {
            Read::Text => element.text().collect::<Vec<_>>().join(" "),
            Read::Attr(name) => element.value().attr(name)?.to_string(),
        };
        let value = normalize_whitespace(&value);
        (!value.is_empty()).then_some(value)
    }

    /// First non-empty value among the candidates
    fn first(&self, card: ElementRef<'_>) -> Option<String> {
        self.0.iter().find_map(|(selector, read)| {
            card.select(selector)
                .find_map(|element| Self::read(element, *read))
        })
    }

    /// First non-empty value of every candidate, joined by a space
    fn joined(&self, card: ElementRef<'_>) -> Option<String> {
        let parts: Vec<String> = self
            .0
            .iter()
            .filter_map(|(selector, read)| {
                card.select(selector)
                    .find_map(|element| Self::read(element, *read))
            })
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

/// Resolve a possibly relative href against the store's base URL
pub fn resolve_link(base_url: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    match Url::parse(href) {
        Ok(url) => Some(url.to_string()),
        Err(_) => Url::parse(base_url)
            .and_then(|base| base.join(href))
            .map(|url| url.to_string())
            .ok(),
    }
}

/// Extract up to `limit` listings from a search result page
///
/// Cards without a resolvable link are skipped. Title emptiness is left to
/// `ListingText::into_product`, which applies the full output contract.
pub fn extract_listings(
    html: &str,
    profile: &SelectorProfile,
    limit: usize,
) -> Result<Vec<ListingText>> {
    let document = Html::parse_document(html);
    let card_selector = parse_selector(profile.card)?;
    let title = CompiledField::compile(profile.title)?;
    let link = CompiledField::compile(profile.link)?;
    let price = CompiledField::compile(profile.price)?;
    let rating = CompiledField::compile(profile.rating)?;
    let reviews = CompiledField::compile(profile.reviews)?;
    let image = CompiledField::compile(profile.image)?;

    let mut listings = Vec::new();
    for card in document.select(&card_selector) {
        if listings.len() >= limit {
            break;
        }

        let Some(href) = link.first(card) else {
            continue;
        };
        let Some(resolved) = resolve_link(profile.base_url, &href) else {
            continue;
        };

        listings.push(ListingText {
            title: title.joined(card).unwrap_or_default(),
            link: resolved,
            price: price.first(card),
            rating: rating.first(card),
            reviews: reviews.first(card),
            image: image.first(card),
            description: None,
        });
    }

    Ok(listings)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: SelectorProfile = SelectorProfile {
        base_url: "https://shop.test",
        card: "div.card",
        title: &[FieldSelector::text("span.brand"), FieldSelector::text("span.name")],
        link: &[FieldSelector::attr("a.main", "href")],
        price: &[FieldSelector::text("span.sale"), FieldSelector::text("span.price")],
        rating: &[FieldSelector::attr("div.stars", "style")],
        reviews: &[FieldSelector::text("span.count")],
        image: &[FieldSelector::attr("img", "src")],
    };

    const HTML: &str = r#"
    <html><body>
      <div class="card">
        <a class="main" href="/p/1"><span class="brand">Acme</span> <span class="name">Desk  Lamp</span></a>
        <span class="price">₹1,299</span>
        <div class="stars" style="width: 80%"></div>
        <span class="count">(2,048)</span>
        <img src="https://img.test/1.jpg">
      </div>
      <div class="card">
        <span class="name">No link here</span>
      </div>
      <div class="card">
        <a class="main" href="https://other.test/p/3"><span class="name">Floor Lamp</span></a>
        <span class="sale">₹999</span>
        <span class="price">₹1,499</span>
      </div>
    </body></html>
    "#;

    #[test]
    fn test_extract_listings() {
        let listings = extract_listings(HTML, &PROFILE, 10).unwrap();
        assert_eq!(listings.len(), 2);

        let first = &listings[0];
        assert_eq!(first.title, "Acme Desk Lamp");
        assert_eq!(first.link, "https://shop.test/p/1");
        assert_eq!(first.price.as_deref(), Some("₹1,299"));
        assert_eq!(first.rating.as_deref(), Some("width: 80%"));
        assert_eq!(first.reviews.as_deref(), Some("(2,048)"));
        assert_eq!(first.image.as_deref(), Some("https://img.test/1.jpg"));

        let second = &listings[1];
        assert_eq!(second.title, "Floor Lamp");
        assert_eq!(second.link, "https://other.test/p/3");
        // first candidate wins
        assert_eq!(second.price.as_deref(), Some("₹999"));
        assert_eq!(second.rating, None);
    }

    #[test]
    fn test_extract_respects_limit() {
        let listings = extract_listings(HTML, &PROFILE, 1).unwrap();
        assert_eq!(listings.len(), 1);
    }

    #[test]
    fn test_invalid_selector() {
        let profile = SelectorProfile {
            card: "div[",
            ..PROFILE
        };
        assert!(extract_listings(HTML, &profile, 10).is_err());
    }

    #[test]
    fn test_resolve_link() {
        assert_eq!(
            resolve_link("https://www.flipkart.com", "/item/p/abc?pid=1").as_deref(),
            Some("https://www.flipkart.com/item/p/abc?pid=1")
        );
        assert_eq!(
            resolve_link("https://www.flipkart.com", "https://x.test/a").as_deref(),
            Some("https://x.test/a")
        );
        assert_eq!(resolve_link("https://www.flipkart.com", "  "), None);
    }
}
