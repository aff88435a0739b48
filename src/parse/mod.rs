//! Price extraction from fetched pages.
//!
//! Each product selects one extraction strategy in configuration, so a markup
//! change on one shop cannot break extraction for the others.

pub mod offer_text;
pub mod woocommerce;

use chrono::{DateTime, FixedOffset};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Deserialize;

use crate::config::ProductConfig;
use crate::fetch::FetchedPage;
use crate::record::{ParseFailure, PriceRecord};

/// Extraction strategy, selected per product in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStrategy {
    /// WooCommerce shops: price lives in `.woocommerce-Price-amount`.
    Woocommerce,
    /// Offer copy in running text ("Cena regularna 975 kg ... 1 845,00 zł").
    OfferText,
}

/// Intermediate extraction result before it is stamped into a [`PriceRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub price: f64,
    pub currency: &'static str,
    pub weight_kg: Option<f64>,
    pub raw_price: String,
    pub method: &'static str,
}

/// Extract one price record from a fetched page.
pub fn parse_page(
    product: &ProductConfig,
    page: &FetchedPage,
    fetched_at: DateTime<FixedOffset>,
) -> Result<PriceRecord, ParseFailure> {
    let quote = match product.parser {
        ParseStrategy::Woocommerce => woocommerce::extract(&page.body)?,
        ParseStrategy::OfferText => offer_text::extract(&page.body)?,
    };
    Ok(quote.into_record(product, fetched_at))
}

impl PriceQuote {
    fn into_record(
        self,
        product: &ProductConfig,
        fetched_at: DateTime<FixedOffset>,
    ) -> PriceRecord {
        let price_per_kg = self
            .weight_kg
            .filter(|w| *w > 0.0)
            .map(|w| round6(self.price / w));
        PriceRecord {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            price: self.price,
            currency: self.currency.to_string(),
            unit: product.unit.clone(),
            weight_kg: self.weight_kg,
            price_per_kg,
            raw_price: Some(self.raw_price),
            method: self.method.to_string(),
            source_url: product.url.clone(),
            fetched_at,
        }
    }
}

fn round6(x: f64) -> f64 {
    (x * 1e6).round() / 1e6
}

/// Normalize whitespace and NBSP characters in extracted text.
pub(crate) fn normalize_text(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s).replace('\u{a0}', " ");
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&decoded, " ").trim().to_string()
}

/// Parse the first decimal number from a Polish-formatted numeric string
/// (space or NBSP thousands separators, comma decimal separator).
pub(crate) fn parse_decimal_pl(s: &str) -> Option<f64> {
    let compact = s.replace(['\u{a0}', ' '], "").replace(',', ".");
    static RE_NUM: OnceCell<Regex> = OnceCell::new();
    let re = RE_NUM.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());
    re.find(&compact)?.as_str().parse().ok()
}

/// Find the first price with a recognized currency marker in `text`.
/// Returns (value, ISO code, matched text).
pub(crate) fn find_price(text: &str) -> Option<(f64, &'static str, String)> {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?i)(\d[\d\s,.]*)\s*((?:zł|zl|pln|eur)\b|€)").unwrap()
    });
    let caps = re.captures(text)?;
    let value = parse_decimal_pl(caps.get(1)?.as_str())?;
    let code = currency_code(caps.get(2)?.as_str())?;
    Some((value, code, caps.get(0)?.as_str().trim().to_string()))
}

/// Map a currency marker found next to a price to its ISO code.
pub(crate) fn currency_code(marker: &str) -> Option<&'static str> {
    match marker.to_lowercase().as_str() {
        "zł" | "zl" | "pln" => Some("PLN"),
        "€" | "eur" => Some("EUR"),
        _ => None,
    }
}
