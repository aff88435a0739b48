//! WooCommerce product pages.
//!
//! The displayed price sits in `.woocommerce-Price-amount` elements; the
//! first one carrying a recognizable price + currency wins. Weight is scanned
//! from the whole page text ("15 kg", "975 kg").

use once_cell::sync::OnceCell;
use regex::Regex;
use scraper::{Html, Selector};

use super::{find_price, normalize_text, parse_decimal_pl, PriceQuote};
use crate::record::ParseFailure;

pub fn extract(body: &str) -> Result<PriceQuote, ParseFailure> {
    let doc = Html::parse_document(body);

    static SEL: OnceCell<Selector> = OnceCell::new();
    let sel = SEL.get_or_init(|| Selector::parse(".woocommerce-Price-amount").unwrap());

    let mut unmatched_amount: Option<String> = None;
    for node in doc.select(sel) {
        let raw = normalize_text(&node.text().collect::<Vec<_>>().join(" "));
        if raw.is_empty() {
            continue;
        }
        match find_price(&raw) {
            Some((price, currency, raw_price)) => {
                return Ok(PriceQuote {
                    price,
                    currency,
                    weight_kg: page_weight_kg(&doc),
                    raw_price,
                    method: "woocommerce",
                });
            }
            None => {
                unmatched_amount.get_or_insert(raw);
            }
        }
    }

    match unmatched_amount {
        Some(raw) => Err(ParseFailure::UnknownCurrency(raw)),
        None => Err(ParseFailure::MissingPrice),
    }
}

fn page_weight_kg(doc: &Html) -> Option<f64> {
    let text = normalize_text(&doc.root_element().text().collect::<Vec<_>>().join(" "));
    static RE_KG: OnceCell<Regex> = OnceCell::new();
    let re = RE_KG.get_or_init(|| Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*kg\b").unwrap());
    parse_decimal_pl(re.captures(&text)?.get(1)?.as_str())
}
