//! Offer pages whose price sits in running text rather than a stable element.
//!
//! Handles copy of the form "Cena regularna 975 kg z VAT ... 1 845,00 zł".
//! Everything from the related-products section on is ignored so a cheaper
//! related item can never shadow the product's own price.

use once_cell::sync::OnceCell;
use regex::Regex;
use scraper::Html;

use super::{find_price, normalize_text, parse_decimal_pl, PriceQuote};
use crate::record::ParseFailure;

pub fn extract(body: &str) -> Result<PriceQuote, ParseFailure> {
    let doc = Html::parse_document(related_cutoff(body));
    let text = normalize_text(&doc.root_element().text().collect::<Vec<_>>().join(" "));
    if text.is_empty() {
        return Err(ParseFailure::EmptyDocument);
    }

    let (price, currency, raw_price) = match find_price(&text) {
        Some(found) => found,
        None => return Err(missing_or_unknown(&text)),
    };

    Ok(PriceQuote {
        price,
        currency,
        weight_kg: regular_weight_kg(&text),
        raw_price,
        method: "offer_text",
    })
}

fn related_cutoff(body: &str) -> &str {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| Regex::new(r"(?i)Produkty\s+powi[aą]zane").unwrap());
    match re.find(body) {
        Some(m) => &body[..m.start()],
        None => body,
    }
}

/// Weight stated next to the regular-price label, with a plain "N kg" scan
/// as fallback.
fn regular_weight_kg(text: &str) -> Option<f64> {
    static RE_LABELED: OnceCell<Regex> = OnceCell::new();
    let labeled = RE_LABELED
        .get_or_init(|| Regex::new(r"(?i)Cena\s+regularna.*?(\d+(?:[.,]\d+)?)\s*kg\b").unwrap());
    if let Some(caps) = labeled.captures(text) {
        return parse_decimal_pl(caps.get(1)?.as_str());
    }

    static RE_PLAIN: OnceCell<Regex> = OnceCell::new();
    let plain = RE_PLAIN.get_or_init(|| Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*kg\b").unwrap());
    parse_decimal_pl(plain.captures(text)?.get(1)?.as_str())
}

/// A decimal amount followed by some token means the page does show a price,
/// just not in a currency this tool recognizes.
fn missing_or_unknown(text: &str) -> ParseFailure {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| Regex::new(r"\d[\d\s]*[,.]\d{2}\s*\S{1,4}").unwrap());
    match re.find(text) {
        Some(m) => ParseFailure::UnknownCurrency(m.as_str().to_string()),
        None => ParseFailure::MissingPrice,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn related_products_section_is_cut() {
        let body = "<p>Cena regularna 975 kg</p><p>1 845,00 zł</p>\
                    <h2>Produkty powiązane</h2><p>99,00 zł</p>";
        let quote = extract(body).unwrap();
        assert_eq!(quote.price, 1845.0);
        assert_eq!(quote.weight_kg, Some(975.0));
    }

    #[test]
    fn price_before_related_section_is_kept_when_no_weight_label() {
        let body = "<p>Paleta 975 kg</p><p>1 845,00 zł</p>";
        let quote = extract(body).unwrap();
        assert_eq!(quote.price, 1845.0);
        assert_eq!(quote.weight_kg, Some(975.0));
        assert_eq!(quote.currency, "PLN");
    }

    #[test]
    fn unknown_currency_is_distinguished_from_missing_price() {
        let unknown = extract("<p>Cena 123,45 USD</p>").unwrap_err();
        assert!(matches!(unknown, ParseFailure::UnknownCurrency(_)));

        let missing = extract("<p>Zapytaj o cenę</p>").unwrap_err();
        assert_eq!(missing, ParseFailure::MissingPrice);
    }
}
