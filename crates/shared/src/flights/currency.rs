use serde_json::Value;

/// Rewrites each offer's `price.total` (and `price.grandTotal` when
/// present) by a fixed multiplicative rate and stamps the target
/// currency tag. An offer whose price is missing or non-numeric is left
/// untouched rather than failing the batch.
pub fn convert_offer_prices(offers: &mut [Value], rate: f64, currency_tag: &str) {
    for offer in offers.iter_mut() {
        let Some(price) = offer.get_mut("price").and_then(Value::as_object_mut) else {
            continue;
        };
        let Some(total) = price.get("total").and_then(numeric_value) else {
            continue;
        };

        price.insert(
            "total".to_string(),
            Value::String(format!("{:.2}", total * rate)),
        );
        price.insert(
            "currency".to_string(),
            Value::String(currency_tag.to_string()),
        );

        if let Some(grand_total) = price.get("grandTotal").and_then(numeric_value) {
            price.insert(
                "grandTotal".to_string(),
                Value::String(format!("{:.2}", grand_total * rate)),
            );
        }
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    }
}
