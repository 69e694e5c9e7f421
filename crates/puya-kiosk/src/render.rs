//! Text and JSON rendering of lookup outcomes.

use puya_lookup::{LookupOutcome, ProductRecord};

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Render an outcome in the requested format. JSON is a single line.
pub fn render(outcome: &LookupOutcome, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(outcome)),
        OutputFormat::Json => serde_json::to_string(outcome),
    }
}

pub fn render_text(outcome: &LookupOutcome) -> String {
    match outcome {
        LookupOutcome::Found { product } => render_product(product),
        LookupOutcome::NotFound => "Product not found".to_string(),
        LookupOutcome::AuthenticationFailed { message } => {
            format!("Authentication failed: {message}")
        }
        LookupOutcome::TransportError { message } => format!("Lookup failed: {message}"),
    }
}

/// Name, price and stock, one per line.
pub fn render_product(product: &ProductRecord) -> String {
    let mut lines = Vec::with_capacity(4);
    if !product.name.is_empty() {
        lines.push(product.name.clone());
    }
    lines.push(format!("Price: {}", format_price(product.list_price)));
    lines.push(format!("Stock: {}", format_stock(product.available_quantity)));
    if !product.internal_code.is_empty() {
        lines.push(format!("Code:  {}", product.internal_code));
    }
    lines.join("\n")
}

/// `$1,234.50`
pub fn format_price(value: f64) -> String {
    format!("${}", group_thousands(value, 2))
}

/// `1,234 units`
pub fn format_stock(value: f64) -> String {
    let formatted = group_thousands(value, 0);
    if formatted == "1" {
        "1 unit".to_string()
    } else {
        format!("{formatted} units")
    }
}

/// Fixed-point formatting with `,` between groups of three integer digits.
pub fn group_thousands(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 4);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }

    let is_zero = fixed.chars().all(|c| c == '0' || c == '.');
    if value.is_sign_negative() && !is_zero {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arroz() -> ProductRecord {
        ProductRecord {
            name: "Arroz 1kg".to_string(),
            list_price: 2.5,
            barcode: "7501234567890".to_string(),
            internal_code: "AR-001".to_string(),
            available_quantity: 42.0,
        }
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0.0, 2), "0.00");
        assert_eq!(group_thousands(999.0, 0), "999");
        assert_eq!(group_thousands(1234.5, 2), "1,234.50");
        assert_eq!(group_thousands(1234567.891, 2), "1,234,567.89");
        assert_eq!(group_thousands(-1500.0, 0), "-1,500");
        assert_eq!(group_thousands(-0.001, 2), "0.00");
    }

    #[test]
    fn test_price_and_stock() {
        assert_eq!(format_price(2.5), "$2.50");
        assert_eq!(format_price(12500.0), "$12,500.00");
        assert_eq!(format_stock(42.0), "42 units");
        assert_eq!(format_stock(1.0), "1 unit");
        assert_eq!(format_stock(1499.6), "1,500 units");
    }

    #[test]
    fn test_render_found() {
        let text = render_text(&LookupOutcome::Found { product: arroz() });
        assert_eq!(
            text,
            "Arroz 1kg\nPrice: $2.50\nStock: 42 units\nCode:  AR-001"
        );
    }

    #[test]
    fn test_render_errors_verbatim() {
        assert_eq!(render_text(&LookupOutcome::NotFound), "Product not found");
        assert_eq!(
            render_text(&LookupOutcome::TransportError {
                message: "HTTP status 502".to_string()
            }),
            "Lookup failed: HTTP status 502"
        );
    }

    #[test]
    fn test_render_json() {
        let json = render(&LookupOutcome::Found { product: arroz() }, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["outcome"], "found");
        assert_eq!(value["product"]["name"], "Arroz 1kg");
        assert!(!json.contains('\n'));
    }
}
