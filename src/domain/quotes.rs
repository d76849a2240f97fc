use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed validity window applied to every compiled quote.
pub const QUOTE_VALIDITY_DAYS: i64 = 30;

/// One priced line of a quote, mirroring an accepted segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteLineItem {
    pub segment_id: Uuid,
    pub description: String,
    pub amount: Decimal,
}

/// One tax line applied on top of the subtotal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxLine {
    pub label: String,
    pub amount: Decimal,
}

/// Request DTO for compiling a quote from accepted segments
#[derive(Debug, Clone, Deserialize)]
pub struct CompileQuoteRequest {
    pub currency: String,
    pub line_items: Vec<QuoteLineItem>,
    pub subtotal: Decimal,
    #[serde(default)]
    pub taxes: Vec<TaxLine>,
    pub total: Decimal,
    #[serde(default)]
    pub terms: Option<String>,
}

/// Response DTO for a compiled quote. Round-trips through the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub id: Uuid,
    pub rfq_id: Uuid,
    pub agency_id: Uuid,
    pub currency: String,
    pub line_items: Vec<QuoteLineItem>,
    pub subtotal: Decimal,
    pub taxes: Vec<TaxLine>,
    pub tax_total: Decimal,
    pub total: Decimal,
    pub valid_until: Option<DateTime<Utc>>,
    pub terms: Option<String>,
    pub prepared_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A 3-letter alphabetic currency code.
pub fn valid_currency(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

/// Checked sum of the tax lines. `None` when the sum leaves `Decimal` range.
pub fn tax_total(taxes: &[TaxLine]) -> Option<Decimal> {
    taxes
        .iter()
        .try_fold(Decimal::ZERO, |acc, t| acc.checked_add(t.amount))
}

/// Arithmetic checks on a compile request: at least one positive line item,
/// non-negative taxes, subtotal = sum of items, total = subtotal + taxes.
/// Sums that overflow `Decimal` fail validation.
pub fn verify_totals(
    line_items: &[QuoteLineItem],
    taxes: &[TaxLine],
    subtotal: Decimal,
    total: Decimal,
) -> Result<(), String> {
    let overflow = || "quote amounts exceed the supported numeric range".to_string();

    if line_items.is_empty() {
        return Err("quote must contain at least one line item".into());
    }

    for item in line_items {
        if item.amount <= Decimal::ZERO {
            return Err(format!(
                "line item amount must be positive (segment {})",
                item.segment_id
            ));
        }
    }

    for tax in taxes {
        if tax.amount < Decimal::ZERO {
            return Err(format!("tax line '{}' must not be negative", tax.label));
        }
    }

    let item_sum = line_items
        .iter()
        .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.amount))
        .ok_or_else(overflow)?;
    if item_sum != subtotal {
        return Err(format!(
            "subtotal {} does not match line item sum {}",
            subtotal, item_sum
        ));
    }

    let expected_total = tax_total(taxes)
        .and_then(|tax_sum| subtotal.checked_add(tax_sum))
        .ok_or_else(overflow)?;
    if expected_total != total {
        return Err(format!(
            "total {} does not match subtotal plus taxes {}",
            total, expected_total
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(amount: Decimal) -> QuoteLineItem {
        QuoteLineItem {
            segment_id: Uuid::new_v4(),
            description: "segment".into(),
            amount,
        }
    }

    #[test]
    fn matching_totals_pass() {
        let items = vec![item(Decimal::new(10000, 2)), item(Decimal::new(5050, 2))];
        let taxes = vec![TaxLine {
            label: "VAT".into(),
            amount: Decimal::new(1505, 2),
        }];

        // 100.00 + 50.50 = 150.50; + 15.05 tax = 165.55
        assert!(verify_totals(
            &items,
            &taxes,
            Decimal::new(15050, 2),
            Decimal::new(16555, 2)
        )
        .is_ok());
    }

    #[test]
    fn no_taxes_means_total_equals_subtotal() {
        let items = vec![item(Decimal::new(7500, 2))];
        assert!(verify_totals(&items, &[], Decimal::new(7500, 2), Decimal::new(7500, 2)).is_ok());
        assert!(verify_totals(&items, &[], Decimal::new(7500, 2), Decimal::new(7600, 2)).is_err());
    }

    #[test]
    fn empty_line_items_rejected() {
        assert!(verify_totals(&[], &[], Decimal::ZERO, Decimal::ZERO).is_err());
    }

    #[test]
    fn non_positive_line_amounts_rejected() {
        let items = vec![item(Decimal::ZERO)];
        assert!(verify_totals(&items, &[], Decimal::ZERO, Decimal::ZERO).is_err());

        let items = vec![item(Decimal::new(-100, 2))];
        assert!(verify_totals(&items, &[], Decimal::new(-100, 2), Decimal::new(-100, 2)).is_err());
    }

    #[test]
    fn negative_tax_rejected() {
        let items = vec![item(Decimal::new(1000, 2))];
        let taxes = vec![TaxLine {
            label: "rebate".into(),
            amount: Decimal::new(-100, 2),
        }];
        assert!(verify_totals(&items, &taxes, Decimal::new(1000, 2), Decimal::new(900, 2)).is_err());
    }

    #[test]
    fn subtotal_mismatch_rejected() {
        let items = vec![item(Decimal::new(1000, 2))];
        assert!(verify_totals(&items, &[], Decimal::new(1100, 2), Decimal::new(1100, 2)).is_err());
    }

    #[test]
    fn total_mismatch_rejected() {
        let items = vec![item(Decimal::new(1000, 2))];
        let taxes = vec![TaxLine {
            label: "VAT".into(),
            amount: Decimal::new(100, 2),
        }];
        assert!(verify_totals(&items, &taxes, Decimal::new(1000, 2), Decimal::new(1200, 2)).is_err());
    }

    #[test]
    fn currency_must_be_three_ascii_letters() {
        assert!(valid_currency("USD"));
        assert!(valid_currency("eur"));
        assert!(!valid_currency("US"));
        assert!(!valid_currency("USDT"));
        assert!(!valid_currency("U5D"));
        assert!(!valid_currency(""));
    }

    #[test]
    fn tax_total_sums_lines() {
        let taxes = vec![
            TaxLine {
                label: "VAT".into(),
                amount: Decimal::new(500, 2),
            },
            TaxLine {
                label: "city tax".into(),
                amount: Decimal::new(250, 2),
            },
        ];
        assert_eq!(tax_total(&taxes), Some(Decimal::new(750, 2)));
        assert_eq!(tax_total(&[]), Some(Decimal::ZERO));
    }

    #[test]
    fn amounts_past_decimal_range_are_rejected() {
        // Two max-magnitude items overflow the item sum.
        let items = vec![item(Decimal::MAX), item(Decimal::MAX)];
        let err = verify_totals(&items, &[], Decimal::MAX, Decimal::MAX).unwrap_err();
        assert!(err.contains("numeric range"));

        // The tax sum overflows on its own.
        let taxes = vec![
            TaxLine {
                label: "VAT".into(),
                amount: Decimal::MAX,
            },
            TaxLine {
                label: "levy".into(),
                amount: Decimal::MAX,
            },
        ];
        assert_eq!(tax_total(&taxes), None);

        // Items and taxes fit individually but subtotal + taxes does not.
        let items = vec![item(Decimal::MAX)];
        let taxes = vec![TaxLine {
            label: "VAT".into(),
            amount: Decimal::MAX,
        }];
        let err = verify_totals(&items, &taxes, Decimal::MAX, Decimal::MAX).unwrap_err();
        assert!(err.contains("numeric range"));
    }
}
