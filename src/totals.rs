use crate::error::InvoiceError;
use crate::model::LineItem;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalSource {
    Computed,
    /// Supplied by the upstream record and printed as-is.
    Precomputed,
}

/// Invoice sums at full precision. Rounding happens when they are formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax_total: Decimal,
    pub grand_total: Decimal,
    pub source: TotalSource,
}

/// Fails with `InvalidInput` when a line or a sum does not fit a `Decimal`.
pub fn compute_totals(
    items: &[LineItem],
    precomputed_total: Option<Decimal>,
) -> Result<Totals, InvoiceError> {
    let mut subtotal = Decimal::ZERO;
    let mut tax_total = Decimal::ZERO;
    for (index, item) in items.iter().enumerate() {
        let line = index + 1;
        let amount = item.amount().ok_or_else(|| out_of_range(&format!("item {line}: amount")))?;
        let tax = item
            .tax_amount()
            .ok_or_else(|| out_of_range(&format!("item {line}: tax")))?;
        subtotal = subtotal
            .checked_add(amount)
            .ok_or_else(|| out_of_range("subtotal"))?;
        tax_total = tax_total
            .checked_add(tax)
            .ok_or_else(|| out_of_range("tax total"))?;
    }
    let totals = match precomputed_total {
        Some(total) => Totals {
            subtotal,
            tax_total,
            grand_total: total,
            source: TotalSource::Precomputed,
        },
        None => Totals {
            subtotal,
            tax_total,
            grand_total: subtotal
                .checked_add(tax_total)
                .ok_or_else(|| out_of_range("grand total"))?,
            source: TotalSource::Computed,
        },
    };
    Ok(totals)
}

fn out_of_range(what: &str) -> InvoiceError {
    InvoiceError::InvalidInput(format!("{what} out of range"))
}
