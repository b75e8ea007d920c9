use crate::error::InvoiceError;
use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Printed when the upstream record carries no invoice number.
pub const FALLBACK_INVOICE_NUMBER: &str = "INV-0000";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceData {
    #[serde(default)]
    pub invoice_number: String,
    #[serde(deserialize_with = "deserialize_date")]
    pub issue_date: NaiveDate,
    #[serde(deserialize_with = "deserialize_date")]
    pub due_date: NaiveDate,
    #[serde(default, alias = "client_id")]
    pub client: Option<Client>,
    pub items: Vec<LineItem>,
    #[serde(default, alias = "total")]
    pub precomputed_total: Option<Decimal>,
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: Decimal,
    pub rate: Decimal,
    #[serde(default)]
    pub tax_rate: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn label(self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "DRAFT",
            InvoiceStatus::Sent => "SENT",
            InvoiceStatus::Pending => "PENDING",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Overdue => "OVERDUE",
            InvoiceStatus::Cancelled => "CANCELLED",
        }
    }
}

/// The business issuing the invoice, printed under the title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuer {
    pub name: String,
    #[serde(default)]
    pub address_lines: Vec<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Default for Issuer {
    fn default() -> Self {
        Self {
            name: "My Company Name".to_string(),
            address_lines: vec![
                "123 Business Rd".to_string(),
                "City, State, Zip".to_string(),
            ],
            email: Some("contact@mycompany.com".to_string()),
        }
    }
}

impl LineItem {
    pub fn new(
        description: impl Into<String>,
        quantity: Decimal,
        rate: Decimal,
        tax_rate: Decimal,
    ) -> Self {
        Self {
            description: description.into(),
            quantity,
            rate,
            tax_rate,
        }
    }

    /// `quantity * rate` at full precision, or `None` when it does not fit a
    /// `Decimal`.
    pub fn amount(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.rate)
    }

    /// Tax owed on this line at full precision. The percentage is scaled
    /// down first so the product only overflows when the tax itself does.
    pub fn tax_amount(&self) -> Option<Decimal> {
        let fraction = self.tax_rate.checked_div(Decimal::ONE_HUNDRED)?;
        self.amount()?.checked_mul(fraction)
    }
}

impl InvoiceData {
    /// Decodes the REST payload and checks it is structurally printable.
    pub fn from_json(payload: &str) -> Result<Self, InvoiceError> {
        let invoice: InvoiceData = serde_json::from_str(payload)
            .map_err(|err| InvoiceError::InvalidInput(format!("malformed payload: {err}")))?;
        invoice.validate()?;
        Ok(invoice)
    }

    pub fn display_number(&self) -> &str {
        let trimmed = self.invoice_number.trim();
        if trimmed.is_empty() {
            FALLBACK_INVOICE_NUMBER
        } else {
            trimmed
        }
    }

    /// Structural checks only; business rules belong to the upstream system.
    /// Every problem found is reported in a single error.
    pub fn validate(&self) -> Result<(), InvoiceError> {
        let mut problems: Vec<String> = Vec::new();
        match &self.client {
            None => problems.push("client is missing".to_string()),
            Some(client) if client.name.trim().is_empty() => {
                problems.push("client name is empty".to_string())
            }
            Some(_) => {}
        }
        for (index, item) in self.items.iter().enumerate() {
            let line = index + 1;
            if item.description.trim().is_empty() {
                problems.push(format!("item {line}: description is empty"));
            }
            if item.quantity <= Decimal::ZERO {
                problems.push(format!(
                    "item {line}: quantity must be greater than zero (got {})",
                    item.quantity
                ));
            }
            if item.rate < Decimal::ZERO {
                problems.push(format!(
                    "item {line}: rate cannot be negative (got {})",
                    item.rate
                ));
            }
            if item.tax_rate < Decimal::ZERO {
                problems.push(format!(
                    "item {line}: tax rate cannot be negative (got {})",
                    item.tax_rate
                ));
            }
            if item.amount().is_none() || item.tax_amount().is_none() {
                problems.push(format!("item {line}: amount out of range"));
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(InvoiceError::InvalidInput(problems.join("; ")))
        }
    }
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date {raw:?}")))
}

/// Accepts `2024-01-15` as well as full RFC 3339 timestamps, keeping only the
/// calendar date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|stamp| stamp.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;

    const PAYLOAD: &str = r#"{
        "_id": "65a4f0",
        "invoice_number": "INV-1705312800000",
        "issue_date": "2024-01-15T00:00:00.000Z",
        "due_date": "2024-01-30",
        "status": "sent",
        "total": 270,
        "client_id": {
            "_id": "c1",
            "name": "Acme Traders",
            "email": "billing@acme.test"
        },
        "items": [
            { "description": "Consulting", "quantity": 2, "rate": 100, "tax_rate": 10 },
            { "description": "Support", "quantity": "1.5", "rate": 50.25 }
        ]
    }"#;

    #[test]
    fn decodes_rest_payload_shape() {
        let invoice = InvoiceData::from_json(PAYLOAD).expect("payload decodes");
        assert_eq!(invoice.invoice_number, "INV-1705312800000");
        assert_eq!(
            invoice.issue_date,
            NaiveDate::from_ymd_opt(2024, 1, 15).expect("date")
        );
        assert_eq!(
            invoice.due_date,
            NaiveDate::from_ymd_opt(2024, 1, 30).expect("date")
        );
        assert_eq!(invoice.status, Some(InvoiceStatus::Sent));
        assert_eq!(invoice.precomputed_total, Some(Decimal::from(270)));
        let client = invoice.client.as_ref().expect("client");
        assert_eq!(client.name, "Acme Traders");
        assert_eq!(client.address, None);
        assert_eq!(invoice.items.len(), 2);
        assert_eq!(invoice.items[1].quantity, Decimal::new(15, 1));
        assert_eq!(invoice.items[1].tax_rate, Decimal::ZERO);
        assert_eq!(invoice.items[0].amount(), Some(Decimal::from(200)));
        assert_eq!(invoice.items[0].tax_amount(), Some(Decimal::from(20)));
    }

    #[test]
    fn missing_items_is_an_input_error() {
        let err = InvoiceData::from_json(
            r#"{"invoice_number":"A","issue_date":"2024-01-01","due_date":"2024-01-02","client":{"name":"X"}}"#,
        )
        .expect_err("items are required");
        assert_eq!(err.class(), ErrorClass::Input);
        assert!(err.to_string().contains("items"));
    }

    #[test]
    fn unparseable_date_is_an_input_error() {
        let err = InvoiceData::from_json(
            r#"{"issue_date":"15/01/2024","due_date":"2024-01-02","client":{"name":"X"},"items":[]}"#,
        )
        .expect_err("date format");
        assert!(matches!(err, InvoiceError::InvalidInput(_)));
        assert!(err.to_string().contains("15/01/2024"));
    }

    #[test]
    fn validation_reports_every_problem_at_once() {
        let invoice = InvoiceData {
            invoice_number: "INV-1".to_string(),
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"),
            due_date: NaiveDate::from_ymd_opt(2024, 1, 31).expect("date"),
            client: None,
            items: vec![
                LineItem::new("  ", Decimal::ONE, Decimal::ONE, Decimal::ZERO),
                LineItem::new("Ok", Decimal::ZERO, Decimal::ONE, Decimal::ZERO),
                LineItem::new("Neg", Decimal::ONE, Decimal::NEGATIVE_ONE, Decimal::ZERO),
            ],
            precomputed_total: None,
            status: None,
        };
        let message = invoice.validate().expect_err("invalid").to_string();
        assert!(message.contains("client is missing"));
        assert!(message.contains("item 1: description is empty"));
        assert!(message.contains("item 2: quantity must be greater than zero"));
        assert!(message.contains("item 3: rate cannot be negative"));
    }

    #[test]
    fn oversized_amounts_are_rejected_instead_of_overflowing() {
        let mut invoice = InvoiceData::from_json(PAYLOAD).expect("payload decodes");
        invoice.items = vec![LineItem::new(
            "Bulk",
            Decimal::MAX,
            Decimal::from(2),
            Decimal::ZERO,
        )];
        assert_eq!(invoice.items[0].amount(), None);
        let err = invoice.validate().expect_err("overflow");
        assert!(matches!(err, InvoiceError::InvalidInput(_)));
        assert!(err.to_string().contains("item 1: amount out of range"));
    }

    #[test]
    fn full_rate_tax_on_a_large_amount_fits() {
        let large = Decimal::from_i128_with_scale(10i128.pow(27), 0);
        let item = LineItem::new("Bulk", large, Decimal::ONE, Decimal::ONE_HUNDRED);
        assert_eq!(item.tax_amount(), Some(large));
    }

    #[test]
    fn blank_client_name_is_rejected() {
        let mut invoice = InvoiceData::from_json(PAYLOAD).expect("payload decodes");
        invoice.client = Some(Client {
            name: " ".to_string(),
            email: None,
            address: None,
        });
        assert!(invoice.validate().is_err());
    }

    #[test]
    fn blank_number_falls_back_for_display() {
        let mut invoice = InvoiceData::from_json(PAYLOAD).expect("payload decodes");
        invoice.invoice_number = "   ".to_string();
        assert_eq!(invoice.display_number(), FALLBACK_INVOICE_NUMBER);
    }

    #[test]
    fn parse_date_accepts_offsets() {
        assert_eq!(
            parse_date("2024-03-01T23:30:00+05:30"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(parse_date("not a date"), None);
    }
}
