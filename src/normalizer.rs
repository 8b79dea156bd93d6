// 🏗️ Transaction Normalizer
// One raw portal record → one canonical Transaction

use crate::dates;
use crate::error::NormalizeError;
use crate::transaction::Transaction;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Transaction type the portal uses for money coming back onto the card
pub const CREDIT_TYPE: &str = "CREDIT";

// ============================================================================
// RAW FEED TYPES
// ============================================================================

/// RawTransaction - one entry of the `transactions` array in a captured
/// response body. Every field is optional at this layer so that a missing
/// field surfaces as a `NormalizeError` for that record instead of failing
/// the whole payload. A field of the wrong JSON type (`"amount": true`)
/// cannot be represented here and fails the body at the source, which
/// reports the record's position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    #[serde(default)]
    pub transaction_date: Option<String>,

    #[serde(default)]
    pub merchant: Option<RawMerchant>,

    #[serde(default)]
    pub amount: Option<RawAmount>,

    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMerchant {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub subtitle: Option<String>,
}

/// The feed sends amounts either as JSON numbers (`4.5`) or strings
/// (`"$4.50"`, `"1,204.00"`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(serde_json::Number),
    Text(String),
}

impl RawAmount {
    fn as_text(&self) -> String {
        match self {
            RawAmount::Number(n) => n.to_string(),
            RawAmount::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for RawAmount {
    fn from(s: &str) -> Self {
        RawAmount::Text(s.to_string())
    }
}

impl RawTransaction {
    pub fn new(
        transaction_date: &str,
        title: &str,
        subtitle: &str,
        amount: impl Into<RawAmount>,
        kind: &str,
    ) -> Self {
        RawTransaction {
            transaction_date: Some(transaction_date.to_string()),
            merchant: Some(RawMerchant {
                title: Some(title.to_string()),
                subtitle: Some(subtitle.to_string()),
            }),
            amount: Some(amount.into()),
            kind: Some(kind.to_string()),
        }
    }

    pub fn is_credit(&self) -> bool {
        self.kind.as_deref() == Some(CREDIT_TYPE)
    }
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Map one raw record to a `Transaction`.
///
/// Pure: the result depends on `raw` only.
/// - description = `title + " " + subtitle`, whitespace runs collapsed, trimmed
/// - amount negated unless the type is `CREDIT`, currency symbol dropped
/// - payee/memo split at 23 characters
pub fn normalize(raw: &RawTransaction) -> Result<Transaction, NormalizeError> {
    let date_str = raw
        .transaction_date
        .as_deref()
        .ok_or(NormalizeError::MissingField("transaction_date"))?;
    let date = dates::parse(date_str)?;

    let merchant = raw
        .merchant
        .as_ref()
        .ok_or(NormalizeError::MissingField("merchant"))?;
    let title = merchant
        .title
        .as_deref()
        .ok_or(NormalizeError::MissingField("merchant.title"))?;
    let subtitle = merchant.subtitle.as_deref().unwrap_or("");
    let description = collapse_whitespace(&format!("{} {}", title, subtitle));

    let amount = raw
        .amount
        .as_ref()
        .ok_or(NormalizeError::MissingField("amount"))?;
    let amount = parse_amount(&amount.as_text())?;

    if raw.kind.is_none() {
        return Err(NormalizeError::MissingField("type"));
    }
    let signed = if raw.is_credit() { amount } else { -amount };

    Ok(Transaction::new(date, render_amount(signed), &description))
}

/// Collapse spaces, tabs and newlines into single spaces and trim the ends
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_currency_symbol(c: char) -> bool {
    matches!(c, '$' | '€' | '£' | '¥')
}

/// Parse `"$1,204.50"`, `"-4.5"`, `"A$4.50"`, `"4.50 AUD"` and friends.
///
/// Dropped before parsing: whitespace, thousands commas, the symbols
/// `$ € £ ¥`, and letters before or after the number (`A`, `AU`, `AUD`).
fn parse_amount(raw: &str) -> Result<Decimal, NormalizeError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !(c.is_whitespace() || *c == ',' || is_currency_symbol(*c)))
        .collect();

    let (sign, rest) = match cleaned.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", cleaned.as_str()),
    };
    let number = format!("{}{}", sign, rest.trim_matches(|c: char| c.is_ascii_alphabetic()));

    Decimal::from_str(&number)
        .or_else(|_| Decimal::from_scientific(&number))
        .map_err(|_| NormalizeError::Amount(raw.to_string()))
}

/// Trailing zeros dropped, `-0` rendered as `0`
fn render_amount(amount: Decimal) -> String {
    amount.normalize().to_string()
}
