// Canonical transaction shape shared by the ledger and the exporters

use chrono::NaiveDate;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Width of the payee field in the target finance software
pub const PAYEE_WIDTH: usize = 23;

/// Normalized, format-independent transaction.
/// Immutable once built: fields are only readable through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    date: NaiveDate,
    payer: String,
    amount: String,
    payee: String,
    memo: String,
}

/// The fields that decide whether two transactions are the same real-world
/// event. Payer is not part of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityKey<'a> {
    pub date: NaiveDate,
    pub amount: &'a str,
    pub payee: &'a str,
    pub memo: &'a str,
}

impl Transaction {
    /// Build from an already cleaned description, splitting it into
    /// payee/memo at `PAYEE_WIDTH` characters. Payer is left blank.
    pub fn new(date: NaiveDate, amount: impl Into<String>, description: &str) -> Self {
        let (payee, memo) = split_description(description);

        Transaction {
            date,
            payer: String::new(),
            amount: amount.into(),
            payee: payee.to_string(),
            memo: memo.to_string(),
        }
    }

    /// Rebuild from stored columns (ledger rows)
    pub(crate) fn from_parts(
        date: NaiveDate,
        payer: String,
        amount: String,
        payee: String,
        memo: String,
    ) -> Self {
        Transaction {
            date,
            payer,
            amount,
            payee,
            memo,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn payer(&self) -> &str {
        &self.payer
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn payee(&self) -> &str {
        &self.payee
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }

    /// Payee and memo joined back together, as the QIF `P` field wants it
    pub fn description(&self) -> String {
        format!("{}{}", self.payee, self.memo)
    }

    pub fn identity_key(&self) -> IdentityKey<'_> {
        IdentityKey {
            date: self.date,
            amount: &self.amount,
            payee: &self.payee,
            memo: &self.memo,
        }
    }

    /// Compute idempotency hash for duplicate detection.
    /// SHA-256 over the identity key; fields are separated by a unit
    /// separator so `("ab", "c")` and `("a", "bc")` hash differently.
    pub fn compute_idempotency_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{}\u{1f}{}\u{1f}{}\u{1f}{}",
            self.date, self.amount, self.payee, self.memo
        ));
        format!("{:x}", hasher.finalize())
    }
}

/// Split at the `PAYEE_WIDTH`th character. Not word aware.
fn split_description(description: &str) -> (&str, &str) {
    match description.char_indices().nth(PAYEE_WIDTH) {
        Some((byte_idx, _)) => description.split_at(byte_idx),
        None => (description, ""),
    }
}

/// First and last date of a batch, or None if it is empty
pub fn date_span(batch: &[Transaction]) -> Option<(NaiveDate, NaiveDate)> {
    let start = batch.iter().map(Transaction::date).min()?;
    let end = batch.iter().map(Transaction::date).max()?;
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    #[test]
    fn test_split_at_payee_width() {
        let tx = Transaction::new(day(5), "-4.5", "Coffee Shop Melbourne VIC");

        assert_eq!(tx.payee(), "Coffee Shop Melbourne V");
        assert_eq!(tx.memo(), "IC");
        assert_eq!(tx.payer(), "");
        assert_eq!(tx.description(), "Coffee Shop Melbourne VIC");
    }

    #[test]
    fn test_short_description_has_empty_memo() {
        let tx = Transaction::new(day(5), "-3", "Bakery");
        assert_eq!(tx.payee(), "Bakery");
        assert_eq!(tx.memo(), "");

        let exact = "A".repeat(PAYEE_WIDTH);
        let tx = Transaction::new(day(5), "-3", &exact);
        assert_eq!(tx.payee(), exact);
        assert_eq!(tx.memo(), "");
    }

    #[test]
    fn test_split_counts_characters_not_bytes() {
        let desc = "Café Crème Brûlée Société Générale";
        let tx = Transaction::new(day(5), "-12", desc);

        assert_eq!(tx.payee().chars().count(), PAYEE_WIDTH);
        assert_eq!(tx.description(), desc);
    }

    #[test]
    fn test_identity_ignores_nothing_but_payer() {
        let a = Transaction::new(day(5), "-4.5", "Coffee Shop");
        let b = Transaction::from_parts(
            day(5),
            "someone".to_string(),
            "-4.5".to_string(),
            "Coffee Shop".to_string(),
            String::new(),
        );
        let c = Transaction::new(day(6), "-4.5", "Coffee Shop");

        assert_eq!(a.identity_key(), b.identity_key());
        assert_eq!(a.compute_idempotency_hash(), b.compute_idempotency_hash());
        assert_ne!(a.compute_idempotency_hash(), c.compute_idempotency_hash());
        assert_eq!(a.compute_idempotency_hash().len(), 64);
    }

    #[test]
    fn test_hash_separates_fields() {
        let a = Transaction::from_parts(day(5), String::new(), "-1".into(), "ab".into(), "c".into());
        let b = Transaction::from_parts(day(5), String::new(), "-1".into(), "a".into(), "bc".into());

        assert_ne!(a.compute_idempotency_hash(), b.compute_idempotency_hash());
    }

    #[test]
    fn test_date_span_ignores_feed_order() {
        let batch = vec![
            Transaction::new(day(9), "-1", "b"),
            Transaction::new(day(2), "-1", "a"),
            Transaction::new(day(30), "-1", "c"),
        ];

        assert_eq!(date_span(&batch), Some((day(2), day(30))));
        assert_eq!(date_span(&[]), None);
    }
}
