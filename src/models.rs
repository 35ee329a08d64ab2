//! Domain models and data structures
//!
//! Wire types exchanged with callers and with the gateway, plus the
//! message-classification table that turns the gateway's free-text status
//! into a [`TransactionStatus`].

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PaymentError;

/// Phrases that mark a status message as final. Compared after [`fold_message`].
pub const TERMINAL_PHRASES: [&str; 3] = [
    SUCCESS_PHRASE_FR,
    SUCCESS_PHRASE_EN,
    CANCELLED_PHRASE,
];

const SUCCESS_PHRASE_FR: &str = "transaction a ete effectue avec succes";
const SUCCESS_PHRASE_EN: &str = "your transaction has been successfully processed";
const CANCELLED_PHRASE: &str = "transaction a ete annulee avec succes";

/// Validated debit request from a caller.
#[derive(Debug, Clone, PartialEq)]
pub struct DebitRequest {
    /// Subscriber number to debit.
    pub numero: String,
    pub amount: Decimal,
}

impl DebitRequest {
    /// Parse a raw request body.
    ///
    /// Anything that does not yield a non-empty `numero` and a positive
    /// `amount` is reported as [`PaymentError::MissingParameters`].
    pub fn from_body(body: &[u8]) -> Result<Self, PaymentError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|_| PaymentError::MissingParameters)?;

        let numero = match value.get("numero") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => match n.as_u64() {
                Some(number) if number != 0 => number.to_string(),
                _ => return Err(PaymentError::MissingParameters),
            },
            _ => return Err(PaymentError::MissingParameters),
        };

        let amount = match value.get("amount") {
            Some(Value::Number(n)) => parse_decimal(&n.to_string()),
            Some(Value::String(s)) => parse_decimal(s.trim()),
            _ => None,
        }
        .filter(|amount| amount.is_sign_positive() && !amount.is_zero())
        .ok_or(PaymentError::MissingParameters)?;

        Ok(Self { numero, amount })
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// Debit payload submitted to the gateway.
///
/// `amount` goes out as a JSON number with the caller's digits and scale.
#[derive(Debug, Serialize)]
pub struct DebitPayload {
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    pub reference: String,
    pub client_msisdn: String,
    pub portefeuille: String,
    pub disbursement: String,
    #[serde(rename = "isTransfer")]
    pub is_transfer: bool,
}

/// Identity the gateway assigned to an accepted debit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayTransaction {
    pub transaction_id: String,
    pub reference: String,
}

/// Extract `transaction.id` from a submission response body.
///
/// Numeric ids are accepted and rendered as strings.
pub fn submitted_transaction_id(body: &Value) -> Option<String> {
    match body.pointer("/transaction/id")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// Extract `status.message` from a status response body.
pub fn status_message(body: &Value) -> Option<&str> {
    body.pointer("/status/message")?.as_str()
}

/// Body of every `/payment` response.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentResponse {
    pub status_message: String,
}

/// Lower-case a gateway message and strip French diacritics so phrase
/// matching does not depend on accents or case.
pub fn fold_message(message: &str) -> String {
    message
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' => 'i',
            'ô' | 'ö' => 'o',
            'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            '\u{2019}' => '\'',
            other => other,
        })
        .collect()
}

/// True when the message says the transaction will not change any more.
pub fn is_terminal_message(message: &str) -> bool {
    let folded = fold_message(message);
    TERMINAL_PHRASES.iter().any(|phrase| folded.contains(phrase))
}

/// Business outcome of a debit, as read from its final status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransactionStatus {
    SuccessfulTransaction,
    InsufficientBalance,
    IncorrectPin,
    InvalidPinLength,
    CancelledTransaction,
    UnableToGetTransactionStatus,
    Other,
}

impl TransactionStatus {
    /// Classify a status message. Rules are tried in order and the first
    /// match wins; unrecognised messages are [`TransactionStatus::Other`].
    pub fn classify(message: &str) -> Self {
        const RULES: &[(&[&str], TransactionStatus)] = &[
            (&["invalid pin length"], TransactionStatus::InvalidPinLength),
            (&["solde insuffisant"], TransactionStatus::InsufficientBalance),
            (&["incorrect pin"], TransactionStatus::IncorrectPin),
            (
                &[SUCCESS_PHRASE_FR, SUCCESS_PHRASE_EN],
                TransactionStatus::SuccessfulTransaction,
            ),
            (&[CANCELLED_PHRASE], TransactionStatus::CancelledTransaction),
            (
                &["impossible d'obtenir le statut"],
                TransactionStatus::UnableToGetTransactionStatus,
            ),
        ];

        let folded = fold_message(message);
        RULES
            .iter()
            .find(|(needles, _)| needles.iter().any(|needle| folded.contains(needle)))
            .map(|(_, status)| *status)
            .unwrap_or(TransactionStatus::Other)
    }
}
