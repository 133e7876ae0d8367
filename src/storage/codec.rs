//! Tagged JSON codec for transaction lists.
//!
//! Each persisted transaction is an envelope of the form
//! `{"CLASSNAME": "...", "INSTANCE": {...}}`; the payload field names are
//! camelCase on disk for compatibility with existing account files.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{BankError, Result};
use crate::transaction::{Payment, Transaction, Transfer};

const TAG_FIELD: &str = "CLASSNAME";
const DATA_FIELD: &str = "INSTANCE";

const TAG_PAYMENT: &str = "Payment";
const TAG_INCOMING: &str = "IncomingTransfer";
const TAG_OUTGOING: &str = "OutgoingTransfer";

#[derive(Serialize, Deserialize)]
struct TaggedRecord {
    #[serde(rename = "CLASSNAME")]
    tag: String,
    #[serde(rename = "INSTANCE")]
    data: Value,
}

#[derive(Serialize, Deserialize)]
struct PaymentRecord {
    date: String,
    amount: f64,
    description: String,
    #[serde(rename = "incomingInterest")]
    incoming_interest: f64,
    #[serde(rename = "outgoingInterest")]
    outgoing_interest: f64,
}

#[derive(Serialize, Deserialize)]
struct TransferRecord {
    date: String,
    amount: f64,
    description: String,
    sender: String,
    recipient: String,
}

impl From<&Payment> for PaymentRecord {
    fn from(payment: &Payment) -> Self {
        Self {
            date: payment.date.clone(),
            amount: payment.amount,
            description: payment.description.clone(),
            incoming_interest: payment.incoming_interest,
            outgoing_interest: payment.outgoing_interest,
        }
    }
}

impl From<PaymentRecord> for Payment {
    fn from(record: PaymentRecord) -> Self {
        Self {
            date: record.date,
            amount: record.amount,
            description: record.description,
            incoming_interest: record.incoming_interest,
            outgoing_interest: record.outgoing_interest,
        }
    }
}

impl From<&Transfer> for TransferRecord {
    fn from(transfer: &Transfer) -> Self {
        Self {
            date: transfer.date.clone(),
            amount: transfer.amount,
            description: transfer.description.clone(),
            sender: transfer.sender.clone(),
            recipient: transfer.recipient.clone(),
        }
    }
}

impl From<TransferRecord> for Transfer {
    fn from(record: TransferRecord) -> Self {
        Self {
            date: record.date,
            amount: record.amount,
            description: record.description,
            sender: record.sender,
            recipient: record.recipient,
        }
    }
}

/// Serializes a transaction list to the pretty-printed on-disk form.
///
/// An undirected base `Transfer` has no tag on disk; the bank binds every
/// transfer to a direction before persisting, so encountering one here is an
/// error rather than a silent write the decoder could never read back.
pub fn encode_transactions(transactions: &[Transaction]) -> Result<String> {
    let records = transactions
        .iter()
        .map(encode_transaction)
        .collect::<Result<Vec<_>>>()?;
    Ok(serde_json::to_string_pretty(&records)?)
}

fn encode_transaction(transaction: &Transaction) -> Result<TaggedRecord> {
    let (tag, data) = match transaction {
        Transaction::Payment(payment) => (
            TAG_PAYMENT,
            serde_json::to_value(PaymentRecord::from(payment))?,
        ),
        Transaction::IncomingTransfer(transfer) => (
            TAG_INCOMING,
            serde_json::to_value(TransferRecord::from(transfer))?,
        ),
        Transaction::OutgoingTransfer(transfer) => (
            TAG_OUTGOING,
            serde_json::to_value(TransferRecord::from(transfer))?,
        ),
        Transaction::Transfer(transfer) => {
            return Err(BankError::Parse(format!(
                "undirected transfer `{}` cannot be persisted",
                transfer.description
            )));
        }
    };
    Ok(TaggedRecord {
        tag: tag.to_string(),
        data,
    })
}

/// Parses the on-disk JSON array back into transactions, failing on a
/// missing tag field, missing data field, or unknown tag value.
pub fn decode_transactions(json: &str) -> Result<Vec<Transaction>> {
    let elements: Vec<Value> = serde_json::from_str(json)?;
    elements.into_iter().map(decode_transaction).collect()
}

fn decode_transaction(element: Value) -> Result<Transaction> {
    let tag = element
        .get(TAG_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| BankError::Parse(format!("missing `{}` field", TAG_FIELD)))?
        .to_string();
    let data = element
        .get(DATA_FIELD)
        .cloned()
        .ok_or_else(|| BankError::Parse(format!("missing `{}` field", DATA_FIELD)))?;

    match tag.as_str() {
        TAG_PAYMENT => {
            let record: PaymentRecord = serde_json::from_value(data)?;
            Ok(Transaction::Payment(record.into()))
        }
        TAG_INCOMING => {
            let record: TransferRecord = serde_json::from_value(data)?;
            Ok(Transaction::IncomingTransfer(record.into()))
        }
        TAG_OUTGOING => {
            let record: TransferRecord = serde_json::from_value(data)?;
            Ok(Transaction::OutgoingTransfer(record.into()))
        }
        other => Err(BankError::Parse(format!(
            "unknown transaction tag `{}`",
            other
        ))),
    }
}
