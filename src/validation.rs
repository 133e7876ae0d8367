use crate::errors::{BankError, Result};
use crate::transaction::Transaction;

/// Checks a transaction against the bank's admission rules. Pure; invoked
/// once, synchronously, before a transaction is appended to an account.
pub fn validate(transaction: &Transaction) -> Result<()> {
    match transaction {
        Transaction::Payment(payment) => {
            if !(0.0..=1.0).contains(&payment.incoming_interest)
                || !(0.0..=1.0).contains(&payment.outgoing_interest)
            {
                return Err(BankError::Attribute(format!(
                    "payment interest must lie in [0, 1], got incoming {} / outgoing {}",
                    payment.incoming_interest, payment.outgoing_interest
                )));
            }
            if payment.amount == 0.0 {
                return Err(BankError::Attribute(
                    "payment amount must not be zero".into(),
                ));
            }
            Ok(())
        }
        Transaction::Transfer(transfer)
        | Transaction::IncomingTransfer(transfer)
        | Transaction::OutgoingTransfer(transfer) => {
            // Direction, not sign, encodes debit/credit for transfers.
            if transfer.amount <= 0.0 {
                return Err(BankError::Attribute(format!(
                    "transfer amount must be strictly positive, got {}",
                    transfer.amount
                )));
            }
            Ok(())
        }
    }
}
