use std::fmt;

/// A plain deposit or withdrawal. The interest fields are fractions in
/// `[0, 1]`; the bank overwrites them with its configured rates when the
/// payment is admitted to an account.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub date: String,
    pub amount: f64,
    pub description: String,
    pub incoming_interest: f64,
    pub outgoing_interest: f64,
}

impl Payment {
    pub fn new(
        date: impl Into<String>,
        amount: f64,
        description: impl Into<String>,
        incoming_interest: f64,
        outgoing_interest: f64,
    ) -> Self {
        Self {
            date: date.into(),
            amount,
            description: description.into(),
            incoming_interest,
            outgoing_interest,
        }
    }
}

/// A two-party movement between a sender and a recipient account. The base
/// type carries no directional sign; direction becomes meaningful once the
/// transfer is bound to a specific account.
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    pub date: String,
    pub amount: f64,
    pub description: String,
    pub sender: String,
    pub recipient: String,
}

impl Transfer {
    pub fn new(
        date: impl Into<String>,
        amount: f64,
        description: impl Into<String>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            amount,
            description: description.into(),
            sender: sender.into(),
            recipient: recipient.into(),
        }
    }
}

/// A financial event on an account. Closed set of kinds; equality is
/// structural and never holds across kinds, so an `IncomingTransfer` is not
/// equal to an `OutgoingTransfer` or a plain `Transfer` with the same fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Transaction {
    Payment(Payment),
    Transfer(Transfer),
    IncomingTransfer(Transfer),
    OutgoingTransfer(Transfer),
}

impl Transaction {
    /// Effective signed contribution of this transaction to its account's
    /// balance.
    ///
    /// Payments retain a deposit interest cut on credits and charge the
    /// withdrawal fee on top of debits: `1000` at 5% in / 3% out yields
    /// `950.0`, `-100` yields `-103.0`. Direction-bound transfers fix the
    /// sign; an undirected transfer contributes its raw amount.
    pub fn value(&self) -> f64 {
        match self {
            Transaction::Payment(payment) => {
                if payment.amount >= 0.0 {
                    payment.amount * (1.0 - payment.incoming_interest)
                } else {
                    payment.amount * (1.0 + payment.outgoing_interest)
                }
            }
            Transaction::Transfer(transfer) => transfer.amount,
            Transaction::IncomingTransfer(transfer) => transfer.amount,
            Transaction::OutgoingTransfer(transfer) => -transfer.amount,
        }
    }

    pub fn date(&self) -> &str {
        match self {
            Transaction::Payment(payment) => &payment.date,
            Transaction::Transfer(transfer)
            | Transaction::IncomingTransfer(transfer)
            | Transaction::OutgoingTransfer(transfer) => &transfer.date,
        }
    }

    /// Raw entered amount, before any interest or direction is applied.
    pub fn amount(&self) -> f64 {
        match self {
            Transaction::Payment(payment) => payment.amount,
            Transaction::Transfer(transfer)
            | Transaction::IncomingTransfer(transfer)
            | Transaction::OutgoingTransfer(transfer) => transfer.amount,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Transaction::Payment(payment) => &payment.description,
            Transaction::Transfer(transfer)
            | Transaction::IncomingTransfer(transfer)
            | Transaction::OutgoingTransfer(transfer) => &transfer.description,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Transaction::Payment(_) => "Payment",
            Transaction::Transfer(_) => "Transfer",
            Transaction::IncomingTransfer(_) => "IncomingTransfer",
            Transaction::OutgoingTransfer(_) => "OutgoingTransfer",
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transaction::Payment(payment) => write!(
                f,
                "{} {:>10.2} {} (payment, in {:.2}, out {:.2})",
                payment.date,
                payment.amount,
                payment.description,
                payment.incoming_interest,
                payment.outgoing_interest
            ),
            Transaction::Transfer(transfer) => write!(
                f,
                "{} {:>10.2} {} (transfer {} -> {})",
                transfer.date,
                transfer.amount,
                transfer.description,
                transfer.sender,
                transfer.recipient
            ),
            Transaction::IncomingTransfer(transfer) => write!(
                f,
                "{} {:>10.2} {} (incoming transfer from {})",
                transfer.date, transfer.amount, transfer.description, transfer.sender
            ),
            Transaction::OutgoingTransfer(transfer) => write!(
                f,
                "{} {:>10.2} {} (outgoing transfer to {})",
                transfer.date, transfer.amount, transfer.description, transfer.recipient
            ),
        }
    }
}
