use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::errors::{BankError, Result};
use crate::storage::AccountStore;
use crate::transaction::Transaction;
use crate::validation::validate;

/// How transfer entries contribute to an account balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BalanceMode {
    /// Trust the stored direction: sum `value()` over all entries.
    #[default]
    StoredDirection,
    /// Re-derive the direction of transfer entries by comparing their
    /// sender/recipient against the queried account name. Agrees with
    /// `StoredDirection` on direction-bound entries.
    PartyComparison,
}

/// The account store: a named bank holding an ordered transaction list per
/// account, write-through persisted as one JSON file per account.
///
/// Single-session: every mutating operation completes its file write
/// before returning.
pub struct PrivateBank {
    name: String,
    incoming_interest: f64,
    outgoing_interest: f64,
    balance_mode: BalanceMode,
    accounts: BTreeMap<String, Vec<Transaction>>,
    store: AccountStore,
}

impl PrivateBank {
    /// Opens a bank over a storage directory, creating the directory if
    /// missing and loading every decodable account file.
    pub fn open(
        name: impl Into<String>,
        incoming_interest: f64,
        outgoing_interest: f64,
        directory: impl Into<std::path::PathBuf>,
    ) -> Result<Self> {
        let store = AccountStore::open(directory)?;
        let accounts = store.load_all()?;
        let bank = Self {
            name: name.into(),
            incoming_interest,
            outgoing_interest,
            balance_mode: BalanceMode::default(),
            accounts,
            store,
        };
        info!(
            bank = %bank.name,
            accounts = bank.accounts.len(),
            dir = %bank.store.dir().display(),
            "bank opened"
        );
        Ok(bank)
    }

    pub fn with_balance_mode(mut self, balance_mode: BalanceMode) -> Self {
        self.balance_mode = balance_mode;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn incoming_interest(&self) -> f64 {
        self.incoming_interest
    }

    pub fn outgoing_interest(&self) -> f64 {
        self.outgoing_interest
    }

    /// Sorted list of all account names.
    pub fn account_names(&self) -> Vec<String> {
        self.accounts.keys().cloned().collect()
    }

    /// Registers a new, empty account and persists its (empty) file.
    pub fn create_account(&mut self, account: &str) -> Result<()> {
        validate_account_name(account)?;
        if self.accounts.contains_key(account) {
            return Err(BankError::AccountAlreadyExists(account.to_string()));
        }
        self.accounts.insert(account.to_string(), Vec::new());
        self.store.write_account(account, &[])?;
        debug!(account, "account created");
        Ok(())
    }

    /// Creates an account pre-populated through the regular add path, in
    /// list order. A failing element surfaces its error; the account (and
    /// anything admitted before the failure) is kept, not rolled back.
    pub fn create_account_with(
        &mut self,
        account: &str,
        transactions: Vec<Transaction>,
    ) -> Result<()> {
        self.create_account(account)?;
        for transaction in transactions {
            self.add_transaction(account, transaction)?;
        }
        Ok(())
    }

    /// Removes an account and deletes its file.
    pub fn delete_account(&mut self, account: &str) -> Result<()> {
        if self.accounts.remove(account).is_none() {
            return Err(BankError::AccountNotFound(account.to_string()));
        }
        self.store.remove_account_file(account)?;
        debug!(account, "account deleted");
        Ok(())
    }

    /// Admits a transaction to an account and persists the account.
    ///
    /// A payment's interest fields are overwritten with the bank's
    /// configured rates at this moment; a base transfer naming this account
    /// as sender or recipient is stored direction-bound. The duplicate
    /// check runs against that stored form.
    pub fn add_transaction(&mut self, account: &str, transaction: Transaction) -> Result<()> {
        if !self.accounts.contains_key(account) {
            return Err(BankError::AccountNotFound(account.to_string()));
        }
        let stored = self.normalize(account, transaction.clone());
        let entries = self
            .accounts
            .get(account)
            .ok_or_else(|| BankError::AccountNotFound(account.to_string()))?;
        if entries.contains(&stored) {
            return Err(BankError::TransactionAlreadyExists(account.to_string()));
        }
        // The caller-supplied attributes are validated, not the frozen copy.
        validate(&transaction)?;

        let kind = stored.kind();
        let entries = self
            .accounts
            .get_mut(account)
            .ok_or_else(|| BankError::AccountNotFound(account.to_string()))?;
        entries.push(stored);
        self.store.write_account(account, entries)?;
        debug!(account, kind, "transaction added");
        Ok(())
    }

    fn normalize(&self, account: &str, transaction: Transaction) -> Transaction {
        match transaction {
            Transaction::Payment(mut payment) => {
                payment.incoming_interest = self.incoming_interest;
                payment.outgoing_interest = self.outgoing_interest;
                Transaction::Payment(payment)
            }
            Transaction::Transfer(transfer) => {
                if transfer.sender == account {
                    Transaction::OutgoingTransfer(transfer)
                } else if transfer.recipient == account {
                    Transaction::IncomingTransfer(transfer)
                } else {
                    Transaction::Transfer(transfer)
                }
            }
            other => other,
        }
    }

    /// Removes the first structurally-equal entry and persists the account.
    pub fn remove_transaction(&mut self, account: &str, transaction: &Transaction) -> Result<()> {
        let entries = self
            .accounts
            .get_mut(account)
            .ok_or_else(|| BankError::AccountNotFound(account.to_string()))?;
        let position = entries
            .iter()
            .position(|entry| entry == transaction)
            .ok_or_else(|| BankError::TransactionNotFound(account.to_string()))?;
        entries.remove(position);
        self.store.write_account(account, entries)?;
        debug!(account, "transaction removed");
        Ok(())
    }

    /// Structural membership test. The account must exist.
    pub fn contains_transaction(&self, account: &str, transaction: &Transaction) -> Result<bool> {
        let entries = self.entries(account)?;
        Ok(entries.contains(transaction))
    }

    /// Owned copy of the account's transaction list in insertion order.
    /// Mutation goes through `add_transaction`/`remove_transaction` only.
    pub fn transactions(&self, account: &str) -> Result<Vec<Transaction>> {
        Ok(self.entries(account)?.to_vec())
    }

    /// Sum of each entry's effective value, per the configured balance mode.
    /// Folds from `0.0` rather than `Sum<f64>`, whose `-0.0` identity would
    /// give an empty account a negatively signed zero.
    pub fn account_balance(&self, account: &str) -> Result<f64> {
        let entries = self.entries(account)?;
        let balance = entries
            .iter()
            .fold(0.0, |acc, entry| acc + self.contribution(account, entry));
        Ok(balance)
    }

    fn contribution(&self, account: &str, entry: &Transaction) -> f64 {
        match self.balance_mode {
            BalanceMode::StoredDirection => entry.value(),
            BalanceMode::PartyComparison => match entry {
                Transaction::Transfer(transfer)
                | Transaction::IncomingTransfer(transfer)
                | Transaction::OutgoingTransfer(transfer) => {
                    if transfer.sender == account {
                        -transfer.amount
                    } else if transfer.recipient == account {
                        transfer.amount
                    } else {
                        0.0
                    }
                }
                payment => payment.value(),
            },
        }
    }

    /// Copy of the list ordered by effective value; the stable sort keeps
    /// insertion order among equal values. The stored order is untouched.
    pub fn transactions_sorted(&self, account: &str, ascending: bool) -> Result<Vec<Transaction>> {
        let mut entries = self.transactions(account)?;
        if ascending {
            entries.sort_by(|a, b| a.value().total_cmp(&b.value()));
        } else {
            entries.sort_by(|a, b| b.value().total_cmp(&a.value()));
        }
        Ok(entries)
    }

    /// Entries with non-negative (`positive == true`) or negative effective
    /// value, in their original relative order.
    pub fn transactions_by_type(&self, account: &str, positive: bool) -> Result<Vec<Transaction>> {
        let entries = self.entries(account)?;
        Ok(entries
            .iter()
            .filter(|entry| {
                let value = entry.value();
                if positive {
                    value >= 0.0
                } else {
                    value < 0.0
                }
            })
            .cloned()
            .collect())
    }

    fn entries(&self, account: &str) -> Result<&Vec<Transaction>> {
        self.accounts
            .get(account)
            .ok_or_else(|| BankError::AccountNotFound(account.to_string()))
    }
}

fn validate_account_name(account: &str) -> Result<()> {
    if account.trim().is_empty() {
        return Err(BankError::Attribute("account name must not be empty".into()));
    }
    // The name doubles as the file stem, so it must stay inside the
    // storage directory.
    if account.contains('/') || account.contains('\\') || account.contains("..") {
        return Err(BankError::Attribute(format!(
            "account name `{}` must not contain path separators",
            account
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{Payment, Transfer};
    use tempfile::{tempdir, TempDir};

    fn test_bank() -> (PrivateBank, TempDir) {
        let temp = tempdir().expect("temp dir");
        let bank = PrivateBank::open("TestBank", 0.05, 0.03, temp.path()).expect("open bank");
        (bank, temp)
    }

    fn salary() -> Transaction {
        Transaction::Payment(Payment::new("01.01.2025", 1000.0, "Gehalt", 0.0, 0.0))
    }

    fn rent() -> Transaction {
        Transaction::Payment(Payment::new("02.01.2025", -100.0, "Miete", 0.0, 0.0))
    }

    fn power_bill() -> Transaction {
        Transaction::Transfer(Transfer::new("03.01.2025", 50.0, "Strom", "KontoA", "KontoB"))
    }

    #[test]
    fn create_account_writes_an_empty_file() {
        let (mut bank, temp) = test_bank();
        bank.create_account("KontoA").expect("create account");
        assert!(temp.path().join("KontoA.json").exists());
        assert_eq!(bank.account_names(), vec!["KontoA".to_string()]);
    }

    #[test]
    fn create_account_rejects_duplicates_and_bad_names() {
        let (mut bank, _temp) = test_bank();
        bank.create_account("KontoA").expect("create account");
        assert!(matches!(
            bank.create_account("KontoA"),
            Err(BankError::AccountAlreadyExists(_))
        ));
        assert!(matches!(
            bank.create_account("evil/../name"),
            Err(BankError::Attribute(_))
        ));
        assert!(matches!(
            bank.create_account("  "),
            Err(BankError::Attribute(_))
        ));
    }

    #[test]
    fn add_transaction_freezes_bank_interest_into_payments() {
        let (mut bank, _temp) = test_bank();
        bank.create_account("KontoA").expect("create account");
        bank.add_transaction("KontoA", salary()).expect("add salary");

        let stored = &bank.transactions("KontoA").expect("list")[0];
        match stored {
            Transaction::Payment(payment) => {
                assert_eq!(payment.incoming_interest, 0.05);
                assert_eq!(payment.outgoing_interest, 0.03);
            }
            other => panic!("expected a payment, got {:?}", other),
        }
    }

    #[test]
    fn add_transaction_binds_transfer_direction() {
        let (mut bank, _temp) = test_bank();
        bank.create_account("KontoA").expect("create KontoA");
        bank.create_account("KontoB").expect("create KontoB");
        bank.add_transaction("KontoA", power_bill()).expect("add to sender");
        bank.add_transaction("KontoB", power_bill()).expect("add to recipient");

        assert!(matches!(
            bank.transactions("KontoA").expect("list")[0],
            Transaction::OutgoingTransfer(_)
        ));
        assert!(matches!(
            bank.transactions("KontoB").expect("list")[0],
            Transaction::IncomingTransfer(_)
        ));
    }

    #[test]
    fn unrelated_transfer_stays_undirected_in_memory() {
        let (mut bank, _temp) = test_bank();
        bank.create_account("KontoC").expect("create account");
        let result = bank.add_transaction("KontoC", power_bill());
        // Persisting an undirected transfer is refused by the codec.
        assert!(matches!(result, Err(BankError::Parse(_))));
    }

    #[test]
    fn duplicate_add_fails_on_the_second_call() {
        let (mut bank, _temp) = test_bank();
        bank.create_account("KontoA").expect("create account");
        bank.add_transaction("KontoA", salary()).expect("first add");
        assert!(matches!(
            bank.add_transaction("KontoA", salary()),
            Err(BankError::TransactionAlreadyExists(_))
        ));
        bank.add_transaction("KontoA", power_bill())
            .expect("first transfer add");
        assert!(matches!(
            bank.add_transaction("KontoA", power_bill()),
            Err(BankError::TransactionAlreadyExists(_))
        ));
    }

    #[test]
    fn lookups_on_unknown_accounts_fail() {
        let (mut bank, _temp) = test_bank();
        assert!(matches!(
            bank.add_transaction("QuatschKonto", salary()),
            Err(BankError::AccountNotFound(_))
        ));
        assert!(matches!(
            bank.transactions("QuatschKonto"),
            Err(BankError::AccountNotFound(_))
        ));
        assert!(matches!(
            bank.account_balance("QuatschKonto"),
            Err(BankError::AccountNotFound(_))
        ));
        assert!(matches!(
            bank.contains_transaction("QuatschKonto", &salary()),
            Err(BankError::AccountNotFound(_))
        ));
    }

    #[test]
    fn remove_transaction_requires_a_structural_match() {
        let (mut bank, _temp) = test_bank();
        bank.create_account("KontoA").expect("create account");
        bank.add_transaction("KontoA", salary()).expect("add salary");

        assert!(matches!(
            bank.remove_transaction("KontoA", &rent()),
            Err(BankError::TransactionNotFound(_))
        ));

        let stored = bank.transactions("KontoA").expect("list")[0].clone();
        bank.remove_transaction("KontoA", &stored).expect("remove");
        assert!(bank.transactions("KontoA").expect("list").is_empty());
    }

    #[test]
    fn empty_account_balance_is_a_positive_zero() {
        let (mut bank, _temp) = test_bank();
        bank.create_account("Leer").expect("create account");

        let balance = bank.account_balance("Leer").expect("balance");
        assert_eq!(balance, 0.0);
        assert!(balance.is_sign_positive(), "empty balance must not be -0.0");
        assert_eq!(format!("{balance:.2}"), "0.00");

        let by_party = bank.with_balance_mode(BalanceMode::PartyComparison);
        let balance = by_party.account_balance("Leer").expect("balance");
        assert!(balance.is_sign_positive(), "empty balance must not be -0.0");
    }

    #[test]
    fn balance_scenario_totals_797() {
        let (mut bank, _temp) = test_bank();
        bank.create_account("KontoA").expect("create account");
        bank.add_transaction("KontoA", salary()).expect("salary");
        bank.add_transaction("KontoA", rent()).expect("rent");
        bank.add_transaction("KontoA", power_bill()).expect("power bill");

        assert_eq!(bank.account_balance("KontoA").expect("balance"), 797.0);

        let by_party = bank.with_balance_mode(BalanceMode::PartyComparison);
        assert_eq!(by_party.account_balance("KontoA").expect("balance"), 797.0);
    }

    #[test]
    fn sorted_views_are_stable_and_leave_storage_untouched() {
        let (mut bank, _temp) = test_bank();
        bank.create_account("KontoA").expect("create account");
        bank.add_transaction("KontoA", salary()).expect("salary");
        bank.add_transaction("KontoA", rent()).expect("rent");
        bank.add_transaction("KontoA", power_bill()).expect("power bill");

        let ascending = bank.transactions_sorted("KontoA", true).expect("asc");
        let values: Vec<f64> = ascending.iter().map(Transaction::value).collect();
        assert_eq!(values, vec![-103.0, -50.0, 950.0]);

        let descending = bank.transactions_sorted("KontoA", false).expect("desc");
        let values: Vec<f64> = descending.iter().map(Transaction::value).collect();
        assert_eq!(values, vec![950.0, -50.0, -103.0]);

        // Insertion order survives the sorted views.
        let stored: Vec<f64> = bank
            .transactions("KontoA")
            .expect("list")
            .iter()
            .map(Transaction::value)
            .collect();
        assert_eq!(stored, vec![950.0, -103.0, -50.0]);
    }

    #[test]
    fn type_filter_splits_by_sign() {
        let (mut bank, _temp) = test_bank();
        bank.create_account("KontoA").expect("create account");
        bank.add_transaction("KontoA", salary()).expect("salary");
        bank.add_transaction("KontoA", rent()).expect("rent");
        bank.add_transaction("KontoA", power_bill()).expect("power bill");

        let positive = bank.transactions_by_type("KontoA", true).expect("positive");
        assert_eq!(positive.len(), 1);
        assert_eq!(positive[0].value(), 950.0);

        let negative = bank.transactions_by_type("KontoA", false).expect("negative");
        let values: Vec<f64> = negative.iter().map(Transaction::value).collect();
        assert_eq!(values, vec![-103.0, -50.0]);
    }

    #[test]
    fn bulk_create_keeps_the_account_on_partial_failure() {
        let (mut bank, _temp) = test_bank();
        let bad_transfer =
            Transaction::Transfer(Transfer::new("03.01.2025", -50.0, "Strom", "KontoA", "KontoB"));
        let result = bank.create_account_with("KontoA", vec![salary(), bad_transfer, rent()]);
        assert!(matches!(result, Err(BankError::Attribute(_))));

        // No rollback: the account and the admitted prefix remain.
        let stored = bank.transactions("KontoA").expect("account survives");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].value(), 950.0);
    }

    #[test]
    fn delete_account_removes_state_and_file() {
        let (mut bank, temp) = test_bank();
        bank.create_account("KontoA").expect("create account");
        bank.delete_account("KontoA").expect("delete account");
        assert!(bank.account_names().is_empty());
        assert!(!temp.path().join("KontoA.json").exists());
        assert!(matches!(
            bank.delete_account("KontoA"),
            Err(BankError::AccountNotFound(_))
        ));
    }
}
