use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use tracing::warn;

use crate::errors::Result;
use crate::storage::codec;
use crate::transaction::Transaction;

const ACCOUNT_EXTENSION: &str = "json";
const TMP_SUFFIX: &str = "tmp";

/// Persistence gateway: one `<account>.json` file per account inside a
/// single storage directory, rewritten whole after every mutation.
#[derive(Debug, Clone)]
pub struct AccountStore {
    dir: PathBuf,
}

impl AccountStore {
    /// Opens the store, creating the directory (and parents) if missing.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn account_path(&self, account: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", account, ACCOUNT_EXTENSION))
    }

    /// Scans the directory and decodes every account file. A file that
    /// fails to read or decode is logged and skipped so one corrupt
    /// account cannot abort the rest of the load.
    pub fn load_all(&self) -> Result<BTreeMap<String, Vec<Transaction>>> {
        let mut accounts = BTreeMap::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(ACCOUNT_EXTENSION) {
                continue;
            }
            let account = match path.file_stem().and_then(|stem| stem.to_str()) {
                Some(stem) => stem.to_string(),
                None => continue,
            };
            let contents = match fs::read_to_string(&path) {
                Ok(contents) => contents,
                Err(err) => {
                    warn!(%account, %err, "skipping unreadable account file");
                    continue;
                }
            };
            match codec::decode_transactions(&contents) {
                Ok(transactions) => {
                    accounts.insert(account, transactions);
                }
                Err(err) => {
                    warn!(%account, %err, "skipping undecodable account file");
                }
            }
        }
        Ok(accounts)
    }

    /// Rewrites the account's file with the full current transaction list,
    /// staging to a temporary sibling and renaming over the target.
    pub fn write_account(&self, account: &str, transactions: &[Transaction]) -> Result<()> {
        let path = self.account_path(account);
        let json = codec::encode_transactions(transactions)?;
        let tmp = tmp_path(&path);
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Removes the account's file; absent files are not an error.
    pub fn remove_account_file(&self, account: &str) -> Result<()> {
        let path = self.account_path(account);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}
