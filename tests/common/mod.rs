use std::path::PathBuf;
use std::sync::Mutex;

use bank_core::bank::PrivateBank;
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the
/// test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates a bank backed by a unique storage directory for each test and
/// returns the directory so the test can reopen or inspect it.
pub fn setup_bank() -> (PrivateBank, PathBuf) {
    let temp = TempDir::new().expect("create temp dir");
    let dir = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);

    let bank = PrivateBank::open("TestBank", 0.05, 0.03, &dir).expect("open bank");
    (bank, dir)
}
