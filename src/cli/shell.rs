use std::{
    env,
    io::{self, BufRead},
    path::PathBuf,
};

use dialoguer::{theme::ColorfulTheme, Confirm};
use rustyline::{error::ReadlineError, history::DefaultHistory, Editor};
use shell_words::split;

use crate::bank::PrivateBank;
use crate::cli::{output, CliError};
use crate::transaction::{Payment, Transaction, Transfer};

const DEFAULT_INCOMING_INTEREST: f64 = 0.05;
const DEFAULT_OUTGOING_INTEREST: f64 = 0.03;

const COMMANDS: &[&str] = &[
    "accounts", "create", "delete", "balance", "list", "payment", "transfer", "remove", "help",
    "quit", "exit",
];

enum LoopControl {
    Continue,
    Exit,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CliMode {
    Interactive,
    Script,
}

struct ShellContext {
    bank: PrivateBank,
    mode: CliMode,
}

/// Runs the shell: a rustyline editor session, or a plain stdin line loop
/// when `BANK_CORE_CLI_SCRIPT` is set.
pub fn run_cli() -> Result<(), CliError> {
    let mode = if env::var_os("BANK_CORE_CLI_SCRIPT").is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };

    let mut context = ShellContext::new(mode)?;

    match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => run_script(&mut context),
    }
}

impl ShellContext {
    fn new(mode: CliMode) -> Result<Self, CliError> {
        let directory = storage_directory();
        let incoming = env_rate("BANK_CORE_INCOMING_INTEREST", DEFAULT_INCOMING_INTEREST);
        let outgoing = env_rate("BANK_CORE_OUTGOING_INTEREST", DEFAULT_OUTGOING_INTEREST);
        let bank = PrivateBank::open("PrivateBank", incoming, outgoing, directory)?;
        Ok(Self { bank, mode })
    }
}

fn storage_directory() -> PathBuf {
    if let Some(dir) = env::var_os("BANK_CORE_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bank_core")
        .join("accounts")
}

fn env_rate(var: &str, default: f64) -> f64 {
    env::var(var)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    let mut editor = Editor::<(), DefaultHistory>::new()?;
    output::info(format!(
        "{} — {} account(s) loaded. Type `help` for commands.",
        context.bank.name(),
        context.bank.account_names().len()
    ));

    loop {
        match editor.readline("bank> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                editor.add_history_entry(trimmed).ok();
                match handle_line(context, trimmed) {
                    Ok(LoopControl::Continue) => {}
                    Ok(LoopControl::Exit) => break,
                    Err(err) => output::error(err),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                output::info("Exiting shell.");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

fn run_script(context: &mut ShellContext) -> Result<(), CliError> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match handle_line(context, trimmed) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => output::error(err),
        }
    }
    Ok(())
}

fn handle_line(context: &mut ShellContext, line: &str) -> Result<LoopControl, CliError> {
    let words =
        split(line).map_err(|err| CliError::Usage(format!("could not parse input: {err}")))?;
    let Some((command, args)) = words.split_first() else {
        return Ok(LoopControl::Continue);
    };

    match command.as_str() {
        "help" => print_help(),
        "quit" | "exit" => return Ok(LoopControl::Exit),
        "accounts" => cmd_accounts(context),
        "create" => cmd_create(context, args)?,
        "delete" => cmd_delete(context, args)?,
        "balance" => cmd_balance(context, args)?,
        "list" => cmd_list(context, args)?,
        "payment" => cmd_payment(context, args)?,
        "transfer" => cmd_transfer(context, args)?,
        "remove" => cmd_remove(context, args)?,
        unknown => {
            let mut message = format!("unknown command `{unknown}`");
            if let Some(suggestion) = suggest_command(unknown) {
                message.push_str(&format!(", did you mean `{suggestion}`?"));
            }
            return Err(CliError::Usage(message));
        }
    }

    Ok(LoopControl::Continue)
}

fn suggest_command(input: &str) -> Option<&'static str> {
    COMMANDS
        .iter()
        .map(|candidate| (candidate, strsim::jaro_winkler(input, candidate)))
        .filter(|(_, score)| *score > 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(candidate, _)| *candidate)
}

fn print_help() {
    output::info("Commands:");
    output::info("  accounts                                   list account names");
    output::info("  create <account>                           create an empty account");
    output::info("  delete <account>                           delete an account and its file");
    output::info("  balance <account>                          show the account balance");
    output::info("  list <account> [asc|desc|positive|negative] show transactions");
    output::info("  payment <account> <amount> <description> [date]");
    output::info("  transfer <sender> <recipient> <amount> <description> [date]");
    output::info("  remove <account> <index>                   remove the listed transaction");
    output::info("  quit                                       leave the shell");
}

fn cmd_accounts(context: &ShellContext) {
    let names = context.bank.account_names();
    if names.is_empty() {
        output::info("No accounts yet.");
        return;
    }
    for name in names {
        output::info(format!("  {name}"));
    }
}

fn cmd_create(context: &mut ShellContext, args: &[String]) -> Result<(), CliError> {
    let [account] = args else {
        return Err(CliError::Usage("usage: create <account>".into()));
    };
    context.bank.create_account(account)?;
    output::success(format!("account `{account}` created"));
    Ok(())
}

fn cmd_delete(context: &mut ShellContext, args: &[String]) -> Result<(), CliError> {
    let [account] = args else {
        return Err(CliError::Usage("usage: delete <account>".into()));
    };
    if !confirm(context, &format!("Delete account `{account}` and its file?"))? {
        output::info("Cancelled.");
        return Ok(());
    }
    context.bank.delete_account(account)?;
    output::success(format!("account `{account}` deleted"));
    Ok(())
}

fn cmd_balance(context: &ShellContext, args: &[String]) -> Result<(), CliError> {
    let [account] = args else {
        return Err(CliError::Usage("usage: balance <account>".into()));
    };
    let balance = context.bank.account_balance(account)?;
    output::info(format!("{account}: {balance:.2}"));
    Ok(())
}

fn cmd_list(context: &ShellContext, args: &[String]) -> Result<(), CliError> {
    let (account, view) = match args {
        [account] => (account, None),
        [account, view] => (account, Some(view.as_str())),
        _ => {
            return Err(CliError::Usage(
                "usage: list <account> [asc|desc|positive|negative]".into(),
            ))
        }
    };

    let transactions = match view {
        None => context.bank.transactions(account)?,
        Some("asc") => context.bank.transactions_sorted(account, true)?,
        Some("desc") => context.bank.transactions_sorted(account, false)?,
        Some("positive") => context.bank.transactions_by_type(account, true)?,
        Some("negative") => context.bank.transactions_by_type(account, false)?,
        Some(other) => {
            return Err(CliError::Usage(format!(
                "unknown view `{other}`, expected asc, desc, positive or negative"
            )))
        }
    };

    if transactions.is_empty() {
        output::info(format!("{account}: no transactions"));
        return Ok(());
    }
    for (index, transaction) in transactions.iter().enumerate() {
        output::info(format!(
            "  [{index}] {transaction} => {:.2}",
            transaction.value()
        ));
    }
    let balance = context.bank.account_balance(account)?;
    output::info(format!("balance: {balance:.2}"));
    Ok(())
}

fn cmd_payment(context: &mut ShellContext, args: &[String]) -> Result<(), CliError> {
    let (account, amount, description, date) = match args {
        [account, amount, description] => (account, amount, description, today()),
        [account, amount, description, date] => (account, amount, description, date.clone()),
        _ => {
            return Err(CliError::Usage(
                "usage: payment <account> <amount> <description> [date]".into(),
            ))
        }
    };
    let amount: f64 = amount
        .parse()
        .map_err(|_| CliError::Usage(format!("`{amount}` is not a number")))?;

    // The bank overwrites the interest fields with its configured rates.
    let payment = Payment::new(date, amount, description.clone(), 0.0, 0.0);
    context
        .bank
        .add_transaction(account, Transaction::Payment(payment))?;
    output::success(format!("payment of {amount:.2} added to `{account}`"));
    Ok(())
}

fn cmd_transfer(context: &mut ShellContext, args: &[String]) -> Result<(), CliError> {
    let (sender, recipient, amount, description, date) = match args {
        [sender, recipient, amount, description] => {
            (sender, recipient, amount, description, today())
        }
        [sender, recipient, amount, description, date] => {
            (sender, recipient, amount, description, date.clone())
        }
        _ => {
            return Err(CliError::Usage(
                "usage: transfer <sender> <recipient> <amount> <description> [date]".into(),
            ))
        }
    };
    let amount: f64 = amount
        .parse()
        .map_err(|_| CliError::Usage(format!("`{amount}` is not a number")))?;

    let transfer = Transfer::new(date, amount, description.clone(), sender.clone(), recipient.clone());
    let names = context.bank.account_names();
    let mut parties = Vec::new();
    if names.contains(sender) {
        parties.push(sender.clone());
    }
    if names.contains(recipient) {
        parties.push(recipient.clone());
    }
    if parties.is_empty() {
        return Err(CliError::Usage(format!(
            "neither `{sender}` nor `{recipient}` is a known account"
        )));
    }
    for party in parties {
        context
            .bank
            .add_transaction(&party, Transaction::Transfer(transfer.clone()))?;
        output::success(format!("transfer of {amount:.2} booked on `{party}`"));
    }
    Ok(())
}

fn cmd_remove(context: &mut ShellContext, args: &[String]) -> Result<(), CliError> {
    let [account, index] = args else {
        return Err(CliError::Usage("usage: remove <account> <index>".into()));
    };
    let index: usize = index
        .parse()
        .map_err(|_| CliError::Usage(format!("`{index}` is not an index")))?;

    let transactions = context.bank.transactions(account)?;
    let Some(transaction) = transactions.get(index) else {
        return Err(CliError::Usage(format!(
            "account `{account}` has no transaction [{index}]"
        )));
    };
    if !confirm(context, &format!("Remove {transaction}?"))? {
        output::info("Cancelled.");
        return Ok(());
    }
    context.bank.remove_transaction(account, transaction)?;
    output::success(format!("transaction [{index}] removed from `{account}`"));
    Ok(())
}

/// Script mode never blocks on prompts; destructive commands proceed.
fn confirm(context: &ShellContext, prompt: &str) -> Result<bool, CliError> {
    if context.mode == CliMode::Script {
        return Ok(true);
    }
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

fn today() -> String {
    chrono::Local::now().format("%d.%m.%Y").to_string()
}
