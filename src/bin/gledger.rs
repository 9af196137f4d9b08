use clap::{Parser, Subcommand};
use gledger::{
    utils::{expand_home, format_number, parse_amount},
    Amount, Date, Ledger, Options, Posting, Transaction,
};
use std::collections::HashMap;
use std::path::Path;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");

const DEFAULT_ALIASES: [(&str, &str); 3] =
    [("exp", "expenses"), ("inc", "income"), ("ast", "assets")];

#[derive(Debug, Parser)]
#[command(
    name = "gledger",
    about = "A plain-text double-entry bookkeeping tool.",
    version = VERSION,
    author = AUTHOR,
)]
struct Cli {
    /// Ledger file to read and write.
    #[arg(short, long, env = "GLEDGER_FILE", default_value = "~/.gledger/data.txt")]
    file: String,

    /// Base currency of the ledger.
    #[arg(long, env = "GLEDGER_CURRENCY", default_value = gledger::DEFAULT_CURRENCY)]
    currency: String,

    /// Extra account alias, e.g. `--alias bank=assets:bank`.
    #[arg(long = "alias", value_name = "NAME=TARGET")]
    aliases: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the balance of every account.
    Balances,
    /// Print the balance report grouped by category.
    Report,
    /// Print all transactions.
    List,
    /// Parse the ledger file and report problems.
    Check,
    /// Add a transaction moving an amount between two accounts.
    Add {
        #[arg(long)]
        date: Date,
        #[arg(long)]
        description: String,
        #[arg(long, allow_hyphen_values = true)]
        amount: String,
        /// Account credited with the amount.
        #[arg(long)]
        from: String,
        /// Account debited with the amount.
        #[arg(long)]
        to: String,
    },
}

fn alias_table(extra: &[String]) -> Result<HashMap<String, String>, String> {
    let mut aliases: HashMap<String, String> = DEFAULT_ALIASES
        .iter()
        .map(|(name, target)| (name.to_string(), target.to_string()))
        .collect();
    for entry in extra {
        let (name, target) = entry
            .split_once('=')
            .ok_or_else(|| format!("invalid alias {:?}, expected NAME=TARGET", entry))?;
        aliases.insert(name.to_string(), target.to_string());
    }
    Ok(aliases)
}

/// Replaces the first segment of `account` when it is an alias.
fn resolve_account(account: &str, aliases: &HashMap<String, String>) -> String {
    let (head, rest) = match account.split_once(':') {
        Some((head, rest)) => (head, Some(rest)),
        None => (account, None),
    };
    match (aliases.get(head), rest) {
        (Some(target), Some(rest)) => format!("{}:{}", target, rest),
        (Some(target), None) => target.clone(),
        (None, _) => account.to_string(),
    }
}

fn balances(ledger: &Ledger) -> gledger::Result<()> {
    for (account, number) in ledger.calculate_balances()? {
        println!("  {:<40} {:>10}", account, format_number(number.round_dp(2)));
    }
    Ok(())
}

fn report(ledger: &Ledger) -> gledger::Result<()> {
    print!("{}", ledger.generate_balance_report()?);
    for section in ledger.extension_reports() {
        println!("\n{}", section);
    }
    Ok(())
}

fn list(ledger: &Ledger) {
    for (index, txn) in ledger.filtered_transactions().iter().enumerate() {
        println!("[{}] {} {}", index + 1, txn.date(), txn.description());
        for posting in txn.postings() {
            println!(
                "    {:<40}  {}",
                posting.account,
                format_number(posting.amount.number)
            );
        }
    }
}

fn load(ledger: &mut Ledger, path: &Path, allow_missing: bool) -> gledger::Result<()> {
    if allow_missing && !path.exists() {
        log::info!("{} does not exist yet, starting an empty ledger", path.display());
        return Ok(());
    }
    let count = ledger.load_file(path)?.len();
    log::info!("loaded {} transactions from {}", count, path.display());
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let path = expand_home(&cli.file);
    let options = Options {
        currency: cli.currency.clone(),
        ..Options::default()
    };
    let mut ledger = Ledger::with_options(options);

    match cli.command {
        Commands::Balances => {
            load(&mut ledger, &path, false)?;
            balances(&ledger)?;
        }
        Commands::Report => {
            load(&mut ledger, &path, false)?;
            report(&ledger)?;
        }
        Commands::List => {
            load(&mut ledger, &path, false)?;
            list(&ledger);
        }
        Commands::Check => {
            load(&mut ledger, &path, false)?;
            println!("{}: {} transactions, balanced", path.display(), ledger.txns().len());
        }
        Commands::Add {
            date,
            description,
            amount,
            from,
            to,
        } => {
            let aliases = alias_table(&cli.aliases)?;
            let number = parse_amount(&amount)
                .filter(|n| !n.is_zero())
                .ok_or_else(|| format!("invalid amount {:?}", amount))?;
            let txn = Transaction::new(
                date,
                description,
                vec![
                    Posting::new(
                        resolve_account(&from, &aliases),
                        Amount::new(-number, cli.currency.clone()),
                    ),
                    Posting::new(
                        resolve_account(&to, &aliases),
                        Amount::new(number, cli.currency.clone()),
                    ),
                ],
            );
            load(&mut ledger, &path, true)?;
            ledger.add_transaction(txn.clone())?;
            if let Some(dir) = path.parent() {
                if !dir.as_os_str().is_empty() {
                    std::fs::create_dir_all(dir)?;
                }
            }
            ledger.save_file(&path)?;
            println!("Transaction added.\n{}", txn);
        }
    }
    Ok(())
}

fn main() {
    pretty_env_logger::init();
    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
