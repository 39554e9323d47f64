use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};

use crate::application::{LedgerService, SummaryRequest};
use crate::domain::{
    format_cents, parse_cents, AccountKind, AggregationResult, GroupKey, Period,
};
use crate::io::Exporter;

/// Caixa - internal finance and patrimony tool
#[derive(Parser)]
#[command(name = "caixa")]
#[command(about = "Running accounts, travel boxes and asset tracking for the back office")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "caixa.db")]
    pub database: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Running account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Travel box management commands
    #[command(name = "box", subcommand)]
    TravelBox(BoxCommands),

    /// Record a ledger entry on an account or box
    Entry {
        /// Account or box name
        account: String,

        /// Entry date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Credit amount (money in), e.g. "150.00"
        #[arg(long)]
        credit: Option<String>,

        /// Debit amount (money out)
        #[arg(long)]
        debit: Option<String>,

        /// Receipt or document number
        #[arg(long)]
        document: Option<String>,

        /// Free-text note
        #[arg(short, long)]
        note: Option<String>,
    },

    /// List the entries of an account or box
    Entries {
        /// Account or box name
        account: String,
    },

    /// Show balance for one account or all accounts
    Balance {
        /// Account name (omit for all accounts)
        account: Option<String>,
    },

    /// Asset (patrimony) management commands
    #[command(subcommand)]
    Asset(AssetCommands),

    /// Aggregated totals, grouped breakdowns and top-group ranking
    Summary {
        /// Grouping key: company, sector, counterparty, destination
        #[arg(long, default_value = "company")]
        group_by: String,

        /// Label for accounts missing the grouping attribute
        #[arg(long, default_value = "OTHERS")]
        fallback: String,

        /// Restrict to travel boxes or running accounts: current, box
        #[arg(long)]
        kind: Option<String>,

        /// Period start (YYYY-MM-DD, inclusive)
        #[arg(long)]
        from: Option<String>,

        /// Period end (YYYY-MM-DD, inclusive)
        #[arg(long)]
        to: Option<String>,

        /// Shortcut for the current calendar month
        #[arg(long, conflicts_with_all = ["from", "to"])]
        month: bool,

        /// Number of ranked groups to show
        #[arg(long, default_value = "5")]
        top: usize,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Export data to CSV or JSON
    Export {
        /// What to export: accounts, entries, assets, full
        export_type: String,

        /// Account name (required for entries export)
        #[arg(long)]
        account: Option<String>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a running account
    Create {
        name: String,

        /// Company the account belongs to
        #[arg(long)]
        company: Option<String>,

        /// Internal sector
        #[arg(long)]
        sector: Option<String>,

        /// Supplier or client the account settles against
        #[arg(long)]
        counterparty: Option<String>,
    },

    /// List accounts
    List {
        /// Include hidden accounts
        #[arg(long)]
        all: bool,
    },

    /// Show an account with totals
    Show { name: String },

    /// Hide an account (soft delete)
    Hide { name: String },
}

#[derive(Subcommand)]
pub enum BoxCommands {
    /// Open a travel box
    Create {
        name: String,

        /// Trip destination
        #[arg(long)]
        destination: String,

        /// Company paying for the trip
        #[arg(long)]
        company: Option<String>,

        /// Name of the preceding box; the new box starts from its ending balance
        #[arg(long, conflicts_with = "opening_balance")]
        follows: Option<String>,

        /// Explicit opening balance, e.g. "200.00"
        #[arg(long)]
        opening_balance: Option<String>,
    },

    /// List travel boxes
    List {
        /// Include hidden boxes
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand)]
pub enum AssetCommands {
    /// Register an asset
    Add {
        name: String,

        /// Patrimony code, e.g. "PAT-0042"
        #[arg(long)]
        code: String,

        /// Current location
        #[arg(long)]
        location: Option<String>,

        /// Acquisition date (YYYY-MM-DD)
        #[arg(long)]
        acquired: Option<String>,

        /// Acquisition value, e.g. "1500.00"
        #[arg(long)]
        value: Option<String>,
    },

    /// List assets
    List {
        /// Include hidden assets
        #[arg(long)]
        all: bool,
    },

    /// Move an asset to a new location
    Move {
        /// Patrimony code
        code: String,

        /// New location
        #[arg(long)]
        to: String,

        /// Free-text note
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Show the movement history of an asset
    History {
        /// Patrimony code
        code: String,
    },

    /// Hide an asset (soft delete)
    Hide {
        /// Patrimony code
        code: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                LedgerService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Account(account_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_account_command(&service, account_cmd).await?;
            }

            Commands::TravelBox(box_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_box_command(&service, box_cmd).await?;
            }

            Commands::Entry {
                account,
                date,
                credit,
                debit,
                document,
                note,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let entry = service
                    .add_entry(&account, &date, credit, debit, document, note)
                    .await?;

                let amount = match (entry.credit_cents(), entry.debit_cents()) {
                    (Some(credit), Some(debit)) => {
                        format!("+{} / -{}", format_cents(credit), format_cents(debit))
                    }
                    (Some(credit), None) => format!("+{}", format_cents(credit)),
                    (None, Some(debit)) => format!("-{}", format_cents(debit)),
                    (None, None) => "0.00".to_string(),
                };
                println!("Recorded entry on {}: {} {}", account, entry.date, amount);
            }

            Commands::Entries { account } => {
                let service = LedgerService::connect(&self.database).await?;
                run_entries_command(&service, &account).await?;
            }

            Commands::Balance { account } => {
                let service = LedgerService::connect(&self.database).await?;
                run_balance_command(&service, account).await?;
            }

            Commands::Asset(asset_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_asset_command(&service, asset_cmd).await?;
            }

            Commands::Summary {
                group_by,
                fallback,
                kind,
                from,
                to,
                month,
                top,
                format,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                run_summary_command(
                    &service, &group_by, fallback, kind, from, to, month, top, &format,
                )
                .await?;
            }

            Commands::Export {
                export_type,
                account,
                output,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                run_export_command(&service, &export_type, account.as_deref(), output.as_deref())
                    .await?;
            }
        }

        Ok(())
    }
}

fn parse_group_key(s: &str) -> Result<GroupKey> {
    match s.to_lowercase().as_str() {
        "company" => Ok(GroupKey::Company),
        "sector" => Ok(GroupKey::Sector),
        "counterparty" => Ok(GroupKey::Counterparty),
        "destination" => Ok(GroupKey::Destination),
        _ => anyhow::bail!(
            "Invalid grouping key '{}'. Valid keys: company, sector, counterparty, destination",
            s
        ),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD", s))
}

async fn run_account_command(service: &LedgerService, cmd: AccountCommands) -> Result<()> {
    match cmd {
        AccountCommands::Create {
            name,
            company,
            sector,
            counterparty,
        } => {
            let account = service
                .create_account(name, company, sector, counterparty)
                .await?;
            println!("Created account: {} ({})", account.name, account.id);
        }

        AccountCommands::List { all } => {
            let accounts = service.list_accounts(Some(AccountKind::Current), all).await?;
            if accounts.is_empty() {
                println!("No accounts found.");
            } else {
                println!(
                    "{:<24} {:<16} {:<14} {:<16}",
                    "NAME", "COMPANY", "SECTOR", "COUNTERPARTY"
                );
                println!("{}", "-".repeat(72));
                for account in accounts {
                    println!(
                        "{:<24} {:<16} {:<14} {:<16}",
                        account.name,
                        account.company.as_deref().unwrap_or("-"),
                        account.sector.as_deref().unwrap_or("-"),
                        account.counterparty.as_deref().unwrap_or("-"),
                    );
                }
            }
        }

        AccountCommands::Show { name } => {
            let info = service.get_account_info(&name).await?;
            println!("Account:  {}", info.account.name);
            println!("Kind:     {}", info.account.kind);
            if let Some(company) = &info.account.company {
                println!("Company:  {}", company);
            }
            if let Some(sector) = &info.account.sector {
                println!("Sector:   {}", sector);
            }
            if let Some(destination) = &info.account.destination {
                println!("Destination: {}", destination);
            }
            if let Some(previous) = info.account.previous_balance {
                println!("Carried:  {}", format_cents(previous));
            }
            println!("Entries:  {}", info.entry_count);
            println!("Credits:  {}", format_cents(info.total_credits));
            println!("Debits:   {}", format_cents(info.total_debits));
            println!("Balance:  {}", format_cents(info.balance));
        }

        AccountCommands::Hide { name } => {
            service.hide_account(&name).await?;
            println!("Hidden account: {}", name);
        }
    }
    Ok(())
}

async fn run_box_command(service: &LedgerService, cmd: BoxCommands) -> Result<()> {
    match cmd {
        BoxCommands::Create {
            name,
            destination,
            company,
            follows,
            opening_balance,
        } => {
            let opening_cents = opening_balance
                .map(|raw| parse_cents(&raw))
                .transpose()
                .context("Invalid opening balance. Use '200.00' or '200'")?;

            let account = service
                .create_travel_box(name, destination, company, follows.as_deref(), opening_cents)
                .await?;

            match account.previous_balance {
                Some(balance) => println!(
                    "Opened box {} (starting from {})",
                    account.name,
                    format_cents(balance)
                ),
                None => println!("Opened box {}", account.name),
            }
        }

        BoxCommands::List { all } => {
            let boxes = service
                .list_accounts(Some(AccountKind::TravelBox), all)
                .await?;
            if boxes.is_empty() {
                println!("No travel boxes found.");
            } else {
                println!("{:<24} {:<18} {:<16} {:>12}", "NAME", "DESTINATION", "COMPANY", "CARRIED");
                println!("{}", "-".repeat(72));
                for travel_box in boxes {
                    println!(
                        "{:<24} {:<18} {:<16} {:>12}",
                        travel_box.name,
                        travel_box.destination.as_deref().unwrap_or("-"),
                        travel_box.company.as_deref().unwrap_or("-"),
                        travel_box
                            .previous_balance
                            .map(format_cents)
                            .unwrap_or_else(|| "-".to_string()),
                    );
                }
            }
        }
    }
    Ok(())
}

async fn run_entries_command(service: &LedgerService, account: &str) -> Result<()> {
    let entries = service.list_entries(account).await?;
    if entries.is_empty() {
        println!("No entries for {}.", account);
        return Ok(());
    }

    println!(
        "{:<12} {:>12} {:>12} {:<14} {}",
        "DATE", "CREDIT", "DEBIT", "DOCUMENT", "NOTE"
    );
    println!("{}", "-".repeat(68));
    for entry in entries {
        println!(
            "{:<12} {:>12} {:>12} {:<14} {}",
            entry.date,
            entry.credit.as_deref().unwrap_or("-"),
            entry.debit.as_deref().unwrap_or("-"),
            entry.document_number.as_deref().unwrap_or("-"),
            entry.note.as_deref().unwrap_or(""),
        );
    }
    Ok(())
}

async fn run_balance_command(service: &LedgerService, account: Option<String>) -> Result<()> {
    match account {
        Some(name) => {
            let balance = service.account_balance(&name).await?;
            println!("{}: {}", name, format_cents(balance));
        }
        None => {
            let balances = service.list_balances(None).await?;
            if balances.is_empty() {
                println!("No accounts found.");
                return Ok(());
            }
            println!("{:<24} {:<12} {:>14}", "NAME", "KIND", "BALANCE");
            println!("{}", "-".repeat(52));
            for line in balances {
                println!(
                    "{:<24} {:<12} {:>14}",
                    line.account.name,
                    line.account.kind,
                    format_cents(line.balance)
                );
            }
        }
    }
    Ok(())
}

async fn run_asset_command(service: &LedgerService, cmd: AssetCommands) -> Result<()> {
    match cmd {
        AssetCommands::Add {
            name,
            code,
            location,
            acquired,
            value,
        } => {
            let value_cents = value
                .map(|raw| parse_cents(&raw))
                .transpose()
                .context("Invalid asset value. Use '1500.00' or '1500'")?;

            let asset = service
                .register_asset(name, code, location, acquired, value_cents)
                .await?;
            println!("Registered asset: {} ({})", asset.name, asset.code);
        }

        AssetCommands::List { all } => {
            let assets = service.list_assets(all).await?;
            if assets.is_empty() {
                println!("No assets found.");
            } else {
                println!("{:<12} {:<28} {:<18} {:>12}", "CODE", "NAME", "LOCATION", "VALUE");
                println!("{}", "-".repeat(72));
                for asset in assets {
                    println!(
                        "{:<12} {:<28} {:<18} {:>12}",
                        asset.code,
                        asset.name,
                        asset.location.as_deref().unwrap_or("-"),
                        asset
                            .value_cents
                            .map(format_cents)
                            .unwrap_or_else(|| "-".to_string()),
                    );
                }
            }
        }

        AssetCommands::Move { code, to, note } => {
            let result = service.move_asset(&code, &to, note).await?;
            println!(
                "Moved {} from {} to {}",
                result.asset.code,
                result.movement.from_location.as_deref().unwrap_or("(unknown)"),
                result.movement.to_location
            );
        }

        AssetCommands::History { code } => {
            let movements = service.asset_history(&code).await?;
            if movements.is_empty() {
                println!("No movements recorded for {}.", code);
            } else {
                for movement in movements {
                    println!(
                        "{}  {} -> {}{}",
                        movement.moved_at.format("%Y-%m-%d %H:%M"),
                        movement.from_location.as_deref().unwrap_or("(unknown)"),
                        movement.to_location,
                        movement
                            .note
                            .as_deref()
                            .map(|n| format!("  ({})", n))
                            .unwrap_or_default(),
                    );
                }
            }
        }

        AssetCommands::Hide { code } => {
            service.hide_asset(&code).await?;
            println!("Hidden asset: {}", code);
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_summary_command(
    service: &LedgerService,
    group_by: &str,
    fallback: String,
    kind: Option<String>,
    from: Option<String>,
    to: Option<String>,
    month: bool,
    top: usize,
    format: &str,
) -> Result<()> {
    let group_by = parse_group_key(group_by)?;

    let kind = kind
        .map(|raw| {
            AccountKind::from_str(&raw)
                .ok_or_else(|| anyhow::anyhow!("Invalid kind '{}'. Valid kinds: current, box", raw))
        })
        .transpose()?;

    let period = if month {
        Some(Period::month_of(Utc::now().date_naive()))
    } else {
        match (from, to) {
            (Some(from), Some(to)) => Some(Period::new(parse_date(&from)?, parse_date(&to)?)),
            (None, None) => None,
            _ => anyhow::bail!("Provide both --from and --to, or neither"),
        }
    };

    let result = service
        .summary(SummaryRequest {
            kind,
            group_by,
            fallback_label: fallback,
            period,
            top_limit: top,
        })
        .await?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        "table" => print_summary_table(&result),
        other => anyhow::bail!("Invalid format '{}'. Valid formats: table, json", other),
    }
    Ok(())
}

fn print_summary_table(result: &AggregationResult) {
    println!("Credits: {}", format_cents(result.total_credits));
    println!("Debits:  {}", format_cents(result.total_debits));
    println!("Net:     {}", format_cents(result.net_balance));
    println!(
        "Period:  +{} -{} = {}",
        format_cents(result.period_totals.total_credits),
        format_cents(result.period_totals.total_debits),
        format_cents(result.period_totals.net())
    );

    if !result.top_groups.is_empty() {
        println!();
        println!(
            "{:<24} {:>6} {:>14} {:>14} {:>14}",
            "GROUP", "COUNT", "CREDITS", "DEBITS", "BALANCE"
        );
        println!("{}", "-".repeat(76));
        for (label, count) in &result.top_groups {
            let totals = &result.grouped_totals[label];
            println!(
                "{:<24} {:>6} {:>14} {:>14} {:>14}",
                label,
                count,
                format_cents(totals.total_credits),
                format_cents(totals.total_debits),
                format_cents(totals.balance()),
            );
        }
    }
}

async fn run_export_command(
    service: &LedgerService,
    export_type: &str,
    account: Option<&str>,
    output: Option<&str>,
) -> Result<()> {
    let exporter = Exporter::new(service);

    let mut buffer: Vec<u8> = Vec::new();
    let description = match export_type {
        "accounts" => {
            let count = exporter.export_accounts_csv(&mut buffer).await?;
            format!("{} account(s)", count)
        }
        "entries" => {
            let account = account
                .ok_or_else(|| anyhow::anyhow!("--account is required for entries export"))?;
            let count = exporter.export_entries_csv(account, &mut buffer).await?;
            format!("{} entr(ies) of {}", count, account)
        }
        "assets" => {
            let count = exporter.export_assets_csv(&mut buffer).await?;
            format!("{} asset(s)", count)
        }
        "full" => {
            exporter.export_full_json(&mut buffer).await?;
            "full snapshot".to_string()
        }
        other => anyhow::bail!(
            "Invalid export type '{}'. Valid types: accounts, entries, assets, full",
            other
        ),
    };

    match output {
        Some(path) => {
            std::fs::write(path, &buffer)
                .with_context(|| format!("Failed to write {}", path))?;
            println!("Exported {} to {}", description, path);
        }
        None => {
            use std::io::Write;
            std::io::stdout().write_all(&buffer)?;
        }
    }
    Ok(())
}
