use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::LedgerService;
use crate::domain::{format_cents, Account, Asset, AssetMovement};

/// Database snapshot for full JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub accounts: Vec<Account>,
    pub assets: Vec<Asset>,
    pub movements: Vec<AssetMovement>,
}

/// Exporter for converting ledger and patrimony data to flat formats
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export visible accounts with their computed balances to CSV.
    pub async fn export_accounts_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let balances = self.service.list_balances(None).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "name",
            "kind",
            "company",
            "sector",
            "counterparty",
            "destination",
            "previous_balance",
            "balance",
        ])?;

        let mut count = 0;
        for line in &balances {
            let account = &line.account;
            csv_writer.write_record([
                account.name.clone(),
                account.kind.as_str().to_string(),
                account.company.clone().unwrap_or_default(),
                account.sector.clone().unwrap_or_default(),
                account.counterparty.clone().unwrap_or_default(),
                account.destination.clone().unwrap_or_default(),
                account
                    .previous_balance
                    .map(format_cents)
                    .unwrap_or_default(),
                format_cents(line.balance),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the entries of one account to CSV, amounts as stored.
    pub async fn export_entries_csv<W: Write>(
        &self,
        account_name: &str,
        writer: W,
    ) -> Result<usize> {
        let entries = self.service.list_entries(account_name).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "date",
            "credit",
            "debit",
            "document_number",
            "note",
            "recorded_at",
        ])?;

        let mut count = 0;
        for entry in &entries {
            csv_writer.write_record([
                entry.id.to_string(),
                entry.date.clone(),
                entry.credit.clone().unwrap_or_default(),
                entry.debit.clone().unwrap_or_default(),
                entry.document_number.clone().unwrap_or_default(),
                entry.note.clone().unwrap_or_default(),
                entry.recorded_at.to_rfc3339(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the asset registry to CSV.
    pub async fn export_assets_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let assets = self.service.list_assets(false).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["code", "name", "location", "acquired_on", "value", "note"])?;

        let mut count = 0;
        for asset in &assets {
            csv_writer.write_record([
                asset.code.clone(),
                asset.name.clone(),
                asset.location.clone().unwrap_or_default(),
                asset.acquired_on.clone().unwrap_or_default(),
                asset.value_cents.map(format_cents).unwrap_or_default(),
                asset.note.clone().unwrap_or_default(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export everything as one JSON snapshot.
    pub async fn export_full_json<W: Write>(&self, writer: W) -> Result<()> {
        let mut accounts = Vec::new();
        for account in self.service.list_accounts(None, true).await? {
            let info = self.service.get_account_info(&account.name).await?;
            accounts.push(info.account);
        }

        let assets = self.service.list_assets(true).await?;
        let mut movements = Vec::new();
        for asset in &assets {
            movements.extend(self.service.asset_history(&asset.code).await?);
        }

        let snapshot = DatabaseSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            accounts,
            assets,
            movements,
        };

        serde_json::to_writer_pretty(writer, &snapshot)?;
        Ok(())
    }
}
