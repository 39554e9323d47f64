use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{
    Account, AccountId, AccountKind, Asset, AssetId, AssetMovement, Entry,
};

use super::{MIGRATION_001_INITIAL, MIGRATION_002_ASSETS};

/// Repository for persisting and querying accounts, entries and assets.
///
/// Owns the one shared connection pool for the whole process; every service
/// operation goes through this single instance instead of opening its own
/// connection.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        sqlx::raw_sql(MIGRATION_002_ASSETS)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 002")?;

        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Account operations
    // ========================

    /// Save a new account to the database. Entries are saved separately.
    pub async fn save_account(&self, account: &Account) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, name, kind, company, sector, counterparty, destination, previous_balance, created_at, hidden_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(account.id.to_string())
        .bind(&account.name)
        .bind(account.kind.as_str())
        .bind(&account.company)
        .bind(&account.sector)
        .bind(&account.counterparty)
        .bind(&account.destination)
        .bind(account.previous_balance)
        .bind(account.created_at.to_rfc3339())
        .bind(account.hidden_at.map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await
        .context("Failed to save account")?;
        Ok(())
    }

    /// Get an account by ID, without its entries.
    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, kind, company, sector, counterparty, destination, previous_balance, created_at, hidden_at
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    /// Get an account by name, without its entries.
    pub async fn get_account_by_name(&self, name: &str) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, kind, company, sector, counterparty, destination, previous_balance, created_at, hidden_at
            FROM accounts
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account by name")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    /// List accounts without entries, optionally filtered by kind.
    /// Hidden accounts are excluded unless `include_hidden` is set.
    pub async fn list_accounts(
        &self,
        kind: Option<AccountKind>,
        include_hidden: bool,
    ) -> Result<Vec<Account>> {
        let mut query = String::from(
            "SELECT id, name, kind, company, sector, counterparty, destination, previous_balance, created_at, hidden_at FROM accounts WHERE 1=1",
        );
        if kind.is_some() {
            query.push_str(" AND kind = ?");
        }
        if !include_hidden {
            query.push_str(" AND hidden_at IS NULL");
        }
        query.push_str(" ORDER BY name");

        let mut sql_query = sqlx::query(&query);
        if let Some(kind) = kind {
            sql_query = sql_query.bind(kind.as_str());
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list accounts")?;

        rows.iter().map(Self::row_to_account).collect()
    }

    /// List accounts with their entries attached, ready for aggregation.
    /// Entries are fetched in one query and bucketed per account.
    pub async fn list_accounts_with_entries(
        &self,
        kind: Option<AccountKind>,
        include_hidden: bool,
    ) -> Result<Vec<Account>> {
        let mut accounts = self.list_accounts(kind, include_hidden).await?;

        let rows = sqlx::query(
            r#"
            SELECT id, account_id, entry_date, credit, debit, document_number, note, recorded_at
            FROM entries
            ORDER BY recorded_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch entries")?;

        let mut by_account: HashMap<AccountId, Vec<Entry>> = HashMap::new();
        for row in &rows {
            let account_id_str: String = row.get("account_id");
            let account_id =
                Uuid::parse_str(&account_id_str).context("Invalid account ID on entry")?;
            by_account
                .entry(account_id)
                .or_default()
                .push(Self::row_to_entry(row)?);
        }

        for account in &mut accounts {
            account.entries = by_account.remove(&account.id).unwrap_or_default();
        }

        Ok(accounts)
    }

    /// Hide an account (soft delete).
    pub async fn hide_account(&self, id: AccountId) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE accounts SET hidden_at = ? WHERE id = ?")
            .bind(&now)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to hide account")?;
        Ok(())
    }

    fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account> {
        let id_str: String = row.get("id");
        let kind_str: String = row.get("kind");
        let created_at_str: String = row.get("created_at");
        let hidden_at_str: Option<String> = row.get("hidden_at");

        Ok(Account {
            id: Uuid::parse_str(&id_str).context("Invalid account ID")?,
            name: row.get("name"),
            kind: AccountKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid account kind: {}", kind_str))?,
            company: row.get("company"),
            sector: row.get("sector"),
            counterparty: row.get("counterparty"),
            destination: row.get("destination"),
            previous_balance: row.get("previous_balance"),
            entries: Vec::new(),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
            hidden_at: hidden_at_str
                .map(|s| DateTime::parse_from_rfc3339(&s))
                .transpose()
                .context("Invalid hidden_at timestamp")?
                .map(|dt| dt.with_timezone(&Utc)),
        })
    }

    // ========================
    // Entry operations
    // ========================

    /// Save a new entry for an account.
    pub async fn save_entry(&self, account_id: AccountId, entry: &Entry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO entries (id, account_id, entry_date, credit, debit, document_number, note, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(account_id.to_string())
        .bind(&entry.date)
        .bind(&entry.credit)
        .bind(&entry.debit)
        .bind(&entry.document_number)
        .bind(&entry.note)
        .bind(entry.recorded_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save entry")?;
        Ok(())
    }

    /// List the entries of an account in recording order.
    pub async fn list_entries(&self, account_id: AccountId) -> Result<Vec<Entry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, entry_date, credit, debit, document_number, note, recorded_at
            FROM entries
            WHERE account_id = ?
            ORDER BY recorded_at
            "#,
        )
        .bind(account_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list entries")?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<Entry> {
        let id_str: String = row.get("id");
        let recorded_at_str: String = row.get("recorded_at");

        Ok(Entry {
            id: Uuid::parse_str(&id_str).context("Invalid entry ID")?,
            date: row.get("entry_date"),
            credit: row.get("credit"),
            debit: row.get("debit"),
            document_number: row.get("document_number"),
            note: row.get("note"),
            recorded_at: DateTime::parse_from_rfc3339(&recorded_at_str)
                .context("Invalid recorded_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Asset operations
    // ========================

    /// Save a new asset to the registry.
    pub async fn save_asset(&self, asset: &Asset) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO assets (id, name, code, location, acquired_on, value_cents, note, created_at, hidden_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(asset.id.to_string())
        .bind(&asset.name)
        .bind(&asset.code)
        .bind(&asset.location)
        .bind(&asset.acquired_on)
        .bind(asset.value_cents)
        .bind(&asset.note)
        .bind(asset.created_at.to_rfc3339())
        .bind(asset.hidden_at.map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await
        .context("Failed to save asset")?;
        Ok(())
    }

    /// Get an asset by its patrimony code.
    pub async fn get_asset_by_code(&self, code: &str) -> Result<Option<Asset>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, code, location, acquired_on, value_cents, note, created_at, hidden_at
            FROM assets
            WHERE code = ?
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch asset by code")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_asset(&row)?)),
            None => Ok(None),
        }
    }

    /// List assets, hidden ones excluded unless requested.
    pub async fn list_assets(&self, include_hidden: bool) -> Result<Vec<Asset>> {
        let query = if include_hidden {
            "SELECT id, name, code, location, acquired_on, value_cents, note, created_at, hidden_at FROM assets ORDER BY code"
        } else {
            "SELECT id, name, code, location, acquired_on, value_cents, note, created_at, hidden_at FROM assets WHERE hidden_at IS NULL ORDER BY code"
        };

        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list assets")?;

        rows.iter().map(Self::row_to_asset).collect()
    }

    /// Hide an asset (soft delete).
    pub async fn hide_asset(&self, id: AssetId) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE assets SET hidden_at = ? WHERE id = ?")
            .bind(&now)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to hide asset")?;
        Ok(())
    }

    /// Record an asset movement and update the asset's current location.
    pub async fn save_movement(&self, movement: &AssetMovement) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO asset_movements (id, asset_id, from_location, to_location, note, moved_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(movement.id.to_string())
        .bind(movement.asset_id.to_string())
        .bind(&movement.from_location)
        .bind(&movement.to_location)
        .bind(&movement.note)
        .bind(movement.moved_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save movement")?;

        sqlx::query("UPDATE assets SET location = ? WHERE id = ?")
            .bind(&movement.to_location)
            .bind(movement.asset_id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update asset location")?;

        Ok(())
    }

    /// Movement history for an asset, oldest first.
    pub async fn list_movements(&self, asset_id: AssetId) -> Result<Vec<AssetMovement>> {
        let rows = sqlx::query(
            r#"
            SELECT id, asset_id, from_location, to_location, note, moved_at
            FROM asset_movements
            WHERE asset_id = ?
            ORDER BY moved_at
            "#,
        )
        .bind(asset_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list movements")?;

        rows.iter().map(Self::row_to_movement).collect()
    }

    fn row_to_asset(row: &sqlx::sqlite::SqliteRow) -> Result<Asset> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");
        let hidden_at_str: Option<String> = row.get("hidden_at");

        Ok(Asset {
            id: Uuid::parse_str(&id_str).context("Invalid asset ID")?,
            name: row.get("name"),
            code: row.get("code"),
            location: row.get("location"),
            acquired_on: row.get("acquired_on"),
            value_cents: row.get("value_cents"),
            note: row.get("note"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
            hidden_at: hidden_at_str
                .map(|s| DateTime::parse_from_rfc3339(&s))
                .transpose()
                .context("Invalid hidden_at timestamp")?
                .map(|dt| dt.with_timezone(&Utc)),
        })
    }

    fn row_to_movement(row: &sqlx::sqlite::SqliteRow) -> Result<AssetMovement> {
        let id_str: String = row.get("id");
        let asset_id_str: String = row.get("asset_id");
        let moved_at_str: String = row.get("moved_at");

        Ok(AssetMovement {
            id: Uuid::parse_str(&id_str).context("Invalid movement ID")?,
            asset_id: Uuid::parse_str(&asset_id_str).context("Invalid asset ID")?,
            from_location: row.get("from_location"),
            to_location: row.get("to_location"),
            note: row.get("note"),
            moved_at: DateTime::parse_from_rfc3339(&moved_at_str)
                .context("Invalid moved_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}
