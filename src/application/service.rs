use chrono::{NaiveDate, Utc};

use crate::domain::{
    aggregate, Account, AccountKind, AggregateOptions, AggregationResult, Asset, AssetMovement,
    Cents, Entry, GroupKey, Period, parse_cents,
};
use crate::storage::Repository;

use super::AppError;

/// Application service providing high-level operations over accounts, travel
/// boxes and assets. This is the primary interface for any client (CLI, API).
pub struct LedgerService {
    repo: Repository,
}

/// Detailed account information
pub struct AccountInfo {
    pub account: Account,
    pub balance: Cents,
    pub total_credits: Cents,
    pub total_debits: Cents,
    pub entry_count: usize,
}

/// Balance line for a listing
pub struct BalanceEntry {
    pub account: Account,
    pub balance: Cents,
}

/// Result of relocating an asset
pub struct MovementResult {
    pub asset: Asset,
    pub movement: AssetMovement,
}

/// Parameters for a summary query
pub struct SummaryRequest {
    pub kind: Option<AccountKind>,
    pub group_by: GroupKey,
    pub fallback_label: String,
    pub period: Option<Period>,
    pub top_limit: usize,
}

impl Default for SummaryRequest {
    fn default() -> Self {
        Self {
            kind: None,
            group_by: GroupKey::Company,
            fallback_label: "OTHERS".to_string(),
            period: None,
            top_limit: 5,
        }
    }
}

impl LedgerService {
    /// Create a new service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Account operations
    // ========================

    /// Create a new running account.
    pub async fn create_account(
        &self,
        name: String,
        company: Option<String>,
        sector: Option<String>,
        counterparty: Option<String>,
    ) -> Result<Account, AppError> {
        if self.repo.get_account_by_name(&name).await?.is_some() {
            return Err(AppError::AccountAlreadyExists(name));
        }

        let mut account = Account::new(name, AccountKind::Current);
        if let Some(company) = company {
            account = account.with_company(company);
        }
        if let Some(sector) = sector {
            account = account.with_sector(sector);
        }
        if let Some(counterparty) = counterparty {
            account = account.with_counterparty(counterparty);
        }

        self.repo.save_account(&account).await?;
        Ok(account)
    }

    /// Create a new travel box. When `follows` names a preceding box, the new
    /// box starts from that box's ending balance; otherwise `opening_balance`
    /// (if any) is used.
    pub async fn create_travel_box(
        &self,
        name: String,
        destination: String,
        company: Option<String>,
        follows: Option<&str>,
        opening_balance: Option<Cents>,
    ) -> Result<Account, AppError> {
        if self.repo.get_account_by_name(&name).await?.is_some() {
            return Err(AppError::AccountAlreadyExists(name));
        }

        let previous_balance = match follows {
            Some(previous_name) => Some(self.account_balance(previous_name).await?),
            None => opening_balance,
        };

        let mut account = Account::new(name, AccountKind::TravelBox).with_destination(destination);
        if let Some(company) = company {
            account = account.with_company(company);
        }
        if let Some(balance) = previous_balance {
            account = account.with_previous_balance(balance);
        }

        self.repo.save_account(&account).await?;
        Ok(account)
    }

    /// Get an account by name.
    pub async fn get_account(&self, name: &str) -> Result<Account, AppError> {
        self.repo
            .get_account_by_name(name)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(name.to_string()))
    }

    /// Get an account with entries and computed totals.
    pub async fn get_account_info(&self, name: &str) -> Result<AccountInfo, AppError> {
        let mut account = self.get_account(name).await?;
        account.entries = self.repo.list_entries(account.id).await?;

        let result = aggregate(
            std::slice::from_ref(&account),
            &AggregateOptions::new(GroupKey::Company),
        );

        Ok(AccountInfo {
            balance: result.per_account_balance[&account.id],
            total_credits: result.total_credits,
            total_debits: result.total_debits,
            entry_count: account.entries.len(),
            account,
        })
    }

    /// List accounts, optionally filtered by kind.
    pub async fn list_accounts(
        &self,
        kind: Option<AccountKind>,
        include_hidden: bool,
    ) -> Result<Vec<Account>, AppError> {
        Ok(self.repo.list_accounts(kind, include_hidden).await?)
    }

    /// List visible accounts with their computed balances.
    pub async fn list_balances(
        &self,
        kind: Option<AccountKind>,
    ) -> Result<Vec<BalanceEntry>, AppError> {
        let accounts = self.repo.list_accounts_with_entries(kind, false).await?;
        let result = aggregate(&accounts, &AggregateOptions::new(GroupKey::Company));

        Ok(accounts
            .into_iter()
            .map(|account| {
                let balance = result
                    .per_account_balance
                    .get(&account.id)
                    .copied()
                    .unwrap_or(0);
                BalanceEntry { account, balance }
            })
            .collect())
    }

    /// Hide an account (soft delete).
    pub async fn hide_account(&self, name: &str) -> Result<Account, AppError> {
        let account = self.get_account(name).await?;
        self.repo.hide_account(account.id).await?;
        Ok(account)
    }

    /// Balance of a single account (credits - debits + carried-over balance).
    pub async fn account_balance(&self, name: &str) -> Result<Cents, AppError> {
        Ok(self.get_account_info(name).await?.balance)
    }

    // ========================
    // Entry operations
    // ========================

    /// Record a ledger entry on an account. Amounts are validated here, at the
    /// boundary, so new data is clean; stored legacy rows stay as they are.
    #[allow(clippy::too_many_arguments)]
    pub async fn add_entry(
        &self,
        account_name: &str,
        date: &str,
        credit: Option<String>,
        debit: Option<String>,
        document_number: Option<String>,
        note: Option<String>,
    ) -> Result<Entry, AppError> {
        let account = self.get_account(account_name).await?;
        if account.is_hidden() {
            return Err(AppError::AccountHidden(account_name.to_string()));
        }

        if credit.is_none() && debit.is_none() {
            return Err(AppError::EmptyEntry);
        }
        for amount in credit.iter().chain(debit.iter()) {
            parse_cents(amount).map_err(|_| AppError::InvalidAmount(amount.clone()))?;
        }
        NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|_| AppError::InvalidDate(date.to_string()))?;

        let mut entry = Entry::new(date.trim());
        if let Some(credit) = credit {
            entry = entry.with_credit(credit);
        }
        if let Some(debit) = debit {
            entry = entry.with_debit(debit);
        }
        if let Some(document_number) = document_number {
            entry = entry.with_document_number(document_number);
        }
        if let Some(note) = note {
            entry = entry.with_note(note);
        }

        self.repo.save_entry(account.id, &entry).await?;
        Ok(entry)
    }

    /// List the entries of an account.
    pub async fn list_entries(&self, account_name: &str) -> Result<Vec<Entry>, AppError> {
        let account = self.get_account(account_name).await?;
        Ok(self.repo.list_entries(account.id).await?)
    }

    // ========================
    // Summary operations
    // ========================

    /// Run one aggregation pass over the visible accounts. All summary screens
    /// go through here; only the grouping key, period and limit vary.
    pub async fn summary(&self, request: SummaryRequest) -> Result<AggregationResult, AppError> {
        let accounts = self
            .repo
            .list_accounts_with_entries(request.kind, false)
            .await?;

        let mut options = AggregateOptions::new(request.group_by)
            .with_fallback_label(request.fallback_label)
            .with_top_limit(request.top_limit);
        if let Some(period) = request.period {
            options = options.with_period(period);
        }

        Ok(aggregate(&accounts, &options))
    }

    /// Summary restricted to the current calendar month.
    pub async fn month_summary(
        &self,
        group_by: GroupKey,
    ) -> Result<AggregationResult, AppError> {
        let today = Utc::now().date_naive();
        self.summary(SummaryRequest {
            group_by,
            period: Some(Period::month_of(today)),
            ..SummaryRequest::default()
        })
        .await
    }

    // ========================
    // Asset operations
    // ========================

    /// Register a new asset in the patrimony registry.
    pub async fn register_asset(
        &self,
        name: String,
        code: String,
        location: Option<String>,
        acquired_on: Option<String>,
        value_cents: Option<Cents>,
    ) -> Result<Asset, AppError> {
        if self.repo.get_asset_by_code(&code).await?.is_some() {
            return Err(AppError::AssetAlreadyExists(code));
        }

        let mut asset = Asset::new(name, code);
        if let Some(location) = location {
            asset = asset.with_location(location);
        }
        if let Some(acquired_on) = acquired_on {
            asset = asset.with_acquired_on(acquired_on);
        }
        if let Some(value) = value_cents {
            asset = asset.with_value_cents(value);
        }

        self.repo.save_asset(&asset).await?;
        Ok(asset)
    }

    /// Get an asset by code.
    pub async fn get_asset(&self, code: &str) -> Result<Asset, AppError> {
        self.repo
            .get_asset_by_code(code)
            .await?
            .ok_or_else(|| AppError::AssetNotFound(code.to_string()))
    }

    /// List assets.
    pub async fn list_assets(&self, include_hidden: bool) -> Result<Vec<Asset>, AppError> {
        Ok(self.repo.list_assets(include_hidden).await?)
    }

    /// Relocate an asset, recording the movement in its history.
    pub async fn move_asset(
        &self,
        code: &str,
        to_location: &str,
        note: Option<String>,
    ) -> Result<MovementResult, AppError> {
        let asset = self.get_asset(code).await?;

        let mut movement = asset.move_to(to_location);
        if let Some(note) = note {
            movement = movement.with_note(note);
        }

        self.repo.save_movement(&movement).await?;
        Ok(MovementResult { asset, movement })
    }

    /// Movement history for an asset, oldest first.
    pub async fn asset_history(&self, code: &str) -> Result<Vec<AssetMovement>, AppError> {
        let asset = self.get_asset(code).await?;
        Ok(self.repo.list_movements(asset.id).await?)
    }

    /// Hide an asset (soft delete).
    pub async fn hide_asset(&self, code: &str) -> Result<Asset, AppError> {
        let asset = self.get_asset(code).await?;
        self.repo.hide_asset(asset.id).await?;
        Ok(asset)
    }
}
