// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use caixa::application::LedgerService;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Record a credit entry with only date and amount
pub async fn credit(service: &LedgerService, account: &str, date: &str, amount: &str) -> Result<()> {
    service
        .add_entry(account, date, Some(amount.into()), None, None, None)
        .await?;
    Ok(())
}

/// Record a debit entry with only date and amount
pub async fn debit(service: &LedgerService, account: &str, date: &str, amount: &str) -> Result<()> {
    service
        .add_entry(account, date, None, Some(amount.into()), None, None)
        .await?;
    Ok(())
}

/// Test fixture: a pair of running accounts per company
pub struct StandardAccounts;

impl StandardAccounts {
    pub async fn create_basic(service: &LedgerService) -> Result<()> {
        service
            .create_account(
                "Obra Sul".into(),
                Some("Alfa Construções".into()),
                Some("Engenharia".into()),
                None,
            )
            .await?;
        service
            .create_account(
                "Obra Norte".into(),
                Some("Alfa Construções".into()),
                Some("Engenharia".into()),
                None,
            )
            .await?;
        service
            .create_account(
                "Escritório".into(),
                Some("Beta Serviços".into()),
                Some("Administrativo".into()),
                None,
            )
            .await?;
        Ok(())
    }
}
