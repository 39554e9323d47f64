mod common;

use anyhow::Result;
use caixa::application::AppError;
use caixa::domain::AccountKind;
use common::{credit, debit, test_service, StandardAccounts};

#[tokio::test]
async fn test_create_and_show_account() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let account = service
        .create_account(
            "Obra Sul".into(),
            Some("Alfa Construções".into()),
            Some("Engenharia".into()),
            None,
        )
        .await?;
    assert_eq!(account.kind, AccountKind::Current);

    let info = service.get_account_info("Obra Sul").await?;
    assert_eq!(info.account.company.as_deref(), Some("Alfa Construções"));
    assert_eq!(info.entry_count, 0);
    assert_eq!(info.balance, 0);

    Ok(())
}

#[tokio::test]
async fn test_duplicate_account_name_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service
        .create_account("Obra Sul".into(), None, None, None)
        .await?;
    let result = service
        .create_account("Obra Sul".into(), None, None, None)
        .await;

    assert!(matches!(result, Err(AppError::AccountAlreadyExists(_))));
    Ok(())
}

#[tokio::test]
async fn test_entries_move_the_balance() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardAccounts::create_basic(&service).await?;

    credit(&service, "Obra Sul", "2024-01-10", "100.00").await?;
    debit(&service, "Obra Sul", "2024-01-11", "30.00").await?;

    let info = service.get_account_info("Obra Sul").await?;
    assert_eq!(info.total_credits, 10000);
    assert_eq!(info.total_debits, 3000);
    assert_eq!(info.balance, 7000);
    assert_eq!(info.entry_count, 2);

    Ok(())
}

#[tokio::test]
async fn test_entry_with_both_sides() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardAccounts::create_basic(&service).await?;

    // Correction line: inflow and outflow on the same row
    service
        .add_entry(
            "Obra Sul",
            "2024-02-01",
            Some("100.00".into()),
            Some("40.00".into()),
            Some("NF-1234".into()),
            Some("acerto".into()),
        )
        .await?;

    let info = service.get_account_info("Obra Sul").await?;
    assert_eq!(info.total_credits, 10000);
    assert_eq!(info.total_debits, 4000);
    assert_eq!(info.balance, 6000);

    Ok(())
}

#[tokio::test]
async fn test_entry_validation_at_the_boundary() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardAccounts::create_basic(&service).await?;

    let no_amount = service
        .add_entry("Obra Sul", "2024-01-01", None, None, None, None)
        .await;
    assert!(matches!(no_amount, Err(AppError::EmptyEntry)));

    let bad_amount = service
        .add_entry(
            "Obra Sul",
            "2024-01-01",
            Some("cem reais".into()),
            None,
            None,
            None,
        )
        .await;
    assert!(matches!(bad_amount, Err(AppError::InvalidAmount(_))));

    let bad_date = service
        .add_entry(
            "Obra Sul",
            "10/01/2024",
            Some("10.00".into()),
            None,
            None,
            None,
        )
        .await;
    assert!(matches!(bad_date, Err(AppError::InvalidDate(_))));

    Ok(())
}

#[tokio::test]
async fn test_hidden_account_excluded_from_listings() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardAccounts::create_basic(&service).await?;

    service.hide_account("Escritório").await?;

    let visible = service.list_accounts(None, false).await?;
    assert_eq!(visible.len(), 2);
    assert!(visible.iter().all(|a| a.name != "Escritório"));

    let everything = service.list_accounts(None, true).await?;
    assert_eq!(everything.len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_cannot_record_on_hidden_account() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardAccounts::create_basic(&service).await?;

    service.hide_account("Obra Norte").await?;
    let result = credit(&service, "Obra Norte", "2024-01-01", "10.00").await;

    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn test_unknown_account() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service.get_account("Caixa Dois").await;
    assert!(matches!(result, Err(AppError::AccountNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_listed_entries_keep_stored_text() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardAccounts::create_basic(&service).await?;

    service
        .add_entry(
            "Obra Sul",
            "2024-03-05",
            Some("150.5".into()),
            None,
            None,
            None,
        )
        .await?;

    let entries = service.list_entries("Obra Sul").await?;
    assert_eq!(entries.len(), 1);
    // Stored as entered, parsed on demand
    assert_eq!(entries[0].credit.as_deref(), Some("150.5"));
    assert_eq!(entries[0].credit_cents(), Some(15050));

    Ok(())
}
