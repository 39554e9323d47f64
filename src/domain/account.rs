use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;
use super::money::parse_cents_lenient;

pub type AccountId = Uuid;
pub type EntryId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    /// Running account ("conta corrente") tied to a company or counterparty
    Current,
    /// Travel expense box ("caixa de viagem") scoped to a trip/destination
    TravelBox,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Current => "current",
            AccountKind::TravelBox => "travel_box",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "current" => Some(AccountKind::Current),
            "travel_box" | "box" => Some(AccountKind::TravelBox),
            _ => None,
        }
    }
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single dated ledger movement ("lançamento").
///
/// Amounts and dates are kept as the free text the user typed. Years of legacy
/// records contain rows like `credit = "R$ cem"` or `date = "ontem"`, and the
/// system is required to keep displaying best-effort totals over them, so the
/// typed accessors below parse leniently instead of rejecting the row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    /// Calendar date as entered, expected "YYYY-MM-DD"
    pub date: String,
    /// Credit amount as entered (money in), if any
    pub credit: Option<String>,
    /// Debit amount as entered (money out), if any
    pub debit: Option<String>,
    /// Receipt or document number
    pub document_number: Option<String>,
    pub note: Option<String>,
    /// When this entry was recorded in the system
    pub recorded_at: DateTime<Utc>,
}

impl Entry {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: date.into(),
            credit: None,
            debit: None,
            document_number: None,
            note: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_credit(mut self, credit: impl Into<String>) -> Self {
        self.credit = Some(credit.into());
        self
    }

    pub fn with_debit(mut self, debit: impl Into<String>) -> Self {
        self.debit = Some(debit.into());
        self
    }

    pub fn with_document_number(mut self, document_number: impl Into<String>) -> Self {
        self.document_number = Some(document_number.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Credit amount in cents; `None` when unset or unparseable.
    pub fn credit_cents(&self) -> Option<Cents> {
        self.credit.as_deref().and_then(parse_cents_lenient)
    }

    /// Debit amount in cents; `None` when unset or unparseable.
    pub fn debit_cents(&self) -> Option<Cents> {
        self.debit.as_deref().and_then(parse_cents_lenient)
    }

    /// Entry date; `None` when the stored text is not a valid calendar date.
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()
    }

    /// An entry carrying neither a credit nor a debit is a no-op for totals.
    pub fn is_blank(&self) -> bool {
        self.credit.is_none() && self.debit.is_none()
    }
}

/// A named container of entries: a running account or a travel box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub kind: AccountKind,
    /// Company the account belongs to
    pub company: Option<String>,
    /// Internal sector (e.g. "Engenharia", "Administrativo")
    pub sector: Option<String>,
    /// Supplier or client the account settles against
    pub counterparty: Option<String>,
    /// Trip destination, for travel boxes
    pub destination: Option<String>,
    /// Ending balance carried over from the preceding box in a sequence
    pub previous_balance: Option<Cents>,
    pub entries: Vec<Entry>,
    pub created_at: DateTime<Utc>,
    /// Soft-delete marker ("oculto"); hidden accounts are excluded from listings
    pub hidden_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn new(name: String, kind: AccountKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            kind,
            company: None,
            sector: None,
            counterparty: None,
            destination: None,
            previous_balance: None,
            entries: Vec::new(),
            created_at: Utc::now(),
            hidden_at: None,
        }
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    pub fn with_counterparty(mut self, counterparty: impl Into<String>) -> Self {
        self.counterparty = Some(counterparty.into());
        self
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn with_previous_balance(mut self, previous_balance: Cents) -> Self {
        self.previous_balance = Some(previous_balance);
        self
    }

    pub fn with_entries(mut self, entries: Vec<Entry>) -> Self {
        self.entries = entries;
        self
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden_at.is_some()
    }
}
