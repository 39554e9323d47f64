use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{Account, AccountId, Cents};

/// Which categorical attribute of an account a summary groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    Company,
    Sector,
    Counterparty,
    Destination,
}

impl GroupKey {
    fn select<'a>(&self, account: &'a Account) -> Option<&'a str> {
        let value = match self {
            GroupKey::Company => account.company.as_deref(),
            GroupKey::Sector => account.sector.as_deref(),
            GroupKey::Counterparty => account.counterparty.as_deref(),
            GroupKey::Destination => account.destination.as_deref(),
        };
        // Whitespace-only labels group under the fallback, same as absent ones
        value.map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Inclusive date bounds for period totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The calendar month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        let start = date.with_day(1).unwrap_or(date);
        let end = start
            .checked_add_months(chrono::Months::new(1))
            .and_then(|d| d.pred_opt())
            .unwrap_or(date);
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Knobs for a single aggregation pass.
#[derive(Debug, Clone)]
pub struct AggregateOptions {
    pub group_by: GroupKey,
    /// Label for accounts whose grouping attribute is absent or blank
    pub fallback_label: String,
    /// When set, `period_totals` is restricted to entries dated inside it;
    /// otherwise `period_totals` equals the grand totals
    pub period: Option<Period>,
    /// Maximum number of ranked groups returned in `top_groups`
    pub top_limit: usize,
}

impl AggregateOptions {
    pub fn new(group_by: GroupKey) -> Self {
        Self {
            group_by,
            fallback_label: "OTHERS".to_string(),
            period: None,
            top_limit: 5,
        }
    }

    pub fn with_fallback_label(mut self, label: impl Into<String>) -> Self {
        self.fallback_label = label.into();
        self
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    pub fn with_top_limit(mut self, top_limit: usize) -> Self {
        self.top_limit = top_limit;
        self
    }
}

/// Totals accumulated for one group label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTotals {
    /// Number of accounts that fell into this group
    pub count: i64,
    pub total_credits: Cents,
    pub total_debits: Cents,
}

impl GroupTotals {
    pub fn balance(&self) -> Cents {
        self.total_credits - self.total_debits
    }
}

/// Credit/debit totals restricted to the requested period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub total_credits: Cents,
    pub total_debits: Cents,
}

impl PeriodTotals {
    pub fn net(&self) -> Cents {
        self.total_credits - self.total_debits
    }
}

/// Output of one aggregation pass over a set of accounts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregationResult {
    /// Sum of every parseable credit across all accounts
    pub total_credits: Cents,
    /// Sum of every parseable debit across all accounts
    pub total_debits: Cents,
    /// `total_credits - total_debits`; carried-forward balances do not move it
    pub net_balance: Cents,
    /// Account balance = credits - debits + previous_balance (when present)
    pub per_account_balance: HashMap<AccountId, Cents>,
    pub grouped_totals: HashMap<String, GroupTotals>,
    pub period_totals: PeriodTotals,
    /// Group labels ranked by account count, truncated to `top_limit`.
    /// Ties keep the order in which a label was first seen in the input.
    pub top_groups: Vec<(String, i64)>,
}

/// Aggregate accounts and their entries into totals, balances, grouped
/// breakdowns and a top-group ranking.
///
/// This is the single replacement for the per-screen summary computations of
/// the original system. It is pure and infallible: malformed amounts count as
/// zero, entries with unparseable dates are skipped by the period filter but
/// still feed the grand totals, and hidden-account filtering is the caller's
/// job before this point.
pub fn aggregate(accounts: &[Account], options: &AggregateOptions) -> AggregationResult {
    let mut result = AggregationResult::default();
    // First-seen position of each group label, for the ranking tie-break
    let mut group_order: Vec<String> = Vec::new();
    let mut in_period = PeriodTotals::default();

    for account in accounts {
        let mut credits: Cents = 0;
        let mut debits: Cents = 0;

        for entry in &account.entries {
            let credit = entry.credit_cents().unwrap_or(0);
            let debit = entry.debit_cents().unwrap_or(0);
            credits += credit;
            debits += debit;

            if let (Some(period), Some(date)) = (options.period, entry.calendar_date()) {
                if period.contains(date) {
                    in_period.total_credits += credit;
                    in_period.total_debits += debit;
                }
            }
        }

        let balance = credits - debits + account.previous_balance.unwrap_or(0);
        result.per_account_balance.insert(account.id, balance);
        result.total_credits += credits;
        result.total_debits += debits;

        let label = options
            .group_by
            .select(account)
            .unwrap_or(options.fallback_label.as_str());
        let group = result
            .grouped_totals
            .entry(label.to_string())
            .or_insert_with(|| {
                group_order.push(label.to_string());
                GroupTotals::default()
            });
        group.count += 1;
        group.total_credits += credits;
        group.total_debits += debits;
    }

    result.net_balance = result.total_credits - result.total_debits;
    result.period_totals = match options.period {
        Some(_) => in_period,
        None => PeriodTotals {
            total_credits: result.total_credits,
            total_debits: result.total_debits,
        },
    };

    let mut ranked: Vec<(String, i64)> = group_order
        .into_iter()
        .map(|label| {
            let count = result.grouped_totals[&label].count;
            (label, count)
        })
        .collect();
    // Stable sort: equal counts keep first-seen order
    ranked.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
    ranked.truncate(options.top_limit);
    result.top_groups = ranked;

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountKind, Entry};

    fn account(name: &str) -> Account {
        Account::new(name.into(), AccountKind::Current)
    }

    fn credit(date: &str, amount: &str) -> Entry {
        Entry::new(date).with_credit(amount)
    }

    fn debit(date: &str, amount: &str) -> Entry {
        Entry::new(date).with_debit(amount)
    }

    fn options() -> AggregateOptions {
        AggregateOptions::new(GroupKey::Company)
    }

    #[test]
    fn test_empty_input_yields_zero_result() {
        let result = aggregate(&[], &options());

        assert_eq!(result.total_credits, 0);
        assert_eq!(result.total_debits, 0);
        assert_eq!(result.net_balance, 0);
        assert!(result.per_account_balance.is_empty());
        assert!(result.grouped_totals.is_empty());
        assert!(result.top_groups.is_empty());
        assert_eq!(result.period_totals, PeriodTotals::default());
    }

    #[test]
    fn test_reference_scenario() {
        // Three accounts: entries, previous balance, and an empty one
        let a1 = account("Obra Sul").with_entries(vec![
            credit("2024-01-10", "100.00"),
            debit("2024-01-11", "30.00"),
        ]);
        let a2 = account("Obra Norte")
            .with_entries(vec![credit("2024-01-12", "50.50")])
            .with_previous_balance(2000);
        let a3 = account("Obra Leste");

        let result = aggregate(&[a1.clone(), a2.clone(), a3.clone()], &options());

        assert_eq!(result.total_credits, 15050);
        assert_eq!(result.total_debits, 3000);
        assert_eq!(result.net_balance, 12050);
        assert_eq!(result.per_account_balance[&a1.id], 7000);
        assert_eq!(result.per_account_balance[&a2.id], 7050);
        assert_eq!(result.per_account_balance[&a3.id], 0);
    }

    #[test]
    fn test_balance_is_entry_order_independent() {
        let entries = vec![
            credit("2024-02-01", "10.00"),
            debit("2024-02-02", "4.00"),
            credit("2024-02-03", "2.50"),
        ];
        let forward = account("a").with_entries(entries.clone());
        let mut reversed_entries = entries;
        reversed_entries.reverse();
        let backward = account("b").with_entries(reversed_entries);

        let fwd = aggregate(std::slice::from_ref(&forward), &options());
        let bwd = aggregate(std::slice::from_ref(&backward), &options());

        assert_eq!(fwd.per_account_balance[&forward.id], 850);
        assert_eq!(bwd.per_account_balance[&backward.id], 850);
    }

    #[test]
    fn test_grouping_preserves_grand_totals() {
        // Additivity: splitting into groups must not lose or double-count
        let accounts = vec![
            account("a")
                .with_company("Alfa")
                .with_entries(vec![credit("2024-01-01", "10.00")]),
            account("b")
                .with_company("Beta")
                .with_entries(vec![credit("2024-01-01", "20.00"), debit("2024-01-02", "5.00")]),
            account("c").with_entries(vec![debit("2024-01-03", "1.00")]),
        ];

        let result = aggregate(&accounts, &options());

        let group_credits: Cents = result
            .grouped_totals
            .values()
            .map(|g| g.total_credits)
            .sum();
        let group_debits: Cents = result.grouped_totals.values().map(|g| g.total_debits).sum();
        assert_eq!(group_credits, result.total_credits);
        assert_eq!(group_debits, result.total_debits);
        assert_eq!(result.total_credits, 3000);
        assert_eq!(result.total_debits, 600);
    }

    #[test]
    fn test_malformed_amount_counts_as_zero() {
        let acc = account("a").with_entries(vec![
            credit("2024-01-01", "abc"),
            credit("2024-01-02", "15.00"),
        ]);

        let result = aggregate(std::slice::from_ref(&acc), &options());

        assert_eq!(result.total_credits, 1500);
        assert_eq!(result.per_account_balance[&acc.id], 1500);
    }

    #[test]
    fn test_entry_with_both_credit_and_debit() {
        // A correction line may carry both sides at once
        let acc = account("a")
            .with_entries(vec![Entry::new("2024-01-01").with_credit("100").with_debit("40")]);

        let result = aggregate(std::slice::from_ref(&acc), &options());

        assert_eq!(result.total_credits, 10000);
        assert_eq!(result.total_debits, 4000);
        assert_eq!(result.per_account_balance[&acc.id], 6000);
    }

    #[test]
    fn test_blank_entry_contributes_nothing() {
        let acc = account("a").with_entries(vec![
            Entry::new("2024-01-01").with_note("memo only"),
            credit("2024-01-02", "1.00"),
        ]);

        let result = aggregate(std::slice::from_ref(&acc), &options());

        assert_eq!(result.total_credits, 100);
        assert_eq!(result.total_debits, 0);
    }

    #[test]
    fn test_period_totals_inclusive_bounds() {
        let acc = account("a").with_entries(vec![
            credit("2024-02-28", "10.00"),
            credit("2024-03-01", "20.00"),
            credit("2024-03-15", "30.00"),
            credit("2024-03-31", "40.00"),
            credit("2024-04-01", "50.00"),
        ]);
        let opts = options().with_period(Period::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        ));

        let result = aggregate(std::slice::from_ref(&acc), &opts);

        assert_eq!(result.period_totals.total_credits, 9000);
        assert_eq!(result.total_credits, 15000);
    }

    #[test]
    fn test_malformed_date_skips_period_but_not_grand_totals() {
        let acc = account("a").with_entries(vec![
            credit("sometime in march", "10.00"),
            credit("2024-03-10", "5.00"),
        ]);
        let opts = options().with_period(Period::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        ));

        let result = aggregate(std::slice::from_ref(&acc), &opts);

        assert_eq!(result.period_totals.total_credits, 500);
        assert_eq!(result.total_credits, 1500);
    }

    #[test]
    fn test_period_totals_default_to_grand_totals() {
        let acc = account("a").with_entries(vec![credit("2024-01-01", "7.00")]);
        let result = aggregate(std::slice::from_ref(&acc), &options());

        assert_eq!(result.period_totals.total_credits, result.total_credits);
        assert_eq!(result.period_totals.net(), result.net_balance);
    }

    #[test]
    fn test_fallback_label_grouping() {
        let accounts = vec![
            account("a").with_company("Alfa"),
            account("b"),
            account("c").with_company("   "),
        ];
        let opts = options().with_fallback_label("No company");

        let result = aggregate(&accounts, &opts);

        assert_eq!(result.grouped_totals["Alfa"].count, 1);
        assert_eq!(result.grouped_totals["No company"].count, 2);
    }

    #[test]
    fn test_top_groups_tie_break_is_first_seen_order() {
        // Counts: A=5, B=3, C=3, D=1; B appears before C in the input
        let mut accounts = Vec::new();
        for (label, count) in [("A", 5), ("B", 3), ("C", 3), ("D", 1)] {
            for i in 0..count {
                accounts.push(
                    account(&format!("{label}-{i}")).with_destination(label),
                );
            }
        }

        let opts = AggregateOptions::new(GroupKey::Destination).with_top_limit(2);
        let result = aggregate(&accounts, &opts);

        assert_eq!(
            result.top_groups,
            vec![("A".to_string(), 5), ("B".to_string(), 3)]
        );
    }

    #[test]
    fn test_top_groups_tie_break_tracks_input_order() {
        // Same counts, C now encountered before B
        let mut accounts = Vec::new();
        for (label, count) in [("A", 5), ("C", 3), ("B", 3), ("D", 1)] {
            for i in 0..count {
                accounts.push(
                    account(&format!("{label}-{i}")).with_destination(label),
                );
            }
        }

        let opts = AggregateOptions::new(GroupKey::Destination).with_top_limit(2);
        let result = aggregate(&accounts, &opts);

        assert_eq!(
            result.top_groups,
            vec![("A".to_string(), 5), ("C".to_string(), 3)]
        );
    }

    #[test]
    fn test_negative_balance_is_not_clamped() {
        let acc = account("a").with_entries(vec![debit("2024-01-01", "80.00")]);
        let result = aggregate(std::slice::from_ref(&acc), &options());

        assert_eq!(result.net_balance, -8000);
        assert_eq!(result.per_account_balance[&acc.id], -8000);
    }

    #[test]
    fn test_month_period_helper() {
        let period = Period::month_of(NaiveDate::from_ymd_opt(2024, 2, 15).unwrap());
        assert_eq!(period.start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(period.end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert!(period.contains(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
        assert!(!period.contains(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
    }
}
