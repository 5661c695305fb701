//! Repayment tracking.
//!
//! Covers:
//! 1. **Search & filter** -- client name / loan id search, status and agent filters.
//! 2. **Status totals** -- paid, pending and overdue amounts and counts.
//! 3. **Collection rate** -- paid amount / total amount due.
//! 4. **Overdue penalties** -- days past due and a flat late penalty per instalment.
//! 5. **Agent breakdown** -- collections grouped by field agent.
//!
//! All arithmetic uses `rust_decimal::Decimal`. No `f64`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::error::LendingError;
use crate::types::*;
use crate::LendingResult;

/// Late penalty applied to an overdue instalment when none is configured.
pub const DEFAULT_PENALTY_RATE_PCT: Decimal = dec!(5);

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepaymentStatus {
    Paid,
    Pending,
    Overdue,
}

impl RepaymentStatus {
    pub const ALL: [RepaymentStatus; 3] = [
        RepaymentStatus::Paid,
        RepaymentStatus::Pending,
        RepaymentStatus::Overdue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RepaymentStatus::Paid => "paid",
            RepaymentStatus::Pending => "pending",
            RepaymentStatus::Overdue => "overdue",
        }
    }
}

impl fmt::Display for RepaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepaymentStatus {
    type Err = LendingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RepaymentStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                LendingError::invalid(
                    "status",
                    format!("Unknown repayment status '{s}' (expected paid, pending or overdue)"),
                )
            })
    }
}

/// Parse a status filter as entered on the repayments page: `all` (or an
/// empty string) disables the filter.
pub fn parse_status_filter(s: &str) -> LendingResult<Option<RepaymentStatus>> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    s.parse().map(Some)
}

/// A single scheduled repayment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentRecord {
    pub id: String,
    pub client_name: String,
    pub loan_id: String,
    pub amount: Money,
    pub due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<NaiveDate>,
    pub status: RepaymentStatus,
    /// Payment channel (mobile money, bank transfer, cash).
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub agent: String,
}

/// Search and filter criteria.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepaymentQuery {
    /// Case-insensitive substring of client name or loan id.
    #[serde(default)]
    pub search: String,
    /// `None` matches every status.
    #[serde(default)]
    pub status: Option<RepaymentStatus>,
    #[serde(default)]
    pub agent: Option<String>,
}

impl RepaymentQuery {
    pub fn matches(&self, record: &RepaymentRecord) -> bool {
        let needle = self.search.trim().to_lowercase();
        let matches_search = needle.is_empty()
            || record.client_name.to_lowercase().contains(&needle)
            || record.loan_id.to_lowercase().contains(&needle);
        let matches_status = self.status.map_or(true, |s| s == record.status);
        let matches_agent = self
            .agent
            .as_deref()
            .map_or(true, |a| a.trim().eq_ignore_ascii_case(record.agent.trim()));
        matches_search && matches_status && matches_agent
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaymentSummaryInput {
    pub records: Vec<RepaymentRecord>,
    /// Date against which days overdue are measured.
    pub as_of: NaiveDate,
    #[serde(default = "default_penalty_rate_pct")]
    pub penalty_rate_pct: Percent,
}

fn default_penalty_rate_pct() -> Percent {
    DEFAULT_PENALTY_RATE_PCT
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusTotal {
    pub status: RepaymentStatus,
    pub count: u64,
    pub amount: Money,
    pub pct: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTotal {
    pub agent: String,
    pub count: u64,
    pub collected: Money,
    pub outstanding: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverdueItem {
    pub id: String,
    pub loan_id: String,
    pub client_name: String,
    pub amount: Money,
    pub due_date: NaiveDate,
    pub days_overdue: i64,
    pub penalty: Money,
    pub amount_with_penalty: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaymentSummaryOutput {
    pub total_due: Money,
    pub total_paid: Money,
    pub total_pending: Money,
    pub total_overdue: Money,
    /// Paid / total due.
    pub collection_rate: Decimal,
    pub status_breakdown: Vec<StatusTotal>,
    pub agent_breakdown: Vec<AgentTotal>,
    pub overdue: Vec<OverdueItem>,
    pub total_penalties: Money,
}

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

/// Records matching every criterion in `query`, in input order.
pub fn filter_repayments<'a>(
    records: &'a [RepaymentRecord],
    query: &RepaymentQuery,
) -> Vec<&'a RepaymentRecord> {
    records.iter().filter(|r| query.matches(r)).collect()
}

/// Totals by status and agent, collection rate and overdue penalties.
pub fn summarize_repayments(
    input: &RepaymentSummaryInput,
) -> LendingResult<ComputationOutput<RepaymentSummaryOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    validate_summary_input(input)?;

    tracing::debug!(records = input.records.len(), as_of = %input.as_of, "summarizing repayments");

    let total_due: Decimal = input.records.iter().map(|r| r.amount).sum();
    let status_breakdown = build_status_breakdown(&input.records, total_due);
    let amount_for = |status: RepaymentStatus| {
        status_breakdown
            .iter()
            .find(|s| s.status == status)
            .map(|s| s.amount)
            .unwrap_or(Decimal::ZERO)
    };
    let total_paid = amount_for(RepaymentStatus::Paid);
    let total_pending = amount_for(RepaymentStatus::Pending);
    let total_overdue = amount_for(RepaymentStatus::Overdue);

    let collection_rate = if total_due > Decimal::ZERO {
        total_paid / total_due
    } else {
        Decimal::ZERO
    };

    let penalty_rate = pct_to_rate(input.penalty_rate_pct);
    let mut overdue = Vec::new();
    for record in &input.records {
        match record.status {
            RepaymentStatus::Overdue => {
                let days_overdue = (input.as_of - record.due_date).num_days().max(0);
                let penalty = record.amount * penalty_rate;
                overdue.push(OverdueItem {
                    id: record.id.clone(),
                    loan_id: record.loan_id.clone(),
                    client_name: record.client_name.clone(),
                    amount: record.amount,
                    due_date: record.due_date,
                    days_overdue,
                    penalty,
                    amount_with_penalty: record.amount + penalty,
                });
            }
            RepaymentStatus::Pending if record.due_date < input.as_of => {
                warnings.push(format!(
                    "Repayment '{}' ({}) is pending but was due on {}",
                    record.id, record.loan_id, record.due_date
                ));
            }
            _ => {}
        }
    }
    // Longest outstanding first
    overdue.sort_by(|a, b| b.days_overdue.cmp(&a.days_overdue));
    let total_penalties: Decimal = overdue.iter().map(|o| o.penalty).sum();

    let output = RepaymentSummaryOutput {
        total_due,
        total_paid,
        total_pending,
        total_overdue,
        collection_rate,
        status_breakdown,
        agent_breakdown: build_agent_breakdown(&input.records),
        overdue,
        total_penalties,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Repayment status summary",
        &serde_json::json!({
            "records": input.records.len(),
            "as_of": input.as_of,
            "penalty_rate_pct": input.penalty_rate_pct.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn build_status_breakdown(records: &[RepaymentRecord], total: Decimal) -> Vec<StatusTotal> {
    let mut map: BTreeMap<RepaymentStatus, (u64, Decimal)> = BTreeMap::new();
    for record in records {
        let entry = map.entry(record.status).or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 += record.amount;
    }
    RepaymentStatus::ALL
        .iter()
        .map(|status| {
            let (count, amount) = map.get(status).copied().unwrap_or((0, Decimal::ZERO));
            StatusTotal {
                status: *status,
                count,
                amount,
                pct: if total > Decimal::ZERO {
                    amount / total
                } else {
                    Decimal::ZERO
                },
            }
        })
        .collect()
}

fn build_agent_breakdown(records: &[RepaymentRecord]) -> Vec<AgentTotal> {
    let mut map: BTreeMap<String, AgentTotal> = BTreeMap::new();
    for record in records {
        let name = if record.agent.trim().is_empty() {
            "unassigned".to_string()
        } else {
            record.agent.trim().to_string()
        };
        let entry = map.entry(name.clone()).or_insert(AgentTotal {
            agent: name,
            count: 0,
            collected: Decimal::ZERO,
            outstanding: Decimal::ZERO,
        });
        entry.count += 1;
        if record.status == RepaymentStatus::Paid {
            entry.collected += record.amount;
        } else {
            entry.outstanding += record.amount;
        }
    }
    let mut items: Vec<AgentTotal> = map.into_values().collect();
    // Most outstanding first
    items.sort_by(|a, b| b.outstanding.cmp(&a.outstanding));
    items
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_summary_input(input: &RepaymentSummaryInput) -> LendingResult<()> {
    if input.records.is_empty() {
        return Err(LendingError::InsufficientData(
            "At least one repayment record is required.".into(),
        ));
    }
    if input.penalty_rate_pct < Decimal::ZERO {
        return Err(LendingError::invalid(
            "penalty_rate_pct",
            "Penalty rate cannot be negative.",
        ));
    }
    for record in &input.records {
        if record.amount < Decimal::ZERO {
            return Err(LendingError::InvalidInput {
                field: "amount".into(),
                reason: format!("Repayment '{}' has a negative amount.", record.id),
            });
        }
        if record.status == RepaymentStatus::Paid && record.paid_date.is_none() {
            return Err(LendingError::InvalidInput {
                field: "paid_date".into(),
                reason: format!("Repayment '{}' is marked paid without a paid date.", record.id),
            });
        }
    }
    Ok(())
}
