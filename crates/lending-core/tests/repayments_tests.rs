use chrono::NaiveDate;
use lending_core::repayments::tracker::{
    filter_repayments, parse_status_filter, summarize_repayments, RepaymentQuery,
    RepaymentRecord, RepaymentStatus, RepaymentSummaryInput,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const BOOK: &str = r#"[
  {"id":"1","client_name":"Tendai Mukamuri","loan_id":"L001","amount":"10500","due_date":"2024-01-15","paid_date":"2024-01-14","status":"paid","method":"EcoCash","agent":"Sharon Chidziva"},
  {"id":"2","client_name":"Chipo Moyo","loan_id":"L002","amount":"7000","due_date":"2024-01-16","status":"pending","method":"OneMoney","agent":"Peter Mutasa"},
  {"id":"3","client_name":"Blessing Chikwanha","loan_id":"L003","amount":"14000","due_date":"2024-01-10","status":"overdue","method":"Cash","agent":"Faith Nyoni"},
  {"id":"4","client_name":"Tapiwa Mujuru","loan_id":"L004","amount":"8400","due_date":"2024-01-18","status":"pending","method":"CBZ Bank Transfer","agent":"David Mukucha"},
  {"id":"5","client_name":"Memory Sibanda","loan_id":"L005","amount":"17500","due_date":"2024-01-12","paid_date":"2024-01-12","status":"paid","method":"EcoCash","agent":"Sarah Tsvangirayi"},
  {"id":"6","client_name":"Ngonidzashe Mapfumo","loan_id":"L006","amount":"21000","due_date":"2024-01-20","status":"pending","method":"Steward Bank","agent":"Sharon Chidziva"},
  {"id":"7","client_name":"Priscilla Dube","loan_id":"L007","amount":"5600","due_date":"2024-01-08","paid_date":"2024-01-08","status":"paid","method":"NMB Bank","agent":"Peter Mutasa"},
  {"id":"8","client_name":"Wellington Chiware","loan_id":"L008","amount":"31500","due_date":"2024-01-25","status":"overdue","method":"CABS","agent":"Faith Nyoni"}
]"#;

fn book() -> Vec<RepaymentRecord> {
    serde_json::from_str(BOOK).unwrap()
}

// ===========================================================================
// Filtering
// ===========================================================================

#[test]
fn test_search_matches_name_or_loan_id() {
    let records = book();
    let query = RepaymentQuery {
        search: "MU".into(),
        ..Default::default()
    };
    let ids: Vec<&str> = filter_repayments(&records, &query)
        .iter()
        .map(|r| r.id.as_str())
        .collect();
    // Mukamuri, Mujuru
    assert_eq!(ids, vec!["1", "4"]);
}

#[test]
fn test_status_filter_from_page_value() {
    let records = book();
    let query = RepaymentQuery {
        status: parse_status_filter("pending").unwrap(),
        ..Default::default()
    };
    assert_eq!(filter_repayments(&records, &query).len(), 3);

    let all = RepaymentQuery {
        status: parse_status_filter("all").unwrap(),
        ..Default::default()
    };
    assert_eq!(filter_repayments(&records, &all).len(), 8);
}

// ===========================================================================
// Summary
// ===========================================================================

#[test]
fn test_summary_totals_match_repayments_page() {
    let input = RepaymentSummaryInput {
        records: book(),
        as_of: NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
        penalty_rate_pct: dec!(5),
    };
    let out = summarize_repayments(&input).unwrap().result;
    assert_eq!(out.total_paid, dec!(33600));
    assert_eq!(out.total_pending, dec!(36400));
    assert_eq!(out.total_overdue, dec!(45500));

    let counts: Vec<(RepaymentStatus, u64)> =
        out.status_breakdown.iter().map(|s| (s.status, s.count)).collect();
    assert_eq!(
        counts,
        vec![
            (RepaymentStatus::Paid, 3),
            (RepaymentStatus::Pending, 3),
            (RepaymentStatus::Overdue, 2),
        ]
    );
    let pct_sum: Decimal = out.status_breakdown.iter().map(|s| s.pct).sum();
    assert!((pct_sum - Decimal::ONE).abs() < dec!(0.0000001));
}

#[test]
fn test_future_due_overdue_has_zero_days() {
    let input = RepaymentSummaryInput {
        records: book(),
        as_of: NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
        penalty_rate_pct: dec!(5),
    };
    let out = summarize_repayments(&input).unwrap().result;
    let l008 = out.overdue.iter().find(|o| o.loan_id == "L008").unwrap();
    assert_eq!(l008.days_overdue, 0);
    assert_eq!(l008.penalty, dec!(1575));
}

#[test]
fn test_penalty_rate_defaults_when_omitted() {
    let json = format!(r#"{{"records": {BOOK}, "as_of": "2024-02-01"}}"#);
    let input: RepaymentSummaryInput = serde_json::from_str(&json).unwrap();
    assert_eq!(input.penalty_rate_pct, dec!(5));
    let out = summarize_repayments(&input).unwrap().result;
    assert_eq!(out.total_penalties, dec!(2275));
}
