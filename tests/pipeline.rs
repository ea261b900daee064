//! End-to-end run: CSV file in, analysis report out.

use approx::assert_relative_eq;
use chrono::{Datelike, NaiveDate};
use salescope::prelude::*;
use std::io::Write;

/// Four years of monthly retail data: an upward trend, a yearly cycle,
/// a handful of customers and categories, plus a few null amounts.
fn sample_csv() -> String {
    let categories = ["Furniture", "Technology", "Office Supplies"];
    let mut csv = String::from("Order_Date,Customer_ID,Category,Sales\n");
    for i in 0..48usize {
        let year = 2020 + i / 12;
        let month = i % 12 + 1;
        let seasonal = 300.0 * (i as f64 * std::f64::consts::TAU / 12.0).sin();
        for slot in 0..3usize {
            let amount = 400.0 + 5.0 * i as f64 + seasonal / 3.0 + 20.0 * slot as f64;
            csv.push_str(&format!(
                "{day:02}/{month:02}/{year},CUST-{id},{category},{amount:.2}\n",
                day = 5 + slot * 7,
                id = (i + slot) % 5,
                category = categories[slot],
            ));
        }
    }
    // Null amounts are dropped, not errors.
    csv.push_str("10/01/2023,CUST-0,Furniture,\n");
    csv.push_str("11/01/2023,CUST-1,Technology,nan\n");
    csv
}

fn load_sample() -> RawTable {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(sample_csv().as_bytes()).unwrap();
    load_csv(file.path()).unwrap()
}

fn params() -> AnalysisParams {
    AnalysisParams {
        date_format: DateFormat::DayMonthYear,
        ..Default::default()
    }
}

#[test]
fn full_run_from_file() {
    let table = load_sample();
    let report = run_analysis(&table, &params()).unwrap();

    // 48 months of history, three rows each, two nulls dropped.
    assert_eq!(report.metrics.dropped_nulls, 2);
    assert_eq!(report.metrics.monthly_sales.len(), 48);

    // Category totals add up to the overall total (cutoff covers all 3).
    let by_category: f64 = report.metrics.sales_by_category.iter().map(|e| e.value).sum();
    assert_relative_eq!(by_category, report.metrics.total_sales, epsilon = 1e-6);

    // Every customer appears more than once, so retention is total.
    assert_relative_eq!(report.metrics.overall_retention_rate.unwrap(), 1.0);

    // Forecast picks up right after December 2023 and carries its bands.
    assert_eq!(report.forecast.months.len(), 6);
    assert_eq!(
        report.forecast.months[0],
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    );
    for (i, value) in report.forecast.values.iter().enumerate() {
        assert!(value.is_finite());
        assert!(report.forecast.lower[i] <= *value);
        assert!(report.forecast.upper[i] >= *value);
    }
    assert!(report.forecast.mape.is_some());

    // Comparison window mirrors the horizon and ends at the last month.
    assert_eq!(report.comparison.months.len(), 6);
    assert_eq!(
        report.comparison.months.last().map(|m| (m.year(), m.month())),
        Some((2023, 12))
    );

    // No date filter, so there is no previous period to compare against.
    assert!(report.previous_period_delta.is_none());
}

#[test]
fn filter_scopes_metrics_but_not_the_forecast() {
    let table = load_sample();
    let base = params();

    let mut windowed = base.clone();
    windowed.filter = DateFilter::between(
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
    )
    .unwrap();

    let full_report = run_analysis(&table, &base).unwrap();
    let window_report = run_analysis(&table, &windowed).unwrap();

    // Metrics shrink to the window.
    assert_eq!(window_report.metrics.monthly_sales.len(), 12);
    assert!(window_report.metrics.total_sales < full_report.metrics.total_sales);
    assert_eq!(
        window_report.window_start,
        NaiveDate::from_ymd_opt(2023, 1, 5)
    );

    // The forecast trains on the complete history either way.
    assert_eq!(window_report.forecast, full_report.forecast);

    // Sales trend upward, so 2023 beats the preceding twelve months.
    assert!(window_report.previous_period_delta.unwrap() > 0.0);
}

#[test]
fn custom_roles_and_rankings() {
    let table = load_sample();
    let mut p = params();
    p.roles = Some(ColumnRoles::new(
        "Order_Date",
        "Customer_ID",
        "Category",
        "Sales",
    ));
    p.top_n_customers = 2;
    p.top_k_categories = 2;

    let report = run_analysis(&table, &p).unwrap();
    assert_eq!(report.metrics.top_customers_by_spend.len(), 2);
    assert_eq!(report.metrics.sales_by_category.len(), 2);
    // Rankings come back sorted descending.
    assert!(
        report.metrics.top_customers_by_spend[0].value
            >= report.metrics.top_customers_by_spend[1].value
    );
}

#[test]
fn analyzer_memoizes_identical_requests() {
    let table = load_sample();
    let analyzer = Analyzer::new();

    let first = analyzer.analyze(&table, &params()).unwrap();
    let second = analyzer.analyze(&table, &params()).unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));

    analyzer.invalidate();
    let third = analyzer.analyze(&table, &params()).unwrap();
    assert!(!std::sync::Arc::ptr_eq(&first, &third));
    assert_eq!(*first, *third);
}

#[test]
fn out_of_range_horizon_is_rejected() {
    let table = load_sample();
    let mut p = params();
    p.horizon = 24;
    assert!(matches!(
        run_analysis(&table, &p),
        Err(AnalyticsError::InvalidParameter(_))
    ));
}

#[test]
fn too_little_history_for_a_forecast() {
    let csv = "\
Order_Date,Customer_ID,Category,Sales
05/01/2023,CUST-0,Furniture,100.0
05/02/2023,CUST-1,Furniture,110.0
05/03/2023,CUST-0,Furniture,120.0
";
    let table = load_csv_bytes(csv.as_bytes()).unwrap();
    assert!(matches!(
        run_analysis(&table, &params()),
        Err(AnalyticsError::InsufficientData { .. })
    ));
}
