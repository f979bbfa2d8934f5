use approx::assert_relative_eq;
use ride_viability::audit::results_for_year;
use ride_viability::scenarios::ScenarioTag;
use ride_viability::{audit_years, project, MonthlyResult};

fn realistic_results() -> Vec<MonthlyResult> {
    project(&ScenarioTag::Realistic.defaults(), ScenarioTag::Realistic)
}

#[test]
fn test_three_calendar_years() {
    let results = realistic_results();
    let audits = audit_years(&results);

    assert_eq!(audits.len(), 3);
    assert_eq!(
        audits.iter().map(|a| a.year).collect::<Vec<_>>(),
        vec![2026, 2027, 2028]
    );
    assert!(audits.iter().all(|a| a.months == 12));
}

#[test]
fn test_audit_totals_match_monthly_sums() {
    for tag in ScenarioTag::all() {
        let results = project(&tag.defaults(), tag);
        let audits = audit_years(&results);

        let gmv: f64 = results.iter().map(|r| r.gross_revenue).sum();
        let audited: f64 = audits.iter().map(|a| a.gross_revenue).sum();
        assert_relative_eq!(gmv, audited, max_relative = 1e-9);

        let net: f64 = results.iter().map(|r| r.net_profit).sum();
        let audited_net: f64 = audits.iter().map(|a| a.net_profit).sum();
        assert_relative_eq!(net, audited_net, epsilon = 1e-6, max_relative = 1e-9);

        for a in &audits {
            let months = results_for_year(&results, a.year);
            let rides: f64 = months.iter().map(|r| r.rides).sum();
            assert_relative_eq!(a.rides, rides, max_relative = 1e-12);
        }
    }
}

#[test]
fn test_year_end_snapshot() {
    let results = realistic_results();
    let audits = audit_years(&results);

    for (a, december) in audits.iter().zip([12usize, 24, 36]) {
        let r = &results[december - 1];
        assert_eq!(a.ending_drivers, r.drivers);
        assert_eq!(a.ending_users, r.users);
        assert_relative_eq!(a.ending_accumulated_profit, r.accumulated_profit);
    }
}

#[test]
fn test_partial_series() {
    let results = realistic_results();
    let audits = audit_years(&results[..15]);

    assert_eq!(audits.len(), 2);
    assert_eq!(audits[0].months, 12);
    assert_eq!(audits[1].year, 2027);
    assert_eq!(audits[1].months, 3);
    assert_eq!(audits[1].ending_drivers, results[14].drivers);
}

#[test]
fn test_unordered_input_is_grouped_by_year() {
    let mut results = realistic_results();
    results.reverse();
    let audits = audit_years(&results);
    let ordered = audit_years(&realistic_results());

    assert_eq!(audits.len(), 3);
    for (a, b) in audits.iter().zip(&ordered) {
        assert_eq!(a.year, b.year);
        assert_eq!(a.months, b.months);
        assert_relative_eq!(a.gross_revenue, b.gross_revenue, max_relative = 1e-9);
        assert_eq!(a.ending_drivers, b.ending_drivers, "year {}", a.year);
        assert_eq!(a.ending_users, b.ending_users, "year {}", a.year);
        assert_relative_eq!(a.ending_accumulated_profit, b.ending_accumulated_profit);
    }
    assert_eq!(audits[0].ending_drivers, 154);
}

#[test]
fn test_shuffled_input_keeps_december_snapshot() {
    let results = realistic_results();
    // Interleave the two halves of the series.
    let (early, late) = results.split_at(18);
    let mut shuffled = Vec::new();
    for (a, b) in late.iter().zip(early) {
        shuffled.push(a.clone());
        shuffled.push(b.clone());
    }
    let audits = audit_years(&shuffled);

    for (a, december) in audits.iter().zip([12usize, 24, 36]) {
        let r = &results[december - 1];
        assert_eq!(a.ending_drivers, r.drivers);
        assert_eq!(a.ending_users, r.users);
        assert_relative_eq!(a.ending_accumulated_profit, r.accumulated_profit);
    }
}

#[test]
fn test_empty_series() {
    assert!(audit_years(&[]).is_empty());
    assert!(results_for_year(&[], 2026).is_empty());
}

#[test]
fn test_results_for_year() {
    let results = realistic_results();
    let y2027 = results_for_year(&results, 2027);
    assert_eq!(y2027.len(), 12);
    assert_eq!(y2027[0].month, 13);
    assert_eq!(y2027[11].month, 24);
    assert!(results_for_year(&results, 2030).is_empty());
}
