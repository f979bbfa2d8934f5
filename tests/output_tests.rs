use approx::assert_relative_eq;
use ride_viability::output;
use ride_viability::scenarios::ScenarioTag;
use ride_viability::sweep::{SweepEngine, SweepParam};
use ride_viability::{audit_years, project, Projection};

#[test]
fn test_summary_metrics() {
    let p = ScenarioTag::Realistic.defaults();
    let results = project(&p, ScenarioTag::Realistic);
    let summary = output::compute_summary(&results, &p, ScenarioTag::Realistic);

    assert_eq!(summary.scenario, "realistic");
    assert_eq!(summary.total_months, 36);
    assert_eq!(summary.initial_drivers, 44);
    assert_eq!(summary.final_drivers, results[35].drivers);
    assert_eq!(summary.final_users, results[35].users);

    let gmv: f64 = results.iter().map(|r| r.gross_revenue).sum();
    assert_relative_eq!(summary.total_gross_revenue, gmv);
    assert_relative_eq!(summary.final_accumulated_profit, results[35].accumulated_profit);
    assert!(summary.min_accumulated_profit <= summary.final_accumulated_profit);
    assert!(summary.worst_monthly_result <= results[0].net_profit);
    assert_eq!(summary.roi_pct, 0.0);
    assert!(summary.ride_growth_pct > 0.0);
    assert!(summary.final_market_share_pct > 0.0 && summary.final_market_share_pct <= 100.0);
    assert_eq!(
        summary.break_even_month,
        results.iter().find(|r| r.net_profit > 0.0).map(|r| r.month)
    );
}

#[test]
fn test_summary_roi_with_investment() {
    let mut p = ScenarioTag::Realistic.defaults();
    p.initial_investment = 100_000.0;
    let results = project(&p, ScenarioTag::Realistic);
    let summary = output::compute_summary(&results, &p, ScenarioTag::Realistic);

    assert_relative_eq!(
        summary.roi_pct,
        results[35].accumulated_profit / 100_000.0 * 100.0
    );
    assert!(summary.min_accumulated_profit <= -100_000.0 + results[0].net_profit.max(0.0));
}

#[test]
fn test_summary_of_empty_series() {
    let p = ScenarioTag::Realistic.defaults();
    let summary = output::compute_summary(&[], &p, ScenarioTag::Realistic);
    assert_eq!(summary.total_months, 0);
    assert_eq!(summary.break_even_month, None);
    assert_eq!(summary.final_users, 0);
}

#[test]
fn test_event_extraction() {
    let results = project(&ScenarioTag::Realistic.defaults(), ScenarioTag::Realistic);
    let events = output::extract_events(&results, ScenarioTag::Realistic);

    for event in &events {
        assert!(event.month >= 1 && event.month <= 36);
        assert!(!event.event_type.is_empty());
    }

    let months_of = |kind: &str| -> Vec<u32> {
        events
            .iter()
            .filter(|e| e.event_type == kind)
            .map(|e| e.month)
            .collect()
    };
    assert_eq!(months_of("semester_bonus"), vec![6, 12, 18, 24, 30, 36]);
    assert_eq!(months_of("annual_bonus"), vec![12, 24, 36]);
    assert!(months_of("break_even").len() <= 1);
    assert!(months_of("payback").len() <= 1);
}

#[test]
fn test_cap_events() {
    let mut p = ScenarioTag::Realistic.defaults();
    p.monthly_driver_additions = 100;
    p.user_growth_pct = 100.0;
    p.churn_rate_pct = 0.0;
    let results = project(&p, ScenarioTag::Realistic);
    let events = output::extract_events(&results, ScenarioTag::Realistic);

    let first = |kind: &str| events.iter().find(|e| e.event_type == kind).map(|e| e.month);
    assert_eq!(first("fleet_cap_reached"), Some(6));
    assert_eq!(first("market_cap_reached"), Some(7));
    assert_eq!(
        events
            .iter()
            .filter(|e| e.event_type == "fleet_cap_reached")
            .count(),
        1
    );
}

#[test]
fn test_bottleneck_events_pair_up() {
    let mut p = ScenarioTag::Realistic.defaults();
    p.rides_per_user_month = 50.0;
    let results = project(&p, ScenarioTag::Realistic);
    let events = output::extract_events(&results, ScenarioTag::Realistic);

    let starts = events.iter().filter(|e| e.event_type == "bottleneck_start").count();
    let ends = events.iter().filter(|e| e.event_type == "bottleneck_end").count();
    assert!(starts >= 1);
    assert!(starts == ends || starts == ends + 1);
    assert_eq!(
        events
            .iter()
            .find(|e| e.event_type == "bottleneck_start")
            .map(|e| e.month),
        Some(1)
    );
}

#[test]
fn test_output_files() {
    let projection = Projection::preset(ScenarioTag::Realistic);
    let dir = std::env::temp_dir().join("ride_viability_test_output");
    let _ = std::fs::remove_dir_all(&dir);

    output::save_all(&projection, &dir).expect("save_all should succeed");

    assert!(dir.join("timeseries.csv").exists(), "timeseries.csv");
    assert!(dir.join("years.csv").exists(), "years.csv");
    assert!(dir.join("events.csv").exists(), "events.csv");
    assert!(dir.join("summary.json").exists(), "summary.json");
    assert!(dir.join("params.toml").exists(), "params.toml");

    let json = std::fs::read_to_string(dir.join("summary.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["scenario"], "realistic");
    assert_eq!(value["total_months"], 36);

    let years = std::fs::read_to_string(dir.join("years.csv")).unwrap();
    assert_eq!(years.lines().count(), 1 + audit_years(&projection.results).len());
    assert!(years.contains("2027"));

    let toml = std::fs::read_to_string(dir.join("params.toml")).unwrap();
    assert!(toml.contains("[marketing]"), "TOML should have [marketing] section");
    assert!(toml.contains("[tech_fee]"), "TOML should have [tech_fee] section");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_sweep_results_csv() {
    let engine = SweepEngine::default();
    let params = vec![SweepParam {
        name: "avg_fare".into(),
        values: vec![16.0, 20.0],
    }];
    let results = engine
        .run_grid(&params, &[ScenarioTag::Realistic])
        .unwrap();

    let path = std::env::temp_dir().join("ride_viability_test_sweep.csv");
    output::save_sweep_results(&results, &path).expect("save_sweep_results should succeed");

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("avg_fare"), "CSV should have param header");
    assert!(content.contains("overall_score"), "CSV should have score header");
    assert!(content.contains("score_realistic"));
    assert_eq!(content.lines().count(), 3);

    let _ = std::fs::remove_file(&path);
}
