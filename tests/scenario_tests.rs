use approx::assert_relative_eq;
use ride_viability::market::{
    ride_economics, tam_sam_som, technical_ticket, CITY_POPULATION, DEFAULT_SAM_PCT, SAM_CEILING,
};
use ride_viability::params::{
    self, MarketingBudget, ParamError, SimulationParameters, TechFee, TUNABLE_PARAMS,
};
use ride_viability::scenarios::ScenarioTag;
use ride_viability::project;

// ═══════════════════════════════════════════════════════════════════════
// Scenario presets
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_all_presets_are_valid() {
    for tag in ScenarioTag::all() {
        assert_eq!(tag.defaults().validate(), Ok(()), "{}", tag);
        assert!(!tag.description().is_empty());
    }
}

#[test]
fn test_preset_launch_fleets() {
    assert_eq!(ScenarioTag::Pessimistic.defaults().initial_drivers, 30);
    assert_eq!(ScenarioTag::Realistic.defaults().initial_drivers, 44);
    assert_eq!(ScenarioTag::Optimistic.defaults().initial_drivers, 80);
    assert_eq!(ScenarioTag::Optimistic.defaults().monthly_driver_additions, 13);
}

#[test]
fn test_fleet_caps() {
    assert_eq!(ScenarioTag::Pessimistic.fleet_cap(), 300);
    assert_eq!(ScenarioTag::Realistic.fleet_cap(), 450);
    assert_eq!(ScenarioTag::Optimistic.fleet_cap(), 600);
}

#[test]
fn test_presets_are_ordered_by_outlook() {
    let demand = |tag: ScenarioTag| -> f64 {
        project(&tag.defaults(), tag).iter().map(|r| r.demand).sum()
    };
    assert!(demand(ScenarioTag::Pessimistic) < demand(ScenarioTag::Realistic));
    assert!(demand(ScenarioTag::Realistic) < demand(ScenarioTag::Optimistic));
}

#[test]
fn test_scenario_parsing() {
    assert_eq!("realistic".parse::<ScenarioTag>(), Ok(ScenarioTag::Realistic));
    assert_eq!("PESSIMISTIC".parse::<ScenarioTag>(), Ok(ScenarioTag::Pessimistic));
    assert_eq!("otimista".parse::<ScenarioTag>(), Ok(ScenarioTag::Optimistic));
    assert!("bullish".parse::<ScenarioTag>().is_err());

    for tag in ScenarioTag::all() {
        assert_eq!(tag.to_string().parse::<ScenarioTag>(), Ok(tag));
    }
}

#[test]
fn test_scenario_serde_names() {
    assert_eq!(
        serde_json::to_string(&ScenarioTag::Realistic).unwrap(),
        "\"realistic\""
    );
    let tag: ScenarioTag = serde_json::from_str("\"optimistic\"").unwrap();
    assert_eq!(tag, ScenarioTag::Optimistic);
}

// ═══════════════════════════════════════════════════════════════════════
// Parameters
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_default_parameters_are_valid() {
    assert_eq!(SimulationParameters::default().validate(), Ok(()));
}

#[test]
fn test_suspension_keeps_always_on_channels() {
    let m = MarketingBudget::default();
    assert_eq!(m.always_on(), 9000.0);
    assert_eq!(m.monthly_total(true), 9000.0);
    assert_eq!(m.monthly_total(false), 29_500.0);
}

#[test]
fn test_named_driver_counts_are_rounded() {
    let mut p = SimulationParameters::default();
    p.set_named("initial_drivers", 41.6).unwrap();
    assert_eq!(p.initial_drivers, 42);
    assert_eq!(
        p.set_named("monthly_driver_additions", -1.0),
        Err(ParamError::Negative {
            field: "monthly_driver_additions",
            value: -1.0
        })
    );
    assert_eq!(
        p.set_named("initial_drivers", f64::INFINITY),
        Err(ParamError::NonFinite {
            field: "initial_drivers"
        })
    );
    assert_eq!(p.initial_drivers, 42);
}

#[test]
fn test_named_parameters() {
    let mut p = SimulationParameters::default();
    for name in TUNABLE_PARAMS {
        p.set_named(name, 7.0).unwrap();
        assert_eq!(p.get_named(name), Some(7.0), "{}", name);
    }
    assert_eq!(
        p.set_named("surge_multiplier", 1.0),
        Err(ParamError::Unknown("surge_multiplier".into()))
    );
    assert_eq!(p.get_named("surge_multiplier"), None);
}

#[test]
fn test_tech_fee_override_keeps_mode() {
    let mut p = SimulationParameters {
        tech_fee: TechFee::PercentOfGmv { pct: 3.0 },
        ..SimulationParameters::default()
    };
    p.set_named("tech_fee", 4.5).unwrap();
    assert_eq!(p.tech_fee, TechFee::PercentOfGmv { pct: 4.5 });
}

#[test]
fn test_validation_errors() {
    let mut p = SimulationParameters::default();
    p.churn_rate_pct = -1.0;
    assert!(matches!(
        p.validate(),
        Err(ParamError::PercentOutOfRange { field: "churn_rate_pct", .. })
    ));

    let mut p = SimulationParameters::default();
    p.marketing.commercial_team = -10.0;
    assert!(matches!(p.validate(), Err(ParamError::Negative { .. })));

    let mut p = SimulationParameters::default();
    p.initial_investment = f64::INFINITY;
    assert_eq!(
        p.validate(),
        Err(ParamError::NonFinite {
            field: "initial_investment"
        })
    );

    let err = ParamError::Negative {
        field: "avg_fare",
        value: -2.0,
    };
    assert_eq!(err.to_string(), "avg_fare must be non-negative (got -2)");
}

#[test]
fn test_toml_overrides_merge_over_preset() {
    let path = std::env::temp_dir().join("ride_viability_test_overrides.toml");
    std::fs::write(
        &path,
        "avg_fare = 20.0\n\n[marketing]\noffline_media = 0.0\n\n[tech_fee]\nmode = \"percent_of_gmv\"\npct = 4.0\n",
    )
    .unwrap();

    let base = ScenarioTag::Realistic.defaults();
    let p = params::load_toml(&path, &base).expect("load_toml should succeed");

    assert_eq!(p.avg_fare, 20.0);
    assert_eq!(p.marketing.offline_media, 0.0);
    assert_eq!(p.marketing.paid_traffic, base.marketing.paid_traffic);
    assert_eq!(p.tech_fee, TechFee::PercentOfGmv { pct: 4.0 });
    assert_eq!(p.initial_drivers, base.initial_drivers);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_toml_rejects_invalid_values() {
    let path = std::env::temp_dir().join("ride_viability_test_invalid.toml");
    std::fs::write(&path, "take_rate_pct = 150.0\n").unwrap();

    let result = params::load_toml(&path, &SimulationParameters::default());
    assert!(result.is_err());

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_saved_parameters_load_back() {
    let path = std::env::temp_dir().join("ride_viability_test_saved.toml");
    let original = ScenarioTag::Optimistic.defaults();
    params::save_toml(&original, &path).expect("save_toml should succeed");

    let loaded = params::load_toml(&path, &SimulationParameters::default()).unwrap();
    assert_eq!(loaded, original);

    let _ = std::fs::remove_file(&path);
}

// ═══════════════════════════════════════════════════════════════════════
// Market sizing & unit economics
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_city_market_size() {
    let size = tam_sam_som(CITY_POPULATION, 50.0, 15.0);
    assert_eq!(size.tam, 355_919);
    assert_eq!(size.sam, 177_960);
    assert_eq!(size.som, 26_694);
}

#[test]
fn test_sam_ceiling_matches_city_sizing() {
    let size = tam_sam_som(CITY_POPULATION, DEFAULT_SAM_PCT, 15.0);
    assert_eq!(size.sam as f64, SAM_CEILING);
}

#[test]
fn test_ride_economics() {
    let ride = ride_economics(20.0, 15.0);
    assert_relative_eq!(ride.gateway, 0.5, epsilon = 1e-12);
    assert_relative_eq!(ride.operating_margin, 18.15, epsilon = 1e-9);
    assert_relative_eq!(ride.driver_payout, 15.15, epsilon = 1e-9);

    let ride = ride_economics(18.5, 15.0);
    assert_relative_eq!(ride.gateway, 0.4625, epsilon = 1e-12);
    assert_relative_eq!(ride.operating_margin, 16.6875, epsilon = 1e-12);
    assert_relative_eq!(ride.platform_commission, 2.775, epsilon = 1e-12);
    assert_relative_eq!(ride.driver_payout, 13.9125, epsilon = 1e-12);
}

#[test]
fn test_technical_ticket() {
    assert_relative_eq!(technical_ticket(5.0, 1.0, 10.0, 0.0), 36.5, epsilon = 1e-12);
    assert_relative_eq!(technical_ticket(5.0, 1.0, 10.0, 20.0), 43.8, epsilon = 1e-12);
    assert_eq!(technical_ticket(0.0, 1.0, 0.0, -200.0), 0.0);
}
