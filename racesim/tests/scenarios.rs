use chrono::NaiveDate;
use racesim::core::error::RallyError;
use racesim::core::race::RaceState;
use racesim::core::service::RallyService;
use racesim::core::variant::{Variant, VariantPars, VehicleClass};
use racesim::core::vehicle::{VehicleInfo, VehiclePars, VehicleStatus, RACE_DISTANCE};
use racesim::interfaces::store::{MemoryStore, RallyStore};
use racesim::pre::read_sim_pars::EngineConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::sync::Arc;

fn forced(speed: u32, light_prob: f64, heavy_prob: f64) -> VariantPars {
    VariantPars {
        speed,
        light_delay: 3,
        light_prob,
        heavy_prob,
    }
}

fn service_with(overrides: &[(Variant, VariantPars)]) -> RallyService<MemoryStore> {
    let config = EngineConfig {
        tick_interval_ms: 0,
        variant_overrides: overrides.iter().copied().collect::<BTreeMap<_, _>>(),
        ..EngineConfig::default()
    };
    RallyService::new(Arc::new(MemoryStore::new()), config)
}

fn pars(variant: Variant, team: &str) -> VehiclePars {
    VehiclePars {
        variant,
        team_name: team.to_owned(),
        model: "model1".to_owned(),
        manufacturing_date: NaiveDate::from_ymd_opt(2019, 1, 15).unwrap(),
    }
}

#[test]
fn single_truck_needs_125_ticks() {
    let service = service_with(&[(Variant::Truck, forced(80, 0.0, 0.0))]);
    service.create_race(2020).unwrap();
    let truck = service.add_vehicle_to_race(pars(Variant::Truck, "Team0"), 2020).unwrap();

    let result = service
        .start_race_with(2020, &mut StdRng::seed_from_u64(1), None)
        .unwrap();

    assert_eq!(result.ticks, 125);
    assert_eq!(result.race.state, RaceState::Finished);
    let truck = service.store().vehicle(truck.id).unwrap().unwrap();
    assert_eq!(truck.passed_distance, RACE_DISTANCE);
    assert_eq!(truck.rank, Some(0));
    assert_eq!(truck.status, VehicleStatus::FinishRace);
    assert!(truck.finished);
}

#[test]
fn breakdown_on_first_tick_takes_rank_zero() {
    let service = service_with(&[
        (Variant::SportCar, forced(140, 0.0, 1.0)),
        (Variant::Truck, forced(80, 0.0, 0.0)),
    ]);
    service.create_race(2020).unwrap();
    let x = service.add_vehicle_to_race(pars(Variant::SportCar, "TeamX"), 2020).unwrap();
    let y = service.add_vehicle_to_race(pars(Variant::Truck, "TeamY"), 2020).unwrap();

    let finished = service.start_race(2020).unwrap();
    assert_eq!(finished.state, RaceState::Finished);

    let x = service.store().vehicle(x.id).unwrap().unwrap();
    assert_eq!(x.status, VehicleStatus::BreakDown);
    assert_eq!(x.rank, Some(0));
    assert!(x.heavy_malfunction_occurred);
    assert_eq!(x.passed_distance, 140);

    let y = service.store().vehicle(y.id).unwrap().unwrap();
    assert_eq!(y.status, VehicleStatus::FinishRace);
    assert_eq!(y.rank, Some(1));
    assert_eq!(y.passed_distance, RACE_DISTANCE);

    let stats = service.get_vehicle_statistics(x.id).unwrap();
    assert!(stats.heavy_malfunction_occurred);
    assert_eq!(stats.distance, 140);
}

#[test]
fn duplicate_race_year_is_a_conflict() {
    let service = service_with(&[]);
    service.create_race(2020).unwrap();
    assert!(matches!(
        service.create_race(2020),
        Err(RallyError::Conflict(_))
    ));
}

#[test]
fn pending_race_status_counts_stored_vehicles() {
    let service = service_with(&[]);
    service.create_race(2020).unwrap();
    service.create_race(2021).unwrap();
    service.add_vehicle_to_race(pars(Variant::Truck, "Team0"), 2020).unwrap();
    service.add_vehicle_to_race(pars(Variant::Truck, "Team1"), 2020).unwrap();
    service.add_vehicle_to_race(pars(Variant::SportMotorbike, "Team2"), 2020).unwrap();
    service.add_vehicle_to_race(pars(Variant::TerrainCar, "Team3"), 2021).unwrap();

    let status = service.get_race_status(2020).unwrap();
    assert_eq!(status.state.to_string(), "Pending");
    assert_eq!(status.vehicle_status_counts["NoStatus"], 3);
    assert_eq!(status.vehicle_status_counts["FinishRace"], 0);
    assert_eq!(status.vehicle_variant_counts["truck"], 2);
    assert_eq!(status.vehicle_variant_counts["sport_motorbike"], 1);
    assert_eq!(status.vehicle_variant_counts["terrain_car"], 0);
    assert_eq!(status.distance_covered, 0);
}

#[test]
fn seeded_races_rank_every_vehicle_exactly_once() {
    let variants = [
        Variant::SportCar,
        Variant::TerrainCar,
        Variant::SportMotorbike,
        Variant::CrossMotorbike,
        Variant::Truck,
        Variant::SportMotorbike,
        Variant::Truck,
    ];

    for seed in 0..20u64 {
        let service = service_with(&[]);
        service.create_race(2000).unwrap();
        for (idx, variant) in variants.iter().enumerate() {
            service
                .add_vehicle_to_race(pars(*variant, &format!("Team{}", idx)), 2000)
                .unwrap();
        }

        let result = service
            .start_race_with(2000, &mut StdRng::seed_from_u64(seed), None)
            .unwrap();
        assert_eq!(result.standings.len(), variants.len());

        let vehicles = service.store().vehicles_for_race(2000).unwrap();
        let mut ranks: Vec<u32> = vehicles.iter().filter_map(|vehicle| vehicle.rank).collect();
        ranks.sort_unstable();
        assert_eq!(ranks, (0..variants.len() as u32).collect::<Vec<u32>>());

        for vehicle in vehicles.iter() {
            assert!(vehicle.finished);
            assert!(vehicle.passed_distance <= RACE_DISTANCE);
            assert!(vehicle.passed_distance >= RACE_DISTANCE || vehicle.heavy_malfunction_occurred);
            let expected_status = if vehicle.heavy_malfunction_occurred {
                VehicleStatus::BreakDown
            } else {
                VehicleStatus::FinishRace
            };
            assert_eq!(vehicle.status, expected_status);
        }

        let board = service.get_leaderboard(2000, None).unwrap();
        let board_ranks: Vec<Option<u32>> = board.iter().map(|vehicle| vehicle.rank).collect();
        let expected: Vec<Option<u32>> = (0..variants.len() as u32).map(Some).collect();
        assert_eq!(board_ranks, expected);
    }
}

#[test]
fn same_seed_gives_same_race() {
    let run = |seed: u64| {
        let service = service_with(&[]);
        service.create_race(2000).unwrap();
        for variant in Variant::ALL.iter() {
            service.add_vehicle_to_race(pars(*variant, "Team0"), 2000).unwrap();
        }
        service
            .start_race_with(2000, &mut StdRng::seed_from_u64(seed), None)
            .unwrap()
    };
    assert_eq!(run(7), run(7));
}

#[test]
fn finished_race_rejects_every_mutation() {
    let service = service_with(&[(Variant::Truck, forced(2_000, 0.0, 0.0))]);
    service.create_race(2020).unwrap();
    let truck = service.add_vehicle_to_race(pars(Variant::Truck, "Team0"), 2020).unwrap();
    service.start_race(2020).unwrap();

    assert!(matches!(
        service.add_vehicle_to_race(pars(Variant::Truck, "Team1"), 2020),
        Err(RallyError::InvalidState(_))
    ));
    assert!(matches!(
        service.update_vehicle_info(
            truck.id,
            VehicleInfo {
                model: Some("model9".to_owned()),
                ..VehicleInfo::default()
            }
        ),
        Err(RallyError::InvalidState(_))
    ));
    assert!(matches!(
        service.delete_vehicle(truck.id),
        Err(RallyError::InvalidState(_))
    ));
    assert!(matches!(
        service.start_race(2020),
        Err(RallyError::InvalidState(_))
    ));
    assert_eq!(
        service.store().race(2020).unwrap().unwrap().state,
        RaceState::Finished
    );
}

#[test]
fn leaderboard_filters_by_class() {
    let service = service_with(&[
        (Variant::Truck, forced(1_000, 0.0, 0.0)),
        (Variant::SportCar, forced(2_000, 0.0, 0.0)),
        (Variant::CrossMotorbike, forced(5_000, 0.0, 0.0)),
    ]);
    service.create_race(2020).unwrap();
    service.add_vehicle_to_race(pars(Variant::Truck, "Team0"), 2020).unwrap();
    service.add_vehicle_to_race(pars(Variant::SportCar, "Team1"), 2020).unwrap();
    service.add_vehicle_to_race(pars(Variant::CrossMotorbike, "Team2"), 2020).unwrap();
    service.start_race(2020).unwrap();

    let board = service.get_leaderboard(2020, None).unwrap();
    let variants: Vec<Variant> = board.iter().map(|vehicle| vehicle.variant).collect();
    assert_eq!(
        variants,
        vec![Variant::CrossMotorbike, Variant::SportCar, Variant::Truck]
    );

    let trucks = service.get_leaderboard(2020, Some(VehicleClass::Trucks)).unwrap();
    assert_eq!(trucks.len(), 1);
    assert_eq!(trucks[0].rank, Some(2));
}
