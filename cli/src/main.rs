use clap::Parser;
use racesim::core::service::RallyService;
use racesim::interfaces::progress::RaceProgress;
use racesim::interfaces::store::MemoryStore;
use racesim::pre::read_sim_pars::{read_engine_config, read_race_scenario, EngineConfig};
use racesim::pre::sim_opts::SimOpts;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn log_progress(msg: &RaceProgress) {
    debug!(
        race_id = msg.race_id,
        tick = msg.tick,
        finished = msg.no_finished(),
        vehicles = msg.vehicle_states.len(),
        leader_distance = msg.leader_distance(),
        "Race progress"
    );
}

fn main() -> anyhow::Result<()> {
    // PRE-PROCESSING ------------------------------------------------------------------------------
    // get simulation options from the command line arguments
    let sim_opts: SimOpts = SimOpts::parse();
    init_logging(sim_opts.debug);

    // get race scenario and engine configuration
    info!(path = %sim_opts.parfile_path.display(), "Reading race scenario");
    let scenario = read_race_scenario(&sim_opts.parfile_path)?;

    let mut config = match &sim_opts.config_path {
        Some(config_path) => {
            info!(path = %config_path.display(), "Reading engine config");
            read_engine_config(config_path)?
        }
        None => EngineConfig::default(),
    };
    if let Some(realtime_factor) = sim_opts.realtime_factor {
        config.realtime_factor = realtime_factor;
    }
    if let Some(seed) = sim_opts.seed {
        config.seed = Some(seed);
    }
    config.validate()?;

    let seed = config.seed;
    let service = Arc::new(RallyService::new(Arc::new(MemoryStore::new()), config));

    // set up race and participants
    let race_id = service.create_race(scenario.race.year)?.id;
    for vehicle_pars in scenario.vehicles {
        service.add_vehicle_to_race(vehicle_pars, race_id)?;
    }

    // EXECUTION -----------------------------------------------------------------------------------
    let (tx, rx) = flume::unbounded();

    // run the race in a separate thread, the main thread follows the progress
    let service_thread = Arc::clone(&service);
    let t_start = Instant::now();
    let sim_handle = thread::spawn(move || {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        service_thread.start_race_with(race_id, &mut rng, Some(&tx))
    });

    for msg in rx.iter() {
        log_progress(&msg);
    }

    let race_result = match sim_handle.join() {
        Ok(race_result) => race_result?,
        Err(_) => anyhow::bail!("Race simulation thread panicked!"),
    };
    info!(
        ticks = race_result.ticks,
        execution_ms = t_start.elapsed().as_millis() as u64,
        "Simulation done"
    );

    // POST-PROCESSING -----------------------------------------------------------------------------
    race_result.print_standings()?;

    let status = service.get_race_status(race_id)?;
    println!(
        "STATUS: Race {} is {}, distance covered {}",
        race_id, status.state, status.distance_covered
    );
    for (status_name, count) in status.vehicle_status_counts.iter() {
        println!("STATUS: {:<12} {}", status_name, count);
    }

    if let Some(csv_path) = &sim_opts.csv {
        match race_result.write_standings_to_csv(csv_path) {
            Ok(path) => info!(path = %path, "Standings written"),
            Err(e) => warn!(error = %e, "Failed to write standings"),
        }
    }

    Ok(())
}
