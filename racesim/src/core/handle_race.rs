use crate::core::error::RallyError;
use crate::core::race::{Race, RaceSim, RaceState};
use crate::core::variant::VariantCatalog;
use crate::interfaces::progress::RaceProgress;
use crate::interfaces::store::RallyStore;
use crate::post::race_result::RaceResult;
use flume::Sender;
use rand::Rng;
use std::thread::sleep;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// handle_race runs an admitted race to completion: it moves the race to Running, takes the
/// vehicle snapshot, simulates ticks until every vehicle finished and moves the race to
/// Finished. One tick takes `tick_duration` in real time. A store failure aborts the run and
/// leaves the race in the last persisted state.
pub fn handle_race<R: Rng + ?Sized>(
    store: &dyn RallyStore,
    mut race: Race,
    catalog: &VariantCatalog,
    tick_duration: Duration,
    rng: &mut R,
    tx: Option<&Sender<RaceProgress>>,
) -> Result<RaceResult, RallyError> {
    race.set_state(RaceState::Running)?;
    store.update_race(&race)?;

    // guarded vehicle writes are refused from here on, the snapshot is final
    let vehicles = store.vehicles_for_race(race.id)?;
    let mut race_sim = RaceSim::new(race.id, vehicles, catalog)?;
    info!(
        race_id = race.id,
        vehicles = race_sim.vehicles().len(),
        tick_ms = tick_duration.as_millis() as u64,
        "Race started"
    );

    let mut tx = tx;
    while !race_sim.get_all_finished() {
        let t_start = Instant::now();
        race_sim.simulate_tick(rng, store)?;

        if let Some(sender) = tx {
            if sender.send(RaceProgress::from_sim(&race_sim)).is_err() {
                warn!(race_id = race.id, "Progress observer disconnected");
                tx = None;
            }
        }

        // sleep until the tick is finished in real-time as well
        if let Some(t_sleep) = tick_duration.checked_sub(t_start.elapsed()) {
            if !t_sleep.is_zero() {
                sleep(t_sleep);
            }
        } else {
            warn!(race_id = race.id, tick = race_sim.cur_tick, "Could not keep up with real-time!");
        }
    }

    race.set_state(RaceState::Finished)?;
    store.update_race(&race)?;
    info!(race_id = race.id, ticks = race_sim.cur_tick, "Race finished");

    let result = race_sim.get_race_result(race);

    // after the loop finishes, send the final result once
    if let Some(sender) = tx {
        let mut final_msg = RaceProgress::from_sim(&race_sim);
        final_msg.final_result = Some(result.clone());
        if sender.send(final_msg).is_err() {
            warn!(race_id = result.race.id, "Progress observer disconnected");
        }
    }

    Ok(result)
}
