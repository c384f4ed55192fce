use crate::core::error::RallyError;
use crate::core::variant::{VariantCatalog, VariantPars};
use crate::core::vehicle::Vehicle;
use crate::interfaces::store::{RallyStore, StoreError};
use crate::post::race_result::RaceResult;
use rand::Rng;
use rand_distr::{Bernoulli, Distribution};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

pub const MIN_RACE_YEAR: u32 = 1970;
pub const MAX_RACE_YEAR: u32 = 2050;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceState {
    Pending,
    Running,
    Finished,
}

impl RaceState {
    /// Returns the only state the race may move to from the current one.
    pub fn successor(self) -> Option<RaceState> {
        match self {
            RaceState::Pending => Some(RaceState::Running),
            RaceState::Running => Some(RaceState::Finished),
            RaceState::Finished => None,
        }
    }
}

impl fmt::Display for RaceState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            RaceState::Pending => "Pending",
            RaceState::Running => "Running",
            RaceState::Finished => "Finished",
        };
        f.write_str(s)
    }
}

/// Race record, keyed by the race year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Race {
    pub id: u32,
    pub state: RaceState,
}

impl Race {
    pub fn new(year: u32) -> Race {
        Race {
            id: year,
            state: RaceState::Pending,
        }
    }

    /// set_state moves the race one step forward. Skipping a state or moving backwards is an
    /// InvalidState error.
    pub fn set_state(&mut self, state: RaceState) -> Result<(), RallyError> {
        if self.state.successor() != Some(state) {
            return Err(RallyError::InvalidState(format!(
                "race {} cannot move from {} to {}",
                self.id, self.state, state
            )));
        }
        self.state = state;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct MalfunctionDice {
    light: Bernoulli,
    heavy: Bernoulli,
}

impl MalfunctionDice {
    fn new(variant_pars: &VariantPars) -> Result<MalfunctionDice, RallyError> {
        let light = Bernoulli::new(variant_pars.light_prob).map_err(|_| {
            RallyError::Validation(format!(
                "light malfunction probability {} is outside of [0, 1]",
                variant_pars.light_prob
            ))
        })?;
        let heavy = Bernoulli::new(variant_pars.heavy_prob).map_err(|_| {
            RallyError::Validation(format!(
                "heavy malfunction probability {} is outside of [0, 1]",
                variant_pars.heavy_prob
            ))
        })?;
        Ok(MalfunctionDice { light, heavy })
    }
}

/// RaceSim holds the in-flight state of one race run: the vehicles in their fixed iteration
/// order, the variant parameters resolved against the catalog and the shared finish counter.
#[derive(Debug)]
pub struct RaceSim {
    pub race_id: u32,
    pub cur_tick: u64,
    vehicles: Vec<Vehicle>,
    variant_pars: Vec<VariantPars>,
    dice: Vec<MalfunctionDice>,
    next_rank: u32,
    no_finished: usize,
}

impl RaceSim {
    pub fn new(
        race_id: u32,
        mut vehicles: Vec<Vehicle>,
        catalog: &VariantCatalog,
    ) -> Result<RaceSim, RallyError> {
        // creation order
        vehicles.sort_unstable_by_key(|vehicle| vehicle.id);

        let variant_pars: Vec<VariantPars> = vehicles
            .iter()
            .map(|vehicle| catalog.for_variant(vehicle.variant))
            .collect();
        let dice = variant_pars
            .iter()
            .map(MalfunctionDice::new)
            .collect::<Result<Vec<_>, _>>()?;
        let no_finished = vehicles.iter().filter(|vehicle| vehicle.finished).count();

        Ok(RaceSim {
            race_id,
            cur_tick: 0,
            vehicles,
            variant_pars,
            dice,
            next_rank: no_finished as u32,
            no_finished,
        })
    }

    // ---------------------------------------------------------------------------------------------
    // MAIN METHOD ---------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// simulate_tick advances every unfinished vehicle by one tick of simulated time. All random
    /// draws come from `rng` in vehicle order. As soon as the last vehicle finishes the tick is
    /// cut short, vehicles after it are not processed anymore.
    pub fn simulate_tick<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        store: &dyn RallyStore,
    ) -> Result<(), StoreError> {
        self.cur_tick += 1;

        for idx in 0..self.vehicles.len() {
            if self.vehicles[idx].finished {
                continue;
            }

            let variant_pars = self.variant_pars[idx];
            let dice = self.dice[idx];
            let vehicle = &mut self.vehicles[idx];

            if !vehicle.is_stalled() {
                if dice.light.sample(rng) {
                    vehicle.stall(&variant_pars);
                    debug!(
                        race_id = self.race_id,
                        tick = self.cur_tick,
                        vehicle_id = vehicle.id,
                        stalled_for = vehicle.light_malfunction_counter,
                        "Light malfunction"
                    );
                }

                if !vehicle.is_stalled() {
                    vehicle.drive(&variant_pars);

                    // no heavy draw once the distance is covered
                    if vehicle.reached_finish() || dice.heavy.sample(rng) {
                        if !vehicle.reached_finish() {
                            vehicle.break_down();
                        }
                        vehicle.finish(self.next_rank);
                        self.next_rank += 1;
                        self.no_finished += 1;
                        store.update_vehicle(vehicle)?;

                        info!(
                            race_id = self.race_id,
                            tick = self.cur_tick,
                            vehicle_id = vehicle.id,
                            rank = ?vehicle.rank,
                            status = %vehicle.status,
                            distance = vehicle.passed_distance,
                            "Vehicle finished"
                        );

                        if self.get_all_finished() {
                            return Ok(());
                        }
                        continue;
                    }
                }
            }

            vehicle.decay_malfunction_counter();
            store.update_vehicle(vehicle)?;
        }

        debug!(
            race_id = self.race_id,
            tick = self.cur_tick,
            finished = self.no_finished,
            total = self.vehicles.len(),
            "Tick simulated"
        );
        Ok(())
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (HELPERS) ---------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    pub fn get_all_finished(&self) -> bool {
        self.no_finished == self.vehicles.len()
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn get_race_result(&self, race: Race) -> RaceResult {
        RaceResult::new(race, self.cur_tick, &self.vehicles)
    }
}
