//! Lifecycle service: the operation surface of the rally simulator.
//!
//! Every mutation is checked against the stored race and vehicle state before it reaches the
//! store. Starting a race additionally passes the admission gate and then blocks until the race
//! is finished.

use crate::core::admission::AdmissionControl;
use crate::core::error::RallyError;
use crate::core::handle_race::handle_race;
use crate::core::race::{Race, RaceState, MAX_RACE_YEAR, MIN_RACE_YEAR};
use crate::core::variant::VehicleClass;
use crate::core::vehicle::{Vehicle, VehicleInfo, VehiclePars};
use crate::interfaces::progress::RaceProgress;
use crate::interfaces::store::{RallyStore, StoreError};
use crate::post::race_info::{self, FilteredVehicles, RaceStatus, VehicleFilter, VehicleStatistics};
use crate::post::race_result::RaceResult;
use crate::pre::read_sim_pars::EngineConfig;
use flume::Sender;
use helpers::general::SortOrder;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct RallyService<S: RallyStore> {
    store: Arc<S>,
    admission: AdmissionControl,
    config: EngineConfig,
}

impl<S: RallyStore> RallyService<S> {
    pub fn new(store: Arc<S>, config: EngineConfig) -> RallyService<S> {
        RallyService {
            store,
            admission: AdmissionControl::new(),
            config,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // ---------------------------------------------------------------------------------------------
    // LIFECYCLE GUARD -----------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    pub fn create_race(&self, year: u32) -> Result<Race, RallyError> {
        if !(MIN_RACE_YEAR..=MAX_RACE_YEAR).contains(&year) {
            return Err(RallyError::Validation(format!(
                "race year {} is outside of [{}, {}]",
                year, MIN_RACE_YEAR, MAX_RACE_YEAR
            )));
        }
        if self.store.race(year)?.is_some() {
            return Err(duplicate_race(year));
        }

        let race = Race::new(year);
        match self.store.insert_race(race.clone()) {
            Ok(()) => {}
            Err(StoreError::Duplicate { .. }) => return Err(duplicate_race(year)),
            Err(err) => return Err(err.into()),
        }
        info!(race_id = year, "Race created");
        Ok(race)
    }

    pub fn add_vehicle_to_race(
        &self,
        vehicle_pars: VehiclePars,
        race_id: u32,
    ) -> Result<Vehicle, RallyError> {
        vehicle_pars.validate()?;

        let vehicle = self
            .store
            .insert_vehicle_if_pending(race_id, vehicle_pars)
            .map_err(guard_error)?;
        info!(
            race_id,
            vehicle_id = vehicle.id,
            variant = %vehicle.variant,
            "Vehicle added"
        );
        Ok(vehicle)
    }

    pub fn update_vehicle_info(&self, id: u64, info: VehicleInfo) -> Result<Vehicle, RallyError> {
        info.validate()?;
        self.store
            .update_vehicle_info_if_pending(id, info)
            .map_err(guard_error)
    }

    pub fn delete_vehicle(&self, id: u64) -> Result<(), RallyError> {
        let vehicle = self
            .store
            .remove_vehicle_if_pending(id)
            .map_err(guard_error)?;
        info!(race_id = vehicle.race_id, vehicle_id = id, "Vehicle removed");
        Ok(())
    }

    // ---------------------------------------------------------------------------------------------
    // ENGINE ENTRY --------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// start_race runs the race to completion and returns it in the Finished state. The random
    /// source is seeded from the engine configuration, or from entropy if no seed is set.
    pub fn start_race(&self, race_id: u32) -> Result<Race, RallyError> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(self.start_race_with(race_id, &mut rng, None)?.race)
    }

    /// start_race_with is start_race with an injected random source and an optional progress
    /// observer. A second call while a race is running fails immediately with Conflict.
    pub fn start_race_with<R: Rng + ?Sized>(
        &self,
        race_id: u32,
        rng: &mut R,
        tx: Option<&Sender<RaceProgress>>,
    ) -> Result<RaceResult, RallyError> {
        let permit = self.admission.try_admit(race_id)?;

        if self.store.any_race_running()? {
            return Err(RallyError::Conflict(format!(
                "cannot start race {}, another race is already running",
                race_id
            )));
        }

        let race = match self.store.race(race_id)? {
            Some(race) => race,
            None => return Err(RallyError::race_not_found(race_id)),
        };
        if race.state != RaceState::Pending {
            return Err(RallyError::InvalidState(format!(
                "race {} is {}, only a pending race can be started",
                race_id, race.state
            )));
        }
        if self.store.vehicles_for_race(race_id)?.is_empty() {
            return Err(RallyError::NotFound {
                entity: "vehicles of race",
                id: u64::from(race_id),
            });
        }
        info!(race_id = permit.race_id(), "Race admitted");

        // the permit is held until the race is finished or aborted
        let result = handle_race(
            self.store.as_ref(),
            race,
            &self.config.catalog()?,
            self.config.tick_duration()?,
            rng,
            tx,
        );
        drop(permit);
        result
    }

    // ---------------------------------------------------------------------------------------------
    // READ-ONLY QUERIES ---------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    pub fn get_race_status(&self, race_id: u32) -> Result<RaceStatus, RallyError> {
        race_info::race_status(self.store.as_ref(), race_id)
    }

    pub fn get_vehicle_statistics(&self, vehicle_id: u64) -> Result<VehicleStatistics, RallyError> {
        race_info::vehicle_statistics(self.store.as_ref(), vehicle_id)
    }

    pub fn get_leaderboard(
        &self,
        race_id: u32,
        class: Option<VehicleClass>,
    ) -> Result<Vec<Vehicle>, RallyError> {
        race_info::leaderboard(self.store.as_ref(), race_id, class)
    }

    pub fn find_vehicles(
        &self,
        filter: &VehicleFilter,
        order: SortOrder,
    ) -> Result<FilteredVehicles, RallyError> {
        race_info::find_vehicles(self.store.as_ref(), filter, order)
    }
}

fn duplicate_race(year: u32) -> RallyError {
    RallyError::Conflict(format!("race with year {} already exists", year))
}

/// guard_error maps the rejections of the guarded store writes onto the caller-facing errors.
fn guard_error(err: StoreError) -> RallyError {
    match err {
        StoreError::Missing { entity, id } => RallyError::NotFound { entity, id },
        StoreError::NotPending { .. } => RallyError::InvalidState(err.to_string()),
        err => RallyError::Persistence(err),
    }
}
