//! Keyed record store for races and vehicles.
//!
//! The engine and the lifecycle service only talk to the [`RallyStore`] trait. [`MemoryStore`]
//! is the in-process implementation used by the CLI and the tests. Reads are never given a
//! consistent snapshot across records: a reader may observe a race mid-tick.

use crate::core::race::{Race, RaceState};
use crate::core::vehicle::{Vehicle, VehicleInfo, VehiclePars};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// A writer panicked while holding the store lock.
    #[error("store lock is poisoned")]
    Poisoned,

    /// An update targeted a record that is not (or no longer) stored.
    #[error("{entity} with id {id} is missing from the store")]
    Missing { entity: &'static str, id: u64 },

    /// An insert collided with an existing key.
    #[error("{entity} with id {id} already exists in the store")]
    Duplicate { entity: &'static str, id: u64 },

    /// A guarded write found the owning race outside of the pending state.
    #[error("race {race_id} needs to be in pending state, but is {state}")]
    NotPending { race_id: u32, state: RaceState },
}

pub trait RallyStore: Send + Sync {
    fn insert_race(&self, race: Race) -> Result<(), StoreError>;
    fn race(&self, id: u32) -> Result<Option<Race>, StoreError>;
    fn update_race(&self, race: &Race) -> Result<(), StoreError>;
    fn races(&self) -> Result<Vec<Race>, StoreError>;

    // The *_if_pending writes check the owning race under the same lock as the write itself,
    // so none of them can land once the race was saved as Running.

    /// insert_vehicle_if_pending assigns the next vehicle id. Ids increase in creation order.
    fn insert_vehicle_if_pending(
        &self,
        race_id: u32,
        vehicle_pars: VehiclePars,
    ) -> Result<Vehicle, StoreError>;
    /// update_vehicle_info_if_pending applies `info` to the stored record and returns it.
    fn update_vehicle_info_if_pending(
        &self,
        id: u64,
        info: VehicleInfo,
    ) -> Result<Vehicle, StoreError>;
    fn remove_vehicle_if_pending(&self, id: u64) -> Result<Vehicle, StoreError>;

    fn vehicle(&self, id: u64) -> Result<Option<Vehicle>, StoreError>;
    /// update_vehicle is the engine's write, it is not guarded.
    fn update_vehicle(&self, vehicle: &Vehicle) -> Result<(), StoreError>;

    /// find_vehicles returns all matching vehicles ordered by id.
    fn find_vehicles(
        &self,
        predicate: &dyn Fn(&Vehicle) -> bool,
    ) -> Result<Vec<Vehicle>, StoreError>;

    fn vehicles_for_race(&self, race_id: u32) -> Result<Vec<Vehicle>, StoreError> {
        self.find_vehicles(&|vehicle| vehicle.race_id == race_id)
    }

    fn any_race_running(&self) -> Result<bool, StoreError> {
        Ok(self
            .races()?
            .iter()
            .any(|race| race.state == RaceState::Running))
    }
}

#[derive(Debug, Default)]
struct Tables {
    races: BTreeMap<u32, Race>,
    vehicles: BTreeMap<u64, Vehicle>,
    last_vehicle_id: u64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables.write().map_err(|_| StoreError::Poisoned)
    }
}

impl Tables {
    fn ensure_pending(&self, race_id: u32) -> Result<(), StoreError> {
        match self.races.get(&race_id) {
            Some(race) if race.state == RaceState::Pending => Ok(()),
            Some(race) => Err(StoreError::NotPending {
                race_id,
                state: race.state,
            }),
            None => Err(StoreError::Missing {
                entity: "race",
                id: u64::from(race_id),
            }),
        }
    }

    fn owning_race_of(&self, id: u64) -> Result<u32, StoreError> {
        self.vehicles
            .get(&id)
            .map(|vehicle| vehicle.race_id)
            .ok_or(StoreError::Missing {
                entity: "vehicle",
                id,
            })
    }
}

impl RallyStore for MemoryStore {
    fn insert_race(&self, race: Race) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if tables.races.contains_key(&race.id) {
            return Err(StoreError::Duplicate {
                entity: "race",
                id: u64::from(race.id),
            });
        }
        tables.races.insert(race.id, race);
        Ok(())
    }

    fn race(&self, id: u32) -> Result<Option<Race>, StoreError> {
        Ok(self.read()?.races.get(&id).cloned())
    }

    fn update_race(&self, race: &Race) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        match tables.races.get_mut(&race.id) {
            Some(stored) => {
                *stored = race.clone();
                Ok(())
            }
            None => Err(StoreError::Missing {
                entity: "race",
                id: u64::from(race.id),
            }),
        }
    }

    fn races(&self) -> Result<Vec<Race>, StoreError> {
        Ok(self.read()?.races.values().cloned().collect())
    }

    fn insert_vehicle_if_pending(
        &self,
        race_id: u32,
        vehicle_pars: VehiclePars,
    ) -> Result<Vehicle, StoreError> {
        let mut tables = self.write()?;
        tables.ensure_pending(race_id)?;
        tables.last_vehicle_id += 1;
        let vehicle = Vehicle::new(tables.last_vehicle_id, race_id, vehicle_pars);
        tables.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(vehicle)
    }

    fn vehicle(&self, id: u64) -> Result<Option<Vehicle>, StoreError> {
        Ok(self.read()?.vehicles.get(&id).cloned())
    }

    fn update_vehicle(&self, vehicle: &Vehicle) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        match tables.vehicles.get_mut(&vehicle.id) {
            Some(stored) => {
                *stored = vehicle.clone();
                Ok(())
            }
            None => Err(StoreError::Missing {
                entity: "vehicle",
                id: vehicle.id,
            }),
        }
    }

    fn update_vehicle_info_if_pending(
        &self,
        id: u64,
        info: VehicleInfo,
    ) -> Result<Vehicle, StoreError> {
        let mut tables = self.write()?;
        let race_id = tables.owning_race_of(id)?;
        tables.ensure_pending(race_id)?;
        let stored = tables
            .vehicles
            .get_mut(&id)
            .ok_or(StoreError::Missing {
                entity: "vehicle",
                id,
            })?;
        stored.apply_info(info);
        Ok(stored.clone())
    }

    fn remove_vehicle_if_pending(&self, id: u64) -> Result<Vehicle, StoreError> {
        let mut tables = self.write()?;
        let race_id = tables.owning_race_of(id)?;
        tables.ensure_pending(race_id)?;
        tables.vehicles.remove(&id).ok_or(StoreError::Missing {
            entity: "vehicle",
            id,
        })
    }

    fn find_vehicles(
        &self,
        predicate: &dyn Fn(&Vehicle) -> bool,
    ) -> Result<Vec<Vehicle>, StoreError> {
        Ok(self
            .read()?
            .vehicles
            .values()
            .filter(|vehicle| predicate(vehicle))
            .cloned()
            .collect())
    }
}
