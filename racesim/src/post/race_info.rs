use crate::core::error::RallyError;
use crate::core::race::RaceState;
use crate::core::variant::{Variant, VehicleClass};
use crate::core::vehicle::{Vehicle, VehicleStatus};
use crate::interfaces::store::RallyStore;
use helpers::general::{argsort, SortOrder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// RaceStatus summarizes a race and the vehicles registered for it. Every status and variant
/// key is present, vehicles of other races are not counted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceStatus {
    pub state: RaceState,
    pub vehicle_status_counts: BTreeMap<String, usize>,
    pub vehicle_variant_counts: BTreeMap<String, usize>,
    pub distance_covered: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VehicleStatistics {
    pub distance: u32,
    pub heavy_malfunction_occurred: bool,
    pub light_malfunction_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicOperator {
    And,
    Or,
}

/// * `field` - Value the vehicle field is compared with (compared in its text form)
/// * `operation` - How the matches are combined with the set built so far
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterItem {
    pub field: String,
    pub operation: LogicOperator,
}

/// VehicleFilter starts from the vehicles of `team` and combines the remaining items in the
/// order model, status, distance, manufacturing date. Unset items are skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleFilter {
    pub team: String,
    #[serde(default)]
    pub model: Option<FilterItem>,
    #[serde(default)]
    pub status: Option<FilterItem>,
    #[serde(default)]
    pub distance: Option<FilterItem>,
    #[serde(default)]
    pub manufacturing_date: Option<FilterItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredVehicles {
    pub count: usize,
    pub items: Vec<Vehicle>,
}

pub fn race_status(store: &dyn RallyStore, race_id: u32) -> Result<RaceStatus, RallyError> {
    let race = store
        .race(race_id)?
        .ok_or_else(|| RallyError::race_not_found(race_id))?;
    let vehicles = store.vehicles_for_race(race_id)?;

    let mut vehicle_status_counts: BTreeMap<String, usize> = VehicleStatus::ALL
        .iter()
        .map(|status| (status.to_string(), 0))
        .collect();
    let mut vehicle_variant_counts: BTreeMap<String, usize> = Variant::ALL
        .iter()
        .map(|variant| (variant.to_string(), 0))
        .collect();
    let mut distance_covered = 0;

    for vehicle in vehicles.iter() {
        *vehicle_status_counts
            .entry(vehicle.status.to_string())
            .or_insert(0) += 1;
        *vehicle_variant_counts
            .entry(vehicle.variant.to_string())
            .or_insert(0) += 1;
        distance_covered += u64::from(vehicle.passed_distance);
    }

    Ok(RaceStatus {
        state: race.state,
        vehicle_status_counts,
        vehicle_variant_counts,
        distance_covered,
    })
}

pub fn vehicle_statistics(
    store: &dyn RallyStore,
    vehicle_id: u64,
) -> Result<VehicleStatistics, RallyError> {
    let vehicle = store
        .vehicle(vehicle_id)?
        .ok_or_else(|| RallyError::vehicle_not_found(vehicle_id))?;

    Ok(VehicleStatistics {
        distance: vehicle.passed_distance,
        heavy_malfunction_occurred: vehicle.heavy_malfunction_occurred,
        light_malfunction_count: vehicle.light_malfunction_count,
    })
}

/// leaderboard returns the vehicles of a race ordered by rank. Vehicles that are not ranked yet
/// follow in creation order.
pub fn leaderboard(
    store: &dyn RallyStore,
    race_id: u32,
    class: Option<VehicleClass>,
) -> Result<Vec<Vehicle>, RallyError> {
    if store.race(race_id)?.is_none() {
        return Err(RallyError::race_not_found(race_id));
    }

    let mut vehicles = store.vehicles_for_race(race_id)?;
    if let Some(class) = class {
        vehicles.retain(|vehicle| vehicle.variant.class() == class);
    }

    let keys: Vec<(bool, u32, u64)> = vehicles
        .iter()
        .map(|vehicle| (vehicle.rank.is_none(), vehicle.rank.unwrap_or(0), vehicle.id))
        .collect();
    let mut slots: Vec<Option<Vehicle>> = vehicles.into_iter().map(Some).collect();

    Ok(argsort(&keys, SortOrder::Ascending)
        .into_iter()
        .filter_map(|idx| slots[idx].take())
        .collect())
}

pub fn find_vehicles(
    store: &dyn RallyStore,
    filter: &VehicleFilter,
    order: SortOrder,
) -> Result<FilteredVehicles, RallyError> {
    let mut selection: BTreeMap<u64, Vehicle> = store
        .find_vehicles(&|vehicle| vehicle.team_name == filter.team)?
        .into_iter()
        .map(|vehicle| (vehicle.id, vehicle))
        .collect();

    let criteria: [(&Option<FilterItem>, fn(&Vehicle) -> String); 4] = [
        (&filter.model, |vehicle| vehicle.model.to_owned()),
        (&filter.status, |vehicle| vehicle.status.to_string()),
        (&filter.distance, |vehicle| vehicle.passed_distance.to_string()),
        (&filter.manufacturing_date, |vehicle| {
            vehicle.manufacturing_date.to_string()
        }),
    ];

    for (item, field_of) in criteria.iter() {
        let item = match item {
            Some(item) => item,
            None => continue,
        };
        let matches = store.find_vehicles(&|vehicle| field_of(vehicle) == item.field)?;

        match item.operation {
            LogicOperator::And => {
                selection.retain(|id, _| matches.iter().any(|vehicle| vehicle.id == *id));
            }
            LogicOperator::Or => {
                for vehicle in matches {
                    selection.entry(vehicle.id).or_insert(vehicle);
                }
            }
        }
    }

    // selection is ordered by id, the stable sort keeps that order among equal team names
    let vehicles: Vec<Vehicle> = selection.into_values().collect();
    let team_names: Vec<&str> = vehicles
        .iter()
        .map(|vehicle| vehicle.team_name.as_str())
        .collect();
    let idxs = argsort(&team_names, order);
    let mut slots: Vec<Option<Vehicle>> = vehicles.into_iter().map(Some).collect();
    let items: Vec<Vehicle> = idxs
        .into_iter()
        .filter_map(|idx| slots[idx].take())
        .collect();

    Ok(FilteredVehicles {
        count: items.len(),
        items,
    })
}
