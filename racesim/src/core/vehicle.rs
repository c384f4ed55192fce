use crate::core::variant::{Variant, VariantPars};
use chrono::NaiveDate;
use helpers::general::InputValueError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed distance every vehicle has to cover to finish by completion.
pub const RACE_DISTANCE: u32 = 10_000;

const MAX_DESCRIPTIVE_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VehicleStatus {
    NoStatus,
    FinishRace,
    BreakDown,
}

impl VehicleStatus {
    pub const ALL: [VehicleStatus; 3] = [
        VehicleStatus::NoStatus,
        VehicleStatus::FinishRace,
        VehicleStatus::BreakDown,
    ];
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            VehicleStatus::NoStatus => "NoStatus",
            VehicleStatus::FinishRace => "FinishRace",
            VehicleStatus::BreakDown => "BreakDown",
        };
        f.write_str(s)
    }
}

/// Client-supplied parameters of a new vehicle.
/// * `variant` - Vehicle variant, fixed for the lifetime of the vehicle
/// * `team_name` - Name of the team (max. 100 characters)
/// * `model` - Vehicle model (max. 100 characters)
/// * `manufacturing_date` - Date the vehicle was built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehiclePars {
    pub variant: Variant,
    pub team_name: String,
    pub model: String,
    pub manufacturing_date: NaiveDate,
}

impl VehiclePars {
    pub fn validate(&self) -> Result<(), InputValueError> {
        validate_descriptive("team_name", &self.team_name)?;
        validate_descriptive("model", &self.model)
    }
}

/// Descriptive fields a client may change while the owning race is pending. Any other field
/// present in an update payload is ignored on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleInfo {
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub manufacturing_date: Option<NaiveDate>,
}

impl VehicleInfo {
    pub fn validate(&self) -> Result<(), InputValueError> {
        if let Some(team_name) = &self.team_name {
            validate_descriptive("team_name", team_name)?;
        }
        if let Some(model) = &self.model {
            validate_descriptive("model", model)?;
        }
        Ok(())
    }
}

fn validate_descriptive(field: &str, value: &str) -> Result<(), InputValueError> {
    if value.trim().is_empty() {
        return Err(InputValueError::new(field, "must not be empty"));
    }
    if value.chars().count() > MAX_DESCRIPTIVE_LEN {
        return Err(InputValueError::new(field, "can't be more than 100 characters"));
    }
    Ok(())
}

/// Vehicle record as kept by the store. All fields below `manufacturing_date` are owned by the
/// engine and cannot be written through the lifecycle service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: u64,
    pub race_id: u32,
    pub variant: Variant,
    pub team_name: String,
    pub model: String,
    pub manufacturing_date: NaiveDate,
    pub passed_distance: u32,
    pub light_malfunction_counter: u32,
    pub light_malfunction_count: u32,
    pub light_malfunction_occurred: bool,
    pub heavy_malfunction_occurred: bool,
    pub finished: bool,
    pub rank: Option<u32>,
    pub status: VehicleStatus,
}

impl Vehicle {
    pub fn new(id: u64, race_id: u32, vehicle_pars: VehiclePars) -> Vehicle {
        Vehicle {
            id,
            race_id,
            variant: vehicle_pars.variant,
            team_name: vehicle_pars.team_name,
            model: vehicle_pars.model,
            manufacturing_date: vehicle_pars.manufacturing_date,
            passed_distance: 0,
            light_malfunction_counter: 0,
            light_malfunction_count: 0,
            light_malfunction_occurred: false,
            heavy_malfunction_occurred: false,
            finished: false,
            rank: None,
            status: VehicleStatus::NoStatus,
        }
    }

    /// apply_info copies the descriptive fields that are set in `info`.
    pub fn apply_info(&mut self, info: VehicleInfo) {
        if let Some(team_name) = info.team_name {
            self.team_name = team_name;
        }
        if let Some(model) = info.model {
            self.model = model;
        }
        if let Some(manufacturing_date) = info.manufacturing_date {
            self.manufacturing_date = manufacturing_date;
        }
    }

    pub fn is_stalled(&self) -> bool {
        self.light_malfunction_counter > 0
    }

    /// stall registers a light malfunction, the vehicle stands still for `light_delay` ticks.
    pub fn stall(&mut self, variant_pars: &VariantPars) {
        self.light_malfunction_occurred = true;
        self.light_malfunction_counter = variant_pars.light_delay;
        self.light_malfunction_count += 1;
    }

    /// drive moves the vehicle by its cruising speed, capped at the race distance.
    pub fn drive(&mut self, variant_pars: &VariantPars) {
        self.passed_distance += variant_pars.speed.min(RACE_DISTANCE - self.passed_distance);
    }

    pub fn reached_finish(&self) -> bool {
        self.passed_distance >= RACE_DISTANCE
    }

    pub fn break_down(&mut self) {
        self.heavy_malfunction_occurred = true;
        self.status = VehicleStatus::BreakDown;
    }

    /// finish assigns the finishing rank. A vehicle that already broke down keeps its status.
    pub fn finish(&mut self, rank: u32) {
        self.rank = Some(rank);
        self.finished = true;
        if self.status == VehicleStatus::NoStatus {
            self.status = VehicleStatus::FinishRace;
        }
    }

    pub fn decay_malfunction_counter(&mut self) {
        if self.light_malfunction_counter > 0 {
            self.light_malfunction_counter -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::variant::VariantCatalog;

    fn truck() -> Vehicle {
        Vehicle::new(
            1,
            2020,
            VehiclePars {
                variant: Variant::Truck,
                team_name: "Team0".to_owned(),
                model: "model1".to_owned(),
                manufacturing_date: NaiveDate::from_ymd_opt(2018, 5, 1).unwrap(),
            },
        )
    }

    #[test]
    fn new_vehicle_has_zeroed_engine_fields() {
        let vehicle = truck();
        assert_eq!(vehicle.passed_distance, 0);
        assert_eq!(vehicle.light_malfunction_count, 0);
        assert!(!vehicle.finished);
        assert_eq!(vehicle.rank, None);
        assert_eq!(vehicle.status, VehicleStatus::NoStatus);
    }

    #[test]
    fn drive_is_capped_at_race_distance() {
        let pars = VariantCatalog::default().for_variant(Variant::Truck);
        let mut vehicle = truck();
        vehicle.passed_distance = RACE_DISTANCE - 30;
        vehicle.drive(&pars);
        assert_eq!(vehicle.passed_distance, RACE_DISTANCE);
        assert!(vehicle.reached_finish());
    }

    #[test]
    fn stall_and_decay() {
        let pars = VariantCatalog::default().for_variant(Variant::Truck);
        let mut vehicle = truck();
        vehicle.stall(&pars);
        assert!(vehicle.is_stalled());
        assert_eq!(vehicle.light_malfunction_counter, 7);
        assert_eq!(vehicle.light_malfunction_count, 1);
        for _ in 0..7 {
            vehicle.decay_malfunction_counter();
        }
        assert!(!vehicle.is_stalled());
        vehicle.decay_malfunction_counter();
        assert_eq!(vehicle.light_malfunction_counter, 0);
    }

    #[test]
    fn finish_keeps_breakdown_status() {
        let mut vehicle = truck();
        vehicle.break_down();
        vehicle.finish(3);
        assert_eq!(vehicle.status, VehicleStatus::BreakDown);
        assert_eq!(vehicle.rank, Some(3));

        let mut vehicle = truck();
        vehicle.finish(0);
        assert_eq!(vehicle.status, VehicleStatus::FinishRace);
    }

    #[test]
    fn info_payload_ignores_engine_fields() {
        let info: VehicleInfo = serde_json::from_str(
            r#"{"model": "model2", "passed_distance": 9999, "rank": 0, "finished": true}"#,
        )
        .unwrap();
        let mut vehicle = truck();
        vehicle.apply_info(info);
        assert_eq!(vehicle.model, "model2");
        assert_eq!(vehicle.team_name, "Team0");
        assert_eq!(vehicle.passed_distance, 0);
        assert!(!vehicle.finished);
    }

    #[test]
    fn descriptive_fields_are_validated() {
        let info = VehicleInfo {
            team_name: Some("x".repeat(101)),
            ..VehicleInfo::default()
        };
        assert_eq!(info.validate().unwrap_err().field, "team_name");

        let mut pars = truck();
        pars.model = String::new();
        let pars = VehiclePars {
            variant: pars.variant,
            team_name: pars.team_name,
            model: pars.model,
            manufacturing_date: pars.manufacturing_date,
        };
        assert_eq!(pars.validate().unwrap_err().field, "model");
    }
}
