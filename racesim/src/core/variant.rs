use helpers::general::InputValueError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    SportCar,
    TerrainCar,
    SportMotorbike,
    CrossMotorbike,
    Truck,
}

/// Vehicle classes used by the leaderboard filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    Cars,
    Motorcycles,
    Trucks,
}

impl Variant {
    pub const ALL: [Variant; 5] = [
        Variant::SportCar,
        Variant::TerrainCar,
        Variant::SportMotorbike,
        Variant::CrossMotorbike,
        Variant::Truck,
    ];

    pub fn class(self) -> VehicleClass {
        match self {
            Variant::SportCar | Variant::TerrainCar => VehicleClass::Cars,
            Variant::SportMotorbike | Variant::CrossMotorbike => VehicleClass::Motorcycles,
            Variant::Truck => VehicleClass::Trucks,
        }
    }

    /// Tag used in scenario files and status reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::SportCar => "sport_car",
            Variant::TerrainCar => "terrain_car",
            Variant::SportMotorbike => "sport_motorbike",
            Variant::CrossMotorbike => "cross_motorbike",
            Variant::Truck => "truck",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// * `speed` - (distance units/tick) Cruising speed
/// * `light_delay` - (ticks) Number of ticks a vehicle stalls after a light malfunction
/// * `light_prob` - Probability of a light malfunction per moving tick
/// * `heavy_prob` - Probability of a heavy (race-ending) malfunction per moving tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariantPars {
    pub speed: u32,
    pub light_delay: u32,
    pub light_prob: f64,
    pub heavy_prob: f64,
}

impl VariantPars {
    pub fn validate(&self) -> Result<(), InputValueError> {
        if self.speed == 0 {
            return Err(InputValueError::new("speed", "must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&self.light_prob) {
            return Err(InputValueError::new("light_prob", "must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.heavy_prob) {
            return Err(InputValueError::new("heavy_prob", "must be within [0, 1]"));
        }
        Ok(())
    }
}

/// VariantCatalog maps every variant to its physical and behavioral constants. The default
/// catalog is the standard rally table; rows can be replaced for forced-probability runs.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantCatalog {
    rows: BTreeMap<Variant, VariantPars>,
}

impl Default for VariantCatalog {
    fn default() -> Self {
        let rows = Variant::ALL
            .iter()
            .map(|&variant| (variant, standard_pars(variant)))
            .collect();
        VariantCatalog { rows }
    }
}

impl VariantCatalog {
    pub fn with_override(
        mut self,
        variant: Variant,
        pars: VariantPars,
    ) -> Result<VariantCatalog, InputValueError> {
        pars.validate()?;
        self.rows.insert(variant, pars);
        Ok(self)
    }

    pub fn for_variant(&self, variant: Variant) -> VariantPars {
        // every variant is inserted on construction and rows are never removed
        self.rows
            .get(&variant)
            .copied()
            .unwrap_or_else(|| standard_pars(variant))
    }
}

fn standard_pars(variant: Variant) -> VariantPars {
    match variant {
        Variant::SportCar => VariantPars {
            speed: 140,
            light_delay: 5,
            light_prob: 0.12,
            heavy_prob: 0.02,
        },
        Variant::TerrainCar => VariantPars {
            speed: 100,
            light_delay: 5,
            light_prob: 0.03,
            heavy_prob: 0.01,
        },
        Variant::SportMotorbike => VariantPars {
            speed: 130,
            light_delay: 3,
            light_prob: 0.18,
            heavy_prob: 0.10,
        },
        Variant::CrossMotorbike => VariantPars {
            speed: 85,
            light_delay: 3,
            light_prob: 0.03,
            heavy_prob: 0.02,
        },
        Variant::Truck => VariantPars {
            speed: 80,
            light_delay: 7,
            light_prob: 0.06,
            heavy_prob: 0.04,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_catalog_matches_rally_table() {
        let catalog = VariantCatalog::default();

        let truck = catalog.for_variant(Variant::Truck);
        assert_eq!(truck.speed, 80);
        assert_eq!(truck.light_delay, 7);
        assert_relative_eq!(truck.light_prob, 0.06);
        assert_relative_eq!(truck.heavy_prob, 0.04);

        let bike = catalog.for_variant(Variant::SportMotorbike);
        assert_eq!(bike.speed, 130);
        assert_eq!(bike.light_delay, 3);
        assert_relative_eq!(bike.heavy_prob, 0.10);
    }

    #[test]
    fn override_replaces_single_row() {
        let forced = VariantPars {
            speed: 80,
            light_delay: 7,
            light_prob: 0.0,
            heavy_prob: 1.0,
        };
        let catalog = VariantCatalog::default()
            .with_override(Variant::Truck, forced)
            .unwrap();
        assert_eq!(catalog.for_variant(Variant::Truck), forced);
        assert_eq!(catalog.for_variant(Variant::SportCar).speed, 140);
    }

    #[test]
    fn override_rejects_invalid_probability() {
        let broken = VariantPars {
            speed: 80,
            light_delay: 7,
            light_prob: 1.5,
            heavy_prob: 0.0,
        };
        let err = VariantCatalog::default()
            .with_override(Variant::Truck, broken)
            .unwrap_err();
        assert_eq!(err.field, "light_prob");
    }

    #[test]
    fn classes_group_variants() {
        assert_eq!(Variant::TerrainCar.class(), VehicleClass::Cars);
        assert_eq!(Variant::CrossMotorbike.class(), VehicleClass::Motorcycles);
        assert_eq!(Variant::Truck.class(), VehicleClass::Trucks);
    }

    #[test]
    fn variant_tags_round_through_serde() {
        let v: Variant = serde_json::from_str("\"cross_motorbike\"").unwrap();
        assert_eq!(v, Variant::CrossMotorbike);
        assert_eq!(v.to_string(), "cross_motorbike");
    }
}
