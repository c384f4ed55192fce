use crate::core::race::Race;
use crate::core::variant::Variant;
use crate::core::vehicle::{Vehicle, VehicleStatus};
use anyhow::Context;
use helpers::general::{argsort, SortOrder};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::Path;

/// Standing is one row of the final classification.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Standing {
    pub rank: Option<u32>,
    pub vehicle_id: u64,
    pub variant: Variant,
    pub team_name: String,
    pub model: String,
    pub passed_distance: u32,
    pub light_malfunction_count: u32,
    pub status: VehicleStatus,
}

/// RaceResult contains all race information that is required for post-processing the results.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RaceResult {
    pub race: Race,
    pub ticks: u64,
    pub standings: Vec<Standing>,
}

impl RaceResult {
    /// new orders the vehicles by rank, unranked vehicles follow in creation order.
    pub fn new(race: Race, ticks: u64, vehicles: &[Vehicle]) -> RaceResult {
        let keys: Vec<(bool, u32, u64)> = vehicles
            .iter()
            .map(|vehicle| (vehicle.rank.is_none(), vehicle.rank.unwrap_or(0), vehicle.id))
            .collect();

        let standings = argsort(&keys, SortOrder::Ascending)
            .into_iter()
            .map(|idx| {
                let vehicle = &vehicles[idx];
                Standing {
                    rank: vehicle.rank,
                    vehicle_id: vehicle.id,
                    variant: vehicle.variant,
                    team_name: vehicle.team_name.to_owned(),
                    model: vehicle.model.to_owned(),
                    passed_distance: vehicle.passed_distance,
                    light_malfunction_count: vehicle.light_malfunction_count,
                    status: vehicle.status,
                }
            })
            .collect();

        RaceResult {
            race,
            ticks,
            standings,
        }
    }

    /// write_standings_to_csv writes the final classification to a CSV file and returns the
    /// path of the written file.
    pub fn write_standings_to_csv(&self, path: &Path) -> anyhow::Result<String> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)
                    .context(format!("Failed to create output directory {}!", dir.display()))?;
            }
        }
        let mut writer = csv::Writer::from_path(path)
            .context(format!("Failed to open result file {}!", path.display()))?;
        for standing in self.standings.iter() {
            writer
                .serialize(standing)
                .context("Failed to serialize standing!")?;
        }
        writer.flush()?;

        Ok(path.to_string_lossy().into_owned())
    }

    pub fn format_standings(&self) -> anyhow::Result<String> {
        let mut content = String::new();
        writeln!(
            &mut content,
            "RESULT: Race {} ({}) after {} ticks",
            self.race.id, self.race.state, self.ticks
        )?;
        writeln!(
            &mut content,
            "rank, {:>4}, {:<16}, {:<20}, {:<20}, {:>8}, {:>5}, status",
            "id", "variant", "team", "model", "distance", "light"
        )?;
        for standing in self.standings.iter() {
            let rank = match standing.rank {
                Some(rank) => rank.to_string(),
                None => "-".to_owned(),
            };
            writeln!(
                &mut content,
                "{:>4}, {:>4}, {:<16}, {:<20}, {:<20}, {:>8}, {:>5}, {}",
                rank,
                standing.vehicle_id,
                standing.variant.to_string(),
                standing.team_name,
                standing.model,
                standing.passed_distance,
                standing.light_malfunction_count,
                standing.status
            )?;
        }
        Ok(content)
    }

    /// print_standings prints the final classification to the console output.
    pub fn print_standings(&self) -> anyhow::Result<()> {
        print!("{}", self.format_standings()?);
        Ok(())
    }
}
