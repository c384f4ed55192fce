use crate::core::race::RaceSim;
use crate::core::vehicle::VehicleStatus;
use crate::post::race_result::RaceResult;

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleProgress {
    pub vehicle_id: u64,
    pub passed_distance: u32,
    pub stalled_for: u32,
    pub finished: bool,
    pub rank: Option<u32>,
    pub status: VehicleStatus,
}

/// RaceProgress is the snapshot sent to an observer after every tick of a running race.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceProgress {
    pub race_id: u32,
    pub tick: u64,
    pub vehicle_states: Vec<VehicleProgress>,

    // final results payload (sent once when race finishes)
    pub final_result: Option<RaceResult>,
}

impl RaceProgress {
    pub fn from_sim(race_sim: &RaceSim) -> RaceProgress {
        RaceProgress {
            race_id: race_sim.race_id,
            tick: race_sim.cur_tick,
            vehicle_states: race_sim
                .vehicles()
                .iter()
                .map(|vehicle| VehicleProgress {
                    vehicle_id: vehicle.id,
                    passed_distance: vehicle.passed_distance,
                    stalled_for: vehicle.light_malfunction_counter,
                    finished: vehicle.finished,
                    rank: vehicle.rank,
                    status: vehicle.status,
                })
                .collect(),
            final_result: None,
        }
    }

    pub fn no_finished(&self) -> usize {
        self.vehicle_states
            .iter()
            .filter(|state| state.finished)
            .count()
    }

    /// Distance of the vehicle that is furthest down the track.
    pub fn leader_distance(&self) -> u32 {
        self.vehicle_states
            .iter()
            .map(|state| state.passed_distance)
            .max()
            .unwrap_or(0)
    }
}
