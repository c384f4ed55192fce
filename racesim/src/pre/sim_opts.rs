use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[clap(
    version = "0.1.0",
    author = "Alexander Heilmeier <alexander.heilmeier@tum.de>",
    name = "RS-RALLY",
    about = "A time-discrete endurance rally simulator written in Rust"
)]
pub struct SimOpts {
    // FLAGS ---------------------------------------------------------------------------------------
    /// Activate debug logging (per-tick summaries and light malfunctions)
    #[clap(short, long)]
    pub debug: bool,

    // OPTIONS -------------------------------------------------------------------------------------
    /// Set path to the race scenario file (race year and participating vehicles)
    #[clap(short, long = "parfile")]
    pub parfile_path: PathBuf,

    /// Set path to the engine config file (OPTIONAL: if not set, the standard catalog and one
    /// second per tick are used)
    #[clap(short, long = "config")]
    pub config_path: Option<PathBuf>,

    /// Set real-time factor (OPTIONAL: overrides the value of the engine config)
    #[clap(short, long)]
    pub realtime_factor: Option<f64>,

    /// Set seed of the malfunction random stream (OPTIONAL: overrides the engine config)
    #[clap(short, long)]
    pub seed: Option<u64>,

    /// Set path of a CSV file the final standings are written to
    #[clap(long)]
    pub csv: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_required_and_optional_arguments() {
        let opts = SimOpts::try_parse_from(&[
            "rally", "--parfile", "scenario.json", "-r", "10.0", "--seed", "42", "--csv", "out.csv",
        ])
        .unwrap();
        assert_eq!(opts.parfile_path, PathBuf::from("scenario.json"));
        assert_eq!(opts.realtime_factor, Some(10.0));
        assert_eq!(opts.seed, Some(42));
        assert_eq!(opts.csv, Some(PathBuf::from("out.csv")));
        assert!(opts.config_path.is_none());
        assert!(!opts.debug);
    }

    #[test]
    fn scenario_path_is_required() {
        assert!(SimOpts::try_parse_from(&["rally", "--debug"]).is_err());
    }
}
