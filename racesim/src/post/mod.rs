pub mod race_info;
pub mod race_result;
