use std::cmp::Ordering;
use std::error::Error;
use std::fmt;

/// InputValueError is used if a scenario or configuration value does not fulfill the posed
/// requirements, e.g., a malfunction probability outside of [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct InputValueError {
    pub field: String,
    pub reason: String,
}

impl InputValueError {
    pub fn new(field: &str, reason: &str) -> InputValueError {
        InputValueError {
            field: field.to_owned(),
            reason: reason.to_owned(),
        }
    }
}

impl fmt::Display for InputValueError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Invalid input value for {}: {}", self.field, self.reason)
    }
}

impl Error for InputValueError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// argsort returns the indices that would sort an array. The sort is stable, i.e. equal values
/// keep their original relative order in both directions. Incomparable values (NaN) are treated
/// as equal.
pub fn argsort<T: PartialOrd>(x: &[T], order: SortOrder) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..x.len()).collect();
    match order {
        SortOrder::Ascending => {
            indices.sort_by(|&a, &b| x[a].partial_cmp(&x[b]).unwrap_or(Ordering::Equal))
        }
        SortOrder::Descending => {
            indices.sort_by(|&a, &b| x[b].partial_cmp(&x[a]).unwrap_or(Ordering::Equal))
        }
    }
    indices
}
