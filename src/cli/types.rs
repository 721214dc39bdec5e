//! Listing of the datatypes

use std::fmt::Write;

use crate::datatype::DataType;

/// One line per datatype: its name and the aggregates it permits.
pub fn types_overview() -> String {
    let mut out = String::new();
    for datatype in DataType::ALL {
        let aggregates: Vec<&str> = datatype.aggregates().into_iter().map(|a| a.name()).collect();
        let _ = writeln!(out, "{:<15} {}", datatype.name(), aggregates.join(", "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overview() {
        let overview = types_overview();
        assert_eq!(overview.lines().count(), DataType::ALL.len());
        assert!(overview.lines().any(|line| line == format!("{:<15} {}", "int", "group, count, min, max, sum")));
        assert!(overview.lines().any(|line| line == format!("{:<15} {}", "color", "group, count")));
    }
}
