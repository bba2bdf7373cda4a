//! Machine model.
//!
//! A machine is a disjunctive resource: it processes at most one task at
//! a time. Machines are referenced from tasks by id.

use serde::{Deserialize, Serialize};

/// A machine on the shop floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    /// Unique machine identifier (e.g. "E-101").
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
}

impl Machine {
    /// Creates a machine with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
        }
    }

    /// Sets the machine name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Label used on chart axes.
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            format!("Machine #{}", self.id)
        } else {
            self.name.clone()
        }
    }
}

/// Builds machines from a list of ids.
pub fn machines_from_ids<I, S>(ids: I) -> Vec<Machine>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ids.into_iter().map(Machine::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_label() {
        assert_eq!(Machine::new("3").label(), "Machine #3");
        assert_eq!(
            Machine::new("E-101").with_name("Extruder").label(),
            "Extruder"
        );
    }

    #[test]
    fn test_machines_from_ids() {
        let machines = machines_from_ids(["E-101", "T-301", "R-201"]);
        assert_eq!(machines.len(), 3);
        assert_eq!(machines[1].id, "T-301");
    }
}
