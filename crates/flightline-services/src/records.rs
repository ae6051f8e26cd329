//! Record types stored in the two registries.

use crate::registry::Keyed;

/// One airport known to the Mapper.
///
/// Created on the first successful registration for its id and never mutated
/// afterwards. `info` is unused by the registration flow but kept so a
/// directory entry can carry a description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirportRecord {
    pub id: String,
    pub port: String,
    pub info: Option<String>,
}

impl AirportRecord {
    pub fn new(id: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            port: port.into(),
            info: None,
        }
    }

    /// The `id:port` line used in directory dumps.
    pub fn directory_line(&self) -> String {
        format!("{}:{}", self.id, self.port)
    }
}

impl Keyed for AirportRecord {
    fn key(&self) -> &str {
        &self.id
    }
}

/// One visit recorded by a Control. A repeat visitor gets a fresh record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirplaneRecord {
    pub id: String,
}

impl AirplaneRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Keyed for AirplaneRecord {
    fn key(&self) -> &str {
        &self.id
    }
}
