//! Operational state of a container.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Where a container sits in the plant circuit.
///
/// Any status may follow any other; the set itself is closed and unknown
/// labels are rejected when parsed.
#[derive(Serialize, Deserialize, sqlx::Type, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case", try_from = "String")]
#[sqlx(rename_all = "snake_case")]
pub enum ContainerStatus {
    #[default]
    AtPlant,
    InWash,
    AtClient,
    Damaged,
}

impl ContainerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerStatus::AtPlant => "at_plant",
            ContainerStatus::InWash => "in_wash",
            ContainerStatus::AtClient => "at_client",
            ContainerStatus::Damaged => "damaged",
        }
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown container status `{0}`")]
pub struct UnknownStatus(pub String);

impl FromStr for ContainerStatus {
    type Err = UnknownStatus;

    /// Accepts the canonical snake_case names, their spaced or hyphenated
    /// forms, and the labels used by the plant's older dashboards.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw
            .trim()
            .to_lowercase()
            .replace([' ', '-'], "_");

        match normalized.as_str() {
            "at_plant" | "disponible" | "en_planta" | "planta" => Ok(ContainerStatus::AtPlant),
            "in_wash" | "en_lavado" | "en_lavadero" | "lavadero" => Ok(ContainerStatus::InWash),
            "at_client" | "en_cliente" | "en_clientes" => Ok(ContainerStatus::AtClient),
            "damaged" | "averiado" | "averiados" => Ok(ContainerStatus::Damaged),
            _ => Err(UnknownStatus(raw.to_string())),
        }
    }
}

impl TryFrom<String> for ContainerStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_and_spaced_forms() {
        assert_eq!("at_plant".parse(), Ok(ContainerStatus::AtPlant));
        assert_eq!("in wash".parse(), Ok(ContainerStatus::InWash));
        assert_eq!("At-Client".parse(), Ok(ContainerStatus::AtClient));
        assert_eq!(" damaged ".parse(), Ok(ContainerStatus::Damaged));
    }

    #[test]
    fn parses_legacy_dashboard_labels() {
        assert_eq!("Disponible".parse(), Ok(ContainerStatus::AtPlant));
        assert_eq!("En Lavadero".parse(), Ok(ContainerStatus::InWash));
        assert_eq!("En Cliente".parse(), Ok(ContainerStatus::AtClient));
        assert_eq!("Averiado".parse(), Ok(ContainerStatus::Damaged));
    }

    #[test]
    fn rejects_unknown_labels() {
        let err = "lost".parse::<ContainerStatus>().unwrap_err();
        assert_eq!(err, UnknownStatus("lost".into()));
    }

    #[test]
    fn json_uses_snake_case() {
        let json = serde_json::to_string(&ContainerStatus::InWash).unwrap();
        assert_eq!(json, "\"in_wash\"");

        let parsed: ContainerStatus = serde_json::from_str("\"En Planta\"").unwrap();
        assert_eq!(parsed, ContainerStatus::AtPlant);

        assert!(serde_json::from_str::<ContainerStatus>("\"somewhere\"").is_err());
    }
}
