use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Add-on that becomes mandatory while the advanced display package is selected.
pub const TELEMATICS_HARDWARE: &str = "telematics-hw";
/// Add-on whose selection, like the hardware module, qualifies for telematics savings.
pub const TELEMATICS_SUBSCRIPTION: &str = "telematics-sub";

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelId(pub String);

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AddonId(pub String);

impl AddonId {
    pub fn telematics_hardware() -> Self {
        Self(TELEMATICS_HARDWARE.to_owned())
    }

    pub fn is_telematics(&self) -> bool {
        self.0 == TELEMATICS_HARDWARE || self.0 == TELEMATICS_SUBSCRIPTION
    }
}

impl fmt::Display for AddonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unsupported {kind} `{value}` (expected {expected})")]
pub struct ParseOptionError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Indoor,
    Outdoor,
}

impl Environment {
    pub const ALL: [Self; 2] = [Self::Indoor, Self::Outdoor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Indoor => "indoor",
            Self::Outdoor => "outdoor",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Indoor => "Indoor",
            Self::Outdoor => "Outdoor",
        }
    }
}

impl FromStr for Environment {
    type Err = ParseOptionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "indoor" => Ok(Self::Indoor),
            "outdoor" => Ok(Self::Outdoor),
            _ => Err(ParseOptionError {
                kind: "environment",
                value: value.to_owned(),
                expected: "indoor|outdoor",
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerType {
    Electric,
    Lpg,
    Diesel,
}

impl PowerType {
    pub const ALL: [Self; 3] = [Self::Electric, Self::Lpg, Self::Diesel];

    pub fn index(&self) -> usize {
        match self {
            Self::Electric => 0,
            Self::Lpg => 1,
            Self::Diesel => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Electric => "electric",
            Self::Lpg => "lpg",
            Self::Diesel => "diesel",
        }
    }
}

impl FromStr for PowerType {
    type Err = ParseOptionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "electric" => Ok(Self::Electric),
            "lpg" => Ok(Self::Lpg),
            "diesel" => Ok(Self::Diesel),
            _ => Err(ParseOptionError {
                kind: "power type",
                value: value.to_owned(),
                expected: "electric|lpg|diesel",
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TireType {
    Cushion,
    Pneumatic,
    SolidPneumatic,
}

impl TireType {
    pub const ALL: [Self; 3] = [Self::Cushion, Self::Pneumatic, Self::SolidPneumatic];

    pub fn index(&self) -> usize {
        match self {
            Self::Cushion => 0,
            Self::Pneumatic => 1,
            Self::SolidPneumatic => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cushion => "cushion",
            Self::Pneumatic => "pneumatic",
            Self::SolidPneumatic => "solid_pneumatic",
        }
    }
}

impl FromStr for TireType {
    type Err = ParseOptionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "cushion" => Ok(Self::Cushion),
            "pneumatic" => Ok(Self::Pneumatic),
            "solid_pneumatic" => Ok(Self::SolidPneumatic),
            _ => Err(ParseOptionError {
                kind: "tire type",
                value: value.to_owned(),
                expected: "cushion|pneumatic|solid_pneumatic",
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayPackage {
    Standard,
    Enhanced,
    Advanced,
}

impl DisplayPackage {
    pub const ALL: [Self; 3] = [Self::Standard, Self::Enhanced, Self::Advanced];

    pub fn index(&self) -> usize {
        match self {
            Self::Standard => 0,
            Self::Enhanced => 1,
            Self::Advanced => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Enhanced => "enhanced",
            Self::Advanced => "advanced",
        }
    }

    /// Packages that pull the telematics hardware module into the build.
    pub fn requires_telematics(&self) -> bool {
        matches!(self, Self::Advanced)
    }
}

impl FromStr for DisplayPackage {
    type Err = ParseOptionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "enhanced" => Ok(Self::Enhanced),
            "advanced" => Ok(Self::Advanced),
            _ => Err(ParseOptionError {
                kind: "display package",
                value: value.to_owned(),
                expected: "standard|enhanced|advanced",
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: ModelId,
    pub name: String,
    pub series: String,
    pub capacity_min: u32,
    pub capacity_max: u32,
    pub environments: Vec<Environment>,
    pub base_price: Decimal,
    pub description: String,
}

impl Model {
    pub fn clamp_capacity(&self, capacity: u32) -> u32 {
        capacity.clamp(self.capacity_min, self.capacity_max)
    }

    pub fn supports(&self, environment: Environment) -> bool {
        self.environments.contains(&environment)
    }

    pub fn capacity_range_label(&self) -> String {
        format!("{} - {} lb", self.capacity_min, self.capacity_max)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MastHeightOption {
    pub label: String,
    pub height_in: u32,
    pub price: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerTypeOption {
    pub value: PowerType,
    pub label: String,
    pub price: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TireTypeOption {
    pub value: TireType,
    pub label: String,
    pub price: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPackageOption {
    pub value: DisplayPackage,
    pub label: String,
    pub price: Decimal,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addon {
    pub id: AddonId,
    pub name: String,
    pub description: String,
    pub one_time_price: Decimal,
    pub monthly_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaintColor {
    pub value: String,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetDiscountTier {
    pub min: u32,
    pub max: u32,
    pub discount: Decimal,
    pub label: String,
}

impl FleetDiscountTier {
    pub fn contains(&self, quantity: u32) -> bool {
        quantity >= self.min && quantity <= self.max
    }
}

#[cfg(test)]
mod tests {
    use super::{DisplayPackage, Environment, PowerType, TireType};

    #[test]
    fn option_parsing_accepts_labels_and_snake_case() {
        assert_eq!("LPG".parse::<PowerType>(), Ok(PowerType::Lpg));
        assert_eq!(" Electric ".parse::<PowerType>(), Ok(PowerType::Electric));
        assert_eq!("Solid Pneumatic".parse::<TireType>(), Ok(TireType::SolidPneumatic));
        assert_eq!("solid-pneumatic".parse::<TireType>(), Ok(TireType::SolidPneumatic));
        assert_eq!("advanced".parse::<DisplayPackage>(), Ok(DisplayPackage::Advanced));
        assert_eq!("Outdoor".parse::<Environment>(), Ok(Environment::Outdoor));
    }

    #[test]
    fn option_parsing_reports_expected_values() {
        let error = "hydrogen".parse::<PowerType>().expect_err("unknown power type");
        assert_eq!(error.kind, "power type");
        assert!(error.to_string().contains("electric|lpg|diesel"));
    }

    #[test]
    fn variant_indexes_follow_declaration_order() {
        for (position, power) in PowerType::ALL.iter().enumerate() {
            assert_eq!(power.index(), position);
        }
        for (position, tire) in TireType::ALL.iter().enumerate() {
            assert_eq!(tire.index(), position);
        }
        for (position, display) in DisplayPackage::ALL.iter().enumerate() {
            assert_eq!(display.index(), position);
        }
    }
}
