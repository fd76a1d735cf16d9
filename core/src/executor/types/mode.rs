use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Order in which a run visits registered tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Visit tasks in registration order. A task registered before one of its
    /// dependencies is always skipped.
    #[default]
    #[serde(alias = "registration")]
    RegistrationOrder,
    /// Visit tasks in dependency order, ties broken by registration order.
    Topological,
}

impl ExecutionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RegistrationOrder => "registration_order",
            Self::Topological => "topological",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "registration" | "registration_order" | "registration-order" => {
                Ok(Self::RegistrationOrder)
            }
            "topological" | "topo" => Ok(Self::Topological),
            other => Err(format!("unknown execution mode: {other}")),
        }
    }
}
