use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

const CONFORMANCE_FOCUS: &str = r"\[Conformance\]";
const NON_DISRUPTIVE_SKIP: &str = r"\[Disruptive\]|NoExecuteTaintManager";
const QUICK_FOCUS: &str = "Pods should be submitted and removed";

/// Test selection for the e2e plugin.
///
/// Empty fields are left out of the plugin environment entirely so the
/// conformance image falls back to its own defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct E2eConfig {
    pub focus: String,
    pub skip: String,
    pub parallel: bool,
}

/// Canned e2e selections.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum E2eMode {
    #[default]
    NonDisruptiveConformance,
    Quick,
    CertifiedConformance,
}

impl E2eMode {
    pub fn e2e_config(self) -> E2eConfig {
        match self {
            E2eMode::NonDisruptiveConformance => E2eConfig {
                focus: CONFORMANCE_FOCUS.to_string(),
                skip: NON_DISRUPTIVE_SKIP.to_string(),
                parallel: false,
            },
            E2eMode::Quick => E2eConfig {
                focus: QUICK_FOCUS.to_string(),
                skip: NON_DISRUPTIVE_SKIP.to_string(),
                parallel: false,
            },
            E2eMode::CertifiedConformance => E2eConfig {
                focus: CONFORMANCE_FOCUS.to_string(),
                skip: String::new(),
                parallel: false,
            },
        }
    }
}

impl fmt::Display for E2eMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            E2eMode::NonDisruptiveConformance => "non-disruptive-conformance",
            E2eMode::Quick => "quick",
            E2eMode::CertifiedConformance => "certified-conformance",
        })
    }
}

impl FromStr for E2eMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "non-disruptive-conformance" => Ok(E2eMode::NonDisruptiveConformance),
            "quick" => Ok(E2eMode::Quick),
            "certified-conformance" => Ok(E2eMode::CertifiedConformance),
            other => Err(Error::InvalidMode {
                value: other.to_string(),
            }),
        }
    }
}
