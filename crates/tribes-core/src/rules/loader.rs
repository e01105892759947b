use std::path::PathBuf;

use thiserror::Error;

use crate::rules::Rules;

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid rules: {}", .0.join("; "))]
    Invalid(Vec<String>),
    #[error("utf-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub enum RulesSource<'a> {
    Embedded,
    Path(PathBuf),
    Bytes(&'a [u8]),
}

const EMBEDDED_RULES: &str = include_str!("../../data/base/rules.yaml");

pub fn load_rules(source: RulesSource<'_>) -> Result<Rules, RulesError> {
    let rules: Rules = match source {
        RulesSource::Embedded => serde_yaml::from_str(EMBEDDED_RULES)?,
        RulesSource::Path(path) => {
            let yaml = std::fs::read_to_string(path)?;
            serde_yaml::from_str(&yaml)?
        }
        RulesSource::Bytes(bytes) => serde_yaml::from_str(std::str::from_utf8(bytes)?)?,
    };

    rules.validate()?;
    Ok(rules)
}

impl Rules {
    /// Rejects inverted diplomacy bounds, non-positive unit health and negative costs.
    pub fn validate(&self) -> Result<(), RulesError> {
        let errors = self.validation_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(RulesError::Invalid(errors))
        }
    }
}
