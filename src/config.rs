use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Space/time knobs of a [`crate::PsiTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Number of ψ values per gamma coded block. Bounds the decode cost of one ψ lookup.
    pub compress_step: usize,
    /// Interval between stored suffix array entries. Bounds the ψ walk of a locate.
    pub sample_step: usize,
    /// Interval between first-byte samples used to start the region scan.
    pub sample_char_step: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            compress_step: 32,
            sample_step: 16,
            sample_char_step: 128,
        }
    }
}

impl IndexConfig {
    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<IndexConfig> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("opening config {:?}", path))?;
        let config: IndexConfig = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing config {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        for (name, value) in [
            ("compress_step", self.compress_step),
            ("sample_step", self.sample_step),
            ("sample_char_step", self.sample_char_step),
        ] {
            if value == 0 {
                return Err(Error::InvalidStep { name, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: IndexConfig = serde_json::from_str(r#"{"compress_step": 8}"#).unwrap();
        assert_eq!(config.compress_step, 8);
        assert_eq!(config.sample_step, IndexConfig::default().sample_step);
        assert_eq!(config.sample_char_step, 128);
    }

    #[test]
    fn zero_steps_are_rejected() {
        let config = IndexConfig {
            sample_step: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(Error::InvalidStep {
                name: "sample_step",
                value: 0
            })
        );
    }
}
