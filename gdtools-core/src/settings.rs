use std::fs::read_to_string;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

///
/// Tunable distances and size limits shared by apply, normalize, mask and
/// simulate. Every field has a default, so a settings file only needs the
/// values it changes.
///
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Bases a mutation boundary may lie from a repeat and still count as next to it.
    pub slop_distance: i64,
    /// DEL/AMP at most this long are tagged like small indels.
    pub size_cutoff_amp_becomes_ins_del: i64,
    /// Largest mutation treated as small when masking.
    pub mask_small_max_size: i64,
    pub simulate_max_attempts: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            slop_distance: 20,
            size_cutoff_amp_becomes_ins_del: 50,
            mask_small_max_size: 20,
            simulate_max_attempts: 1000,
        }
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl TryFrom<&Path> for Settings {
    type Error = SettingsError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let toml_str = read_to_string(path)?;
        let settings = toml::from_str(&toml_str)?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use std::io::Write;

    #[rstest]
    fn test_partial_settings_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "slop_distance = 5").unwrap();

        let settings = Settings::try_from(file.path()).unwrap();
        assert_eq!(settings.slop_distance, 5);
        assert_eq!(settings.mask_small_max_size, 20);
    }

    #[rstest]
    fn test_bad_settings_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "slop_distance = \"far\"").unwrap();
        assert!(Settings::try_from(file.path()).is_err());

        assert!(Settings::try_from(Path::new("missing.toml")).is_err());
    }
}
