use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use directories::UserDirs;
use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;

use crate::filter::Borders;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("border.{side} must be a percentage in 0..=100, got {value}")]
    BorderOutOfRange { side: &'static str, value: i32 },
    #[error("unknown mode '{0}' (expected flex|f or strict|s)")]
    UnknownMode(String),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Border touches pass when another finger is close by.
    #[default]
    #[serde(alias = "f")]
    Flex,
    /// Border touches never pass.
    #[serde(alias = "s")]
    Strict,
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "f" | "flex" => Ok(Mode::Flex),
            "s" | "strict" => Ok(Mode::Strict),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Flex => "flex",
            Mode::Strict => "strict",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub device: Option<String>,
    pub mode: Mode,
    pub border: Borders,
}

/// Values given on the command line; `None` keeps the file/default value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub device: Option<String>,
    pub mode: Option<Mode>,
    pub left: Option<i32>,
    pub right: Option<i32>,
    pub top: Option<i32>,
    pub bottom: Option<i32>,
}

pub fn config_dir() -> Option<PathBuf> {
    let home = UserDirs::new()?.home_dir().to_path_buf();
    Some(home.join(".config").join("touchcrop"))
}

pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

impl Settings {
    pub fn parse(txt: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(txt).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads `explicit` if given (it must exist), else the default file if
    /// there is one, else built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) if p.exists() => p,
                _ => {
                    debug!("no config file; using defaults");
                    return Ok(Self::default());
                }
            },
        };
        let txt = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let settings = Self::parse(&txt, &path)?;
        info!("loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn apply(&mut self, o: Overrides) {
        if let Some(d) = o.device {
            self.device = Some(d);
        }
        if let Some(m) = o.mode {
            self.mode = m;
        }
        let b = &mut self.border;
        for (slot, value) in [
            (&mut b.left, o.left),
            (&mut b.right, o.right),
            (&mut b.top, o.top),
            (&mut b.bottom, o.bottom),
        ] {
            if let Some(v) = value {
                *slot = v;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.border;
        for (side, value) in [
            ("left", b.left),
            ("right", b.right),
            ("top", b.top),
            ("bottom", b.bottom),
        ] {
            if !Borders::in_range(value) {
                return Err(ConfigError::BorderOutOfRange { side, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(txt: &str) -> Result<Settings, ConfigError> {
        Settings::parse(txt, Path::new("test.toml"))
    }

    #[test]
    fn empty_file_gives_defaults() {
        let s = parse("").unwrap();
        assert_eq!(s.mode, Mode::Flex);
        assert_eq!(s.border, Borders::new(10, 10, 0, 15));
        assert_eq!(s.device, None);
    }

    #[test]
    fn full_file() {
        let s = parse(
            r#"
            device = "/dev/input/event7"
            mode = "strict"
            [border]
            left = 5
            right = 6
            top = 7
            bottom = 8
            "#,
        )
        .unwrap();
        assert_eq!(s.device.as_deref(), Some("/dev/input/event7"));
        assert_eq!(s.mode, Mode::Strict);
        assert_eq!(s.border, Borders::new(5, 6, 7, 8));
    }

    #[test]
    fn partial_border_keeps_other_defaults() {
        let s = parse("mode = \"s\"\n[border]\ntop = 3\n").unwrap();
        assert_eq!(s.mode, Mode::Strict);
        assert_eq!(s.border, Borders::new(10, 10, 3, 15));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = parse("crop = 5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn misspelled_border_side_is_rejected() {
        let err = parse("[border]\nlft = 5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn overrides_win_over_file() {
        let mut s = parse("mode = \"strict\"\n[border]\nleft = 20\n").unwrap();
        s.apply(Overrides {
            mode: Some(Mode::Flex),
            right: Some(1),
            device: Some("/dev/input/event3".into()),
            ..Default::default()
        });
        assert_eq!(s.mode, Mode::Flex);
        assert_eq!(s.border, Borders::new(20, 1, 0, 15));
        assert_eq!(s.device.as_deref(), Some("/dev/input/event3"));
    }

    #[test]
    fn validation_names_the_offending_side() {
        let mut s = Settings::default();
        s.border.bottom = 101;
        match s.validate() {
            Err(ConfigError::BorderOutOfRange { side, value }) => {
                assert_eq!((side, value), ("bottom", 101));
            }
            other => panic!("unexpected {other:?}"),
        }
        s.border.bottom = 100;
        assert!(s.validate().is_ok());
    }

    #[test]
    fn mode_from_cli_spelling() {
        assert_eq!("f".parse::<Mode>().unwrap(), Mode::Flex);
        assert_eq!("Strict".parse::<Mode>().unwrap(), Mode::Strict);
        assert!(matches!(
            "p".parse::<Mode>(),
            Err(ConfigError::UnknownMode(m)) if m == "p"
        ));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = Settings::load(Some(Path::new("/nonexistent/touchcrop.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
