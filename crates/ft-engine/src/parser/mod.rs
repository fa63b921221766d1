//! Definition loader — parse game definitions from JSON or YAML
//!
//! Parsing checks the loader limits first and then the full structural
//! validation of [`GameDefinition::validate`], so a definition returned from
//! here is ready for [`OutcomeEngine::new`](crate::OutcomeEngine::new).
//!
//! ## Usage
//!
//! ```rust,ignore
//! let parser = DefinitionParser::new();
//! let definition = parser.parse_yaml(yaml_string)?;
//! let engine = OutcomeEngine::new(definition)?;
//! ```

use std::path::Path;

use log::debug;

use crate::config::GameDefinition;
use crate::error::{ConfigError, ConfigResult};

/// Serialization format of a definition file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionFormat {
    Json,
    Yaml,
}

impl DefinitionFormat {
    /// Detect by file extension
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Size limits applied before validation
#[derive(Debug, Clone)]
pub struct LoadLimits {
    pub max_name_length: usize,
    pub max_symbols: usize,
    pub max_paylines: usize,
    pub max_reels: usize,
    pub max_rows: usize,
}

impl Default for LoadLimits {
    fn default() -> Self {
        Self {
            max_name_length: 256,
            max_symbols: 64,
            max_paylines: 100,
            max_reels: 10,
            max_rows: 10,
        }
    }
}

/// Game definition parser
#[derive(Debug, Clone, Default)]
pub struct DefinitionParser {
    pub limits: LoadLimits,
}

impl DefinitionParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create parser with custom limits
    pub fn with_limits(limits: LoadLimits) -> Self {
        Self { limits }
    }

    pub fn parse_json(&self, json: &str) -> ConfigResult<GameDefinition> {
        let definition: GameDefinition = serde_json::from_str(json)?;
        self.check(definition)
    }

    pub fn parse_yaml(&self, yaml: &str) -> ConfigResult<GameDefinition> {
        let definition: GameDefinition = serde_yml::from_str(yaml)?;
        self.check(definition)
    }

    pub fn parse(&self, text: &str, format: DefinitionFormat) -> ConfigResult<GameDefinition> {
        match format {
            DefinitionFormat::Json => self.parse_json(text),
            DefinitionFormat::Yaml => self.parse_yaml(text),
        }
    }

    /// Read and parse a file; the format follows the extension
    pub fn load_file(&self, path: impl AsRef<Path>) -> ConfigResult<GameDefinition> {
        let path = path.as_ref();
        let format = DefinitionFormat::from_path(path)?;
        let text = std::fs::read_to_string(path)?;
        debug!("Loading game definition from {}", path.display());
        self.parse(&text, format)
    }

    fn check(&self, definition: GameDefinition) -> ConfigResult<GameDefinition> {
        self.check_limits(&definition)?;
        definition.validate()?;
        Ok(definition)
    }

    /// Reject definitions above the loader limits
    pub fn check_limits(&self, definition: &GameDefinition) -> ConfigResult<()> {
        let checks = [
            ("name length", definition.name.len(), self.limits.max_name_length),
            ("symbol count", definition.symbols.len(), self.limits.max_symbols),
            ("payline count", definition.paylines.len(), self.limits.max_paylines),
            ("reel count", definition.grid.reels as usize, self.limits.max_reels),
            ("row count", definition.grid.rows as usize, self.limits.max_rows),
        ];
        for (what, got, max) in checks {
            if got > max {
                return Err(ConfigError::LimitExceeded { what, got, max });
            }
        }
        Ok(())
    }
}

impl GameDefinition {
    /// Parse and validate a JSON definition
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        DefinitionParser::new().parse_json(json)
    }

    /// Parse and validate a YAML definition
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        DefinitionParser::new().parse_yaml(yaml)
    }

    /// Load a `.json`, `.yaml` or `.yml` definition file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        DefinitionParser::new().load_file(path)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_definition;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            DefinitionFormat::from_path(Path::new("games/tiger.yaml")).unwrap(),
            DefinitionFormat::Yaml
        );
        assert_eq!(
            DefinitionFormat::from_path(Path::new("TIGER.JSON")).unwrap(),
            DefinitionFormat::Json
        );
        assert!(DefinitionFormat::from_path(Path::new("tiger.toml")).is_err());
    }

    #[test]
    fn test_json_and_yaml_roundtrip() {
        let def = test_definition();
        let from_json = GameDefinition::from_json(&def.to_json().unwrap()).unwrap();
        assert_eq!(from_json, def);
        let from_yaml = GameDefinition::from_yaml(&def.to_yaml().unwrap()).unwrap();
        assert_eq!(from_yaml, def);
    }

    #[test]
    fn test_limits() {
        let parser = DefinitionParser::with_limits(LoadLimits {
            max_paylines: 3,
            ..LoadLimits::default()
        });
        let json = test_definition().to_json().unwrap();
        assert!(matches!(
            parser.parse_json(&json),
            Err(ConfigError::LimitExceeded {
                what: "payline count",
                got: 5,
                max: 3
            })
        ));
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(GameDefinition::from_json("{"), Err(ConfigError::Json(_))));
        assert!(matches!(
            GameDefinition::from_yaml("id: [unterminated"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            GameDefinition::load("/nonexistent/definition.yaml"),
            Err(ConfigError::Io(_))
        ));
    }
}
