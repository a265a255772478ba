//! Engine configuration.

use std::env;

use tracing::warn;

/// Configuration for one engine instance.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Compile every Program as strict mode code, with or without a
    /// `"use strict"` directive.
    pub strict: bool,
    /// Deepest nesting of function calls before a RangeError is thrown.
    pub max_call_depth: usize,
    /// Install the core built-ins into the global object.
    pub install_builtins: bool,
    /// Source name used for Programs compiled without an explicit name.
    pub default_source_name: String,
}

impl EngineConfig {
    pub const DEFAULT_MAX_CALL_DEPTH: usize = 512;
    pub const ENV_STRICT: &'static str = "JSRUN_STRICT";
    pub const ENV_MAX_CALL_DEPTH: &'static str = "JSRUN_MAX_CALL_DEPTH";

    pub fn new() -> Self {
        EngineConfig {
            strict: false,
            max_call_depth: Self::DEFAULT_MAX_CALL_DEPTH,
            install_builtins: true,
            default_source_name: "<eval>".to_string(),
        }
    }

    /// Defaults overridden by `JSRUN_STRICT` (`1`/`true`/`0`/`false`) and
    /// `JSRUN_MAX_CALL_DEPTH`. Values that do not parse are logged and
    /// ignored.
    pub fn from_env() -> Self {
        let mut config = EngineConfig::new();
        if let Ok(v) = env::var(Self::ENV_STRICT) {
            match parse_flag(&v) {
                Some(strict) => config.strict = strict,
                None => warn!(variable = Self::ENV_STRICT, value = %v, "ignoring invalid value"),
            }
        }
        if let Ok(v) = env::var(Self::ENV_MAX_CALL_DEPTH) {
            match v.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => config.max_call_depth = depth,
                _ => warn!(variable = Self::ENV_MAX_CALL_DEPTH, value = %v, "ignoring invalid value"),
            }
        }
        config
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    pub fn with_builtins(mut self, install_builtins: bool) -> Self {
        self.install_builtins = install_builtins;
        self
    }

    pub fn with_default_source_name(mut self, name: impl Into<String>) -> Self {
        self.default_source_name = name.into();
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = EngineConfig::new()
            .with_strict(true)
            .with_max_call_depth(16)
            .with_builtins(false)
            .with_default_source_name("repl");
        assert!(config.strict);
        assert_eq!(config.max_call_depth, 16);
        assert!(!config.install_builtins);
        assert_eq!(config.default_source_name, "repl");
    }

    #[test]
    fn environment_overrides_apply_and_invalid_values_are_ignored() {
        env::set_var(EngineConfig::ENV_STRICT, "on");
        env::set_var(EngineConfig::ENV_MAX_CALL_DEPTH, " 32 ");
        let config = EngineConfig::from_env();
        assert!(config.strict);
        assert_eq!(config.max_call_depth, 32);

        env::set_var(EngineConfig::ENV_STRICT, "maybe");
        env::set_var(EngineConfig::ENV_MAX_CALL_DEPTH, "0");
        assert_eq!(EngineConfig::from_env(), EngineConfig::new());

        env::set_var(EngineConfig::ENV_MAX_CALL_DEPTH, "deep");
        assert_eq!(EngineConfig::from_env().max_call_depth, EngineConfig::DEFAULT_MAX_CALL_DEPTH);

        env::remove_var(EngineConfig::ENV_STRICT);
        env::remove_var(EngineConfig::ENV_MAX_CALL_DEPTH);
        assert_eq!(EngineConfig::from_env(), EngineConfig::new());
    }

    #[test]
    fn flags_parse_leniently() {
        assert_eq!(parse_flag(" TRUE "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
