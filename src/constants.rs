// src/constants.rs

/// The token that ends the arguments of one call in a command line.
pub const DEFAULT_SEPARATOR: &str = "-";

/// Front tokens that ask for the help screen of the current component.
pub const HELP_FLAGS: [&str; 2] = ["-h", "--help"];

/// The directory holding the configuration file (inside `~/.config/`).
pub const CONFIG_DIR: &str = "ignite";

/// The name of the configuration file.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Overrides the configuration file location.
pub const CONFIG_PATH_ENV: &str = "IGNITE_CONFIG";

/// Disables colored output when set to any value.
pub const NO_COLOR_ENV: &str = "IGNITE_NO_COLOR";
