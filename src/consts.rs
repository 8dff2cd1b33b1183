//! Well-known cache variable names and build configurations.

use std::fmt;

use crate::value::Value;

pub const CMAKE_C_COMPILER: &str = "CMAKE_C_COMPILER";
pub const CMAKE_CXX_COMPILER: &str = "CMAKE_CXX_COMPILER";
pub const CMAKE_MAKE_PROGRAM: &str = "CMAKE_MAKE_PROGRAM";
pub const CMAKE_AR: &str = "CMAKE_AR";
pub const CMAKE_BUILD_TYPE: &str = "CMAKE_BUILD_TYPE";

/// The common build configurations. Custom build types exist too; pass
/// those as plain strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildConfiguration {
    Debug,
    Release,
    RelWithDebInfo,
    MinSizeRel,
}

impl BuildConfiguration {
    pub const fn as_str(self) -> &'static str {
        match self {
            BuildConfiguration::Debug => "Debug",
            BuildConfiguration::Release => "Release",
            BuildConfiguration::RelWithDebInfo => "RelWithDebInfo",
            BuildConfiguration::MinSizeRel => "MinSizeRel",
        }
    }
}

impl fmt::Display for BuildConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<BuildConfiguration> for Value {
    fn from(configuration: BuildConfiguration) -> Self {
        Value::String(configuration.as_str().to_string())
    }
}
