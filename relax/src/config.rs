use std::error::Error;
use std::fmt;

use fxhash::FxHashMap;
use log::warn;

/// Registry of the denoiser's tunables.
///
/// Every tunable is a named variable (see [`CONFIG_VARS`]) with a default
/// value and an inclusive valid range; values outside of that range are
/// clamped when set.
///
/// A `Config` is usually long-lived and shared between viewports - it's
/// snapshotted into [`crate::Settings`] once per denoise call.
#[derive(Clone, Debug)]
pub struct Config {
    values: FxHashMap<&'static str, ConfigValue>,
}

impl Config {
    pub fn vars() -> &'static [ConfigVar] {
        CONFIG_VARS
    }

    pub fn var(name: &str) -> Option<&'static ConfigVar> {
        CONFIG_VARS.iter().find(|var| var.name == name)
    }

    pub fn get(&self, name: &str) -> Option<ConfigValue> {
        self.values.get(name).copied()
    }

    /// Sets given variable, returning the value that's been actually stored
    /// (i.e. after clamping).
    pub fn set(
        &mut self,
        name: &str,
        value: impl Into<ConfigValue>,
    ) -> Result<ConfigValue, ConfigError> {
        let var = Self::var(name)
            .ok_or_else(|| ConfigError::UnknownVariable(name.to_string()))?;

        let value = var.coerce(value.into())?;
        let clamped = var.clamp(value);

        if clamped != value {
            warn!(
                "Value {value} is out of range for `{}` ({}..={}); \
                 clamping to {clamped}",
                var.name, var.min, var.max,
            );
        }

        self.values.insert(var.name, clamped);

        Ok(clamped)
    }

    /// Parses and sets given variable, e.g. from a console command.
    pub fn set_str(
        &mut self,
        name: &str,
        value: &str,
    ) -> Result<ConfigValue, ConfigError> {
        let var = Self::var(name)
            .ok_or_else(|| ConfigError::UnknownVariable(name.to_string()))?;

        let invalid = || ConfigError::InvalidValue {
            name: var.name,
            value: value.to_string(),
        };

        let value = value.trim();

        let value = match var.kind() {
            ConfigKind::Bool => match value {
                "1" | "true" | "on" => ConfigValue::Bool(true),
                "0" | "false" | "off" => ConfigValue::Bool(false),
                _ => return Err(invalid()),
            },

            ConfigKind::Int => {
                ConfigValue::Int(value.parse().map_err(|_| invalid())?)
            }

            ConfigKind::Float => {
                ConfigValue::Float(value.parse().map_err(|_| invalid())?)
            }
        };

        self.set(name, value)
    }

    /// Restores given variable to its default value.
    pub fn reset(&mut self, name: &str) -> Result<(), ConfigError> {
        let var = Self::var(name)
            .ok_or_else(|| ConfigError::UnknownVariable(name.to_string()))?;

        self.values.insert(var.name, var.default);

        Ok(())
    }

    pub(crate) fn bool(&self, name: &str) -> bool {
        match self.get(name) {
            Some(ConfigValue::Bool(value)) => value,
            _ => false,
        }
    }

    pub(crate) fn int(&self, name: &str) -> i32 {
        match self.get(name) {
            Some(ConfigValue::Int(value)) => value,
            _ => 0,
        }
    }

    pub(crate) fn float(&self, name: &str) -> f32 {
        match self.get(name) {
            Some(ConfigValue::Float(value)) => value,
            Some(ConfigValue::Int(value)) => value as f32,
            _ => 0.0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            values: CONFIG_VARS
                .iter()
                .map(|var| (var.name, var.default))
                .collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConfigValue {
    Bool(bool),
    Int(i32),
    Float(f32),
}

impl ConfigValue {
    pub fn kind(&self) -> ConfigKind {
        match self {
            ConfigValue::Bool(_) => ConfigKind::Bool,
            ConfigValue::Int(_) => ConfigKind::Int,
            ConfigValue::Float(_) => ConfigKind::Float,
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for ConfigValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(value) => write!(f, "{value}"),
            ConfigValue::Int(value) => write!(f, "{value}"),
            ConfigValue::Float(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigKind {
    Bool,
    Int,
    Float,
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigKind::Bool => write!(f, "bool"),
            ConfigKind::Int => write!(f, "int"),
            ConfigKind::Float => write!(f, "float"),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ConfigVar {
    pub name: &'static str,
    pub default: ConfigValue,

    /// Inclusive; ignored for booleans
    pub min: f32,

    /// Inclusive; ignored for booleans
    pub max: f32,

    pub description: &'static str,
}

impl ConfigVar {
    pub fn kind(&self) -> ConfigKind {
        self.default.kind()
    }

    fn coerce(&self, value: ConfigValue) -> Result<ConfigValue, ConfigError> {
        match (self.default, value) {
            (ConfigValue::Bool(_), ConfigValue::Bool(_))
            | (ConfigValue::Int(_), ConfigValue::Int(_))
            | (ConfigValue::Float(_), ConfigValue::Float(_)) => Ok(value),

            (ConfigValue::Float(_), ConfigValue::Int(value)) => {
                Ok(ConfigValue::Float(value as f32))
            }

            _ => Err(ConfigError::WrongKind {
                name: self.name,
                expected: self.kind(),
                got: value.kind(),
            }),
        }
    }

    fn clamp(&self, value: ConfigValue) -> ConfigValue {
        match value {
            ConfigValue::Bool(value) => ConfigValue::Bool(value),

            ConfigValue::Int(value) => ConfigValue::Int(
                value.clamp(self.min as i32, self.max as i32),
            ),

            ConfigValue::Float(value) => {
                // NaN is not a valid value of any variable
                let value = if value.is_nan() {
                    self.min
                } else {
                    value.clamp(self.min, self.max)
                };

                ConfigValue::Float(value)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    UnknownVariable(String),

    WrongKind {
        name: &'static str,
        expected: ConfigKind,
        got: ConfigKind,
    },

    InvalidValue {
        name: &'static str,
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownVariable(name) => {
                write!(f, "unknown variable: `{name}`")
            }

            ConfigError::WrongKind {
                name,
                expected,
                got,
            } => {
                write!(f, "`{name}` expects a {expected}, got a {got}")
            }

            ConfigError::InvalidValue { name, value } => {
                write!(f, "`{value}` is not a valid value for `{name}`")
            }
        }
    }
}

impl Error for ConfigError {}

macro_rules! vars {
    ([ $( $name:literal = $default:expr, ($min:expr, $max:expr), $desc:literal; )* ]) => {
        pub const CONFIG_VARS: &[ConfigVar] = &[
            $(
                ConfigVar {
                    name: $name,
                    default: $default,
                    min: $min as f32,
                    max: $max as f32,
                    description: $desc,
                },
            )*
        ];
    };
}

use ConfigValue::{Bool, Float, Int};

vars!([
    "relax.prepass.specular_blur_radius" = Float(50.0), (0, 100),
        "Specular blur radius of the prepass (in pixels, scaled by roughness); 0 disables it";
    "relax.prepass.diffuse_blur_radius" = Float(0.0), (0, 100),
        "Diffuse blur radius of the prepass (in pixels); 0 disables it";
    "relax.prepass.checkerboard" = Int(2), (0, 2),
        "Checkerboard mode of the inputs: 0 = black, 1 = white, 2 = off";
    "relax.reprojection.specular_max_accumulated_frame_num" = Int(63), (0, 63),
        "Maximum number of frames accumulated by the specular history";
    "relax.reprojection.specular_max_fast_accumulated_frame_num" = Int(4), (0, 63),
        "Maximum number of frames accumulated by the responsive specular history";
    "relax.reprojection.diffuse_max_accumulated_frame_num" = Int(63), (0, 63),
        "Maximum number of frames accumulated by the diffuse history";
    "relax.reprojection.diffuse_max_fast_accumulated_frame_num" = Int(0), (0, 63),
        "Maximum number of frames accumulated by the responsive diffuse history";
    "relax.reprojection.specular_variance_boost" = Float(1.0), (0, 8),
        "How much the variance of poorly reprojected specular is boosted";
    "relax.reprojection.bicubic" = Bool(true), (0, 1),
        "Whether history is sampled with a Catmull-Rom filter";
    "relax.reprojection.disocclusion_threshold" = Float(0.01), (0.001, 1),
        "Relative view-depth difference above which history is rejected";
    "relax.reprojection.roughness_based_specular_accumulation" = Bool(true), (0, 1),
        "Whether smoother surfaces accumulate fewer specular frames";
    "relax.reprojection.reject_diffuse_history_normal_threshold" = Float(0.0), (0, 1),
        "Minimum cosine between current and previous normals to keep history";
    "relax.disocclusion_fix.edge_stopping_normal_power" = Float(8.0), (0, 128),
        "Normal edge-stopping power of the disocclusion fix";
    "relax.disocclusion_fix.max_radius" = Float(8.0), (0, 100),
        "Maximum radius (in pixels) of the disocclusion fix";
    "relax.disocclusion_fix.num_frames_to_fix" = Int(3), (0, 10),
        "Pixels with shorter history than this get fixed spatially";
    "relax.history_clamping.color_box_sigma_scale" = Float(2.0), (1, 10),
        "Size of the responsive color box the history gets clamped into";
    "relax.antifirefly" = Bool(false), (0, 1),
        "Whether firefly suppression is enabled";
    "relax.spatial_variance_estimation.history_threshold" = Int(3), (0, 10),
        "Pixels with shorter history than this get their variance estimated spatially";
    "relax.atrous.iterations" = Int(5), (2, 8),
        "Number of iterations of the a-trous filter";
    "relax.atrous.specular_phi_luminance" = Float(2.0), (0, 10),
        "Specular luminance edge-stopping sensitivity";
    "relax.atrous.diffuse_phi_luminance" = Float(2.0), (0, 10),
        "Diffuse luminance edge-stopping sensitivity";
    "relax.atrous.min_luminance_weight" = Float(0.0), (0, 1),
        "Lower bound of the luminance edge-stopping weight";
    "relax.atrous.phi_normal" = Float(64.0), (0.1, 256),
        "Diffuse normal edge-stopping power";
    "relax.atrous.phi_depth" = Float(0.0001), (0, 1),
        "Depth edge-stopping sensitivity, relative to view depth";
    "relax.atrous.specular_lobe_angle_fraction" = Float(0.333), (0, 1),
        "Fraction of the specular lobe used for normal edge-stopping";
    "relax.atrous.specular_lobe_angle_slack" = Float(0.3), (0, 60),
        "Extra specular lobe angle (in degrees)";
    "relax.atrous.roughness_edge_stopping" = Bool(true), (0, 1),
        "Whether specular is edge-stopped on roughness difference";
    "relax.atrous.roughness_edge_stopping_relaxation" = Float(0.3), (0, 1),
        "How much roughness edge-stopping is relaxed in low-confidence areas";
    "relax.atrous.normal_edge_stopping_relaxation" = Float(0.3), (0, 1),
        "How much normal edge-stopping is relaxed in low-confidence areas";
    "relax.atrous.luminance_edge_stopping_relaxation" = Float(1.0), (0, 1),
        "How much luminance edge-stopping is relaxed in low-confidence areas";
    "relax.split_screen" = Float(0.0), (0, 100),
        "Percentage of the screen (from the left) showing the noisy input";
    "relax.denoising_range" = Float(100000.0), (0, 10000000),
        "Maximum view depth (in world units) of pixels that get denoised";
    "relax.misc.units_per_meter" = Float(100.0), (0.001, 1000000),
        "Number of world units in a meter";
]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        for (idx, var) in CONFIG_VARS.iter().enumerate() {
            assert!(
                CONFIG_VARS[idx + 1..].iter().all(|v| v.name != var.name),
                "duplicate variable: {}",
                var.name
            );
        }
    }

    #[test]
    fn defaults_are_within_ranges() {
        for var in CONFIG_VARS {
            assert_eq!(var.default, var.clamp(var.default), "{}", var.name);
        }
    }

    #[test]
    fn set_clamps() {
        let mut config = Config::default();

        assert_eq!(
            Ok(ConfigValue::Int(2)),
            config.set("relax.atrous.iterations", 1)
        );

        assert_eq!(
            Ok(ConfigValue::Int(8)),
            config.set("relax.atrous.iterations", 10)
        );

        assert_eq!(
            Ok(ConfigValue::Float(3.0)),
            config.set("relax.atrous.phi_normal", 3)
        );
    }

    #[test]
    fn set_rejects_invalid_values() {
        let mut config = Config::default();

        assert_eq!(
            Err(ConfigError::UnknownVariable("relax.nope".into())),
            config.set("relax.nope", true)
        );

        assert_eq!(
            Err(ConfigError::WrongKind {
                name: "relax.antifirefly",
                expected: ConfigKind::Bool,
                got: ConfigKind::Float,
            }),
            config.set("relax.antifirefly", 1.0)
        );

        assert!(config.set_str("relax.atrous.iterations", "five").is_err());
    }

    #[test]
    fn set_str() {
        let mut config = Config::default();

        config.set_str("relax.antifirefly", "on").unwrap();
        config.set_str("relax.atrous.phi_depth", " 0.5 ").unwrap();

        assert!(config.bool("relax.antifirefly"));
        assert_eq!(0.5, config.float("relax.atrous.phi_depth"));

        config.reset("relax.antifirefly").unwrap();

        assert!(!config.bool("relax.antifirefly"));
    }
}
