//! Session configuration.
//!
//! A [`SessionConfig`] is fixed for the life of a session. It can be built
//! in code or loaded from YAML/JSON:
//!
//! ```yaml
//! format_id: 10
//! metric_set_id: 1
//! period_exponent: 16
//! engine: { class: render, instance: 0 }
//! start_disabled: false
//! buffer_size: 16777216
//! non_blocking: true
//! ```

use std::str::FromStr;

use oa_errors::{ConfigError, StreamError};
use oa_exponent::MAX_PERIOD_EXPONENT;
use oa_format::{FormatCatalog, FormatDescriptor, Generation};
use serde::{Deserialize, Serialize};

/// Smallest report buffer the device accepts.
pub const MIN_BUFFER_SIZE: usize = 128 * 1024;
/// Largest report buffer the device accepts.
pub const MAX_BUFFER_SIZE: usize = 128 * 1024 * 1024;

/// Class of the engine a stream samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineClass {
    /// Render/3D engine
    #[default]
    Render,
    /// Compute engine
    Compute,
    /// Blitter
    Copy,
    /// Video decode engine
    VideoDecode,
    /// Video enhancement engine
    VideoEnhance,
}

impl EngineClass {
    /// Whether the engine is sampled by a media unit.
    pub const fn is_video(self) -> bool {
        matches!(self, EngineClass::VideoDecode | EngineClass::VideoEnhance)
    }
}

/// The engine instance a stream samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EngineSelector {
    /// Engine class
    pub class: EngineClass,
    /// Instance within the class
    #[serde(default)]
    pub instance: u16,
}

impl FromStr for EngineClass {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "render" => Ok(EngineClass::Render),
            "compute" => Ok(EngineClass::Compute),
            "copy" => Ok(EngineClass::Copy),
            "video_decode" => Ok(EngineClass::VideoDecode),
            "video_enhance" => Ok(EngineClass::VideoEnhance),
            other => Err(ConfigError::InvalidValue {
                field: "engine".to_string(),
                reason: format!("unknown engine class '{other}'"),
            }),
        }
    }
}

/// Parses `class` or `class:instance`, e.g. `video_decode:1`.
impl FromStr for EngineSelector {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (class, instance) = match s.split_once(':') {
            Some((class, instance)) => {
                let instance = instance.parse().map_err(|e| ConfigError::InvalidValue {
                    field: "engine".to_string(),
                    reason: format!("bad instance '{instance}': {e}"),
                })?;
                (class, instance)
            }
            None => (s, 0),
        };
        Ok(Self {
            class: class.parse()?,
            instance,
        })
    }
}

/// Parameters of a counter stream session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Report format id, interpreted per generation
    pub format_id: u32,
    /// Metric set programming the counter multiplexers
    pub metric_set_id: u64,
    /// Sampling exponent; `None` opens a stream that does not sample
    #[serde(default)]
    pub period_exponent: Option<u32>,
    /// Engine to sample
    #[serde(default)]
    pub engine: EngineSelector,
    /// Open in the disabled state
    #[serde(default)]
    pub start_disabled: bool,
    /// Report buffer size in bytes, device default when absent
    #[serde(default)]
    pub buffer_size: Option<usize>,
    /// Fail reads with `WouldBlock` instead of waiting
    #[serde(default)]
    pub non_blocking: bool,
}

impl SessionConfig {
    /// A periodic sampling configuration on the first render engine.
    pub fn new(format_id: u32, metric_set_id: u64, period_exponent: u32) -> Self {
        Self {
            format_id,
            metric_set_id,
            period_exponent: Some(period_exponent),
            engine: EngineSelector::default(),
            start_disabled: false,
            buffer_size: None,
            non_blocking: false,
        }
    }

    /// Sample a different engine.
    pub fn with_engine(mut self, class: EngineClass, instance: u16) -> Self {
        self.engine = EngineSelector { class, instance };
        self
    }

    /// Open disabled; reads fail until the session is enabled.
    pub fn disabled(mut self) -> Self {
        self.start_disabled = true;
        self
    }

    /// Return `WouldBlock` instead of waiting for reports.
    pub fn non_blocking(mut self) -> Self {
        self.non_blocking = true;
        self
    }

    /// Request a report buffer size.
    pub fn with_buffer_size(mut self, bytes: usize) -> Self {
        self.buffer_size = Some(bytes);
        self
    }

    /// Open without periodic sampling.
    pub fn without_sampling(mut self) -> Self {
        self.period_exponent = None;
        self
    }

    /// Whether the session samples periodically.
    pub fn is_sampling(&self) -> bool {
        self.period_exponent.is_some()
    }

    /// Parse a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed input.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::yaml(e.to_string()))
    }

    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed input.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::json(e.to_string()))
    }

    /// Check the configuration against a catalog and resolve its format.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidFormat`] if the format is not defined
    /// for `generation`, and [`StreamError::InvalidConfig`] for a zero
    /// metric set, an exponent above [`MAX_PERIOD_EXPONENT`], a buffer size
    /// that is not a power of two in range, or an engine the format's unit
    /// cannot sample.
    pub fn validate<'c>(
        &self,
        catalog: &'c FormatCatalog,
        generation: Generation,
    ) -> Result<&'c FormatDescriptor, StreamError> {
        let format = catalog.lookup(generation, self.format_id)?;

        if self.metric_set_id == 0 {
            return Err(StreamError::invalid_config("metric set 0 is reserved"));
        }
        if let Some(exponent) = self.period_exponent
            && exponent > MAX_PERIOD_EXPONENT
        {
            return Err(StreamError::invalid_config(format!(
                "period exponent {exponent} exceeds {MAX_PERIOD_EXPONENT}"
            )));
        }
        if let Some(size) = self.buffer_size
            && (!size.is_power_of_two() || !(MIN_BUFFER_SIZE..=MAX_BUFFER_SIZE).contains(&size))
        {
            return Err(StreamError::invalid_config(format!(
                "buffer size {size} must be a power of two between {MIN_BUFFER_SIZE} and {MAX_BUFFER_SIZE}"
            )));
        }
        if self.engine.class.is_video() != format.unit().is_media() {
            return Err(StreamError::invalid_config(format!(
                "format {} cannot sample {:?} engines",
                format.name(),
                self.engine.class
            )));
        }
        Ok(format)
    }
}
