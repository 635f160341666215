use std::path::{Path, PathBuf};

use anyhow::Context;
use glam::Vec3;
use roxmltree::{Document, Node};
use thiserror::Error;

use crate::bounce::Axis;

/// Errors raised while reading a viewer configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("root element must be <viewer>, found <{0}>")]
    UnexpectedRoot(String),
    #[error("<{tag}> expects a number, got {value:?}")]
    InvalidNumber { tag: String, value: String },
    #[error("<{tag}> expects three numbers, got {value:?}")]
    InvalidVector { tag: String, value: String },
    #[error("<{tag}> expects true or false, got {value:?}")]
    InvalidBool { tag: String, value: String },
    #[error("unknown axis {0:?}; expected x, y or z")]
    UnknownAxis(String),
    #[error("field of view must lie strictly between 0 and 180 degrees, got {0}")]
    FieldOfViewOutOfRange(f32),
    #[error("ground size must be positive, got {0}")]
    NonPositiveGroundSize(f32),
    #[error("bounce speed must be positive, got {0}")]
    NonPositiveSpeed(f32),
    #[error("bounce bounds are empty: min {min} must be below max {max}")]
    EmptyBounds { min: f32, max: f32 },
}

/// Parameters of the bouncing object.
#[derive(Debug, Clone, PartialEq)]
pub struct BounceConfig {
    pub object: String,
    pub axis: Axis,
    pub speed: f32,
    pub min: f32,
    pub max: f32,
}

impl Default for BounceConfig {
    fn default() -> Self {
        Self {
            object: "square".to_string(),
            axis: Axis::X,
            speed: 0.5,
            min: -50.0,
            max: 50.0,
        }
    }
}

/// Literal scene parameters, overridable from an XML document.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub texture: Option<PathBuf>,
    pub background: Vec3,
    pub ground_size: f32,
    pub fov: f32,
    pub camera_position: Vec3,
    pub camera_target: Vec3,
    pub damping: bool,
    pub bounce: BounceConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            texture: None,
            background: Vec3::new(0.03, 0.03, 0.05),
            ground_size: 100.0,
            fov: 45.0,
            camera_position: Vec3::new(0.0, 40.0, 110.0),
            camera_target: Vec3::new(0.0, 5.0, 0.0),
            damping: false,
            bounce: BounceConfig::default(),
        }
    }
}

impl ViewerConfig {
    /// Reads a configuration file; relative texture paths resolve against its directory.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read {}", path.display()))?;
        let mut config = Self::from_xml(&xml)
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        if let (Some(texture), Some(parent)) = (config.texture.as_ref(), path.parent()) {
            if texture.is_relative() {
                config.texture = Some(parent.join(texture));
            }
        }
        Ok(config)
    }

    /// Applies the overrides found in a `<viewer>` document to the defaults.
    pub fn from_xml(xml: &str) -> Result<Self, ConfigError> {
        let document = Document::parse(xml)?;
        let root = document.root_element();
        if !root.has_tag_name("viewer") {
            return Err(ConfigError::UnexpectedRoot(
                root.tag_name().name().to_string(),
            ));
        }

        let mut config = Self::default();
        if let Some(texture) = optional_text(&root, "texture") {
            config.texture = Some(PathBuf::from(texture));
        }
        if let Some(color) = parse_vec3(&root, "background")? {
            config.background = color / 255.0;
        }
        config.ground_size = parse_f32(&root, "ground-size")?.unwrap_or(config.ground_size);
        config.fov = parse_f32(&root, "fov")?.unwrap_or(config.fov);
        config.camera_position =
            parse_vec3(&root, "camera-position")?.unwrap_or(config.camera_position);
        config.camera_target = parse_vec3(&root, "camera-target")?.unwrap_or(config.camera_target);
        config.damping = parse_bool(&root, "damping")?.unwrap_or(config.damping);

        let bounce = &mut config.bounce;
        if let Some(object) = optional_text(&root, "bounce-object") {
            bounce.object = object;
        }
        if let Some(axis) = optional_text(&root, "bounce-axis") {
            bounce.axis = Axis::from_name(&axis).ok_or(ConfigError::UnknownAxis(axis))?;
        }
        bounce.speed = parse_f32(&root, "bounce-speed")?.unwrap_or(bounce.speed);
        bounce.min = parse_f32(&root, "bounce-min")?.unwrap_or(bounce.min);
        bounce.max = parse_f32(&root, "bounce-max")?.unwrap_or(bounce.max);

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fov > 0.0 && self.fov < 180.0) {
            return Err(ConfigError::FieldOfViewOutOfRange(self.fov));
        }
        if self.ground_size <= 0.0 {
            return Err(ConfigError::NonPositiveGroundSize(self.ground_size));
        }
        if self.bounce.speed <= 0.0 {
            return Err(ConfigError::NonPositiveSpeed(self.bounce.speed));
        }
        if self.bounce.min >= self.bounce.max {
            return Err(ConfigError::EmptyBounds {
                min: self.bounce.min,
                max: self.bounce.max,
            });
        }
        Ok(())
    }
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_f32(node: &Node<'_, '_>, tag: &str) -> Result<Option<f32>, ConfigError> {
    let Some(value) = optional_text(node, tag) else {
        return Ok(None);
    };
    match value.parse::<f32>() {
        Ok(number) if number.is_finite() => Ok(Some(number)),
        _ => Err(ConfigError::InvalidNumber {
            tag: tag.to_string(),
            value,
        }),
    }
}

fn parse_vec3(node: &Node<'_, '_>, tag: &str) -> Result<Option<Vec3>, ConfigError> {
    let Some(value) = optional_text(node, tag) else {
        return Ok(None);
    };
    let numbers: Vec<f32> = value
        .split_whitespace()
        .map_while(|component| component.parse::<f32>().ok())
        .collect();
    match numbers.as_slice() {
        [x, y, z] => Ok(Some(Vec3::new(*x, *y, *z))),
        _ => Err(ConfigError::InvalidVector {
            tag: tag.to_string(),
            value,
        }),
    }
}

fn parse_bool(node: &Node<'_, '_>, tag: &str) -> Result<Option<bool>, ConfigError> {
    let Some(value) = optional_text(node, tag) else {
        return Ok(None);
    };
    match value.as_str() {
        "true" | "1" | "yes" => Ok(Some(true)),
        "false" | "0" | "no" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidBool {
            tag: tag.to_string(),
            value,
        }),
    }
}
