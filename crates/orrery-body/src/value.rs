//! Property values, target descriptions, and the conversion of a value into
//! what actually leaves the component.

use glam::Vec4;

use crate::services::ChannelValue;

/// Stored or effective value of a property.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PropertyValue {
    /// Numeric property value.
    Number(f32),
    /// Linear RGBA color.
    Color([f32; 4]),
    /// Index into a material-selection option list.
    Selection(usize),
}

impl PropertyValue {
    /// Human-readable kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Color(_) => "color",
            Self::Selection(_) => "selection",
        }
    }

    /// The number, if this is a numeric value.
    pub fn as_number(&self) -> Option<f32> {
        match *self {
            Self::Number(v) => Some(v),
            _ => None,
        }
    }

    /// The color, if this is a color value.
    pub fn as_color(&self) -> Option<[f32; 4]> {
        match *self {
            Self::Color(c) => Some(c),
            _ => None,
        }
    }

    /// The option index, if this is a selection value.
    pub fn as_selection(&self) -> Option<usize> {
        match *self {
            Self::Selection(i) => Some(i),
            _ => None,
        }
    }
}

impl From<f32> for PropertyValue {
    fn from(v: f32) -> Self {
        Self::Number(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Number(v as f32)
    }
}

impl From<[f32; 4]> for PropertyValue {
    fn from(c: [f32; 4]) -> Self {
        Self::Color(c)
    }
}

impl From<[f64; 4]> for PropertyValue {
    fn from(c: [f64; 4]) -> Self {
        Self::Color(c.map(|v| v as f32))
    }
}

impl From<usize> for PropertyValue {
    fn from(i: usize) -> Self {
        Self::Selection(i)
    }
}

/// Rounding applied to numeric values before they leave the component.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NumericType {
    /// Rounded to the nearest integer.
    Integer,
    /// Passed through unchanged.
    #[default]
    Float,
}

/// How a value is mapped onto its target channel.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum UpdateMethod {
    /// Write the value as is.
    #[default]
    Direct,
    /// Remap the value's position inside its range onto `[from, to]`.
    /// Only meaningful for numeric properties; other kinds write directly.
    Lerp {
        /// Channel value at the range minimum.
        from: f32,
        /// Channel value at the range maximum.
        to: f32,
    },
}

/// Which collaborator a target writes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// A shader uniform, written during the shader sync step.
    ShaderUniform,
    /// A procedural-texture backend input, written during a group rebuild.
    BackendInput,
}

/// Where a property's value is written.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyTarget {
    /// Destination collaborator.
    pub kind: TargetKind,
    /// Uniform or input name.
    pub channel: String,
    /// Value mapping.
    pub method: UpdateMethod,
}

impl PropertyTarget {
    /// Direct write to a shader uniform.
    pub fn uniform(channel: impl Into<String>) -> Self {
        Self {
            kind: TargetKind::ShaderUniform,
            channel: channel.into(),
            method: UpdateMethod::Direct,
        }
    }

    /// Direct write to a backend input.
    pub fn backend(channel: impl Into<String>) -> Self {
        Self {
            kind: TargetKind::BackendInput,
            channel: channel.into(),
            method: UpdateMethod::Direct,
        }
    }

    /// Remap onto `[from, to]` instead of writing directly.
    pub fn lerp(mut self, from: f32, to: f32) -> Self {
        self.method = UpdateMethod::Lerp { from, to };
        self
    }
}

/// Convert a numeric value for a target.
pub(crate) fn numeric_output(
    value: f32,
    min: f32,
    max: f32,
    data_type: NumericType,
    method: UpdateMethod,
) -> ChannelValue {
    let mapped = match method {
        UpdateMethod::Direct => value,
        UpdateMethod::Lerp { from, to } => {
            let span = max - min;
            let t = if span.abs() > f32::EPSILON {
                ((value - min) / span).clamp(0.0, 1.0)
            } else {
                0.0
            };
            from + (to - from) * t
        }
    };
    match data_type {
        NumericType::Integer => ChannelValue::Int(mapped.round() as i32),
        NumericType::Float => ChannelValue::Float(mapped),
    }
}

/// Convert a color value for a target.
pub(crate) fn color_output(color: [f32; 4]) -> ChannelValue {
    ChannelValue::Vec4(Vec4::from_array(color))
}
