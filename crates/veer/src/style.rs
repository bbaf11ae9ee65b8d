//! Style property values, transforms and animation parameters.
//!
//! A [`Transform`] is the target of an animation: a named set of style
//! properties (top/left/opacity/...) an element should settle at.
//! [`AnimateOptions`] carries the timing parameters the external animation
//! engine interprets.

use std::collections::BTreeMap;

/// A single style property value.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    /// A pixel quantity.
    Px(f32),
    /// A unitless number (e.g. opacity).
    Number(f32),
    /// An uninterpreted string value.
    Raw(String),
}

impl StyleValue {
    /// The numeric value, if this is a pixel or number quantity.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Px(v) | Self::Number(v) => Some(*v),
            Self::Raw(_) => None,
        }
    }
}

/// A named set of target style properties.
///
/// Properties are kept ordered so two transforms with the same contents
/// compare equal regardless of insertion order; equality is what the
/// reconciler uses to detect a visually-unchanged merge.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Transform {
    props: BTreeMap<String, StyleValue>,
}

impl Transform {
    /// Create an empty transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, returning `self` for chaining.
    pub fn with(mut self, name: impl Into<String>, value: StyleValue) -> Self {
        self.props.insert(name.into(), value);
        self
    }

    /// Set a pixel property.
    pub fn with_px(self, name: impl Into<String>, value: f32) -> Self {
        self.with(name, StyleValue::Px(value))
    }

    /// Set a property in place.
    pub fn set(&mut self, name: impl Into<String>, value: StyleValue) {
        self.props.insert(name.into(), value);
    }

    /// Get a property.
    pub fn get(&self, name: &str) -> Option<&StyleValue> {
        self.props.get(name)
    }

    /// Get a property's numeric value.
    pub fn get_f32(&self, name: &str) -> Option<f32> {
        self.get(name).and_then(StyleValue::as_f32)
    }

    /// Whether the transform carries no properties.
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.props.len()
    }

    /// Deep-merge another transform into this one; incoming values win.
    pub fn merge(&mut self, other: &Transform) {
        for (name, value) in &other.props {
            self.props.insert(name.clone(), value.clone());
        }
    }

    /// Iterate over the properties in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleValue)> {
        self.props.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Easing curve names, interpreted by the external animation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    /// Linear interpolation (no easing).
    Linear,
    /// Starts slow, accelerates.
    EaseIn,
    /// Starts fast, decelerates.
    #[default]
    EaseOut,
    /// Smooth start and end.
    EaseInOut,
}

impl Easing {
    /// The conventional CSS-style name for this curve.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::EaseIn => "ease-in",
            Self::EaseOut => "ease-out",
            Self::EaseInOut => "ease-in-out",
        }
    }
}

/// Timing parameters for one animation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimateOptions {
    /// Tween duration in milliseconds.
    pub duration_ms: f64,
    /// Delay before the tween starts, in milliseconds.
    pub delay_ms: f64,
    /// Easing curve.
    pub easing: Easing,
    /// Apply the target immediately with zero effective duration.
    ///
    /// Used by the reconciler so that visually-unchanged merges and
    /// slot-throttled renders still run the normal completion pipeline.
    pub instant: bool,
}

impl Default for AnimateOptions {
    fn default() -> Self {
        Self {
            duration_ms: 400.0,
            delay_ms: 0.0,
            easing: Easing::default(),
            instant: false,
        }
    }
}

impl AnimateOptions {
    /// Options that apply the target immediately.
    pub fn instant() -> Self {
        Self {
            duration_ms: 0.0,
            instant: true,
            ..Self::default()
        }
    }

    /// Set the duration.
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Set the delay.
    pub fn with_delay_ms(mut self, delay_ms: f64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Set the easing curve.
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}
