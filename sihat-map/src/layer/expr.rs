//! Data-driven numeric expressions and colour ramps.

use super::descriptor::DescriptorError;
use crate::geometry::Properties;
use crate::interaction::format::value_as_number;
use serde_json::{json, Value};

/// A number derived from feature properties.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericExpr {
    /// A single numeric property
    Field(String),
    /// Sum of properties, missing ones counting as zero
    Sum(Vec<String>),
    /// Quotient of two expressions; undefined when the denominator is zero
    Ratio {
        numerator: Box<NumericExpr>,
        denominator: Box<NumericExpr>,
    },
}

impl NumericExpr {
    pub fn field(name: &str) -> Self {
        NumericExpr::Field(name.to_string())
    }

    pub fn sum<S: AsRef<str>>(names: &[S]) -> Self {
        NumericExpr::Sum(names.iter().map(|n| n.as_ref().to_string()).collect())
    }

    pub fn ratio(numerator: NumericExpr, denominator: NumericExpr) -> Self {
        NumericExpr::Ratio {
            numerator: Box::new(numerator),
            denominator: Box::new(denominator),
        }
    }

    /// Evaluate against a property bag.
    pub fn evaluate(&self, properties: &Properties) -> Option<f64> {
        match self {
            NumericExpr::Field(name) => properties.get(name).and_then(value_as_number),
            NumericExpr::Sum(names) => Some(
                names
                    .iter()
                    .map(|n| properties.get(n).and_then(value_as_number).unwrap_or(0.0))
                    .sum(),
            ),
            NumericExpr::Ratio {
                numerator,
                denominator,
            } => {
                let d = denominator.evaluate(properties)?;
                if d == 0.0 {
                    return None;
                }
                Some(numerator.evaluate(properties)? / d)
            }
        }
    }

    /// Style-spec expression computing the same value on the renderer.
    pub fn to_style(&self) -> Value {
        let get = |name: &str| json!(["to-number", ["get", name], 0]);
        match self {
            NumericExpr::Field(name) => get(name.as_str()),
            NumericExpr::Sum(names) => {
                let mut expr = vec![json!("+")];
                expr.extend(names.iter().map(|n| get(n.as_str())));
                Value::Array(expr)
            }
            NumericExpr::Ratio {
                numerator,
                denominator,
            } => {
                let d = denominator.to_style();
                json!(["case", ["==", d.clone(), 0], 0, ["/", numerator.to_style(), d]])
            }
        }
    }

    pub(crate) fn validate(&self) -> Result<(), DescriptorError> {
        match self {
            NumericExpr::Field(name) if name.is_empty() => {
                Err(DescriptorError::InvalidExpression("empty field name".into()))
            }
            NumericExpr::Sum(names) if names.is_empty() || names.iter().any(String::is_empty) => {
                Err(DescriptorError::InvalidExpression("sum needs named fields".into()))
            }
            NumericExpr::Ratio {
                numerator,
                denominator,
            } => {
                numerator.validate()?;
                denominator.validate()
            }
            _ => Ok(()),
        }
    }
}

/// An sRGB colour with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn parse_hex(text: &str) -> Option<Self> {
        let hex = text.strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let byte = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let mut digits = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
                Some(Self {
                    r: digits.next()??,
                    g: digits.next()??,
                    b: digits.next()??,
                    a: 255,
                })
            }
            6 | 8 => Some(Self {
                r: byte(&hex[0..2])?,
                g: byte(&hex[2..4])?,
                b: byte(&hex[4..6])?,
                a: if hex.len() == 8 { byte(&hex[6..8])? } else { 255 },
            }),
            _ => None,
        }
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    fn lerp(self, other: Self, t: f64) -> Self {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

/// Validate a colour string for a descriptor.
pub(crate) fn check_color(text: &str) -> Result<Rgba, DescriptorError> {
    Rgba::parse_hex(text).ok_or_else(|| DescriptorError::InvalidColor(text.to_string()))
}

/// Linear interpolation between colour stops, clamped at both ends.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    stops: Vec<(f64, Rgba)>,
}

impl ColorRamp {
    /// Build a ramp from `(input, "#hex")` stops in strictly ascending order.
    pub fn new(stops: &[(f64, &str)]) -> Result<Self, DescriptorError> {
        if stops.is_empty() {
            return Err(DescriptorError::InvalidRamp("no stops".into()));
        }
        let mut parsed = Vec::with_capacity(stops.len());
        for &(input, color) in stops {
            if !input.is_finite() {
                return Err(DescriptorError::InvalidRamp(format!("non-finite stop {}", input)));
            }
            if let Some(&(previous, _)) = parsed.last() {
                if input <= previous {
                    return Err(DescriptorError::InvalidRamp(format!(
                        "stop {} not above {}",
                        input, previous
                    )));
                }
            }
            parsed.push((input, check_color(color)?));
        }
        Ok(Self { stops: parsed })
    }

    pub fn stops(&self) -> &[(f64, Rgba)] {
        &self.stops
    }

    /// Colour for `value`.
    pub fn color_at(&self, value: f64) -> Rgba {
        let (first, last) = (self.stops[0], self.stops[self.stops.len() - 1]);
        if value.is_nan() || value <= first.0 {
            return first.1;
        }
        if value >= last.0 {
            return last.1;
        }
        for pair in self.stops.windows(2) {
            let ((lo, lo_color), (hi, hi_color)) = (pair[0], pair[1]);
            if value <= hi {
                return lo_color.lerp(hi_color, (value - lo) / (hi - lo));
            }
        }
        last.1
    }

    /// `["interpolate", ["linear"], input, stop, colour, ...]`.
    pub fn to_style(&self, input: Value) -> Value {
        let mut expr = vec![json!("interpolate"), json!(["linear"]), input];
        for (stop, color) in &self.stops {
            expr.push(json!(stop));
            expr.push(json!(color.to_hex()));
        }
        Value::Array(expr)
    }
}
