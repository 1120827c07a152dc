//! Point model for RusTs writes

use crate::error::{CoreError, Result};
use std::cmp::Ordering;

/// Nanosecond-precision Unix epoch timestamp
pub type Timestamp = i64;

/// Current wall-clock time as a [`Timestamp`].
///
/// Falls back to 0 if the clock is outside the range representable in
/// nanoseconds (years before 1677 or after 2262).
pub fn now_nanos() -> Timestamp {
    chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0)
}

/// A tag is a key-value pair used for series identification
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(CoreError::EmptyTagKey);
        }
        Ok(())
    }
}

impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tag {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.key.cmp(&other.key) {
            Ordering::Equal => self.value.cmp(&other.value),
            other => other,
        }
    }
}

/// Field value types accepted by the write endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    UnsignedInteger(u64),
    String(String),
    Boolean(bool),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::UnsignedInteger(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::UnsignedInteger(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

/// A named value in a data point
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: FieldValue,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Rejects empty keys and floats the line protocol cannot carry.
    pub fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(CoreError::EmptyFieldKey);
        }
        if let FieldValue::Float(v) = self.value {
            if !v.is_finite() {
                return Err(CoreError::NonFiniteField(self.key.clone()));
            }
        }
        Ok(())
    }
}

/// A single measurement at a specific time
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// The measurement name (like a table name)
    pub measurement: String,
    /// Timestamp in nanoseconds since Unix epoch
    pub timestamp: Timestamp,
    /// Tags, sorted by key
    pub tags: Vec<Tag>,
    pub fields: Vec<Field>,
}

impl Point {
    pub fn builder(measurement: impl Into<String>) -> PointBuilder {
        PointBuilder::new(measurement)
    }

    pub fn validate(&self) -> Result<()> {
        if self.measurement.is_empty() {
            return Err(CoreError::EmptyMeasurement);
        }
        if self.fields.is_empty() {
            return Err(CoreError::NoFields);
        }
        for tag in &self.tags {
            tag.validate()?;
        }
        for field in &self.fields {
            field.validate()?;
        }
        Ok(())
    }

    pub fn get_tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }

    pub fn get_field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.key == key).map(|f| &f.value)
    }
}

/// Builder for constructing validated Points
pub struct PointBuilder {
    measurement: String,
    timestamp: Option<Timestamp>,
    tags: Vec<Tag>,
    fields: Vec<Field>,
}

impl PointBuilder {
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            timestamp: None,
            tags: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn timestamp(mut self, ts: Timestamp) -> Self {
        self.timestamp = Some(ts);
        self
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(Tag::new(key, value));
        self
    }

    /// Adds every tag in `tags`, cloning them.
    pub fn tags<'a>(mut self, tags: impl IntoIterator<Item = &'a Tag>) -> Self {
        self.tags.extend(tags.into_iter().cloned());
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.push(Field::new(key, value));
        self
    }

    /// Builds the point, stamping it with the current time if no timestamp was set.
    pub fn build(mut self) -> Result<Point> {
        self.tags.sort();

        let point = Point {
            measurement: self.measurement,
            timestamp: self.timestamp.unwrap_or_else(now_nanos),
            tags: self.tags,
            fields: self.fields,
        };

        point.validate()?;
        Ok(point)
    }
}
