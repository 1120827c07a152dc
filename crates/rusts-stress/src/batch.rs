//! Synthetic batch generation.

use crate::errors::Result;
use rand::Rng;
use rusts_core::{now_nanos, Point, Tag, Timestamp};

/// Measurement written by every generated point.
pub const MEASUREMENT: &str = "cpu_usage";

/// Field keys written by every generated point.
pub const FIELDS: [&str; 3] = ["idle", "system", "user"];

/// An ordered group of points written in one call.
#[derive(Debug, Clone)]
pub struct Batch {
    /// Position in the producer's output, starting at 0
    pub sequence: u64,
    pub database: String,
    pub points: Vec<Point>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Builds batches of `cpu_usage` points with random field values.
///
/// Values come from the thread-local RNG and are not reproducible.
#[derive(Debug, Clone)]
pub struct BatchFactory {
    database: String,
    tags: Vec<Tag>,
}

impl BatchFactory {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            tags: vec![Tag::new("cpu", "cpu-total")],
        }
    }

    /// Creates a batch of exactly `point_count` points, each stamped with the
    /// time it was generated.
    pub fn create(&self, sequence: u64, point_count: usize) -> Result<Batch> {
        let mut rng = rand::thread_rng();
        let mut points = Vec::with_capacity(point_count);
        let mut last: Timestamp = Timestamp::MIN;

        for _ in 0..point_count {
            // Wall clock can step backwards; keep timestamps non-decreasing.
            let timestamp = now_nanos().max(last);
            last = timestamp;

            let mut builder = Point::builder(MEASUREMENT)
                .timestamp(timestamp)
                .tags(&self.tags);
            for key in FIELDS {
                builder = builder.field(key, rng.gen::<f64>());
            }
            points.push(builder.build()?);
        }

        Ok(Batch {
            sequence,
            database: self.database.clone(),
            points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusts_core::FieldValue;

    #[test]
    fn test_create_exact_point_count() {
        let factory = BatchFactory::new("stress");
        for count in [0, 1, 20, 500] {
            let batch = factory.create(3, count).unwrap();
            assert_eq!(batch.len(), count);
            assert_eq!(batch.sequence, 3);
            assert_eq!(batch.database, "stress");
        }
    }

    #[test]
    fn test_point_shape() {
        let batch = BatchFactory::new("stress").create(0, 10).unwrap();

        for point in &batch.points {
            assert_eq!(point.measurement, MEASUREMENT);
            assert_eq!(point.tags.len(), 1);
            assert_eq!(point.get_tag("cpu"), Some("cpu-total"));
            assert_eq!(point.fields.len(), FIELDS.len());
            for key in FIELDS {
                assert!(matches!(point.get_field(key), Some(FieldValue::Float(_))));
            }
        }
    }

    #[test]
    fn test_field_values_in_unit_interval() {
        let batch = BatchFactory::new("stress").create(0, 2000).unwrap();

        for point in &batch.points {
            for field in &point.fields {
                let v = field.value.as_f64().unwrap();
                assert!((0.0..1.0).contains(&v), "{} = {} out of range", field.key, v);
            }
        }
    }

    #[test]
    fn test_timestamps_non_decreasing() {
        let before = now_nanos();
        let batch = BatchFactory::new("stress").create(0, 1000).unwrap();

        assert!(batch.points[0].timestamp >= before);
        for pair in batch.points.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn test_values_are_not_constant() {
        let batch = BatchFactory::new("stress").create(0, 100).unwrap();
        let first = batch.points[0].get_field("idle").cloned();
        assert!(batch
            .points
            .iter()
            .any(|p| p.get_field("idle").cloned() != first));
    }
}
