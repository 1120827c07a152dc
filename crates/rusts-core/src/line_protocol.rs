//! InfluxDB line protocol encoding
//!
//! One point per line: `measurement[,tag=value...] field=value[,...] timestamp`.

use crate::types::{FieldValue, Point};
use std::fmt::Write;

/// Encodes a slice of points, newline separated.
pub fn encode_points(points: &[Point]) -> String {
    let mut out = String::with_capacity(points.len() * 96);
    for (i, point) in points.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        write_point(&mut out, point);
    }
    out
}

/// Encodes a single point without a trailing newline.
pub fn encode_point(point: &Point) -> String {
    let mut out = String::with_capacity(96);
    write_point(&mut out, point);
    out
}

fn write_point(out: &mut String, point: &Point) {
    out.push_str(&escape_measurement(&point.measurement));

    for tag in &point.tags {
        out.push(',');
        out.push_str(&escape_key(&tag.key));
        out.push('=');
        out.push_str(&escape_key(&tag.value));
    }

    out.push(' ');
    for (i, field) in point.fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape_key(&field.key));
        out.push('=');
        // Writing into a String never fails.
        let _ = match &field.value {
            FieldValue::Float(v) => write!(out, "{}", v),
            FieldValue::Integer(v) => write!(out, "{}i", v),
            FieldValue::UnsignedInteger(v) => write!(out, "{}u", v),
            FieldValue::String(v) => write!(out, "\"{}\"", escape_string_value(v)),
            FieldValue::Boolean(v) => write!(out, "{}", v),
        };
    }

    out.push(' ');
    let _ = write!(out, "{}", point.timestamp);
}

/// Measurements only need commas and spaces escaped
fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

/// Tag keys, tag values and field keys share the same escaping
fn escape_key(s: &str) -> String {
    s.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

fn escape_string_value(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_cpu_usage_point() {
        let point = Point::builder("cpu_usage")
            .timestamp(1609459200000000000)
            .tag("cpu", "cpu-total")
            .field("idle", 0.25)
            .field("system", 0.5)
            .field("user", 0.125)
            .build()
            .unwrap();

        assert_eq!(
            encode_point(&point),
            "cpu_usage,cpu=cpu-total idle=0.25,system=0.5,user=0.125 1609459200000000000"
        );
    }

    #[test]
    fn test_field_type_suffixes() {
        let point = Point::builder("m")
            .timestamp(1)
            .field("f", 1.5)
            .field("i", -3_i64)
            .field("u", 7_u64)
            .field("s", "say \"hi\"")
            .field("b", false)
            .build()
            .unwrap();

        assert_eq!(
            encode_point(&point),
            "m f=1.5,i=-3i,u=7u,s=\"say \\\"hi\\\"\",b=false 1"
        );
    }

    #[test]
    fn test_escaping() {
        let point = Point::builder("disk usage")
            .timestamp(5)
            .tag("os version", "Windows 11,pro")
            .field("a=b", 1_i64)
            .build()
            .unwrap();

        assert_eq!(
            encode_point(&point),
            "disk\\ usage,os\\ version=Windows\\ 11\\,pro a\\=b=1i 5"
        );
    }

    #[test]
    fn test_encode_points_joins_lines() {
        let points: Vec<Point> = (0..3)
            .map(|ts| Point::builder("m").timestamp(ts).field("v", 1_i64).build().unwrap())
            .collect();

        let body = encode_points(&points);
        assert_eq!(body.lines().count(), 3);
        assert!(!body.ends_with('\n'));
        assert_eq!(encode_points(&[]), "");
    }
}
