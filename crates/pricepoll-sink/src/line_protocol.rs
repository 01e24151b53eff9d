//! InfluxDB line protocol encoding.
//!
//! Format: `measurement[,tag=value...] field=value[,field=value...] timestamp`

use std::fmt::Write;

use crate::{DataPoint, FieldValue};

const MEASUREMENT_SPECIAL: &[char] = &[',', ' '];
const KEY_SPECIAL: &[char] = &[',', '=', ' '];

fn push_escaped(out: &mut String, value: &str, special: &[char]) {
    for c in value.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}

fn push_field_value(out: &mut String, value: FieldValue) {
    // writing to a String cannot fail
    let _ = match value {
        FieldValue::Float(v) => write!(out, "{v}"),
        FieldValue::Integer(v) => write!(out, "{v}i"),
    };
}

/// Encodes one point as a single line, without the trailing newline.
///
/// Tags are written in key order. A point without fields produces a line the
/// server will reject, so callers only encode points built with at least one
/// field.
#[must_use]
pub fn encode_point(point: &DataPoint) -> String {
    let mut out = String::with_capacity(128);
    push_escaped(&mut out, point.measurement(), MEASUREMENT_SPECIAL);

    for (key, value) in point.tags() {
        out.push(',');
        push_escaped(&mut out, key, KEY_SPECIAL);
        out.push('=');
        push_escaped(&mut out, value, KEY_SPECIAL);
    }

    for (i, (key, value)) in point.fields().iter().enumerate() {
        out.push(if i == 0 { ' ' } else { ',' });
        push_escaped(&mut out, key, KEY_SPECIAL);
        out.push('=');
        push_field_value(&mut out, *value);
    }

    let _ = write!(out, " {}", point.timestamp_ns());
    out
}

/// Encodes a batch of points, one line each.
#[must_use]
pub fn encode_batch(points: &[DataPoint]) -> String {
    let mut body = String::with_capacity(points.len() * 128);
    for point in points {
        body.push_str(&encode_point(point));
        body.push('\n');
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::{MEASUREMENT, keys};

    #[test]
    fn test_encode_point() {
        let point = DataPoint::new(MEASUREMENT, 1_717_405_200_000_000_000)
            .tag(keys::TICKER, "VOD.L")
            .tag(keys::EXCHANGE, "LSE")
            .tag(keys::CURRENCY, "GBp")
            .field(keys::CLOSE, FieldValue::Float(101.5))
            .field(keys::VOLUME, FieldValue::Integer(1000));

        assert_eq!(
            encode_point(&point),
            "lse_prices,currency=GBp,exchange=LSE,ticker=VOD.L close=101.5,volume=1000i 1717405200000000000"
        );
    }

    #[test]
    fn test_whole_float_has_no_integer_suffix() {
        let point = DataPoint::new("m", 1).field("close", FieldValue::Float(100.0));
        assert_eq!(encode_point(&point), "m close=100 1");
    }

    #[test]
    fn test_escaping() {
        let point = DataPoint::new("my prices,v2", 7)
            .tag("tick er", "A=B,C")
            .field("adj close", FieldValue::Integer(-3));

        assert_eq!(
            encode_point(&point),
            r"my\ prices\,v2,tick\ er=A\=B\,C adj\ close=-3i 7"
        );
    }

    #[test]
    fn test_encode_batch() {
        let points = vec![
            DataPoint::new("m", 1).field("a", FieldValue::Integer(1)),
            DataPoint::new("m", 2).field("a", FieldValue::Integer(2)),
        ];
        assert_eq!(encode_batch(&points), "m a=1i 1\nm a=2i 2\n");
        assert_eq!(encode_batch(&[]), "");
    }
}
