use mongodb::bson::oid::ObjectId;
use serde::Deserialize;

pub mod accounts;
pub mod products;
pub mod reports;

#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub limite: Option<String>,
}

/// Unparseable ids resolve to the all-zero id, so they miss instead of failing.
pub(crate) fn object_id(raw: &str) -> ObjectId {
    ObjectId::parse_str(raw).unwrap_or_else(|_| ObjectId::from_bytes([0; 12]))
}

/// `default` when the parameter is absent, `0` when it is not a number.
pub(crate) fn parse_limit(raw: Option<&str>, default: i64) -> i64 {
    match raw {
        None => default,
        Some(value) => value.parse().unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_ids_become_zero() {
        assert_eq!(object_id("nope").to_hex(), "000000000000000000000000");
        assert_eq!(object_id("65f0c0ffee0000000000abcd").to_hex(), "65f0c0ffee0000000000abcd");
    }

    #[test]
    fn limits_default_only_when_absent() {
        assert_eq!(parse_limit(None, 5), 5);
        assert_eq!(parse_limit(Some("12"), 5), 12);
        assert_eq!(parse_limit(Some("abc"), 5), 0);
        assert_eq!(parse_limit(Some(""), 5), 0);
        assert_eq!(parse_limit(Some("-3"), 5), -3);
    }
}
