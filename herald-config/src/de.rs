//! Lenient scalar deserializers.
//!
//! YAML turns `user_id: 1234` into a number and environment overrides always
//! arrive as strings, so scalar fields accept either spelling.
use serde::de::{Deserializer, Error};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Text(String),
}

pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Scalar::deserialize(d)? {
        Scalar::Bool(b) => b.to_string(),
        Scalar::Unsigned(n) => n.to_string(),
        Scalar::Signed(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
        Scalar::Text(s) => s,
    })
}

pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    struct Wrap(#[serde(deserialize_with = "string")] String);
    Ok(Option::<Wrap>::deserialize(d)?.map(|Wrap(s)| s))
}

pub fn boolean<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    match Scalar::deserialize(d)? {
        Scalar::Bool(b) => Ok(b),
        Scalar::Unsigned(n) => Ok(n != 0),
        Scalar::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            other => Err(D::Error::custom(format!("not a boolean: {other}"))),
        },
        _ => Err(D::Error::custom("expected a boolean")),
    }
}

pub fn opt_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    match Option::<Scalar>::deserialize(d)? {
        None => Ok(None),
        Some(Scalar::Unsigned(n)) => Ok(Some(n)),
        Some(Scalar::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Scalar::Text(s)) => s.trim().parse().map(Some).map_err(D::Error::custom),
        Some(_) => Err(D::Error::custom("expected a non-negative integer")),
    }
}

pub fn opt_u32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    opt_u64(d)?
        .map(|n| u32::try_from(n).map_err(D::Error::custom))
        .transpose()
}

pub fn opt_f32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f32>, D::Error> {
    match Option::<Scalar>::deserialize(d)? {
        None => Ok(None),
        Some(Scalar::Unsigned(n)) => Ok(Some(n as f32)),
        Some(Scalar::Signed(n)) => Ok(Some(n as f32)),
        Some(Scalar::Float(n)) => Ok(Some(n as f32)),
        Some(Scalar::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Scalar::Text(s)) => s.trim().parse().map(Some).map_err(D::Error::custom),
        Some(Scalar::Bool(_)) => Err(D::Error::custom("expected a number")),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "super::string")]
        id: String,
        #[serde(default, deserialize_with = "super::boolean")]
        flag: bool,
        #[serde(default, deserialize_with = "super::opt_u64")]
        ttl: Option<u64>,
        #[serde(default, deserialize_with = "super::opt_f32")]
        temp: Option<f32>,
        #[serde(default, deserialize_with = "super::opt_string")]
        secret: Option<String>,
    }

    #[test]
    fn numbers_and_strings_both_accepted() {
        let p: Probe =
            serde_json::from_value(json!({"id": 42, "flag": "yes", "ttl": "3600", "temp": 0.5}))
                .unwrap();
        assert_eq!(p.id, "42");
        assert!(p.flag);
        assert_eq!(p.ttl, Some(3600));
        assert_eq!(p.temp, Some(0.5));
        assert_eq!(p.secret, None);

        let p: Probe = serde_json::from_value(json!({"id": "abc", "ttl": ""})).unwrap();
        assert_eq!(p.id, "abc");
        assert!(!p.flag);
        assert_eq!(p.ttl, None);

        let p: Probe = serde_json::from_value(json!({"id": "a", "secret": 20240101})).unwrap();
        assert_eq!(p.secret.as_deref(), Some("20240101"));
    }

    #[test]
    fn garbage_boolean_is_rejected() {
        let r: Result<Probe, _> = serde_json::from_value(json!({"id": "a", "flag": "maybe"}));
        assert!(r.is_err());
    }
}
