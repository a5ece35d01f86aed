// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Converter registry and scalar coercion integration tests

use castfit::{
    Annotation, BoxError, CastError, Caster, Converters, FieldTableBuilder, FieldValues,
    Structure, TypeDescriptor, TypeKey, Value,
};
use chrono::{TimeZone, Utc};
use serde_json::json;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
struct LatLon {
    lat: f64,
    lon: f64,
}

castfit::scalar_type!(LatLon);

fn parse_latlon(text: String) -> Result<LatLon, BoxError> {
    let (lat, lon) = text
        .split_once(',')
        .ok_or_else(|| format!("expected `lat,lon`, got {:?}", text))?;
    Ok(LatLon {
        lat: lat.trim().parse()?,
        lon: lon.trim().parse()?,
    })
}

#[derive(Debug, Clone)]
struct Place {
    name: String,
    location: LatLon,
}

impl Structure for Place {
    fn declare(fields: FieldTableBuilder) -> FieldTableBuilder {
        fields.field::<String>("name").field::<LatLon>("location")
    }

    fn build(values: &mut FieldValues) -> Result<Self, CastError> {
        Ok(Self {
            name: values.take("name")?,
            location: values.take("location")?,
        })
    }
}

castfit::structure_type!(Place);

#[test]
fn test_scalar_coercions() {
    assert_eq!(castfit::to_type::<i64>("4").unwrap(), 4);
    assert_eq!(castfit::to_type::<f64>("3.2").unwrap(), 3.2);
    assert_eq!(castfit::to_type::<i64>("2.5").unwrap(), 2);
    assert_eq!(castfit::to_type::<i64>(-2.5).unwrap(), -2);
    assert!(castfit::to_type::<bool>("TRUE").unwrap());
    assert_eq!(castfit::to_type::<String>(3.0).unwrap(), "3.0");
    assert_eq!(
        castfit::to_type::<castfit::Bytes>("hi").unwrap().as_slice(),
        b"hi"
    );
}

#[test]
fn test_datetime_inputs() {
    let noon = Utc.with_ymd_and_hms(2023, 12, 12, 12, 0, 0).unwrap();
    type Dt = chrono::DateTime<Utc>;

    assert_eq!(castfit::to_type::<Dt>("2023-12-12T12:00:00").unwrap(), noon);
    assert_eq!(castfit::to_type::<Dt>(json!([2023, 12, 12, 12])).unwrap(), noon);
    assert_eq!(
        castfit::to_type::<Dt>(json!({"year": 2023, "month": 12, "day": 12, "hour": 12}))
            .unwrap(),
        noon
    );
    assert_eq!(
        castfit::to_type::<Dt>(1745865691.213537).unwrap(),
        Utc.with_ymd_and_hms(2025, 4, 28, 18, 41, 31).unwrap()
            + chrono::Duration::microseconds(213_537)
    );

    assert!(matches!(
        castfit::to_type::<Dt>(Value::Null),
        Err(CastError::NoConverter { .. })
    ));
    assert!(matches!(
        castfit::to_type::<Dt>("12/12/2023 12:00:00"),
        Err(CastError::TypeMismatch { .. })
    ));
}

#[test]
fn test_custom_converter_in_structure() {
    let converters = Converters::new();
    converters.casts(parse_latlon);
    let caster = Caster::with_converters(&converters);

    let place: Place = caster
        .castfit(json!({"name": "NYC", "location": "40.7, -74.0"}))
        .unwrap();
    assert_eq!(place.name, "NYC");
    assert_eq!(
        place.location,
        LatLon {
            lat: 40.7,
            lon: -74.0
        }
    );

    let err = caster
        .castfit::<Place>(json!({"name": "X", "location": "nowhere"}))
        .unwrap_err();
    assert_eq!(err.path().unwrap().to_string(), "location");
    let cause = std::error::Error::source(&err).unwrap().to_string();
    assert!(cause.contains("lat,lon"));
}

#[test]
fn test_registered_converter_beats_builtin() {
    let converters = Converters::new();
    let caster = Caster::with_converters(&converters);
    assert_eq!(caster.to_type::<i64>("10").unwrap(), 10);

    converters.casts(|s: String| i64::from_str_radix(s.trim_start_matches("0x"), 16));
    assert_eq!(caster.to_type::<i64>("0x10").unwrap(), 16);
    assert_eq!(caster.to_type::<i64>("10").unwrap(), 16);
    // float -> int is still built in.
    assert_eq!(caster.to_type::<i64>(7.9).unwrap(), 7);
}

#[test]
fn test_resolution_is_stable_until_reregistered() {
    let converters = Converters::new();
    let caster = Caster::with_converters(&converters);
    converters.register(TypeKey::str(), TypeKey::float(), |_| Ok(Value::Float(1.0)));

    for _ in 0..3 {
        assert_eq!(caster.to_type::<f64>("9").unwrap(), 1.0);
    }

    converters.register(TypeKey::str(), TypeKey::float(), |_| Ok(Value::Float(2.0)));
    assert_eq!(caster.to_type::<f64>("9").unwrap(), 2.0);
    assert_eq!(converters.len(), 1);
}

#[test]
fn test_container_targets_use_registered_converters() {
    let converters = Converters::new();
    let caster = Caster::with_converters(&converters);
    assert!(matches!(
        caster.to_type::<Vec<i64>>("1,2"),
        Err(CastError::NoConverter { .. })
    ));

    converters.casts(|s: String| {
        s.split(',')
            .map(|part| part.trim().parse::<i64>())
            .collect::<Result<Vec<i64>, _>>()
    });
    converters.casts(|s: String| -> Result<HashMap<String, i64>, BoxError> {
        s.split(',')
            .map(|pair| -> Result<(String, i64), BoxError> {
                let (key, value) = pair.split_once('=').ok_or("expected key=value")?;
                Ok((key.trim().to_string(), value.trim().parse()?))
            })
            .collect()
    });

    assert_eq!(caster.to_type::<Vec<i64>>("1, 2").unwrap(), vec![1, 2]);
    assert_eq!(
        caster.to_type::<HashMap<String, i64>>("a=1,b=2").unwrap(),
        HashMap::from([("a".to_string(), 1), ("b".to_string(), 2)])
    );
    // List input still goes element by element.
    assert_eq!(caster.to_type::<Vec<i64>>(json!(["3", 4])).unwrap(), vec![3, 4]);
}

#[test]
fn test_set_targets() {
    let floats: Annotation = "set[float]".parse().unwrap();
    assert_eq!(
        castfit::cast(json!([1, "2", 3.0]), &floats).unwrap(),
        Value::set([1.0, 2.0, 3.0])
    );
    assert_eq!(
        castfit::to_type::<BTreeSet<i64>>(json!(["3", 1, "1", 2.0])).unwrap(),
        BTreeSet::from([1, 2, 3])
    );
    assert_eq!(
        castfit::to_type::<HashSet<String>>(json!(["a", "b", "a"])).unwrap(),
        HashSet::from(["a".to_string(), "b".to_string()])
    );
    assert!(castfit::is_type(&Value::set([1.0]), &floats));
    assert!(!castfit::is_type(&Value::list([1.0]), &floats));
}

#[test]
fn test_target_aware_converter() {
    let converters = Converters::new();
    converters.register_with(TypeKey::int(), TypeKey::str(), |value, target: &TypeDescriptor| {
        Ok(Value::from(format!("{}<{}>", target.name, value)))
    });
    let caster = Caster::with_converters(&converters);
    assert_eq!(caster.to_type::<String>(5i64).unwrap(), "str<5>");
}

#[test]
fn test_union_declaration_order() {
    let float_or_int = Annotation::union([Annotation::float(), Annotation::int()]);
    assert_eq!(castfit::cast(42i64, &float_or_int).unwrap(), Value::Float(42.0));

    let int_or_float = Annotation::union([Annotation::int(), Annotation::float()]);
    assert_eq!(castfit::cast("2.5", &int_or_float).unwrap(), Value::Int(2));

    let maybe: Annotation = "optional[int | str]".parse().unwrap();
    assert_eq!(castfit::cast(Value::Null, &maybe).unwrap(), Value::Null);
    assert!(castfit::cast(json!({"k": 1}), &maybe).is_err());
}

#[test]
fn test_normalize_idempotence() {
    let ann: Annotation = "dict[str, list[optional[float]]]".parse().unwrap();
    let first = castfit::normalize(&ann);
    let second = castfit::normalize(&ann.clone());
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.kind_name(), "mapping");
    assert_eq!(first.args()[0].args()[0].name, "optional[float]");
}

#[test]
fn test_is_type_does_not_coerce() {
    let ints: Annotation = "list[int]".parse().unwrap();
    assert!(castfit::is_type(&Value::list([1i64, 2]), &ints));
    assert!(!castfit::is_type(&Value::list(["1", "2"]), &ints));
    assert!(castfit::is_type(
        &Value::from(LatLon { lat: 0.0, lon: 0.0 }),
        &Annotation::of::<LatLon>()
    ));
}
