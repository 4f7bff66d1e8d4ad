use schema_core::{
    descriptor::PropertyFormat,
    spec::{DeviceSpec, SpecError, name_by_type},
};
use serde_json::json;

fn doc_with_services(services: serde_json::Value) -> DeviceSpec {
    DeviceSpec::from_value(json!({
        "type": "urn:spec-v2:device:thermostat:0000A031:acme-t1:1",
        "description": "Thermostat",
        "services": services,
    }))
    .expect("valid document")
}

#[test]
fn parses_document_shape() {
    let spec = doc_with_services(json!([
        {
            "iid": 2,
            "type": "urn:spec-v2:service:air-conditioner:00007811:acme-t1:1",
            "description": "Air Conditioner",
            "properties": [
                {
                    "iid": 1,
                    "type": "urn:spec-v2:property:on:00000004:acme-t1:1",
                    "description": "Power",
                    "format": "bool",
                    "access": ["read", "write", "notify"]
                },
                {
                    "iid": 3,
                    "type": "urn:spec-v2:property:target-temperature:0000000F:acme-t1:1",
                    "description": "Target Temperature",
                    "format": "float",
                    "access": ["read", "write"],
                    "unit": "celsius",
                    "value-range": [16, 31, 0.5]
                }
            ],
            "actions": [
                {
                    "iid": 1,
                    "type": "urn:spec-v2:action:toggle:00002811:acme-t1:1",
                    "description": "Toggle"
                }
            ]
        }
    ]));

    assert_eq!(spec.name, "thermostat");
    assert_eq!(spec.description, "Thermostat");

    let srv = spec.get_service(&["air_conditioner"]).expect("service");
    assert_eq!(srv.iid, 2);
    assert_eq!(srv.description, "Air Conditioner");

    let on = srv.property(&["on"]).expect("on property");
    assert_eq!(on.full_name, "air_conditioner.on");
    assert!(on.is_bool());

    let target = srv.property(&["target_temperature"]).expect("target property");
    assert_eq!(target.format, PropertyFormat::Float);
    assert_eq!(target.unit.as_deref(), Some("celsius"));
    assert_eq!(target.range_min(), Some(16.0));
    assert_eq!(target.range_max(), Some(31.0));
    assert_eq!(target.range_step(), Some(0.5));

    let toggle = srv.action(&["toggle"]).expect("action");
    assert_eq!((toggle.siid, toggle.iid), (2, 1));

    let map = srv.mapping();
    assert_eq!(map["air_conditioner.on"], on.address());
    assert_eq!(map.len(), 2);
}

#[test]
fn name_by_type_uses_fourth_urn_segment() {
    assert_eq!(
        name_by_type("urn:spec-v2:property:target-temperature:0000000F:acme:1"),
        "target_temperature"
    );
    assert_eq!(
        name_by_type("urn:spec-v2:service:ptc-bath-heater:00007823:acme:1"),
        "ptc_bath_heater"
    );
    // runs of separators collapse to one underscore
    assert_eq!(name_by_type("urn:spec-v2:property:no--spin:1:1:1"), "no_spin");
    // not a urn at all: the whole string is sanitized
    assert_eq!(name_by_type("fan level"), "fan_level");
}

#[test]
fn vendor_formats_collapse_to_four() {
    for f in ["uint8", "uint16", "uint32", "int8", "int16", "int32", "int64"] {
        assert_eq!(PropertyFormat::parse(f), PropertyFormat::Int, "{f}");
    }
    assert_eq!(PropertyFormat::parse("bool"), PropertyFormat::Bool);
    assert_eq!(PropertyFormat::parse("float"), PropertyFormat::Float);
    assert_eq!(PropertyFormat::parse("string"), PropertyFormat::Str);
    assert_eq!(PropertyFormat::parse("hex"), PropertyFormat::Str);
}

#[test]
fn get_service_prefers_candidate_order_over_declaration() {
    let spec = doc_with_services(json!([
        {"iid": 2, "type": "urn:spec-v2:service:heater:00007A01:acme:1", "description": "Heater"},
        {"iid": 3, "type": "urn:spec-v2:service:air-conditioner:00007811:acme:1", "description": "AC"},
    ]));

    let srv = spec.get_service(&["air_conditioner", "heater"]).expect("service");
    assert_eq!(srv.name, "air_conditioner");

    let srv = spec.get_service(&["fan", "heater"]).expect("service");
    assert_eq!(srv.name, "heater");

    assert!(spec.get_service(&["fan"]).is_none());
}

#[test]
fn get_services_keeps_declaration_order() {
    let spec = doc_with_services(json!([
        {"iid": 2, "type": "urn:spec-v2:service:fan:00007808:acme:1", "description": "Fan 1"},
        {"iid": 3, "type": "urn:spec-v2:service:environment:0000780A:acme:1", "description": "Env"},
        {"iid": 4, "type": "urn:spec-v2:service:fan:00007808:acme:1", "description": "Fan 2"},
    ]));

    let found: Vec<i32> = spec.get_services(&["airer", "fan"]).iter().map(|s| s.iid).collect();
    assert_eq!(found, vec![2, 4]);
}

#[test]
fn services_mapping_lets_later_declaration_win() {
    let spec = doc_with_services(json!([
        {
            "iid": 2,
            "type": "urn:spec-v2:service:fan-control:00007809:acme:1",
            "description": "Fan A",
            "properties": [
                {"iid": 1, "type": "urn:spec-v2:property:on:00000004:acme:1", "format": "bool"}
            ]
        },
        {
            "iid": 7,
            "type": "urn:spec-v2:service:fan-control:00007809:acme:1",
            "description": "Fan B",
            "properties": [
                {"iid": 5, "type": "urn:spec-v2:property:on:00000004:acme:1", "format": "bool"}
            ]
        }
    ]));

    let map = spec.services_mapping(&["fan_control"]);
    assert_eq!(map.len(), 1);
    let addr = map["fan_control.on"];
    assert_eq!((addr.siid, addr.piid), (7, 5));
}

#[test]
fn rejects_bad_documents() {
    let err = DeviceSpec::from_value(json!({
        "type": "urn:spec-v2:device:fan:0000A005:acme:1",
        "description": "Fan",
        "services": []
    }))
    .unwrap_err();
    assert!(matches!(err, SpecError::NoServices));

    let err = DeviceSpec::parse("{not json").unwrap_err();
    assert!(matches!(err, SpecError::Document(_)));
}
