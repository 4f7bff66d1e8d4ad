use std::sync::Arc;

use entity_sdk::fan::{FanEntity, SPEED_OFF};
use entity_sdk::meta::{DeviceId, EntityId, EntityMeta};
use schema_core::{
    cap::fan::{FanBinding, FanDirection, FanFeatures},
    spec::DeviceSpec,
    transport::{InMemoryTransport, StateMap, Transport},
};
use serde_json::json;
use uuid::Uuid;

fn fan_spec() -> DeviceSpec {
    DeviceSpec::from_value(json!({
        "type": "urn:spec-v2:device:fan:0000A005:acme-fan1:1",
        "description": "Fan",
        "services": [
            {
                "iid": 2,
                "type": "urn:spec-v2:service:fan:00007808:acme:1",
                "description": "Fan",
                "properties": [
                    {"iid": 1, "type": "urn:spec-v2:property:on:00000004:acme:1", "format": "bool"},
                    {"iid": 2, "type": "urn:spec-v2:property:fan-level:00000016:acme:1",
                     "format": "uint8",
                     "value-list": [
                         {"value": 1, "description": "Low"},
                         {"value": 2, "description": "Medium"},
                         {"value": 3, "description": "High"}
                     ]},
                    {"iid": 5, "type": "urn:spec-v2:property:horizontal-angle:00000019:acme:1",
                     "format": "uint16",
                     "value-list": [
                         {"value": 30, "description": "30"},
                         {"value": 60, "description": "60"},
                         {"value": 90, "description": "90"},
                         {"value": 120, "description": "120"}
                     ]},
                    {"iid": 6, "type": "urn:spec-v2:property:horizontal-swing:00000017:acme:1", "format": "bool"}
                ]
            }
        ]
    }))
    .expect("valid document")
}

fn airer_spec() -> DeviceSpec {
    DeviceSpec::from_value(json!({
        "type": "urn:spec-v2:device:airer:0000A00D:acme-a1:1",
        "description": "Airer",
        "services": [
            {
                "iid": 2,
                "type": "urn:spec-v2:service:airer:00007817:acme:1",
                "description": "Airer",
                "properties": [
                    {"iid": 1, "type": "urn:spec-v2:property:dryer:00000027:acme:1", "format": "bool"},
                    {"iid": 2, "type": "urn:spec-v2:property:drying-level:00000028:acme:1",
                     "format": "uint8",
                     "value-list": [
                         {"value": 0, "description": "None"},
                         {"value": 1, "description": "Low"},
                         {"value": 2, "description": "High"}
                     ]}
                ]
            }
        ]
    }))
    .expect("valid document")
}

fn fan_for(spec: &DeviceSpec, initial: StateMap) -> (FanEntity, Arc<InMemoryTransport>) {
    let srv = spec.get_service(&["fan", "airer"]).expect("primary service");
    let binding = FanBinding::resolve(spec, srv);
    let meta = EntityMeta {
        id: EntityId(Uuid::new_v4()),
        device_id: DeviceId(Uuid::new_v4()),
        name: "Test Fan".into(),
        unique_key: "test-fan-2".into(),
        icon: None,
    };
    let device = Arc::new(InMemoryTransport::new(initial));
    let transport: Arc<dyn Transport> = device.clone();
    (FanEntity::new(meta, binding, transport), device)
}

fn running_fan_state() -> StateMap {
    StateMap::from([
        ("fan.on".to_string(), json!(true)),
        ("fan.fan_level".to_string(), json!(2)),
        ("fan.horizontal_angle".to_string(), json!(60)),
        ("fan.horizontal_swing".to_string(), json!(false)),
    ])
}

#[tokio::test]
async fn speed_reads_off_while_not_running() {
    let mut state = running_fan_state();
    state.insert("fan.on".to_string(), json!(false));
    let (mut fan, device) = fan_for(&fan_spec(), state);
    fan.update().await;

    assert_eq!(fan.is_on(), Some(false));
    assert_eq!(fan.speed(), Some(SPEED_OFF));
    assert_eq!(fan.speed_list(), vec![SPEED_OFF, "Low", "Medium", "High"]);

    device.set_state("fan.on", json!(true));
    fan.update().await;
    assert_eq!(fan.speed(), Some("Medium"));
}

#[tokio::test]
async fn unlisted_level_reads_off() {
    let mut state = running_fan_state();
    state.insert("fan.fan_level".to_string(), json!(9));
    let (mut fan, _device) = fan_for(&fan_spec(), state);
    fan.update().await;

    assert_eq!(fan.is_on(), Some(true));
    assert_eq!(fan.speed(), Some(SPEED_OFF));
}

#[tokio::test]
async fn set_speed_is_exact_about_the_label() {
    let (mut fan, device) = fan_for(&fan_spec(), running_fan_state());
    fan.update().await;

    assert!(fan.set_speed("High").await);
    let last = device.writes().pop().unwrap();
    assert_eq!((last.full_name.as_str(), &last.value), ("fan.fan_level", &json!(3)));
    assert_eq!(fan.speed(), Some("High"));

    // speed labels match verbatim, unlike climate fan modes
    let before = device.write_count();
    assert!(!fan.set_speed("high").await);
    assert!(!fan.set_speed("Turbo").await);
    assert_eq!(device.write_count(), before);
}

#[tokio::test]
async fn turn_on_short_circuits_when_already_running() {
    let (mut fan, device) = fan_for(&fan_spec(), running_fan_state());
    fan.update().await;

    assert!(fan.turn_on().await);
    assert_eq!(device.write_count(), 0);

    assert!(fan.turn_off().await);
    assert!(fan.turn_on().await);
    let writes = device.writes();
    let names: Vec<&str> = writes.iter().map(|w| w.full_name.as_str()).collect();
    assert_eq!(names, vec!["fan.on", "fan.on"]);
}

#[tokio::test]
async fn turn_on_with_speed_lets_the_speed_decide() {
    let mut state = running_fan_state();
    state.insert("fan.on".to_string(), json!(false));
    let (mut fan, device) = fan_for(&fan_spec(), state);
    fan.update().await;

    assert!(fan.turn_on_with_speed(Some("High")).await);
    let pairs: Vec<(String, serde_json::Value)> =
        device.writes().into_iter().map(|w| (w.full_name, w.value)).collect();
    assert_eq!(
        pairs,
        vec![("fan.on".to_string(), json!(true)), ("fan.fan_level".to_string(), json!(3))]
    );

    // already on, so only the failing speed lookup counts
    let before = device.write_count();
    assert!(!fan.turn_on_with_speed(Some("Turbo")).await);
    assert_eq!(device.write_count(), before);

    assert!(fan.turn_on_with_speed(None).await);
    assert_eq!(device.write_count(), before);
}

#[tokio::test]
async fn direction_reads_the_angle_extremes() {
    let (mut fan, device) = fan_for(&fan_spec(), running_fan_state());
    fan.update().await;

    // 60 sits between the extremes
    assert_eq!(fan.current_direction(), None);

    device.set_state("fan.horizontal_angle", json!(30));
    fan.update().await;
    assert_eq!(fan.current_direction(), Some(FanDirection::Reverse));

    device.set_state("fan.horizontal_angle", json!(120));
    fan.update().await;
    assert_eq!(fan.current_direction(), Some(FanDirection::Forward));

    // out-of-list readings still compare against the extremes
    device.set_state("fan.horizontal_angle", json!(10));
    fan.update().await;
    assert_eq!(fan.current_direction(), Some(FanDirection::Reverse));

    device.remove_state("fan.horizontal_angle");
    fan.update().await;
    assert_eq!(fan.current_direction(), None);
}

#[tokio::test]
async fn set_direction_writes_the_extreme_angle() {
    let (mut fan, device) = fan_for(&fan_spec(), running_fan_state());
    fan.update().await;

    assert!(fan.set_direction(FanDirection::Reverse).await);
    let last = device.writes().pop().unwrap();
    assert_eq!((last.full_name.as_str(), &last.value), ("fan.horizontal_angle", &json!(30)));
    assert_eq!(fan.current_direction(), Some(FanDirection::Reverse));

    assert!(fan.set_direction(FanDirection::Forward).await);
    let last = device.writes().pop().unwrap();
    assert_eq!((last.full_name.as_str(), &last.value), ("fan.horizontal_angle", &json!(120)));
    assert_eq!(fan.current_direction(), Some(FanDirection::Forward));
}

#[tokio::test]
async fn oscillation_round_trip() {
    let (mut fan, device) = fan_for(&fan_spec(), running_fan_state());
    fan.update().await;

    assert_eq!(fan.oscillating(), Some(false));
    assert!(fan.oscillate(true).await);
    let last = device.writes().pop().unwrap();
    assert_eq!((last.full_name.as_str(), &last.value), ("fan.horizontal_swing", &json!(true)));
    assert_eq!(fan.oscillating(), Some(true));

    let expected = FanFeatures::SET_SPEED | FanFeatures::DIRECTION | FanFeatures::OSCILLATE;
    assert_eq!(fan.features(), expected);
}

#[tokio::test]
async fn airer_degrades_to_power_and_speed() {
    let initial = StateMap::from([
        ("airer.dryer".to_string(), json!(false)),
        ("airer.drying_level".to_string(), json!(0)),
    ]);
    let (mut airer, device) = fan_for(&airer_spec(), initial);
    airer.update().await;

    assert_eq!(airer.features(), FanFeatures::SET_SPEED);
    assert_eq!(airer.current_direction(), None);
    assert_eq!(airer.oscillating(), None);
    assert!(!airer.set_direction(FanDirection::Forward).await);
    assert!(!airer.oscillate(true).await);
    assert!(device.writes().is_empty());

    assert!(airer.turn_on().await);
    let last = device.writes().pop().unwrap();
    assert_eq!((last.full_name.as_str(), &last.value), ("airer.dryer", &json!(true)));
}

#[tokio::test]
async fn program_toggle_tracks_the_sentinel() {
    let initial = StateMap::from([
        ("airer.dryer".to_string(), json!(true)),
        ("airer.drying_level".to_string(), json!(0)),
    ]);
    let (mut airer, device) = fan_for(&airer_spec(), initial);
    airer.update().await;

    let toggles = airer.program_toggles();
    assert_eq!(toggles.len(), 1);
    let drying = &toggles[0];
    assert_eq!(drying.name(), "drying_level");

    // parked on the sentinel value
    assert!(!drying.is_on(&airer));
    assert_eq!(drying.speed(&airer), Some("None"));
    assert_eq!(drying.speed_list(), vec!["None", "Low", "High"]);

    // first non-sentinel entry starts the program
    assert!(drying.turn_on(&mut airer).await);
    let last = device.writes().pop().unwrap();
    assert_eq!((last.full_name.as_str(), &last.value), ("airer.drying_level", &json!(1)));
    assert!(drying.is_on(&airer));
    assert_eq!(drying.speed(&airer), Some("Low"));

    assert!(drying.set_speed(&mut airer, "high").await);
    let last = device.writes().pop().unwrap();
    assert_eq!((last.full_name.as_str(), &last.value), ("airer.drying_level", &json!(2)));

    assert!(drying.turn_off(&mut airer).await);
    let last = device.writes().pop().unwrap();
    assert_eq!((last.full_name.as_str(), &last.value), ("airer.drying_level", &json!(0)));
    assert!(!drying.is_on(&airer));
}

#[tokio::test]
async fn program_toggle_requires_a_running_parent() {
    let initial = StateMap::from([
        ("airer.dryer".to_string(), json!(false)),
        ("airer.drying_level".to_string(), json!(1)),
    ]);
    let (mut airer, _device) = fan_for(&airer_spec(), initial);
    airer.update().await;

    let toggles = airer.program_toggles();
    assert!(!toggles[0].is_on(&airer));
}
