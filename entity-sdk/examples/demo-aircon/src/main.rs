use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use entity_sdk::meta::{DeviceId, DeviceMeta};
use entity_sdk::registry::EntityRegistry;
use entity_sdk::setup;
use schema_core::cap::climate::{HvacMode, SwingMode};
use schema_core::spec::DeviceSpec;
use schema_core::transport::{InMemoryTransport, StateMap, Transport};
use serde_json::json;
use tokio::time::{sleep, Duration};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Schema document for a made-up split unit: a primary air-conditioner
/// service plus fan-control and environment siblings.
const SPEC_JSON: &str = r#"{
  "type": "urn:spec-v2:device:air-conditioner:0000A004:demo-ac1:1",
  "description": "Demo Air Conditioner",
  "services": [
    {
      "iid": 2,
      "type": "urn:spec-v2:service:air-conditioner:00007811:demo-ac1:1",
      "description": "Air Conditioner",
      "properties": [
        {
          "iid": 1,
          "type": "urn:spec-v2:property:on:00000004:demo-ac1:1",
          "description": "Switch Status",
          "format": "bool",
          "access": ["read", "write", "notify"]
        },
        {
          "iid": 2,
          "type": "urn:spec-v2:property:mode:00000008:demo-ac1:1",
          "description": "Mode",
          "format": "uint8",
          "access": ["read", "write", "notify"],
          "value-list": [
            {"value": 0, "description": "Cool"},
            {"value": 1, "description": "Heat"},
            {"value": 2, "description": "Auto"},
            {"value": 3, "description": "Dry"},
            {"value": 4, "description": "Fan"},
            {"value": 5, "description": "Sleep"}
          ]
        },
        {
          "iid": 4,
          "type": "urn:spec-v2:property:target-temperature:0000000F:demo-ac1:1",
          "description": "Target Temperature",
          "format": "float",
          "access": ["read", "write", "notify"],
          "unit": "celsius",
          "value-range": [16, 31, 0.5]
        }
      ]
    },
    {
      "iid": 3,
      "type": "urn:spec-v2:service:fan-control:00007809:demo-ac1:1",
      "description": "Fan Control",
      "properties": [
        {
          "iid": 1,
          "type": "urn:spec-v2:property:on:00000004:demo-ac1:1",
          "description": "Switch Status",
          "format": "bool",
          "access": ["read", "write"]
        },
        {
          "iid": 2,
          "type": "urn:spec-v2:property:fan-level:00000016:demo-ac1:1",
          "description": "Fan Level",
          "format": "uint8",
          "access": ["read", "write", "notify"],
          "value-list": [
            {"value": 0, "description": "Auto"},
            {"value": 1, "description": "Low"},
            {"value": 2, "description": "Medium"},
            {"value": 3, "description": "High"}
          ]
        },
        {
          "iid": 3,
          "type": "urn:spec-v2:property:horizontal-swing:00000017:demo-ac1:1",
          "description": "Horizontal Swing",
          "format": "bool",
          "access": ["read", "write"]
        },
        {
          "iid": 4,
          "type": "urn:spec-v2:property:vertical-swing:00000018:demo-ac1:1",
          "description": "Vertical Swing",
          "format": "bool",
          "access": ["read", "write"]
        }
      ]
    },
    {
      "iid": 4,
      "type": "urn:spec-v2:service:environment:0000780A:demo-ac1:1",
      "description": "Environment",
      "properties": [
        {
          "iid": 1,
          "type": "urn:spec-v2:property:temperature:00000020:demo-ac1:1",
          "description": "Temperature",
          "format": "float",
          "access": ["read", "notify"],
          "unit": "celsius",
          "value-range": [-30, 100, 0.1]
        },
        {
          "iid": 7,
          "type": "urn:spec-v2:property:relative-humidity:0000000C:demo-ac1:1",
          "description": "Relative Humidity",
          "format": "uint8",
          "access": ["read", "notify"],
          "unit": "percentage",
          "value-range": [0, 100, 1]
        }
      ]
    }
  ]
}"#;

fn initial_state() -> StateMap {
    StateMap::from([
        ("air_conditioner.on".to_string(), json!(false)),
        ("air_conditioner.mode".to_string(), json!(2)),
        ("air_conditioner.target_temperature".to_string(), json!(24.0)),
        ("fan_control.on".to_string(), json!(false)),
        ("fan_control.fan_level".to_string(), json!(1)),
        ("fan_control.horizontal_swing".to_string(), json!(false)),
        ("fan_control.vertical_swing".to_string(), json!(false)),
        ("environment.temperature".to_string(), json!(23.5)),
        ("environment.relative_humidity".to_string(), json!(52)),
    ])
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).without_time().init();

    let spec = DeviceSpec::parse(SPEC_JSON).context("parse device schema")?;
    tracing::info!(device = %spec.name, services = spec.services.len(), "loaded schema");

    let device_transport = Arc::new(InMemoryTransport::new(initial_state()));
    let transport: Arc<dyn Transport> = device_transport.clone();

    let device = DeviceMeta {
        id: DeviceId(Uuid::new_v4()),
        name: "Living Room AC".into(),
        manufacturer: Some("Example Co".into()),
        model: Some("demo.aircon.v1".into()),
        sw_version: Some(env!("CARGO_PKG_VERSION").into()),
        metadata: BTreeMap::new(),
    };

    let mut registry = EntityRegistry::new();
    let mut climate_ids = Vec::new();
    for entity in setup::climate_entities(&device, &spec, &transport) {
        tracing::info!(
            entity = %entity.meta().name,
            features = ?entity.features(),
            modes = ?entity.hvac_modes(),
            "adding climate entity"
        );
        climate_ids.push(registry.add_climate(entity)?);
    }
    for entity in setup::fan_entities(&device, &spec, &transport) {
        tracing::info!(entity = %entity.meta().name, "adding fan entity");
        registry.add_fan(entity)?;
    }

    let id = *climate_ids.first().context("schema produced no climate entity")?;
    registry.update_all().await;

    let ac = registry.climate_mut(id).context("climate entity missing")?;
    tracing::info!(
        is_on = ?ac.is_on(),
        mode = ?ac.hvac_mode(),
        ambient = ?ac.current_temperature(),
        humidity = ?ac.current_humidity(),
        "initial snapshot"
    );

    // Heat to 26 with the fan up high, like a wall panel would ask for.
    ac.set_hvac_mode(HvacMode::Heat).await;
    ac.set_temperature(26.0).await;
    ac.set_fan_mode("High").await;
    ac.set_swing_mode(SwingMode::Vertical).await;

    ac.update().await;
    tracing::info!(
        mode = ?ac.hvac_mode(),
        target = ?ac.target_temperature(),
        fan = ?ac.fan_mode(),
        swing = ?ac.swing_mode(),
        "after commands"
    );

    for toggle in ac.mode_toggles() {
        tracing::info!(toggle = toggle.name(), on = toggle.is_on(ac), "discovered mode toggle");
    }

    // A few poll cycles to show the refresh path.
    for _ in 0..3 {
        sleep(Duration::from_millis(300)).await;
        let refreshed = registry.update_all().await;
        let ac = registry.climate(id).context("climate entity missing")?;
        tracing::info!(refreshed, mode = ?ac.hvac_mode(), "poll cycle");
    }

    let ac = registry.climate_mut(id).context("climate entity missing")?;
    ac.turn_off().await;
    ac.update().await;
    tracing::info!(is_on = ?ac.is_on(), mode = ?ac.hvac_mode(), "after turn off");

    for write in device_transport.writes() {
        tracing::info!(property = %write.full_name, value = %write.value, "recorded write");
    }
    Ok(())
}
