use std::sync::Arc;

use schema_core::{
    cap::{climate::ClimateBinding, fan::FanBinding},
    service::ServiceDescriptor,
    spec::DeviceSpec,
    transport::Transport,
};
use uuid::Uuid;

use crate::{
    climate::ClimateEntity,
    fan::FanEntity,
    meta::{DeviceMeta, EntityId, EntityMeta},
};

/// Service names that surface as climate entities when they declare a power
/// or mode property.
pub const CLIMATE_SERVICES: &[&str] = &[
    "climate",
    "air_conditioner",
    "air_condition_outlet",
    "air_purifier",
    "heater",
    "ptc_bath_heater",
    "light_bath_heater",
];

/// Service names that surface as fan entities. An airer must declare a dryer
/// switch, anything else a power switch.
pub const FAN_SERVICES: &[&str] = &["fan", "ceiling_fan", "airer"];

fn entity_meta(device: &DeviceMeta, service: &ServiceDescriptor) -> EntityMeta {
    EntityMeta {
        id: EntityId(Uuid::new_v4()),
        device_id: device.id,
        name: format!("{} {}", device.name, service.description),
        unique_key: format!("{}-{}-{}", device.id.0, service.name, service.iid),
        icon: None,
    }
}

pub fn climate_entities(
    device: &DeviceMeta,
    spec: &DeviceSpec,
    transport: &Arc<dyn Transport>,
) -> Vec<ClimateEntity> {
    spec.get_services(CLIMATE_SERVICES)
        .into_iter()
        .filter(|srv| srv.property(&["on", "mode"]).is_some())
        .map(|srv| {
            let binding = ClimateBinding::resolve(spec, srv);
            ClimateEntity::new(entity_meta(device, srv), binding, Arc::clone(transport))
        })
        .collect()
}

pub fn fan_entities(
    device: &DeviceMeta,
    spec: &DeviceSpec,
    transport: &Arc<dyn Transport>,
) -> Vec<FanEntity> {
    spec.get_services(FAN_SERVICES)
        .into_iter()
        .filter(|srv| {
            if srv.name == "airer" {
                srv.property(&["dryer"]).is_some()
            } else {
                srv.property(&["on"]).is_some()
            }
        })
        .map(|srv| {
            let binding = FanBinding::resolve(spec, srv);
            FanEntity::new(entity_meta(device, srv), binding, Arc::clone(transport))
        })
        .collect()
}
