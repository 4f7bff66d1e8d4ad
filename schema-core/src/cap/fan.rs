use serde::{Deserialize, Serialize};

use crate::{
    descriptor::PropertyDescriptor,
    service::{PropertyAddressMap, ServiceDescriptor},
    spec::DeviceSpec,
};

bitflags::bitflags! {
    #[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FanFeatures: u32 {
        const SET_SPEED = 0b0001;
        const DIRECTION = 0b0010;
        const OSCILLATE = 0b0100;
    }
}

/// Rotation direction, mapped to the extremes of the angle value list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FanDirection {
    Forward,
    Reverse,
}

impl FanDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            FanDirection::Forward => "forward",
            FanDirection::Reverse => "reverse",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "forward" => Some(FanDirection::Forward),
            "reverse" => Some(FanDirection::Reverse),
            _ => None,
        }
    }
}

/// Sibling services folded into a fan entity's address map.
pub const FAN_AUX_SERVICES: &[&str] = &[
    "fan",
    "yl_fan",
    "off_delay_time",
    "indicator_light",
    "environment",
    "motor_controller",
    "physical_controls_locked",
];

/// Enumerated appliance programs that carry an inactive sentinel entry and
/// surface as standalone toggles, keyed by property name.
pub const PROGRAM_SENTINELS: &[(&str, &[&str])] =
    &[("spin_speed", &["no spin"]), ("target_temperature", &["cold"]), ("drying_level", &["none"])];

#[derive(Debug, Clone)]
pub struct FanBinding {
    pub service_iid: i32,
    pub service_name: String,
    pub service_description: String,
    pub features: FanFeatures,
    pub mapping: PropertyAddressMap,
    pub power: Option<PropertyDescriptor>,
    pub speed: Option<PropertyDescriptor>,
    pub direction: Option<PropertyDescriptor>,
    pub oscillate: Option<PropertyDescriptor>,
    pub programs: Vec<PropertyDescriptor>,
}

impl FanBinding {
    pub fn resolve(spec: &DeviceSpec, service: &ServiceDescriptor) -> Self {
        let mut mapping = spec.services_mapping(FAN_AUX_SERVICES);
        mapping.extend(service.mapping());

        let power = service.property(&["on", "dryer"]).cloned();
        let speed = service.property(&["fan_level", "drying_level"]).cloned();
        let direction = service.property(&["horizontal_angle", "vertical_angle"]).cloned();
        let oscillate = service.property(&["horizontal_swing", "vertical_swing"]).cloned();

        let programs: Vec<PropertyDescriptor> = PROGRAM_SENTINELS
            .iter()
            .filter_map(|&(name, _)| service.property(&[name]))
            .filter(|p| !p.value_list.is_empty())
            .cloned()
            .collect();

        let mut features = FanFeatures::empty();
        if speed.is_some() {
            features |= FanFeatures::SET_SPEED;
        }
        if direction.is_some() {
            features |= FanFeatures::DIRECTION;
        }
        if oscillate.is_some() {
            features |= FanFeatures::OSCILLATE;
        }

        tracing::debug!(
            service = %service.name,
            features = features.bits(),
            "resolved fan binding"
        );

        Self {
            service_iid: service.iid,
            service_name: service.name.clone(),
            service_description: service.description.clone(),
            features,
            mapping,
            power,
            speed,
            direction,
            oscillate,
            programs,
        }
    }

    /// Sentinel descriptions marking a program property as inactive.
    pub fn program_sentinels(name: &str) -> &'static [&'static str] {
        PROGRAM_SENTINELS.iter().find(|(n, _)| *n == name).map(|(_, s)| *s).unwrap_or(&[])
    }
}
