use serde::{Deserialize, Serialize};

use crate::{
    descriptor::{PropertyDescriptor, raw_eq},
    service::{ActionHandle, PropertyAddressMap, ServiceDescriptor},
    spec::DeviceSpec,
};

bitflags::bitflags! {
    #[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClimateFeatures: u32 {
        const TARGET_TEMPERATURE = 0b0001;
        const TARGET_HUMIDITY    = 0b0010;
        const FAN_MODE           = 0b0100;
        const SWING_MODE         = 0b1000;
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HvacMode {
    Off,
    Auto,
    Cool,
    Heat,
    Dry,
    FanOnly,
}

impl HvacMode {
    pub const ALL: [HvacMode; 6] = [
        HvacMode::Off,
        HvacMode::Auto,
        HvacMode::Cool,
        HvacMode::Heat,
        HvacMode::Dry,
        HvacMode::FanOnly,
    ];

    /// Schema descriptions that identify this mode, most specific first.
    pub fn candidates(&self) -> &'static [&'static str] {
        match self {
            HvacMode::Off => &["Off", "Idle", "None"],
            HvacMode::Auto => &["Auto"],
            HvacMode::Cool => &["Cool"],
            HvacMode::Heat => &["Heat"],
            HvacMode::Dry => &["Dry"],
            HvacMode::FanOnly => &["Fan"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HvacMode::Off => "off",
            HvacMode::Auto => "auto",
            HvacMode::Cool => "cool",
            HvacMode::Heat => "heat",
            HvacMode::Dry => "dry",
            HvacMode::FanOnly => "fan_only",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "off" => Some(HvacMode::Off),
            "auto" => Some(HvacMode::Auto),
            "cool" => Some(HvacMode::Cool),
            "heat" => Some(HvacMode::Heat),
            "dry" => Some(HvacMode::Dry),
            "fan_only" => Some(HvacMode::FanOnly),
            _ => None,
        }
    }

    /// Whether any standard mode lists this schema description as a
    /// candidate. Descriptions nobody claims surface as standalone toggles.
    pub fn claims(description: &str) -> bool {
        HvacMode::ALL.iter().any(|m| m.candidates().contains(&description))
    }
}

/// Swing position as a two-bit mask: bit 1 vertical, bit 2 horizontal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SwingMode {
    Off,
    Vertical,
    Horizontal,
    Both,
}

impl SwingMode {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => SwingMode::Off,
            0b01 => SwingMode::Vertical,
            0b10 => SwingMode::Horizontal,
            _ => SwingMode::Both,
        }
    }

    pub fn bits(&self) -> u8 {
        match self {
            SwingMode::Off => 0b00,
            SwingMode::Vertical => 0b01,
            SwingMode::Horizontal => 0b10,
            SwingMode::Both => 0b11,
        }
    }

    pub fn vertical(&self) -> bool {
        self.bits() & 0b01 != 0
    }

    pub fn horizontal(&self) -> bool {
        self.bits() & 0b10 != 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct ModeEntry {
    mode: HvacMode,
    raw: serde_json::Value,
}

/// Mapping between standard modes and the raw values a device's mode
/// property uses for them. Built once per binding; a mode is listed only if
/// one of its candidate descriptions resolved against the schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModeTable {
    entries: Vec<ModeEntry>,
}

impl ModeTable {
    pub fn build(prop: &PropertyDescriptor) -> Self {
        let entries = HvacMode::ALL
            .iter()
            .filter_map(|m| {
                prop.list_first(m.candidates()).map(|raw| ModeEntry { mode: *m, raw })
            })
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn raw_for(&self, mode: HvacMode) -> Option<&serde_json::Value> {
        self.entries.iter().find(|e| e.mode == mode).map(|e| &e.raw)
    }

    /// Standard mode a raw value maps to. First table entry wins if a device
    /// reuses one raw value for several descriptions.
    pub fn mode_for(&self, raw: &serde_json::Value) -> Option<HvacMode> {
        self.entries.iter().find(|e| raw_eq(&e.raw, raw)).map(|e| e.mode)
    }

    pub fn modes(&self) -> Vec<HvacMode> {
        self.entries.iter().map(|e| e.mode).collect()
    }
}

/// Sibling services folded into a climate entity's address map, merged in
/// this order with the primary service applied last.
pub const CLIMATE_AUX_SERVICES: &[&str] = &[
    "air_conditioner",
    "fan_control",
    "environment",
    "indicator_light",
    "countdown",
    "air_purifier",
    "filter_time",
    "motor_speed",
    "aqi",
    "rfid",
    "physical_controls_locked",
    "electricity",
    "maintenance",
    "alarm",
    "enhance",
    "others",
    "private_service",
    "power_consumption",
    "ac_function",
    "device_protect",
    "device_info",
    "arming",
    "smart_action",
];

/// Everything a climate facade needs, resolved once from the schema:
/// feature flags, the address map and the descriptors behind each semantic
/// role. A role that did not resolve stays `None` and the operations built
/// on it degrade to no-ops.
#[derive(Debug, Clone)]
pub struct ClimateBinding {
    pub service_iid: i32,
    pub service_name: String,
    pub service_description: String,
    pub features: ClimateFeatures,
    pub mapping: PropertyAddressMap,
    pub power: Option<PropertyDescriptor>,
    pub mode: Option<PropertyDescriptor>,
    pub mode_table: ModeTable,
    pub target_temperature: Option<PropertyDescriptor>,
    pub target_humidity: Option<PropertyDescriptor>,
    pub temperature: Option<PropertyDescriptor>,
    pub humidity: Option<PropertyDescriptor>,
    pub fan_level: Option<PropertyDescriptor>,
    pub fan_power: Option<PropertyDescriptor>,
    pub horizontal_swing: Option<PropertyDescriptor>,
    pub vertical_swing: Option<PropertyDescriptor>,
    pub alt_power: Vec<PropertyDescriptor>,
    pub start_action: Option<ActionHandle>,
    pub stop_action: Option<ActionHandle>,
}

impl ClimateBinding {
    pub fn resolve(spec: &DeviceSpec, service: &ServiceDescriptor) -> Self {
        let mut mapping = spec.services_mapping(CLIMATE_AUX_SERVICES);
        mapping.extend(service.mapping());

        let environment = spec.get_service(&["environment"]);
        let fan_control = spec.get_service(&["fan_control"]);

        let power = service.property(&["on"]).cloned();
        let mode = service.property(&["mode"]).cloned();
        let target_temperature = service.property(&["target_temperature"]).cloned();
        let target_humidity = service.property(&["target_humidity"]).cloned();

        let temperature = environment
            .and_then(|s| s.property(&["temperature"]))
            .or_else(|| service.property(&["temperature"]))
            .cloned();
        let humidity = environment
            .and_then(|s| s.property(&["relative_humidity", "humidity"]))
            .or_else(|| service.property(&["relative_humidity", "humidity"]))
            .cloned();

        let fan_level = fan_control
            .and_then(|s| s.property(&["fan_level"]))
            .or_else(|| service.property(&["fan_level"]))
            .cloned();
        let fan_power = fan_control.and_then(|s| s.bool_property("on")).cloned();
        let horizontal_swing = fan_control
            .and_then(|s| s.property(&["horizontal_swing"]))
            .or_else(|| service.property(&["horizontal_swing"]))
            .cloned();
        let vertical_swing = fan_control
            .and_then(|s| s.property(&["vertical_swing"]))
            .or_else(|| service.property(&["vertical_swing"]))
            .cloned();

        let alt_power: Vec<PropertyDescriptor> = ["blow", "heating", "ventilation"]
            .iter()
            .filter_map(|n| service.bool_property(n))
            .cloned()
            .collect();

        let start_action = service
            .action(&["power_on"])
            .or_else(|| spec.services.iter().find_map(|s| s.action(&["power_on"])))
            .map(|a| a.handle());
        let stop_action = service.action(&["stop_working", "power_off"]).map(|a| a.handle());

        let mode_table = mode.as_ref().map(ModeTable::build).unwrap_or_default();

        let mut features = ClimateFeatures::empty();
        if target_temperature.is_some() {
            features |= ClimateFeatures::TARGET_TEMPERATURE;
        }
        if target_humidity.is_some() {
            features |= ClimateFeatures::TARGET_HUMIDITY;
        }
        let has_fan_modes = fan_level.as_ref().is_some_and(|p| !p.value_list.is_empty());
        let mode_has_fan =
            mode.as_ref().is_some_and(|p| p.list_first(HvacMode::FanOnly.candidates()).is_some());
        if has_fan_modes || mode_has_fan {
            features |= ClimateFeatures::FAN_MODE;
        }
        if horizontal_swing.is_some() || vertical_swing.is_some() {
            features |= ClimateFeatures::SWING_MODE;
        }

        tracing::debug!(
            service = %service.name,
            features = features.bits(),
            modes = mode_table.entries.len(),
            "resolved climate binding"
        );

        Self {
            service_iid: service.iid,
            service_name: service.name.clone(),
            service_description: service.description.clone(),
            features,
            mapping,
            power,
            mode,
            mode_table,
            target_temperature,
            target_humidity,
            temperature,
            humidity,
            fan_level,
            fan_power,
            horizontal_swing,
            vertical_swing,
            alt_power,
            start_action,
            stop_action,
        }
    }
}
