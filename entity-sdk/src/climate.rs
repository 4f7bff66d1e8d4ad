use std::sync::Arc;

use schema_core::{
    cap::climate::{ClimateBinding, ClimateFeatures, HvacMode, SwingMode},
    descriptor::{PropertyDescriptor, TemperatureUnit, raw_eq, truthy},
    transport::{StateMap, Transport},
};
use tracing::warn;

use crate::{
    entity::{EntityCore, POWER_SHADOW},
    meta::EntityMeta,
    sub::ModeToggle,
};

pub const DEFAULT_MIN_TEMP: f64 = 16.0;
pub const DEFAULT_MAX_TEMP: f64 = 31.0;
pub const DEFAULT_TEMP_STEP: f64 = 1.0;
pub const DEFAULT_MIN_HUMIDITY: f64 = 30.0;
pub const DEFAULT_MAX_HUMIDITY: f64 = 99.0;

/// Climate facade over one resolved service binding. Every operation is
/// best-effort: a role the schema never declared makes the corresponding
/// getter return `None` and the setter return `false`.
pub struct ClimateEntity {
    meta: EntityMeta,
    core: EntityCore,
    binding: ClimateBinding,
    override_temperature: Option<f64>,
    override_humidity: Option<f64>,
}

impl ClimateEntity {
    pub fn new(meta: EntityMeta, binding: ClimateBinding, transport: Arc<dyn Transport>) -> Self {
        Self {
            meta,
            core: EntityCore::new(transport),
            binding,
            override_temperature: None,
            override_humidity: None,
        }
    }

    pub fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    pub fn binding(&self) -> &ClimateBinding {
        &self.binding
    }

    pub fn features(&self) -> ClimateFeatures {
        self.binding.features
    }

    pub fn state(&self) -> &StateMap {
        self.core.state()
    }

    pub fn available(&self) -> bool {
        self.core.available()
    }

    pub async fn update(&mut self) -> bool {
        self.core.update().await
    }

    pub async fn set_property(&mut self, full_name: &str, value: serde_json::Value) -> bool {
        self.core.set_property(full_name, value).await
    }

    /// Power state. A dedicated power property alone decides when the schema
    /// declares one; otherwise alternate power booleans, the mode property
    /// and the optimistic shadow key are consulted in turn.
    pub fn is_on(&self) -> Option<bool> {
        let state = self.core.state();
        if let Some(power) = &self.binding.power {
            return power.read(state).and_then(truthy);
        }
        for alt in &self.binding.alt_power {
            if alt.read(state).and_then(truthy) == Some(true) {
                return Some(true);
            }
        }
        if let Some(mode) = &self.binding.mode
            && let Some(off) = self.binding.mode_table.raw_for(HvacMode::Off)
            && let Some(current) = mode.read(state)
        {
            return Some(!raw_eq(current, off));
        }
        if let Some(shadow) = state.get(POWER_SHADOW) {
            return truthy(shadow);
        }
        None
    }

    /// Walks the write paths able to express "on", most direct first:
    /// dedicated power, alternate power, mode, fan-control power, start
    /// action. The first path the schema declares decides the result.
    pub async fn turn_on(&mut self) -> bool {
        if let Some(power) = self.binding.power.as_ref().map(|p| p.full_name.clone()) {
            return self.core.set_property(&power, true.into()).await;
        }
        if let Some(alt) = self.binding.alt_power.first().map(|p| p.full_name.clone()) {
            return self.core.set_property(&alt, true.into()).await;
        }
        if let Some(mode) = self.binding.mode.as_ref().map(|p| p.full_name.clone()) {
            let on_modes = [HvacMode::Auto, HvacMode::Heat, HvacMode::Cool];
            let raw = on_modes.iter().find_map(|m| self.binding.mode_table.raw_for(*m)).cloned();
            if let Some(raw) = raw {
                return self.core.set_property(&mode, raw).await;
            }
        }
        if let Some(fan_power) = self.binding.fan_power.as_ref().map(|p| p.full_name.clone()) {
            return self.core.set_property(&fan_power, true.into()).await;
        }
        if let Some(action) = self.binding.start_action {
            if self.core.invoke(action).await {
                self.core.set_local(POWER_SHADOW, true.into());
                return true;
            }
            return false;
        }
        false
    }

    /// Mirror of `turn_on`: dedicated power, every alternate power boolean,
    /// the resolved off mode value, fan-control power, stop action.
    pub async fn turn_off(&mut self) -> bool {
        if let Some(power) = self.binding.power.as_ref().map(|p| p.full_name.clone()) {
            return self.core.set_property(&power, false.into()).await;
        }
        if !self.binding.alt_power.is_empty() {
            let alts: Vec<String> =
                self.binding.alt_power.iter().map(|p| p.full_name.clone()).collect();
            let mut ok = true;
            for alt in alts {
                ok &= self.core.set_property(&alt, false.into()).await;
            }
            return ok;
        }
        if let Some(mode) = self.binding.mode.as_ref().map(|p| p.full_name.clone())
            && let Some(off) = self.binding.mode_table.raw_for(HvacMode::Off).cloned()
        {
            return self.core.set_property(&mode, off).await;
        }
        if let Some(fan_power) = self.binding.fan_power.as_ref().map(|p| p.full_name.clone()) {
            return self.core.set_property(&fan_power, false.into()).await;
        }
        if let Some(action) = self.binding.stop_action {
            if self.core.invoke(action).await {
                self.core.set_local(POWER_SHADOW, false.into());
                return true;
            }
            return false;
        }
        false
    }

    pub fn hvac_mode(&self) -> Option<HvacMode> {
        if self.is_on() != Some(true) {
            return Some(HvacMode::Off);
        }
        let mode = self.binding.mode.as_ref()?;
        let current = mode.read(self.core.state())?;
        self.binding.mode_table.mode_for(current)
    }

    /// Resolved modes in standard order. Off is always offered even when the
    /// schema has no off value, since `turn_off` has other paths.
    pub fn hvac_modes(&self) -> Vec<HvacMode> {
        let mut modes = self.binding.mode_table.modes();
        if !modes.contains(&HvacMode::Off) {
            modes.push(HvacMode::Off);
        }
        modes
    }

    pub async fn set_hvac_mode(&mut self, mode: HvacMode) -> bool {
        if mode == HvacMode::Off {
            return self.turn_off().await;
        }
        let Some(mode_prop) = self.binding.mode.as_ref().map(|p| p.full_name.clone()) else {
            return false;
        };
        if let Some(power) = self.binding.power.as_ref().map(|p| p.full_name.clone())
            && self.is_on() != Some(true)
        {
            self.core.set_property(&power, true.into()).await;
        }
        let Some(raw) = self.binding.mode_table.raw_for(mode).cloned() else {
            warn!(mode = mode.as_str(), "mode has no value in this schema");
            return false;
        };
        self.core.set_property(&mode_prop, raw).await
    }

    pub fn temperature_unit(&self) -> TemperatureUnit {
        self.binding
            .temperature
            .as_ref()
            .or(self.binding.target_temperature.as_ref())
            .and_then(|p| p.temperature_unit())
            .unwrap_or(TemperatureUnit::Celsius)
    }

    fn number(&self, prop: Option<&PropertyDescriptor>) -> Option<f64> {
        prop.and_then(|p| p.read(self.core.state())).and_then(|v| v.as_f64())
    }

    pub fn current_temperature(&self) -> Option<f64> {
        self.override_temperature.or_else(|| self.number(self.binding.temperature.as_ref()))
    }

    pub fn target_temperature(&self) -> Option<f64> {
        self.number(self.binding.target_temperature.as_ref())
    }

    pub fn min_temp(&self) -> f64 {
        self.binding
            .target_temperature
            .as_ref()
            .and_then(|p| p.range_min())
            .unwrap_or(DEFAULT_MIN_TEMP)
    }

    pub fn max_temp(&self) -> f64 {
        self.binding
            .target_temperature
            .as_ref()
            .and_then(|p| p.range_max())
            .unwrap_or(DEFAULT_MAX_TEMP)
    }

    pub fn target_temperature_step(&self) -> f64 {
        self.binding
            .target_temperature
            .as_ref()
            .and_then(|p| p.range_step())
            .unwrap_or(DEFAULT_TEMP_STEP)
    }

    pub async fn set_temperature(&mut self, temperature: f64) -> bool {
        let Some(target) = self.binding.target_temperature.as_ref().map(|p| p.full_name.clone())
        else {
            return false;
        };
        let value = temperature.clamp(self.min_temp(), self.max_temp());
        self.core.set_property(&target, value.into()).await
    }

    /// Combined mode-and-setpoint command. Both writes are attempted; the
    /// result is true only if both succeed.
    pub async fn set_mode_and_temperature(&mut self, mode: HvacMode, temperature: f64) -> bool {
        let mode_ok = self.set_hvac_mode(mode).await;
        let temp_ok = self.set_temperature(temperature).await;
        mode_ok && temp_ok
    }

    pub fn current_humidity(&self) -> Option<f64> {
        self.override_humidity.or_else(|| self.number(self.binding.humidity.as_ref()))
    }

    pub fn target_humidity(&self) -> Option<f64> {
        self.number(self.binding.target_humidity.as_ref())
    }

    pub fn min_humidity(&self) -> f64 {
        self.binding
            .target_humidity
            .as_ref()
            .and_then(|p| p.range_min())
            .unwrap_or(DEFAULT_MIN_HUMIDITY)
    }

    pub fn max_humidity(&self) -> f64 {
        self.binding
            .target_humidity
            .as_ref()
            .and_then(|p| p.range_max())
            .unwrap_or(DEFAULT_MAX_HUMIDITY)
    }

    pub async fn set_humidity(&mut self, humidity: f64) -> bool {
        let Some(target) = self.binding.target_humidity.as_ref().map(|p| p.full_name.clone())
        else {
            return false;
        };
        let value = humidity.clamp(self.min_humidity(), self.max_humidity()).round() as i64;
        self.core.set_property(&target, value.into()).await
    }

    pub fn fan_mode(&self) -> Option<&str> {
        let prop = self.binding.fan_level.as_ref()?;
        let current = prop.read(self.core.state())?;
        prop.list_description(current)
    }

    pub fn fan_modes(&self) -> Vec<&str> {
        self.binding.fan_level.as_ref().map(|p| p.descriptions()).unwrap_or_default()
    }

    pub async fn set_fan_mode(&mut self, fan_mode: &str) -> bool {
        let Some(prop) = self.binding.fan_level.as_ref() else {
            return false;
        };
        let Some(value) = prop.list_value(fan_mode) else {
            warn!(fan_mode, "no matching fan mode in this schema");
            return false;
        };
        let target = prop.full_name.clone();
        self.core.set_property(&target, value).await
    }

    /// Current swing position as a bitmask read: bit 1 while the vertical
    /// axis swings, bit 2 while the horizontal one does. A missing axis
    /// contributes nothing.
    pub fn swing_mode(&self) -> SwingMode {
        let state = self.core.state();
        let mut bits = 0u8;
        if let Some(p) = &self.binding.vertical_swing
            && p.read(state).and_then(truthy) == Some(true)
        {
            bits |= 0b01;
        }
        if let Some(p) = &self.binding.horizontal_swing
            && p.read(state).and_then(truthy) == Some(true)
        {
            bits |= 0b10;
        }
        SwingMode::from_bits(bits)
    }

    pub fn swing_modes(&self) -> Vec<SwingMode> {
        let mut modes = vec![SwingMode::Off];
        if self.binding.vertical_swing.is_some() {
            modes.push(SwingMode::Vertical);
        }
        if self.binding.horizontal_swing.is_some() {
            modes.push(SwingMode::Horizontal);
        }
        if self.binding.vertical_swing.is_some() && self.binding.horizontal_swing.is_some() {
            modes.push(SwingMode::Both);
        }
        modes
    }

    /// Drives both axes toward the requested position. An axis is skipped
    /// when its property is missing, its cached value is unknown or it is
    /// already at the target; skipped axes never fail the call.
    pub async fn set_swing_mode(&mut self, swing: SwingMode) -> bool {
        let mut targets: Vec<(String, bool)> = Vec::new();
        if let Some(p) = &self.binding.vertical_swing {
            targets.push((p.full_name.clone(), swing.vertical()));
        }
        if let Some(p) = &self.binding.horizontal_swing {
            targets.push((p.full_name.clone(), swing.horizontal()));
        }
        if targets.is_empty() {
            return false;
        }
        let mut ok = true;
        for (axis, target) in targets {
            match self.core.value(&axis).and_then(truthy) {
                None => continue,
                Some(current) if current == target => continue,
                Some(_) => ok &= self.core.set_property(&axis, target.into()).await,
            }
        }
        ok
    }

    /// Injects externally measured conditions, overriding the device's own
    /// sensors until cleared with `None`.
    pub fn set_measurements(&mut self, temperature: Option<f64>, humidity: Option<f64>) {
        self.override_temperature = temperature;
        self.override_humidity = humidity;
    }

    /// Standalone toggles for the alternate power booleans and for mode
    /// values no standard mode claims.
    pub fn mode_toggles(&self) -> Vec<ModeToggle> {
        let mut toggles: Vec<ModeToggle> =
            self.binding.alt_power.iter().cloned().map(ModeToggle::power_style).collect();
        if let Some(mode) = &self.binding.mode {
            let off = self.binding.mode_table.raw_for(HvacMode::Off).cloned();
            for entry in &mode.value_list {
                if HvacMode::claims(&entry.description) {
                    continue;
                }
                toggles.push(ModeToggle::value_style(
                    mode.clone(),
                    entry.description.clone(),
                    entry.value.clone(),
                    off.clone(),
                ));
            }
        }
        toggles
    }
}
