use std::sync::Arc;

use schema_core::{
    cap::fan::{FanBinding, FanDirection, FanFeatures},
    descriptor::truthy,
    transport::{StateMap, Transport},
};
use tracing::warn;

use crate::{
    entity::{EntityCore, POWER_SHADOW},
    meta::EntityMeta,
    sub::ProgramToggle,
};

/// Sentinel speed reported while the fan is off or its level value is not in
/// the speed list.
pub const SPEED_OFF: &str = "off";

/// Fan facade over one resolved service binding, also backing washer and
/// airer style appliances whose programs surface as sub-toggles.
pub struct FanEntity {
    meta: EntityMeta,
    core: EntityCore,
    binding: FanBinding,
}

impl FanEntity {
    pub fn new(meta: EntityMeta, binding: FanBinding, transport: Arc<dyn Transport>) -> Self {
        Self { meta, core: EntityCore::new(transport), binding }
    }

    pub fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    pub fn binding(&self) -> &FanBinding {
        &self.binding
    }

    pub fn features(&self) -> FanFeatures {
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

    pub fn is_on(&self) -> Option<bool> {
        let state = self.core.state();
        if let Some(power) = &self.binding.power {
            return power.read(state).and_then(truthy);
        }
        if let Some(shadow) = state.get(POWER_SHADOW) {
            return truthy(shadow);
        }
        None
    }

    pub async fn turn_on(&mut self) -> bool {
        if self.is_on() == Some(true) {
            return true;
        }
        let Some(power) = self.binding.power.as_ref().map(|p| p.full_name.clone()) else {
            return false;
        };
        self.core.set_property(&power, true.into()).await
    }

    /// Power on and optionally jump straight to a speed. When a speed is
    /// given its write decides the result.
    pub async fn turn_on_with_speed(&mut self, speed: Option<&str>) -> bool {
        let mut ok = self.turn_on().await;
        if let Some(speed) = speed {
            ok = self.set_speed(speed).await;
        }
        ok
    }

    pub async fn turn_off(&mut self) -> bool {
        let Some(power) = self.binding.power.as_ref().map(|p| p.full_name.clone()) else {
            return false;
        };
        self.core.set_property(&power, false.into()).await
    }

    pub fn speed(&self) -> Option<&str> {
        let prop = self.binding.speed.as_ref()?;
        if self.is_on() != Some(true) {
            return Some(SPEED_OFF);
        }
        prop.read(self.core.state()).and_then(|v| prop.list_description(v)).or(Some(SPEED_OFF))
    }

    pub fn speed_list(&self) -> Vec<&str> {
        let mut list = vec![SPEED_OFF];
        if let Some(prop) = &self.binding.speed {
            list.extend(prop.descriptions());
        }
        list
    }

    pub async fn set_speed(&mut self, speed: &str) -> bool {
        let Some(prop) = self.binding.speed.as_ref() else {
            return false;
        };
        let Some(entry) = prop.value_list.iter().find(|e| e.description == speed) else {
            warn!(speed, "no matching speed in this schema");
            return false;
        };
        let (target, value) = (prop.full_name.clone(), entry.value.clone());
        self.core.set_property(&target, value).await
    }

    /// Direction derived from the angle property: at or below the smallest
    /// listed angle reads Reverse, at or above the largest reads Forward,
    /// anything between is indeterminate.
    pub fn current_direction(&self) -> Option<FanDirection> {
        let prop = self.binding.direction.as_ref()?;
        let current = prop.read(self.core.state()).and_then(|v| v.as_f64())?;
        let mut angles = prop.value_list.iter().filter_map(|e| e.value.as_f64());
        let first = angles.next()?;
        let (min, max) = angles.fold((first, first), |(lo, hi), a| (lo.min(a), hi.max(a)));
        if current <= min {
            return Some(FanDirection::Reverse);
        }
        if current >= max {
            return Some(FanDirection::Forward);
        }
        None
    }

    pub async fn set_direction(&mut self, direction: FanDirection) -> bool {
        let Some(prop) = self.binding.direction.as_ref() else {
            return false;
        };
        let extreme = prop
            .value_list
            .iter()
            .filter_map(|e| e.value.as_f64().map(|n| (n, e)))
            .reduce(|a, b| match direction {
                FanDirection::Reverse => {
                    if b.0 < a.0 {
                        b
                    } else {
                        a
                    }
                }
                FanDirection::Forward => {
                    if b.0 > a.0 {
                        b
                    } else {
                        a
                    }
                }
            });
        let Some((_, entry)) = extreme else {
            return false;
        };
        let (target, value) = (prop.full_name.clone(), entry.value.clone());
        self.core.set_property(&target, value).await
    }

    pub fn oscillating(&self) -> Option<bool> {
        let prop = self.binding.oscillate.as_ref()?;
        prop.read(self.core.state()).and_then(truthy)
    }

    pub async fn oscillate(&mut self, oscillating: bool) -> bool {
        let Some(target) = self.binding.oscillate.as_ref().map(|p| p.full_name.clone()) else {
            return false;
        };
        self.core.set_property(&target, oscillating.into()).await
    }

    /// Standalone toggles for the enumerated program properties this
    /// service declares.
    pub fn program_toggles(&self) -> Vec<ProgramToggle> {
        self.binding.programs.iter().cloned().map(ProgramToggle::new).collect()
    }
}
