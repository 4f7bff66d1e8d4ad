use schema_core::{
    cap::fan::FanBinding,
    descriptor::{PropertyDescriptor, raw_eq, truthy},
};

use crate::{climate::ClimateEntity, fan::FanEntity};

enum ToggleKind {
    Power,
    Value { on: serde_json::Value, off: Option<serde_json::Value> },
}

/// Toggle surface for one property of a climate entity: either a boolean
/// auxiliary power switch, or one enumerated mode value with the resolved
/// off value as its counterpart. Holds no state; the parent is passed per
/// call and all reads and writes go through it.
pub struct ModeToggle {
    prop: PropertyDescriptor,
    name: String,
    kind: ToggleKind,
}

impl ModeToggle {
    pub fn power_style(prop: PropertyDescriptor) -> Self {
        let name = prop.name.clone();
        Self { prop, name, kind: ToggleKind::Power }
    }

    pub fn value_style(
        prop: PropertyDescriptor,
        name: String,
        on: serde_json::Value,
        off: Option<serde_json::Value>,
    ) -> Self {
        Self { prop, name, kind: ToggleKind::Value { on, off } }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_on(&self, parent: &ClimateEntity) -> bool {
        let current = self.prop.read(parent.state());
        match &self.kind {
            ToggleKind::Power => current.and_then(truthy) == Some(true),
            ToggleKind::Value { on, .. } => current.is_some_and(|v| raw_eq(v, on)),
        }
    }

    pub async fn turn_on(&self, parent: &mut ClimateEntity) -> bool {
        match &self.kind {
            ToggleKind::Power => parent.set_property(&self.prop.full_name, true.into()).await,
            ToggleKind::Value { on, .. } => {
                parent.set_property(&self.prop.full_name, on.clone()).await
            }
        }
    }

    /// Off is only expressible for a value toggle when the schema resolved
    /// an off value.
    pub async fn turn_off(&self, parent: &mut ClimateEntity) -> bool {
        match &self.kind {
            ToggleKind::Power => parent.set_property(&self.prop.full_name, false.into()).await,
            ToggleKind::Value { off: Some(off), .. } => {
                let off = off.clone();
                parent.set_property(&self.prop.full_name, off).await
            }
            ToggleKind::Value { off: None, .. } => false,
        }
    }

    pub async fn turn_on_with_speed(
        &self,
        parent: &mut ClimateEntity,
        speed: Option<&str>,
    ) -> bool {
        let mut ok = self.turn_on(parent).await;
        if let Some(speed) = speed {
            ok = self.set_speed(parent, speed).await;
        }
        ok
    }

    pub fn speed<'a>(&self, parent: &'a ClimateEntity) -> Option<&'a str> {
        parent.fan_mode()
    }

    pub fn speed_list<'a>(&self, parent: &'a ClimateEntity) -> Vec<&'a str> {
        parent.fan_modes()
    }

    pub async fn set_speed(&self, parent: &mut ClimateEntity, speed: &str) -> bool {
        parent.set_fan_mode(speed).await
    }
}

/// Toggle surface for one enumerated program property of a fan-backed
/// appliance. The sentinel descriptions for the property name mark its
/// inactive values.
pub struct ProgramToggle {
    prop: PropertyDescriptor,
    off_values: Vec<serde_json::Value>,
}

impl ProgramToggle {
    pub fn new(prop: PropertyDescriptor) -> Self {
        let off_values = prop.list_search(FanBinding::program_sentinels(&prop.name));
        Self { prop, off_values }
    }

    pub fn name(&self) -> &str {
        &self.prop.name
    }

    /// On while the parent runs and the program sits on a known
    /// non-sentinel value.
    pub fn is_on(&self, parent: &FanEntity) -> bool {
        if parent.is_on() != Some(true) {
            return false;
        }
        match self.prop.read(parent.state()) {
            Some(current) => !self.off_values.iter().any(|v| raw_eq(v, current)),
            None => false,
        }
    }

    pub async fn turn_on(&self, parent: &mut FanEntity) -> bool {
        let first_active = self
            .prop
            .value_list
            .iter()
            .find(|e| !self.off_values.iter().any(|v| raw_eq(v, &e.value)))
            .map(|e| e.value.clone());
        let Some(value) = first_active else {
            return false;
        };
        parent.set_property(&self.prop.full_name, value).await
    }

    pub async fn turn_off(&self, parent: &mut FanEntity) -> bool {
        let Some(off) = self.off_values.first().cloned() else {
            return false;
        };
        parent.set_property(&self.prop.full_name, off).await
    }

    pub fn speed<'a>(&'a self, parent: &'a FanEntity) -> Option<&'a str> {
        let current = self.prop.read(parent.state())?;
        self.prop.list_description(current)
    }

    pub fn speed_list(&self) -> Vec<&str> {
        self.prop.descriptions()
    }

    pub async fn set_speed(&self, parent: &mut FanEntity, speed: &str) -> bool {
        let Some(value) = self.prop.list_value(speed) else {
            return false;
        };
        parent.set_property(&self.prop.full_name, value).await
    }
}
