use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::descriptor::{PropertyAddress, PropertyDescriptor};

/// Fully qualified property name to raw device address.
pub type PropertyAddressMap = BTreeMap<String, PropertyAddress>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionDescriptor {
    pub siid: i32,
    pub iid: i32,
    pub name: String,
    pub description: String,
}

/// Raw address of an invocable action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionHandle {
    pub siid: i32,
    pub aiid: i32,
}

impl ActionDescriptor {
    pub fn handle(&self) -> ActionHandle {
        ActionHandle { siid: self.siid, aiid: self.iid }
    }
}

/// One service of a device schema, owning its property and action
/// descriptors in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceDescriptor {
    pub iid: i32,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionDescriptor>,
}

impl ServiceDescriptor {
    /// First property matching one of the candidate names, in candidate
    /// order.
    pub fn property(&self, names: &[&str]) -> Option<&PropertyDescriptor> {
        names.iter().find_map(|n| self.properties.iter().find(|p| p.name == *n))
    }

    /// Like [`property`](Self::property) but only matches boolean properties.
    pub fn bool_property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name && p.is_bool())
    }

    pub fn action(&self, names: &[&str]) -> Option<&ActionDescriptor> {
        names.iter().find_map(|n| self.actions.iter().find(|a| a.name == *n))
    }

    /// Address map for this service's own properties.
    pub fn mapping(&self) -> PropertyAddressMap {
        self.properties.iter().map(|p| (p.full_name.clone(), p.address())).collect()
    }
}
