use serde::{Deserialize, Serialize};

use crate::descriptor::{PropertyDescriptor, PropertyFormat, ValueEntry, ValueRange};
use crate::service::{ActionDescriptor, PropertyAddressMap, ServiceDescriptor};

#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error("invalid schema document: {0}")]
    Document(#[from] serde_json::Error),
    #[error("schema document declares no services")]
    NoServices,
}

/// Vendor schema document, as fetched. Field names follow the published
/// format; everything not modeled here is ignored.
#[derive(Debug, Deserialize)]
struct SpecDocument {
    #[serde(rename = "type")]
    device_type: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    services: Vec<ServiceNode>,
}

#[derive(Debug, Deserialize)]
struct ServiceNode {
    iid: i32,
    #[serde(rename = "type")]
    service_type: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    properties: Vec<PropertyNode>,
    #[serde(default)]
    actions: Vec<ActionNode>,
}

#[derive(Debug, Deserialize)]
struct PropertyNode {
    iid: i32,
    #[serde(rename = "type")]
    property_type: String,
    format: String,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default, rename = "value-list")]
    value_list: Vec<ValueEntry>,
    #[serde(default, rename = "value-range")]
    value_range: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct ActionNode {
    iid: i32,
    #[serde(rename = "type")]
    action_type: String,
    #[serde(default)]
    description: String,
}

/// Short name of a schema urn: the fourth colon segment with every non-word
/// run collapsed to `_`, e.g. `urn:spec-v2:property:target-temperature:...`
/// becomes `target_temperature`.
pub fn name_by_type(typ: &str) -> String {
    let seg = typ.split(':').nth(3).unwrap_or(typ);
    let mut name = String::with_capacity(seg.len());
    let mut gap = false;
    for c in seg.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            name.push(c);
            gap = false;
        } else if !gap {
            name.push('_');
            gap = true;
        }
    }
    name
}

/// Parsed device schema: the session-static registry every capability
/// resolution consults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceSpec {
    pub device_type: String,
    pub name: String,
    pub description: String,
    pub services: Vec<ServiceDescriptor>,
}

impl DeviceSpec {
    pub fn parse(json: &str) -> Result<Self, SpecError> {
        Self::build(serde_json::from_str(json)?)
    }

    pub fn from_value(doc: serde_json::Value) -> Result<Self, SpecError> {
        Self::build(serde_json::from_value(doc)?)
    }

    fn build(doc: SpecDocument) -> Result<Self, SpecError> {
        if doc.services.is_empty() {
            return Err(SpecError::NoServices);
        }
        let services = doc
            .services
            .into_iter()
            .map(|node| {
                let service_name = name_by_type(&node.service_type);
                let properties = node
                    .properties
                    .into_iter()
                    .map(|p| {
                        let name = name_by_type(&p.property_type);
                        PropertyDescriptor {
                            siid: node.iid,
                            iid: p.iid,
                            full_name: format!("{service_name}.{name}"),
                            name,
                            format: PropertyFormat::parse(&p.format),
                            unit: p.unit,
                            value_list: p.value_list,
                            range: match p.value_range.as_slice() {
                                [min, max, step, ..] => {
                                    Some(ValueRange { min: *min, max: *max, step: *step })
                                }
                                _ => None,
                            },
                        }
                    })
                    .collect();
                let actions = node
                    .actions
                    .into_iter()
                    .map(|a| ActionDescriptor {
                        siid: node.iid,
                        iid: a.iid,
                        name: name_by_type(&a.action_type),
                        description: a.description,
                    })
                    .collect();
                ServiceDescriptor {
                    iid: node.iid,
                    name: service_name,
                    description: node.description,
                    properties,
                    actions,
                }
            })
            .collect();
        Ok(Self {
            name: name_by_type(&doc.device_type),
            device_type: doc.device_type,
            description: doc.description,
            services,
        })
    }

    /// First service matching one of the candidate names, in candidate order.
    pub fn get_service(&self, names: &[&str]) -> Option<&ServiceDescriptor> {
        names.iter().find_map(|n| self.services.iter().find(|s| s.name == *n))
    }

    /// Every service matching one of the names, in declaration order.
    pub fn get_services(&self, names: &[&str]) -> Vec<&ServiceDescriptor> {
        self.services.iter().filter(|s| names.iter().any(|n| s.name == *n)).collect()
    }

    /// Union of the address maps of every service matching `names`, merged
    /// in name order. Later entries win on key collision, so callers layer
    /// their primary service's mapping on top of this.
    pub fn services_mapping(&self, names: &[&str]) -> PropertyAddressMap {
        let mut map = PropertyAddressMap::new();
        for name in names {
            for srv in self.services.iter().filter(|s| s.name == *name) {
                map.extend(srv.mapping());
            }
        }
        map
    }
}
