use std::collections::{BTreeMap, HashMap};

use anyhow::{Result, anyhow};

use crate::{climate::ClimateEntity, fan::FanEntity, meta::EntityId};

/// Owns every entity created for a device and routes lookups by id or by
/// stable unique key.
#[derive(Default)]
pub struct EntityRegistry {
    climate: HashMap<EntityId, ClimateEntity>,
    fans: HashMap<EntityId, FanEntity>,
    keys: BTreeMap<String, EntityId>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn claim_key(&mut self, key: &str, id: EntityId) -> Result<()> {
        if self.keys.contains_key(key) {
            return Err(anyhow!("duplicate entity key {key}"));
        }
        self.keys.insert(key.to_string(), id);
        Ok(())
    }

    pub fn add_climate(&mut self, entity: ClimateEntity) -> Result<EntityId> {
        let id = entity.meta().id;
        self.claim_key(&entity.meta().unique_key, id)?;
        self.climate.insert(id, entity);
        Ok(id)
    }

    pub fn add_fan(&mut self, entity: FanEntity) -> Result<EntityId> {
        let id = entity.meta().id;
        self.claim_key(&entity.meta().unique_key, id)?;
        self.fans.insert(id, entity);
        Ok(id)
    }

    pub fn lookup(&self, unique_key: &str) -> Option<EntityId> {
        self.keys.get(unique_key).copied()
    }

    pub fn climate(&self, id: EntityId) -> Option<&ClimateEntity> {
        self.climate.get(&id)
    }

    pub fn climate_mut(&mut self, id: EntityId) -> Option<&mut ClimateEntity> {
        self.climate.get_mut(&id)
    }

    pub fn fan(&self, id: EntityId) -> Option<&FanEntity> {
        self.fans.get(&id)
    }

    pub fn fan_mut(&mut self, id: EntityId) -> Option<&mut FanEntity> {
        self.fans.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.climate.len() + self.fans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.climate.is_empty() && self.fans.is_empty()
    }

    /// Polls every entity once and reports how many refreshed successfully.
    pub async fn update_all(&mut self) -> usize {
        let mut refreshed = 0;
        for entity in self.climate.values_mut() {
            if entity.update().await {
                refreshed += 1;
            }
        }
        for entity in self.fans.values_mut() {
            if entity.update().await {
                refreshed += 1;
            }
        }
        refreshed
    }
}
