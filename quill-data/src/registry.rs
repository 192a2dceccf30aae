use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use crate::entity::EntityMetadata;
use crate::error::DataError;
use crate::model::Model;

/// Immutable registry of compiled entity metadata, keyed by entity type.
///
/// Built once at startup through [`RegistryBuilder`]; afterwards it is only
/// read, so it can be shared across requests without locking.
#[derive(Debug, Default)]
pub struct Registry {
    entities: HashMap<TypeId, Arc<EntityMetadata>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Metadata for `T`, or a configuration error if `T` was never registered.
    pub fn get<T: Model>(&self) -> Result<&EntityMetadata, DataError> {
        self.entities
            .get(&TypeId::of::<T>())
            .map(|m| m.as_ref())
            .ok_or_else(|| {
                DataError::configuration(format!(
                    "model {} is not registered",
                    std::any::type_name::<T>()
                ))
            })
    }

    pub fn contains<T: Model>(&self) -> bool {
        self.entities.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// All registered metadata, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &EntityMetadata> {
        self.entities.values().map(|m| m.as_ref())
    }
}

/// Collects model registrations; every definition is validated as it is added.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entities: HashMap<TypeId, Arc<EntityMetadata>>,
}

impl RegistryBuilder {
    /// Compile `T`'s definition. Fails immediately on a bad definition or
    /// when `T` is already registered.
    pub fn register<T: Model>(mut self) -> Result<Self, DataError> {
        let type_id = TypeId::of::<T>();
        let name = short_type_name::<T>();
        if self.entities.contains_key(&type_id) {
            return Err(DataError::configuration(format!(
                "model {name} registered twice"
            )));
        }
        let meta = EntityMetadata::compile(name, T::definition())?;
        self.entities.insert(type_id, Arc::new(meta));
        Ok(self)
    }

    pub fn build(self) -> Arc<Registry> {
        Arc::new(Registry {
            entities: self.entities,
        })
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
