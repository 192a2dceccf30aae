use std::collections::HashSet;

use tracing::{debug, info};

use crate::error::DataError;
use crate::field::FieldDescriptor;
use crate::sql;

/// Declarative definition of an entity: its table and mapped fields.
///
/// Returned by [`Model::definition`](crate::Model::definition) and compiled
/// once into [`EntityMetadata`] at registration.
///
/// ```ignore
/// ModelDef::new("users")
///     .field(FieldDescriptor::string("id").primary_key().default_with(|| next_id().into()))
///     .field(FieldDescriptor::string("email").ddl("varchar(50)"))
/// ```
#[derive(Debug, Clone)]
pub struct ModelDef {
    table: String,
    fields: Vec<FieldDescriptor>,
}

impl ModelDef {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }
}

/// Compiled, immutable metadata for one entity type.
///
/// `fields` holds every non-key field in declaration order; that order is
/// shared with the prebuilt INSERT and UPDATE argument lists.
#[derive(Debug)]
pub struct EntityMetadata {
    entity: &'static str,
    table: String,
    primary_key: FieldDescriptor,
    fields: Vec<FieldDescriptor>,
    select: String,
    insert: String,
    update: String,
    delete: String,
}

impl EntityMetadata {
    /// Validate a definition and prebuild its SQL templates.
    ///
    /// Fails with [`DataError::Configuration`] when the definition has no
    /// primary key, more than one, a primary key on a boolean/text field,
    /// no field besides the primary key, duplicate attribute names, or
    /// identifiers that are not plain SQL names.
    pub fn compile(entity: &'static str, def: ModelDef) -> Result<Self, DataError> {
        let ModelDef { table, fields: all } = def;
        sql::check_identifier(&table, "table")?;
        info!(entity, table = %table, "found model");

        let mut seen = HashSet::new();
        let mut primary_key: Option<FieldDescriptor> = None;
        let mut fields = Vec::with_capacity(all.len());
        for field in all {
            sql::check_identifier(field.attribute(), "attribute")?;
            sql::check_identifier(field.column_name(), "column")?;
            if !seen.insert(field.attribute().to_string()) {
                return Err(DataError::configuration(format!(
                    "duplicate field '{}' in {entity}",
                    field.attribute()
                )));
            }
            debug!(entity, "  found mapping: {} ==> {}", field.attribute(), field);
            if field.is_primary_key() {
                if primary_key.is_some() {
                    return Err(DataError::configuration(format!(
                        "duplicate primary key for field: {} in {entity}",
                        field.attribute()
                    )));
                }
                if !field.kind().can_be_primary_key() {
                    return Err(DataError::configuration(format!(
                        "field {} of {entity} cannot be a primary key ({:?})",
                        field.attribute(),
                        field.kind()
                    )));
                }
                primary_key = Some(field);
            } else {
                fields.push(field);
            }
        }
        let primary_key = primary_key.ok_or_else(|| {
            DataError::configuration(format!("primary key not found for {entity}"))
        })?;
        if fields.is_empty() {
            return Err(DataError::configuration(format!(
                "{entity} maps no field besides its primary key"
            )));
        }

        let select = sql::select_template(&table, &primary_key, &fields);
        let insert = sql::insert_template(&table, &primary_key, &fields);
        let update = sql::update_template(&table, &primary_key, &fields);
        let delete = sql::delete_template(&table, &primary_key);

        Ok(Self {
            entity,
            table,
            primary_key,
            fields,
            select,
            insert,
            update,
            delete,
        })
    }

    /// Rust type name of the entity.
    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key(&self) -> &FieldDescriptor {
        &self.primary_key
    }

    /// Non-key fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Look up any field, primary key included, by attribute name.
    pub fn field(&self, attribute: &str) -> Option<&FieldDescriptor> {
        std::iter::once(&self.primary_key)
            .chain(self.fields.iter())
            .find(|f| f.attribute() == attribute)
    }

    pub fn select_sql(&self) -> &str {
        &self.select
    }

    pub fn insert_sql(&self) -> &str {
        &self.insert
    }

    pub fn update_sql(&self) -> &str {
        &self.update
    }

    pub fn delete_sql(&self) -> &str {
        &self.delete
    }
}
