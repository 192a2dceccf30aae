//! Minimal active-record data layer.
//!
//! Entities describe their table with [`FieldDescriptor`]s; a frozen
//! [`Registry`] compiles those descriptors into [`EntityMetadata`] with
//! prebuilt SQL; [`Orm`] runs find/save/update/remove through any
//! [`Executor`] (see `quill-data-sqlx` for the pooled one).

pub mod dialect;
pub mod entity;
pub mod error;
pub mod executor;
pub mod field;
pub mod model;
pub mod page;
pub mod registry;
pub mod sql;
pub mod value;

pub use dialect::Dialect;
pub use entity::{EntityMetadata, ModelDef};
pub use error::DataError;
pub use executor::Executor;
pub use field::{FieldDefault, FieldDescriptor, FieldKind};
pub use model::{next_id, timestamp, ActiveRecord, FindAll, Limit, Model, Orm};
pub use page::{Page, Paged};
pub use registry::{Registry, RegistryBuilder};
pub use value::{FromSqlValue, Row, SqlValue};

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{
        next_id, timestamp, ActiveRecord, DataError, FieldDescriptor, FindAll, Limit, Model,
        ModelDef, Orm, Page, Paged, Registry, SqlValue,
    };
}
