use quill_data::prelude::*;
use serde::Serialize;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: Option<String>,
    pub email: Option<String>,
    pub passwd: Option<String>,
    pub admin: Option<bool>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub created_at: Option<f64>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.admin.unwrap_or(false)
    }

    /// Copy for API responses, with the password hash masked.
    pub fn public(&self) -> Self {
        Self {
            passwd: Some("******".to_string()),
            ..self.clone()
        }
    }
}

impl Model for User {
    fn definition() -> ModelDef {
        ModelDef::new("users")
            .field(id_field())
            .field(FieldDescriptor::string("email").ddl("varchar(50)"))
            .field(FieldDescriptor::string("passwd").ddl("varchar(255)"))
            .field(FieldDescriptor::boolean("admin"))
            .field(FieldDescriptor::string("name").ddl("varchar(50)"))
            .field(FieldDescriptor::string("image").ddl("varchar(500)"))
            .field(created_at_field())
    }

    quill_data::model_fields!(id, email, passwd, admin, name, image, created_at);
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Blog {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub user_image: Option<String>,
    pub name: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub created_at: Option<f64>,
}

impl Model for Blog {
    fn definition() -> ModelDef {
        ModelDef::new("blogs")
            .field(id_field())
            .field(FieldDescriptor::string("user_id").ddl("varchar(50)"))
            .field(FieldDescriptor::string("user_name").ddl("varchar(50)"))
            .field(FieldDescriptor::string("user_image").ddl("varchar(500)"))
            .field(FieldDescriptor::string("name").ddl("varchar(50)"))
            .field(FieldDescriptor::string("summary").ddl("varchar(200)"))
            .field(FieldDescriptor::text("content"))
            .field(created_at_field())
    }

    quill_data::model_fields!(id, user_id, user_name, user_image, name, summary, content, created_at);
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub id: Option<String>,
    pub blog_id: Option<String>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub user_image: Option<String>,
    pub content: Option<String>,
    pub created_at: Option<f64>,
}

impl Model for Comment {
    fn definition() -> ModelDef {
        ModelDef::new("comments")
            .field(id_field())
            .field(FieldDescriptor::string("blog_id").ddl("varchar(50)"))
            .field(FieldDescriptor::string("user_id").ddl("varchar(50)"))
            .field(FieldDescriptor::string("user_name").ddl("varchar(50)"))
            .field(FieldDescriptor::string("user_image").ddl("varchar(500)"))
            .field(FieldDescriptor::text("content"))
            .field(created_at_field())
    }

    quill_data::model_fields!(id, blog_id, user_id, user_name, user_image, content, created_at);
}

fn id_field() -> FieldDescriptor {
    FieldDescriptor::string("id")
        .primary_key()
        .ddl("varchar(50)")
        .default_with(|| next_id().into())
}

fn created_at_field() -> FieldDescriptor {
    FieldDescriptor::float("created_at").default_with(|| timestamp().into())
}

/// Registry with every blog entity.
pub fn registry() -> Result<std::sync::Arc<Registry>, DataError> {
    Ok(Registry::builder()
        .register::<User>()?
        .register::<Blog>()?
        .register::<Comment>()?
        .build())
}
