//! Declared handler signatures.
//!
//! A handler states its parameters once, in order; [`Signature::analyze`]
//! classifies them into the facts the dispatcher needs per request.

use crate::error::RouteError;

/// Kind of a declared handler parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Plain positional parameter. Never bound from the request.
    Positional,
    /// The request context.
    Request,
    /// Variadic positional parameter (`*args`).
    VarPositional,
    /// Keyword-only, no default: must be present in every request.
    Required,
    /// Keyword-only with a default.
    Optional,
    /// Arbitrary keywords (`**kwargs`).
    VarKeyword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
}

/// Ordered parameter list of a handler.
///
/// ```ignore
/// Signature::new()
///     .request()
///     .required("email")
///     .required("passwd")
///     .optional("page")
/// ```
#[derive(Debug, Clone, Default)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.params.push(Param {
            name: name.into(),
            kind,
        });
        self
    }

    pub fn positional(self, name: impl Into<String>) -> Self {
        self.push(name, ParamKind::Positional)
    }

    pub fn request(self) -> Self {
        self.push("request", ParamKind::Request)
    }

    pub fn var_positional(self, name: impl Into<String>) -> Self {
        self.push(name, ParamKind::VarPositional)
    }

    pub fn required(self, name: impl Into<String>) -> Self {
        self.push(name, ParamKind::Required)
    }

    pub fn optional(self, name: impl Into<String>) -> Self {
        self.push(name, ParamKind::Optional)
    }

    pub fn var_keyword(self, name: impl Into<String>) -> Self {
        self.push(name, ParamKind::VarKeyword)
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Classify the parameters.
    ///
    /// Fails when a plain positional parameter follows the request
    /// parameter, or when a name is declared twice. `handler` only
    /// appears in error messages.
    pub fn analyze(&self, handler: &str) -> Result<Classification, RouteError> {
        let mut class = Classification::default();
        let mut seen = std::collections::HashSet::new();
        for param in &self.params {
            if !seen.insert(param.name.as_str()) {
                return Err(RouteError::DuplicateParam {
                    handler: handler.to_string(),
                    param: param.name.clone(),
                });
            }
            if class.has_request && param.kind == ParamKind::Positional {
                return Err(RouteError::RequestNotLast {
                    handler: handler.to_string(),
                    param: param.name.clone(),
                });
            }
            match param.kind {
                ParamKind::Request => class.has_request = true,
                ParamKind::VarKeyword => class.has_var_keyword = true,
                ParamKind::Required => {
                    class.named.push(param.name.clone());
                    class.required.push(param.name.clone());
                }
                ParamKind::Optional => class.named.push(param.name.clone()),
                ParamKind::Positional | ParamKind::VarPositional => {}
            }
        }
        Ok(class)
    }
}

impl std::fmt::Display for Signature {
    /// Comma-separated parameter names, `*args`/`**kwargs` style for variadics.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match param.kind {
                ParamKind::VarPositional => write!(f, "*{}", param.name)?,
                ParamKind::VarKeyword => write!(f, "**{}", param.name)?,
                _ => f.write_str(&param.name)?,
            }
        }
        Ok(())
    }
}

/// What the dispatcher needs to know about a handler, computed once at
/// registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub has_request: bool,
    pub has_var_keyword: bool,
    /// Required and optional keyword names, in declaration order.
    pub named: Vec<String>,
    /// Required keyword names, in declaration order.
    pub required: Vec<String>,
}

impl Classification {
    pub fn has_named_keywords(&self) -> bool {
        !self.named.is_empty()
    }

    /// True when the handler takes anything bound from query or body.
    pub fn accepts_keywords(&self) -> bool {
        self.has_var_keyword || !self.named.is_empty()
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.named.iter().any(|n| n == name)
    }
}
