//! Model schema definition and validation.
//!
//! A [`ModelSchema`] is the resolved description of one model: its fields,
//! the non-model custom types those fields reach, and its ordered
//! authorization rules. Documents are built from it; it is never mutated
//! by the engine.

use crate::{error::Result, Error};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the primary key field every model carries.
pub const ID_FIELD: &str = "id";

/// Field types supported in schemas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    Id,
    String,
    Int,
    Float,
    Boolean,
    AwsDate,
    AwsTime,
    AwsDateTime,
    AwsTimestamp,
    AwsEmail,
    AwsJson,
    AwsUrl,
    AwsPhone,
    AwsIpAddress,
    /// A GraphQL enum, sent as its symbol name
    Enum(String),
    /// A non-model type, expanded inline in selection sets
    CustomType(String),
    /// Another model, selected by its identifier only
    Model(String),
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::Id => write!(f, "ID"),
            FieldType::String => write!(f, "String"),
            FieldType::Int => write!(f, "Int"),
            FieldType::Float => write!(f, "Float"),
            FieldType::Boolean => write!(f, "Boolean"),
            FieldType::AwsDate => write!(f, "AWSDate"),
            FieldType::AwsTime => write!(f, "AWSTime"),
            FieldType::AwsDateTime => write!(f, "AWSDateTime"),
            FieldType::AwsTimestamp => write!(f, "AWSTimestamp"),
            FieldType::AwsEmail => write!(f, "AWSEmail"),
            FieldType::AwsJson => write!(f, "AWSJSON"),
            FieldType::AwsUrl => write!(f, "AWSURL"),
            FieldType::AwsPhone => write!(f, "AWSPhone"),
            FieldType::AwsIpAddress => write!(f, "AWSIPAddress"),
            FieldType::Enum(name) | FieldType::CustomType(name) | FieldType::Model(name) => {
                write!(f, "{}", name)
            }
        }
    }
}

/// How a model-typed field relates to the other model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Association {
    /// This model holds the foreign key, stored under `target_name`.
    BelongsTo { target_name: String },
    /// The other model holds the key; never selected or sent as input.
    HasMany,
}

/// Definition of a field in a model or custom type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelField {
    /// Field name
    pub name: String,
    /// Field type
    pub field_type: FieldType,
    /// Whether this field is required
    pub required: bool,
    /// Whether this field holds a list
    #[serde(default)]
    pub is_array: bool,
    /// Server-managed field, never sent as mutation input
    #[serde(default)]
    pub read_only: bool,
    /// Relationship metadata for model-typed fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub association: Option<Association>,
}

impl ModelField {
    /// Create a new required field definition.
    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: true,
            is_array: false,
            read_only: false,
            association: None,
        }
    }

    /// Create a new optional field definition.
    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            required: false,
            ..Self::required(name, field_type)
        }
    }

    /// A reference to another model whose key lives on this model.
    pub fn belongs_to(
        name: impl Into<String>,
        model: impl Into<String>,
        target_name: impl Into<String>,
    ) -> Self {
        Self {
            association: Some(Association::BelongsTo {
                target_name: target_name.into(),
            }),
            ..Self::optional(name, FieldType::Model(model.into()))
        }
    }

    /// A one-to-many connection owned by the other model.
    pub fn has_many(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            is_array: true,
            association: Some(Association::HasMany),
            ..Self::optional(name, FieldType::Model(model.into()))
        }
    }

    /// Mark the field as a list.
    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    /// Mark the field as server-managed.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Whether the field is a has-many connection.
    pub fn is_has_many(&self) -> bool {
        matches!(self.association, Some(Association::HasMany))
    }

    /// Foreign key name for a belongs-to reference.
    pub fn target_name(&self) -> Option<&str> {
        match &self.association {
            Some(Association::BelongsTo { target_name }) => Some(target_name),
            _ => None,
        }
    }
}

/// A non-model type nested inside a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTypeSchema {
    /// Type name
    pub name: String,
    /// Field definitions
    pub fields: Vec<ModelField>,
}

impl CustomTypeSchema {
    /// Create a new custom type schema.
    pub fn new(name: impl Into<String>, fields: Vec<ModelField>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

/// Authorization strategy of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthStrategy {
    /// Access granted when a claim matches a field of the record
    Owner,
    /// Access granted to members of named groups
    Group,
    /// Any signed-in caller
    Private,
    /// Anyone
    Public,
    /// Delegated to a custom authorizer
    Custom,
}

/// Credential provider that backs a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthProvider {
    UserPools,
    Oidc,
    Iam,
    ApiKey,
    Function,
}

fn default_owner_field() -> String {
    "owner".to_string()
}

fn default_identity_claim() -> String {
    "username".to_string()
}

fn default_group_claim() -> String {
    "cognito:groups".to_string()
}

/// An authorization rule declared on a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRule {
    pub strategy: AuthStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<AuthProvider>,
    /// Record field compared against the identity claim (owner rules)
    #[serde(default = "default_owner_field")]
    pub owner_field: String,
    /// Claim holding the caller's identity (owner rules)
    #[serde(default = "default_identity_claim")]
    pub identity_claim: String,
    /// Claim holding the caller's groups (group rules)
    #[serde(default = "default_group_claim")]
    pub group_claim: String,
    /// Groups granted access (group rules)
    #[serde(default)]
    pub groups: Vec<String>,
}

impl AuthRule {
    fn with_strategy(strategy: AuthStrategy) -> Self {
        Self {
            strategy,
            provider: None,
            owner_field: default_owner_field(),
            identity_claim: default_identity_claim(),
            group_claim: default_group_claim(),
            groups: Vec::new(),
        }
    }

    pub fn owner() -> Self {
        Self::with_strategy(AuthStrategy::Owner)
    }

    pub fn public() -> Self {
        Self::with_strategy(AuthStrategy::Public)
    }

    pub fn private() -> Self {
        Self::with_strategy(AuthStrategy::Private)
    }

    pub fn custom() -> Self {
        Self::with_strategy(AuthStrategy::Custom)
    }

    pub fn groups<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            groups: groups.into_iter().map(Into::into).collect(),
            ..Self::with_strategy(AuthStrategy::Group)
        }
    }

    pub fn with_provider(mut self, provider: AuthProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_owner_field(mut self, field: impl Into<String>) -> Self {
        self.owner_field = field.into();
        self
    }

    pub fn with_identity_claim(mut self, claim: impl Into<String>) -> Self {
        self.identity_claim = claim.into();
        self
    }

    pub fn is_owner(&self) -> bool {
        self.strategy == AuthStrategy::Owner
    }
}

/// Schema for a single model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSchema {
    /// Model name, e.g. `BlogOwner`
    pub name: String,
    /// Plural form used by list operations; defaults to `name + "s"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plural_name: Option<String>,
    /// Field definitions in declaration order
    pub fields: Vec<ModelField>,
    /// Custom types reachable from this model, by name
    #[serde(default)]
    pub custom_types: BTreeMap<String, CustomTypeSchema>,
    /// Authorization rules in declaration order
    #[serde(default)]
    pub auth_rules: Vec<AuthRule>,
}

impl ModelSchema {
    /// Create a new model schema.
    pub fn new(name: impl Into<String>, fields: Vec<ModelField>) -> Self {
        Self {
            name: name.into(),
            plural_name: None,
            fields,
            custom_types: BTreeMap::new(),
            auth_rules: Vec::new(),
        }
    }

    pub fn with_plural_name(mut self, plural: impl Into<String>) -> Self {
        self.plural_name = Some(plural.into());
        self
    }

    /// Register a custom type reachable from this model.
    pub fn with_custom_type(mut self, custom_type: CustomTypeSchema) -> Self {
        self.custom_types
            .insert(custom_type.name.clone(), custom_type);
        self
    }

    pub fn with_auth_rule(mut self, rule: AuthRule) -> Self {
        self.auth_rules.push(rule);
        self
    }

    /// Plural form of the model name.
    pub fn plural_name(&self) -> String {
        self.plural_name
            .clone()
            .unwrap_or_else(|| format!("{}s", self.name))
    }

    /// Get a field definition by name.
    pub fn field(&self, name: &str) -> Option<&ModelField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Get a custom type definition by name.
    pub fn custom_type(&self, name: &str) -> Option<&CustomTypeSchema> {
        self.custom_types.get(name)
    }

    /// Owner rules in declaration order.
    pub fn owner_rules(&self) -> impl Iterator<Item = &AuthRule> {
        self.auth_rules.iter().filter(|r| r.is_owner())
    }

    pub fn has_owner_rule(&self) -> bool {
        self.owner_rules().next().is_some()
    }

    /// Check that every name is document-safe and every custom type resolves.
    pub fn validate(&self) -> Result<()> {
        self.check_name(&self.name)?;
        self.check_name(&self.plural_name())?;

        for rule in self.owner_rules() {
            self.check_name(&rule.owner_field)?;
        }

        let mut path = Vec::new();
        self.validate_fields(&self.fields, &mut path)
    }

    fn validate_fields<'a>(
        &'a self,
        fields: &'a [ModelField],
        path: &mut Vec<&'a str>,
    ) -> Result<()> {
        for field in fields {
            self.check_name(&field.name)?;
            if let Some(target) = field.target_name() {
                self.check_name(target)?;
            }

            let FieldType::CustomType(type_name) = &field.field_type else {
                continue;
            };
            if path.contains(&type_name.as_str()) {
                return Err(Error::introspection(
                    &self.name,
                    format!("custom type '{}' contains itself", type_name),
                ));
            }
            let custom = self.custom_type(type_name).ok_or_else(|| {
                Error::introspection(&self.name, format!("unknown custom type '{}'", type_name))
            })?;

            path.push(type_name);
            self.validate_fields(&custom.fields, path)?;
            path.pop();
        }
        Ok(())
    }

    fn check_name(&self, name: &str) -> Result<()> {
        if is_graphql_name(name) {
            Ok(())
        } else {
            Err(Error::introspection(
                &self.name,
                format!("'{}' is not a valid GraphQL name", name),
            ))
        }
    }
}

/// `[_A-Za-z][_0-9A-Za-z]*`
pub fn is_graphql_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
