//! Request builder.
//!
//! Builds the sync, mutation and subscription documents a client sends for
//! one model. Every builder is pure: the same schema, model and predicate
//! always produce the same document, and any failure aborts the whole
//! build.
//!
//! Record selections list the schema fields sorted by name plus the sync
//! metadata fields `_deleted`, `_lastChangedAt` and `_version`. Custom
//! types are expanded inline, model references are reduced to their `id`,
//! and has-many connections are left out.

use crate::{
    error::Result, filter, sanitize, Error, FieldType, GraphQLRequest, Model, ModelField,
    ModelSchema, OperationType, QueryPredicate, Selection, Timestamp, Version, ID_FIELD,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Soft-delete marker maintained by the backend.
pub const DELETED_FIELD: &str = "_deleted";
/// Last change time maintained by the backend.
pub const LAST_CHANGED_AT_FIELD: &str = "_lastChangedAt";
/// Optimistic-concurrency version maintained by the backend.
pub const VERSION_FIELD: &str = "_version";

/// Which change feed a subscription listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubscriptionType {
    OnCreate,
    OnUpdate,
    OnDelete,
}

impl SubscriptionType {
    fn verb(&self) -> &'static str {
        match self {
            SubscriptionType::OnCreate => "Create",
            SubscriptionType::OnUpdate => "Update",
            SubscriptionType::OnDelete => "Delete",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum MutationType {
    Create,
    Update,
    Delete,
}

impl MutationType {
    fn verb(&self) -> &'static str {
        match self {
            MutationType::Create => "Create",
            MutationType::Update => "Update",
            MutationType::Delete => "Delete",
        }
    }
}

/// Build a base or delta sync query.
///
/// `last_sync` turns a base sync into a delta sync. `limit` bounds the page
/// size; follow-up pages are requested with [`GraphQLRequest::next_page`].
pub fn build_sync_request(
    schema: &ModelSchema,
    last_sync: Option<Timestamp>,
    limit: Option<u32>,
    predicate: &QueryPredicate,
) -> Result<GraphQLRequest> {
    let items = record_selection(schema)?;

    // Sync filters must be a group at the top level.
    let filter = match predicate {
        QueryPredicate::Operation { .. } => {
            filter::compile(&QueryPredicate::and_of(vec![predicate.clone()]))?
        }
        _ => filter::compile(predicate)?,
    };

    let plural = schema.plural_name();
    let mut request = GraphQLRequest::new(
        OperationType::Query,
        format!("Sync{}", plural),
        format!("sync{}", plural),
        &schema.name,
        vec![
            Selection::node("items", items),
            Selection::leaf("nextToken"),
            Selection::leaf("startedAt"),
        ],
    );

    if let Some(last_sync) = last_sync {
        request = request.with_variable("lastSync", "AWSTimestamp", last_sync);
    }
    if let Some(limit) = limit {
        request = request.with_variable("limit", "Int", limit);
    }
    if let Some(filter) = filter {
        request = request.with_variable(
            "filter",
            format!("Model{}FilterInput", schema.name),
            Value::Object(filter),
        );
    }

    Ok(request)
}

/// Build a create mutation for `model`.
pub fn build_creation_request(schema: &ModelSchema, model: &dyn Model) -> Result<GraphQLRequest> {
    let input = mutation_input(schema, model)?;
    mutation(schema, MutationType::Create, input, None)
}

/// Build an update mutation for `model`, guarded by `expected_version` and,
/// unless match-all, by `predicate` as a condition.
pub fn build_update_request(
    schema: &ModelSchema,
    model: &dyn Model,
    expected_version: Version,
    predicate: &QueryPredicate,
) -> Result<GraphQLRequest> {
    let mut input = mutation_input(schema, model)?;
    input.insert(VERSION_FIELD.to_string(), expected_version.into());
    let condition = filter::compile(predicate)?;
    mutation(schema, MutationType::Update, input, condition)
}

/// Build a delete mutation for the record `id`.
pub fn build_deletion_request(
    schema: &ModelSchema,
    id: &str,
    expected_version: Version,
    predicate: &QueryPredicate,
) -> Result<GraphQLRequest> {
    let mut input = Map::new();
    input.insert(ID_FIELD.to_string(), id.into());
    input.insert(VERSION_FIELD.to_string(), expected_version.into());
    let condition = filter::compile(predicate)?;
    mutation(schema, MutationType::Delete, input, condition)
}

/// Build a subscription for one change feed of the model.
pub fn build_subscription_request(
    schema: &ModelSchema,
    subscription_type: SubscriptionType,
) -> Result<GraphQLRequest> {
    let selection = record_selection(schema)?;
    let verb = subscription_type.verb();
    Ok(GraphQLRequest::new(
        OperationType::Subscription,
        format!("On{}{}", verb, schema.name),
        format!("on{}{}", verb, schema.name),
        &schema.name,
        selection,
    ))
}

fn mutation(
    schema: &ModelSchema,
    mutation_type: MutationType,
    input: Map<String, Value>,
    condition: Option<Map<String, Value>>,
) -> Result<GraphQLRequest> {
    let selection = record_selection(schema)?;
    let verb = mutation_type.verb();

    let mut request = GraphQLRequest::new(
        OperationType::Mutation,
        format!("{}{}", verb, schema.name),
        format!("{}{}", verb.to_lowercase(), schema.name),
        &schema.name,
        selection,
    )
    .with_variable(
        "input",
        format!("{}{}Input!", verb, schema.name),
        Value::Object(input),
    );

    if let Some(condition) = condition {
        request = request.with_variable(
            "condition",
            format!("Model{}ConditionInput", schema.name),
            Value::Object(condition),
        );
    }

    Ok(request)
}

/// Field values of `model` keyed the way the mutation input expects them.
fn mutation_input(schema: &ModelSchema, model: &dyn Model) -> Result<Map<String, Value>> {
    schema.validate()?;
    if model.model_name() != schema.name {
        return Err(Error::field_access(
            &schema.name,
            ID_FIELD,
            format!("record '{}' is a '{}'", model.id(), model.model_name()),
        ));
    }

    let mut input = Map::new();
    for field in &schema.fields {
        if field.read_only || field.is_has_many() {
            continue;
        }
        let Some(value) = model.field_value(&field.name)? else {
            continue;
        };

        match field.target_name() {
            Some(target) => {
                let id = reference_id(schema, field, value)?;
                input.insert(target.to_string(), id);
            }
            None => {
                if field.is_array && !(value.is_array() || value.is_null()) {
                    let error = Error::field_access(&schema.name, &field.name, "expected a list");
                    return Err(error);
                }
                input.insert(field.name.clone(), value);
            }
        }
    }

    sanitize::remove_null_owner_fields(schema, &mut input);
    Ok(input)
}

/// The key a belongs-to reference contributes to the input.
fn reference_id(schema: &ModelSchema, field: &ModelField, value: Value) -> Result<Value> {
    match value {
        Value::Null | Value::String(_) => Ok(value),
        Value::Object(mut reference) => match reference.remove(ID_FIELD) {
            Some(id @ Value::String(_)) => Ok(id),
            _ => Err(Error::field_access(
                &schema.name,
                &field.name,
                "referenced model has no id",
            )),
        },
        _ => Err(Error::field_access(
            &schema.name,
            &field.name,
            "expected a model reference",
        )),
    }
}

fn record_selection(schema: &ModelSchema) -> Result<Vec<Selection>> {
    schema.validate()?;

    let mut selection = field_selections(schema, &schema.fields)?;
    selection.extend(
        [DELETED_FIELD, LAST_CHANGED_AT_FIELD, VERSION_FIELD]
            .into_iter()
            .map(Selection::leaf),
    );
    selection.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(selection)
}

fn field_selections(schema: &ModelSchema, fields: &[ModelField]) -> Result<Vec<Selection>> {
    let mut selection = Vec::with_capacity(fields.len());
    for field in fields {
        if field.is_has_many() {
            continue;
        }
        let entry = match &field.field_type {
            FieldType::CustomType(type_name) => {
                let custom = schema.custom_type(type_name).ok_or_else(|| {
                    Error::introspection(
                        &schema.name,
                        format!("unknown custom type '{}'", type_name),
                    )
                })?;
                Selection::node(&field.name, field_selections(schema, &custom.fields)?)
            }
            FieldType::Model(_) => Selection::node(&field.name, vec![Selection::leaf(ID_FIELD)]),
            _ => Selection::leaf(&field.name),
        };
        selection.push(entry);
    }
    selection.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(selection)
}
