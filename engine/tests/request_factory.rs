//! Document generation tests for the request builders.
//!
//! Fixtures cover a plain model, models with references and connections,
//! and a model with nested custom types.

use serde_json::json;
use syncql_engine::{
    build_creation_request, build_deletion_request, build_subscription_request, build_sync_request,
    build_update_request, CustomTypeSchema, FieldType, ModelField, ModelRecord, ModelSchema,
    QueryField, QueryPredicate, SubscriptionType,
};

fn blog_owner_schema() -> ModelSchema {
    ModelSchema::new(
        "BlogOwner",
        vec![
            ModelField::required("id", FieldType::Id),
            ModelField::required("name", FieldType::String),
            ModelField::optional("wea", FieldType::String),
            ModelField::has_many("blogs", "Blog"),
        ],
    )
}

fn blog_schema() -> ModelSchema {
    ModelSchema::new(
        "Blog",
        vec![
            ModelField::required("id", FieldType::Id),
            ModelField::required("name", FieldType::String),
            ModelField::belongs_to("owner", "BlogOwner", "blogOwnerId"),
            ModelField::has_many("posts", "Post"),
        ],
    )
}

fn post_schema() -> ModelSchema {
    ModelSchema::new(
        "Post",
        vec![
            ModelField::required("id", FieldType::Id),
            ModelField::required("title", FieldType::String),
            ModelField::belongs_to("blog", "Blog", "postBlogId"),
            ModelField::optional("rating", FieldType::Int),
            ModelField::optional("status", FieldType::Enum("PostStatus".into())),
            ModelField::has_many("comments", "Comment"),
        ],
    )
}

fn comment_schema() -> ModelSchema {
    ModelSchema::new(
        "Comment",
        vec![
            ModelField::required("id", FieldType::Id),
            ModelField::required("content", FieldType::String),
            ModelField::belongs_to("post", "Post", "commentPostId"),
        ],
    )
}

fn person_schema() -> ModelSchema {
    ModelSchema::new(
        "Person",
        vec![
            ModelField::required("id", FieldType::Id),
            ModelField::required("first_name", FieldType::String),
            ModelField::optional("last_name", FieldType::String),
            ModelField::optional("age", FieldType::Int),
        ],
    )
    .with_plural_name("People")
}

fn parent_schema() -> ModelSchema {
    ModelSchema::new(
        "Parent",
        vec![
            ModelField::required("id", FieldType::Id),
            ModelField::required("name", FieldType::String),
            ModelField::optional("address", FieldType::CustomType("Address".into())),
            ModelField::optional("children", FieldType::CustomType("Child".into())).array(),
        ],
    )
    .with_custom_type(CustomTypeSchema::new(
        "Address",
        vec![
            ModelField::required("street", FieldType::String),
            ModelField::optional("street2", FieldType::String),
            ModelField::required("city", FieldType::Enum("City".into())),
            ModelField::optional("phonenumber", FieldType::CustomType("Phonenumber".into())),
            ModelField::required("country", FieldType::String),
        ],
    ))
    .with_custom_type(CustomTypeSchema::new(
        "Phonenumber",
        vec![
            ModelField::required("code", FieldType::Int),
            ModelField::required("carrier", FieldType::Int),
            ModelField::required("number", FieldType::Int),
        ],
    ))
    .with_custom_type(CustomTypeSchema::new(
        "Child",
        vec![
            ModelField::required("name", FieldType::String),
            ModelField::optional("address", FieldType::CustomType("Address".into())),
        ],
    ))
}

fn test_parent() -> ModelRecord {
    let address = json!({
        "street": "555 Five Fiver",
        "street2": "township",
        "city": "BO",
        "phonenumber": {"code": 232, "carrier": 54, "number": 11111111},
        "country": "Sierra Leone"
    });
    ModelRecord::new(
        "Parent",
        json!({
            "id": "426f8e8d-ea0f-4839-a73f-6a2a38565ba1",
            "name": "Jane Doe",
            "address": address.clone(),
            "children": [
                {"name": "SAM", "address": address.clone()},
                {"name": "MAS", "address": address}
            ]
        }),
    )
    .unwrap()
}

const PARENT_SELECTION: &str = "    _deleted
    _lastChangedAt
    _version
    address {
      city
      country
      phonenumber {
        carrier
        code
        number
      }
      street
      street2
    }
    children {
      address {
        city
        country
        phonenumber {
          carrier
          code
          number
        }
        street
        street2
      }
      name
    }
    id
    name
";

// ============================================================================
// Sync queries
// ============================================================================

#[test]
fn base_sync_for_blog_owner() {
    let request =
        build_sync_request(&blog_owner_schema(), None, None, &QueryPredicate::all()).unwrap();

    assert_eq!(
        request.content(),
        "\
query SyncBlogOwners {
  syncBlogOwners {
    items {
      _deleted
      _lastChangedAt
      _version
      id
      name
      wea
    }
    nextToken
    startedAt
  }
}
"
    );
    assert!(request.variables().is_empty());
}

#[test]
fn base_sync_for_custom_types() {
    let request =
        build_sync_request(&parent_schema(), None, None, &QueryPredicate::all()).unwrap();

    let items: String = PARENT_SELECTION
        .lines()
        .map(|line| format!("  {}\n", line))
        .collect();
    let expected = format!(
        "query SyncParents {{\n  syncParents {{\n    items {{\n{}    }}\n    nextToken\n    startedAt\n  }}\n}}\n",
        items
    );
    assert_eq!(request.content(), expected);
}

#[test]
fn delta_sync_for_post() {
    let all = QueryPredicate::all();
    let request = build_sync_request(&post_schema(), Some(123123123), None, &all).unwrap();

    assert_eq!(
        request.content(),
        "\
query SyncPosts($lastSync: AWSTimestamp) {
  syncPosts(lastSync: $lastSync) {
    items {
      _deleted
      _lastChangedAt
      _version
      blog {
        id
      }
      id
      rating
      status
      title
    }
    nextToken
    startedAt
  }
}
"
    );
    assert_eq!(request.variables().len(), 1);
    assert_eq!(request.variable("lastSync"), Some(&json!(123123123)));
}

#[test]
fn paginated_sync_for_blog_owners() {
    let all = QueryPredicate::all();
    let request = build_sync_request(&blog_owner_schema(), None, Some(1000), &all).unwrap();

    assert!(request
        .content()
        .starts_with("query SyncBlogOwners($limit: Int) {\n  syncBlogOwners(limit: $limit) {\n"));
    assert!(request.content().contains("\n    nextToken\n"));
    assert_eq!(request.variable("limit"), Some(&json!(1000)));
    assert!(request.variable("lastSync").is_none());

    let next = request.next_page("token-2");
    assert!(next.content().starts_with(
        "query SyncBlogOwners($limit: Int, $nextToken: String) {\n  \
         syncBlogOwners(limit: $limit, nextToken: $nextToken) {\n"
    ));
    assert_eq!(next.variable("nextToken"), Some(&json!("token-2")));
}

#[test]
fn filtered_delta_sync_declares_all_variables() {
    let predicate = QueryField::new("rating")
        .gt(3)
        .and(QueryField::new("title").contains("rust"));
    let request = build_sync_request(&post_schema(), Some(42), Some(10), &predicate).unwrap();

    assert!(request.content().starts_with(
        "query SyncPosts($filter: ModelPostFilterInput, $lastSync: AWSTimestamp, $limit: Int) {\n  \
         syncPosts(filter: $filter, lastSync: $lastSync, limit: $limit) {\n"
    ));
    assert_eq!(
        request.to_json()["variables"],
        json!({
            "filter": {"and": [{"rating": {"gt": 3}}, {"title": {"contains": "rust"}}]},
            "lastSync": 42,
            "limit": 10
        })
    );
}

// ============================================================================
// Mutations
// ============================================================================

#[test]
fn update_blog_owner_with_predicate() {
    let owner = ModelRecord::new(
        "BlogOwner",
        json!({"id": "926d7ee8-4ea5-40c0-8e62-3fb80b2a2edd", "name": "John Doe"}),
    )
    .unwrap();
    let request = build_update_request(
        &blog_owner_schema(),
        &owner,
        42,
        &QueryField::new("wea").contains("ther"),
    )
    .unwrap();

    assert_eq!(
        request.content(),
        "\
mutation UpdateBlogOwner($condition: ModelBlogOwnerConditionInput, $input: UpdateBlogOwnerInput!) {
  updateBlogOwner(condition: $condition, input: $input) {
    _deleted
    _lastChangedAt
    _version
    id
    name
    wea
  }
}
"
    );
    assert_eq!(
        request.to_json()["variables"],
        json!({
            "condition": {"wea": {"contains": "ther"}},
            "input": {
                "id": "926d7ee8-4ea5-40c0-8e62-3fb80b2a2edd",
                "name": "John Doe",
                "_version": 42
            }
        })
    );
}

#[test]
fn update_nested_custom_type_with_predicate() {
    let request = build_update_request(
        &parent_schema(),
        &test_parent(),
        42,
        &QueryField::new("name").contains("Jane Doe"),
    )
    .unwrap();

    let input = request.variable("input").unwrap();
    assert_eq!(input["_version"], json!(42));
    assert_eq!(input["address"]["phonenumber"]["code"], json!(232));
    assert_eq!(input["children"][1]["name"], json!("MAS"));
    assert_eq!(
        request.variable("condition"),
        Some(&json!({"name": {"contains": "Jane Doe"}}))
    );
    let tail = format!("{}  }}\n}}\n", PARENT_SELECTION);
    assert!(request.content().ends_with(&tail));
}

#[test]
fn delete_person_with_predicate() {
    let request =
        build_deletion_request(&person_schema(), "123", 456, &QueryField::new("age").gt(40))
            .unwrap();

    assert_eq!(
        request.content(),
        "\
mutation DeletePerson($condition: ModelPersonConditionInput, $input: DeletePersonInput!) {
  deletePerson(condition: $condition, input: $input) {
    _deleted
    _lastChangedAt
    _version
    age
    first_name
    id
    last_name
  }
}
"
    );
    assert_eq!(
        request.to_json()["variables"],
        json!({
            "condition": {"age": {"gt": 40}},
            "input": {"id": "123", "_version": 456}
        })
    );
}

#[test]
fn create_comment() {
    let comment = ModelRecord::new(
        "Comment",
        json!({
            "id": "426f8e8d-ea0f-4839-a73f-6a2a38565ba1",
            "content": "toast",
            "post": {"id": "9a4295d6-8225-495a-a531-beffc8b7ae7d"}
        }),
    )
    .unwrap();
    let request = build_creation_request(&comment_schema(), &comment).unwrap();

    assert_eq!(
        request.content(),
        "\
mutation CreateComment($input: CreateCommentInput!) {
  createComment(input: $input) {
    _deleted
    _lastChangedAt
    _version
    content
    id
    post {
      id
    }
  }
}
"
    );
    assert_eq!(
        request.variable("input"),
        Some(&json!({
            "commentPostId": "9a4295d6-8225-495a-a531-beffc8b7ae7d",
            "content": "toast",
            "id": "426f8e8d-ea0f-4839-a73f-6a2a38565ba1"
        }))
    );
}

#[test]
fn create_nested_custom_type() {
    let request = build_creation_request(&parent_schema(), &test_parent()).unwrap();

    let expected = "mutation CreateParent($input: CreateParentInput!) {\n  \
                    createParent(input: $input) {\n";
    assert!(request.content().starts_with(expected));
    let input = request.variable("input").unwrap();
    assert_eq!(input["address"]["city"], json!("BO"));
    assert_eq!(input["children"].as_array().unwrap().len(), 2);
    assert!(input.get("_version").is_none());
}

// ============================================================================
// Subscriptions
// ============================================================================

#[test]
fn on_create_blog() {
    let request = build_subscription_request(&blog_schema(), SubscriptionType::OnCreate).unwrap();

    assert_eq!(
        request.content(),
        "\
subscription OnCreateBlog {
  onCreateBlog {
    _deleted
    _lastChangedAt
    _version
    id
    name
    owner {
      id
    }
  }
}
"
    );
    assert!(request.variables().is_empty());
}

#[test]
fn on_create_nested_custom_type() {
    let request =
        build_subscription_request(&parent_schema(), SubscriptionType::OnCreate).unwrap();

    assert_eq!(
        request.content(),
        format!(
            "subscription OnCreateParent {{\n  onCreateParent {{\n{}  }}\n}}\n",
            PARENT_SELECTION
        )
    );
}

#[test]
fn on_update_post() {
    let request = build_subscription_request(&post_schema(), SubscriptionType::OnUpdate).unwrap();

    assert_eq!(request.operation_name(), "OnUpdatePost");
    assert_eq!(request.field(), "onUpdatePost");
    let content = request.content();
    assert!(content.contains("\n    blog {\n      id\n    }\n"));
    assert!(!content.contains("comments"));
}

#[test]
fn on_delete_blog_owner() {
    let request =
        build_subscription_request(&blog_owner_schema(), SubscriptionType::OnDelete).unwrap();

    assert_eq!(
        request.content(),
        "\
subscription OnDeleteBlogOwner {
  onDeleteBlogOwner {
    _deleted
    _lastChangedAt
    _version
    id
    name
    wea
  }
}
"
    );
}

#[test]
fn subscription_selection_matches_sync_items() {
    let sync = build_sync_request(&post_schema(), None, None, &QueryPredicate::all()).unwrap();
    let subscription =
        build_subscription_request(&post_schema(), SubscriptionType::OnCreate).unwrap();

    assert_eq!(sync.selection()[0].name, "items");
    assert_eq!(sync.selection()[0].children, subscription.selection());
}
