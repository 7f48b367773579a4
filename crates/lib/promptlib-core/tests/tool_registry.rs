mod common;

use std::collections::HashSet;
use std::sync::Arc;

use promptlib_core::registry::JsonObject;
use promptlib_core::{
    CacheConfig,
    CatalogError,
    FixedOperation,
    MetadataCache,
    OperationOutput,
    ToolRegistry,
    ToolTarget,
};
use serde_json::{Value, json};

use common::{FakeCatalog, document};

const FES_BODY: &str = "You are a senior frontend engineer. Build accessible React components.";

fn registry_over(source: FakeCatalog) -> (ToolRegistry<FakeCatalog>, Arc<FakeCatalog>) {
    let source = Arc::new(source);
    let cache = MetadataCache::with_source(source.clone(), CacheConfig::default());
    (ToolRegistry::new(cache), source)
}

fn args(value: Value) -> JsonObject {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

#[tokio::test]
async fn lists_fixed_and_one_derived_operation_per_document() {
    let (registry, _source) = registry_over(FakeCatalog::new(vec![
        document("a.txt", 1),
        document("b.txt", 2),
        document("c.txt", 3),
    ]));

    let operations = registry.list_operations().await.expect("operations");
    let names: HashSet<_> = operations.iter().map(|op| op.name.as_str()).collect();

    assert_eq!(operations.len(), 7);
    assert_eq!(names.len(), 7);
    for (operation, fixed) in operations.iter().zip(FixedOperation::ALL) {
        assert_eq!(operation.target, ToolTarget::Fixed(fixed));
    }
    let derived: Vec<_> = operations
        .iter()
        .filter_map(|op| match &op.target {
            ToolTarget::Document(id) => Some(id.as_str()),
            ToolTarget::Fixed(_) => None,
        })
        .collect();
    assert_eq!(derived, vec!["a.txt", "b.txt", "c.txt"]);
}

#[tokio::test]
async fn empty_catalog_publishes_only_fixed_operations() {
    let (registry, _source) = registry_over(FakeCatalog::new(Vec::new()));

    let operations = registry.list_operations().await.expect("operations");

    assert_eq!(operations.len(), FixedOperation::ALL.len());
}

#[tokio::test]
async fn projection_is_rebuilt_only_when_snapshot_rotates() {
    let (registry, source) = registry_over(FakeCatalog::new(vec![document("a.txt", 1)]));
    assert_eq!(registry.projection_version().await, None);

    registry.list_operations().await.expect("operations");
    registry.list_operations().await.expect("operations");
    assert_eq!(registry.projection_version().await, Some(1));

    source.set_listing(Ok(vec![document("a.txt", 1), document("d.txt", 4)]));
    registry
        .invoke(FixedOperation::RefreshCache.name(), &JsonObject::new())
        .await
        .expect("refresh");
    assert_eq!(registry.projection_version().await, Some(1));

    let operations = registry.list_operations().await.expect("operations");
    assert_eq!(registry.projection_version().await, Some(2));
    assert!(operations.iter().any(|op| op.name == "get_d"));
    assert_eq!(source.list_calls(), 2);
}

#[tokio::test]
async fn colliding_names_refuse_to_publish_but_keep_fixed_operations() {
    let (registry, _source) = registry_over(FakeCatalog::new(vec![
        document("b-c.txt", 1),
        document("b_c.txt", 2),
    ]));

    let listed = registry.list_operations().await;
    let derived = registry.invoke("get_b_c", &JsonObject::new()).await;
    let fixed = registry
        .invoke(FixedOperation::ListPrompts.name(), &JsonObject::new())
        .await;

    assert!(matches!(listed, Err(CatalogError::RegistryConflict { .. })));
    assert!(matches!(derived, Err(CatalogError::RegistryConflict { .. })));
    assert!(matches!(fixed, Ok(OperationOutput::Listing(_))));
}

#[tokio::test]
async fn unknown_operation_is_rejected() {
    let (registry, source) = registry_over(FakeCatalog::new(vec![document("a.txt", 1)]));

    let result = registry.invoke("get_missing", &JsonObject::new()).await;

    assert_eq!(
        result,
        Err(CatalogError::UnknownOperation("get_missing".to_string()))
    );
    assert_eq!(source.fetch_calls(), 0);
}

#[tokio::test]
async fn discovery_operations_never_fetch_content() {
    let (registry, source) = registry_over(FakeCatalog::new(vec![
        document("fes-prompt.txt", 4500),
        document("wizr-be-prompt.txt", 5100),
        document("wizr-ui-prompt.txt", 2800),
    ]));

    let search = registry
        .invoke(
            FixedOperation::SearchPrompts.name(),
            &args(json!({ "keyword": "WIZR" })),
        )
        .await
        .expect("search");
    let described = registry
        .invoke(
            FixedOperation::GetPromptByName.name(),
            &args(json!({ "file_name": "Wizr-BE-Prompt.txt" })),
        )
        .await
        .expect("describe");
    let everything = registry
        .invoke(FixedOperation::SearchPrompts.name(), &JsonObject::new())
        .await
        .expect("empty keyword");

    let OperationOutput::Search(search) = search else {
        panic!("expected search output");
    };
    assert_eq!(search.matches_found, 2);
    assert_eq!(search.prompts[0].file_name, "wizr-be-prompt.txt");

    let described = serde_json::to_value(described).expect("serialize");
    assert_eq!(described["file_name"], "wizr-be-prompt.txt");
    assert_eq!(described["tool_name"], "get_wizr_be_prompt");
    assert_eq!(described["category"], "Backend Development");

    let OperationOutput::Search(everything) = everything else {
        panic!("expected search output");
    };
    assert_eq!(everything.matches_found, 3);

    assert_eq!(source.resolve_calls(), 0);
    assert_eq!(source.fetch_calls(), 0);
    assert_eq!(source.list_calls(), 1);
}

#[tokio::test]
async fn describe_unknown_name_is_not_found() {
    let (registry, _source) = registry_over(FakeCatalog::new(vec![document("a.txt", 1)]));

    let result = registry
        .invoke(
            FixedOperation::GetPromptByName.name(),
            &args(json!({ "file_name": "nope.txt" })),
        )
        .await;

    assert_eq!(result, Err(CatalogError::NotFound("nope.txt".to_string())));
}

#[tokio::test]
async fn wrong_argument_types_are_invalid_arguments() {
    let (registry, _source) = registry_over(FakeCatalog::new(vec![document("a.txt", 1)]));

    let result = registry
        .invoke(
            FixedOperation::SearchPrompts.name(),
            &args(json!({ "keyword": ["ui"] })),
        )
        .await;

    assert!(matches!(result, Err(CatalogError::InvalidArguments(_))));
}

#[tokio::test]
async fn resolver_reports_not_found_without_network() {
    let (registry, source) = registry_over(FakeCatalog::new(vec![document("a.txt", 1)]));
    registry.cache().get_snapshot(false).await.expect("prime cache");

    let result = registry.resolver().fetch("missing.txt").await;

    assert_eq!(result, Err(CatalogError::NotFound("missing.txt".to_string())));
    assert_eq!(source.list_calls(), 1);
    assert_eq!(source.resolve_calls(), 0);
    assert_eq!(source.fetch_calls(), 0);
}

#[tokio::test]
async fn rejected_signed_url_is_expired_not_unreachable() {
    let (registry, source) = registry_over(FakeCatalog::new(vec![document("a.txt", 1)]));
    source.set_body(
        "a.txt",
        Err(CatalogError::ExpiredOrInvalidUrl {
            document: None,
            status: 403,
        }),
    );

    let result = registry.invoke("get_a", &JsonObject::new()).await;

    assert_eq!(
        result,
        Err(CatalogError::ExpiredOrInvalidUrl {
            document: Some("a.txt".to_string()),
            status: 403,
        })
    );
}

#[tokio::test]
async fn network_failures_are_annotated_with_the_document() {
    let (registry, source) = registry_over(FakeCatalog::new(vec![document("a.txt", 1)]));
    source.set_body(
        "a.txt",
        Err(CatalogError::Timeout {
            target: "https://storage.test/prompts/a.txt".to_string(),
            document: None,
        }),
    );

    let err = registry
        .resolver()
        .fetch("a.txt")
        .await
        .expect_err("timeout");

    assert_eq!(err.kind(), "timeout");
    assert_eq!(err.document(), Some("a.txt"));
}

#[tokio::test]
async fn derived_operation_fetches_fresh_content_each_time() {
    let (registry, source) = registry_over(
        FakeCatalog::new(vec![
            document("fes-prompt.txt", 4500),
            document("wizr-be-prompt.txt", 5100),
        ])
        .with_body("fes-prompt.txt", FES_BODY),
    );

    let operations = registry.list_operations().await.expect("operations");
    let fes = operations
        .iter()
        .find(|op| op.name == "get_fes_prompt")
        .expect("derived operation for fes-prompt.txt");
    assert_eq!(fes.target, ToolTarget::Document("fes-prompt.txt".to_string()));
    assert!(fes.description.contains("4500 bytes"));
    assert!(fes.description.contains("2025-08-27"));

    let first = registry
        .invoke("get_fes_prompt", &JsonObject::new())
        .await
        .expect("first invocation");
    let OperationOutput::Content(report) = first else {
        panic!("expected content output");
    };
    assert_eq!(report.file_name, "fes-prompt.txt");
    assert_eq!(report.content, FES_BODY);
    assert_eq!(report.byte_length, FES_BODY.len());
    assert_eq!(report.metadata.size, 4500);

    source.set_body("fes-prompt.txt", Ok("updated body".to_string()));
    let second = registry
        .invoke("get_fes_prompt", &JsonObject::new())
        .await
        .expect("second invocation");
    let OperationOutput::Content(report) = second else {
        panic!("expected content output");
    };
    assert_eq!(report.content, "updated body");

    assert_eq!(source.list_calls(), 1);
    assert_eq!(source.resolve_calls(), 2);
    assert_eq!(source.fetch_calls(), 2);
}

#[tokio::test]
async fn refresh_operation_forces_a_new_listing() {
    let (registry, source) = registry_over(FakeCatalog::new(vec![document("a.txt", 1)]));
    registry.list_operations().await.expect("operations");

    let output = registry
        .invoke(FixedOperation::RefreshCache.name(), &JsonObject::new())
        .await
        .expect("refresh");

    let OperationOutput::Refreshed(report) = output else {
        panic!("expected refresh output");
    };
    assert_eq!(report.version, 2);
    assert_eq!(report.total_prompts, 1);
    assert_eq!(source.list_calls(), 2);
}
