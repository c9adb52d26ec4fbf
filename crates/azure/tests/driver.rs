//! Azure DevOps driver against a mock Azure DevOps API, driven through the
//! neutral client.

use azure::AzureDriver;
use gitprovider::{
    Client, CommitFile, MergeMethod, ProviderError, RepositoryInfo, RepositoryRef, Visibility,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GIT: &str = "/acme/ops/_apis/git";
const HEAD: &str = "1111111111111111111111111111111111111111";
const SECOND: &str = "2222222222222222222222222222222222222222";
const THIRD: &str = "3333333333333333333333333333333333333333";

fn repository_json() -> Value {
    json!({
        "id": "r1",
        "name": "infra",
        "defaultBranch": "refs/heads/main",
        "webUrl": "https://dev.azure.com/acme/ops/_git/infra",
        "project": {"name": "ops", "visibility": "private"},
    })
}

fn pull_request_json(status: &str) -> Value {
    json!({
        "pullRequestId": 5,
        "title": "Add docs",
        "status": status,
        "sourceRefName": "refs/heads/feat",
        "targetRefName": "refs/heads/main",
        "lastMergeSourceCommit": {"commitId": SECOND},
        "repository": {"webUrl": "https://dev.azure.com/acme/ops/_git/infra"},
    })
}

async fn setup() -> (MockServer, Client<AzureDriver>) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{GIT}/repositories/infra")))
        .and(query_param("api-version", "7.0"))
        // Basic base64(":pat")
        .and(header("authorization", "Basic OnBhdA=="))
        .respond_with(ResponseTemplate::new(200).set_body_json(repository_json()))
        .mount(&server)
        .await;

    let driver = AzureDriver::new(&server.uri(), "acme", "ops", Some("pat")).unwrap();
    (server, Client::new(driver))
}

fn infra() -> RepositoryRef {
    RepositoryRef::organization("", "acme", "infra")
}

async fn mount_listing(server: &MockServer, head: &str) {
    Mock::given(method("GET"))
        .and(path(format!("{GIT}/repositories/r1/items")))
        .and(query_param("versionDescriptor.version", "main"))
        .and(query_param("recursionLevel", "OneLevel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "value": [
                {"path": "/", "isFolder": true, "gitObjectType": "tree", "commitId": head},
                {"path": "/README.md", "isFolder": false, "gitObjectType": "blob", "commitId": head},
            ],
        })))
        .mount(server)
        .await;
}

// =============================================================================
// repositories
// =============================================================================

#[tokio::test]
async fn test_repository_is_looked_up_by_bare_name() {
    let (_server, client) = setup().await;

    let repo = client.org_repositories().get(&infra()).await.unwrap();

    let info = repo.info();
    assert_eq!(info.description, None);
    assert_eq!(info.default_branch.as_deref(), Some("main"));
    assert_eq!(info.visibility, Some(Visibility::Private));
    assert_eq!(repo.api_object().id, "r1");
    assert_eq!(client.provider_id().as_str(), "azure-devops");
}

#[tokio::test]
async fn test_references_outside_the_project_do_not_resolve() {
    let (server, client) = setup().await;

    let other_org = RepositoryRef::organization("", "some-other-org", "infra");
    let err = client.org_repositories().get(&other_org).await.unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");

    let user = RepositoryRef::user("", "mallory", "infra");
    let err = client.user_repositories().get(&user).await.unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");

    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty(), "unexpected requests: {requests:?}");
}

#[tokio::test]
async fn test_repository_administration_is_unsupported() {
    let (_server, client) = setup().await;

    let err = client
        .org_repositories()
        .create(&infra(), RepositoryInfo::default())
        .await
        .unwrap_err();

    assert!(err.is_unsupported(), "got {err:?}");
}

// =============================================================================
// commits
// =============================================================================

#[tokio::test]
async fn test_list_page_reports_the_listing_commit() {
    let (server, client) = setup().await;
    mount_listing(&server, HEAD).await;
    let repo = client.org_repositories().get(&infra()).await.unwrap();

    let commits = repo.commits().list_page("main", 0, 1).await.unwrap();

    assert_eq!(commits.len(), 2);
    assert!(commits.iter().all(|c| c.sha().as_str() == HEAD));
}

#[tokio::test]
async fn test_commit_pushes_each_file_on_the_previous_head() {
    let (server, client) = setup().await;
    mount_listing(&server, HEAD).await;
    Mock::given(method("POST"))
        .and(path(format!("{GIT}/repositories/r1/pushes")))
        .and(body_partial_json(json!({
            "refUpdates": [{"name": "refs/heads/main", "oldObjectId": HEAD}],
            "commits": [{"comment": "add files", "changes": [{
                "changeType": "add",
                "item": {"path": "/a.txt"},
                "newContent": {"content": "YQ==", "contentType": "base64encoded"},
            }]}],
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"commits": [{"commitId": SECOND}]})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{GIT}/repositories/r1/pushes")))
        .and(body_partial_json(json!({
            "refUpdates": [{"oldObjectId": SECOND}],
            "commits": [{"changes": [{"item": {"path": "/docs/b.txt"}}]}],
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"commits": [{"commitId": THIRD}]})),
        )
        .expect(1)
        .mount(&server)
        .await;
    let repo = client.org_repositories().get(&infra()).await.unwrap();

    let head = repo
        .commits()
        .create(
            "main",
            "add files",
            &[CommitFile::new("a.txt", "a"), CommitFile::new("docs/b.txt", "b")],
        )
        .await
        .unwrap();

    assert_eq!(head.sha().as_str(), THIRD);
    assert_eq!(head.branch().as_str(), "main");
}

#[tokio::test]
async fn test_stale_push_is_a_backend_error() {
    let (server, client) = setup().await;
    mount_listing(&server, HEAD).await;
    Mock::given(method("POST"))
        .and(path(format!("{GIT}/repositories/r1/pushes")))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "TF401028: The reference 'refs/heads/main' has already been updated by another client",
        })))
        .mount(&server)
        .await;
    let repo = client.org_repositories().get(&infra()).await.unwrap();

    let err = repo
        .commits()
        .create("main", "m", &[CommitFile::new("a.txt", "a")])
        .await
        .unwrap_err();

    match err {
        ProviderError::Backend { status, message } => {
            assert_eq!(status, 409);
            assert!(message.contains("TF401028"), "got {message}");
        }
        other => panic!("expected backend error, got {other:?}"),
    }
}

// =============================================================================
// branches
// =============================================================================

#[tokio::test]
async fn test_create_branch_updates_the_ref_from_zero() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path(format!("{GIT}/repositories/r1/refs")))
        .and(body_partial_json(json!([{
            "name": "refs/heads/feat",
            "oldObjectId": "0000000000000000000000000000000000000000",
            "newObjectId": HEAD,
        }])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "value": [{"name": "refs/heads/feat", "success": true, "updateStatus": "succeeded"}],
        })))
        .expect(1)
        .mount(&server)
        .await;
    let repo = client.org_repositories().get(&infra()).await.unwrap();

    repo.branches().create("feat", HEAD).await.unwrap();
}

#[tokio::test]
async fn test_rejected_ref_update_is_a_conflict() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path(format!("{GIT}/repositories/r1/refs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "value": [{"name": "refs/heads/feat", "success": false, "updateStatus": "staleOldObjectId"}],
        })))
        .mount(&server)
        .await;
    let repo = client.org_repositories().get(&infra()).await.unwrap();

    let err = repo.branches().create("feat", HEAD).await.unwrap_err();

    match err {
        ProviderError::Backend { status, message } => {
            assert_eq!(status, 409);
            assert_eq!(message, "staleOldObjectId");
        }
        other => panic!("expected backend error, got {other:?}"),
    }
}

// =============================================================================
// pull requests
// =============================================================================

#[tokio::test]
async fn test_create_pull_request_uses_source_and_target_refs() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path(format!("{GIT}/repositories/r1/pullrequests")))
        .and(body_partial_json(json!({
            "sourceRefName": "refs/heads/feat",
            "targetRefName": "refs/heads/main",
            "title": "Add docs",
            "description": "body",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(pull_request_json("active")))
        .expect(1)
        .mount(&server)
        .await;
    let repo = client.org_repositories().get(&infra()).await.unwrap();

    let pr = repo
        .pull_requests()
        .create("Add docs", "feat", "main", "body")
        .await
        .unwrap();

    let info = pr.get();
    assert_eq!(info.number.as_u64(), 5);
    assert_eq!((info.head.as_str(), info.base.as_str()), ("feat", "main"));
    assert!(!info.merged);
    assert_eq!(info.web_url, "https://dev.azure.com/acme/ops/_git/infra/pullrequest/5");
}

#[tokio::test]
async fn test_merge_completes_the_pull_request_at_its_source_commit() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path(format!("{GIT}/repositories/r1/pullrequests/5")))
        .respond_with(ResponseTemplate::new(200).set_body_json(pull_request_json("active")))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("{GIT}/repositories/r1/pullrequests/5")))
        .and(body_partial_json(json!({
            "status": "completed",
            "lastMergeSourceCommit": {"commitId": SECOND},
            "completionOptions": {"mergeStrategy": "squash", "mergeCommitMessage": "squashed"},
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(pull_request_json("completed")))
        .expect(1)
        .mount(&server)
        .await;
    let repo = client.org_repositories().get(&infra()).await.unwrap();

    repo.pull_requests()
        .merge(5, MergeMethod::Squash, "squashed")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_list_pull_requests_includes_closed_ones() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path(format!("{GIT}/repositories/r1/pullrequests")))
        .and(query_param("searchCriteria.status", "all"))
        .and(query_param("$skip", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "value": [pull_request_json("active"), pull_request_json("completed")],
        })))
        .mount(&server)
        .await;
    let repo = client.org_repositories().get(&infra()).await.unwrap();

    let prs = repo.pull_requests().list().await.unwrap();

    let merged: Vec<bool> = prs.iter().map(|pr| pr.get().merged).collect();
    assert_eq!(merged, vec![false, true]);
}
