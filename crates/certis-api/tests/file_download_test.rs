//! End-to-end presigned download: upload through the facade, mint a token,
//! redeem it over HTTP, and exercise every rejection path.

use axum::Extension;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use certis_api::{router, AppState};
use certis_core::{AuthContext, ProviderSettings, ProviderType, StorageConfig};
use certis_db::{FileStore, MemoryBlobStore, MemoryFileStore, NewFileRecord};
use certis_services::{build_resolver, ResolverDependencies, ServiceConfig, StorageService};
use certis_storage::UploadFileOptions;
use std::sync::Arc;
use std::time::Duration;
use ulid::Ulid;

struct Harness {
    server: TestServer,
    storage: Arc<StorageService>,
    files: Arc<MemoryFileStore>,
    auth: AuthContext,
}

fn caller() -> AuthContext {
    let org = Ulid::new().to_string();
    AuthContext {
        subject_id: Ulid::new().to_string(),
        organization_id: org.clone(),
        organization_ids: vec![org],
        system_admin: false,
    }
}

/// Database-provider stack with the caller's identity attached to requests.
fn harness_with(auth: AuthContext, attach_identity: bool) -> Harness {
    let mut config = StorageConfig {
        enabled: true,
        ..Default::default()
    };
    config.providers.database = ProviderSettings {
        enabled: true,
        ..Default::default()
    };

    let deps = ResolverDependencies {
        integrations: None,
        blobs: Some(Arc::new(MemoryBlobStore::new())),
    };
    let (clients, resolver) = build_resolver(&config, deps);

    let storage = Arc::new(StorageService::new(ServiceConfig {
        resolver,
        clients,
        issue_download_tokens: true,
        max_upload_size: Some(1024 * 1024),
    }));

    let files = Arc::new(MemoryFileStore::new());
    let state = Arc::new(AppState::new(Arc::clone(&storage), files.clone()));

    let mut app = router(state);
    if attach_identity {
        app = app.layer(Extension(auth.clone()));
    }

    Harness {
        server: TestServer::new(app).expect("test server"),
        storage,
        files,
        auth,
    }
}

/// Upload a payload and mint a presigned URL for it.
async fn presign_payload(harness: &Harness, payload: &'static [u8], duration: Duration) -> String {
    let opts = UploadFileOptions {
        file_name: "evidence.txt".to_string(),
        content_type: "text/plain".to_string(),
        ..Default::default()
    };

    let mut file = harness
        .storage
        .upload(&harness.auth, Box::pin(payload), &opts)
        .await
        .expect("upload");

    let record = harness
        .files
        .create(NewFileRecord {
            provided_file_name: "evidence.txt".to_string(),
            detected_content_type: "text/plain".to_string(),
            organization_id: harness.auth.organization_id.clone(),
        })
        .await
        .expect("record");

    harness
        .files
        .update_storage_metadata(
            &record.id,
            ProviderType::Database,
            &file.metadata.bucket,
            &file.metadata.key,
            file.metadata.size,
            "text/plain",
        )
        .await
        .expect("metadata");

    file.id = record.id;

    harness
        .storage
        .presigned_url(&harness.auth, &file, duration)
        .await
        .expect("presign")
}

#[tokio::test]
async fn presigned_download_happy_path() {
    let harness = harness_with(caller(), true);
    let url = presign_payload(&harness, b"twenty bytes exactly", Duration::from_secs(60)).await;

    // the token half of the query carries exactly one separator
    let encoded = url.split("token=").nth(1).unwrap();
    let decoded = urlencoding::decode(encoded).unwrap();
    assert_eq!(decoded.matches('.').count(), 1);

    let response = harness.server.get(&url).await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.as_bytes().as_ref(), &b"twenty bytes exactly"[..]);
    assert_eq!(
        response.header("content-disposition"),
        "attachment; filename=\"evidence.txt\""
    );
    assert_eq!(response.header("content-type"), "text/plain");

    // tokens stay redeemable until expiry
    let again = harness.server.get(&url).await;
    assert_eq!(again.status_code(), 200);
}

#[tokio::test]
async fn tampered_signature_is_unauthorized() {
    let harness = harness_with(caller(), true);
    let url = presign_payload(&harness, b"twenty bytes exactly", Duration::from_secs(60)).await;

    let (base, encoded) = url.split_once("token=").unwrap();
    let decoded = urlencoding::decode(encoded).unwrap().into_owned();
    let (signature, payload) = decoded.split_once('.').unwrap();

    // flip the first signature character
    let mut flipped: String = signature.to_string();
    let replacement = if flipped.starts_with('A') { 'B' } else { 'A' };
    flipped.replace_range(0..1, &replacement.to_string());

    let tampered = format!(
        "{}token={}",
        base,
        urlencoding::encode(&format!("{flipped}.{payload}"))
    );

    let response = harness.server.get(&tampered).await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn expired_token_is_unauthorized() {
    let harness = harness_with(caller(), true);
    let url = presign_payload(&harness, b"twenty bytes exactly", Duration::from_secs(1)).await;

    tokio::time::sleep(Duration::from_millis(1200)).await;

    let response = harness.server.get(&url).await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn anonymous_caller_cannot_redeem_user_bound_token() {
    let auth = caller();
    let signed_in = harness_with(auth.clone(), true);
    let url = presign_payload(&signed_in, b"twenty bytes exactly", Duration::from_secs(60)).await;

    // same state, but requests carry no identity: secret map lives in the
    // same service, so only the authorization check can fail
    let anonymous = TestServer::new(router(Arc::new(AppState::new(
        Arc::clone(&signed_in.storage),
        signed_in.files.clone(),
    ))))
    .expect("test server");

    let response = anonymous.get(&url).await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn wrong_caller_is_unauthorized() {
    let owner = caller();
    let signed_in = harness_with(owner, true);
    let url = presign_payload(&signed_in, b"twenty bytes exactly", Duration::from_secs(60)).await;

    let imposter_app = router(Arc::new(AppState::new(
        Arc::clone(&signed_in.storage),
        signed_in.files.clone(),
    )))
    .layer(Extension(caller()));

    let response = TestServer::new(imposter_app)
        .expect("test server")
        .get(&url)
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn missing_record_is_not_found() {
    let harness = harness_with(caller(), true);
    let url = presign_payload(&harness, b"twenty bytes exactly", Duration::from_secs(60)).await;

    // point the same token at a record id that does not exist
    let rewritten = url.replace(
        url.split("/v1/files/").nth(1).unwrap().split('/').next().unwrap(),
        &Ulid::new().to_string(),
    );

    let response = harness.server.get(&rewritten).await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn record_mismatch_is_unauthorized() {
    let harness = harness_with(caller(), true);
    let url = presign_payload(&harness, b"twenty bytes exactly", Duration::from_secs(60)).await;

    let file_id = url
        .split("/v1/files/")
        .nth(1)
        .unwrap()
        .split('/')
        .next()
        .unwrap();

    // rewrite the stored record so its bucket no longer matches the token
    let mut record = harness.files.get(file_id).await.unwrap().unwrap();
    record.storage_volume = "another-bucket".to_string();
    harness.files.insert(record);

    let response = harness.server.get(&url).await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let harness = harness_with(caller(), true);
    presign_payload(&harness, b"twenty bytes exactly", Duration::from_secs(60)).await;

    let file_id = Ulid::new().to_string();
    let response = harness
        .server
        .get(&format!("/v1/files/{file_id}/download?token=nodothere"))
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn missing_token_is_bad_request() {
    let harness = harness_with(caller(), true);

    let response = harness
        .server
        .get(&format!(
            "/v1/files/{}/download?token=",
            Ulid::new().to_string()
        ))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn multipart_upload_creates_record_and_stores_object() {
    let harness = harness_with(caller(), true);

    let part = Part::bytes(bytes::Bytes::from_static(b"%PDF-1.7 fake pdf"))
        .file_name("audit.pdf")
        .mime_type("application/octet-stream");
    let multipart = MultipartForm::new().add_part("file", part);

    let response = harness.server.post("/v1/files").multipart(multipart).await;
    assert_eq!(response.status_code(), 201);

    let body: serde_json::Value = response.json();
    assert_eq!(body["provider"], "database");
    // octet-stream was replaced by sniffed type
    assert_eq!(body["content_type"], "application/pdf");

    let id = body["id"].as_str().unwrap();
    let record = harness.files.get(id).await.unwrap().unwrap();
    assert_eq!(record.storage_provider, "database");
    assert_eq!(record.size, 17);
}
