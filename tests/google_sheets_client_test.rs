use std::sync::Arc;

use httpmock::prelude::*;
use rhoboto::sheets::SheetsApi;
use rhoboto::sheets::ValueRange;
use rhoboto::sheets::auth::ServiceAccountKey;
use rhoboto::sheets::auth::ServiceAccountTokenProvider;
use rhoboto::sheets::auth::StaticToken;
use rhoboto::sheets::auth::TokenProvider;
use rhoboto::sheets::client::GoogleSheetsClient;
use rhoboto::sheets::client::SheetsClientConfigBuilder;
use rhoboto::sheets::error::SheetsErrorKind;
use serde_json::json;

fn client_for(server: &MockServer) -> GoogleSheetsClient {
    let config = SheetsClientConfigBuilder::default()
        .base_url(server.base_url())
        .build()
        .unwrap();
    let tokens: Arc<dyn TokenProvider> = Arc::new(StaticToken("test-token".to_string()));
    GoogleSheetsClient::new(config, tokens).unwrap()
}

#[tokio::test]
async fn test_fetch_spreadsheet_parses_worksheets() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/v4/spreadsheets/ABC123");
            then.status(200).json_body(json!({
                "spreadsheetId": "ABC123",
                "properties": { "title": "Event 12" },
                "sheets": [
                    { "properties": { "sheetId": 0, "title": "Main Team", "index": 0 } },
                    { "properties": { "sheetId": 917, "title": "Team Summary", "index": 1 } }
                ]
            }));
        })
        .await;

    let spreadsheet = client_for(&server)
        .fetch_spreadsheet("ABC123")
        .await
        .unwrap();

    assert_eq!(spreadsheet.title, "Event 12");
    assert_eq!(spreadsheet.worksheets.len(), 2);
    assert_eq!(spreadsheet.worksheet_by_id(917).unwrap().title, "Team Summary");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_missing_spreadsheet_is_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v4/spreadsheets/MISSING");
            then.status(404).json_body(json!({
                "error": {
                    "code": 404,
                    "message": "Requested entity was not found.",
                    "status": "NOT_FOUND"
                }
            }));
        })
        .await;

    let err = client_for(&server)
        .fetch_spreadsheet("MISSING")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), SheetsErrorKind::NotFound);
    assert!(err.to_string().contains("Requested entity was not found."));
}

#[tokio::test]
async fn test_permission_denied_is_auth_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v4/spreadsheets/PRIVATE");
            then.status(403).json_body(json!({
                "error": { "code": 403, "message": "The caller does not have permission" }
            }));
        })
        .await;

    let err = client_for(&server)
        .fetch_spreadsheet("PRIVATE")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), SheetsErrorKind::Auth);
}

#[tokio::test]
async fn test_add_worksheet_returns_new_handle() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v4/spreadsheets/ABC123:batchUpdate")
                .body_contains("\"title\":\"Main Team\"");
            then.status(200).json_body(json!({
                "spreadsheetId": "ABC123",
                "replies": [{
                    "addSheet": {
                        "properties": { "sheetId": 55, "title": "Main Team", "index": 3 }
                    }
                }]
            }));
        })
        .await;

    let worksheet = client_for(&server)
        .add_worksheet("ABC123", "Main Team")
        .await
        .unwrap();

    assert_eq!(worksheet.id, 55);
    assert_eq!(worksheet.index, 3);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_batch_get_values_stringifies_cells() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v4/spreadsheets/ABC123/values:batchGet");
            then.status(200).json_body(json!({
                "spreadsheetId": "ABC123",
                "valueRanges": [{
                    "range": "'Main Team'!A1:F2",
                    "majorDimension": "ROWS",
                    "values": [
                        ["username", "leader_skill_value"],
                        ["alice", 150, true]
                    ]
                }]
            }));
        })
        .await;

    let grids = client_for(&server)
        .batch_get_values("ABC123", &["'Main Team'".to_string()])
        .await
        .unwrap();

    assert_eq!(grids.len(), 1);
    assert_eq!(grids[0][1], vec!["alice", "150", "true"]);
}

#[tokio::test]
async fn test_batch_get_values_of_empty_range() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v4/spreadsheets/ABC123/values:batchGet");
            then.status(200).json_body(json!({
                "spreadsheetId": "ABC123",
                "valueRanges": [{ "range": "'Encore Team'!A1:Z1000" }]
            }));
        })
        .await;

    let grids = client_for(&server)
        .batch_get_values("ABC123", &["'Encore Team'".to_string()])
        .await
        .unwrap();
    assert_eq!(grids, vec![Vec::<Vec<String>>::new()]);
}

#[tokio::test]
async fn test_batch_update_values_sends_user_entered_rows() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v4/spreadsheets/ABC123/values:batchUpdate")
                .body_contains("\"valueInputOption\":\"USER_ENTERED\"")
                .body_contains("\"range\":\"'Main Team'!A1\"");
            then.status(200).json_body(json!({
                "spreadsheetId": "ABC123",
                "totalUpdatedCells": 2
            }));
        })
        .await;

    client_for(&server)
        .batch_update_values(
            "ABC123",
            &[ValueRange {
                range: "'Main Team'!A1".to_string(),
                values: vec![vec!["username".to_string(), "display_name".to_string()]],
            }],
        )
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rate_limited_request_is_transient() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v4/spreadsheets/ABC123/values:batchUpdate");
            then.status(429).body("Quota exceeded");
        })
        .await;

    let err = client_for(&server)
        .batch_update_values("ABC123", &[])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), SheetsErrorKind::Transient);
}

#[tokio::test]
async fn test_service_account_token_is_exchanged_once() {
    let server = MockServer::start_async().await;
    let token_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/token")
                .body_contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer");
            then.status(200).json_body(json!({
                "access_token": "ya29.fixture",
                "expires_in": 3599,
                "token_type": "Bearer"
            }));
        })
        .await;

    let mut key = ServiceAccountKey::from_file("tests/fixtures/service_account.json").unwrap();
    key.token_uri = server.url("/token");
    let provider = ServiceAccountTokenProvider::new(key).unwrap();

    assert_eq!(provider.access_token().await.unwrap(), "ya29.fixture");
    assert_eq!(provider.access_token().await.unwrap(), "ya29.fixture");
    assert_eq!(
        provider.principal().as_deref(),
        Some("rhoboto-test@rhoboto-test.iam.gserviceaccount.com")
    );
    token_mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_rejected_service_account_is_auth_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/token");
            then.status(400).json_body(json!({ "error": "invalid_grant" }));
        })
        .await;

    let mut key = ServiceAccountKey::from_file("tests/fixtures/service_account.json").unwrap();
    key.token_uri = server.url("/token");
    let provider = ServiceAccountTokenProvider::new(key).unwrap();

    let err = provider.access_token().await.unwrap_err();
    assert_eq!(err.kind(), SheetsErrorKind::Auth);
}
