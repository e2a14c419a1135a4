use std::collections::HashMap;
use std::sync::Arc;

use rhoboto::database::model::Feature;
use rhoboto::feature::FeatureRegistry;
use rhoboto::register::MemberRole;
use rhoboto::register::Registrant;
use rhoboto::service::Services;
use rhoboto::service::error::ServiceError;
use rhoboto::service::team_register_service::TeamRegisterSetup;
use rhoboto::sheets::error::SheetsErrorKind;

mod common;

const SPREADSHEET: &str = "https://docs.google.com/spreadsheets/d/ABC123/edit#gid=0";

fn fake_sheets() -> Arc<common::FakeSheets> {
    Arc::new(common::FakeSheets::new().with_spreadsheet("ABC123", "Event 12", &["Sheet1"]))
}

async fn enabled_services(sheets: Arc<common::FakeSheets>) -> Services {
    let services = common::setup_services(sheets);
    services
        .feature_channel
        .enable(common::channel_key(), Feature::TeamRegister)
        .await
        .unwrap();
    services
}

async fn set_up(services: &Services) {
    services
        .team_register
        .setup(
            common::channel_key(),
            &TeamRegisterSetup::from_form(SPREADSHEET, None, None),
        )
        .await
        .unwrap();
}

fn alice() -> Registrant {
    Registrant::new("alice", "Alice")
}

#[tokio::test]
async fn test_setup_creates_default_worksheets() {
    let sheets = fake_sheets();
    let services = enabled_services(sheets.clone()).await;

    let settings = services
        .team_register
        .setup(
            common::channel_key(),
            &TeamRegisterSetup::from_form(SPREADSHEET, None, None),
        )
        .await
        .unwrap();

    assert_eq!(sheets.adds(), 4);
    assert_eq!(
        sheets.worksheet_titles("ABC123"),
        vec!["Sheet1", "Main Team", "Encore Team", "Backup Team", "Team Summary"]
    );
    assert_eq!(settings.config.spreadsheet_id, "ABC123");
    assert_eq!(settings.config.team_worksheet_ids.len(), 3);
    assert!(settings.sheets.missing().is_empty());

    let status = settings.status_text();
    assert!(status.contains(
        "**Spreadsheet:** [Event 12](https://docs.google.com/spreadsheets/d/ABC123)"
    ));
    assert!(status.contains("- Main Team (ID: "));
    assert!(status.contains("**Summary Worksheet**\n- Team Summary (ID: "));
}

#[tokio::test]
async fn test_setup_is_idempotent() {
    let sheets = fake_sheets();
    let services = enabled_services(sheets.clone()).await;

    set_up(&services).await;
    let first = services
        .team_register
        .settings(common::channel_key())
        .await
        .unwrap()
        .unwrap();

    set_up(&services).await;
    let second = services
        .team_register
        .settings(common::channel_key())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(sheets.adds(), 4);
    assert_eq!(first.config.id, second.config.id);
    assert_eq!(first.config.team_worksheet_ids, second.config.team_worksheet_ids);
}

#[tokio::test]
async fn test_setup_uses_existing_custom_titles() {
    let sheets = Arc::new(
        common::FakeSheets::new().with_spreadsheet("ABC123", "Event", &["Day 1", "Overview"]),
    );
    let services = enabled_services(sheets.clone()).await;

    let settings = services
        .team_register
        .setup(
            common::channel_key(),
            &TeamRegisterSetup::from_form("ABC123", Some("Day 1\nDay 2\nDay 1"), Some("Overview")),
        )
        .await
        .unwrap();

    // Only "Day 2" is new; the repeated title is ignored
    assert_eq!(sheets.adds(), 1);
    assert_eq!(settings.sheets.teams.len(), 2);
    assert_eq!(settings.sheets.summary.title(), Some("Overview"));
}

#[tokio::test]
async fn test_setup_rejects_invalid_input_without_remote_calls() {
    let sheets = fake_sheets();
    let services = enabled_services(sheets.clone()).await;

    let err = services
        .team_register
        .setup(
            common::channel_key(),
            &TeamRegisterSetup::from_form("not a link", None, None),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput { .. }));

    let err = services
        .team_register
        .setup(
            common::channel_key(),
            &TeamRegisterSetup::from_form("ABC123", Some("Main\nSummary"), Some("Summary")),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput { .. }));

    assert_eq!(sheets.total_calls(), 0);
}

#[tokio::test]
async fn test_setup_of_missing_spreadsheet_persists_nothing() {
    let sheets = fake_sheets();
    let services = enabled_services(sheets.clone()).await;

    let err = services
        .team_register
        .setup(
            common::channel_key(),
            &TeamRegisterSetup::from_form("MISSING", None, None),
        )
        .await
        .unwrap_err();
    match err {
        ServiceError::SheetsError(e) => assert_eq!(e.kind(), SheetsErrorKind::NotFound),
        other => panic!("unexpected error: {other:?}"),
    }

    let settings = services
        .team_register
        .settings(common::channel_key())
        .await
        .unwrap();
    assert!(settings.is_none());
}

#[tokio::test]
async fn test_setup_requires_enabled_feature() {
    let sheets = fake_sheets();
    let services = common::setup_services(sheets.clone());

    let err = services
        .team_register
        .setup(
            common::channel_key(),
            &TeamRegisterSetup::from_form(SPREADSHEET, None, None),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::FeatureNotEnabled { .. }));
    assert_eq!(sheets.total_calls(), 0);
}

#[tokio::test]
async fn test_register_teams_writes_team_and_summary_worksheets() {
    let sheets = fake_sheets();
    let services = enabled_services(sheets.clone()).await;
    set_up(&services).await;

    let classified = services
        .team_register
        .register_teams(
            common::channel_key(),
            &alice(),
            "main 150/740/33.4\nencore 80/500/36",
        )
        .await
        .unwrap()
        .expect("teams should be registered");
    assert_eq!(classified.main.leader_skill_value, 150);
    assert_eq!(classified.encore.as_ref().map(|t| t.team_power), Some(36.0));

    let main = sheets.grid("ABC123", "Main Team").unwrap();
    assert_eq!(main[0][0], "username");
    assert_eq!(
        main[1],
        vec!["alice", "Alice", "150", "740", "33.4", "main 150/740/33.4"]
    );
    let encore = sheets.grid("ABC123", "Encore Team").unwrap();
    assert_eq!(encore[1][2], "80");

    let summary = sheets.grid("ABC123", "Team Summary").unwrap();
    assert_eq!(
        summary[0],
        vec![
            "username",
            "display_name",
            "encore_roles",
            "Main Team ISV",
            "Main Team Power",
            "Encore Team ISV",
            "Encore Team Power",
            "Backup Team ISV",
            "Backup Team Power"
        ]
    );
    assert_eq!(
        summary[1],
        vec!["alice", "Alice", "", "268", "33.4", "164", "36", "", ""]
    );
}

#[tokio::test]
async fn test_register_teams_replaces_previous_registration() {
    let sheets = fake_sheets();
    let services = enabled_services(sheets.clone()).await;
    set_up(&services).await;
    let key = common::channel_key();

    services
        .team_register
        .register_teams(key, &alice(), "150/740/33.4\n80/500/36")
        .await
        .unwrap();
    services
        .team_register
        .register_teams(key, &alice(), "160/750/30")
        .await
        .unwrap();

    let main = sheets.grid("ABC123", "Main Team").unwrap();
    assert_eq!(main.len(), 2);
    assert_eq!(main[1][2], "160");

    // The encore team is gone, so the row is cleared
    let encore = sheets.grid("ABC123", "Encore Team").unwrap();
    assert!(encore[1].iter().all(|cell| cell.is_empty()));

    let summary = sheets.grid("ABC123", "Team Summary").unwrap();
    assert_eq!(summary.len(), 2);
    assert_eq!(summary[1][5], "");
}

#[tokio::test]
async fn test_register_teams_creates_extra_backup_worksheets() {
    let sheets = fake_sheets();
    let services = enabled_services(sheets.clone()).await;
    set_up(&services).await;

    services
        .team_register
        .register_teams(
            common::channel_key(),
            &alice(),
            "150/740/40\n100/600/30\n90/500/20\n80/400/10",
        )
        .await
        .unwrap();

    let settings = services
        .team_register
        .settings(common::channel_key())
        .await
        .unwrap()
        .unwrap();
    // Main, an empty encore slot and three backups
    assert_eq!(settings.sheets.teams.len(), 5);
    assert_eq!(settings.sheets.teams[3].title(), Some("Team 4"));
    assert_eq!(settings.sheets.teams[4].title(), Some("Team 5"));

    let last_backup = sheets.grid("ABC123", "Team 5").unwrap();
    assert_eq!(last_backup[1][2], "80");
}

#[tokio::test]
async fn test_register_teams_records_encore_roles() {
    let sheets = fake_sheets();
    let services = enabled_services(sheets.clone()).await;
    set_up(&services).await;
    let key = common::channel_key();

    services
        .team_register
        .update_encore_roles(key, &[42])
        .await
        .unwrap();

    let registrant = alice().with_roles(vec![MemberRole {
        id: 42,
        name: "Encore Runner".to_string(),
    }]);
    services
        .team_register
        .register_teams(key, &registrant, "150/740/33.4")
        .await
        .unwrap();

    let summary = sheets.grid("ABC123", "Team Summary").unwrap();
    assert_eq!(summary[1][2], "Encore Runner");
}

#[tokio::test]
async fn test_message_without_teams_is_ignored() {
    let sheets = fake_sheets();
    let services = common::setup_services(sheets.clone());

    // Not even enabled, but nothing to register either
    let result = services
        .team_register
        .register_teams(common::channel_key(), &alice(), "good morning")
        .await
        .unwrap();
    assert!(result.is_none());
    assert_eq!(sheets.total_calls(), 0);
}

#[tokio::test]
async fn test_register_teams_requires_setup() {
    let sheets = fake_sheets();
    let services = enabled_services(sheets.clone()).await;

    let err = services
        .team_register
        .register_teams(common::channel_key(), &alice(), "150/740/33.4")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotConfigured {
            feature: Feature::TeamRegister
        }
    ));
    assert!(err.is_feature_unavailable());
}

#[tokio::test]
async fn test_delete_user_data() {
    let sheets = fake_sheets();
    let services = enabled_services(sheets.clone()).await;
    set_up(&services).await;
    let key = common::channel_key();

    services
        .team_register
        .register_teams(key, &alice(), "150/740/33.4")
        .await
        .unwrap();
    services
        .team_register
        .register_teams(key, &Registrant::new("bob", "Bob"), "120/700/35")
        .await
        .unwrap();

    assert!(services.team_register.delete_user_data(key, "alice").await.unwrap());
    assert!(!services.team_register.delete_user_data(key, "alice").await.unwrap());

    let main = sheets.grid("ABC123", "Main Team").unwrap();
    assert_eq!(main[1][0], "bob");
    assert!(main[2].iter().all(|cell| cell.is_empty()));

    let summary = sheets.grid("ABC123", "Team Summary").unwrap();
    assert_eq!(summary[1][0], "bob");
}

#[tokio::test]
async fn test_refresh_summary_uses_current_members() {
    let sheets = fake_sheets();
    let services = enabled_services(sheets.clone()).await;
    set_up(&services).await;
    let key = common::channel_key();

    services
        .team_register
        .register_teams(key, &alice(), "150/740/33.4")
        .await
        .unwrap();
    services
        .team_register
        .register_teams(key, &Registrant::new("bob", "Bob"), "120/700/35")
        .await
        .unwrap();

    let members = HashMap::from([(
        "alice".to_string(),
        Registrant::new("alice", "Alice Renamed"),
    )]);
    let summary = services
        .team_register
        .refresh_summary(key, &members)
        .await
        .unwrap();

    assert_eq!(
        summary.team_titles,
        vec!["Main Team", "Encore Team", "Backup Team"]
    );
    assert_eq!(summary.rows.len(), 2);
    assert_eq!(summary.rows[0].display_name, "Alice Renamed");
    assert_eq!(summary.rows[1].display_name, "Bob");
    assert_eq!(
        summary.spreadsheet_url,
        "https://docs.google.com/spreadsheets/d/ABC123"
    );

    let grid = sheets.grid("ABC123", "Team Summary").unwrap();
    assert_eq!(grid[1][1], "Alice Renamed");
}

#[tokio::test]
async fn test_deleted_worksheet_is_reported_and_recreated() {
    let sheets = fake_sheets();
    let services = enabled_services(sheets.clone()).await;
    set_up(&services).await;
    let key = common::channel_key();

    sheets.remove_worksheet("ABC123", "Encore Team");
    services.sheets.invalidate("ABC123");

    let settings = services.team_register.settings(key).await.unwrap().unwrap();
    assert_eq!(settings.sheets.missing().len(), 1);
    assert!(settings.status_text().contains("**Not Found** (ID: "));

    services
        .team_register
        .register_teams(key, &alice(), "150/740/33.4")
        .await
        .unwrap();

    let settings = services.team_register.settings(key).await.unwrap().unwrap();
    assert!(settings.sheets.missing().is_empty());
    assert_eq!(settings.sheets.teams[1].title(), Some("Encore Team"));
}

#[tokio::test]
async fn test_clear_removes_settings() {
    let sheets = fake_sheets();
    let services = enabled_services(sheets.clone()).await;
    set_up(&services).await;
    let key = common::channel_key();

    services.team_register.clear(key).await.unwrap();
    assert!(!services.sheets.cache().contains("ABC123"));

    let err = services.team_register.settings(key).await.unwrap_err();
    assert!(matches!(err, ServiceError::FeatureNotEnabled { .. }));

    services
        .feature_channel
        .enable(key, Feature::TeamRegister)
        .await
        .unwrap();
    assert!(services.team_register.settings(key).await.unwrap().is_none());
}

#[tokio::test]
async fn test_setup_on_new_spreadsheet_drops_old_listing() {
    let sheets = Arc::new(
        common::FakeSheets::new()
            .with_spreadsheet("ABC123", "Event 12", &["Sheet1"])
            .with_spreadsheet("DEF456", "Event 13", &[]),
    );
    let services = enabled_services(sheets.clone()).await;
    let key = common::channel_key();
    set_up(&services).await;
    assert!(services.sheets.cache().contains("ABC123"));

    let settings = services
        .team_register
        .setup(key, &TeamRegisterSetup::from_form("DEF456", None, None))
        .await
        .unwrap();
    assert_eq!(settings.config.spreadsheet_id, "DEF456");
    assert!(!services.sheets.cache().contains("ABC123"));

    let fetches = sheets.fetches();
    services.sheets.worksheets("ABC123").await.unwrap();
    assert_eq!(sheets.fetches(), fetches + 1);
}

#[tokio::test]
async fn test_help_text_needs_configured_channel() {
    let sheets = fake_sheets();
    let services = enabled_services(sheets.clone()).await;
    let registry = FeatureRegistry::new(&services);
    let feature = registry.get(Feature::TeamRegister);
    let key = common::channel_key();

    let err = feature.help_text(key, "@rhoboto").await.unwrap_err();
    assert_eq!(err.to_string(), "`team_register` is not configured for this channel.");

    set_up(&services).await;
    let text = feature.help_text(key, "@rhoboto").await.unwrap();
    assert!(text.contains("@rhoboto records the results in [Google Sheets](https://docs.google.com/spreadsheets/d/ABC123)"));
}
