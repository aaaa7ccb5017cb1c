use crm_core::db::open_db_in_memory;
use crm_core::model::record::{Record, RecordPatch};
use crm_core::model::workspace::{Workspace, WorkspaceActivationStatus};
use crm_core::repo::record_repo::{RecordListQuery, RecordRepository, SqliteRecordRepository};
use crm_core::repo::workspace_repo::{SqliteWorkspaceRepository, WorkspaceRepository};
use crm_core::repo::RepoError;
use rusqlite::Connection;
use serde_json::json;
use uuid::Uuid;

fn company(name: &str, created_at: i64) -> Record {
    let mut record = Record::new("company").with_value("name", json!(name));
    record.created_at = Some(created_at);
    record
}

#[test]
fn update_merges_patch_into_stored_values() {
    let conn = open_db_in_memory().expect("open db");
    let repo = SqliteRecordRepository::try_new(&conn).expect("record repo");
    let record = company("Acme", 1_000).with_value("employees", json!(10));
    repo.create_record(&record).expect("create");

    let updated = repo
        .update_record("company", record.id, &RecordPatch::single("employees", json!(12)))
        .expect("update");

    assert_eq!(updated.get("employees"), &json!(12));
    assert_eq!(updated.get_str("name"), Some("Acme"));
    let loaded = repo
        .get_record("company", record.id)
        .expect("get")
        .expect("record exists");
    assert_eq!(loaded.values, updated.values);
    assert_eq!(loaded.created_at, Some(1_000));
}

#[test]
fn records_are_scoped_by_object_name() {
    let conn = open_db_in_memory().expect("open db");
    let repo = SqliteRecordRepository::try_new(&conn).expect("record repo");
    let record = company("Acme", 1_000);
    repo.create_record(&record).expect("create");

    assert!(repo
        .get_record("person", record.id)
        .expect("get")
        .is_none());
    let err = repo
        .update_record("person", record.id, &RecordPatch::single("name", json!("x")))
        .expect_err("wrong object");
    assert!(matches!(err, RepoError::NotFound { entity: "record", .. }));
}

#[test]
fn list_orders_by_creation_and_pages() {
    let conn = open_db_in_memory().expect("open db");
    let repo = SqliteRecordRepository::try_new(&conn).expect("record repo");
    for (name, created_at) in [("Second", 2_000), ("First", 1_000), ("Third", 3_000)] {
        repo.create_record(&company(name, created_at)).expect("create");
    }
    repo.create_record(&Record::new("person")).expect("create person");

    let page = repo
        .list_records(&RecordListQuery {
            object_name_singular: "company".to_string(),
            limit: Some(2),
            offset: 1,
        })
        .expect("list");

    let names: Vec<&str> = page.iter().filter_map(|record| record.get_str("name")).collect();
    assert_eq!(names, vec!["Second", "Third"]);
}

#[test]
fn duplicate_create_and_missing_delete_are_semantic_errors() {
    let conn = open_db_in_memory().expect("open db");
    let repo = SqliteRecordRepository::try_new(&conn).expect("record repo");
    let record = company("Acme", 1_000);
    repo.create_record(&record).expect("create");

    assert!(matches!(
        repo.create_record(&record),
        Err(RepoError::Conflict(_))
    ));
    repo.delete_record("company", record.id).expect("delete");
    assert!(matches!(
        repo.delete_record("company", record.id),
        Err(RepoError::NotFound { .. })
    ));
}

#[test]
fn repositories_reject_unmigrated_connections() {
    let conn = Connection::open_in_memory().expect("raw connection");

    assert!(matches!(
        SqliteRecordRepository::try_new(&conn),
        Err(RepoError::UninitializedConnection { .. })
    ));
    assert!(matches!(
        SqliteWorkspaceRepository::try_new(&conn),
        Err(RepoError::UninitializedConnection { .. })
    ));
}

#[test]
fn workspace_activation_and_invite_lookup() {
    let conn = open_db_in_memory().expect("open db");
    let repo = SqliteWorkspaceRepository::try_new(&conn).expect("workspace repo");
    let workspace = Workspace {
        id: Uuid::new_v4(),
        display_name: "Acme".to_string(),
        domain_name: "acme.io".to_string(),
        invite_hash: "invite-acme".to_string(),
        activation_status: WorkspaceActivationStatus::PendingCreation,
    };
    repo.create_workspace(&workspace).expect("create");

    repo.set_activation_status(workspace.id, WorkspaceActivationStatus::Active)
        .expect("activate");
    let found = repo
        .find_by_invite_hash("invite-acme")
        .expect("lookup")
        .expect("workspace exists");
    assert_eq!(found.activation_status, WorkspaceActivationStatus::Active);

    let duplicate_hash = Workspace {
        id: Uuid::new_v4(),
        ..workspace.clone()
    };
    assert!(matches!(
        repo.create_workspace(&duplicate_hash),
        Err(RepoError::Conflict(_))
    ));
    assert!(matches!(
        repo.set_activation_status(Uuid::new_v4(), WorkspaceActivationStatus::Inactive),
        Err(RepoError::NotFound { entity: "workspace", .. })
    ));
    assert_eq!(repo.count_workspaces().expect("count"), 1);
}
