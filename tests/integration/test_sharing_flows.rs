//! End-to-end sharing and access-control scenarios, including the accepted
//! last-writer-wins behavior for concurrent saves.

use flowdeck_core::{
    Access, Account, AccountRole, CoreError, DiagramData, DiagramRepository, EditorSession,
    IdentityResolver, MemoryStore, Position, ShareAccess, effective_access,
};
use std::sync::Arc;

fn setup() -> Arc<DiagramRepository> {
    let store = Arc::new(MemoryStore::new());
    let identity = IdentityResolver::new(store.clone());
    Arc::new(DiagramRepository::new(store, identity))
}

fn account(id: &str, email: &str, role: AccountRole) -> Account {
    Account::new(id, email, role)
}

/// Scenario A: an editor creates a diagram with 3 nodes.
#[tokio::test]
async fn test_creation_records_owner_and_node_count() {
    let repo = setup();
    let u = account("U", "u@x.com", AccountRole::Editor);
    let id = repo
        .create(&u, "D", &DiagramData::starter())
        .await
        .unwrap();
    let d = repo.get(&id, &u).await.unwrap();
    assert_eq!(d.node_count, 3);
    assert_eq!(d.owner_id, "U");
}

/// Scenario B: a view share grants read access but no writes.
#[tokio::test]
async fn test_view_share_reads_but_cannot_update() {
    let repo = setup();
    let u = account("U", "u@x.com", AccountRole::Editor);
    let v = account("V", "v@x.com", AccountRole::Editor);
    let id = repo
        .create(&u, "D", &DiagramData::starter())
        .await
        .unwrap();
    repo.share(&id, &u, "v@x.com", ShareAccess::View)
        .await
        .unwrap();

    let d = repo.get(&id, &v).await.unwrap();
    assert_eq!(effective_access(Some(&v), Some(&d)), Access::View);

    let result = repo.update(&id, &v, "Hostile", &DiagramData::default()).await;
    assert_eq!(result, Err(CoreError::PermissionDenied));
    assert_eq!(repo.get(&id, &u).await.unwrap().name, "D");
}

/// Scenario C: an edit share lets a global viewer update the diagram.
#[tokio::test]
async fn test_edit_share_overrides_viewer_role() {
    let repo = setup();
    let u = account("U", "u@x.com", AccountRole::Editor);
    let e = account("E", "e@x.com", AccountRole::Viewer);
    let id = repo
        .create(&u, "D", &DiagramData::starter())
        .await
        .unwrap();
    repo.share(&id, &u, "e@x.com", ShareAccess::Edit)
        .await
        .unwrap();

    repo.update(&id, &e, "Edited by E", &DiagramData::starter())
        .await
        .unwrap();
    assert_eq!(repo.get(&id, &u).await.unwrap().name, "Edited by E");
}

/// Scenario D: a viewer-role owner still fully controls their own diagram.
#[tokio::test]
async fn test_viewer_owner_can_update_and_delete() {
    let repo = setup();
    let o = account("O", "o@x.com", AccountRole::Viewer);
    let id = repo
        .create(&o, "D2", &DiagramData::starter())
        .await
        .unwrap();

    repo.update(&id, &o, "D2 revised", &DiagramData::starter())
        .await
        .unwrap();
    repo.delete(&id, &o).await.unwrap();
    assert!(matches!(
        repo.get(&id, &o).await,
        Err(CoreError::NotFound { .. })
    ));
}

/// Scenario E: edit access via share never permits deletion.
#[tokio::test]
async fn test_shared_editor_cannot_delete() {
    let repo = setup();
    let u = account("U", "u@x.com", AccountRole::Editor);
    let w = account("W", "w@x.com", AccountRole::Editor);
    let id = repo
        .create(&u, "D", &DiagramData::starter())
        .await
        .unwrap();
    repo.share(&id, &u, "w@x.com", ShareAccess::Edit)
        .await
        .unwrap();

    assert_eq!(repo.delete(&id, &w).await, Err(CoreError::PermissionDenied));
    assert!(repo.get(&id, &u).await.is_ok());
}

#[tokio::test]
async fn test_only_owner_may_share() {
    let repo = setup();
    let u = account("U", "u@x.com", AccountRole::Editor);
    let w = account("W", "w@x.com", AccountRole::Editor);
    let id = repo
        .create(&u, "D", &DiagramData::starter())
        .await
        .unwrap();
    repo.share(&id, &u, "w@x.com", ShareAccess::Edit)
        .await
        .unwrap();

    // An editor-by-share may not re-share.
    let result = repo.share(&id, &w, "x@x.com", ShareAccess::View).await;
    assert_eq!(result, Err(CoreError::PermissionDenied));
    assert_eq!(repo.get(&id, &u).await.unwrap().shared_with.len(), 1);
}

#[tokio::test]
async fn test_share_deduplicates_by_email_last_write_wins() {
    let repo = setup();
    let u = account("U", "u@x.com", AccountRole::Editor);
    let id = repo
        .create(&u, "D", &DiagramData::starter())
        .await
        .unwrap();

    repo.share(&id, &u, "p@x.com", ShareAccess::View)
        .await
        .unwrap();
    repo.share(&id, &u, "p@x.com", ShareAccess::Edit)
        .await
        .unwrap();

    let d = repo.get(&id, &u).await.unwrap();
    assert_eq!(d.shared_with.len(), 1);
    assert_eq!(d.shared_with[0].access, ShareAccess::Edit);
    assert_eq!(d.shared_emails, vec!["p@x.com".to_string()]);

    // Downgrade also takes effect; there is still no revocation to none.
    repo.share(&id, &u, "p@x.com", ShareAccess::View)
        .await
        .unwrap();
    let d = repo.get(&id, &u).await.unwrap();
    assert_eq!(d.shared_with[0].access, ShareAccess::View);
}

#[tokio::test]
async fn test_share_rejects_invalid_email() {
    let repo = setup();
    let u = account("U", "u@x.com", AccountRole::Editor);
    let id = repo
        .create(&u, "D", &DiagramData::starter())
        .await
        .unwrap();

    for bad in ["", "   ", "not-an-email"] {
        assert!(matches!(
            repo.share(&id, &u, bad, ShareAccess::View).await,
            Err(CoreError::Validation(_))
        ));
    }
}

#[tokio::test]
async fn test_shared_diagram_appears_in_target_listing() {
    let repo = setup();
    let u = account("U", "u@x.com", AccountRole::Editor);
    let v = account("V", "v@x.com", AccountRole::Viewer);
    let id = repo
        .create(&u, "D", &DiagramData::starter())
        .await
        .unwrap();

    assert!(repo.list_for_account(&v).await.unwrap().is_empty());
    repo.share(&id, &u, "v@x.com", ShareAccess::View)
        .await
        .unwrap();
    let listed = repo.list_for_account(&v).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
}

/// Two sessions on the same diagram resolve concurrent saves by
/// last-writer-wins on the whole document. This can silently drop the
/// earlier writer's nodes; it is the accepted limitation of the model, not
/// a bug.
#[tokio::test]
async fn test_concurrent_saves_last_writer_wins() {
    let repo = setup();
    let u = account("U", "u@x.com", AccountRole::Editor);
    let e = account("E", "e@x.com", AccountRole::Editor);
    let id = repo
        .create(&u, "D", &DiagramData::starter())
        .await
        .unwrap();
    repo.share(&id, &u, "e@x.com", ShareAccess::Edit)
        .await
        .unwrap();

    let mut first = EditorSession::open(repo.clone(), u.clone(), &id).await.unwrap();
    let mut second = EditorSession::open(repo.clone(), e, &id).await.unwrap();

    let kept = first.add_node("From U", Position::new(10.0, 10.0)).unwrap();
    second.add_node("From E", Position::new(20.0, 20.0)).unwrap();

    first.save().await.unwrap();
    second.save().await.unwrap();

    let stored = repo.get(&id, &u).await.unwrap();
    assert_eq!(stored.node_count, 4);
    assert!(stored.data.nodes.iter().any(|n| n.data.label == "From E"));
    // U's node was written first and then silently overwritten.
    assert!(!stored.data.nodes.iter().any(|n| n.id == kept));
}

/// Revoked-in-the-meantime permissions are honored because writes re-fetch
/// before checking: here the share is downgraded between the editor's load
/// and save.
#[tokio::test]
async fn test_update_checks_current_not_cached_permissions() {
    let repo = setup();
    let u = account("U", "u@x.com", AccountRole::Editor);
    let e = account("E", "e@x.com", AccountRole::Editor);
    let id = repo
        .create(&u, "D", &DiagramData::starter())
        .await
        .unwrap();
    repo.share(&id, &u, "e@x.com", ShareAccess::Edit)
        .await
        .unwrap();

    let mut session = EditorSession::open(repo.clone(), e, &id).await.unwrap();
    assert_eq!(session.access(), Access::Edit);
    session.add_node("Late", Position::new(0.0, 0.0)).unwrap();

    repo.share(&id, &u, "e@x.com", ShareAccess::View)
        .await
        .unwrap();

    assert_eq!(session.save().await, Err(CoreError::PermissionDenied));
    assert_eq!(repo.get(&id, &u).await.unwrap().node_count, 3);
}
