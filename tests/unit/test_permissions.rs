#[cfg(test)]
mod tests {
    use chrono::Utc;
    use flowdeck_core::{
        Access, Account, AccountRole, Diagram, DiagramData, ShareAccess, ShareEntry, can_edit,
        effective_access,
    };

    fn account(id: &str, email: &str, role: AccountRole) -> Account {
        Account::new(id, email, role)
    }

    fn diagram(owner_id: &str, shares: &[(&str, ShareAccess)]) -> Diagram {
        let now = Utc::now();
        let shared_with: Vec<ShareEntry> = shares
            .iter()
            .map(|(email, access)| ShareEntry {
                email: email.to_string(),
                access: *access,
            })
            .collect();
        let shared_emails = shared_with.iter().map(|s| s.email.clone()).collect();
        Diagram {
            id: "d1".to_string(),
            name: "Flow".to_string(),
            owner_id: owner_id.to_string(),
            owner_email: None,
            created_at: now,
            updated_at: now,
            node_count: 0,
            data: DiagramData::default(),
            shared_with,
            shared_emails,
        }
    }

    #[test]
    fn test_missing_account_or_diagram_is_none() {
        let a = account("u1", "u1@x.com", AccountRole::Editor);
        let d = diagram("u1", &[]);
        assert_eq!(effective_access(None, Some(&d)), Access::None);
        assert_eq!(effective_access(Some(&a), None), Access::None);
        assert_eq!(effective_access(None, None), Access::None);
    }

    #[test]
    fn test_owner_always_edits_regardless_of_role() {
        let d = diagram("u1", &[]);
        for role in [AccountRole::Viewer, AccountRole::Editor] {
            let a = account("u1", "u1@x.com", role);
            assert_eq!(effective_access(Some(&a), Some(&d)), Access::Edit);
        }
    }

    #[test]
    fn test_edit_share_beats_viewer_role() {
        let d = diagram("owner", &[("e@x.com", ShareAccess::Edit)]);
        let a = account("u2", "e@x.com", AccountRole::Viewer);
        assert_eq!(effective_access(Some(&a), Some(&d)), Access::Edit);
    }

    #[test]
    fn test_view_share_never_grants_edit_even_to_editors() {
        let d = diagram("owner", &[("v@x.com", ShareAccess::View)]);
        let a = account("u3", "v@x.com", AccountRole::Editor);
        assert_eq!(effective_access(Some(&a), Some(&d)), Access::View);
        assert!(!can_edit(Some(&a), Some(&d)));
    }

    #[test]
    fn test_stranger_gets_none() {
        let d = diagram("owner", &[("v@x.com", ShareAccess::View)]);
        let a = account("u4", "stranger@x.com", AccountRole::Editor);
        assert_eq!(effective_access(Some(&a), Some(&d)), Access::None);
    }

    #[test]
    fn test_edit_share_checked_before_ownership() {
        // Degenerate but legal: the owner also appears in the share list.
        // The explicit edit grant must not be shadowed by a coarser rule.
        let d = diagram("u1", &[("u1@x.com", ShareAccess::Edit)]);
        let a = account("u1", "u1@x.com", AccountRole::Viewer);
        assert_eq!(effective_access(Some(&a), Some(&d)), Access::Edit);
    }

    #[test]
    fn test_duplicate_entries_edit_wins_over_view() {
        // Legacy documents may carry duplicates; any edit entry wins.
        let d = diagram(
            "owner",
            &[("dup@x.com", ShareAccess::View), ("dup@x.com", ShareAccess::Edit)],
        );
        let a = account("u5", "dup@x.com", AccountRole::Viewer);
        assert_eq!(effective_access(Some(&a), Some(&d)), Access::Edit);
    }

    #[test]
    fn test_engine_is_deterministic() {
        let d = diagram("owner", &[("v@x.com", ShareAccess::View)]);
        let a = account("u3", "v@x.com", AccountRole::Viewer);
        let first = effective_access(Some(&a), Some(&d));
        assert_eq!(first, effective_access(Some(&a), Some(&d)));
    }

    #[test]
    fn test_can_edit_unconditional_for_unsaved_diagram() {
        let a = account("u1", "u1@x.com", AccountRole::Viewer);
        assert!(can_edit(Some(&a), None));
    }

    #[test]
    fn test_access_ordering() {
        assert!(Access::None < Access::View);
        assert!(Access::View < Access::Edit);
    }
}
