//! Permission engine.
//!
//! Pure capability resolution for an (account, diagram) pair. No I/O, no
//! failure path: unknown or missing inputs resolve to [`Access::None`].

use crate::models::{Account, Diagram, ShareAccess};

/// Effective capability an account has on a diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Access {
    None,
    View,
    Edit,
}

/// Resolve the effective access of `account` on `diagram`.
///
/// Precedence, first match wins:
/// 1. missing account or diagram -> `None`
/// 2. edit share for the account's email -> `Edit`
/// 3. ownership -> `Edit` (an owner whose global role is `viewer` can still
///    edit their own diagram; the global role governs diagram creation, not
///    access to diagrams one owns)
/// 4. view share for the account's email -> `View`
/// 5. otherwise -> `None`
///
/// A view share never grants edit, even when the account's global role is
/// `editor`: the global role constrains diagram creation, never access to
/// someone else's diagram.
pub fn effective_access(account: Option<&Account>, diagram: Option<&Diagram>) -> Access {
    let (Some(account), Some(diagram)) = (account, diagram) else {
        return Access::None;
    };

    let shared = |access: ShareAccess| {
        diagram
            .shared_with
            .iter()
            .any(|s| s.email == account.email && s.access == access)
    };

    // Edit shares are checked before ownership so an explicit grant is never
    // shadowed by a coarser rule.
    if shared(ShareAccess::Edit) {
        return Access::Edit;
    }
    if diagram.owner_id == account.id {
        return Access::Edit;
    }
    if shared(ShareAccess::View) {
        return Access::View;
    }
    Access::None
}

/// Whether the account may mutate the diagram. A diagram that is merely
/// being created (`None`) is unconditionally editable by its creator.
pub fn can_edit(account: Option<&Account>, diagram: Option<&Diagram>) -> bool {
    match diagram {
        None => true,
        Some(_) => effective_access(account, diagram) == Access::Edit,
    }
}
