//! Document access control.
//!
//! Read access is decided by [`resolve`] with a fixed rule order: public
//! documents first, then authentication, authorship and finally share grants.
//! Edit and management rights are derived from the document and the share
//! directly, since a public document resolves to [`AccessBasis::Public`] even
//! for its own author.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{Document, DocumentShare, Permission, UserId};
use crate::storage::Store;

/// Why read access was granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE", tag = "basis", content = "permission")]
pub enum AccessBasis {
    Public,
    Author,
    Share(Permission),
}

/// Why read access was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    AuthenticationRequired,
    Forbidden,
}

impl From<Denial> for Error {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::AuthenticationRequired => {
                Error::unauthenticated("Authentication required to access this document")
            }
            Denial::Forbidden => {
                Error::forbidden("You do not have permission to access this document")
            }
        }
    }
}

/// A granted read, along with the share row when one exists for the requester.
#[derive(Debug, Clone)]
pub struct Access {
    pub basis: AccessBasis,
    pub requester: Option<UserId>,
    pub share: Option<DocumentShare>,
    author_id: UserId,
}

impl Access {
    pub fn is_author(&self) -> bool {
        self.requester == Some(self.author_id)
    }

    /// Author, or holder of an EDIT share.
    pub fn can_edit(&self) -> bool {
        self.is_author()
            || self
                .share
                .as_ref()
                .is_some_and(|s| s.permission == Permission::Edit)
    }

    /// Deleting and managing shares are reserved to the author.
    pub fn can_manage(&self) -> bool {
        self.is_author()
    }
}

/// Applies the read rules given an already-fetched share (if any).
pub fn resolve(
    document: &Document,
    requester: Option<UserId>,
    share: Option<DocumentShare>,
) -> Result<Access, Denial> {
    let share = share.filter(|s| Some(s.user_id) == requester && s.document_id == document.id);
    let access = |basis| Access {
        basis,
        requester,
        share: share.clone(),
        author_id: document.author_id,
    };

    if document.is_public {
        return Ok(access(AccessBasis::Public));
    }
    let Some(user_id) = requester else {
        return Err(Denial::AuthenticationRequired);
    };
    if document.author_id == user_id {
        return Ok(access(AccessBasis::Author));
    }
    match &share {
        Some(s) => Ok(access(AccessBasis::Share(s.permission))),
        None => Err(Denial::Forbidden),
    }
}

/// Store-backed resolution. The share table is only consulted for requesters
/// who are neither anonymous nor the author, except on public documents where
/// the share still decides edit rights.
pub async fn resolve_access(
    store: &Store,
    document: &Document,
    requester: Option<UserId>,
) -> Result<Access> {
    let share = match requester {
        Some(user_id) if user_id != document.author_id => {
            store.find_share(document.id, user_id).await?
        }
        _ => None,
    };
    resolve(document, requester, share).map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn doc(is_public: bool) -> Document {
        Document {
            id: 7,
            title: "Runbook".into(),
            content: "<p>steps</p>".into(),
            is_public,
            author_id: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn share(user_id: UserId, permission: Permission) -> DocumentShare {
        DocumentShare {
            id: 1,
            document_id: 7,
            user_id,
            permission,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn public_document_is_readable_by_anyone() {
        let d = doc(true);
        for requester in [None, Some(1), Some(2)] {
            let access = resolve(&d, requester, None).unwrap();
            assert_eq!(access.basis, AccessBasis::Public);
        }
    }

    #[test]
    fn private_document_requires_authentication() {
        let err = resolve(&doc(false), None, None).unwrap_err();
        assert_eq!(err, Denial::AuthenticationRequired);
    }

    #[test]
    fn private_document_denies_strangers() {
        let err = resolve(&doc(false), Some(2), None).unwrap_err();
        assert_eq!(err, Denial::Forbidden);
    }

    #[test]
    fn author_wins_over_share() {
        let access = resolve(&doc(false), Some(1), None).unwrap();
        assert_eq!(access.basis, AccessBasis::Author);
        assert!(access.can_edit());
        assert!(access.can_manage());
    }

    #[test]
    fn view_share_reads_but_cannot_edit() {
        let access = resolve(&doc(false), Some(2), Some(share(2, Permission::View))).unwrap();
        assert_eq!(access.basis, AccessBasis::Share(Permission::View));
        assert!(!access.can_edit());
        assert!(!access.can_manage());
    }

    #[test]
    fn edit_share_edits_but_cannot_manage() {
        let access = resolve(&doc(false), Some(2), Some(share(2, Permission::Edit))).unwrap();
        assert!(access.can_edit());
        assert!(!access.can_manage());
    }

    #[test]
    fn share_for_another_user_is_ignored() {
        let err = resolve(&doc(false), Some(3), Some(share(2, Permission::Edit))).unwrap_err();
        assert_eq!(err, Denial::Forbidden);
    }

    #[test]
    fn public_document_still_limits_editing() {
        let d = doc(true);
        let author = resolve(&d, Some(1), None).unwrap();
        assert_eq!(author.basis, AccessBasis::Public);
        assert!(author.can_edit());

        let reader = resolve(&d, Some(2), None).unwrap();
        assert!(!reader.can_edit());

        let editor = resolve(&d, Some(2), Some(share(2, Permission::Edit))).unwrap();
        assert!(editor.can_edit());
        assert!(!editor.can_manage());

        let anonymous = resolve(&d, None, None).unwrap();
        assert!(!anonymous.can_edit());
    }
}
