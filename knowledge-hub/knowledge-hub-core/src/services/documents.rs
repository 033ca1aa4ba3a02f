//! Document operations gated by [`crate::access`].

use serde::Serialize;
use tracing::debug;

use crate::access::{resolve_access, Access, AccessBasis};
use crate::error::{Error, Result};
use crate::events::{Event, EventBus};
use crate::models::{
    Document, DocumentId, DocumentMention, DocumentShare, DocumentSummary, NotificationKind, Page,
    PageRequest, Permission, ShareGrant, UserId, UserSummary, VersionEntry,
};
use crate::storage::{DocumentPatch, NewNotification, Store};
use crate::validation;

/// Input for [`DocumentService::create`].
#[derive(Debug, Clone, Default)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
    pub is_public: bool,
    pub mentions: Vec<UserId>,
}

/// A document with everything its page shows.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentDetail {
    #[serde(flatten)]
    pub document: Document,
    pub author: UserSummary,
    pub shares: Vec<ShareGrant>,
    pub mentions: Vec<DocumentMention>,
    pub access: AccessBasis,
}

#[derive(Clone)]
pub struct DocumentService {
    store: Store,
    events: EventBus,
}

impl DocumentService {
    pub fn new(store: Store, events: EventBus) -> Self {
        Self { store, events }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    async fn load(&self, id: DocumentId) -> Result<Document> {
        self.store
            .find_document(id)
            .await?
            .ok_or_else(|| Error::not_found("Document not found"))
    }

    /// Loads the document and checks read access for `requester`.
    async fn open(&self, id: DocumentId, requester: Option<UserId>) -> Result<(Document, Access)> {
        let document = self.load(id).await?;
        let access = resolve_access(&self.store, &document, requester).await?;
        Ok((document, access))
    }

    async fn check_mentions(&self, mentions: &[UserId]) -> Result<Vec<UserId>> {
        let mut ids = mentions.to_vec();
        ids.sort_unstable();
        ids.dedup();
        let missing = self.store.missing_users(&ids).await?;
        if !missing.is_empty() {
            let list = missing
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(Error::validation(format!("Mentioned users not found: {list}")));
        }
        Ok(ids)
    }

    pub async fn create(&self, author: UserId, input: NewDocument) -> Result<Document> {
        let title = validation::title(&input.title)?;
        let content = validation::content(&input.content)?;
        let mentions = self.check_mentions(&input.mentions).await?;

        let document = self
            .store
            .create_document(author, &title, content, input.is_public, &mentions)
            .await?;
        debug!(id = document.id, author, "document created");
        self.events.send(Event::Created {
            id: document.id,
            author,
        });
        Ok(document)
    }

    pub async fn get(&self, id: DocumentId, requester: Option<UserId>) -> Result<DocumentDetail> {
        let (document, access) = self.open(id, requester).await?;
        let author = self
            .store
            .find_user(document.author_id)
            .await?
            .map(|u| UserSummary {
                id: u.id,
                name: u.name,
                email: u.email,
            })
            .ok_or_else(|| Error::not_found("User not found"))?;
        let shares = self.store.share_grants(id).await?;
        let mentions = self.store.document_mentions(id).await?;
        Ok(DocumentDetail {
            document,
            author,
            shares,
            mentions,
            access: access.basis,
        })
    }

    /// Applies a partial update. Only the author or an EDIT grantee may call
    /// this; supplying `content` appends a version.
    pub async fn update(
        &self,
        id: DocumentId,
        user: UserId,
        patch: DocumentPatch,
        mentions: Vec<UserId>,
    ) -> Result<Document> {
        let (_, access) = self.open(id, Some(user)).await?;
        if !access.can_edit() {
            return Err(Error::forbidden("You do not have permission to edit this document"));
        }
        if patch.is_empty() && mentions.is_empty() {
            return Err(Error::validation("No fields to update"));
        }

        let patch = DocumentPatch {
            title: patch.title.as_deref().map(validation::title).transpose()?,
            content: match patch.content.as_deref() {
                Some(c) => Some(validation::content(c)?.to_string()),
                None => None,
            },
            is_public: patch.is_public,
        };
        let mentions = self.check_mentions(&mentions).await?;

        let (document, version) = self
            .store
            .update_document(id, user, &patch, &mentions)
            .await?
            .ok_or_else(|| Error::not_found("Document not found"))?;
        debug!(id, user, ?version, "document updated");
        self.events.send(Event::Updated { id, by: user, version });
        Ok(document)
    }

    pub async fn delete(&self, id: DocumentId, user: UserId) -> Result<()> {
        let (_, access) = self.open(id, Some(user)).await?;
        if !access.can_manage() {
            return Err(Error::forbidden("Only the author can delete this document"));
        }
        if self.store.delete_document(id).await? {
            self.events.send(Event::Deleted { id, by: user });
        }
        Ok(())
    }

    pub async fn list(
        &self,
        requester: Option<UserId>,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<DocumentSummary>> {
        self.store.list_documents(requester, search, page).await
    }

    /// Grants `target` access, replacing any earlier grant, and notifies them.
    pub async fn share(
        &self,
        id: DocumentId,
        user: UserId,
        target: UserId,
        permission: Permission,
    ) -> Result<DocumentShare> {
        let (document, access) = self.open(id, Some(user)).await?;
        if !access.can_manage() {
            return Err(Error::forbidden("Only the author can share this document"));
        }
        if target == document.author_id {
            return Err(Error::validation("Cannot share a document with its author"));
        }
        if self.store.find_user(target).await?.is_none() {
            return Err(Error::not_found("User not found"));
        }

        let notification = NewNotification {
            kind: NotificationKind::Share,
            title: "Document shared with you".to_string(),
            message: format!("Document \"{}\" has been shared with you", document.title),
            data: Some(serde_json::json!({
                "documentId": id,
                "permission": permission,
                "sharedBy": user,
            })),
        };
        let share = self
            .store
            .upsert_share(id, target, permission, Some(&notification))
            .await?;
        self.events.send(Event::Shared {
            id,
            user: target,
            permission,
        });
        Ok(share)
    }

    /// Removing a grant that does not exist still succeeds.
    pub async fn unshare(&self, id: DocumentId, user: UserId, target: UserId) -> Result<()> {
        let (_, access) = self.open(id, Some(user)).await?;
        if !access.can_manage() {
            return Err(Error::forbidden("Only the author can remove shares"));
        }
        if self.store.delete_share(id, target).await? {
            self.events.send(Event::Unshared { id, user: target });
        }
        Ok(())
    }

    pub async fn versions(
        &self,
        id: DocumentId,
        requester: Option<UserId>,
    ) -> Result<Vec<VersionEntry>> {
        self.open(id, requester).await?;
        self.store.version_history(id).await
    }

    pub async fn version(
        &self,
        id: DocumentId,
        version_id: i64,
        requester: Option<UserId>,
    ) -> Result<VersionEntry> {
        self.open(id, requester).await?;
        self.store
            .find_version(id, version_id)
            .await?
            .ok_or_else(|| Error::not_found("Version not found"))
    }
}
