//! Sample data for local development.

use tracing::info;

use crate::auth::password::hash_password;
use crate::error::Result;
use crate::models::{Permission, Role, User};
use crate::services::{DocumentService, NewDocument};

pub const SAMPLE_PASSWORD: &str = "password123";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub documents: usize,
}

const USERS: [(&str, &str, Role); 3] = [
    ("John Doe", "john@example.com", Role::Admin),
    ("Jane Smith", "jane@example.com", Role::User),
    ("Bob Johnson", "bob@example.com", Role::User),
];

/// Creates the sample users (skipping any whose email exists) and, on a
/// database without documents, a handful of documents with shares and
/// mentions.
pub async fn seed(docs: &DocumentService) -> Result<SeedReport> {
    let store = docs.store();
    let mut report = SeedReport::default();
    let hash = hash_password(SAMPLE_PASSWORD)?;

    let mut users: Vec<User> = Vec::with_capacity(USERS.len());
    for (name, email, role) in USERS {
        let user = match store.find_user_by_email(email).await? {
            Some(user) => user,
            None => {
                report.users += 1;
                store.create_user(name, email, &hash, role).await?
            }
        };
        users.push(user);
    }
    let [john, jane, bob] = [users[0].id, users[1].id, users[2].id];

    if store.documents_by_author(john, Default::default()).await?.total > 0 {
        info!(?report, "sample documents already present");
        return Ok(report);
    }

    docs.create(
        john,
        NewDocument {
            title: "Welcome to the Knowledge Hub".into(),
            content: "<h1>Welcome</h1><p>This is the team's hub for shared knowledge. \
                      Create documents, share them and mention colleagues.</p>"
                .into(),
            is_public: true,
            mentions: vec![],
        },
    )
    .await?;

    let guidelines = docs
        .create(
            john,
            NewDocument {
                title: "Project Guidelines".into(),
                content: "<h1>Project Guidelines</h1><ul><li>Branch from main</li>\
                          <li>Write tests</li><li>Ask @Jane Smith for review</li></ul>"
                    .into(),
                is_public: false,
                mentions: vec![jane],
            },
        )
        .await?;
    docs.share(guidelines.id, john, jane, Permission::Edit).await?;
    docs.share(guidelines.id, john, bob, Permission::View).await?;

    docs.create(
        jane,
        NewDocument {
            title: "API Documentation".into(),
            content: "<h1>API Documentation</h1><p>All requests carry \
                      <code>Authorization: Bearer TOKEN</code>.</p>"
                .into(),
            is_public: true,
            mentions: vec![],
        },
    )
    .await?;

    docs.create(
        bob,
        NewDocument {
            title: "Meeting Notes".into(),
            content: "<h1>Weekly sync</h1><p>Action items for @John Doe.</p>".into(),
            is_public: false,
            mentions: vec![john],
        },
    )
    .await?;

    report.documents = 4;
    info!(?report, "sample data created");
    Ok(report)
}
