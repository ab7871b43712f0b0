use anyhow::Context;

use crate::auth::repo_types::User;
use crate::store::{
    from_document,
    tables::{USERS, USER_EMAIL_INDEX},
    to_document, DocumentStore,
};

impl User {
    /// Find a user by email through the email index.
    pub async fn find_by_email(
        store: &dyn DocumentStore,
        email: &str,
    ) -> anyhow::Result<Option<User>> {
        let docs = store
            .query_by_index(&USERS, USER_EMAIL_INDEX, email)
            .await
            .context("query users by email")?;
        docs.into_iter()
            .next()
            .map(from_document)
            .transpose()
            .context("decode user")
    }

    /// Find a user by primary key.
    pub async fn find_by_id(store: &dyn DocumentStore, id: &str) -> anyhow::Result<Option<User>> {
        let doc = store.get_item(&USERS, id).await.context("get user")?;
        doc.map(from_document).transpose().context("decode user")
    }

    /// Persist a new user record.
    pub async fn create(store: &dyn DocumentStore, user: &User) -> anyhow::Result<()> {
        store
            .put_item(&USERS, to_document(user)?)
            .await
            .context("put user")?;
        Ok(())
    }
}
