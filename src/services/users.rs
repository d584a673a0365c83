use crate::client::Client;
use crate::http::context::Context;
use crate::http::error::Error;
use crate::http::request::add_options;
use crate::http::{ListOptions, Response};
use crate::services::get_json;
use crate::types::User;
use serde::Serialize;

pub struct Users<'a> {
    client: &'a Client,
}

impl<'a> Users<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub fn list(&self) -> UserList<'a> {
        UserList {
            client: self.client,
            opts: UserListOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
struct UserListOptions {
    q: Option<String>,
    include_user_groups: Option<bool>,
    #[serde(flatten)]
    list: ListOptions,
}

pub struct UserList<'a> {
    client: &'a Client,
    opts: UserListOptions,
}

impl UserList<'_> {
    pub fn query(mut self, q: impl Into<String>) -> Self {
        self.opts.q = Some(q.into());
        self
    }

    pub fn include_user_groups(mut self, include: bool) -> Self {
        self.opts.include_user_groups = Some(include);
        self
    }

    pub fn page(mut self, page: i64) -> Self {
        self.opts.list.page = Some(page);
        self
    }

    pub fn per_page(mut self, per_page: i64) -> Self {
        self.opts.list.per_page = Some(per_page);
        self
    }

    pub async fn send(self, ctx: &Context) -> Result<(Vec<User>, Response), Error> {
        let path = add_options(&self.client.team_path("users"), Some(&self.opts))?;
        get_json(self.client, ctx, &path).await
    }
}
