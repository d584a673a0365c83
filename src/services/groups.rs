use crate::client::Client;
use crate::http::context::Context;
use crate::http::error::Error;
use crate::http::request::add_options;
use crate::http::{ListOptions, Response};
use crate::services::{get_json, send_json, send_json_discard};
use crate::types::{Group, GroupId, UserId};
use reqwest::Method;
use serde::Serialize;

pub struct Groups<'a> {
    client: &'a Client,
}

impl<'a> Groups<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub fn list(&self) -> GroupList<'a> {
        GroupList {
            client: self.client,
            opts: GroupListOptions::default(),
        }
    }

    pub fn get(&self, id: GroupId) -> GroupGet<'a> {
        GroupGet {
            client: self.client,
            id,
        }
    }

    pub fn create(&self, name: impl Into<String>) -> GroupCreate<'a> {
        GroupCreate {
            client: self.client,
            opts: GroupCreateOptions {
                name: name.into(),
                description: None,
            },
        }
    }

    pub fn add_users(&self, group: GroupId, users: Vec<UserId>) -> GroupAddUsers<'a> {
        GroupAddUsers {
            client: self.client,
            group,
            opts: GroupUsersOptions { user_ids: users },
        }
    }

    pub fn remove_users(&self, group: GroupId, users: Vec<UserId>) -> GroupRemoveUsers<'a> {
        GroupRemoveUsers {
            client: self.client,
            group,
            opts: GroupUsersOptions { user_ids: users },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
struct GroupListOptions {
    name: Option<String>,
    #[serde(flatten)]
    list: ListOptions,
}

pub struct GroupList<'a> {
    client: &'a Client,
    opts: GroupListOptions,
}

impl GroupList<'_> {
    /// Only groups whose name contains `name`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.opts.name = Some(name.into());
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

    pub async fn send(self, ctx: &Context) -> Result<(Vec<Group>, Response), Error> {
        let path = add_options(&self.client.team_path("groups"), Some(&self.opts))?;
        get_json(self.client, ctx, &path).await
    }
}

pub struct GroupGet<'a> {
    client: &'a Client,
    id: GroupId,
}

impl GroupGet<'_> {
    pub async fn send(self, ctx: &Context) -> Result<(Group, Response), Error> {
        let path = self.client.team_path(&format!("groups/{}", self.id));
        get_json(self.client, ctx, &path).await
    }
}

#[derive(Debug, Clone, Serialize)]
struct GroupCreateOptions {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

pub struct GroupCreate<'a> {
    client: &'a Client,
    opts: GroupCreateOptions,
}

impl GroupCreate<'_> {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.opts.description = Some(description.into());
        self
    }

    pub async fn send(self, ctx: &Context) -> Result<(Group, Response), Error> {
        let path = self.client.team_path("groups");
        send_json(self.client, ctx, Method::POST, &path, &self.opts).await
    }
}

#[derive(Debug, Clone, Serialize)]
struct GroupUsersOptions {
    user_ids: Vec<UserId>,
}

pub struct GroupAddUsers<'a> {
    client: &'a Client,
    group: GroupId,
    opts: GroupUsersOptions,
}

impl GroupAddUsers<'_> {
    pub async fn send(self, ctx: &Context) -> Result<Response, Error> {
        let path = self.client.team_path(&format!("groups/{}/users", self.group));
        send_json_discard(self.client, ctx, Method::POST, &path, &self.opts).await
    }
}

pub struct GroupRemoveUsers<'a> {
    client: &'a Client,
    group: GroupId,
    opts: GroupUsersOptions,
}

impl GroupRemoveUsers<'_> {
    pub async fn send(self, ctx: &Context) -> Result<Response, Error> {
        let path = self.client.team_path(&format!("groups/{}/users", self.group));
        send_json_discard(self.client, ctx, Method::DELETE, &path, &self.opts).await
    }
}
