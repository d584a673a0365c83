use crate::client::Client;
use crate::http::context::Context;
use crate::http::error::Error;
use crate::http::Response;
use crate::services::{send_empty, send_json};
use crate::types::{Comment, CommentId, PostId, UserId};
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Serialize;

pub struct Comments<'a> {
    client: &'a Client,
}

impl<'a> Comments<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub fn create(&self, post: PostId, body: impl Into<String>) -> CommentCreate<'a> {
        CommentCreate {
            client: self.client,
            post,
            opts: CommentCreateOptions {
                body: body.into(),
                notice: None,
                author_id: None,
                published_at: None,
            },
        }
    }

    pub fn delete(&self, id: CommentId) -> CommentDelete<'a> {
        CommentDelete {
            client: self.client,
            id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct CommentCreateOptions {
    body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    published_at: Option<DateTime<Utc>>,
}

pub struct CommentCreate<'a> {
    client: &'a Client,
    post: PostId,
    opts: CommentCreateOptions,
}

impl CommentCreate<'_> {
    pub fn notice(mut self, notice: bool) -> Self {
        self.opts.notice = Some(notice);
        self
    }

    pub fn author_id(mut self, author: UserId) -> Self {
        self.opts.author_id = Some(author);
        self
    }

    pub fn published_at(mut self, at: DateTime<Utc>) -> Self {
        self.opts.published_at = Some(at);
        self
    }

    pub async fn send(self, ctx: &Context) -> Result<(Comment, Response), Error> {
        let path = self.client.team_path(&format!("posts/{}/comments", self.post));
        send_json(self.client, ctx, Method::POST, &path, &self.opts).await
    }
}

pub struct CommentDelete<'a> {
    client: &'a Client,
    id: CommentId,
}

impl CommentDelete<'_> {
    pub async fn send(self, ctx: &Context) -> Result<Response, Error> {
        let path = self.client.team_path(&format!("comments/{}", self.id));
        send_empty(self.client, ctx, Method::DELETE, &path).await
    }
}
