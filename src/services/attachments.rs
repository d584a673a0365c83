use crate::client::Client;
use crate::http::context::Context;
use crate::http::error::Error;
use crate::http::{Response, Target};
use crate::services::send_json;
use crate::types::{Attachment, AttachmentId};
use base64::Engine;
use reqwest::Method;
use serde::Serialize;
use tokio::io::AsyncWrite;

pub struct Attachments<'a> {
    client: &'a Client,
}

impl<'a> Attachments<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub fn upload(&self) -> AttachmentUpload<'a> {
        AttachmentUpload {
            client: self.client,
            payloads: Vec::new(),
        }
    }

    pub fn download(&self, id: AttachmentId) -> AttachmentDownload<'a> {
        AttachmentDownload {
            client: self.client,
            id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct UploadPayload {
    name: String,
    /// base64, standard alphabet
    content: String,
}

pub struct AttachmentUpload<'a> {
    client: &'a Client,
    payloads: Vec<UploadPayload>,
}

impl AttachmentUpload<'_> {
    pub fn add(mut self, name: impl Into<String>, content: &[u8]) -> Self {
        self.payloads.push(UploadPayload {
            name: name.into(),
            content: base64::engine::general_purpose::STANDARD.encode(content),
        });
        self
    }

    pub async fn send(self, ctx: &Context) -> Result<(Vec<Attachment>, Response), Error> {
        let path = self.client.team_path("attachments");
        send_json(self.client, ctx, Method::POST, &path, &self.payloads).await
    }
}

pub struct AttachmentDownload<'a> {
    client: &'a Client,
    id: AttachmentId,
}

impl AttachmentDownload<'_> {
    /// Streams the raw file into `sink`.
    pub async fn send<W>(self, ctx: &Context, sink: &mut W) -> Result<Response, Error>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let path = self.client.team_path(&format!("attachments/{}", self.id));
        let req = self.client.new_request(Method::GET, &path)?;
        self.client.dispatch(&req, ctx, Target::Sink(sink)).await
    }
}
