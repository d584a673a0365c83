use crate::client::Client;
use crate::http::context::Context;
use crate::http::error::Error;
use crate::http::Response;
use crate::services::get_json;
use crate::types::Tag;

pub struct Tags<'a> {
    client: &'a Client,
}

impl<'a> Tags<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub fn list(&self) -> TagList<'a> {
        TagList {
            client: self.client,
        }
    }
}

pub struct TagList<'a> {
    client: &'a Client,
}

impl TagList<'_> {
    pub async fn send(self, ctx: &Context) -> Result<(Vec<Tag>, Response), Error> {
        get_json(self.client, ctx, &self.client.team_path("tags")).await
    }
}
