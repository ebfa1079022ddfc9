use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, Response, Url, header::AUTHORIZATION};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::{
    backend::{BackendResult, ChatBackend},
    state::{
        content::MessageContent,
        react::{ChannelId, MessageId, UserId},
    },
};

use super::{
    config::DiscordConfig,
    error::{DiscordError, DiscordResult},
    models::{CurrentUser, MessageBody, MessageObject},
};

const USER_AGENT: &str = concat!("DiscordBot (pugbot, ", env!("CARGO_PKG_VERSION"), ")");

/// [`ChatBackend`] speaking Discord's REST API. Requests are not retried.
#[derive(Clone)]
pub struct DiscordBackend {
    client: Client,
    api_base: Arc<Url>,
    token: Arc<str>,
    bot_id: UserId,
}

impl DiscordBackend {
    /// Build the HTTP client and learn the bot's own user id.
    pub async fn connect(config: DiscordConfig) -> DiscordResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| DiscordError::ClientBuilder { source })?;

        let api_base = config.api_base.trim_end_matches('/');
        let api_base = Url::parse(api_base)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| DiscordError::InvalidApiBase {
                api_base: api_base.to_owned(),
            })?;

        let mut backend = Self {
            client,
            api_base: Arc::new(api_base),
            token: Arc::from(config.token),
            bot_id: 0,
        };

        let path = ["users", "@me"].map(String::from);
        let me: CurrentUser = backend.fetch_json(Method::GET, &path).await?;
        backend.bot_id = parse_snowflake(&path, me.id)?;
        info!(bot_id = backend.bot_id, username = %me.username, "connected to Discord");
        Ok(backend)
    }

    fn request(&self, method: Method, path: &[String]) -> DiscordResult<RequestBuilder> {
        let mut url = (*self.api_base).clone();
        url.path_segments_mut()
            .map_err(|_| DiscordError::InvalidApiBase {
                api_base: self.api_base.to_string(),
            })?
            .extend(path);
        Ok(self
            .client
            .request(method, url)
            .header(AUTHORIZATION, format!("Bot {}", self.token)))
    }

    async fn execute(
        &self,
        method: Method,
        path: &[String],
        body: Option<MessageBody<'_>>,
    ) -> DiscordResult<Response> {
        let mut builder = self.request(method, path)?;
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder
            .send()
            .await
            .map_err(|source| DiscordError::RequestSend {
                path: path.join("/"),
                source,
            })?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(DiscordError::RequestStatus {
                path: path.join("/"),
                status: response.status(),
            })
        }
    }

    async fn fetch_json<T>(&self, method: Method, path: &[String]) -> DiscordResult<T>
    where
        T: DeserializeOwned,
    {
        self.execute(method, path, None)
            .await?
            .json::<T>()
            .await
            .map_err(|source| DiscordError::DecodeResponse {
                path: path.join("/"),
                source,
            })
    }

    /// Run a request with no interesting response body on a cloned handle.
    fn spawn(
        &self,
        method: Method,
        path: Vec<String>,
        content: Option<MessageContent>,
    ) -> BoxFuture<'static, BackendResult<()>> {
        let backend = self.clone();
        Box::pin(async move {
            let body = content.as_ref().map(MessageBody::from);
            backend.execute(method, &path, body).await?;
            Ok(())
        })
    }
}

fn messages_path(channel_id: ChannelId) -> Vec<String> {
    vec!["channels".into(), channel_id.to_string(), "messages".into()]
}

fn message_path(channel_id: ChannelId, message_id: MessageId) -> Vec<String> {
    let mut path = messages_path(channel_id);
    path.push(message_id.to_string());
    path
}

fn reactions_path(channel_id: ChannelId, message_id: MessageId) -> Vec<String> {
    let mut path = message_path(channel_id, message_id);
    path.push("reactions".into());
    path
}

fn parse_snowflake(path: &[String], value: String) -> DiscordResult<u64> {
    value
        .parse()
        .map_err(|_| DiscordError::InvalidSnowflake {
            path: path.join("/"),
            value,
        })
}

impl ChatBackend for DiscordBackend {
    fn bot_id(&self) -> UserId {
        self.bot_id
    }

    fn send_message(
        &self,
        channel_id: ChannelId,
        content: MessageContent,
    ) -> BoxFuture<'static, BackendResult<MessageId>> {
        let backend = self.clone();
        Box::pin(async move {
            let path = messages_path(channel_id);
            let response = backend
                .execute(Method::POST, &path, Some(MessageBody::from(&content)))
                .await?;
            let message = response.json::<MessageObject>().await.map_err(|source| {
                DiscordError::DecodeResponse {
                    path: path.join("/"),
                    source,
                }
            })?;
            Ok(parse_snowflake(&path, message.id)?)
        })
    }

    fn edit_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        content: MessageContent,
    ) -> BoxFuture<'static, BackendResult<()>> {
        self.spawn(
            Method::PATCH,
            message_path(channel_id, message_id),
            Some(content),
        )
    }

    fn delete_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> BoxFuture<'static, BackendResult<()>> {
        self.spawn(Method::DELETE, message_path(channel_id, message_id), None)
    }

    fn add_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: String,
    ) -> BoxFuture<'static, BackendResult<()>> {
        let mut path = reactions_path(channel_id, message_id);
        path.extend([emoji, "@me".into()]);
        self.spawn(Method::PUT, path, None)
    }

    fn remove_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: String,
        user_id: UserId,
    ) -> BoxFuture<'static, BackendResult<()>> {
        let user = if user_id == self.bot_id {
            "@me".to_owned()
        } else {
            user_id.to_string()
        };
        let mut path = reactions_path(channel_id, message_id);
        path.extend([emoji, user]);
        self.spawn(Method::DELETE, path, None)
    }

    fn clear_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: String,
    ) -> BoxFuture<'static, BackendResult<()>> {
        let mut path = reactions_path(channel_id, message_id);
        path.push(emoji);
        self.spawn(Method::DELETE, path, None)
    }

    fn clear_reactions(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> BoxFuture<'static, BackendResult<()>> {
        self.spawn(Method::DELETE, reactions_path(channel_id, message_id), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaction_paths_percent_encode_emoji() {
        let mut url = Url::parse("https://discord.com/api/v10").unwrap();
        let mut path = reactions_path(1, 2);
        path.extend(["\u{2705}".to_owned(), "@me".to_owned()]);
        url.path_segments_mut().unwrap().extend(&path);
        assert_eq!(
            url.as_str(),
            "https://discord.com/api/v10/channels/1/messages/2/reactions/%E2%9C%85/@me"
        );
    }

    #[test]
    fn snowflakes_must_be_numeric() {
        let path = messages_path(1);
        assert_eq!(parse_snowflake(&path, "42".into()).unwrap(), 42);
        assert!(parse_snowflake(&path, "abc".into()).is_err());
    }
}
