//! Command table and dispatcher.
//!
//! Every subcommand is one row in [`COMMANDS`]: how it executes, which
//! credential it needs, and the endpoint it talks to. Arguments are
//! validated locally before any credential is touched or request sent.

mod account;
mod bookmarks;
mod discovery;
mod dm;
mod engagement;
mod lists;
mod streams;
mod tweets;
mod users;

use std::path::PathBuf;

use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use xpost_oauth::percent_encode;

use crate::client::ApiClient;
use crate::error::{XpostError, XpostResult};
use crate::output::Output;
use crate::pagination::{EndpointPages, PageLimits, PageWalker};
use crate::request::{AuthScheme, RequestDescriptor};
use crate::types::{AUTHOR_FIELDS, data_entity, merge_authors};

/// Maximum tweet length in Unicode scalar values.
pub const TWEET_MAX_CHARS: usize = 280;
/// Maximum profile bio length.
pub const BIO_MAX_CHARS: usize = 160;

const PRO_HINT: &str = "this endpoint requires Pro access to the X API";
const SEARCH_CURSOR: &str = "next_token";
const PAGE_CURSOR: &str = "pagination_token";

/// How a command talks to the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// One request, one printed entity.
    Single,
    /// Cursor-following list, one printed line per item.
    Paginate,
    /// Long-lived newline-delimited stream.
    Stream,
    /// Interactive PKCE authorization.
    Authorize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Tweet,
    Reply,
    Delete,
    Get,
    Thread,
    ThreadChain,
    Quotes,
    Search,
    Mentions,
    Timeline,
    User,
    UserTimeline,
    Followers,
    Following,
    Liked,
    LikingUsers,
    Retweeters,
    Like,
    Unlike,
    Follow,
    Unfollow,
    Retweet,
    Unretweet,
    Hide,
    Unhide,
    Mute,
    Unmute,
    Block,
    Unblock,
    Dm,
    DmList,
    DmConversation,
    Verify,
    Me,
    Profile,
    Auth,
    Bookmarks,
    Bookmark,
    Unbookmark,
    BookmarkFolders,
    BookmarksFolder,
    StreamRulesAdd,
    StreamRulesList,
    StreamRulesDelete,
    StreamFilter,
    StreamSample,
    SearchAll,
    MyLists,
    List,
    ListCreate,
    ListDelete,
    ListTweets,
    ListMembers,
    ListAddMember,
    ListRemoveMember,
    Trends,
    Spaces,
    Space,
}

impl CommandKind {
    /// Commands whose positional argument is a username.
    const fn takes_username(self) -> bool {
        matches!(
            self,
            Self::User
                | Self::UserTimeline
                | Self::Followers
                | Self::Following
                | Self::Liked
                | Self::Follow
                | Self::Unfollow
                | Self::Mute
                | Self::Unmute
                | Self::Block
                | Self::Unblock
                | Self::Dm
                | Self::ListAddMember
                | Self::ListRemoveMember
        )
    }

    /// Commands addressed by a tweet, list, space, rule, folder or
    /// conversation id.
    const fn takes_id(self) -> bool {
        matches!(
            self,
            Self::Reply
                | Self::Delete
                | Self::Get
                | Self::Thread
                | Self::ThreadChain
                | Self::Quotes
                | Self::LikingUsers
                | Self::Retweeters
                | Self::Like
                | Self::Unlike
                | Self::Retweet
                | Self::Unretweet
                | Self::Hide
                | Self::Unhide
                | Self::DmConversation
                | Self::Bookmark
                | Self::Unbookmark
                | Self::BookmarksFolder
                | Self::StreamRulesDelete
                | Self::List
                | Self::ListDelete
                | Self::ListTweets
                | Self::ListMembers
                | Self::ListAddMember
                | Self::ListRemoveMember
                | Self::Space
        )
    }

    const fn takes_query(self) -> bool {
        matches!(self, Self::Search | Self::SearchAll | Self::Spaces)
    }
}

/// Cursor handling for a paginated endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    /// Query parameter the cursor is echoed in.
    pub cursor: &'static str,
    /// Accepted `max_results` range; `None` sends no page size.
    pub limits: Option<PageLimits>,
}

/// One row of the command table.
#[derive(Debug)]
pub struct CommandSpec {
    pub name: &'static str,
    pub kind: CommandKind,
    pub mode: ExecMode,
    pub auth: AuthScheme,
    pub method: Method,
    /// Path template; `{me}`, `{id}`, `{user}` and `{woeid}` are filled in.
    pub endpoint: &'static str,
    pub paging: Option<Paging>,
    /// Item count when `-n` is not given.
    pub default_count: u32,
    /// Printed to stderr when a list comes back empty.
    pub empty_note: &'static str,
    /// Attached to 403 responses.
    pub forbidden_hint: Option<&'static str>,
}

impl CommandSpec {
    const fn single(
        name: &'static str,
        kind: CommandKind,
        auth: AuthScheme,
        method: Method,
        endpoint: &'static str,
    ) -> Self {
        Self {
            name,
            kind,
            mode: ExecMode::Single,
            auth,
            method,
            endpoint,
            paging: None,
            default_count: 1,
            empty_note: "",
            forbidden_hint: None,
        }
    }

    #[allow(clippy::too_many_arguments)]
    const fn paged(
        name: &'static str,
        kind: CommandKind,
        auth: AuthScheme,
        endpoint: &'static str,
        cursor: &'static str,
        limits: Option<PageLimits>,
        default_count: u32,
        empty_note: &'static str,
    ) -> Self {
        Self {
            name,
            kind,
            mode: ExecMode::Paginate,
            auth,
            method: Method::GET,
            endpoint,
            paging: Some(Paging { cursor, limits }),
            default_count,
            empty_note,
            forbidden_hint: None,
        }
    }

    const fn streaming(name: &'static str, kind: CommandKind, endpoint: &'static str) -> Self {
        Self {
            name,
            kind,
            mode: ExecMode::Stream,
            auth: AuthScheme::Bearer,
            method: Method::GET,
            endpoint,
            paging: None,
            default_count: 10,
            empty_note: "No tweets received before the stream went idle.",
            forbidden_hint: Some(PRO_HINT),
        }
    }

    const fn interactive(mut self) -> Self {
        self.mode = ExecMode::Authorize;
        self
    }

    const fn pro(mut self) -> Self {
        self.forbidden_hint = Some(PRO_HINT);
        self
    }

    /// Target item count for this invocation.
    #[must_use]
    pub fn count(&self, args: &CommandArgs) -> usize {
        args.count.unwrap_or(self.default_count) as usize
    }
}

const fn limits(min: u32, max: u32) -> Option<PageLimits> {
    Some(PageLimits::new(min, max))
}

use AuthScheme::{Bearer, OAuth1, OAuth2};

/// Every subcommand.
pub static COMMANDS: &[CommandSpec] = &[
    // Post & read
    CommandSpec::single("tweet", CommandKind::Tweet, OAuth1, Method::POST, "/2/tweets"),
    CommandSpec::single("reply", CommandKind::Reply, OAuth1, Method::POST, "/2/tweets"),
    CommandSpec::single("delete", CommandKind::Delete, OAuth1, Method::DELETE, "/2/tweets/{id}"),
    CommandSpec::single("get", CommandKind::Get, OAuth1, Method::GET, "/2/tweets/{id}"),
    CommandSpec::paged("thread", CommandKind::Thread, OAuth1, "/2/tweets/search/recent", SEARCH_CURSOR, limits(10, 100), 20, "No replies found in this conversation."),
    CommandSpec::paged("thread-chain", CommandKind::ThreadChain, OAuth1, "/2/tweets/search/recent", SEARCH_CURSOR, limits(10, 100), 20, "No thread found."),
    CommandSpec::paged("quotes", CommandKind::Quotes, OAuth1, "/2/tweets/{id}/quote_tweets", PAGE_CURSOR, limits(10, 100), 10, "No quote tweets found."),
    CommandSpec::paged("search", CommandKind::Search, OAuth1, "/2/tweets/search/recent", SEARCH_CURSOR, limits(10, 100), 10, "No results found."),
    CommandSpec::paged("mentions", CommandKind::Mentions, OAuth1, "/2/users/{me}/mentions", PAGE_CURSOR, limits(5, 100), 10, "No mentions found."),
    CommandSpec::paged("timeline", CommandKind::Timeline, OAuth1, "/2/users/{me}/timelines/reverse_chronological", PAGE_CURSOR, limits(5, 100), 10, "No timeline tweets found."),
    // Research
    CommandSpec::single("user", CommandKind::User, OAuth1, Method::GET, "/2/users/by/username/{user}"),
    CommandSpec::paged("user-timeline", CommandKind::UserTimeline, OAuth1, "/2/users/{id}/tweets", PAGE_CURSOR, limits(5, 100), 10, "No tweets found."),
    CommandSpec::paged("followers", CommandKind::Followers, OAuth1, "/2/users/{id}/followers", PAGE_CURSOR, limits(1, 1000), 100, "No followers found."),
    CommandSpec::paged("following", CommandKind::Following, OAuth1, "/2/users/{id}/following", PAGE_CURSOR, limits(1, 1000), 100, "Not following anyone."),
    CommandSpec::paged("liked", CommandKind::Liked, OAuth1, "/2/users/{id}/liked_tweets", PAGE_CURSOR, limits(5, 100), 20, "No liked tweets found."),
    CommandSpec::paged("liking-users", CommandKind::LikingUsers, OAuth1, "/2/tweets/{id}/liking_users", PAGE_CURSOR, limits(1, 100), 100, "No liking users found."),
    CommandSpec::paged("retweeters", CommandKind::Retweeters, OAuth1, "/2/tweets/{id}/retweeted_by", PAGE_CURSOR, limits(1, 100), 100, "No retweeters found."),
    // Engage
    CommandSpec::single("like", CommandKind::Like, OAuth1, Method::POST, "/2/users/{me}/likes"),
    CommandSpec::single("unlike", CommandKind::Unlike, OAuth1, Method::DELETE, "/2/users/{me}/likes/{id}"),
    CommandSpec::single("follow", CommandKind::Follow, OAuth1, Method::POST, "/2/users/{me}/following"),
    CommandSpec::single("unfollow", CommandKind::Unfollow, OAuth1, Method::DELETE, "/2/users/{me}/following/{user}"),
    CommandSpec::single("retweet", CommandKind::Retweet, OAuth1, Method::POST, "/2/users/{me}/retweets"),
    CommandSpec::single("unretweet", CommandKind::Unretweet, OAuth1, Method::DELETE, "/2/users/{me}/retweets/{id}"),
    CommandSpec::single("hide", CommandKind::Hide, OAuth1, Method::PUT, "/2/tweets/{id}/hidden"),
    CommandSpec::single("unhide", CommandKind::Unhide, OAuth1, Method::PUT, "/2/tweets/{id}/hidden"),
    // Moderate
    CommandSpec::single("mute", CommandKind::Mute, OAuth1, Method::POST, "/2/users/{me}/muting"),
    CommandSpec::single("unmute", CommandKind::Unmute, OAuth1, Method::DELETE, "/2/users/{me}/muting/{user}"),
    CommandSpec::single("block", CommandKind::Block, OAuth1, Method::POST, "/2/users/{me}/blocking"),
    CommandSpec::single("unblock", CommandKind::Unblock, OAuth1, Method::DELETE, "/2/users/{me}/blocking/{user}"),
    // Direct messages
    CommandSpec::single("dm", CommandKind::Dm, OAuth1, Method::POST, "/2/dm_conversations/with/{user}/messages"),
    CommandSpec::paged("dm-list", CommandKind::DmList, OAuth1, "/2/dm_events", PAGE_CURSOR, limits(1, 100), 20, "No DM events found."),
    CommandSpec::paged("dm-conversation", CommandKind::DmConversation, OAuth1, "/2/dm_conversations/{id}/dm_events", PAGE_CURSOR, limits(1, 100), 20, "No DM events found in this conversation."),
    // Account
    CommandSpec::single("verify", CommandKind::Verify, OAuth1, Method::GET, "/2/users/me"),
    CommandSpec::single("me", CommandKind::Me, OAuth1, Method::GET, "/2/users/me"),
    CommandSpec::single("profile", CommandKind::Profile, OAuth1, Method::POST, "/1.1/account/update_profile.json"),
    CommandSpec::single("auth", CommandKind::Auth, OAuth2, Method::POST, "/2/oauth2/token").interactive(),
    // Bookmarks
    CommandSpec::paged("bookmarks", CommandKind::Bookmarks, OAuth2, "/2/users/{me}/bookmarks", PAGE_CURSOR, limits(1, 100), 20, "No bookmarks found."),
    CommandSpec::single("bookmark", CommandKind::Bookmark, OAuth2, Method::POST, "/2/users/{me}/bookmarks"),
    CommandSpec::single("unbookmark", CommandKind::Unbookmark, OAuth2, Method::DELETE, "/2/users/{me}/bookmarks/{id}"),
    CommandSpec::paged("bookmark-folders", CommandKind::BookmarkFolders, OAuth2, "/2/users/{me}/bookmarks/folders", PAGE_CURSOR, None, 100, "No bookmark folders found."),
    CommandSpec::paged("bookmarks-folder", CommandKind::BookmarksFolder, OAuth2, "/2/users/{me}/bookmarks/folders/{id}", PAGE_CURSOR, limits(1, 100), 20, "No bookmarks found in this folder."),
    // Filtered and volume streams
    CommandSpec::single("stream-rules-add", CommandKind::StreamRulesAdd, Bearer, Method::POST, "/2/tweets/search/stream/rules").pro(),
    CommandSpec::single("stream-rules-list", CommandKind::StreamRulesList, Bearer, Method::GET, "/2/tweets/search/stream/rules").pro(),
    CommandSpec::single("stream-rules-delete", CommandKind::StreamRulesDelete, Bearer, Method::POST, "/2/tweets/search/stream/rules").pro(),
    CommandSpec::streaming("stream-filter", CommandKind::StreamFilter, "/2/tweets/search/stream"),
    CommandSpec::streaming("stream-sample", CommandKind::StreamSample, "/2/tweets/sample/stream"),
    CommandSpec::paged("search-all", CommandKind::SearchAll, Bearer, "/2/tweets/search/all", SEARCH_CURSOR, limits(10, 500), 10, "No results found.").pro(),
    // Lists
    CommandSpec::paged("my-lists", CommandKind::MyLists, OAuth1, "/2/users/{me}/owned_lists", PAGE_CURSOR, limits(1, 100), 100, "No lists found."),
    CommandSpec::single("list", CommandKind::List, OAuth1, Method::GET, "/2/lists/{id}"),
    CommandSpec::single("list-create", CommandKind::ListCreate, OAuth1, Method::POST, "/2/lists"),
    CommandSpec::single("list-delete", CommandKind::ListDelete, OAuth1, Method::DELETE, "/2/lists/{id}"),
    CommandSpec::paged("list-tweets", CommandKind::ListTweets, OAuth1, "/2/lists/{id}/tweets", PAGE_CURSOR, limits(1, 100), 20, "No tweets found in this list."),
    CommandSpec::paged("list-members", CommandKind::ListMembers, OAuth1, "/2/lists/{id}/members", PAGE_CURSOR, limits(1, 100), 100, "No members found in this list."),
    CommandSpec::single("list-add-member", CommandKind::ListAddMember, OAuth1, Method::POST, "/2/lists/{id}/members"),
    CommandSpec::single("list-remove-member", CommandKind::ListRemoveMember, OAuth1, Method::DELETE, "/2/lists/{id}/members/{user}"),
    // Trends and Spaces
    CommandSpec::single("trends", CommandKind::Trends, Bearer, Method::GET, "/2/trends/by/woeid/{woeid}"),
    CommandSpec::single("spaces", CommandKind::Spaces, Bearer, Method::GET, "/2/spaces/search"),
    CommandSpec::single("space", CommandKind::Space, Bearer, Method::GET, "/2/spaces/{id}"),
];

/// Find a command by its CLI name.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}

/// Parsed arguments. Which fields matter depends on the command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandArgs {
    /// Tweet, list, space, rule, folder or conversation id
    pub id: Option<String>,
    pub username: Option<String>,
    /// Tweet, reply, DM or bio text
    pub text: Option<String>,
    pub query: Option<String>,
    /// Stream rule value
    pub rule: Option<String>,
    /// List name
    pub name: Option<String>,
    /// `-n`
    pub count: Option<u32>,
    pub tag: Option<String>,
    pub description: Option<String>,
    pub private: bool,
    pub include_rts: bool,
    pub woeid: Option<u32>,
    pub avatar: Option<PathBuf>,
    pub port: Option<u16>,
    pub no_browser: bool,
}

impl CommandArgs {
    fn required<'a>(value: Option<&'a String>, what: &str) -> XpostResult<&'a str> {
        value
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| XpostError::Validation(format!("{what} must not be empty")))
    }

    /// # Errors
    ///
    /// [`XpostError::Validation`] if missing or blank.
    pub fn id(&self) -> XpostResult<&str> {
        Self::required(self.id.as_ref(), "id")
    }

    /// Username without a leading `@`.
    ///
    /// # Errors
    ///
    /// [`XpostError::Validation`] if nothing is left after stripping.
    pub fn username(&self) -> XpostResult<&str> {
        let raw = self.username.as_deref().unwrap_or_default().trim();
        let name = raw.trim_start_matches('@');
        if name.is_empty() {
            return Err(XpostError::Validation("username must not be empty".into()));
        }
        Ok(name)
    }

    /// # Errors
    ///
    /// [`XpostError::Validation`] if missing or blank.
    pub fn query(&self) -> XpostResult<&str> {
        Self::required(self.query.as_ref(), "query")
    }

    /// Message text, untrimmed.
    ///
    /// # Errors
    ///
    /// [`XpostError::Validation`] if missing or empty.
    pub fn text(&self) -> XpostResult<&str> {
        match self.text.as_deref() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(XpostError::Validation("text must not be empty".into())),
        }
    }
}

fn check_length(what: &str, text: &str, max: usize) -> XpostResult<()> {
    let chars = text.chars().count();
    if chars > max {
        return Err(XpostError::Validation(format!(
            "{what} is {chars} characters (max {max})"
        )));
    }
    Ok(())
}

/// Reject arguments that can never succeed, before any request.
///
/// # Errors
///
/// [`XpostError::Validation`] describing the first problem found.
pub fn validate(spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    if args.count == Some(0) {
        return Err(XpostError::Validation("-n must be at least 1".into()));
    }
    if spec.kind.takes_username() {
        args.username()?;
    }
    if spec.kind.takes_id() {
        args.id()?;
    }
    if spec.kind.takes_query() {
        args.query()?;
    }

    match spec.kind {
        CommandKind::Tweet | CommandKind::Reply => {
            check_length("tweet", args.text()?, TWEET_MAX_CHARS)?;
        }
        CommandKind::Dm => {
            args.text()?;
        }
        CommandKind::Profile => {
            if args.text.is_none() && args.avatar.is_none() {
                return Err(XpostError::Validation(
                    "profile needs bio text or --avatar".into(),
                ));
            }
            if let Some(bio) = &args.text {
                check_length("bio", bio, BIO_MAX_CHARS)?;
            }
        }
        CommandKind::StreamRulesAdd => {
            CommandArgs::required(args.rule.as_ref(), "stream rule")?;
        }
        CommandKind::ListCreate => {
            CommandArgs::required(args.name.as_ref(), "list name")?;
        }
        _ => {}
    }

    Ok(())
}

/// Per-invocation state shared by command handlers.
#[derive(Debug)]
pub struct Context {
    pub client: ApiClient,
    pub output: Output,
    me: Option<String>,
}

impl Context {
    #[must_use]
    pub const fn new(client: ApiClient, output: Output) -> Self {
        Self {
            client,
            output,
            me: None,
        }
    }

    /// Send one request.
    ///
    /// # Errors
    ///
    /// Whatever the executor returns.
    pub async fn call(&mut self, request: &RequestDescriptor) -> XpostResult<Value> {
        self.client.execute(request).await
    }

    /// Id of the authenticated user; looked up once per invocation.
    ///
    /// # Errors
    ///
    /// Lookup failures, or [`XpostError::MalformedResponse`] without an id.
    pub async fn me(&mut self, auth: AuthScheme) -> XpostResult<String> {
        if let Some(id) = &self.me {
            return Ok(id.clone());
        }
        let body = self.call(&RequestDescriptor::get("/2/users/me", auth)).await?;
        let id = entity_id(&body)?;
        debug!(user_id = %id, "Resolved authenticated user");
        self.me = Some(id.clone());
        Ok(id)
    }

    /// Id of `@username`.
    ///
    /// # Errors
    ///
    /// [`XpostError::NotFound`] for unknown users, other lookup failures.
    pub async fn resolve_user(&mut self, username: &str, auth: AuthScheme) -> XpostResult<String> {
        let path = format!("/2/users/by/username/{}", percent_encode(username));
        let body = self.call(&RequestDescriptor::get(path, auth)).await?;
        entity_id(&body)
    }

    /// Run one request and print its `data` member.
    ///
    /// # Errors
    ///
    /// Request or write failures.
    pub async fn print_entity(&mut self, request: &RequestDescriptor) -> XpostResult<Value> {
        let data = data_entity(self.call(request).await?);
        self.output.entity(data.clone())?;
        Ok(data)
    }

    /// Run a state-changing request and print `{"<flag>": bool}`, taking the
    /// state from the response when the server reports it.
    ///
    /// # Errors
    ///
    /// Request or write failures.
    pub async fn print_toggle(
        &mut self,
        request: &RequestDescriptor,
        flag: &str,
        expected: bool,
    ) -> XpostResult<()> {
        let body = self.call(request).await?;
        let state = body
            .get("data")
            .and_then(|d| d.get(flag))
            .and_then(Value::as_bool)
            .unwrap_or(expected);
        self.output.toggle(flag, state)
    }

    /// Walk `request` page by page, printing each item as one line after
    /// `decorate` has had a chance to adjust it. Returns the item count.
    ///
    /// # Errors
    ///
    /// The first page failure; items already printed stay printed.
    pub async fn paginate(
        &mut self,
        spec: &CommandSpec,
        args: &CommandArgs,
        request: RequestDescriptor,
        mut decorate: impl FnMut(&mut Value),
    ) -> XpostResult<usize> {
        let paging = spec.paging.unwrap_or(Paging {
            cursor: PAGE_CURSOR,
            limits: None,
        });
        let Self { client, output, .. } = self;

        let mut walker =
            PageWalker::new(spec.count(args), client.config().max_pages).with_limits(paging.limits);
        let mut pages = EndpointPages::new(client, request, paging.cursor);

        while let Some(items) = walker.next_page(&mut pages).await? {
            for mut item in items {
                decorate(&mut item);
                output.line(&item)?;
            }
        }

        let total = walker.yielded();
        if total == 0 && !spec.empty_note.is_empty() {
            output.note(spec.empty_note)?;
        }
        Ok(total)
    }
}

fn entity_id(body: &Value) -> XpostResult<String> {
    body.pointer("/data/id")
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| XpostError::MalformedResponse("response has no data.id".into()))
}

/// Fill `{name}` placeholders in `template`, percent-encoding each value.
#[must_use]
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |path, (name, value)| {
        path.replace(&format!("{{{name}}}"), &percent_encode(value))
    })
}

/// Ask for `tweet_fields` plus the author expansion.
#[must_use]
pub fn with_authors(request: RequestDescriptor, tweet_fields: &str) -> RequestDescriptor {
    request.params(&[
        ("tweet.fields", tweet_fields),
        ("expansions", "author_id"),
        ("user.fields", AUTHOR_FIELDS),
    ])
}

/// The `data` entity of a single-tweet response with its author merged in.
#[must_use]
pub fn tweet_entity(mut body: Value) -> Value {
    let includes = body.get_mut("includes").map(Value::take);
    let mut data = data_entity(body);
    merge_authors(std::slice::from_mut(&mut data), includes.as_ref());
    data
}

/// A request for `spec` with its path rendered from `vars`.
#[must_use]
pub fn request_for(spec: &CommandSpec, vars: &[(&str, &str)]) -> RequestDescriptor {
    let request = RequestDescriptor::new(spec.method.clone(), render(spec.endpoint, vars), spec.auth);
    if spec.endpoint.starts_with("/1.1/") {
        request.v1()
    } else {
        request
    }
}

/// Validate, check credentials, and run the named command.
///
/// # Errors
///
/// [`XpostError::Validation`] for unknown commands or bad arguments,
/// [`XpostError::AuthUnavailable`] for missing credentials, then whatever
/// the command itself hits.
pub async fn dispatch(ctx: &mut Context, name: &str, args: &CommandArgs) -> XpostResult<()> {
    let spec = lookup(name)
        .ok_or_else(|| XpostError::Validation(format!("unknown command `{name}`")))?;
    validate(spec, args)?;

    if spec.mode != ExecMode::Authorize {
        ctx.client.auth_mut().require(spec.auth)?;
    }
    debug!(command = spec.name, mode = ?spec.mode, auth = spec.auth.as_str(), "Dispatching command");

    let result = match spec.kind {
        CommandKind::Tweet => tweets::tweet(ctx, spec, args).await,
        CommandKind::Reply => tweets::reply(ctx, spec, args).await,
        CommandKind::Delete => tweets::delete(ctx, spec, args).await,
        CommandKind::Get => tweets::get(ctx, spec, args).await,
        CommandKind::Thread => tweets::thread(ctx, spec, args).await,
        CommandKind::ThreadChain => tweets::thread_chain(ctx, spec, args).await,
        CommandKind::Quotes => tweets::quotes(ctx, spec, args).await,
        CommandKind::Search | CommandKind::SearchAll => tweets::search(ctx, spec, args).await,
        CommandKind::Mentions | CommandKind::Timeline => tweets::home(ctx, spec, args).await,
        CommandKind::User => users::user(ctx, spec, args).await,
        CommandKind::UserTimeline => users::user_timeline(ctx, spec, args).await,
        CommandKind::Followers | CommandKind::Following => users::graph(ctx, spec, args).await,
        CommandKind::Liked => users::liked(ctx, spec, args).await,
        CommandKind::LikingUsers | CommandKind::Retweeters => {
            users::engagers(ctx, spec, args).await
        }
        CommandKind::Like
        | CommandKind::Unlike
        | CommandKind::Retweet
        | CommandKind::Unretweet => engagement::tweet_toggle(ctx, spec, args).await,
        CommandKind::Follow
        | CommandKind::Unfollow
        | CommandKind::Mute
        | CommandKind::Unmute
        | CommandKind::Block
        | CommandKind::Unblock => engagement::user_toggle(ctx, spec, args).await,
        CommandKind::Hide | CommandKind::Unhide => engagement::hide(ctx, spec, args).await,
        CommandKind::Dm => dm::send(ctx, spec, args).await,
        CommandKind::DmList | CommandKind::DmConversation => dm::events(ctx, spec, args).await,
        CommandKind::Verify => account::verify(ctx, spec).await,
        CommandKind::Me => account::me(ctx, spec).await,
        CommandKind::Profile => account::profile(ctx, spec, args).await,
        CommandKind::Auth => account::authorize(ctx, args).await,
        CommandKind::Bookmarks | CommandKind::BookmarksFolder => {
            bookmarks::list(ctx, spec, args).await
        }
        CommandKind::Bookmark | CommandKind::Unbookmark => bookmarks::toggle(ctx, spec, args).await,
        CommandKind::BookmarkFolders => bookmarks::folders(ctx, spec, args).await,
        CommandKind::StreamRulesAdd => streams::add_rule(ctx, spec, args).await,
        CommandKind::StreamRulesList => streams::list_rules(ctx, spec).await,
        CommandKind::StreamRulesDelete => streams::delete_rule(ctx, spec, args).await,
        CommandKind::StreamFilter | CommandKind::StreamSample => {
            streams::consume(ctx, spec, args).await
        }
        CommandKind::MyLists => lists::owned(ctx, spec, args).await,
        CommandKind::List => lists::get(ctx, spec, args).await,
        CommandKind::ListCreate => lists::create(ctx, spec, args).await,
        CommandKind::ListDelete => lists::delete(ctx, spec, args).await,
        CommandKind::ListTweets => lists::tweets(ctx, spec, args).await,
        CommandKind::ListMembers => lists::members(ctx, spec, args).await,
        CommandKind::ListAddMember | CommandKind::ListRemoveMember => {
            lists::membership(ctx, spec, args).await
        }
        CommandKind::Trends => discovery::trends(ctx, spec, args).await,
        CommandKind::Spaces => discovery::spaces(ctx, spec, args).await,
        CommandKind::Space => discovery::space(ctx, spec, args).await,
    };

    result.map_err(|e| match spec.forbidden_hint {
        Some(hint) => e.with_forbidden_hint(hint),
        None => e,
    })
}
