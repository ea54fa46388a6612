//! Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands::CommandArgs;

/// Command-line client for the X API v2.
#[derive(Debug, Parser)]
#[command(name = "xpost")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log HTTP traffic and pagination to stderr (repeat for trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// `-n`: how many items to fetch.
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct Count {
    /// Number of results
    #[arg(short = 'n', long = "count")]
    pub count: Option<u32>,
}

#[derive(Debug, Clone, Args)]
pub struct TweetRef {
    /// Tweet id
    pub tweet_id: String,
}

#[derive(Debug, Clone, Args)]
pub struct UserRef {
    /// Username, with or without the leading @
    pub username: String,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Post a tweet
    Tweet {
        text: String,
    },
    /// Reply to a tweet
    Reply {
        tweet_id: String,
        text: String,
    },
    /// Delete one of your tweets
    Delete(TweetRef),
    /// Fetch a single tweet
    Get(TweetRef),
    /// Replies in a tweet's conversation
    Thread {
        tweet_id: String,
        #[command(flatten)]
        count: Count,
    },
    /// The author's own thread, oldest first
    ThreadChain {
        tweet_id: String,
        #[command(flatten)]
        count: Count,
    },
    /// Quote tweets of a tweet
    Quotes {
        tweet_id: String,
        #[command(flatten)]
        count: Count,
    },
    /// Search the last seven days
    Search {
        query: String,
        #[command(flatten)]
        count: Count,
    },
    /// Your mentions
    Mentions(Count),
    /// Your home timeline
    Timeline(Count),

    /// A user's profile
    User(UserRef),
    /// A user's tweets
    UserTimeline {
        username: String,
        #[command(flatten)]
        count: Count,
        /// Include retweets
        #[arg(long)]
        include_rts: bool,
    },
    /// A user's followers
    Followers {
        username: String,
        #[command(flatten)]
        count: Count,
    },
    /// Accounts a user follows
    Following {
        username: String,
        #[command(flatten)]
        count: Count,
    },
    /// Tweets a user liked
    Liked {
        username: String,
        #[command(flatten)]
        count: Count,
    },
    /// Users who liked a tweet
    LikingUsers {
        tweet_id: String,
        #[command(flatten)]
        count: Count,
    },
    /// Users who retweeted a tweet
    Retweeters {
        tweet_id: String,
        #[command(flatten)]
        count: Count,
    },

    /// Like a tweet
    Like(TweetRef),
    /// Remove a like
    Unlike(TweetRef),
    /// Follow a user
    Follow(UserRef),
    /// Unfollow a user
    Unfollow(UserRef),
    /// Retweet a tweet
    Retweet(TweetRef),
    /// Undo a retweet
    Unretweet(TweetRef),
    /// Hide a reply to your tweet
    Hide(TweetRef),
    /// Unhide a reply
    Unhide(TweetRef),

    /// Mute a user
    Mute(UserRef),
    /// Unmute a user
    Unmute(UserRef),
    /// Block a user
    Block(UserRef),
    /// Unblock a user
    Unblock(UserRef),

    /// Send a direct message
    Dm {
        username: String,
        text: String,
    },
    /// Recent direct message events
    DmList(Count),
    /// Events in one DM conversation
    DmConversation {
        conversation_id: String,
        #[command(flatten)]
        count: Count,
    },

    /// Check the OAuth 1.0a credentials
    Verify,
    /// Your own profile
    Me,
    /// Update your bio and/or avatar
    Profile {
        /// New bio
        bio: Option<String>,
        /// Image file for the new avatar
        #[arg(long)]
        avatar: Option<PathBuf>,
    },
    /// Authorize with OAuth 2.0 (PKCE) for bookmark access
    Auth {
        /// Loopback port for the redirect (default: any free port)
        #[arg(long)]
        port: Option<u16>,
        /// Print the authorization URL without opening a browser
        #[arg(long)]
        no_browser: bool,
    },

    /// Your bookmarks
    Bookmarks(Count),
    /// Bookmark a tweet
    Bookmark(TweetRef),
    /// Remove a bookmark
    Unbookmark(TweetRef),
    /// Your bookmark folders
    BookmarkFolders(Count),
    /// Bookmarks in one folder
    BookmarksFolder {
        folder_id: String,
        #[command(flatten)]
        count: Count,
    },

    /// Add a filtered stream rule
    StreamRulesAdd {
        rule: String,
        /// Label echoed back with matching tweets
        #[arg(long)]
        tag: Option<String>,
    },
    /// List filtered stream rules
    StreamRulesList,
    /// Delete a filtered stream rule
    StreamRulesDelete {
        rule_id: String,
    },
    /// Tweets matching the filtered stream rules
    StreamFilter(Count),
    /// A sample of all public tweets
    StreamSample(Count),
    /// Search the full archive
    SearchAll {
        query: String,
        #[command(flatten)]
        count: Count,
    },

    /// Lists you own
    MyLists(Count),
    /// One list
    List {
        list_id: String,
    },
    /// Create a list
    ListCreate {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        private: bool,
    },
    /// Delete a list
    ListDelete {
        list_id: String,
    },
    /// Tweets from list members
    ListTweets {
        list_id: String,
        #[command(flatten)]
        count: Count,
    },
    /// Members of a list
    ListMembers {
        list_id: String,
        #[command(flatten)]
        count: Count,
    },
    /// Add a user to a list
    ListAddMember {
        list_id: String,
        username: String,
    },
    /// Remove a user from a list
    ListRemoveMember {
        list_id: String,
        username: String,
    },

    /// Trending topics for a location
    Trends {
        /// Yahoo! Where On Earth id (1 = worldwide)
        #[arg(long)]
        woeid: Option<u32>,
    },
    /// Search live and scheduled Spaces
    Spaces {
        query: String,
    },
    /// One Space
    Space {
        space_id: String,
    },
}

fn with_id(id: String) -> CommandArgs {
    CommandArgs {
        id: Some(id),
        ..CommandArgs::default()
    }
}

fn with_user(username: String) -> CommandArgs {
    CommandArgs {
        username: Some(username),
        ..CommandArgs::default()
    }
}

fn counted(count: Count) -> CommandArgs {
    CommandArgs {
        count: count.count,
        ..CommandArgs::default()
    }
}

fn id_counted(id: String, count: Count) -> CommandArgs {
    CommandArgs {
        count: count.count,
        ..with_id(id)
    }
}

fn user_counted(username: String, count: Count) -> CommandArgs {
    CommandArgs {
        count: count.count,
        ..with_user(username)
    }
}

impl Command {
    /// Table name and arguments for the dispatcher.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn into_invocation(self) -> (&'static str, CommandArgs) {
        match self {
            Self::Tweet { text } => (
                "tweet",
                CommandArgs {
                    text: Some(text),
                    ..CommandArgs::default()
                },
            ),
            Self::Reply { tweet_id, text } => (
                "reply",
                CommandArgs {
                    text: Some(text),
                    ..with_id(tweet_id)
                },
            ),
            Self::Delete(t) => ("delete", with_id(t.tweet_id)),
            Self::Get(t) => ("get", with_id(t.tweet_id)),
            Self::Thread { tweet_id, count } => ("thread", id_counted(tweet_id, count)),
            Self::ThreadChain { tweet_id, count } => ("thread-chain", id_counted(tweet_id, count)),
            Self::Quotes { tweet_id, count } => ("quotes", id_counted(tweet_id, count)),
            Self::Search { query, count } => (
                "search",
                CommandArgs {
                    query: Some(query),
                    ..counted(count)
                },
            ),
            Self::Mentions(count) => ("mentions", counted(count)),
            Self::Timeline(count) => ("timeline", counted(count)),

            Self::User(u) => ("user", with_user(u.username)),
            Self::UserTimeline {
                username,
                count,
                include_rts,
            } => (
                "user-timeline",
                CommandArgs {
                    include_rts,
                    ..user_counted(username, count)
                },
            ),
            Self::Followers { username, count } => ("followers", user_counted(username, count)),
            Self::Following { username, count } => ("following", user_counted(username, count)),
            Self::Liked { username, count } => ("liked", user_counted(username, count)),
            Self::LikingUsers { tweet_id, count } => ("liking-users", id_counted(tweet_id, count)),
            Self::Retweeters { tweet_id, count } => ("retweeters", id_counted(tweet_id, count)),

            Self::Like(t) => ("like", with_id(t.tweet_id)),
            Self::Unlike(t) => ("unlike", with_id(t.tweet_id)),
            Self::Follow(u) => ("follow", with_user(u.username)),
            Self::Unfollow(u) => ("unfollow", with_user(u.username)),
            Self::Retweet(t) => ("retweet", with_id(t.tweet_id)),
            Self::Unretweet(t) => ("unretweet", with_id(t.tweet_id)),
            Self::Hide(t) => ("hide", with_id(t.tweet_id)),
            Self::Unhide(t) => ("unhide", with_id(t.tweet_id)),

            Self::Mute(u) => ("mute", with_user(u.username)),
            Self::Unmute(u) => ("unmute", with_user(u.username)),
            Self::Block(u) => ("block", with_user(u.username)),
            Self::Unblock(u) => ("unblock", with_user(u.username)),

            Self::Dm { username, text } => (
                "dm",
                CommandArgs {
                    text: Some(text),
                    ..with_user(username)
                },
            ),
            Self::DmList(count) => ("dm-list", counted(count)),
            Self::DmConversation {
                conversation_id,
                count,
            } => ("dm-conversation", id_counted(conversation_id, count)),

            Self::Verify => ("verify", CommandArgs::default()),
            Self::Me => ("me", CommandArgs::default()),
            Self::Profile { bio, avatar } => (
                "profile",
                CommandArgs {
                    text: bio,
                    avatar,
                    ..CommandArgs::default()
                },
            ),
            Self::Auth { port, no_browser } => (
                "auth",
                CommandArgs {
                    port,
                    no_browser,
                    ..CommandArgs::default()
                },
            ),

            Self::Bookmarks(count) => ("bookmarks", counted(count)),
            Self::Bookmark(t) => ("bookmark", with_id(t.tweet_id)),
            Self::Unbookmark(t) => ("unbookmark", with_id(t.tweet_id)),
            Self::BookmarkFolders(count) => ("bookmark-folders", counted(count)),
            Self::BookmarksFolder { folder_id, count } => {
                ("bookmarks-folder", id_counted(folder_id, count))
            }

            Self::StreamRulesAdd { rule, tag } => (
                "stream-rules-add",
                CommandArgs {
                    rule: Some(rule),
                    tag,
                    ..CommandArgs::default()
                },
            ),
            Self::StreamRulesList => ("stream-rules-list", CommandArgs::default()),
            Self::StreamRulesDelete { rule_id } => ("stream-rules-delete", with_id(rule_id)),
            Self::StreamFilter(count) => ("stream-filter", counted(count)),
            Self::StreamSample(count) => ("stream-sample", counted(count)),
            Self::SearchAll { query, count } => (
                "search-all",
                CommandArgs {
                    query: Some(query),
                    ..counted(count)
                },
            ),

            Self::MyLists(count) => ("my-lists", counted(count)),
            Self::List { list_id } => ("list", with_id(list_id)),
            Self::ListCreate {
                name,
                description,
                private,
            } => (
                "list-create",
                CommandArgs {
                    name: Some(name),
                    description,
                    private,
                    ..CommandArgs::default()
                },
            ),
            Self::ListDelete { list_id } => ("list-delete", with_id(list_id)),
            Self::ListTweets { list_id, count } => ("list-tweets", id_counted(list_id, count)),
            Self::ListMembers { list_id, count } => ("list-members", id_counted(list_id, count)),
            Self::ListAddMember { list_id, username } => (
                "list-add-member",
                CommandArgs {
                    username: Some(username),
                    ..with_id(list_id)
                },
            ),
            Self::ListRemoveMember { list_id, username } => (
                "list-remove-member",
                CommandArgs {
                    username: Some(username),
                    ..with_id(list_id)
                },
            ),

            Self::Trends { woeid } => (
                "trends",
                CommandArgs {
                    woeid,
                    ..CommandArgs::default()
                },
            ),
            Self::Spaces { query } => (
                "spaces",
                CommandArgs {
                    query: Some(query),
                    ..CommandArgs::default()
                },
            ),
            Self::Space { space_id } => ("space", with_id(space_id)),
        }
    }
}
