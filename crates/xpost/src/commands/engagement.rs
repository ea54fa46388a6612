//! Likes, retweets, follows, mutes, blocks and hidden replies.
//!
//! Each pair of commands flips one relationship; the printed flag is taken
//! from the response when X reports it.

use reqwest::Method;
use serde_json::json;

use super::{CommandArgs, CommandKind, CommandSpec, Context, request_for};
use crate::error::XpostResult;

/// Response flag for a toggle command and the state it should end in.
pub(super) const fn flag(kind: CommandKind) -> (&'static str, bool) {
    match kind {
        CommandKind::Like => ("liked", true),
        CommandKind::Unlike => ("liked", false),
        CommandKind::Retweet => ("retweeted", true),
        CommandKind::Unretweet => ("retweeted", false),
        CommandKind::Follow => ("following", true),
        CommandKind::Unfollow => ("following", false),
        CommandKind::Mute => ("muting", true),
        CommandKind::Unmute => ("muting", false),
        CommandKind::Block => ("blocking", true),
        CommandKind::Unblock => ("blocking", false),
        CommandKind::Hide => ("hidden", true),
        CommandKind::Unhide => ("hidden", false),
        CommandKind::Bookmark => ("bookmarked", true),
        CommandKind::Unbookmark => ("bookmarked", false),
        CommandKind::ListAddMember => ("is_member", true),
        CommandKind::ListRemoveMember => ("is_member", false),
        _ => ("ok", true),
    }
}

/// Add or remove a relationship with a tweet: POST `{"tweet_id"}` to the
/// collection, DELETE the member.
pub(super) async fn tweet_toggle(
    ctx: &mut Context,
    spec: &CommandSpec,
    args: &CommandArgs,
) -> XpostResult<()> {
    let me = ctx.me(spec.auth).await?;
    let tweet_id = args.id()?;
    let mut request = request_for(spec, &[("me", &me), ("id", tweet_id)]);
    if spec.method == Method::POST {
        request = request.json(json!({ "tweet_id": tweet_id }));
    }

    let (name, expected) = flag(spec.kind);
    ctx.print_toggle(&request, name, expected).await
}

/// Same as [`tweet_toggle`] for relationships with another user.
pub(super) async fn user_toggle(
    ctx: &mut Context,
    spec: &CommandSpec,
    args: &CommandArgs,
) -> XpostResult<()> {
    let me = ctx.me(spec.auth).await?;
    let target = ctx.resolve_user(args.username()?, spec.auth).await?;
    let mut request = request_for(spec, &[("me", &me), ("user", &target)]);
    if spec.method == Method::POST {
        request = request.json(json!({ "target_user_id": target }));
    }

    let (name, expected) = flag(spec.kind);
    ctx.print_toggle(&request, name, expected).await
}

pub(super) async fn hide(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let (name, hidden) = flag(spec.kind);
    let request = request_for(spec, &[("id", args.id()?)]).json(json!({ "hidden": hidden }));
    ctx.print_toggle(&request, name, hidden).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs_share_a_flag_with_opposite_states() {
        let pairs = [
            (CommandKind::Like, CommandKind::Unlike),
            (CommandKind::Retweet, CommandKind::Unretweet),
            (CommandKind::Follow, CommandKind::Unfollow),
            (CommandKind::Mute, CommandKind::Unmute),
            (CommandKind::Block, CommandKind::Unblock),
            (CommandKind::Hide, CommandKind::Unhide),
            (CommandKind::Bookmark, CommandKind::Unbookmark),
            (CommandKind::ListAddMember, CommandKind::ListRemoveMember),
        ];
        for (on, off) in pairs {
            let (on_flag, on_state) = flag(on);
            let (off_flag, off_state) = flag(off);
            assert_eq!(on_flag, off_flag);
            assert!(on_state);
            assert!(!off_state);
        }
    }
}
