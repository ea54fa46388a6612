//! User research: profiles, timelines, and social graph.

use serde_json::json;

use super::{CommandArgs, CommandSpec, Context, request_for, with_authors};
use crate::error::XpostResult;
use crate::types::{TWEET_FIELDS, USER_LIST_FIELDS};

const PROFILE_FIELDS: &str = "created_at,description,location,public_metrics,verified,url,pinned_tweet_id";
const ENGAGER_FIELDS: &str = "username,name,public_metrics,verified";

pub(super) async fn user(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let request = request_for(spec, &[("user", args.username()?)]).param("user.fields", PROFILE_FIELDS);
    ctx.print_entity(&request).await?;
    Ok(())
}

pub(super) async fn user_timeline(
    ctx: &mut Context,
    spec: &CommandSpec,
    args: &CommandArgs,
) -> XpostResult<()> {
    let username = args.username()?;
    let id = ctx.resolve_user(username, spec.auth).await?;

    let mut request = with_authors(request_for(spec, &[("id", &id)]), TWEET_FIELDS);
    if !args.include_rts {
        request = request.param("exclude", "retweets");
    }

    let author = json!({ "username": username });
    ctx.paginate(spec, args, request, |tweet| {
        tweet["author"] = author.clone();
    })
    .await?;
    Ok(())
}

/// Followers or followed accounts of a user.
pub(super) async fn graph(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let id = ctx.resolve_user(args.username()?, spec.auth).await?;
    let request = request_for(spec, &[("id", &id)]).param("user.fields", USER_LIST_FIELDS);
    ctx.paginate(spec, args, request, |_| {}).await?;
    Ok(())
}

pub(super) async fn liked(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let id = ctx.resolve_user(args.username()?, spec.auth).await?;
    let request = with_authors(request_for(spec, &[("id", &id)]), TWEET_FIELDS);
    ctx.paginate(spec, args, request, |_| {}).await?;
    Ok(())
}

/// Users who liked or retweeted a tweet.
pub(super) async fn engagers(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let request = request_for(spec, &[("id", args.id()?)]).param("user.fields", ENGAGER_FIELDS);
    ctx.paginate(spec, args, request, |_| {}).await?;
    Ok(())
}
