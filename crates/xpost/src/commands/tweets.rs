//! Posting and reading tweets.

use serde_json::{Value, json};

use super::{CommandArgs, CommandSpec, Context, Paging, request_for, tweet_entity, with_authors};
use crate::error::XpostResult;
use crate::pagination::{EndpointPages, PageWalker};
use crate::request::RequestDescriptor;
use crate::types::{TWEET_DETAIL_FIELDS, TWEET_FIELDS};

pub(super) async fn tweet(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let request = request_for(spec, &[]).json(json!({ "text": args.text()? }));
    ctx.print_entity(&request).await?;
    Ok(())
}

pub(super) async fn reply(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let request = request_for(spec, &[]).json(json!({
        "text": args.text()?,
        "reply": { "in_reply_to_tweet_id": args.id()? },
    }));
    ctx.print_entity(&request).await?;
    Ok(())
}

pub(super) async fn delete(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let request = request_for(spec, &[("id", args.id()?)]);
    ctx.print_toggle(&request, "deleted", true).await
}

pub(super) async fn get(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let request = with_authors(request_for(spec, &[("id", args.id()?)]), TWEET_DETAIL_FIELDS);
    let body = ctx.call(&request).await?;
    ctx.output.entity(tweet_entity(body))
}

/// Conversation id of a tweet; a tweet that starts a conversation is its
/// own root.
async fn conversation_of(ctx: &mut Context, spec: &CommandSpec, id: &str) -> XpostResult<String> {
    let request = RequestDescriptor::get(format!("/2/tweets/{}", xpost_oauth::percent_encode(id)), spec.auth)
        .param("tweet.fields", "conversation_id");
    let body = ctx.call(&request).await?;
    Ok(body
        .pointer("/data/conversation_id")
        .and_then(Value::as_str)
        .unwrap_or(id)
        .to_string())
}

/// Every reply in the conversation the tweet belongs to.
pub(super) async fn thread(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let conversation = conversation_of(ctx, spec, args.id()?).await?;
    let request = with_authors(request_for(spec, &[]), TWEET_DETAIL_FIELDS)
        .param("query", format!("conversation_id:{conversation}"));
    ctx.paginate(spec, args, request, |_| {}).await?;
    Ok(())
}

/// The author's own tweets in a conversation, oldest first, root included.
pub(super) async fn thread_chain(
    ctx: &mut Context,
    spec: &CommandSpec,
    args: &CommandArgs,
) -> XpostResult<()> {
    let id = args.id()?;
    let root_request = with_authors(
        RequestDescriptor::get(format!("/2/tweets/{}", xpost_oauth::percent_encode(id)), spec.auth),
        TWEET_DETAIL_FIELDS,
    );
    let root = tweet_entity(ctx.call(&root_request).await?);

    let conversation = root
        .get("conversation_id")
        .and_then(Value::as_str)
        .unwrap_or(id)
        .to_string();
    let username = root
        .pointer("/author/username")
        .and_then(Value::as_str)
        .map(String::from);

    let mut query = format!("conversation_id:{conversation}");
    if let Some(username) = &username {
        query.push_str(&format!(" from:{username}"));
    }
    let request = with_authors(request_for(spec, &[]), TWEET_DETAIL_FIELDS)
        .param("query", query)
        .param("sort_order", "recency");

    let target = spec.count(args);
    let paging = spec.paging.unwrap_or(Paging {
        cursor: "next_token",
        limits: None,
    });
    let max_pages = ctx.client.config().max_pages;
    let mut pages = EndpointPages::new(&mut ctx.client, request, paging.cursor);
    let mut chain = PageWalker::new(target, max_pages)
        .with_limits(paging.limits)
        .collect(&mut pages)
        .await?;

    let root_id = root.get("id").and_then(Value::as_str);
    if root_id.is_some() && !chain.iter().any(|t| t.get("id").and_then(Value::as_str) == root_id) {
        chain.push(root.clone());
    }
    chain.sort_by(|a, b| created_at(a).cmp(created_at(b)));
    chain.truncate(target);

    if chain.is_empty() {
        return ctx.output.note(spec.empty_note);
    }
    let root_author = root.get("author").cloned();
    for mut tweet in chain {
        if let (None, Some(author)) = (tweet.get("author"), &root_author) {
            tweet["author"] = author.clone();
        }
        ctx.output.line(&tweet)?;
    }
    Ok(())
}

fn created_at(tweet: &Value) -> &str {
    tweet.get("created_at").and_then(Value::as_str).unwrap_or_default()
}

pub(super) async fn quotes(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let request = with_authors(request_for(spec, &[("id", args.id()?)]), TWEET_FIELDS);
    ctx.paginate(spec, args, request, |_| {}).await?;
    Ok(())
}

/// Recent search, or full-archive search for `search-all`.
pub(super) async fn search(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let request = with_authors(request_for(spec, &[]), TWEET_FIELDS).param("query", args.query()?);
    ctx.paginate(spec, args, request, |_| {}).await?;
    Ok(())
}

/// Mentions of, or the home timeline of, the authenticated user.
pub(super) async fn home(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let me = ctx.me(spec.auth).await?;
    let request = with_authors(request_for(spec, &[("me", &me)]), TWEET_FIELDS);
    ctx.paginate(spec, args, request, |_| {}).await?;
    Ok(())
}
