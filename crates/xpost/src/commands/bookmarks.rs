//! Bookmarks (OAuth 2.0 user context only).

use std::collections::HashMap;

use reqwest::Method;
use serde_json::{Value, json};
use tracing::warn;

use super::engagement::flag;
use super::{CommandArgs, CommandSpec, Context, Paging, request_for, with_authors};
use crate::error::XpostResult;
use crate::pagination::{EndpointPages, Page, PageWalker};
use crate::request::RequestDescriptor;
use crate::types::TWEET_FIELDS;

/// Largest `ids` list the tweet lookup accepts.
const LOOKUP_BATCH: usize = 100;

/// Bookmarked tweets, optionally within one folder. Folder listings carry
/// only ids; those are filled in with a batched tweet lookup.
pub(super) async fn list(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let me = ctx.me(spec.auth).await?;
    let folder = args.id.as_deref().unwrap_or_default();
    let request = with_authors(request_for(spec, &[("me", &me), ("id", folder)]), TWEET_FIELDS);

    let paging = spec.paging.unwrap_or(Paging {
        cursor: "pagination_token",
        limits: None,
    });
    let mut walker =
        PageWalker::new(spec.count(args), ctx.client.config().max_pages).with_limits(paging.limits);

    loop {
        let page = {
            let mut pages = EndpointPages::new(&mut ctx.client, request.clone(), paging.cursor);
            walker.next_page(&mut pages).await?
        };
        let Some(mut items) = page else { break };

        enrich(ctx, spec, &mut items).await;
        for item in &items {
            ctx.output.line(item)?;
        }
    }

    if walker.yielded() == 0 {
        ctx.output.note(spec.empty_note)?;
    }
    Ok(())
}

/// Fill in tweets that came back as bare ids. Lookup failures leave the
/// items as they are.
async fn enrich(ctx: &mut Context, spec: &CommandSpec, items: &mut [Value]) {
    let missing: Vec<String> = items
        .iter()
        .filter(|item| item.get("text").is_none())
        .filter_map(|item| item.get("id").and_then(Value::as_str).map(String::from))
        .collect();
    if missing.is_empty() {
        return;
    }

    let mut found: HashMap<String, Value> = HashMap::new();
    for batch in missing.chunks(LOOKUP_BATCH) {
        let request = with_authors(RequestDescriptor::get("/2/tweets", spec.auth), TWEET_FIELDS)
            .param("ids", batch.join(","));
        match ctx.call(&request).await {
            Ok(body) => {
                let Page { items: tweets, .. } = Page::from_response(body);
                for tweet in tweets {
                    if let Some(id) = tweet.get("id").and_then(Value::as_str) {
                        found.insert(id.to_string(), tweet);
                    }
                }
            }
            Err(e) => warn!(error = %e, count = batch.len(), "Bookmark lookup failed"),
        }
    }

    for item in items.iter_mut() {
        let id = item.get("id").and_then(Value::as_str).unwrap_or_default();
        if let Some(tweet) = found.remove(id) {
            *item = tweet;
        }
    }
}

pub(super) async fn toggle(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let me = ctx.me(spec.auth).await?;
    let tweet_id = args.id()?;
    let mut request = request_for(spec, &[("me", &me), ("id", tweet_id)]);
    if spec.method == Method::POST {
        request = request.json(json!({ "tweet_id": tweet_id }));
    }

    let (name, expected) = flag(spec.kind);
    ctx.print_toggle(&request, name, expected).await
}

pub(super) async fn folders(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let me = ctx.me(spec.auth).await?;
    let request = request_for(spec, &[("me", &me)]);
    ctx.paginate(spec, args, request, |_| {}).await?;
    Ok(())
}
