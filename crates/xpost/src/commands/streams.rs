//! Filtered stream rules and stream consumption (app-only bearer).

use serde_json::json;
use tracing::info;

use super::{CommandArgs, CommandSpec, Context, request_for, tweet_entity, with_authors};
use crate::error::XpostResult;
use crate::stream;
use crate::types::{StreamRule, data_items};

const STREAM_TWEET_FIELDS: &str = "created_at,author_id,text,public_metrics";

pub(super) async fn add_rule(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let rule = StreamRule::new(args.rule.as_deref().unwrap_or_default().trim(), args.tag.clone());
    let request = request_for(spec, &[]).json(json!({ "add": [rule] }));
    ctx.print_entity(&request).await?;
    Ok(())
}

pub(super) async fn list_rules(ctx: &mut Context, spec: &CommandSpec) -> XpostResult<()> {
    let mut body = ctx.call(&request_for(spec, &[])).await?;
    let rules = data_items(&mut body);
    if rules.is_empty() {
        return ctx.output.note("No stream rules configured.");
    }
    for rule in &rules {
        ctx.output.line(rule)?;
    }
    Ok(())
}

pub(super) async fn delete_rule(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let request = request_for(spec, &[]).json(json!({ "delete": { "ids": [args.id()?] } }));
    ctx.print_entity(&request).await?;
    Ok(())
}

/// Print up to `-n` tweets from the filtered or sample stream, one per line.
pub(super) async fn consume(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let request = with_authors(request_for(spec, &[]), STREAM_TWEET_FIELDS);
    let idle_timeout = ctx.client.config().stream_idle_timeout;
    let response = ctx.client.open_stream(&request).await?;

    let output = &mut ctx.output;
    let summary = stream::consume(response.bytes_stream(), spec.count(args), idle_timeout, |record| {
        output.line(&tweet_entity(record))
    })
    .await?;

    info!(records = summary.records, end = ?summary.end, "Stream finished");
    if summary.records == 0 {
        ctx.output.note(spec.empty_note)?;
    }
    Ok(())
}
