//! Trends and Spaces.

use serde_json::Value;

use super::{CommandArgs, CommandSpec, Context, request_for};
use crate::error::XpostResult;
use crate::request::RequestDescriptor;
use crate::types::{SPACE_FIELDS, data_items};

/// Worldwide.
const DEFAULT_WOEID: u32 = 1;

pub(super) async fn trends(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let woeid = args.woeid.unwrap_or(DEFAULT_WOEID).to_string();
    let request = request_for(spec, &[("woeid", &woeid)]);
    print_items(ctx, &request, "No trends found.").await
}

pub(super) async fn spaces(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let request = request_for(spec, &[])
        .param("query", args.query()?)
        .param("space.fields", SPACE_FIELDS);
    print_items(ctx, &request, "No spaces found.").await
}

/// One line per item of an unpaged listing.
async fn print_items(ctx: &mut Context, request: &RequestDescriptor, empty_note: &str) -> XpostResult<()> {
    let mut body = ctx.call(request).await?;
    let items = data_items(&mut body);
    if items.is_empty() {
        return ctx.output.note(empty_note);
    }
    for item in &items {
        ctx.output.line(item)?;
    }
    Ok(())
}

pub(super) async fn space(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let request = request_for(spec, &[("id", args.id()?)]).param("space.fields", SPACE_FIELDS);
    let data = ctx.print_entity(&request).await?;
    if data.get("id").and_then(Value::as_str).is_none() {
        ctx.output.note("Space not found.")?;
    }
    Ok(())
}
