//! Lists owned by the authenticated user and their members.

use reqwest::Method;
use serde_json::{Map, Value, json};

use super::engagement::flag;
use super::{CommandArgs, CommandSpec, Context, request_for, with_authors};
use crate::error::XpostResult;
use crate::types::{LIST_FIELDS, TWEET_FIELDS, USER_LIST_FIELDS};

const OWNED_LIST_FIELDS: &str = "description,member_count,follower_count,created_at,private";

pub(super) async fn owned(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let me = ctx.me(spec.auth).await?;
    let request = request_for(spec, &[("me", &me)]).param("list.fields", OWNED_LIST_FIELDS);
    ctx.paginate(spec, args, request, |_| {}).await?;
    Ok(())
}

pub(super) async fn get(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let request = request_for(spec, &[("id", args.id()?)]).param("list.fields", LIST_FIELDS);
    ctx.print_entity(&request).await?;
    Ok(())
}

pub(super) async fn create(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let mut body = Map::new();
    body.insert("name".into(), json!(args.name.as_deref().unwrap_or_default().trim()));
    if let Some(description) = args.description.as_deref().filter(|d| !d.is_empty()) {
        body.insert("description".into(), json!(description));
    }
    if args.private {
        body.insert("private".into(), Value::Bool(true));
    }

    let request = request_for(spec, &[]).json(Value::Object(body));
    ctx.print_entity(&request).await?;
    Ok(())
}

pub(super) async fn delete(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let request = request_for(spec, &[("id", args.id()?)]);
    ctx.print_toggle(&request, "deleted", true).await
}

pub(super) async fn tweets(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let request = with_authors(request_for(spec, &[("id", args.id()?)]), TWEET_FIELDS);
    ctx.paginate(spec, args, request, |_| {}).await?;
    Ok(())
}

pub(super) async fn members(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let request = request_for(spec, &[("id", args.id()?)]).param("user.fields", USER_LIST_FIELDS);
    ctx.paginate(spec, args, request, |_| {}).await?;
    Ok(())
}

/// Add a user to, or remove a user from, a list.
pub(super) async fn membership(
    ctx: &mut Context,
    spec: &CommandSpec,
    args: &CommandArgs,
) -> XpostResult<()> {
    let user = ctx.resolve_user(args.username()?, spec.auth).await?;
    let mut request = request_for(spec, &[("id", args.id()?), ("user", &user)]);
    if spec.method == Method::POST {
        request = request.json(json!({ "user_id": user }));
    }

    let (name, expected) = flag(spec.kind);
    ctx.print_toggle(&request, name, expected).await
}
