//! Direct messages.

use serde_json::json;

use super::{CommandArgs, CommandSpec, Context, request_for};
use crate::error::XpostResult;
use crate::types::DM_EVENT_FIELDS;

/// Send a message to the one-to-one conversation with a user.
pub(super) async fn send(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let recipient = ctx.resolve_user(args.username()?, spec.auth).await?;
    let request = request_for(spec, &[("user", &recipient)]).json(json!({ "text": args.text()? }));
    ctx.print_entity(&request).await?;
    Ok(())
}

/// Recent DM events, across all conversations or within one.
pub(super) async fn events(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let conversation = args.id.as_deref().unwrap_or_default();
    let request = request_for(spec, &[("id", conversation)]).param("dm_event.fields", DM_EVENT_FIELDS);
    ctx.paginate(spec, args, request, |_| {}).await?;
    Ok(())
}
