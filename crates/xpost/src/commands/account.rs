//! The authenticated account: identity, profile updates, OAuth 2.0 login.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use tracing::info;

use super::{CommandArgs, CommandSpec, Context, request_for};
use crate::authorize::{LoopbackReceiver, PkceAuthorizer};
use crate::error::{XpostError, XpostResult};
use crate::request::RequestDescriptor;

const ME_FIELDS: &str = "id,username,name,description,location,url,created_at,public_metrics,verified";
const PROFILE_IMAGE_PATH: &str = "/1.1/account/update_profile_image.json";

/// Check the OAuth 1.0a credentials by fetching the account they belong to.
pub(super) async fn verify(ctx: &mut Context, spec: &CommandSpec) -> XpostResult<()> {
    let request = request_for(spec, &[]).param("user.fields", "username,name");
    let user = ctx.print_entity(&request).await?;

    let field = |key: &str| user.get(key).and_then(Value::as_str).unwrap_or("?").to_string();
    ctx.output
        .note(&format!("Authenticated as @{} ({})", field("username"), field("name")))
}

pub(super) async fn me(ctx: &mut Context, spec: &CommandSpec) -> XpostResult<()> {
    let request = request_for(spec, &[]).param("user.fields", ME_FIELDS);
    ctx.print_entity(&request).await?;
    Ok(())
}

/// Update the bio and/or the avatar through the v1.1 account endpoints.
pub(super) async fn profile(ctx: &mut Context, spec: &CommandSpec, args: &CommandArgs) -> XpostResult<()> {
    let mut updated = json!({});

    if let Some(bio) = &args.text {
        let request = request_for(spec, &[]).form(&[("description", bio.as_str())]);
        updated = ctx.call(&request).await?;
    }

    if let Some(path) = &args.avatar {
        let image = tokio::fs::read(path).await.map_err(|e| {
            XpostError::Validation(format!("cannot read avatar {}: {e}", path.display()))
        })?;
        let encoded = STANDARD.encode(image);
        let request = RequestDescriptor::post(PROFILE_IMAGE_PATH, spec.auth)
            .v1()
            .form(&[("image", encoded.as_str())]);
        updated = ctx.call(&request).await?;
    }

    ctx.output.entity(updated)
}

/// Interactive PKCE login; stores the token pair for the OAuth 2.0 commands.
pub(super) async fn authorize(ctx: &mut Context, args: &CommandArgs) -> XpostResult<()> {
    let client = ctx
        .client
        .auth()
        .client_credentials()
        .cloned()
        .ok_or_else(|| XpostError::AuthUnavailable {
            variant: "oauth2",
            hint: "set X_CLIENT_ID (and X_CLIENT_SECRET for confidential clients)".into(),
        })?;

    let authorizer = PkceAuthorizer::new(client, ctx.client.config(), ctx.client.http().clone())
        .with_browser(!args.no_browser);
    let mut receiver = LoopbackReceiver::bind(args.port).await?;
    let token = authorizer.authorize(&mut receiver).await?;

    let token_file = ctx.client.auth().token_store().path().display().to_string();
    info!(%token_file, "Authorization complete");
    ctx.output.entity(json!({
        "authorized": true,
        "expires_at": token.expires_at().map(|t| t.to_rfc3339()),
        "scope": token.scope,
        "token_file": token_file,
    }))
}
