//! Context token commands.

use anyhow::Result;
use serde_json::json;

use hotelads_engine::{ContextId, ContextTokenCodec};

use super::{TokenArgs, TokenCommand};
use crate::context::Context;

/// Run the token command.
pub async fn run(args: TokenArgs, ctx: &Context) -> Result<()> {
    match args.command {
        TokenCommand::Keygen => keygen(ctx),
        TokenCommand::Encode { id } => encode(id, ctx),
        TokenCommand::Decode { token } => decode(&token, ctx),
    }
}

fn keygen(ctx: &Context) -> Result<()> {
    let key = ContextTokenCodec::generate_key();
    if !ctx.output.emit_json(&json!({ "key": key })) {
        ctx.output.line(&key);
    }
    Ok(())
}

fn encode(id: u64, ctx: &Context) -> Result<()> {
    let token = ctx.codec()?.encode(ContextId::new(id));
    if !ctx.output.emit_json(&json!({ "context_id": id, "token": token })) {
        ctx.output.line(&token);
    }
    Ok(())
}

fn decode(token: &str, ctx: &Context) -> Result<()> {
    let id = ctx.codec()?.decode(token)?;
    if !ctx.output.emit_json(&json!({ "context_id": id.get() })) {
        ctx.output.line(&id.to_string());
    }
    Ok(())
}
