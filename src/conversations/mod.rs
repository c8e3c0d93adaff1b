//! Built-in conversation scripts
//!
//! The bot binary runs one of these, picked by `bot.conversation`.

use std::sync::Arc;
use serde_json::{json, Value};

use crate::coroutine::{Context, Conversation};
use crate::transport::render_text;
use crate::utils::errors::Result;

/// Names accepted by [`by_name`]
pub const NAMES: &[&str] = &["foo_bar", "visit_counter"];

/// Look up a built-in conversation
pub fn by_name(name: &str) -> Option<Arc<dyn Conversation>> {
    match name {
        "foo_bar" => Some(Arc::new(foo_bar) as Arc<dyn Conversation>),
        "visit_counter" => Some(Arc::new(visit_counter) as Arc<dyn Conversation>),
        _ => None,
    }
}

/// Asks for foo, then bar, echoes both and forgets everything
pub async fn foo_bar(ctx: Context) -> Result<()> {
    let foo = ctx.prompt("Tell me foo!").await?;
    let bar = ctx.prompt("Tell me bar!").await?;
    ctx.send(format!("foo: {} bar: {}", render_text(&foo), render_text(&bar))).await?;

    ctx.clear().await?;
    Ok(())
}

/// Greets the user with how many conversations they have had so far
pub async fn visit_counter(ctx: Context) -> Result<()> {
    let visits = ctx.read_as::<u64>("visits").await?.unwrap_or(0) + 1;
    ctx.write("visits", json!(visits)).await?;

    let name = match ctx.read("name").await? {
        Value::Null => {
            let name = ctx.prompt("Hi! What's your name?").await?;
            ctx.write("name", name.clone()).await?;
            name
        }
        name => name,
    };

    ctx.send(format!("Welcome, {}! This is visit #{}.", render_text(&name), visits)).await?;
    Ok(())
}
