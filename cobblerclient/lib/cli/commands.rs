use serde::Serialize;
use serde_json::Value;

use crate::{
    client::{CobblerClient, ReadOptions},
    models::{
        Distro, Entity, File, Image, ItemKind, Menu, MgmtClass, Package, Profile, Repo, System,
    },
    transport::Transport,
    CobblerError, CobblerResult,
};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Fetches the item of `kind` called `name` and renders it as JSON.
pub async fn show_item<T: Transport>(
    client: &CobblerClient<T>,
    kind: ItemKind,
    name: &str,
    options: ReadOptions,
) -> CobblerResult<Value> {
    match kind {
        ItemKind::Distro => show_as::<Distro, T>(client, name, options).await,
        ItemKind::Profile => show_as::<Profile, T>(client, name, options).await,
        ItemKind::System => show_as::<System, T>(client, name, options).await,
        ItemKind::Repo => show_as::<Repo, T>(client, name, options).await,
        ItemKind::Image => show_as::<Image, T>(client, name, options).await,
        ItemKind::File => show_as::<File, T>(client, name, options).await,
        ItemKind::Menu => show_as::<Menu, T>(client, name, options).await,
        ItemKind::MgmtClass => show_as::<MgmtClass, T>(client, name, options).await,
        ItemKind::Package => show_as::<Package, T>(client, name, options).await,
    }
}

/// Fetches the server's version details and renders them as JSON.
pub async fn show_version<T: Transport>(client: &CobblerClient<T>) -> CobblerResult<Value> {
    to_json(&client.extended_version().await?)
}

/// Fetches the status of a background task, and its log if `with_log` is set, as JSON.
pub async fn show_task<T: Transport>(
    client: &CobblerClient<T>,
    event_id: &str,
    with_log: bool,
) -> CobblerResult<Value> {
    let mut status = to_json(&client.get_task_status(event_id).await?)?;
    if with_log {
        let log = client.get_event_log(event_id).await?;
        if let Value::Object(map) = &mut status {
            map.insert("log".to_string(), Value::String(log));
        }
    }

    Ok(status)
}

async fn show_as<E: Entity, T: Transport>(
    client: &CobblerClient<T>,
    name: &str,
    options: ReadOptions,
) -> CobblerResult<Value> {
    let entity = client.get_with::<E>(name, options).await?;
    to_json(&entity)
}

fn to_json(value: &impl Serialize) -> CobblerResult<Value> {
    serde_json::to_value(value).map_err(CobblerError::custom)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
