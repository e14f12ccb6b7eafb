use typed_builder::TypedBuilder;

use crate::{
    models::{decode_entities, decode_entity, Entity, Handle, ItemKind, Options, System},
    sync::update_fields,
    transport::Transport,
    value::DecodeContext,
    wire::{normalize, WireValue},
    CobblerError, CobblerResult, RESOLVED_READ_SINCE,
};

use super::{expect_string, expect_true, CobblerClient};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Options for a single-item read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, TypedBuilder)]
pub struct ReadOptions {
    /// Ask the server to render structured fields as display strings.
    #[builder(default)]
    pub flatten: bool,

    /// Ask the server to resolve inherited values. Ignored by servers that do not support it.
    #[builder(default)]
    pub resolved: bool,
}

/// How the server files a saved item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// The item is new and its name must not be taken.
    New,

    /// The item already exists and is replaced.
    Bypass,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl SaveMode {
    /// Returns the `editmode` argument of `save_<kind>`.
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveMode::New => "new",
            SaveMode::Bypass => "bypass",
        }
    }
}

impl<T: Transport> CobblerClient<T> {
    /// Returns the names of every item of type `E`.
    pub async fn list_names<E: Entity>(&self) -> CobblerResult<Vec<String>> {
        self.list_item_names(E::KIND).await
    }

    /// Returns the names of every item of `kind`.
    pub async fn list_item_names(&self, kind: ItemKind) -> CobblerResult<Vec<String>> {
        let raw = self
            .call("get_item_names", vec![kind.as_str().into()])
            .await?;
        Ok(normalize(&raw)?)
    }

    /// Fetches the item of type `E` called `name`.
    ///
    /// Fails with [`CobblerError::NotFound`] if the server has no such item.
    pub async fn get<E: Entity>(&self, name: &str) -> CobblerResult<E> {
        self.get_with(name, ReadOptions::default()).await
    }

    /// Fetches the item of type `E` called `name` with explicit read options.
    pub async fn get_with<E: Entity>(&self, name: &str, options: ReadOptions) -> CobblerResult<E> {
        let version = self.version().await?;
        let token = self.token_or_empty().await;

        let mut args = vec![WireValue::from(name), WireValue::Bool(options.flatten)];
        if version.greater_than(&RESOLVED_READ_SINCE) {
            args.push(WireValue::Bool(options.resolved));
        }
        args.push(WireValue::from(token));

        let raw = self.call(&E::KIND.method("get"), args).await?;
        if raw.is_null_sentinel() {
            return Err(CobblerError::NotFound {
                kind: E::KIND,
                name: name.to_string(),
            });
        }

        let ctx = DecodeContext {
            flattened: options.flatten,
        };
        Ok(decode_entity(&raw, &ctx)?)
    }

    /// Fetches every item of type `E`.
    pub async fn get_all<E: Entity>(&self) -> CobblerResult<Vec<E>> {
        let raw = self
            .call(&format!("get_{}", E::KIND.plural()), Vec::new())
            .await?;
        Ok(decode_entities(&raw, &DecodeContext::default())?)
    }

    /// Fetches every item of type `E` whose attributes match `criteria`.
    ///
    /// Values in `criteria` may use shell-style wildcards.
    pub async fn find<E: Entity>(&self, criteria: &Options) -> CobblerResult<Vec<E>> {
        let token = self.token_or_empty().await;
        let raw = self
            .call(
                &E::KIND.method("find"),
                vec![
                    WireValue::from(criteria.clone()),
                    WireValue::Bool(true),
                    WireValue::from(token),
                ],
            )
            .await?;
        Ok(decode_entities(&raw, &DecodeContext::default())?)
    }

    /// Returns the names of every item of type `E` whose attributes match `criteria`.
    pub async fn find_names<E: Entity>(&self, criteria: &Options) -> CobblerResult<Vec<String>> {
        let raw = self
            .call(
                "find_items",
                vec![
                    E::KIND.as_str().into(),
                    WireValue::from(criteria.clone()),
                    "name".into(),
                    WireValue::Bool(false),
                ],
            )
            .await?;
        Ok(normalize(&raw)?)
    }

    /// Creates `entity` on the server and returns it as the server stored it.
    ///
    /// The entity is validated first; an invalid entity fails without any call being made.
    pub async fn create<E: Entity>(&self, entity: &E) -> CobblerResult<E> {
        entity.validate()?;
        let token = self.require_token().await?;
        let version = self.version().await?;

        let raw = self
            .call(&E::KIND.method("new"), vec![token.as_str().into()])
            .await?;
        let handle = Handle::new(raw);

        update_fields(&self.transport, &handle, entity, &token, Some(&version)).await?;
        self.save::<E>(&handle, SaveMode::New).await?;

        self.get(entity.name()).await
    }

    /// Writes every updatable field of `entity` to the existing item of the same name.
    pub async fn update<E: Entity>(&self, entity: &E) -> CobblerResult<()> {
        let token = self.require_token().await?;
        let version = self.version().await?;
        let handle = self.get_handle::<E>(entity.name()).await?;

        update_fields(&self.transport, &handle, entity, &token, Some(&version)).await?;
        self.save::<E>(&handle, SaveMode::Bypass).await
    }

    /// Removes the item of type `E` called `name`, leaving its children in place.
    pub async fn delete<E: Entity>(&self, name: &str) -> CobblerResult<()> {
        self.delete_item(E::KIND, name, false).await
    }

    /// Removes the item of type `E` called `name` together with its children.
    pub async fn delete_recursive<E: Entity>(&self, name: &str) -> CobblerResult<()> {
        self.delete_item(E::KIND, name, true).await
    }

    /// Removes the item of `kind` called `name`, and its children if `recursive` is set.
    pub async fn delete_item(
        &self,
        kind: ItemKind,
        name: &str,
        recursive: bool,
    ) -> CobblerResult<()> {
        let token = self.require_token().await?;
        let method = kind.method("remove");
        let raw = self
            .call(
                &method,
                vec![name.into(), token.into(), WireValue::Bool(recursive)],
            )
            .await?;
        expect_true(&method, raw)
    }

    /// Renames the item of type `E` called `name`.
    pub async fn rename<E: Entity>(&self, name: &str, new_name: &str) -> CobblerResult<()> {
        let token = self.require_token().await?;
        let handle = self.get_handle::<E>(name).await?;
        let method = E::KIND.method("rename");
        let raw = self
            .call(
                &method,
                vec![
                    handle.as_wire().clone(),
                    new_name.into(),
                    token.into(),
                ],
            )
            .await?;
        expect_true(&method, raw)
    }

    /// Copies the item of type `E` called `name` to a new item called `new_name`.
    pub async fn copy<E: Entity>(&self, name: &str, new_name: &str) -> CobblerResult<()> {
        let token = self.require_token().await?;
        let handle = self.get_handle::<E>(name).await?;
        let method = E::KIND.method("copy");
        let raw = self
            .call(
                &method,
                vec![
                    handle.as_wire().clone(),
                    new_name.into(),
                    token.into(),
                ],
            )
            .await?;
        expect_true(&method, raw)
    }

    /// Saves the item behind `handle`.
    pub async fn save<E: Entity>(&self, handle: &Handle, mode: SaveMode) -> CobblerResult<()> {
        let token = self.require_token().await?;
        let method = E::KIND.method("save");
        let raw = self
            .call(
                &method,
                vec![handle.as_wire().clone(), token.into(), mode.as_str().into()],
            )
            .await?;
        expect_true(&method, raw)
    }

    /// Returns an edit handle for the item of type `E` called `name`.
    pub async fn get_handle<E: Entity>(&self, name: &str) -> CobblerResult<Handle> {
        let token = self.require_token().await?;
        let raw = self
            .call(
                &format!("get_{}_handle", E::KIND.as_str()),
                vec![name.into(), token.into()],
            )
            .await?;
        into_handle(E::KIND, name, raw)
    }

    /// Returns an edit handle for the item of `kind` called `name`.
    pub async fn get_item_handle(&self, kind: ItemKind, name: &str) -> CobblerResult<Handle> {
        let token = self.require_token().await?;
        let raw = self
            .call(
                "get_item_handle",
                vec![kind.as_str().into(), name.into(), token.into()],
            )
            .await?;
        into_handle(kind, name, raw)
    }

    /// Returns the value of `attribute` on the item with `uid` after inheritance is applied.
    pub async fn get_item_resolved_value(
        &self,
        uid: &str,
        attribute: &str,
    ) -> CobblerResult<WireValue> {
        self.call("get_item_resolved_value", vec![uid.into(), attribute.into()])
            .await
    }

    /// Removes the network interface `interface` from the system called `system`.
    pub async fn delete_interface(&self, system: &str, interface: &str) -> CobblerResult<()> {
        self.modify_system_and_save(system, "delete_interface", interface.into())
            .await
    }

    /// Renames the network interface `interface` of the system called `system`.
    pub async fn rename_interface(
        &self,
        system: &str,
        interface: &str,
        new_name: &str,
    ) -> CobblerResult<()> {
        let value = WireValue::Struct(
            [
                ("interface".to_string(), WireValue::from(interface)),
                ("rename_interface".to_string(), WireValue::from(new_name)),
            ]
            .into_iter()
            .collect(),
        );
        self.modify_system_and_save(system, "rename_interface", value)
            .await
    }

    async fn modify_system_and_save(
        &self,
        system: &str,
        attribute: &str,
        value: WireValue,
    ) -> CobblerResult<()> {
        let token = self.require_token().await?;
        let handle = self.get_handle::<System>(system).await?;
        let method = ItemKind::System.method("modify");
        let raw = self
            .call(
                &method,
                vec![
                    handle.as_wire().clone(),
                    attribute.into(),
                    value,
                    token.into(),
                ],
            )
            .await?;
        expect_true(&method, raw)?;
        self.save::<System>(&handle, SaveMode::Bypass).await
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn into_handle(kind: ItemKind, name: &str, raw: WireValue) -> CobblerResult<Handle> {
    if raw.is_null_sentinel() {
        return Err(CobblerError::NotFound {
            kind,
            name: name.to_string(),
        });
    }
    let handle = expect_string(&kind.method("get_handle"), raw)?;
    Ok(Handle::new(WireValue::String(handle)))
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
