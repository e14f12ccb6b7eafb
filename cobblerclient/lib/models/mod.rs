//! Typed representations of the items a Cobbler server manages.
//!
//! Every entity embeds an [`Item`] and describes its fields with a static table of
//! [`FieldSpec`]s. The tables drive both directions: [`decode_entity`] reads a raw response
//! into an entity, and the synchronizer walks the same table to write it back.

mod distro;
mod file;
mod image;
mod item;
mod menu;
mod mgmtclass;
mod package;
mod profile;
mod repo;
mod system;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use distro::*;
pub use file::*;
pub use image::*;
pub use item::*;
pub use menu::*;
pub use mgmtclass::*;
pub use package::*;
pub use profile::*;
pub use repo::*;
pub use system::*;

use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::{
    sync::FieldSpec,
    value::DecodeContext,
    wire::{WireValue, NULL_SENTINEL},
    CobblerError, CobblerResult, DecodeError,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The kinds of items the server manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A kernel and initrd pair.
    Distro,

    /// A provisioning profile built on a distro.
    Profile,

    /// A concrete machine.
    System,

    /// A package repository.
    Repo,

    /// A pre-built image.
    Image,

    /// A file managed on provisioned machines.
    File,

    /// A boot menu.
    Menu,

    /// A configuration management class.
    MgmtClass,

    /// A package managed on provisioned machines.
    Package,
}

/// An opaque identifier the server assigns to an item being edited.
///
/// It is only ever passed back verbatim and is not stable across sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct Handle(WireValue);

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// A typed item with a field table.
///
/// `Default` must produce what the server would assume for a fresh item, so that writing every
/// field of a default entity does not turn inherited values into empty ones.
pub trait Entity: Default + Clone + fmt::Debug + Serialize + Send + Sync + 'static {
    /// The kind of item this type represents.
    const KIND: ItemKind;

    /// Returns the field table, in declared order.
    fn fields() -> &'static [FieldSpec<Self>];

    /// Returns the embedded base item.
    fn item(&self) -> &Item;

    /// Returns the embedded base item mutably.
    fn item_mut(&mut self) -> &mut Item;

    /// Checks the entity's invariants before it is created on the server.
    fn validate(&self) -> CobblerResult<()> {
        Ok(())
    }

    /// Returns `modify_*` calls to issue after the field table has been written, as pairs of
    /// attribute name and value.
    fn extra_modifications(&self) -> Vec<(String, WireValue)> {
        Vec::new()
    }

    /// Returns the entity's name.
    fn name(&self) -> &str {
        &self.item().name
    }
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ItemKind {
    /// Every kind, in dependency order.
    pub const ALL: [ItemKind; 9] = [
        ItemKind::Distro,
        ItemKind::Profile,
        ItemKind::System,
        ItemKind::Repo,
        ItemKind::Image,
        ItemKind::File,
        ItemKind::Menu,
        ItemKind::MgmtClass,
        ItemKind::Package,
    ];

    /// Returns the name used in method names, e.g. `distro` in `modify_distro`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Distro => "distro",
            ItemKind::Profile => "profile",
            ItemKind::System => "system",
            ItemKind::Repo => "repo",
            ItemKind::Image => "image",
            ItemKind::File => "file",
            ItemKind::Menu => "menu",
            ItemKind::MgmtClass => "mgmtclass",
            ItemKind::Package => "package",
        }
    }

    /// Returns the collection name, e.g. `distros` in `get_distros`.
    pub fn plural(&self) -> &'static str {
        match self {
            ItemKind::Distro => "distros",
            ItemKind::Profile => "profiles",
            ItemKind::System => "systems",
            ItemKind::Repo => "repos",
            ItemKind::Image => "images",
            ItemKind::File => "files",
            ItemKind::Menu => "menus",
            ItemKind::MgmtClass => "mgmtclasses",
            ItemKind::Package => "packages",
        }
    }

    /// Returns the method name for `action` on this kind, e.g. `new_distro`.
    pub fn method(&self, action: &str) -> String {
        format!("{action}_{}", self.as_str())
    }
}

impl Handle {
    /// Wraps a value returned by the server.
    pub fn new(value: WireValue) -> Self {
        Self(value)
    }

    /// Returns the value to pass back to the server.
    pub fn as_wire(&self) -> &WireValue {
        &self.0
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Decodes a raw item into `E`.
///
/// Keys the field table does not know are kept in [`Item::extra`]; table fields missing from the
/// response keep their defaults. On error nothing is returned, so a caller never sees a partly
/// decoded entity.
pub fn decode_entity<E: Entity>(raw: &WireValue, ctx: &DecodeContext) -> Result<E, DecodeError> {
    let map = match raw {
        WireValue::Struct(map) => map,
        other => {
            return Err(DecodeError::Message(format!(
                "expected a struct for a {}, got {}",
                E::KIND,
                other.kind_name()
            )))
        }
    };

    let mut entity = E::default();
    let specs = E::fields();
    for (key, value) in map {
        match specs.iter().find(|spec| spec.wire_name() == key) {
            Some(spec) => spec.decode(&mut entity, value, ctx)?,
            None => {
                entity.item_mut().extra.insert(key.clone(), value.clone());
            }
        }
    }

    Ok(entity)
}

/// Decodes a list of raw items into entities.
pub fn decode_entities<E: Entity>(
    raw: &WireValue,
    ctx: &DecodeContext,
) -> Result<Vec<E>, DecodeError> {
    match raw {
        WireValue::Array(items) => items.iter().map(|item| decode_entity(item, ctx)).collect(),
        WireValue::String(s) if s == NULL_SENTINEL => Ok(Vec::new()),
        other => Err(DecodeError::Message(format!(
            "expected an array of {}, got {}",
            E::KIND.plural(),
            other.kind_name()
        ))),
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = CobblerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s || kind.plural() == s)
            .ok_or_else(|| CobblerError::Validation(format!("unknown item kind `{s}`")))
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
