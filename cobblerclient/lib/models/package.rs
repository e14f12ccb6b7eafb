use std::sync::LazyLock;

use serde::Serialize;

use crate::{field, sync::FieldSpec};

use super::{item_fields, Entity, Item, ItemKind};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

static PACKAGE_FIELDS: LazyLock<Vec<FieldSpec<Package>>> = LazyLock::new(|| {
    let mut fields = item_fields::<Package>();
    fields.extend([
        field!(Package, "action" => action),
        field!(Package, "installer" => installer),
        field!(Package, "version" => version),
    ]);
    fields
});

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A package that configuration management installs or removes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Package {
    /// The shared item attributes.
    #[serde(flatten)]
    pub item: Item,

    /// `install` or `remove`.
    pub action: String,

    /// The package manager, e.g. `yum`.
    pub installer: String,

    /// The package version; empty for the latest.
    pub version: String,
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for Package {
    fn default() -> Self {
        Self {
            item: Item::standalone(),
            action: "install".to_string(),
            installer: String::new(),
            version: String::new(),
        }
    }
}

impl Entity for Package {
    const KIND: ItemKind = ItemKind::Package;

    fn fields() -> &'static [FieldSpec<Self>] {
        &PACKAGE_FIELDS
    }

    fn item(&self) -> &Item {
        &self.item
    }

    fn item_mut(&mut self) -> &mut Item {
        &mut self.item
    }
}
