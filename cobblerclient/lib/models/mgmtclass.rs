use std::sync::LazyLock;

use serde::Serialize;

use crate::{field, sync::FieldSpec};

use super::{item_fields, Entity, Item, ItemKind, Options};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

static MGMTCLASS_FIELDS: LazyLock<Vec<FieldSpec<MgmtClass>>> = LazyLock::new(|| {
    let mut fields = item_fields::<MgmtClass>();
    fields.extend([
        field!(MgmtClass, "class_name" => class_name),
        field!(MgmtClass, "files" => files),
        field!(MgmtClass, "is_definition" => is_definition),
        field!(MgmtClass, "packages" => packages),
        field!(MgmtClass, "params" => params),
    ]);
    fields
});

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A configuration management class bundling files and packages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MgmtClass {
    /// The shared item attributes.
    #[serde(flatten)]
    pub item: Item,

    /// The class name used by the configuration management tool.
    pub class_name: String,

    /// The file resources the class installs.
    pub files: Vec<String>,

    /// Whether the class is a definition rather than a class.
    pub is_definition: bool,

    /// The package resources the class installs.
    pub packages: Vec<String>,

    /// Parameters passed to the class.
    pub params: Options,
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for MgmtClass {
    fn default() -> Self {
        Self {
            item: Item::standalone(),
            class_name: String::new(),
            files: Vec::new(),
            is_definition: false,
            packages: Vec::new(),
            params: Options::new(),
        }
    }
}

impl Entity for MgmtClass {
    const KIND: ItemKind = ItemKind::MgmtClass;

    fn fields() -> &'static [FieldSpec<Self>] {
        &MGMTCLASS_FIELDS
    }

    fn item(&self) -> &Item {
        &self.item
    }

    fn item_mut(&mut self) -> &mut Item {
        &mut self.item
    }
}
