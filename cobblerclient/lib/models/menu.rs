use std::sync::LazyLock;

use serde::Serialize;

use crate::{field, sync::FieldSpec};

use super::{item_fields, Entity, Item, ItemKind};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

static MENU_FIELDS: LazyLock<Vec<FieldSpec<Menu>>> = LazyLock::new(|| {
    let mut fields = item_fields::<Menu>();
    fields.push(field!(Menu, "display_name" => display_name));
    fields
});

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A boot menu grouping profiles and images.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Menu {
    /// The shared item attributes.
    #[serde(flatten)]
    pub item: Item,

    /// The title shown at boot.
    pub display_name: String,
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for Menu {
    fn default() -> Self {
        Self {
            item: Item::standalone(),
            display_name: String::new(),
        }
    }
}

impl Entity for Menu {
    const KIND: ItemKind = ItemKind::Menu;

    fn fields() -> &'static [FieldSpec<Self>] {
        &MENU_FIELDS
    }

    fn item(&self) -> &Item {
        &self.item
    }

    fn item_mut(&mut self) -> &mut Item {
        &mut self.item
    }
}
