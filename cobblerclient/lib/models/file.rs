use std::sync::LazyLock;

use serde::Serialize;

use crate::{field, sync::FieldSpec, CobblerError, CobblerResult};

use super::{item_fields, Entity, Item, ItemKind};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

static FILE_FIELDS: LazyLock<Vec<FieldSpec<File>>> = LazyLock::new(|| {
    let mut fields = item_fields::<File>();
    fields.extend([
        field!(File, "action" => action),
        field!(File, "group" => group),
        field!(File, "is_dir" => is_dir),
        field!(File, "mode" => mode),
        field!(File, "owner" => owner),
        field!(File, "path" => path),
        field!(File, "template" => template),
    ]);
    fields
});

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A file or directory that configuration management places on provisioned machines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct File {
    /// The shared item attributes.
    #[serde(flatten)]
    pub item: Item,

    /// `create` or `remove`.
    pub action: String,

    /// The owning group.
    pub group: String,

    /// Whether the path is a directory.
    pub is_dir: bool,

    /// The permission bits, e.g. `0644`.
    pub mode: String,

    /// The owning user.
    pub owner: String,

    /// The absolute path on the provisioned machine.
    pub path: String,

    /// The template the file is rendered from.
    pub template: String,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl File {
    /// Creates a file resource with the server's defaults for the given name and path.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        let mut file = Self::default();
        file.item.name = name.into();
        file.path = path.into();
        file
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for File {
    fn default() -> Self {
        Self {
            item: Item::standalone(),
            action: "create".to_string(),
            group: String::new(),
            is_dir: false,
            mode: String::new(),
            owner: String::new(),
            path: String::new(),
            template: String::new(),
        }
    }
}

impl Entity for File {
    const KIND: ItemKind = ItemKind::File;

    fn fields() -> &'static [FieldSpec<Self>] {
        &FILE_FIELDS
    }

    fn item(&self) -> &Item {
        &self.item
    }

    fn item_mut(&mut self) -> &mut Item {
        &mut self.item
    }

    fn validate(&self) -> CobblerResult<()> {
        if !self.path.starts_with('/') {
            return Err(CobblerError::Validation(format!(
                "file `{}` must have an absolute path, got `{}`",
                self.item.name, self.path
            )));
        }
        Ok(())
    }
}
