use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{field, sync::FieldSpec, value::Inheritable, wire::WireValue};

use super::Entity;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Free-form key/value options, such as kernel options or autoinstall metadata.
pub type Options = BTreeMap<String, WireValue>;

/// The attributes every item shares.
///
/// `parent`, `depth`, `children`, `ctime`, `mtime`, `uid` and `is_subobject` are computed by the
/// server and are never written back.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Item {
    /// The item's name, unique within its kind.
    pub name: String,

    /// A free-text comment.
    pub comment: String,

    /// The name of the parent item, if any.
    pub parent: String,

    /// How deep the item sits in its inheritance chain.
    pub depth: i64,

    /// The names of the item's children.
    pub children: Vec<String>,

    /// Creation time, in seconds since the epoch.
    pub ctime: f64,

    /// Last modification time, in seconds since the epoch.
    pub mtime: f64,

    /// An opaque unique identifier.
    pub uid: String,

    /// Whether the item is a child of another item of the same kind.
    pub is_subobject: bool,

    /// The users and groups allowed to edit the item.
    pub owners: Inheritable<Vec<String>>,

    /// Kernel command line options used during installation.
    pub kernel_options: Inheritable<Options>,

    /// Kernel command line options used after installation.
    pub kernel_options_post: Inheritable<Options>,

    /// Variables available to autoinstall templates.
    pub autoinstall_meta: Inheritable<Options>,

    /// Files served over TFTP and HTTP, as `destination → source`.
    pub fetchable_files: Inheritable<Options>,

    /// Files placed in the TFTP boot directory, as `destination → source`.
    pub boot_files: Inheritable<Options>,

    /// Templates rendered onto the installed machine, as `source → destination`.
    pub template_files: Inheritable<Options>,

    /// Configuration management classes applied to the item.
    pub mgmt_classes: Inheritable<Vec<String>>,

    /// Parameters passed to configuration management.
    pub mgmt_parameters: Inheritable<Options>,

    /// Attributes the server sent that this client has no field for.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, WireValue>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Item {
    /// Creates a base item whose inheritable attributes all come from the parent.
    pub fn inheriting() -> Self {
        Self {
            owners: Inheritable::inherit(),
            kernel_options: Inheritable::inherit(),
            kernel_options_post: Inheritable::inherit(),
            autoinstall_meta: Inheritable::inherit(),
            fetchable_files: Inheritable::inherit(),
            boot_files: Inheritable::inherit(),
            template_files: Inheritable::inherit(),
            mgmt_classes: Inheritable::inherit(),
            mgmt_parameters: Inheritable::inherit(),
            ..Self::default()
        }
    }

    /// Creates a base item with explicit empty attributes and owners taken from the server's
    /// settings.
    pub fn standalone() -> Self {
        Self {
            owners: Inheritable::inherit(),
            mgmt_parameters: Inheritable::inherit(),
            ..Self::default()
        }
    }

    /// Returns the creation time, if the server has set it.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        seconds_to_datetime(self.ctime)
    }

    /// Returns the last modification time, if the server has set it.
    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        seconds_to_datetime(self.mtime)
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Returns the field table shared by every entity. Entity tables start with these entries.
pub fn item_fields<E: Entity>() -> Vec<FieldSpec<E>> {
    vec![
        field!(E, "name" => @item name),
        field!(E, "comment" => @item comment),
        field!(E, "parent" => @item parent).no_update(),
        field!(E, "depth" => @item depth).no_update(),
        field!(E, "children" => @item children).no_update(),
        field!(E, "ctime" => @item ctime).no_update(),
        field!(E, "mtime" => @item mtime).no_update(),
        field!(E, "uid" => @item uid).no_update(),
        field!(E, "is_subobject" => @item is_subobject).no_update(),
        field!(E, "owners" => @item owners),
        field!(E, "kernel_options" => @item kernel_options),
        field!(E, "kernel_options_post" => @item kernel_options_post),
        field!(E, "autoinstall_meta" => @item autoinstall_meta),
        field!(E, "fetchable_files" => @item fetchable_files),
        field!(E, "boot_files" => @item boot_files),
        field!(E, "template_files" => @item template_files),
        field!(E, "mgmt_classes" => @item mgmt_classes),
        field!(E, "mgmt_parameters" => @item mgmt_parameters),
    ]
}

fn seconds_to_datetime(seconds: f64) -> Option<DateTime<Utc>> {
    if seconds <= 0.0 {
        return None;
    }
    let whole = seconds.trunc() as i64;
    let nanos = (seconds.fract() * 1e9) as u32;
    DateTime::from_timestamp(whole, nanos)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_timestamps() {
        let item = Item {
            ctime: 1_700_000_000.5,
            ..Item::default()
        };
        let created = item.created_at().unwrap();
        assert_eq!(created.timestamp(), 1_700_000_000);
        assert_eq!(created.timestamp_subsec_millis(), 500);
        assert!(item.modified_at().is_none());
    }

    #[test]
    fn test_item_defaults() {
        let inheriting = Item::inheriting();
        assert!(inheriting.kernel_options.is_inherited());
        assert!(inheriting.owners.is_inherited());

        let standalone = Item::standalone();
        assert!(!standalone.kernel_options.is_inherited());
        assert_eq!(standalone.kernel_options.value(), Some(&Options::new()));
        assert!(standalone.owners.is_inherited());
    }
}
