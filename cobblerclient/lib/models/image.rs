use std::sync::LazyLock;

use serde::Serialize;

use crate::{field, sync::FieldSpec, value::Inheritable};

use super::{item_fields, Entity, Item, ItemKind};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

static IMAGE_FIELDS: LazyLock<Vec<FieldSpec<Image>>> = LazyLock::new(|| {
    let mut fields = item_fields::<Image>();
    fields.extend([
        field!(Image, "arch" => arch),
        field!(Image, "autoinstall" => autoinstall),
        field!(Image, "boot_loaders" => boot_loaders),
        field!(Image, "breed" => breed),
        field!(Image, "file" => file),
        field!(Image, "image_type" => image_type),
        field!(Image, "menu" => menu),
        field!(Image, "network_count" => network_count),
        field!(Image, "os_version" => os_version),
        field!(Image, "virt_auto_boot" => virt_auto_boot),
        field!(Image, "virt_bridge" => virt_bridge),
        field!(Image, "virt_cpus" => virt_cpus),
        field!(Image, "virt_disk_driver" => virt_disk_driver),
        field!(Image, "virt_file_size" => virt_file_size),
        field!(Image, "virt_path" => virt_path),
        field!(Image, "virt_ram" => virt_ram),
        field!(Image, "virt_type" => virt_type),
    ]);
    fields
});

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A pre-built disk or ISO image that systems can be deployed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Image {
    /// The shared item attributes.
    #[serde(flatten)]
    pub item: Item,

    /// The CPU architecture.
    pub arch: String,

    /// The autoinstall template.
    pub autoinstall: String,

    /// The boot loaders the image supports.
    pub boot_loaders: Inheritable<Vec<String>>,

    /// The operating system family.
    pub breed: String,

    /// The image's location, as a path or a `host:/path` share.
    pub file: String,

    /// The image format, e.g. `iso` or `virt-clone`.
    pub image_type: String,

    /// The menu the image appears in.
    pub menu: String,

    /// How many network interfaces a virtual machine gets.
    pub network_count: i64,

    /// The operating system version.
    pub os_version: String,

    /// Whether virtual machines start when the host boots.
    pub virt_auto_boot: bool,

    /// The bridge virtual machines attach to.
    pub virt_bridge: Inheritable<String>,

    /// The number of virtual CPUs.
    pub virt_cpus: i64,

    /// The virtual disk driver.
    pub virt_disk_driver: String,

    /// The virtual disk size in GB.
    pub virt_file_size: f64,

    /// Where virtual disks are stored.
    pub virt_path: String,

    /// The virtual machine's RAM in MB.
    pub virt_ram: i64,

    /// The virtualization type.
    pub virt_type: String,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Image {
    /// Creates an image with the server's defaults for the given name and file.
    pub fn new(name: impl Into<String>, file: impl Into<String>) -> Self {
        let mut image = Self::default();
        image.item.name = name.into();
        image.file = file.into();
        image
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for Image {
    fn default() -> Self {
        Self {
            item: Item::standalone(),
            arch: "x86_64".to_string(),
            autoinstall: String::new(),
            boot_loaders: Inheritable::inherit(),
            breed: String::new(),
            file: String::new(),
            image_type: "iso".to_string(),
            menu: String::new(),
            network_count: 0,
            os_version: String::new(),
            virt_auto_boot: false,
            virt_bridge: Inheritable::inherit(),
            virt_cpus: 1,
            virt_disk_driver: "raw".to_string(),
            virt_file_size: 0.0,
            virt_path: String::new(),
            virt_ram: 0,
            virt_type: "kvm".to_string(),
        }
    }
}

impl Entity for Image {
    const KIND: ItemKind = ItemKind::Image;

    fn fields() -> &'static [FieldSpec<Self>] {
        &IMAGE_FIELDS
    }

    fn item(&self) -> &Item {
        &self.item
    }

    fn item_mut(&mut self) -> &mut Item {
        &mut self.item
    }
}
