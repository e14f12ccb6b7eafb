use std::sync::LazyLock;

use serde::Serialize;

use crate::{field, sync::FieldSpec, value::Inheritable, wire::WireValue, ServerVersion};

use super::{item_fields, Entity, Item, ItemKind};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

static DISTRO_FIELDS: LazyLock<Vec<FieldSpec<Distro>>> = LazyLock::new(|| {
    let mut fields = item_fields::<Distro>();
    fields.extend([
        field!(Distro, "arch" => arch),
        field!(Distro, "breed" => breed),
        field!(Distro, "os_version" => os_version),
        field!(Distro, "kernel" => kernel),
        field!(Distro, "initrd" => initrd),
        field!(Distro, "remote_boot_kernel" => remote_boot_kernel)
            .new_field()
            .added_in(ServerVersion::new(3, 2, 0)),
        field!(Distro, "remote_boot_initrd" => remote_boot_initrd)
            .new_field()
            .added_in(ServerVersion::new(3, 2, 0)),
        field!(Distro, "boot_loaders" => boot_loaders),
        field!(Distro, "redhat_management_key" => redhat_management_key),
        field!(Distro, "source_repos" => source_repos).no_update(),
        field!(Distro, "tree_build_time" => tree_build_time).no_update(),
    ]);
    fields
});

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A kernel and initrd pair together with the operating system they boot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distro {
    /// The shared item attributes.
    #[serde(flatten)]
    pub item: Item,

    /// The CPU architecture, e.g. `x86_64`.
    pub arch: String,

    /// The operating system family, e.g. `redhat`.
    pub breed: String,

    /// The operating system version, e.g. `rhel9`.
    pub os_version: String,

    /// The absolute path of the kernel on the server.
    pub kernel: String,

    /// The absolute path of the initrd on the server.
    pub initrd: String,

    /// The URL of a kernel fetched at boot time.
    pub remote_boot_kernel: String,

    /// The URL of an initrd fetched at boot time.
    pub remote_boot_initrd: String,

    /// The boot loaders this distro supports.
    pub boot_loaders: Inheritable<Vec<String>>,

    /// The Red Hat management key.
    pub redhat_management_key: Inheritable<String>,

    /// Repositories discovered when the distro was imported.
    pub source_repos: WireValue,

    /// When the imported tree was built, in seconds since the epoch.
    pub tree_build_time: f64,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Distro {
    /// Creates a distro with the server's defaults and the given name, kernel and initrd.
    pub fn new(
        name: impl Into<String>,
        kernel: impl Into<String>,
        initrd: impl Into<String>,
    ) -> Self {
        let mut distro = Self::default();
        distro.item.name = name.into();
        distro.kernel = kernel.into();
        distro.initrd = initrd.into();
        distro
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for Distro {
    fn default() -> Self {
        Self {
            item: Item::standalone(),
            arch: "x86_64".to_string(),
            breed: "redhat".to_string(),
            os_version: "virtio26".to_string(),
            kernel: String::new(),
            initrd: String::new(),
            remote_boot_kernel: String::new(),
            remote_boot_initrd: String::new(),
            boot_loaders: Inheritable::inherit(),
            redhat_management_key: Inheritable::inherit(),
            source_repos: WireValue::Array(Vec::new()),
            tree_build_time: 0.0,
        }
    }
}

impl Entity for Distro {
    const KIND: ItemKind = ItemKind::Distro;

    fn fields() -> &'static [FieldSpec<Self>] {
        &DISTRO_FIELDS
    }

    fn item(&self) -> &Item {
        &self.item
    }

    fn item_mut(&mut self) -> &mut Item {
        &mut self.item
    }
}
