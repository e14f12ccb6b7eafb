use std::sync::LazyLock;

use serde::Serialize;

use crate::{
    field, sync::FieldSpec, value::Inheritable, CobblerError, CobblerResult, ServerVersion,
};

use super::{item_fields, Entity, Item, ItemKind};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The server derives a default child object from a profile's name as soon as the first attribute
/// is written, so the name goes first.
static PROFILE_FIELDS: LazyLock<Vec<FieldSpec<Profile>>> = LazyLock::new(|| {
    let mut fields = item_fields::<Profile>();
    if let Some(name) = fields.iter_mut().find(|spec| spec.wire_name() == "name") {
        *name = field!(Profile, "name" => item.name).first();
    }
    fields.extend([
        field!(Profile, "distro" => distro),
        field!(Profile, "autoinstall" => autoinstall),
        field!(Profile, "boot_loaders" => boot_loaders),
        field!(Profile, "dhcp_tag" => dhcp_tag),
        field!(Profile, "display_name" => display_name)
            .new_field()
            .added_in(ServerVersion::new(3, 3, 0)),
        field!(Profile, "enable_ipxe" => enable_ipxe),
        field!(Profile, "enable_menu" => enable_menu),
        field!(Profile, "filename" => filename),
        field!(Profile, "menu" => menu),
        field!(Profile, "name_servers" => name_servers),
        field!(Profile, "name_servers_search" => name_servers_search),
        field!(Profile, "next_server_v4" => next_server_v4),
        field!(Profile, "next_server_v6" => next_server_v6),
        field!(Profile, "proxy" => proxy),
        field!(Profile, "redhat_management_key" => redhat_management_key),
        field!(Profile, "repos" => repos),
        field!(Profile, "server" => server),
        field!(Profile, "virt_auto_boot" => virt_auto_boot),
        field!(Profile, "virt_bridge" => virt_bridge),
        field!(Profile, "virt_cpus" => virt_cpus),
        field!(Profile, "virt_disk_driver" => virt_disk_driver),
        field!(Profile, "virt_file_size" => virt_file_size),
        field!(Profile, "virt_path" => virt_path),
        field!(Profile, "virt_ram" => virt_ram),
        field!(Profile, "virt_type" => virt_type),
    ]);
    fields
});

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A provisioning profile: a distro plus everything needed to install it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    /// The shared item attributes.
    #[serde(flatten)]
    pub item: Item,

    /// The distro this profile installs. Required.
    pub distro: String,

    /// The autoinstall template.
    pub autoinstall: Inheritable<String>,

    /// The boot loaders this profile supports.
    pub boot_loaders: Inheritable<Vec<String>>,

    /// The DHCP tag.
    pub dhcp_tag: String,

    /// The name shown in boot menus.
    pub display_name: String,

    /// Whether iPXE is used.
    pub enable_ipxe: Inheritable<bool>,

    /// Whether the profile appears in boot menus.
    pub enable_menu: Inheritable<bool>,

    /// The DHCP boot filename.
    pub filename: String,

    /// The menu the profile belongs to.
    pub menu: String,

    /// DNS servers.
    pub name_servers: Inheritable<Vec<String>>,

    /// DNS search domains.
    pub name_servers_search: Inheritable<Vec<String>>,

    /// The IPv4 boot server.
    pub next_server_v4: Inheritable<String>,

    /// The IPv6 boot server.
    pub next_server_v6: Inheritable<String>,

    /// The proxy used during installation.
    pub proxy: Inheritable<String>,

    /// The Red Hat management key.
    pub redhat_management_key: Inheritable<String>,

    /// Repositories made available during installation.
    pub repos: Inheritable<Vec<String>>,

    /// The server address written into templates.
    pub server: Inheritable<String>,

    /// Whether virtual machines start when the host boots.
    pub virt_auto_boot: Inheritable<bool>,

    /// The bridge virtual machines attach to.
    pub virt_bridge: Inheritable<String>,

    /// The number of virtual CPUs.
    pub virt_cpus: Inheritable<i64>,

    /// The virtual disk driver.
    pub virt_disk_driver: Inheritable<String>,

    /// The virtual disk size in GB.
    pub virt_file_size: Inheritable<f64>,

    /// Where virtual disks are stored.
    pub virt_path: Inheritable<String>,

    /// The virtual machine's RAM in MB.
    pub virt_ram: Inheritable<i64>,

    /// The virtualization type, e.g. `kvm`.
    pub virt_type: Inheritable<String>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Profile {
    /// Creates a profile with the server's defaults for the given name and distro.
    pub fn new(name: impl Into<String>, distro: impl Into<String>) -> Self {
        let mut profile = Self::default();
        profile.item.name = name.into();
        profile.distro = distro.into();
        profile
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for Profile {
    fn default() -> Self {
        Self {
            item: Item::inheriting(),
            distro: String::new(),
            autoinstall: Inheritable::inherit(),
            boot_loaders: Inheritable::inherit(),
            dhcp_tag: String::new(),
            display_name: String::new(),
            enable_ipxe: Inheritable::inherit(),
            enable_menu: Inheritable::inherit(),
            filename: String::new(),
            menu: String::new(),
            name_servers: Inheritable::inherit(),
            name_servers_search: Inheritable::inherit(),
            next_server_v4: Inheritable::inherit(),
            next_server_v6: Inheritable::inherit(),
            proxy: Inheritable::inherit(),
            redhat_management_key: Inheritable::inherit(),
            repos: Inheritable::explicit(Vec::new()),
            server: Inheritable::inherit(),
            virt_auto_boot: Inheritable::inherit(),
            virt_bridge: Inheritable::inherit(),
            virt_cpus: Inheritable::inherit(),
            virt_disk_driver: Inheritable::inherit(),
            virt_file_size: Inheritable::inherit(),
            virt_path: Inheritable::inherit(),
            virt_ram: Inheritable::inherit(),
            virt_type: Inheritable::inherit(),
        }
    }
}

impl Entity for Profile {
    const KIND: ItemKind = ItemKind::Profile;

    fn fields() -> &'static [FieldSpec<Self>] {
        &PROFILE_FIELDS
    }

    fn item(&self) -> &Item {
        &self.item
    }

    fn item_mut(&mut self) -> &mut Item {
        &mut self.item
    }

    fn validate(&self) -> CobblerResult<()> {
        if self.distro.trim().is_empty() {
            return Err(CobblerError::Validation(format!(
                "profile `{}` must reference a distro",
                self.item.name
            )));
        }
        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
