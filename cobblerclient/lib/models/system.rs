use std::{collections::BTreeMap, sync::LazyLock};

use serde::{Deserialize, Serialize};

use crate::{
    field,
    sync::FieldSpec,
    value::{deserialize_inheritable, Inheritable},
    wire::{ToWire, WireValue},
    CobblerError, CobblerResult,
};

use super::{item_fields, Entity, Item, ItemKind};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The attribute written to update network interfaces in one call.
pub const MODIFY_INTERFACE: &str = "modify_interface";

static SYSTEM_FIELDS: LazyLock<Vec<FieldSpec<System>>> = LazyLock::new(|| {
    let mut fields = item_fields::<System>();
    fields.extend([
        field!(System, "profile" => profile),
        field!(System, "image" => image),
        field!(System, "autoinstall" => autoinstall),
        field!(System, "boot_loaders" => boot_loaders),
        field!(System, "enable_ipxe" => enable_ipxe),
        field!(System, "gateway" => gateway),
        field!(System, "hostname" => hostname),
        field!(System, "ipv6_default_device" => ipv6_default_device),
        field!(System, "name_servers" => name_servers),
        field!(System, "name_servers_search" => name_servers_search),
        field!(System, "netboot_enabled" => netboot_enabled),
        field!(System, "next_server_v4" => next_server_v4),
        field!(System, "next_server_v6" => next_server_v6),
        field!(System, "power_address" => power_address),
        field!(System, "power_id" => power_id),
        field!(System, "power_pass" => power_pass),
        field!(System, "power_type" => power_type),
        field!(System, "power_user" => power_user),
        field!(System, "proxy" => proxy),
        field!(System, "redhat_management_key" => redhat_management_key),
        field!(System, "server" => server),
        field!(System, "status" => status),
        field!(System, "virt_auto_boot" => virt_auto_boot),
        field!(System, "virt_cpus" => virt_cpus),
        field!(System, "virt_disk_driver" => virt_disk_driver),
        field!(System, "virt_file_size" => virt_file_size),
        field!(System, "virt_path" => virt_path),
        field!(System, "virt_pxe_boot" => virt_pxe_boot),
        field!(System, "virt_ram" => virt_ram),
        field!(System, "virt_type" => virt_type),
        field!(System, "interfaces" => interfaces).no_update(),
    ]);
    fields
});

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A concrete machine provisioned from a profile or an image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct System {
    /// The shared item attributes.
    #[serde(flatten)]
    pub item: Item,

    /// The profile the system is installed from.
    pub profile: String,

    /// The image the system is installed from.
    pub image: String,

    /// The autoinstall template.
    pub autoinstall: Inheritable<String>,

    /// The boot loaders the system supports.
    pub boot_loaders: Inheritable<Vec<String>>,

    /// Whether iPXE is used.
    pub enable_ipxe: Inheritable<bool>,

    /// The default gateway.
    pub gateway: String,

    /// The system's hostname.
    pub hostname: String,

    /// The interface carrying the default IPv6 route.
    pub ipv6_default_device: String,

    /// DNS servers.
    pub name_servers: Inheritable<Vec<String>>,

    /// DNS search domains.
    pub name_servers_search: Inheritable<Vec<String>>,

    /// Whether the system boots from the network on its next start.
    pub netboot_enabled: bool,

    /// The IPv4 boot server.
    pub next_server_v4: Inheritable<String>,

    /// The IPv6 boot server.
    pub next_server_v6: Inheritable<String>,

    /// The address of the power management controller.
    pub power_address: String,

    /// The power management plug or port.
    pub power_id: String,

    /// The power management password.
    pub power_pass: String,

    /// The power management fence agent, e.g. `ipmilan`.
    pub power_type: String,

    /// The power management user.
    pub power_user: String,

    /// The proxy used during installation.
    pub proxy: Inheritable<String>,

    /// The Red Hat management key.
    pub redhat_management_key: Inheritable<String>,

    /// The server address written into templates.
    pub server: Inheritable<String>,

    /// The deployment status, e.g. `production`.
    pub status: String,

    /// Whether a virtual system starts when its host boots.
    pub virt_auto_boot: Inheritable<bool>,

    /// The number of virtual CPUs.
    pub virt_cpus: Inheritable<i64>,

    /// The virtual disk driver.
    pub virt_disk_driver: Inheritable<String>,

    /// The virtual disk size in GB.
    pub virt_file_size: Inheritable<f64>,

    /// Where virtual disks are stored.
    pub virt_path: Inheritable<String>,

    /// Whether a virtual system boots over PXE.
    pub virt_pxe_boot: bool,

    /// The virtual machine's RAM in MB.
    pub virt_ram: Inheritable<i64>,

    /// The virtualization type.
    pub virt_type: Inheritable<String>,

    /// Network interfaces keyed by device name. Written through [`MODIFY_INTERFACE`].
    pub interfaces: BTreeMap<String, Interface>,
}

/// A network interface of a [`System`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Interface {
    /// Bonding options.
    pub bonding_opts: String,

    /// Bridge options.
    pub bridge_opts: String,

    /// DNS aliases.
    pub cnames: Vec<String>,

    /// Whether InfiniBand connected mode is used.
    pub connected_mode: bool,

    /// The DHCP tag.
    pub dhcp_tag: String,

    /// The DNS name.
    pub dns_name: String,

    /// The per-interface gateway.
    pub if_gateway: String,

    /// The master of a bonded or bridged interface.
    pub interface_master: String,

    /// The interface type, e.g. `bond_slave`.
    pub interface_type: String,

    /// The IPv4 address.
    pub ip_address: String,

    /// The IPv6 address.
    pub ipv6_address: String,

    /// The default IPv6 gateway.
    pub ipv6_default_gateway: String,

    /// The IPv6 MTU.
    pub ipv6_mtu: String,

    /// The IPv6 prefix.
    pub ipv6_prefix: String,

    /// Secondary IPv6 addresses.
    pub ipv6_secondaries: Vec<String>,

    /// IPv6 static routes.
    pub ipv6_static_routes: Vec<String>,

    /// The MAC address.
    pub mac_address: String,

    /// Whether this is the management interface.
    pub management: bool,

    /// The MTU.
    pub mtu: String,

    /// The IPv4 netmask.
    pub netmask: String,

    /// Whether the address is static.
    #[serde(rename = "static")]
    pub static_address: bool,

    /// IPv4 static routes.
    pub static_routes: Vec<String>,

    /// The bridge a virtual interface attaches to.
    #[serde(deserialize_with = "deserialize_inheritable")]
    pub virt_bridge: Inheritable<String>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl System {
    /// Creates a system with the server's defaults for the given name and profile.
    pub fn new(name: impl Into<String>, profile: impl Into<String>) -> Self {
        let mut system = Self::default();
        system.item.name = name.into();
        system.profile = profile.into();
        system
    }
}

impl Interface {
    /// Returns each attribute as `(field name, modify_interface key prefix, value)`.
    ///
    /// The bridge is left out while it is only known in flattened form.
    fn attributes(&self) -> Vec<(&'static str, &'static str, WireValue)> {
        let mut attributes = vec![
            ("bonding_opts", "bondingopts", self.bonding_opts.to_wire()),
            ("bridge_opts", "bridgeopts", self.bridge_opts.to_wire()),
            ("cnames", "cnames", self.cnames.to_wire()),
            ("connected_mode", "connected_mode", self.connected_mode.to_wire()),
            ("dhcp_tag", "dhcptag", self.dhcp_tag.to_wire()),
            ("dns_name", "dnsname", self.dns_name.to_wire()),
            ("if_gateway", "if_gateway", self.if_gateway.to_wire()),
            ("interface_master", "interfacemaster", self.interface_master.to_wire()),
            ("interface_type", "interfacetype", self.interface_type.to_wire()),
            ("ip_address", "ipaddress", self.ip_address.to_wire()),
            ("ipv6_address", "ipv6address", self.ipv6_address.to_wire()),
            (
                "ipv6_default_gateway",
                "ipv6defaultgateway",
                self.ipv6_default_gateway.to_wire(),
            ),
            ("ipv6_mtu", "ipv6mtu", self.ipv6_mtu.to_wire()),
            ("ipv6_prefix", "ipv6prefix", self.ipv6_prefix.to_wire()),
            ("ipv6_secondaries", "ipv6secondaries", self.ipv6_secondaries.to_wire()),
            (
                "ipv6_static_routes",
                "ipv6staticroutes",
                self.ipv6_static_routes.to_wire(),
            ),
            ("mac_address", "macaddress", self.mac_address.to_wire()),
            ("management", "management", self.management.to_wire()),
            ("mtu", "mtu", self.mtu.to_wire()),
            ("netmask", "netmask", self.netmask.to_wire()),
            ("static", "static", self.static_address.to_wire()),
            ("static_routes", "static_routes", self.static_routes.to_wire()),
        ];
        if let Some(value) = self.virt_bridge.encode() {
            attributes.push(("virt_bridge", "virtbridge", value));
        }
        attributes
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for System {
    fn default() -> Self {
        Self {
            item: Item::inheriting(),
            profile: String::new(),
            image: String::new(),
            autoinstall: Inheritable::inherit(),
            boot_loaders: Inheritable::inherit(),
            enable_ipxe: Inheritable::inherit(),
            gateway: String::new(),
            hostname: String::new(),
            ipv6_default_device: String::new(),
            name_servers: Inheritable::explicit(Vec::new()),
            name_servers_search: Inheritable::explicit(Vec::new()),
            netboot_enabled: false,
            next_server_v4: Inheritable::inherit(),
            next_server_v6: Inheritable::inherit(),
            power_address: String::new(),
            power_id: String::new(),
            power_pass: String::new(),
            power_type: String::new(),
            power_user: String::new(),
            proxy: Inheritable::inherit(),
            redhat_management_key: Inheritable::inherit(),
            server: Inheritable::inherit(),
            status: String::new(),
            virt_auto_boot: Inheritable::inherit(),
            virt_cpus: Inheritable::inherit(),
            virt_disk_driver: Inheritable::inherit(),
            virt_file_size: Inheritable::inherit(),
            virt_path: Inheritable::inherit(),
            virt_pxe_boot: false,
            virt_ram: Inheritable::inherit(),
            virt_type: Inheritable::inherit(),
            interfaces: BTreeMap::new(),
        }
    }
}

impl Default for Interface {
    fn default() -> Self {
        Self {
            bonding_opts: String::new(),
            bridge_opts: String::new(),
            cnames: Vec::new(),
            connected_mode: false,
            dhcp_tag: String::new(),
            dns_name: String::new(),
            if_gateway: String::new(),
            interface_master: String::new(),
            interface_type: String::new(),
            ip_address: String::new(),
            ipv6_address: String::new(),
            ipv6_default_gateway: String::new(),
            ipv6_mtu: String::new(),
            ipv6_prefix: String::new(),
            ipv6_secondaries: Vec::new(),
            ipv6_static_routes: Vec::new(),
            mac_address: String::new(),
            management: false,
            mtu: String::new(),
            netmask: String::new(),
            static_address: false,
            static_routes: Vec::new(),
            virt_bridge: Inheritable::inherit(),
        }
    }
}

impl Entity for System {
    const KIND: ItemKind = ItemKind::System;

    fn fields() -> &'static [FieldSpec<Self>] {
        &SYSTEM_FIELDS
    }

    fn item(&self) -> &Item {
        &self.item
    }

    fn item_mut(&mut self) -> &mut Item {
        &mut self.item
    }

    fn validate(&self) -> CobblerResult<()> {
        if self.profile.trim().is_empty() && self.image.trim().is_empty() {
            return Err(CobblerError::Validation(format!(
                "system `{}` must reference a profile or an image",
                self.item.name
            )));
        }
        Ok(())
    }

    fn extra_modifications(&self) -> Vec<(String, WireValue)> {
        if self.interfaces.is_empty() {
            return Vec::new();
        }

        let attributes = self
            .interfaces
            .iter()
            .flat_map(|(device, interface)| {
                interface
                    .attributes()
                    .into_iter()
                    .map(move |(_, prefix, value)| (format!("{prefix}-{device}"), value))
            })
            .collect();

        vec![(MODIFY_INTERFACE.to_string(), WireValue::Struct(attributes))]
    }
}

impl ToWire for Interface {
    fn to_wire(&self) -> WireValue {
        WireValue::Struct(
            self.attributes()
                .into_iter()
                .map(|(field, _, value)| (field.to_string(), value))
                .collect(),
        )
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
