use std::sync::LazyLock;

use serde::Serialize;

use crate::{field, sync::FieldSpec, value::Inheritable};

use super::{item_fields, Entity, Item, ItemKind, Options};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

static REPO_FIELDS: LazyLock<Vec<FieldSpec<Repo>>> = LazyLock::new(|| {
    let mut fields = item_fields::<Repo>();
    fields.extend([
        field!(Repo, "apt_components" => apt_components),
        field!(Repo, "apt_dists" => apt_dists),
        field!(Repo, "arch" => arch),
        field!(Repo, "breed" => breed),
        field!(Repo, "createrepo_flags" => createrepo_flags),
        field!(Repo, "environment" => environment),
        field!(Repo, "keep_updated" => keep_updated),
        field!(Repo, "mirror" => mirror),
        field!(Repo, "mirror_locally" => mirror_locally),
        field!(Repo, "mirror_type" => mirror_type),
        field!(Repo, "os_version" => os_version),
        field!(Repo, "priority" => priority),
        field!(Repo, "proxy" => proxy),
        field!(Repo, "rpm_list" => rpm_list),
        field!(Repo, "rsyncopts" => rsyncopts),
        field!(Repo, "yumopts" => yumopts),
    ]);
    fields
});

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A package repository, optionally mirrored onto the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Repo {
    /// The shared item attributes.
    #[serde(flatten)]
    pub item: Item,

    /// APT components, e.g. `main`.
    pub apt_components: Vec<String>,

    /// APT distributions, e.g. `bookworm`.
    pub apt_dists: Vec<String>,

    /// The architecture mirrored.
    pub arch: String,

    /// The repository format, e.g. `yum` or `apt`.
    pub breed: String,

    /// Flags passed to `createrepo`.
    pub createrepo_flags: Inheritable<String>,

    /// Environment variables set while mirroring.
    pub environment: Options,

    /// Whether the mirror is refreshed on reposync.
    pub keep_updated: bool,

    /// The upstream URL.
    pub mirror: String,

    /// Whether the repository is copied onto the server.
    pub mirror_locally: bool,

    /// How the mirror URL is interpreted, e.g. `baseurl`.
    pub mirror_type: String,

    /// The operating system version the repository targets.
    pub os_version: String,

    /// The yum priority.
    pub priority: i64,

    /// The proxy used while mirroring.
    pub proxy: Inheritable<String>,

    /// Restricts mirroring to these packages.
    pub rpm_list: Vec<String>,

    /// Options passed to rsync.
    pub rsyncopts: Options,

    /// Options written into the generated yum configuration.
    pub yumopts: Options,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Repo {
    /// Creates a repository with the server's defaults for the given name and mirror URL.
    pub fn new(name: impl Into<String>, mirror: impl Into<String>) -> Self {
        let mut repo = Self::default();
        repo.item.name = name.into();
        repo.mirror = mirror.into();
        repo
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for Repo {
    fn default() -> Self {
        Self {
            item: Item::standalone(),
            apt_components: Vec::new(),
            apt_dists: Vec::new(),
            arch: "none".to_string(),
            breed: "none".to_string(),
            createrepo_flags: Inheritable::inherit(),
            environment: Options::new(),
            keep_updated: true,
            mirror: String::new(),
            mirror_locally: true,
            mirror_type: "baseurl".to_string(),
            os_version: String::new(),
            priority: 99,
            proxy: Inheritable::inherit(),
            rpm_list: Vec::new(),
            rsyncopts: Options::new(),
            yumopts: Options::new(),
        }
    }
}

impl Entity for Repo {
    const KIND: ItemKind = ItemKind::Repo;

    fn fields() -> &'static [FieldSpec<Self>] {
        &REPO_FIELDS
    }

    fn item(&self) -> &Item {
        &self.item
    }

    fn item_mut(&mut self) -> &mut Item {
        &mut self.item
    }
}
