use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{
    models::Options,
    transport::Transport,
    wire::{normalize, ToWire, WireValue},
    CobblerError, CobblerResult,
};

use super::{expect_bool, expect_string, CobblerClient};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The identifier of a background task, used to poll its status and read its log.
pub type EventId = String;

/// The result of the `extended_version` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtendedVersion {
    /// The date of the last commit.
    pub gitdate: String,

    /// The hash of the last commit.
    pub gitstamp: String,

    /// When the server was built.
    pub builddate: String,

    /// The version string, e.g. `3.3.4`.
    pub version: String,

    /// The version as `[major, minor, patch]`.
    pub version_tuple: Vec<u64>,
}

/// The state of a background task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Still running.
    Running,

    /// Finished successfully.
    Complete,

    /// Finished with an error.
    Failed,

    /// A state this client does not know.
    #[serde(other)]
    Unknown,
}

/// The status of a background task as reported by `get_task_status` and `get_events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    /// When the task last changed state, in seconds since the epoch.
    pub time: f64,

    /// The task's name.
    pub name: String,

    /// The task's state.
    pub state: TaskState,

    /// The users who have seen the task's result.
    pub read_by: Vec<String>,
}

/// The OS signature table: breed name to OS version name to signature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Signatures {
    /// Signatures grouped by breed.
    pub breeds: BTreeMap<String, BTreeMap<String, OsVersionSignature>>,
}

/// How the server recognizes one operating system version in an imported tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OsVersionSignature {
    /// Directories searched for the version file.
    pub signatures: Vec<String>,

    /// A regular expression matching the version file's name.
    pub version_file: String,

    /// A regular expression matched against the version file's contents.
    pub version_file_regex: String,

    /// A regular expression matching kernel package names, capturing the architecture.
    pub kernel_arch: String,

    /// A regular expression matched against the kernel package names.
    pub kernel_arch_regex: String,

    /// The architectures the version ships for.
    pub supported_arches: Vec<String>,

    /// The repository formats the version uses.
    pub supported_repo_breeds: Vec<String>,

    /// A regular expression matching the kernel's file name.
    pub kernel_file: String,

    /// A regular expression matching the initrd's file name.
    pub initrd_file: String,

    /// Whether the tree boots through isolinux.
    pub isolinux_ok: bool,

    /// The default autoinstall template.
    pub default_autoinstall: String,

    /// Kernel options used during installation.
    pub kernel_options: String,

    /// Kernel options used after installation.
    pub kernel_options_post: String,

    /// Templates rendered for the version.
    pub template_files: String,

    /// Files placed in the TFTP boot directory.
    pub boot_files: Vec<String>,

    /// Boot loaders supported per architecture.
    pub boot_loaders: BTreeMap<String, Vec<String>>,
}

/// Options for `background_sync`.
#[derive(Debug, Clone, Default, PartialEq, TypedBuilder)]
pub struct SyncOptions {
    /// Only sync these systems. Empty syncs everything.
    #[builder(default, setter(into))]
    pub systems: Vec<String>,

    /// Whether the task logs verbosely.
    #[builder(default)]
    pub verbose: bool,
}

/// Options for `background_import`.
#[derive(Debug, Clone, Default, PartialEq, TypedBuilder)]
pub struct ImportOptions {
    /// Where the installation tree is, as a local path or an rsync URL.
    #[builder(setter(into))]
    pub path: String,

    /// The prefix for the imported items' names.
    #[builder(setter(into))]
    pub name: String,

    /// Restrict the import to this architecture.
    #[builder(default, setter(strip_option, into))]
    pub arch: Option<String>,

    /// Restrict the import to this breed.
    #[builder(default, setter(strip_option, into))]
    pub breed: Option<String>,

    /// Restrict the import to this OS version.
    #[builder(default, setter(strip_option, into))]
    pub os_version: Option<String>,

    /// Serve the tree from this URL instead of copying it.
    #[builder(default, setter(strip_option, into))]
    pub available_as: Option<String>,

    /// The autoinstall template for the imported profiles.
    #[builder(default, setter(strip_option, into))]
    pub autoinstall_file: Option<String>,

    /// Extra rsync flags.
    #[builder(default, setter(strip_option, into))]
    pub rsync_flags: Option<String>,
}

/// Options for `background_buildiso`.
#[derive(Debug, Clone, Default, PartialEq, TypedBuilder)]
pub struct BuildIsoOptions {
    /// The output file.
    #[builder(default, setter(strip_option, into))]
    pub iso: Option<String>,

    /// The profiles put on the ISO. Empty includes all.
    #[builder(default, setter(into))]
    pub profiles: Vec<String>,

    /// The systems put on the ISO. Empty includes all.
    #[builder(default, setter(into))]
    pub systems: Vec<String>,

    /// The scratch directory.
    #[builder(default, setter(strip_option, into))]
    pub buildisodir: Option<String>,

    /// The distro used for a standalone or airgapped ISO.
    #[builder(default, setter(strip_option, into))]
    pub distro: Option<String>,

    /// Whether the ISO carries the installation tree.
    #[builder(default)]
    pub standalone: bool,

    /// Whether the ISO carries the tree and needs no network at all.
    #[builder(default)]
    pub airgapped: bool,

    /// The installation tree to copy for a standalone ISO.
    #[builder(default, setter(strip_option, into))]
    pub source: Option<String>,

    /// Whether DNS settings are left out of the boot options.
    #[builder(default)]
    pub exclude_dns: bool,

    /// Extra `xorrisofs` options.
    #[builder(default, setter(strip_option, into))]
    pub xorrisofs_opts: Option<String>,
}

/// Options for `background_replicate`.
#[derive(Debug, Clone, Default, PartialEq, TypedBuilder)]
pub struct ReplicateOptions {
    /// The server to replicate from.
    #[builder(setter(into))]
    pub master: String,

    /// The master's API port.
    #[builder(default, setter(strip_option, into))]
    pub port: Option<String>,

    /// Patterns selecting distros.
    #[builder(default, setter(into))]
    pub distro_patterns: String,

    /// Patterns selecting profiles.
    #[builder(default, setter(into))]
    pub profile_patterns: String,

    /// Patterns selecting systems.
    #[builder(default, setter(into))]
    pub system_patterns: String,

    /// Patterns selecting repos.
    #[builder(default, setter(into))]
    pub repo_patterns: String,

    /// Patterns selecting images.
    #[builder(default, setter(into))]
    pub image_patterns: String,

    /// Patterns selecting management classes.
    #[builder(default, setter(into))]
    pub mgmtclass_patterns: String,

    /// Patterns selecting packages.
    #[builder(default, setter(into))]
    pub package_patterns: String,

    /// Patterns selecting files.
    #[builder(default, setter(into))]
    pub file_patterns: String,

    /// Whether local items missing on the master are removed.
    #[builder(default)]
    pub prune: bool,

    /// Whether only metadata is copied, not trees.
    #[builder(default)]
    pub omit_data: bool,

    /// Whether everything is replicated regardless of patterns.
    #[builder(default)]
    pub sync_all: bool,

    /// Whether the master is reached over HTTPS.
    #[builder(default)]
    pub use_ssl: bool,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl<T: Transport> CobblerClient<T> {
    /// Returns the server's full version information.
    pub async fn extended_version(&self) -> CobblerResult<ExtendedVersion> {
        let raw = self.call("extended_version", Vec::new()).await?;
        Ok(normalize(&raw)?)
    }

    /// Regenerates the server's boot and DHCP configuration and waits for it to finish.
    pub async fn sync(&self) -> CobblerResult<bool> {
        let token = self.require_token().await?;
        let raw = self.call("sync", vec![token.into()]).await?;
        expect_bool("sync", raw)
    }

    /// Starts a sync in the background.
    pub async fn background_sync(&self, options: &SyncOptions) -> CobblerResult<EventId> {
        self.background("background_sync", options.to_wire()).await
    }

    /// Starts importing an installation tree in the background.
    pub async fn background_import(&self, options: &ImportOptions) -> CobblerResult<EventId> {
        self.background("background_import", options.to_wire()).await
    }

    /// Starts building a boot ISO in the background.
    pub async fn background_buildiso(&self, options: &BuildIsoOptions) -> CobblerResult<EventId> {
        self.background("background_buildiso", options.to_wire())
            .await
    }

    /// Starts replicating from another server in the background.
    pub async fn background_replicate(
        &self,
        options: &ReplicateOptions,
    ) -> CobblerResult<EventId> {
        self.background("background_replicate", options.to_wire())
            .await
    }

    /// Starts refreshing the OS signature table in the background.
    pub async fn background_signature_update(&self) -> CobblerResult<EventId> {
        self.background("background_signature_update", Options::new().to_wire())
            .await
    }

    /// Starts hardlinking identical files under the web root in the background.
    pub async fn background_hardlink(&self) -> CobblerResult<EventId> {
        self.background("background_hardlink", Options::new().to_wire())
            .await
    }

    /// Returns the status of a background task.
    pub async fn get_task_status(&self, event_id: &str) -> CobblerResult<TaskStatus> {
        let raw = self.call("get_task_status", vec![event_id.into()]).await?;
        decode_task_status("get_task_status", &raw)
    }

    /// Returns every task visible to `for_user`, keyed by event id. An empty user sees all tasks.
    pub async fn get_events(
        &self,
        for_user: &str,
    ) -> CobblerResult<BTreeMap<EventId, TaskStatus>> {
        let raw = self.call("get_events", vec![for_user.into()]).await?;
        let events: BTreeMap<String, WireValue> = normalize(&raw)?;
        events
            .into_iter()
            .map(|(id, status)| Ok((id, decode_task_status("get_events", &status)?)))
            .collect()
    }

    /// Returns the log of a background task.
    pub async fn get_event_log(&self, event_id: &str) -> CobblerResult<String> {
        let raw = self.call("get_event_log", vec![event_id.into()]).await?;
        Ok(normalize(&raw)?)
    }

    /// Returns the OS signature table.
    pub async fn get_signatures(&self) -> CobblerResult<Signatures> {
        let token = self.token_or_empty().await;
        let raw = self.call("get_signatures", vec![token.into()]).await?;
        Ok(normalize(&raw)?)
    }

    /// Returns the server's settings.
    pub async fn get_settings(&self) -> CobblerResult<Options> {
        let token = self.token_or_empty().await;
        let raw = self.call("get_settings", vec![token.into()]).await?;
        Ok(normalize(&raw)?)
    }

    /// Returns the breeds the signature table knows.
    pub async fn get_valid_breeds(&self) -> CobblerResult<Vec<String>> {
        let token = self.token_or_empty().await;
        let raw = self.call("get_valid_breeds", vec![token.into()]).await?;
        Ok(normalize(&raw)?)
    }

    /// Returns the OS versions the signature table knows for `breed`.
    pub async fn get_valid_os_versions_for_breed(
        &self,
        breed: &str,
    ) -> CobblerResult<Vec<String>> {
        let token = self.token_or_empty().await;
        let raw = self
            .call(
                "get_valid_os_versions_for_breed",
                vec![breed.into(), token.into()],
            )
            .await?;
        Ok(normalize(&raw)?)
    }

    async fn background(&self, method: &str, options: WireValue) -> CobblerResult<EventId> {
        let token = self.require_token().await?;
        let raw = self.call(method, vec![options, token.into()]).await?;
        let event_id = expect_string(method, raw)?;
        tracing::debug!("{method} started as event {event_id}");
        Ok(event_id)
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Decodes the `[time, name, state, read_by]` array the server reports for a task.
fn decode_task_status(method: &str, raw: &WireValue) -> CobblerResult<TaskStatus> {
    let (time, name, state, read_by): (f64, String, TaskState, Vec<String>) = normalize(raw)
        .map_err(|_| CobblerError::UnexpectedResponse {
            method: method.to_string(),
            value: raw.clone(),
        })?;

    Ok(TaskStatus {
        time,
        name,
        state,
        read_by,
    })
}

fn insert_optional(map: &mut Options, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        map.insert(key.to_string(), WireValue::from(value));
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl ToWire for SyncOptions {
    fn to_wire(&self) -> WireValue {
        let mut map = Options::new();
        map.insert("systems".to_string(), WireValue::from(self.systems.clone()));
        map.insert("verbose".to_string(), WireValue::Bool(self.verbose));
        WireValue::Struct(map)
    }
}

impl ToWire for ImportOptions {
    fn to_wire(&self) -> WireValue {
        let mut map = Options::new();
        map.insert("path".to_string(), WireValue::from(&self.path));
        map.insert("name".to_string(), WireValue::from(&self.name));
        insert_optional(&mut map, "arch", &self.arch);
        insert_optional(&mut map, "breed", &self.breed);
        insert_optional(&mut map, "os_version", &self.os_version);
        insert_optional(&mut map, "available_as", &self.available_as);
        insert_optional(&mut map, "autoinstall_file", &self.autoinstall_file);
        insert_optional(&mut map, "rsync_flags", &self.rsync_flags);
        WireValue::Struct(map)
    }
}

impl ToWire for BuildIsoOptions {
    fn to_wire(&self) -> WireValue {
        let mut map = Options::new();
        insert_optional(&mut map, "iso", &self.iso);
        insert_optional(&mut map, "buildisodir", &self.buildisodir);
        insert_optional(&mut map, "distro", &self.distro);
        insert_optional(&mut map, "source", &self.source);
        insert_optional(&mut map, "xorrisofs_opts", &self.xorrisofs_opts);
        map.insert("profiles".to_string(), self.profiles.to_wire());
        map.insert("systems".to_string(), self.systems.to_wire());
        map.insert("standalone".to_string(), WireValue::Bool(self.standalone));
        map.insert("airgapped".to_string(), WireValue::Bool(self.airgapped));
        map.insert("exclude_dns".to_string(), WireValue::Bool(self.exclude_dns));
        WireValue::Struct(map)
    }
}

impl ToWire for ReplicateOptions {
    fn to_wire(&self) -> WireValue {
        let mut map = Options::new();
        map.insert("master".to_string(), WireValue::from(&self.master));
        insert_optional(&mut map, "port", &self.port);
        for (key, value) in [
            ("distro_patterns", &self.distro_patterns),
            ("profile_patterns", &self.profile_patterns),
            ("system_patterns", &self.system_patterns),
            ("repo_patterns", &self.repo_patterns),
            ("image_patterns", &self.image_patterns),
            ("mgmtclass_patterns", &self.mgmtclass_patterns),
            ("package_patterns", &self.package_patterns),
            ("file_patterns", &self.file_patterns),
        ] {
            map.insert(key.to_string(), WireValue::from(value));
        }
        map.insert("prune".to_string(), WireValue::Bool(self.prune));
        map.insert("omit_data".to_string(), WireValue::Bool(self.omit_data));
        map.insert("sync_all".to_string(), WireValue::Bool(self.sync_all));
        map.insert("use_ssl".to_string(), WireValue::Bool(self.use_ssl));
        WireValue::Struct(map)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_decoding() {
        let raw = WireValue::Array(vec![
            WireValue::Double(1_700_000_000.25),
            WireValue::from("Sync"),
            WireValue::from("complete"),
            WireValue::Array(vec![WireValue::from("cobbler")]),
        ]);

        let status = decode_task_status("get_task_status", &raw).unwrap();
        assert_eq!(status.name, "Sync");
        assert_eq!(status.state, TaskState::Complete);
        assert_eq!(status.read_by, vec!["cobbler"]);

        let odd = WireValue::Array(vec![
            WireValue::Int(0),
            WireValue::from("Import"),
            WireValue::from("queued"),
            WireValue::from("~"),
        ]);
        let status = decode_task_status("get_task_status", &odd).unwrap();
        assert_eq!(status.state, TaskState::Unknown);
        assert!(status.read_by.is_empty());

        let err = decode_task_status("get_task_status", &WireValue::from("~")).unwrap_err();
        assert!(matches!(err, CobblerError::UnexpectedResponse { .. }));
    }

    #[test]
    fn test_import_options_wire_form() {
        let options = ImportOptions::builder()
            .path("/mnt/centos9")
            .name("centos9")
            .arch("x86_64")
            .build();

        let wire = options.to_wire();
        let map = wire.as_struct().unwrap();
        assert_eq!(map["path"], WireValue::from("/mnt/centos9"));
        assert_eq!(map["arch"], WireValue::from("x86_64"));
        assert!(!map.contains_key("breed"));
    }

    #[test]
    fn test_signatures_decode_nested_sentinels() {
        let raw: WireValue = serde_json_to_wire(serde_json::json!({
            "breeds": {
                "redhat": {
                    "rhel9": {
                        "signatures": ["BaseOS"],
                        "version_file": "(redhat|centos)-release-9.*\\.rpm",
                        "kernel_arch": "kernel-(.*).rpm",
                        "supported_arches": ["x86_64", "aarch64"],
                        "isolinux_ok": 0,
                        "kernel_options": "~",
                        "boot_files": "~",
                        "boot_loaders": {"x86_64": ["grub", "pxe"]}
                    }
                },
                "windows": "~"
            }
        }));

        let signatures: Signatures = normalize(&raw).unwrap();
        let rhel9 = &signatures.breeds["redhat"]["rhel9"];
        assert_eq!(rhel9.signatures, vec!["BaseOS"]);
        assert!(!rhel9.isolinux_ok);
        assert_eq!(rhel9.kernel_options, "");
        assert!(rhel9.boot_files.is_empty());
        assert_eq!(rhel9.boot_loaders["x86_64"], vec!["grub", "pxe"]);
        assert!(signatures.breeds["windows"].is_empty());
    }

    fn serde_json_to_wire(value: serde_json::Value) -> WireValue {
        match value {
            serde_json::Value::Null => WireValue::Nil,
            serde_json::Value::Bool(b) => WireValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => WireValue::Int(i),
                None => WireValue::Double(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => WireValue::String(s),
            serde_json::Value::Array(items) => {
                WireValue::Array(items.into_iter().map(serde_json_to_wire).collect())
            }
            serde_json::Value::Object(map) => WireValue::Struct(
                map.into_iter()
                    .map(|(key, value)| (key, serde_json_to_wire(value)))
                    .collect(),
            ),
        }
    }
}
