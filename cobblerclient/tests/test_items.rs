use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex,
    },
};

use cobblerclient::{
    client::{CobblerClient, ReadOptions},
    models::{Distro, Options, Profile, Repo, System},
    transport::MockTransport,
    value::Inheritable,
    wire::WireValue,
    CobblerError, CobblerResult, ServerVersion,
};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

const TOKEN: &str = "tok-integration";

/// Fields the server keeps as lists even though the client sends them as space-separated strings.
const LIST_FIELDS: &[&str] = &[
    "owners",
    "mgmt_classes",
    "boot_loaders",
    "name_servers",
    "name_servers_search",
    "repos",
    "apt_components",
    "apt_dists",
    "rpm_list",
    "files",
    "packages",
];

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

type Attributes = BTreeMap<String, WireValue>;

/// An in-memory stand-in for a server: saved items per kind, and items being edited per handle.
#[derive(Default)]
struct FakeServer {
    items: BTreeMap<(String, String), Attributes>,
    staged: BTreeMap<String, (String, Attributes)>,
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[test_log::test(tokio::test)]
async fn test_create_distro_returns_server_state() -> anyhow::Result<()> {
    let client = logged_in_client((3, 3, 4)).await?;

    let distro = Distro::new(
        "Test",
        "/srv/images/test/vmlinuz",
        "/srv/images/test/initrd.img",
    );
    let created = client.create(&distro).await?;

    assert_eq!(created.item.name, "Test");
    assert_eq!(created.kernel, "/srv/images/test/vmlinuz");
    assert_eq!(created.initrd, "/srv/images/test/initrd.img");
    assert_eq!(created.item.depth, 0);
    assert!(!created.item.uid.is_empty());
    assert!(created.item.created_at().is_some());

    let calls = client.transport().calls();
    let methods: Vec<_> = calls.iter().map(|call| call.method.as_str()).collect();
    let first_modify = methods.iter().position(|m| *m == "modify_distro").unwrap();
    let save = methods.iter().position(|m| *m == "save_distro").unwrap();
    assert_eq!(methods[first_modify - 1], "new_distro");
    assert!(methods[first_modify..save].iter().all(|m| *m == "modify_distro"));
    assert_eq!(
        client.transport().calls_to("save_distro")[0].args[2],
        WireValue::from("new")
    );

    // Computed fields are never written back.
    let written: Vec<_> = client
        .transport()
        .calls_to("modify_distro")
        .into_iter()
        .map(|call| call.args[1].clone())
        .collect();
    for computed in ["uid", "depth", "ctime", "mtime", "children", "tree_build_time"] {
        assert!(!written.contains(&WireValue::from(computed)));
    }

    assert_eq!(client.list_names::<Distro>().await?, vec!["Test".to_string()]);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_profile_inheritance_survives_round_trip() -> anyhow::Result<()> {
    let client = logged_in_client((3, 3, 4)).await?;
    client
        .create(&Distro::new("centos9", "/srv/vmlinuz", "/srv/initrd.img"))
        .await?;

    let mut profile = Profile::new("centos9-web", "centos9");
    profile.virt_ram = Inheritable::explicit(2048);
    profile.name_servers = Inheritable::explicit(vec!["10.0.0.2".into(), "10.0.0.3".into()]);
    let created = client.create(&profile).await?;

    assert_eq!(created.item.depth, 1);
    assert_eq!(created.distro, "centos9");
    assert_eq!(created.virt_ram.value(), Some(&2048));
    assert!(created.virt_cpus.is_inherited());
    assert!(created.item.kernel_options.is_inherited());
    assert_eq!(
        created.name_servers.value(),
        Some(&vec!["10.0.0.2".to_string(), "10.0.0.3".to_string()])
    );

    // Writing the entity back keeps inherited fields inherited.
    client.transport().clear();
    client.update(&created).await?;

    let sent_cpus: Vec<_> = client
        .transport()
        .calls_to("modify_profile")
        .into_iter()
        .filter(|call| call.args[1] == WireValue::from("virt_cpus"))
        .map(|call| call.args[2].clone())
        .collect();
    assert_eq!(sent_cpus, vec![WireValue::from("<<inherit>>")]);
    assert_eq!(
        client.transport().calls_to("save_profile")[0].args[2],
        WireValue::from("bypass")
    );

    let reread = client.get::<Profile>("centos9-web").await?;
    assert!(reread.virt_cpus.is_inherited());
    assert_eq!(reread.virt_ram.value(), Some(&2048));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_missing_item_is_not_found_and_fault_is_not() -> anyhow::Result<()> {
    let client = logged_in_client((3, 3, 4)).await?;

    let err = client.get::<Repo>("epel").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(!err.is_fault());

    let err = client.delete::<Repo>("epel").await.unwrap_err();
    assert!(err.is_fault());
    assert!(!err.is_not_found());

    client.create(&Repo::new("epel", "http://mirror.example.com/epel/9/")).await?;
    client.delete::<Repo>("epel").await?;
    assert!(client.get::<Repo>("epel").await.unwrap_err().is_not_found());
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_read_call_shape_follows_server_version() -> anyhow::Result<()> {
    for (version, expected_args) in [((3, 3, 3), 3), ((3, 3, 4), 4)] {
        let client = logged_in_client(version).await?;
        client
            .create(&Distro::new("centos9", "/srv/vmlinuz", "/srv/initrd.img"))
            .await?;
        client.transport().clear();

        let options = ReadOptions::builder().resolved(true).build();
        client.get_with::<Distro>("centos9", options).await?;

        let calls = client.transport().calls_to("get_distro");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].args.len(), expected_args, "server {version:?}");
        assert_eq!(calls[0].args.last(), Some(&WireValue::from(TOKEN)));
    }
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_invalid_entity_makes_no_calls() -> anyhow::Result<()> {
    let client = logged_in_client((3, 3, 4)).await?;
    client.transport().clear();

    let err = client.create(&Profile::new("orphan", "")).await.unwrap_err();
    assert!(matches!(err, CobblerError::Validation(_)));

    let err = client.create(&System::default()).await.unwrap_err();
    assert!(matches!(err, CobblerError::Validation(_)));

    assert!(client.transport().calls().is_empty());
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_concurrent_version_reads_fetch_once() -> anyhow::Result<()> {
    let client = CobblerClient::with_transport(fake_cobbler((3, 2, 2)));

    let (a, b, c) = tokio::join!(client.version(), client.version(), client.version());
    assert_eq!(a?, ServerVersion::new(3, 2, 2));
    assert_eq!(b?, ServerVersion::new(3, 2, 2));
    assert_eq!(c?, ServerVersion::new(3, 2, 2));
    assert_eq!(client.transport().calls_to("extended_version").len(), 1);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_older_server_skips_newer_fields() -> anyhow::Result<()> {
    let client = logged_in_client((3, 1, 2)).await?;
    client
        .create(&Distro::new("centos9", "/srv/vmlinuz", "/srv/initrd.img"))
        .await?;

    let written: Vec<_> = client
        .transport()
        .calls_to("modify_distro")
        .into_iter()
        .map(|call| call.args[1].clone())
        .collect();
    assert!(written.contains(&WireValue::from("kernel")));
    assert!(!written.contains(&WireValue::from("remote_boot_kernel")));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_write_without_login_is_rejected() -> anyhow::Result<()> {
    let client = CobblerClient::with_transport(fake_cobbler((3, 3, 4)));

    let err = client
        .create(&Distro::new("centos9", "/srv/vmlinuz", "/srv/initrd.img"))
        .await
        .unwrap_err();
    assert!(matches!(err, CobblerError::NotLoggedIn));
    assert!(client.transport().calls_to("new_distro").is_empty());
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_overriding_inherited_field_survives_refetch() -> anyhow::Result<()> {
    let client = logged_in_client((3, 3, 4)).await?;
    client
        .create(&Distro::new("centos9", "/srv/vmlinuz", "/srv/initrd.img"))
        .await?;
    client.create(&Profile::new("centos9-web", "centos9")).await?;

    let mut profile = client.get::<Profile>("centos9-web").await?;
    assert!(profile.virt_cpus.is_inherited());

    profile.virt_cpus.set(4);
    client.update(&profile).await?;

    let reread = client.get::<Profile>("centos9-web").await?;
    assert!(!reread.virt_cpus.is_inherited());
    assert_eq!(reread.virt_cpus.value(), Some(&4));
    assert!(reread.virt_ram.is_inherited());
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_find_matches_criteria() -> anyhow::Result<()> {
    let client = logged_in_client((3, 3, 4)).await?;
    for (name, mirror) in [
        ("epel", "http://mirror.example.com/epel/9/"),
        ("epel-next", "http://mirror.example.com/epel/next/9/"),
        ("appstream", "http://mirror.example.com/centos/9/AppStream/"),
    ] {
        client.create(&Repo::new(name, mirror)).await?;
    }

    let criteria = Options::from([("name".to_string(), WireValue::from("epel*"))]);
    let found = client.find::<Repo>(&criteria).await?;
    let names: Vec<_> = found.iter().map(|repo| repo.item.name.as_str()).collect();
    assert_eq!(names, vec!["epel", "epel-next"]);
    assert_eq!(found[0].mirror, "http://mirror.example.com/epel/9/");

    let criteria = Options::from([("name".to_string(), WireValue::from("appstream"))]);
    assert_eq!(client.find_names::<Repo>(&criteria).await?, vec!["appstream"]);

    let criteria = Options::from([("name".to_string(), WireValue::from("missing"))]);
    assert!(client.find::<Repo>(&criteria).await?.is_empty());
    assert!(client.find_names::<Repo>(&criteria).await?.is_empty());
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_get_all_returns_every_item_of_kind() -> anyhow::Result<()> {
    let client = logged_in_client((3, 3, 4)).await?;
    assert!(client.get_all::<Distro>().await?.is_empty());

    client
        .create(&Distro::new("alma9", "/srv/alma/vmlinuz", "/srv/alma/initrd.img"))
        .await?;
    client
        .create(&Distro::new("centos9", "/srv/vmlinuz", "/srv/initrd.img"))
        .await?;
    client.create(&Repo::new("epel", "http://mirror.example.com/epel/9/")).await?;

    let distros = client.get_all::<Distro>().await?;
    let names: Vec<_> = distros.iter().map(|d| d.item.name.as_str()).collect();
    assert_eq!(names, vec!["alma9", "centos9"]);
    assert_eq!(distros[0].kernel, "/srv/alma/vmlinuz");
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_rename_and_copy() -> anyhow::Result<()> {
    let client = logged_in_client((3, 3, 4)).await?;
    client
        .create(&Distro::new("centos9", "/srv/vmlinuz", "/srv/initrd.img"))
        .await?;

    client.rename::<Distro>("centos9", "centos9-stream").await?;
    assert!(client.get::<Distro>("centos9").await.unwrap_err().is_not_found());
    let renamed = client.get::<Distro>("centos9-stream").await?;
    assert_eq!(renamed.kernel, "/srv/vmlinuz");

    client.copy::<Distro>("centos9-stream", "centos9-copy").await?;
    let original = client.get::<Distro>("centos9-stream").await?;
    let copied = client.get::<Distro>("centos9-copy").await?;
    assert_eq!(copied.kernel, original.kernel);
    assert_ne!(copied.item.uid, original.item.uid);
    assert_eq!(
        client.list_names::<Distro>().await?,
        vec!["centos9-copy".to_string(), "centos9-stream".to_string()]
    );

    let err = client
        .rename::<Distro>("missing", "other")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

async fn logged_in_client(
    version: (i64, i64, i64),
) -> anyhow::Result<CobblerClient<MockTransport>> {
    let client = CobblerClient::with_transport(fake_cobbler(version));
    client.login("cobbler", "cobbler").await?;
    Ok(client)
}

fn fake_cobbler(version: (i64, i64, i64)) -> MockTransport {
    let server = Mutex::new(FakeServer::default());
    let counter = AtomicU64::new(1);

    MockTransport::new(move |method, args| {
        let mut server = server.lock().unwrap();
        match method {
            "extended_version" => {
                let (major, minor, patch) = version;
                Ok(WireValue::Struct(BTreeMap::from([
                    (
                        "version".to_string(),
                        WireValue::from(format!("{major}.{minor}.{patch}")),
                    ),
                    (
                        "version_tuple".to_string(),
                        WireValue::Array(vec![
                            WireValue::Int(major),
                            WireValue::Int(minor),
                            WireValue::Int(patch),
                        ]),
                    ),
                ])))
            }
            "login" => Ok(WireValue::from(TOKEN)),
            "logout" | "token_check" => Ok(WireValue::Bool(true)),
            "get_item_names" => {
                let kind = arg_str(args, 0);
                let names: Vec<String> = server
                    .items
                    .keys()
                    .filter(|(k, _)| k == kind)
                    .map(|(_, name)| name.clone())
                    .collect();
                Ok(WireValue::from(names))
            }
            "find_items" => {
                let criteria = args.get(1).and_then(WireValue::as_struct);
                let names: Vec<String> = server
                    .find(arg_str(args, 0), criteria)
                    .into_iter()
                    .map(|(name, _)| name)
                    .collect();
                Ok(WireValue::from(names))
            }
            _ => {
                let (action, kind) = method
                    .split_once('_')
                    .ok_or_else(|| fault(&format!("unknown remote method {method}")))?;
                let n = counter.fetch_add(1, Ordering::SeqCst);
                server.dispatch(action, kind, args, n)
            }
        }
    })
}

impl FakeServer {
    fn dispatch(
        &mut self,
        action: &str,
        kind: &str,
        args: &[WireValue],
        n: u64,
    ) -> CobblerResult<WireValue> {
        if let Some(kind) = kind.strip_suffix("_handle") {
            let name = arg_str(args, 0);
            let Some(attributes) = self.items.get(&(kind.to_string(), name.to_string())) else {
                return Ok(WireValue::from("~"));
            };
            let handle = format!("{kind}::{name}");
            self.staged
                .insert(handle.clone(), (kind.to_string(), attributes.clone()));
            return Ok(WireValue::from(handle));
        }

        match action {
            "new" => {
                let handle = format!("___NEW___{kind}::{n}");
                self.staged
                    .insert(handle.clone(), (kind.to_string(), Attributes::new()));
                Ok(WireValue::from(handle))
            }
            "modify" => {
                let (_, attributes) = self
                    .staged
                    .get_mut(arg_str(args, 0))
                    .ok_or_else(|| fault("invalid handle"))?;
                let field = arg_str(args, 1).to_string();
                let value = store_value(&field, &args[2]);
                attributes.insert(field, value);
                Ok(WireValue::Bool(true))
            }
            "save" => {
                let (kind, mut attributes) = self
                    .staged
                    .remove(arg_str(args, 0))
                    .ok_or_else(|| fault("invalid handle"))?;
                let name = attributes
                    .get("name")
                    .and_then(WireValue::as_str)
                    .unwrap_or_default()
                    .to_string();
                let depth = if kind == "profile" || kind == "system" { 1 } else { 0 };
                attributes.insert("depth".to_string(), WireValue::Int(depth));
                attributes.insert("uid".to_string(), WireValue::from(format!("uid{n}")));
                attributes.insert("ctime".to_string(), WireValue::Double(1_700_000_000.0));
                attributes.insert("mtime".to_string(), WireValue::Double(1_700_000_000.0));
                self.items.insert((kind, name), attributes);
                Ok(WireValue::Bool(true))
            }
            "get" if args.is_empty() => {
                let items = self
                    .find(singular(kind), None)
                    .into_iter()
                    .map(|(_, attributes)| WireValue::Struct(attributes))
                    .collect();
                Ok(WireValue::Array(items))
            }
            "get" => {
                let name = arg_str(args, 0);
                Ok(self
                    .items
                    .get(&(kind.to_string(), name.to_string()))
                    .map(|attributes| WireValue::Struct(attributes.clone()))
                    .unwrap_or_else(|| WireValue::from("~")))
            }
            "remove" => {
                let name = arg_str(args, 0);
                self.items
                    .remove(&(kind.to_string(), name.to_string()))
                    .map(|_| WireValue::Bool(true))
                    .ok_or_else(|| fault(&format!("'{kind} {name} not found'")))
            }
            "find" => {
                let items = self
                    .find(kind, args.first().and_then(WireValue::as_struct))
                    .into_iter()
                    .map(|(_, attributes)| WireValue::Struct(attributes))
                    .collect();
                Ok(WireValue::Array(items))
            }
            "rename" | "copy" => {
                let (kind, mut attributes) = self
                    .staged
                    .remove(arg_str(args, 0))
                    .ok_or_else(|| fault("invalid handle"))?;
                let new_name = arg_str(args, 1).to_string();
                if self.items.contains_key(&(kind.clone(), new_name.clone())) {
                    return Err(fault(&format!("'{kind} {new_name} already exists'")));
                }
                if action == "rename" {
                    let old_name = attributes
                        .get("name")
                        .and_then(WireValue::as_str)
                        .unwrap_or_default()
                        .to_string();
                    self.items.remove(&(kind.clone(), old_name));
                } else {
                    attributes.insert("uid".to_string(), WireValue::from(format!("uid{n}")));
                }
                attributes.insert("name".to_string(), WireValue::from(new_name.clone()));
                self.items.insert((kind, new_name), attributes);
                Ok(WireValue::Bool(true))
            }
            _ => Err(fault(&format!("unknown remote method {action}_{kind}"))),
        }
    }

    /// Returns the saved items of `kind` whose attributes match every entry of `criteria`.
    fn find(&self, kind: &str, criteria: Option<&Attributes>) -> Vec<(String, Attributes)> {
        self.items
            .iter()
            .filter(|((k, _), _)| k == kind)
            .filter(|(_, attributes)| {
                criteria.into_iter().flatten().all(|(field, pattern)| {
                    let pattern = pattern.as_str().unwrap_or_default();
                    attributes
                        .get(field)
                        .is_some_and(|stored| matches_pattern(stored, pattern))
                })
            })
            .map(|((_, name), attributes)| (name.clone(), attributes.clone()))
            .collect()
    }
}

fn store_value(field: &str, value: &WireValue) -> WireValue {
    match value {
        WireValue::String(s) if LIST_FIELDS.contains(&field) && !value.is_inherit_marker() => {
            WireValue::from(s.split_whitespace().collect::<Vec<_>>())
        }
        other => other.clone(),
    }
}

/// Matches exactly, or by prefix when the pattern ends in `*`. Lists match if any element does.
fn matches_pattern(stored: &WireValue, pattern: &str) -> bool {
    match stored {
        WireValue::Array(items) => items.iter().any(|item| matches_pattern(item, pattern)),
        WireValue::String(s) => match pattern.strip_suffix('*') {
            Some(prefix) => s.starts_with(prefix),
            None => s == pattern,
        },
        WireValue::Int(i) => i.to_string() == pattern,
        _ => false,
    }
}

fn singular(plural: &str) -> &str {
    match plural {
        "mgmtclasses" => "mgmtclass",
        other => other.strip_suffix('s').unwrap_or(other),
    }
}

fn arg_str(args: &[WireValue], index: usize) -> &str {
    args.get(index).and_then(WireValue::as_str).unwrap_or_default()
}

fn fault(message: &str) -> CobblerError {
    CobblerError::Fault {
        code: 1,
        message: format!("<class 'cobbler.cexceptions.CX'>:{message}"),
    }
}
