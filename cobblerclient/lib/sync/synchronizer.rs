use crate::{
    models::{Entity, Handle},
    transport::Transport,
    wire::{normalize, WireValue},
    CobblerError, CobblerResult, ServerVersion,
};

use super::{FieldOrder, UpdateClass};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A single `modify_*` call the synchronizer will issue.
#[derive(Debug, Clone, PartialEq)]
pub struct Modification {
    /// The attribute being written.
    pub field: String,

    /// The value sent for it.
    pub value: WireValue,

    /// How a rejection of this write is treated.
    pub class: UpdateClass,
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Plans the `modify_*` calls that bring a server-side item in line with `entity`.
///
/// Fields ordered [`FieldOrder::First`] are written ahead of everything else and then again at
/// their declared position. No-update fields, fields the server at `version` does not know, and
/// fields with nothing to send are left out. The entity's extra modifications come last.
pub fn plan_modifications<E: Entity>(
    entity: &E,
    version: Option<&ServerVersion>,
) -> Vec<Modification> {
    let specs = E::fields();
    let leading = specs
        .iter()
        .filter(|spec| spec.order() == FieldOrder::First);

    let mut modifications: Vec<Modification> = leading
        .chain(specs.iter())
        .filter(|spec| spec.class() != UpdateClass::NoUpdate)
        .filter(|spec| spec.is_supported_by(version))
        .filter_map(|spec| {
            spec.encode(entity).map(|value| Modification {
                field: spec.wire_name().to_string(),
                value,
                class: spec.class(),
            })
        })
        .collect();

    modifications.extend(
        entity
            .extra_modifications()
            .into_iter()
            .map(|(field, value)| Modification {
                field,
                value,
                class: UpdateClass::Normal,
            }),
    );

    modifications
}

/// Writes every updatable field of `entity` to the item behind `handle`, one call at a time.
///
/// The caller still has to save the item. Writes are not rolled back: if a call fails, the fields
/// before it have already been written.
///
/// A call answering `false` is tolerated when the value sent was itself empty or false, or when
/// the field is new enough that older servers may not know it. Any other `false` fails with
/// [`CobblerError::FieldRejected`]. Transport errors and faults abort immediately.
pub async fn update_fields<E, T>(
    transport: &T,
    handle: &Handle,
    entity: &E,
    token: &str,
    version: Option<&ServerVersion>,
) -> CobblerResult<()>
where
    E: Entity,
    T: Transport + ?Sized,
{
    let method = E::KIND.method("modify");
    for modification in plan_modifications(entity, version) {
        let tolerated =
            modification.value.is_falsy() || modification.class == UpdateClass::NewField;

        let result = transport
            .call(
                &method,
                vec![
                    handle.as_wire().clone(),
                    WireValue::from(modification.field.as_str()),
                    modification.value,
                    WireValue::from(token),
                ],
            )
            .await?;

        let accepted: bool =
            normalize(&result).map_err(|_| CobblerError::UnexpectedResponse {
                method: method.clone(),
                value: result.clone(),
            })?;

        if accepted {
            continue;
        }

        if !tolerated {
            return Err(CobblerError::FieldRejected {
                kind: E::KIND,
                field: modification.field,
            });
        }

        tracing::debug!(
            "{method} ignored `{}` on {} `{}`",
            modification.field,
            E::KIND,
            entity.name()
        );
    }

    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::{
        models::{Distro, Profile},
        transport::MockTransport,
    };

    use super::*;

    fn handle() -> Handle {
        Handle::new(WireValue::from("___NEW___distro::abc"))
    }

    fn field_of(call: &crate::transport::RecordedCall) -> &str {
        call.args[1].as_str().unwrap_or_default()
    }

    #[test]
    fn test_plan_excludes_no_update_fields() {
        let distro = Distro::new("Test", "/boot/vmlinuz", "/boot/initrd.img");
        let fields: Vec<_> = plan_modifications(&distro, None)
            .into_iter()
            .map(|m| m.field)
            .collect();

        for computed in ["depth", "parent", "children", "ctime", "mtime", "uid"] {
            assert!(!fields.iter().any(|f| f == computed), "{computed} was planned");
        }
        assert!(!fields.iter().any(|f| f == "source_repos"));
        assert_eq!(fields[0], "name");
        assert!(fields.contains(&"kernel".to_string()));
    }

    #[test]
    fn test_plan_joins_lists_and_marks_inherited() {
        let mut distro = Distro::new("Test", "/k", "/i");
        distro.item.mgmt_classes.set(vec!["web".into(), "db".into()]);

        let plan = plan_modifications(&distro, None);
        let mgmt = plan.iter().find(|m| m.field == "mgmt_classes").unwrap();
        assert_eq!(mgmt.value, WireValue::from("web db"));

        let owners = plan.iter().find(|m| m.field == "owners").unwrap();
        assert_eq!(owners.value, WireValue::from("<<inherit>>"));
    }

    #[test]
    fn test_plan_skips_fields_unknown_to_server() {
        let distro = Distro::new("Test", "/k", "/i");
        let old = ServerVersion::new(3, 1, 0);
        let plan = plan_modifications(&distro, Some(&old));
        assert!(!plan.iter().any(|m| m.field == "remote_boot_kernel"));

        let plan = plan_modifications(&distro, None);
        assert!(plan.iter().any(|m| m.field == "remote_boot_kernel"));
    }

    #[test_log::test(tokio::test)]
    async fn test_profile_name_written_first() -> anyhow::Result<()> {
        let transport = MockTransport::new(|_, _| Ok(WireValue::Bool(true)));
        let profile = Profile::new("web", "centos9");

        update_fields(&transport, &handle(), &profile, "token", None).await?;

        let calls = transport.calls();
        assert_eq!(calls[0].method, "modify_profile");
        assert_eq!(field_of(&calls[0]), "name");
        assert_eq!(calls[0].args[2], WireValue::from("web"));
        assert_eq!(calls[0].args[3], WireValue::from("token"));

        let names = calls.iter().filter(|c| field_of(c) == "name").count();
        assert_eq!(names, 2);
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_new_field_rejection_is_tolerated() -> anyhow::Result<()> {
        let transport = MockTransport::new(|_, args| {
            let field = args[1].as_str().unwrap_or_default();
            Ok(WireValue::Bool(field != "remote_boot_kernel"))
        });
        let mut distro = Distro::new("Test", "/k", "/i");
        distro.remote_boot_kernel = "http://mirror/vmlinuz".into();

        update_fields(&transport, &handle(), &distro, "token", None).await?;

        let calls = transport.calls();
        let rejected = calls
            .iter()
            .position(|c| field_of(c) == "remote_boot_kernel")
            .unwrap();
        assert!(rejected < calls.len() - 1);
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_rejected_field_aborts() -> anyhow::Result<()> {
        let transport = MockTransport::new(|_, args| {
            let field = args[1].as_str().unwrap_or_default();
            Ok(WireValue::Int(if field == "kernel" { 0 } else { 1 }))
        });
        let distro = Distro::new("Test", "/k", "/i");

        let err = update_fields(&transport, &handle(), &distro, "token", None)
            .await
            .unwrap_err();
        match err {
            CobblerError::FieldRejected { kind, field } => {
                assert_eq!(kind, crate::models::ItemKind::Distro);
                assert_eq!(field, "kernel");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(field_of(transport.calls().last().unwrap()), "kernel");
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_false_for_empty_value_is_tolerated() -> anyhow::Result<()> {
        let transport = MockTransport::new(|_, args| Ok(WireValue::Bool(!args[2].is_falsy())));
        let distro = Distro::new("Test", "/k", "/i");

        update_fields(&transport, &handle(), &distro, "token", None).await?;
        assert!(transport.calls().iter().any(|c| field_of(c) == "comment"));
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_fault_aborts_immediately() -> anyhow::Result<()> {
        let transport = MockTransport::new(|_, args| {
            if args[1].as_str() == Some("comment") {
                return Err(CobblerError::Fault {
                    code: 1,
                    message: "invalid token".into(),
                });
            }
            Ok(WireValue::Bool(true))
        });
        let distro = Distro::new("Test", "/k", "/i");

        let err = update_fields(&transport, &handle(), &distro, "token", None)
            .await
            .unwrap_err();
        assert!(err.is_fault());
        assert_eq!(transport.calls().len(), 2);
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_non_boolean_answer_is_unexpected() -> anyhow::Result<()> {
        let transport = MockTransport::new(|_, _| Ok(WireValue::Array(vec![])));
        let distro = Distro::new("Test", "/k", "/i");

        let err = update_fields(&transport, &handle(), &distro, "token", None)
            .await
            .unwrap_err();
        assert!(matches!(err, CobblerError::UnexpectedResponse { .. }));
        Ok(())
    }
}
