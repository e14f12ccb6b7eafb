use std::fmt;

use getset::{CopyGetters, Getters};
use serde::de::DeserializeOwned;

use crate::{
    value::{DecodeContext, Inheritable, WireShape},
    wire::{normalize, ToWire, WireValue},
    DecodeError, ServerVersion,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// How a field takes part in updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateClass {
    /// Sent on every update.
    Normal,

    /// Computed by the server; never sent.
    NoUpdate,

    /// Sent, but a rejection is tolerated because older servers lack the field.
    NewField,
}

/// Where a field falls in the update sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldOrder {
    /// Written once ahead of every other field, then again in declared order.
    First,

    /// Written in declared order only.
    Declared,
}

/// Describes one entity field: its wire name, how it is updated and how it is converted.
///
/// Tables of these replace runtime struct introspection. They are built once per entity type with
/// the [`field!`](crate::field) macro.
#[derive(Getters, CopyGetters)]
pub struct FieldSpec<E> {
    /// The field's name on the wire.
    #[getset(get_copy = "pub")]
    wire_name: &'static str,

    /// How the field takes part in updates.
    #[getset(get_copy = "pub")]
    class: UpdateClass,

    /// Where the field falls in the update sequence.
    #[getset(get_copy = "pub")]
    order: FieldOrder,

    /// The oldest server version that knows the field.
    #[getset(get = "pub")]
    since: Option<ServerVersion>,

    encode: fn(&E) -> Option<WireValue>,
    decode: fn(&mut E, &WireValue, &DecodeContext) -> Result<(), DecodeError>,
}

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// Produces the argument of a `modify_*` call for a field value, if one should be sent.
pub trait EncodeField {
    /// Returns the value to send, or `None` to send nothing.
    fn encode_field(&self) -> Option<WireValue>;
}

/// Decodes a field value from its raw wire form.
pub trait DecodeField: Sized {
    /// Decodes `raw` under `ctx`.
    fn decode_field(raw: &WireValue, ctx: &DecodeContext) -> Result<Self, DecodeError>;
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl<E> FieldSpec<E> {
    /// Creates a normal, declared-order field.
    pub fn new(
        wire_name: &'static str,
        encode: fn(&E) -> Option<WireValue>,
        decode: fn(&mut E, &WireValue, &DecodeContext) -> Result<(), DecodeError>,
    ) -> Self {
        Self {
            wire_name,
            class: UpdateClass::Normal,
            order: FieldOrder::Declared,
            since: None,
            encode,
            decode,
        }
    }

    /// Marks the field as computed by the server.
    pub fn no_update(mut self) -> Self {
        self.class = UpdateClass::NoUpdate;
        self
    }

    /// Marks the field as possibly unknown to older servers.
    pub fn new_field(mut self) -> Self {
        self.class = UpdateClass::NewField;
        self
    }

    /// Writes the field ahead of all others.
    pub fn first(mut self) -> Self {
        self.order = FieldOrder::First;
        self
    }

    /// Records the oldest server version that knows the field.
    pub fn added_in(mut self, version: ServerVersion) -> Self {
        self.since = Some(version);
        self
    }

    /// Returns the value a `modify_*` call should send for this field of `entity`.
    pub fn encode(&self, entity: &E) -> Option<WireValue> {
        (self.encode)(entity)
    }

    /// Decodes `raw` into this field of `entity`.
    pub fn decode(
        &self,
        entity: &mut E,
        raw: &WireValue,
        ctx: &DecodeContext,
    ) -> Result<(), DecodeError> {
        (self.decode)(entity, raw, ctx).map_err(|e| e.in_field(self.wire_name))
    }

    /// Returns `true` if a server at `version` knows this field. Unknown versions know every
    /// field.
    pub fn is_supported_by(&self, version: Option<&ServerVersion>) -> bool {
        match (&self.since, version) {
            (Some(since), Some(version)) => !version.less_than(since),
            _ => true,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Macros
//--------------------------------------------------------------------------------------------------

/// Builds a [`FieldSpec`] for a field reached by a path on the entity, or with `@item` for a
/// field of the embedded [`Item`](crate::models::Item) of a generic entity.
#[macro_export]
macro_rules! field {
    ($entity:ty, $wire:literal => @item $field:ident) => {
        $crate::sync::FieldSpec::<$entity>::new(
            $wire,
            |e: &$entity| {
                $crate::sync::EncodeField::encode_field(&$crate::models::Entity::item(e).$field)
            },
            |e: &mut $entity,
             raw: &$crate::wire::WireValue,
             ctx: &$crate::value::DecodeContext| {
                $crate::models::Entity::item_mut(e).$field =
                    $crate::sync::DecodeField::decode_field(raw, ctx)?;
                ::std::result::Result::Ok(())
            },
        )
    };
    ($entity:ty, $wire:literal => $($path:ident).+) => {
        $crate::sync::FieldSpec::<$entity>::new(
            $wire,
            |e: &$entity| $crate::sync::EncodeField::encode_field(&e.$($path).+),
            |e: &mut $entity,
             raw: &$crate::wire::WireValue,
             ctx: &$crate::value::DecodeContext| {
                e.$($path).+ = $crate::sync::DecodeField::decode_field(raw, ctx)?;
                ::std::result::Result::Ok(())
            },
        )
    };
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl<E> fmt::Debug for FieldSpec<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("wire_name", &self.wire_name)
            .field("class", &self.class)
            .field("order", &self.order)
            .field("since", &self.since)
            .finish()
    }
}

impl<T: ToWire> EncodeField for T {
    fn encode_field(&self) -> Option<WireValue> {
        Some(self.to_wire())
    }
}

impl<T: ToWire> EncodeField for Inheritable<T> {
    fn encode_field(&self) -> Option<WireValue> {
        self.encode()
    }
}

impl<T: DeserializeOwned> DecodeField for T {
    fn decode_field(raw: &WireValue, _ctx: &DecodeContext) -> Result<Self, DecodeError> {
        normalize(raw)
    }
}

impl<T: DeserializeOwned + WireShape> DecodeField for Inheritable<T> {
    fn decode_field(raw: &WireValue, ctx: &DecodeContext) -> Result<Self, DecodeError> {
        Inheritable::decode(raw, ctx)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
