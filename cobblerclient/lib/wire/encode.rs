use std::collections::{BTreeMap, HashMap};

use super::WireValue;

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// Converts a local field value into the form a `modify_*` call expects.
///
/// The write path is not symmetric with the read path: a list of strings is read back as an array
/// but must be written as a single space-separated string.
pub trait ToWire {
    /// Returns the wire representation of `self`.
    fn to_wire(&self) -> WireValue;
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl ToWire for WireValue {
    fn to_wire(&self) -> WireValue {
        self.clone()
    }
}

impl ToWire for String {
    fn to_wire(&self) -> WireValue {
        WireValue::String(self.clone())
    }
}

impl ToWire for bool {
    fn to_wire(&self) -> WireValue {
        WireValue::Bool(*self)
    }
}

impl ToWire for i64 {
    fn to_wire(&self) -> WireValue {
        WireValue::Int(*self)
    }
}

impl ToWire for f64 {
    fn to_wire(&self) -> WireValue {
        WireValue::Double(*self)
    }
}

impl ToWire for Vec<String> {
    fn to_wire(&self) -> WireValue {
        WireValue::String(self.join(" "))
    }
}

impl<T: ToWire> ToWire for Option<T> {
    fn to_wire(&self) -> WireValue {
        match self {
            Some(value) => value.to_wire(),
            None => WireValue::String(String::new()),
        }
    }
}

impl<V: ToWire> ToWire for BTreeMap<String, V> {
    fn to_wire(&self) -> WireValue {
        WireValue::Struct(
            self.iter()
                .map(|(key, value)| (key.clone(), value.to_wire()))
                .collect(),
        )
    }
}

impl<V: ToWire> ToWire for HashMap<String, V> {
    fn to_wire(&self) -> WireValue {
        WireValue::Struct(
            self.iter()
                .map(|(key, value)| (key.clone(), value.to_wire()))
                .collect(),
        )
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_wire_joins_string_lists() {
        let owners = vec!["admin".to_string(), "ops".to_string()];
        assert_eq!(owners.to_wire(), WireValue::from("admin ops"));
        assert_eq!(Vec::<String>::new().to_wire(), WireValue::from(""));
    }

    #[test]
    fn test_to_wire_passes_scalars_through() {
        assert_eq!(true.to_wire(), WireValue::Bool(true));
        assert_eq!(512_i64.to_wire(), WireValue::Int(512));
        assert_eq!("x86_64".to_string().to_wire(), WireValue::from("x86_64"));
        assert_eq!(None::<String>.to_wire(), WireValue::from(""));
    }

    #[test]
    fn test_to_wire_maps_become_structs() {
        let options = BTreeMap::from([(
            "console".to_string(),
            WireValue::from(vec!["ttyS0", "tty0"]),
        )]);
        let wire = options.to_wire();
        let map = wire.as_struct().unwrap();
        assert_eq!(
            map["console"],
            WireValue::Array(vec![WireValue::from("ttyS0"), WireValue::from("tty0")])
        );
    }
}
