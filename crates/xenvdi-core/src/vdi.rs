//! VDI record construction.

use std::collections::BTreeMap;

use crate::xmlrpc::Value;

/// Display name given to every imported VDI.
pub const IMPORTED_VDI_NAME: &str = "Imported VDI";

/// The fields sent to `VDI.create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VdiRecord {
    /// Reference of the SR the VDI is created in.
    pub sr: String,
    /// Size in bytes.
    pub virtual_size: u64,
    /// VDI type tag, e.g. `user`.
    pub vdi_type: String,
    pub sharable: bool,
    pub read_only: bool,
    pub other_config: BTreeMap<String, String>,
    pub name_label: String,
}

impl VdiRecord {
    /// A writable, unshared user VDI of `virtual_size` bytes in `sr`.
    pub fn new(sr: impl Into<String>, virtual_size: u64) -> Self {
        Self {
            sr: sr.into(),
            virtual_size,
            vdi_type: "user".to_string(),
            sharable: false,
            read_only: false,
            other_config: BTreeMap::new(),
            name_label: IMPORTED_VDI_NAME.to_string(),
        }
    }

    /// Encode as the XML-RPC struct `VDI.create` expects.
    pub fn to_value(&self) -> Value {
        let other_config = self
            .other_config
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
            .collect::<BTreeMap<_, _>>();

        let mut members = BTreeMap::new();
        members.insert("SR".to_string(), Value::from(self.sr.as_str()));
        // The API's 64-bit ints travel as decimal strings.
        members.insert(
            "virtual_size".to_string(),
            Value::String(self.virtual_size.to_string()),
        );
        members.insert("type".to_string(), Value::from(self.vdi_type.as_str()));
        members.insert("sharable".to_string(), Value::from(self.sharable));
        members.insert("read_only".to_string(), Value::from(self.read_only));
        members.insert("other_config".to_string(), Value::Struct(other_config));
        members.insert("name_label".to_string(), Value::from(self.name_label.as_str()));
        Value::Struct(members)
    }
}
