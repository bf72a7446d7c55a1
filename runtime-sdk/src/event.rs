//! Event types.

/// An event emitted by a module.
pub trait Event {
    /// Name of the module that emitted the event.
    fn module_name() -> &'static str;

    /// Code uniquely identifying the event.
    fn code(&self) -> u32;

    /// Serialized event value.
    fn value(&self) -> cbor::Value;

    /// Converts an emitted event into a tag that can be recorded by the state.
    ///
    /// # Key
    ///
    /// ```text
    /// <module (variable size bytes)> <code (big-endian u32)>
    /// ```
    ///
    /// # Value
    ///
    /// CBOR-serialized event value.
    ///
    fn into_event_tag(self) -> EventTag
    where
        Self: Sized,
    {
        etag_for_event(Self::module_name(), self.code(), self.value())
    }
}

/// Generate an EventTag corresponding to the passed event triple.
pub fn etag_for_event(module_name: &str, code: u32, value: cbor::Value) -> EventTag {
    EventTag {
        key: [module_name.as_bytes(), &code.to_be_bytes()].concat(),
        value: cbor::to_vec(value),
    }
}

/// A key-value pair representing an emitted event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventTag {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl EventTag {
    /// Whether the tag was emitted by the given module.
    pub fn is_from(&self, module_name: &str) -> bool {
        self.key.len() == module_name.len() + 4 && self.key.starts_with(module_name.as_bytes())
    }

    /// Decode the event value.
    pub fn decode<T: cbor::Decode>(&self) -> Result<T, cbor::DecodeError> {
        cbor::from_slice(&self.value)
    }
}
