use bytes::Bytes;

/// An application-level payload: an opaque data blob with optional metadata,
/// carried by request/response/stream/channel frames. The core never
/// interprets the bytes of either field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    data: Option<Bytes>,
    metadata: Option<Bytes>,
}

impl Payload {
    pub fn new(data: impl Into<Bytes>, metadata: Option<Bytes>) -> Self {
        Payload {
            data: Some(data.into()),
            metadata,
        }
    }

    pub fn from_data(data: impl Into<Bytes>) -> Self {
        Payload {
            data: Some(data.into()),
            metadata: None,
        }
    }

    pub fn empty() -> Self {
        Payload {
            data: None,
            metadata: None,
        }
    }

    pub fn data(&self) -> Option<&Bytes> {
        self.data.as_ref()
    }

    pub fn metadata(&self) -> Option<&Bytes> {
        self.metadata.as_ref()
    }

    pub fn into_parts(self) -> (Option<Bytes>, Option<Bytes>) {
        (self.data, self.metadata)
    }

    pub fn is_empty(&self) -> bool {
        self.data.as_ref().map_or(true, |b| b.is_empty())
            && self.metadata.as_ref().map_or(true, |b| b.is_empty())
    }
}
