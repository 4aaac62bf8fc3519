//! Tag transport abstraction (spec §2, §9 "External interfaces").
//!
//! A real deployment would reach the PLC over OPC-UA; that client is out of
//! scope here, so the only implementation is [`LocalTransport`], the same
//! in-memory fallback the original CODESYS-facing client dropped into when
//! the runtime wasn't reachable. Kept as a trait seam (mirroring the
//! teacher's `Scale`/`Motor` collaborator split) so a real OPC-UA client
//! could be added later without touching the simulation crate.

use conveyor_core::{Tag, TagTable, TagValue};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport not connected")]
    NotConnected,
    #[error("tag table error: {0}")]
    Tag(#[from] conveyor_core::TagError),
}

/// Read/write access to the shared tag table, abstracted behind a
/// connection lifecycle so a networked implementation can slot in later.
pub trait Transport {
    fn connect(&mut self) -> Result<(), TransportError>;
    fn read(&self, tag: Tag) -> Result<TagValue, TransportError>;
    fn write(&mut self, tag: Tag, value: TagValue) -> Result<(), TransportError>;
    fn disconnect(&mut self);
}

/// In-memory transport: the tag table lives in this process. This is the
/// only transport the simulation ships with (no real OPC-UA client).
#[derive(Debug, Default)]
pub struct LocalTransport {
    tags: TagTable,
    connected: bool,
}

impl LocalTransport {
    pub fn new() -> Self {
        tracing::info!("local transport: no OPC-UA server configured, using in-memory tag table");
        Self::default()
    }

    pub fn tags(&self) -> &TagTable {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut TagTable {
        &mut self.tags
    }
}

impl Transport for LocalTransport {
    fn connect(&mut self) -> Result<(), TransportError> {
        self.connected = true;
        Ok(())
    }

    fn read(&self, tag: Tag) -> Result<TagValue, TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        Ok(self.tags.read(tag))
    }

    fn write(&mut self, tag: Tag, value: TagValue) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.tags.write(tag, value)?;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_fail_before_connect() {
        let t = LocalTransport::new();
        assert!(matches!(t.read(Tag::EStop), Err(TransportError::NotConnected)));
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut t = LocalTransport::new();
        t.connect().unwrap();
        t.write(Tag::EStop, TagValue::Bool(false)).unwrap();
        assert_eq!(t.read(Tag::EStop).unwrap(), TagValue::Bool(false));
    }

    #[test]
    fn disconnect_blocks_further_access() {
        let mut t = LocalTransport::new();
        t.connect().unwrap();
        t.disconnect();
        assert!(matches!(t.read(Tag::EStop), Err(TransportError::NotConnected)));
    }
}
