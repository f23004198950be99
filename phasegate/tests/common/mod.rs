#![allow(dead_code)]

use phasegate::testing::{Note, NoteQuery, SpyPort};
use phasegate::{
    Actions, Actor, DispatcherFactory, ExtensionRegistry, MemoryStore, Record, RecordDescriptor,
    RecordQuery, Registration,
};
use std::sync::Arc;

// ============================================================================
// Ports
// ============================================================================

pub type NoteStore = MemoryStore<Note, NoteQuery>;
pub type NotePort = SpyPort<Note, NoteStore>;

/// Three draft notes: 1 "alpha", 2 "beta", 3 "gamma".
pub fn seeded() -> Arc<NotePort> {
    Arc::new(SpyPort::new(MemoryStore::with_records([
        Note::new(1, "alpha"),
        Note::new(2, "beta"),
        Note::new(3, "gamma"),
    ])))
}

pub fn empty() -> Arc<NotePort> {
    Arc::new(SpyPort::new(MemoryStore::new()))
}

// ============================================================================
// Assembly
// ============================================================================

pub fn actor() -> Actor {
    Actor::new("alice")
}

pub fn build(registrations: Vec<Registration>, port: Arc<NotePort>) -> Actions<Note, NotePort> {
    let registry = ExtensionRegistry::builder()
        .register_all(registrations)
        .build()
        .unwrap();
    DispatcherFactory::new(registry)
        .build::<Note, _>(port)
        .unwrap()
}

pub fn stored(port: &NotePort) -> Vec<Note> {
    port.inner().snapshot().unwrap()
}

// ============================================================================
// Bare Records
// ============================================================================

/// A record without optional capabilities.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub id: u32,
    pub label: String,
}

impl Record for Tag {
    type Id = u32;
    type Status = ();

    const DESCRIPTOR: RecordDescriptor = RecordDescriptor::new("tag")
        .with_id("id")
        .with_fields(&["id", "label"]);

    fn id(&self) -> Option<&u32> {
        Some(&self.id)
    }
}

/// Matches every tag whose label starts with the prefix.
#[derive(Debug, Clone, Default)]
pub struct TagQuery {
    pub prefix: String,
}

impl RecordQuery<Tag> for TagQuery {
    fn matches(&self, record: &Tag) -> bool {
        record.label.starts_with(&self.prefix)
    }
}

/// A record that declares no identifier.
#[derive(Debug, Clone)]
pub struct LogLine {
    pub text: String,
}

impl Record for LogLine {
    type Id = u64;
    type Status = ();

    const DESCRIPTOR: RecordDescriptor = RecordDescriptor::new("log_line").with_fields(&["text"]);

    fn id(&self) -> Option<&u64> {
        None
    }
}

/// Matches every log line.
#[derive(Debug, Clone, Default)]
pub struct AnyLine;

impl RecordQuery<LogLine> for AnyLine {
    fn matches(&self, _record: &LogLine) -> bool {
        true
    }
}
