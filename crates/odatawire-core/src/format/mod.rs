//! Writer protocol: a nested start/content/end scope machine in front of a
//! pluggable wire backend.
//!
//! The machine owns every legality check. Backends only ever see event
//! sequences that are well formed, so they can stay simple builders.

mod atom;
mod json;

#[cfg(test)]
mod tests;

// re-exports
pub use atom::AtomFormat;
pub use json::JsonFormat;

use crate::{
    error::{InternalError, WriterError},
    payload::{ODataEntityReferenceLink, ODataEntry, ODataNavigationLink, ODataValue},
};
use derive_more::Display;
use odatawire_config::{PayloadFormat, WriterConfig};
use std::fmt;

///
/// WriteEvent
///

#[derive(Clone, Copy, Debug)]
pub enum WriteEvent<'a> {
    StartEntry(&'a ODataEntry),
    EndEntry,
    StartFeed,
    EndFeed,
    StartNavigationLink(&'a ODataNavigationLink),
    EndNavigationLink,
    EntityReferenceLink(&'a ODataEntityReferenceLink),
    StartParameters,
    ParameterValue { name: &'a str, value: &'a ODataValue },
    StartParameter { name: &'a str },
    EndParameter,
    EndParameters,
    StartCollection { type_name: Option<&'a str> },
    CollectionItem(&'a ODataValue),
    EndCollection,
}

///
/// FormatWriter
///
/// Wire backend. Receives only well-formed event sequences.
///

pub trait FormatWriter: Send {
    fn write(&mut self, event: WriteEvent<'_>) -> Result<(), InternalError>;

    /// Produce the finished body.
    fn finish(self: Box<Self>) -> Result<Vec<u8>, InternalError>;
}

///
/// Frame
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
enum Frame {
    #[display("entry")]
    Entry,
    #[display("feed")]
    Feed,
    #[display("navigation link")]
    NavigationLink { is_collection: bool, links: usize },
    #[display("parameters")]
    Parameters,
    #[display("parameter")]
    Parameter { filled: bool },
    #[display("collection")]
    Collection,
}

///
/// ODataWriter
///
/// Scope stack over one backend. The first illegal call poisons the
/// writer; a poisoned writer never yields a body.
///

pub struct ODataWriter {
    backend: Box<dyn FormatWriter>,
    stack: Vec<Frame>,
    root_written: bool,
    poisoned: bool,
}

impl ODataWriter {
    #[must_use]
    pub fn new(backend: Box<dyn FormatWriter>) -> Self {
        Self {
            backend,
            stack: Vec::new(),
            root_written: false,
            poisoned: false,
        }
    }

    /// Writer over the backend selected by `config.payload_format`.
    #[must_use]
    pub fn for_config(config: &WriterConfig) -> Self {
        let backend: Box<dyn FormatWriter> = match config.payload_format {
            PayloadFormat::Json => Box::new(JsonFormat::new(config.indent)),
            PayloadFormat::Atom => Box::new(AtomFormat::new(config.indent, config.base_uri.as_str())),
        };

        Self::new(backend)
    }

    #[must_use]
    pub const fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn start_entry(&mut self, entry: &ODataEntry) -> Result<(), InternalError> {
        let ok = match self.stack.last() {
            None => !self.root_written,
            Some(Frame::Feed | Frame::Parameter { filled: false }) => true,
            Some(_) => false,
        };
        self.check("start an entry", ok)?;
        self.emit(WriteEvent::StartEntry(entry))?;
        self.open(Frame::Entry);

        Ok(())
    }

    pub fn end_entry(&mut self) -> Result<(), InternalError> {
        self.close("end an entry", |frame| matches!(frame, Frame::Entry))?;
        self.emit(WriteEvent::EndEntry)
    }

    pub fn start_feed(&mut self) -> Result<(), InternalError> {
        let ok = self.nested_value_allowed();
        self.check("start a feed", ok)?;
        self.emit(WriteEvent::StartFeed)?;
        self.open(Frame::Feed);

        Ok(())
    }

    pub fn end_feed(&mut self) -> Result<(), InternalError> {
        self.close("end a feed", |frame| matches!(frame, Frame::Feed))?;
        self.emit(WriteEvent::EndFeed)
    }

    pub fn start_navigation_link(&mut self, link: &ODataNavigationLink) -> Result<(), InternalError> {
        let ok = matches!(self.stack.last(), Some(Frame::Entry));
        self.check("start a navigation link", ok)?;
        self.emit(WriteEvent::StartNavigationLink(link))?;
        self.open(Frame::NavigationLink {
            is_collection: link.is_collection,
            links: 0,
        });

        Ok(())
    }

    pub fn end_navigation_link(&mut self) -> Result<(), InternalError> {
        self.close("end a navigation link", |frame| {
            matches!(frame, Frame::NavigationLink { .. })
        })?;
        self.emit(WriteEvent::EndNavigationLink)
    }

    /// Write one reference link, either inside a navigation link or as the
    /// whole body.
    pub fn write_entity_reference_link(
        &mut self,
        link: &ODataEntityReferenceLink,
    ) -> Result<(), InternalError> {
        let ok = match self.stack.last() {
            None => !self.root_written,
            Some(Frame::NavigationLink {
                is_collection,
                links,
            }) => *is_collection || *links == 0,
            Some(_) => false,
        };
        self.check("write a reference link", ok)?;
        self.emit(WriteEvent::EntityReferenceLink(link))?;

        match self.stack.last_mut() {
            Some(Frame::NavigationLink { links, .. }) => *links += 1,
            _ => self.root_written = true,
        }

        Ok(())
    }

    pub fn start_parameters(&mut self) -> Result<(), InternalError> {
        let ok = self.stack.is_empty() && !self.root_written;
        self.check("start parameters", ok)?;
        self.emit(WriteEvent::StartParameters)?;
        self.open(Frame::Parameters);

        Ok(())
    }

    pub fn write_parameter_value(&mut self, name: &str, value: &ODataValue) -> Result<(), InternalError> {
        let ok = matches!(self.stack.last(), Some(Frame::Parameters));
        self.check("write a parameter value", ok)?;

        self.emit(WriteEvent::ParameterValue { name, value })
    }

    /// Open a parameter whose value is written as a nested entry, feed or
    /// collection.
    pub fn start_parameter(&mut self, name: &str) -> Result<(), InternalError> {
        let ok = matches!(self.stack.last(), Some(Frame::Parameters));
        self.check("start a parameter", ok)?;
        self.emit(WriteEvent::StartParameter { name })?;
        self.open(Frame::Parameter { filled: false });

        Ok(())
    }

    pub fn end_parameter(&mut self) -> Result<(), InternalError> {
        self.close("end a parameter", |frame| {
            matches!(frame, Frame::Parameter { .. })
        })?;
        self.emit(WriteEvent::EndParameter)
    }

    pub fn end_parameters(&mut self) -> Result<(), InternalError> {
        self.close("end parameters", |frame| matches!(frame, Frame::Parameters))?;
        self.emit(WriteEvent::EndParameters)
    }

    pub fn start_collection(&mut self, type_name: Option<&str>) -> Result<(), InternalError> {
        let ok = self.nested_value_allowed();
        self.check("start a collection", ok)?;
        self.emit(WriteEvent::StartCollection { type_name })?;
        self.open(Frame::Collection);

        Ok(())
    }

    pub fn write_item(&mut self, value: &ODataValue) -> Result<(), InternalError> {
        let ok = matches!(self.stack.last(), Some(Frame::Collection));
        self.check("write a collection item", ok)?;

        self.emit(WriteEvent::CollectionItem(value))
    }

    pub fn end_collection(&mut self) -> Result<(), InternalError> {
        self.close("end a collection", |frame| matches!(frame, Frame::Collection))?;
        self.emit(WriteEvent::EndCollection)
    }

    /// Finish the body. Fails if the writer was poisoned, a scope is still
    /// open, or nothing was written.
    pub fn finish(self) -> Result<Vec<u8>, InternalError> {
        if self.poisoned {
            return Err(WriterError::Poisoned.into());
        }
        if let Some(frame) = self.stack.last() {
            return Err(WriterError::UnclosedScope {
                scope: frame.to_string(),
            }
            .into());
        }
        if !self.root_written {
            return Err(InternalError::writer_invariant("no payload was written"));
        }

        self.backend.finish()
    }

    fn nested_value_allowed(&self) -> bool {
        match self.stack.last() {
            None => !self.root_written,
            Some(Frame::Parameter { filled }) => !filled,
            Some(_) => false,
        }
    }

    fn scope_label(&self) -> String {
        match self.stack.last() {
            Some(frame) => frame.to_string(),
            None if self.root_written => "completed body".to_string(),
            None => "root".to_string(),
        }
    }

    fn check(&mut self, action: &'static str, ok: bool) -> Result<(), InternalError> {
        if self.poisoned {
            return Err(WriterError::Poisoned.into());
        }
        if ok {
            return Ok(());
        }

        self.poisoned = true;
        Err(WriterError::InvalidTransition {
            action,
            scope: self.scope_label(),
        }
        .into())
    }

    fn open(&mut self, frame: Frame) {
        match self.stack.last_mut() {
            None => self.root_written = true,
            Some(Frame::Parameter { filled }) => *filled = true,
            Some(_) => {}
        }

        self.stack.push(frame);
    }

    fn close(&mut self, action: &'static str, expected: fn(&Frame) -> bool) -> Result<(), InternalError> {
        let ok = self.stack.last().is_some_and(expected);
        self.check(action, ok)?;
        self.stack.pop();

        Ok(())
    }

    fn emit(&mut self, event: WriteEvent<'_>) -> Result<(), InternalError> {
        let result = self.backend.write(event);
        if result.is_err() {
            self.poisoned = true;
        }

        result
    }
}

impl fmt::Debug for ODataWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ODataWriter")
            .field("stack", &self.stack)
            .field("root_written", &self.root_written)
            .field("poisoned", &self.poisoned)
            .finish_non_exhaustive()
    }
}
