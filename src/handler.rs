//! Handler Registry (`SPEC_FULL.md` §4.5): a flyweight pool of named,
//! flag-annotated callbacks shared across elements, plus the sentinel
//! "root element" table of router-global handlers (§6).
//!
//! Handler identity for sharing purposes is name + flags + callback
//! pointers, exactly the way `click` compares `(hook, thunk)` pairs: plain
//! Rust `fn` pointers and a caller-supplied opaque `thunk: usize` are
//! `Copy + Eq`, so two elements that register the "same" handler collapse
//! onto the same pool slot without any unsafe code.

use crate::domain_types::{ElementIndex, HandlerId};
use crate::element::Element;
use crate::error::HandlerError;
use std::collections::HashMap;

const POOL_CHUNK: usize = 256;

/// Read-side callback: `(element, optional parameter) -> rendered value`.
pub type ReadHandlerFn = fn(&dyn Element, Option<&str>, usize) -> Result<String, String>;

/// Write-side callback: `(element, raw value) -> ()`.
pub type WriteHandlerFn = fn(&mut dyn Element, &str, usize) -> Result<(), String>;

/// Flag bits on a handler (`SPEC_FULL.md` §3, Data Model). Hand-rolled
/// rather than pulled from a crate, matching this codebase's existing
/// preference for small newtypes over external bitflag machinery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HandlerFlags(u8);

impl HandlerFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Has a read callback.
    pub const READABLE: Self = Self(1 << 0);
    /// Has a write callback.
    pub const WRITABLE: Self = Self(1 << 1);
    /// The read callback accepts a parameter (e.g. `X.foo.bar`).
    pub const READ_PARAM: Self = Self(1 << 2);
    /// Argument strings are passed through unquoted.
    pub const RAW: Self = Self(1 << 3);
    /// A single combined callback handles both directions (star handlers
    /// that synthesize concrete handlers on first use use this).
    pub const ONE_HOOK: Self = Self(1 << 4);
    /// Bits `change_handler_flags` is allowed to touch.
    pub const CLEARABLE: Self = Self(Self::RAW.0 | Self::READ_PARAM.0);

    /// Bitwise union.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether every bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Replaces the bits covered by `mask` with the corresponding bits of
    /// `set`, leaving everything else untouched (`change_handler_flags`).
    #[must_use]
    pub const fn masked_set(self, mask: Self, set: Self) -> Self {
        Self((self.0 & !mask.0) | (set.0 & mask.0))
    }
}

/// One of the two callback slots a handler carries.
#[derive(Debug, Clone, Copy)]
enum Callback {
    Read(ReadHandlerFn, usize),
    Write(WriteHandlerFn, usize),
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Callback::Read(f1, t1), Callback::Read(f2, t2)) => {
                std::ptr::eq(*f1 as *const (), *f2 as *const ()) && t1 == t2
            }
            (Callback::Write(f1, t1), Callback::Write(f2, t2)) => {
                std::ptr::eq(*f1 as *const (), *f2 as *const ()) && t1 == t2
            }
            _ => false,
        }
    }
}

/// A shared handler pool slot.
#[derive(Debug, Clone)]
struct HandlerSlot {
    name: String,
    flags: HandlerFlags,
    read: Option<(ReadHandlerFn, usize)>,
    write: Option<(WriteHandlerFn, usize)>,
    use_count: usize,
}

impl HandlerSlot {
    fn same_identity(&self, name: &str, flags: HandlerFlags, read: Option<(ReadHandlerFn, usize)>, write: Option<(WriteHandlerFn, usize)>) -> bool {
        self.name == name
            && self.flags == flags
            && fn_pair_eq_read(self.read, read)
            && fn_pair_eq_write(self.write, write)
    }
}

fn fn_pair_eq_read(a: Option<(ReadHandlerFn, usize)>, b: Option<(ReadHandlerFn, usize)>) -> bool {
    match (a, b) {
        (Some((f1, t1)), Some((f2, t2))) => std::ptr::eq(f1 as *const (), f2 as *const ()) && t1 == t2,
        (None, None) => true,
        _ => false,
    }
}

fn fn_pair_eq_write(a: Option<(WriteHandlerFn, usize)>, b: Option<(WriteHandlerFn, usize)>) -> bool {
    match (a, b) {
        (Some((f1, t1)), Some((f2, t2))) => std::ptr::eq(f1 as *const (), f2 as *const ()) && t1 == t2,
        (None, None) => true,
        _ => false,
    }
}

/// One (handler-id) entry in an element's singly-linked handler list,
/// modeled as a plain `Vec` entry rather than an actual intrusive list —
/// Rust's ownership rules make the arena-plus-index form of a linked list
/// (what this really is) clearer as a `Vec<HandlerId>` than as literal
/// `next` pointers.
type ElementHandlerList = Vec<(String, HandlerId)>;

/// The flyweight handler pool plus per-element and global handler tables.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    slots: Vec<Option<HandlerSlot>>,
    free_list: Vec<HandlerId>,
    by_name: HashMap<String, Vec<HandlerId>>,
    by_element: HashMap<ElementIndex, ElementHandlerList>,
}

/// Per-element facade an [`Element::add_handlers`] implementation writes
/// through; hides the pool bookkeeping behind three registration calls.
pub struct HandlerBuilder<'a> {
    registry: &'a mut HandlerRegistry,
    element: ElementIndex,
}

impl<'a> HandlerBuilder<'a> {
    pub(crate) fn new(registry: &'a mut HandlerRegistry, element: ElementIndex) -> Self {
        Self { registry, element }
    }

    /// Registers (or reuses) a read handler.
    pub fn add_read_handler(&mut self, name: &str, callback: ReadHandlerFn, thunk: usize) {
        self.registry.add_read_handler(self.element, name, callback, thunk);
    }

    /// Registers (or reuses) a write handler.
    pub fn add_write_handler(&mut self, name: &str, callback: WriteHandlerFn, thunk: usize) {
        self.registry.add_write_handler(self.element, name, callback, thunk);
    }

    /// Registers (or reuses) a handler with both callbacks and explicit flags.
    pub fn set_handler(
        &mut self,
        name: &str,
        flags: HandlerFlags,
        read: Option<(ReadHandlerFn, usize)>,
        write: Option<(WriteHandlerFn, usize)>,
    ) {
        self.registry.set_handler(self.element, name, flags, read, write);
    }
}

impl HandlerRegistry {
    /// Builds an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn grow_pool(&mut self) {
        let start = self.slots.len();
        self.slots.resize_with(start + POOL_CHUNK, || None);
        self.free_list
            .extend((start..start + POOL_CHUNK).rev().map(HandlerId::new));
    }

    fn alloc_slot(&mut self, slot: HandlerSlot) -> HandlerId {
        if self.free_list.is_empty() {
            self.grow_pool();
        }
        let id = self
            .free_list
            .pop()
            .expect("grow_pool always leaves at least one free id");
        let name = slot.name.clone();
        self.slots[id.as_usize()] = Some(slot);
        self.by_name.entry(name).or_default().push(id);
        id
    }

    fn find_compatible(
        &self,
        name: &str,
        flags: HandlerFlags,
        read: Option<(ReadHandlerFn, usize)>,
        write: Option<(WriteHandlerFn, usize)>,
    ) -> Option<HandlerId> {
        self.by_name.get(name)?.iter().copied().find(|id| {
            self.slots[id.as_usize()]
                .as_ref()
                .is_some_and(|slot| slot.same_identity(name, flags, read, write))
        })
    }

    fn reusable_zero_refcount(&self, name: &str) -> Option<HandlerId> {
        self.by_name.get(name)?.iter().copied().find(|id| {
            self.slots[id.as_usize()]
                .as_ref()
                .is_some_and(|slot| slot.use_count == 0)
        })
    }

    fn bind(&mut self, element: ElementIndex, name: &str, id: HandlerId) {
        if let Some(slot) = self.slots[id.as_usize()].as_mut() {
            slot.use_count += 1;
        }
        let list = self.by_element.entry(element).or_default();
        list.retain(|(n, _)| n != name);
        list.push((name.to_string(), id));
    }

    fn unbind(&mut self, element: ElementIndex, name: &str) {
        let Some(list) = self.by_element.get_mut(&element) else {
            return;
        };
        if let Some(pos) = list.iter().position(|(n, _)| n == name) {
            let (_, id) = list.remove(pos);
            self.release(id);
        }
    }

    fn release(&mut self, id: HandlerId) {
        if let Some(slot) = self.slots[id.as_usize()].as_mut() {
            slot.use_count = slot.use_count.saturating_sub(1);
            if slot.use_count == 0 {
                let name = slot.name.clone();
                self.slots[id.as_usize()] = None;
                if let Some(chain) = self.by_name.get_mut(&name) {
                    chain.retain(|&existing| existing != id);
                    if chain.is_empty() {
                        self.by_name.remove(&name);
                    }
                }
                self.free_list.push(id);
            }
        }
    }

    /// Registers or augments a handler with an explicit flag set and up to
    /// two callbacks, rebinding `element` to whichever pool slot ends up
    /// with matching identity (`SPEC_FULL.md` §4.5 "sharing discipline").
    pub fn set_handler(
        &mut self,
        element: ElementIndex,
        name: &str,
        flags: HandlerFlags,
        read: Option<(ReadHandlerFn, usize)>,
        write: Option<(WriteHandlerFn, usize)>,
    ) {
        self.unbind(element, name);

        let id = self
            .find_compatible(name, flags, read, write)
            .or_else(|| self.reusable_zero_refcount(name))
            .unwrap_or_else(|| {
                self.alloc_slot(HandlerSlot {
                    name: name.to_string(),
                    flags,
                    read,
                    write,
                    use_count: 0,
                })
            });

        if let Some(slot) = self.slots[id.as_usize()].as_mut() {
            if slot.use_count == 0 {
                slot.flags = flags;
                slot.read = read;
                slot.write = write;
            }
        }

        self.bind(element, name, id);
    }

    /// Registers (or reuses) a read-only or read/write-augmenting handler.
    pub fn add_read_handler(&mut self, element: ElementIndex, name: &str, callback: ReadHandlerFn, thunk: usize) {
        let existing_write = self.handler(element, name).and_then(|h| h.write);
        let mut flags = HandlerFlags::READABLE;
        if existing_write.is_some() {
            flags = flags.union(HandlerFlags::WRITABLE);
        }
        self.set_handler(element, name, flags, Some((callback, thunk)), existing_write);
    }

    /// Registers (or reuses) a write-only or read/write-augmenting handler.
    pub fn add_write_handler(&mut self, element: ElementIndex, name: &str, callback: WriteHandlerFn, thunk: usize) {
        let existing_read = self.handler(element, name).and_then(|h| h.read);
        let mut flags = HandlerFlags::WRITABLE;
        if existing_read.is_some() {
            flags = flags.union(HandlerFlags::READABLE);
        }
        self.set_handler(element, name, flags, existing_read, Some((callback, thunk)));
    }

    /// Masks and sets clearable bits on an existing handler bound to `element`.
    pub fn change_handler_flags(&mut self, element: ElementIndex, name: &str, mask: HandlerFlags, set: HandlerFlags) -> bool {
        let Some(id) = self.lookup_id(element, name) else {
            return false;
        };
        if let Some(slot) = self.slots[id.as_usize()].as_mut() {
            slot.flags = slot.flags.masked_set(mask, set);
            true
        } else {
            false
        }
    }

    fn lookup_id(&self, element: ElementIndex, name: &str) -> Option<HandlerId> {
        self.by_element
            .get(&element)?
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
            .or_else(|| {
                // Star-handler fallback: a lookup that misses by exact name
                // but finds a `"*"` entry reports that instead.
                self.by_element
                    .get(&element)?
                    .iter()
                    .find(|(n, _)| n == "*")
                    .map(|(_, id)| *id)
            })
    }

    /// Looks up a handler view by exact or star-fallback name
    /// (`SPEC_FULL.md` §4.5, §8 "star handler").
    #[must_use]
    pub fn handler(&self, element: ElementIndex, name: &str) -> Option<HandlerView> {
        let id = self.lookup_id(element, name)?;
        let slot = self.slots[id.as_usize()].as_ref()?;
        Some(HandlerView {
            id,
            name: slot.name.clone(),
            flags: slot.flags,
            read: slot.read,
            write: slot.write,
            use_count: slot.use_count,
        })
    }

    /// Number of references the pool slot `id` currently has.
    #[must_use]
    pub fn use_count(&self, id: HandlerId) -> usize {
        self.slots[id.as_usize()].as_ref().map_or(0, |s| s.use_count)
    }

    /// Invokes the read callback bound to `(element, name)`.
    ///
    /// # Errors
    /// Returns [`HandlerError`] if no such handler exists, it isn't
    /// readable, a parameter was supplied without `READ_PARAM`, or the
    /// callback itself fails.
    pub fn call_read(&self, element: &dyn Element, element_index: ElementIndex, name: &str, param: Option<&str>) -> Result<String, HandlerError> {
        let view = self.handler(element_index, name).ok_or_else(|| HandlerError::NotFound {
            element: element_index,
            name: name.to_string(),
        })?;
        if !view.flags.contains(HandlerFlags::READABLE) {
            return Err(HandlerError::NotReadable {
                element: element_index,
                name: name.to_string(),
            });
        }
        if param.is_some() && !view.flags.contains(HandlerFlags::READ_PARAM) {
            return Err(HandlerError::TakesNoParam {
                element: element_index,
                name: name.to_string(),
            });
        }
        let (callback, thunk) = view.read.ok_or_else(|| HandlerError::NotReadable {
            element: element_index,
            name: name.to_string(),
        })?;
        let resolved_name = if view.name == "*" { name } else { view.name.as_str() };
        callback(element, param.or(Some(resolved_name).filter(|_| view.name == "*")), thunk).map_err(|message| {
            HandlerError::Callback {
                element: element_index,
                name: name.to_string(),
                source: Box::<dyn std::error::Error + Send + Sync>::from(message),
            }
        })
    }

    /// Invokes the write callback bound to `(element, name)`.
    ///
    /// # Errors
    /// Returns [`HandlerError`] if no such handler exists, it isn't
    /// writable, or the callback itself fails.
    pub fn call_write(&self, element: &mut dyn Element, element_index: ElementIndex, name: &str, value: &str) -> Result<(), HandlerError> {
        let view = self.handler(element_index, name).ok_or_else(|| HandlerError::NotFound {
            element: element_index,
            name: name.to_string(),
        })?;
        if !view.flags.contains(HandlerFlags::WRITABLE) {
            return Err(HandlerError::NotWritable {
                element: element_index,
                name: name.to_string(),
            });
        }
        let (callback, thunk) = view.write.ok_or_else(|| HandlerError::NotWritable {
            element: element_index,
            name: name.to_string(),
        })?;
        callback(element, value, thunk).map_err(|message| HandlerError::Callback {
            element: element_index,
            name: name.to_string(),
            source: Box::<dyn std::error::Error + Send + Sync>::from(message),
        })
    }

    /// Drops every handler bound to `element`, releasing pool slots whose
    /// refcount reaches zero (§4.1 step 11: rollback removes specific
    /// handlers but keeps `ElementIndex::ROOT`'s defaults).
    pub fn remove_element_handlers(&mut self, element: ElementIndex) {
        if let Some(list) = self.by_element.remove(&element) {
            for (_, id) in list {
                self.release(id);
            }
        }
    }

    /// A builder scoped to `element`, for use from `Element::add_handlers`.
    pub fn builder(&mut self, element: ElementIndex) -> HandlerBuilder<'_> {
        HandlerBuilder::new(self, element)
    }
}

/// A read-only snapshot of a handler, returned by [`HandlerRegistry::handler`].
#[derive(Debug, Clone)]
pub struct HandlerView {
    /// Pool slot id backing this handler.
    pub id: HandlerId,
    /// The handler's name (its binding name, not necessarily `"*"`'s
    /// literal string once dynamically created).
    pub name: String,
    /// Flag bits.
    pub flags: HandlerFlags,
    /// Read callback, if any.
    pub read: Option<(ReadHandlerFn, usize)>,
    /// Write callback, if any.
    pub write: Option<(WriteHandlerFn, usize)>,
    /// Current refcount.
    pub use_count: usize,
}
