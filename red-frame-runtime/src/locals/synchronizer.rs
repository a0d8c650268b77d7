use tracing::warn;

use crate::{
    common::{DictRef, InternedString, Mapping, Value},
    frame::{Frame, FrameRef},
    routine::SlotKind,
    Error, Result,
};

use super::FastLocalsProxy;

/// Copies every bound variable of `frame` into its locals dictionary, creating
/// the dictionary when needed. Keys of unbound variables are removed; keys that
/// do not name a variable are left alone. Free variables are only copied for
/// optimized routines.
pub fn fast_to_locals_with_error(frame: &mut Frame) -> Result<()> {
    let routine = frame.routine().clone();
    let locals = frame.locals_or_create();
    let mut locals = locals.borrow_mut();
    locals
        .try_reserve(routine.nlocalsplus())
        .map_err(|source| Error::AllocationError {
            what: "locals snapshot",
            routine: routine.name().clone(),
            requested: routine.nlocalsplus(),
            source,
        })?;
    for (slot, name, kind) in routine.variables() {
        if kind == SlotKind::Free && !routine.flags().optimized {
            continue;
        }
        match frame.variable(slot) {
            Some(value) => {
                locals.insert(name.clone(), value);
            }
            None => {
                locals.remove(name.as_str());
            }
        }
    }
    Ok(())
}

/// Like `fast_to_locals_with_error`, but a failure only leaves the snapshot stale.
pub fn fast_to_locals(frame: &mut Frame) {
    if let Err(e) = fast_to_locals_with_error(frame) {
        warn!(routine = %frame.routine(), error = %e, "locals snapshot is stale");
    }
}

/// Copying a mapping back into the slot array could rebind cells or names the
/// routine does not have, so it is refused. Use `FastLocalsProxy`.
pub fn locals_to_fast(_frame: &mut Frame, _clear: bool) -> Result<()> {
    Err(Error::LocalsToFastUnsupported)
}

/// The mapping `locals()` returns: for optimized frames a refreshed snapshot
/// dictionary, otherwise the frame's own locals dictionary.
pub fn py_locals(frame: &FrameRef) -> Result<DictRef> {
    let mut frame = frame.borrow_mut();
    if frame.routine().flags().optimized {
        fast_to_locals_with_error(&mut frame)?;
    }
    Ok(frame.locals_or_create())
}

/// The mapping a debugger sees as the frame's locals: a write-through proxy
/// for optimized frames, otherwise the frame's own locals dictionary.
pub fn locals_attr(frame: &FrameRef) -> Result<LocalsView> {
    if frame.borrow().routine().flags().optimized {
        Ok(LocalsView::Proxy(FastLocalsProxy::new(frame.clone())))
    } else {
        Ok(LocalsView::Dict(frame.borrow_mut().locals_or_create()))
    }
}

pub enum LocalsView {
    Dict(DictRef),
    Proxy(FastLocalsProxy),
}

impl Mapping for LocalsView {
    fn get_item(&self, key: &str) -> Option<Value> {
        match self {
            LocalsView::Dict(d) => d.borrow().get(key),
            LocalsView::Proxy(p) => p.get_item(key),
        }
    }

    fn set_item(&mut self, key: InternedString, value: Value) {
        match self {
            LocalsView::Dict(d) => {
                d.borrow_mut().insert(key, value);
            }
            LocalsView::Proxy(p) => p.set_item(key, value),
        }
    }

    fn del_item(&mut self, key: &str) -> Option<Value> {
        match self {
            LocalsView::Dict(d) => d.borrow_mut().remove(key),
            LocalsView::Proxy(p) => p.del_item(key),
        }
    }

    fn keys(&self) -> Vec<InternedString> {
        match self {
            LocalsView::Dict(d) => d.borrow().keys(),
            LocalsView::Proxy(p) => p.keys(),
        }
    }
}
