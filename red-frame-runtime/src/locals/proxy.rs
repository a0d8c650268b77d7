use crate::{
    common::{DictRef, InternedString, Mapping, Value},
    frame::FrameRef,
};

/// A mapping over the variables of a frame that reads and writes the slot
/// array directly. Keys that do not name a variable of the routine are kept
/// in the frame's locals dictionary, which is created on demand.
pub struct FastLocalsProxy {
    frame: FrameRef,
}

impl FastLocalsProxy {
    pub fn new(frame: FrameRef) -> Self {
        Self { frame }
    }

    pub fn frame(&self) -> &FrameRef {
        &self.frame
    }

    fn overflow(&self) -> DictRef {
        self.frame.borrow_mut().locals_or_create()
    }
}

impl Mapping for FastLocalsProxy {
    fn get_item(&self, key: &str) -> Option<Value> {
        let frame = self.frame.borrow();
        match frame.routine().slot_of(key) {
            Some((slot, _)) => frame.variable(slot),
            None => frame.locals().and_then(|locals| locals.borrow().get(key)),
        }
    }

    fn set_item(&mut self, key: InternedString, value: Value) {
        let slot = self.frame.borrow().routine().slot_of(key.as_str());
        match slot {
            Some((slot, _)) => {
                self.frame.borrow_mut().set_variable(slot, Some(value));
            }
            None => {
                self.overflow().borrow_mut().insert(key, value);
            }
        }
    }

    fn del_item(&mut self, key: &str) -> Option<Value> {
        let slot = self.frame.borrow().routine().slot_of(key);
        match slot {
            Some((slot, _)) => self.frame.borrow_mut().set_variable(slot, None),
            None => self.overflow().borrow_mut().remove(key),
        }
    }

    /// Bound variables in slot order, then the extra keys.
    fn keys(&self) -> Vec<InternedString> {
        let frame = self.frame.borrow();
        let routine = frame.routine();
        let mut keys: Vec<InternedString> = routine
            .variables()
            .filter(|(slot, _, _)| frame.variable(*slot).is_some())
            .map(|(_, name, _)| name.clone())
            .collect();
        if let Some(locals) = frame.locals() {
            // The dictionary may also hold a snapshot of the variables; the
            // slots are authoritative for those.
            let mut extra: Vec<InternedString> = locals
                .borrow()
                .keys()
                .into_iter()
                .filter(|key| routine.slot_of(key.as_str()).is_none())
                .collect();
            extra.sort();
            keys.append(&mut extra);
        }
        keys
    }
}

impl std::fmt::Debug for FastLocalsProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastLocalsProxy")
            .field("frame", &self.frame.borrow().routine().name())
            .finish()
    }
}
