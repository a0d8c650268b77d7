use std::{cell::RefCell, rc::Rc};

use tracing::trace;

use crate::{
    common::InternedString,
    frame::{FrameAllocator, FrameRef, ReleaseOutcome},
    Error, Result,
};

/// The owner of a frame that can be suspended and resumed. The frame links
/// back to its generator without owning it.
pub struct Generator {
    name: InternedString,
    // None once the generator has finished.
    frame: RefCell<Option<FrameRef>>,
}

impl Generator {
    /// Takes ownership of a freshly created frame. The frame starts suspended:
    /// the body only runs once the generator is resumed.
    pub fn new(frame: FrameRef) -> Rc<Self> {
        let name = frame.borrow().routine().name().clone();
        let generator = Rc::new(Self {
            name,
            frame: RefCell::new(Some(frame.clone())),
        });
        let mut frame = frame.borrow_mut();
        frame.set_generator(Rc::downgrade(&generator));
        frame.mark_suspended();
        generator
    }

    pub fn name(&self) -> &InternedString {
        &self.name
    }

    pub fn frame(&self) -> Option<FrameRef> {
        self.frame.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.frame
            .borrow()
            .as_ref()
            .is_some_and(|frame| frame.borrow().is_executing())
    }

    pub fn is_finished(&self) -> bool {
        self.frame.borrow().is_none()
    }

    /// Puts the frame back on the call stack and hands it to the dispatcher.
    pub fn resume(&self) -> Result<FrameRef> {
        let frame = self.frame().ok_or_else(|| Error::GeneratorExhausted {
            name: self.name.clone(),
        })?;
        if frame.borrow().is_executing() {
            return Err(Error::GeneratorAlreadyExecuting {
                name: self.name.clone(),
            });
        }
        frame.borrow_mut().mark_resumed();
        trace!(generator = %self.name, "resume");
        Ok(frame)
    }

    /// Called by the dispatcher when the body yields.
    pub fn suspend(&self) {
        if let Some(frame) = self.frame.borrow().as_ref() {
            frame.borrow_mut().mark_suspended();
            trace!(generator = %self.name, "suspend");
        }
    }

    /// Called when the body returns or the generator is closed. Drops the
    /// generator's reference to the frame; returns None when it had finished already.
    pub fn finish(&self, allocator: &mut FrameAllocator) -> Option<ReleaseOutcome> {
        let frame = self.frame.borrow_mut().take()?;
        frame.borrow_mut().post_eval_cleanup();
        trace!(generator = %self.name, "finish");
        Some(allocator.release(frame))
    }
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("name", &self.name)
            .field("finished", &self.is_finished())
            .finish()
    }
}
