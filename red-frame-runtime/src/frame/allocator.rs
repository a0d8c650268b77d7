use std::{cell::RefCell, collections::BTreeMap, io::Write, rc::Rc};

use tracing::{debug, trace};

use crate::{
    common::{Dict, DictRef, InternedString, Value},
    routine::Routine,
    Error, Result,
};

use super::{Frame, FrameRef, SlotArray};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorConfig {
    // Slot arrays with a larger capacity are never pooled.
    pub max_pooled_class: usize,
    // The most slot arrays kept per size class.
    pub max_per_class: usize,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            max_pooled_class: 256,
            max_per_class: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    pub fresh: usize,
    pub reused: usize,
    pub pooled_releases: usize,
    pub discarded: usize,
    pub shared: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    // The storage went back to the free list of its size class.
    Pooled,
    // The storage was freed.
    Discarded,
    // Another owner (a generator, a debugger) still holds the frame.
    StillShared,
}

/// Hands out frames, recycling the slot storage of released frames whose
/// routines have the same shape. Only the storage is recycled: a recycled frame
/// is a new `Rc`, so weak references to a released frame never see it again.
pub struct FrameAllocator {
    config: AllocatorConfig,
    // size class (slot array capacity) -> cleared storage.
    free_lists: BTreeMap<usize, Vec<SlotArray>>,
    stats: AllocatorStats,
}

impl FrameAllocator {
    pub fn new(config: AllocatorConfig) -> Self {
        Self {
            config,
            free_lists: BTreeMap::new(),
            stats: AllocatorStats::default(),
        }
    }

    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Creates a frame running `routine` called from `back`.
    pub fn create(
        &mut self,
        back: Option<&FrameRef>,
        routine: &Rc<Routine>,
        globals: &DictRef,
        locals: Option<DictRef>,
    ) -> Result<FrameRef> {
        let size_class = routine.frame_size();
        let slots = match self.take_pooled(size_class) {
            Some(mut slots) => {
                slots.reset(routine.nlocalsplus());
                self.stats.reused += 1;
                slots
            }
            None => {
                let slots = SlotArray::new(size_class, routine.nlocalsplus()).map_err(
                    |source| Error::AllocationError {
                        what: "frame",
                        routine: routine.name().clone(),
                        requested: size_class,
                        source,
                    },
                )?;
                self.stats.fresh += 1;
                slots
            }
        };
        let builtins = Self::builtins_for(back, globals);
        let locals = if routine.flags().optimized {
            None
        } else if routine.flags().new_locals {
            Some(Dict::new_ref())
        } else {
            Some(locals.unwrap_or_else(|| globals.clone()))
        };
        trace!(routine = %routine, size_class, "create frame");
        Ok(Rc::new(RefCell::new(Frame::new(
            slots,
            back,
            routine.clone(),
            builtins,
            globals.clone(),
            locals,
        ))))
    }

    // Frames sharing their caller's globals share its builtins too. Otherwise the
    // builtins come from the `__builtins__` entry of the globals. A caller that
    // is mutably borrowed (being executed) is treated like a different module.
    fn builtins_for(back: Option<&FrameRef>, globals: &DictRef) -> DictRef {
        if let Some(back) = back {
            match back.try_borrow() {
                Ok(back) if Rc::ptr_eq(back.globals(), globals) => {
                    return back.builtins().clone();
                }
                Ok(_) => {}
                Err(_) => trace!("caller is executing, builtins come from globals"),
            }
        }
        match globals.borrow().get("__builtins__") {
            Some(Value::Dict(builtins)) => builtins,
            _ => Rc::new(RefCell::new(Dict::from_iter([(
                InternedString::new("None"),
                Value::Nil,
            )]))),
        }
    }

    fn take_pooled(&mut self, size_class: usize) -> Option<SlotArray> {
        self.free_lists.get_mut(&size_class).and_then(Vec::pop)
    }

    /// Gives up the caller's reference to `frame`. When it was the last one,
    /// the storage is pooled if its size class has room, and freed otherwise.
    pub fn release(&mut self, frame: FrameRef) -> ReleaseOutcome {
        let frame = match Rc::try_unwrap(frame) {
            Ok(frame) => frame.into_inner(),
            Err(_) => {
                self.stats.shared += 1;
                return ReleaseOutcome::StillShared;
            }
        };
        let name = frame.routine().name().clone();
        let mut slots = frame.into_slots();
        let size_class = slots.capacity();
        if size_class > self.config.max_pooled_class {
            self.stats.discarded += 1;
            trace!(routine = %name, size_class, "discard frame");
            return ReleaseOutcome::Discarded;
        }
        let free_list = self.free_lists.entry(size_class).or_default();
        if free_list.len() >= self.config.max_per_class {
            self.stats.discarded += 1;
            trace!(routine = %name, size_class, "discard frame, free list is full");
            return ReleaseOutcome::Discarded;
        }
        slots.reset(0);
        free_list.push(slots);
        self.stats.pooled_releases += 1;
        trace!(routine = %name, size_class, "pool frame");
        ReleaseOutcome::Pooled
    }

    /// Frees every pooled slot array and returns how many there were.
    pub fn clear_pool(&mut self) -> usize {
        let evicted = self.pooled();
        self.free_lists.clear();
        debug!(evicted, "cleared frame pool");
        evicted
    }

    pub fn pooled(&self) -> usize {
        self.free_lists.values().map(Vec::len).sum()
    }

    pub fn pooled_in_class(&self, size_class: usize) -> usize {
        self.free_lists.get(&size_class).map_or(0, Vec::len)
    }

    pub fn stats(&self) -> &AllocatorStats {
        &self.stats
    }

    pub fn debug_stats(&self, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(out, "== frame pool ==")?;
        writeln!(
            out,
            "{:>10} pooled frames ({} fresh, {} reused, {} discarded)",
            self.pooled(),
            self.stats.fresh,
            self.stats.reused,
            self.stats.discarded
        )?;
        for (size_class, free_list) in self.free_lists.iter().filter(|(_, l)| !l.is_empty()) {
            writeln!(
                out,
                "{:>10} x {} slots",
                free_list.len(),
                size_class
            )?;
        }
        Ok(())
    }
}

impl Default for FrameAllocator {
    fn default() -> Self {
        Self::new(AllocatorConfig::default())
    }
}
