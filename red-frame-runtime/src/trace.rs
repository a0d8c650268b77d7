use crate::{frame::FrameRef, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    Call,
    Line,
    Opcode,
    Return,
    Exception,
}

/// A callback installed on a frame by a debugger or profiler.
pub trait TraceFunction {
    fn call(&self, frame: &FrameRef, event: TraceEvent) -> Result<()>;
}

impl<F> TraceFunction for F
where
    F: Fn(&FrameRef, TraceEvent) -> Result<()>,
{
    fn call(&self, frame: &FrameRef, event: TraceEvent) -> Result<()> {
        self(frame, event)
    }
}

/// Invokes the trace function of `frame` for `event`, honouring the per-line
/// and per-opcode switches. The frame must not be borrowed by the caller: the
/// trace function is free to inspect and modify it.
pub fn fire_trace(frame: &FrameRef, event: TraceEvent) -> Result<()> {
    let trace = {
        let frame = frame.borrow();
        match (frame.trace(), event) {
            (None, _) => return Ok(()),
            (Some(_), TraceEvent::Line) if !frame.trace_lines() => return Ok(()),
            (Some(_), TraceEvent::Opcode) if !frame.trace_opcodes() => return Ok(()),
            (Some(trace), _) => trace.clone(),
        }
    };
    trace.call(frame, event)
}
