use std::process::ExitCode;

use anyhow::anyhow;
use red_frame_runtime::{
    common::{Dict, Value},
    frame::{debug::dump_frame, BlockKind, FrameAllocator},
    routine::Routine,
};

/// Sets up nested blocks in a frame, raises an exception inside them and
/// shows the frame before and after unwinding.
pub fn run_unwind<O, E>(out: &mut O, err: &mut E) -> ExitCode
where
    O: std::io::Write,
    E: std::io::Write,
{
    super::report(unwind(out), err)
}

pub fn unwind<O>(out: &mut O) -> anyhow::Result<()>
where
    O: std::io::Write,
{
    let mut allocator = FrameAllocator::default();
    let routine = Routine::builder("guarded")
        .var_names(&["i"])
        .stack_size(4)
        .optimized(true)
        .first_line(1)
        .lines(&[(0, 1), (4, 2), (10, 3), (30, 6)])
        .build();
    let frame = allocator.create(None, &routine, &Dict::new_ref(), None)?;
    {
        let mut frame = frame.borrow_mut();
        frame.set_local(0, Value::Number(0.0));
        frame.push(Value::from("outer"));
        frame.setup_block(BlockKind::Except, 30, 1);
        frame.setup_block(BlockKind::Loop, 50, 1);
        frame.push(Value::Number(1.0));
        frame.push(Value::Number(2.0));
        frame.set_lasti(12);
        dump_frame(&frame, out)?;

        let handler = frame
            .unwind_exception()
            .ok_or_else(|| anyhow!("the exception escaped {}", frame.routine()))?;
        writeln!(
            out,
            "unwound to {} at {:04} (line {})",
            handler.kind,
            handler.handler,
            frame.line_number()
        )?;
        dump_frame(&frame, out)?;
        frame.post_eval_cleanup();
    }
    allocator.release(frame);
    Ok(())
}
