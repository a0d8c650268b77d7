use std::process::ExitCode;

use anyhow::Context;
use red_frame_runtime::{
    common::{Dict, Value},
    frame::{AllocatorConfig, FrameAllocator, FrameRef, ReleaseOutcome},
    routine::Routine,
};
use tracing::info;

/// Simulates `rounds` descents into a recursive routine `depth` calls deep and
/// prints the state of the frame pool afterwards.
pub fn run_recurse<O, E>(
    depth: usize,
    rounds: usize,
    config: AllocatorConfig,
    out: &mut O,
    err: &mut E,
) -> ExitCode
where
    O: std::io::Write,
    E: std::io::Write,
{
    super::report(recurse(depth, rounds, config, out), err)
}

pub fn recurse<O>(
    depth: usize,
    rounds: usize,
    config: AllocatorConfig,
    out: &mut O,
) -> anyhow::Result<()>
where
    O: std::io::Write,
{
    let mut allocator = FrameAllocator::new(config);
    let globals = Dict::new_ref();
    let fib = Routine::builder("fib")
        .var_names(&["n"])
        .stack_size(3)
        .optimized(true)
        .build();

    for round in 0..rounds {
        let mut chain: Vec<FrameRef> = Vec::with_capacity(depth);
        for n in (0..depth).rev() {
            let frame = allocator
                .create(chain.last(), &fib, &globals, None)
                .with_context(|| format!("failed to enter fib({}) in round {}", n, round))?;
            frame.borrow_mut().set_local(0, Value::Number(n as f64));
            chain.push(frame);
        }
        let mut pooled = 0;
        while let Some(frame) = chain.pop() {
            frame.borrow_mut().post_eval_cleanup();
            if allocator.release(frame) == ReleaseOutcome::Pooled {
                pooled += 1;
            }
        }
        info!(round, pooled, "returned from recursion");
        writeln!(out, "round {}: {} frames, {} pooled", round, depth, pooled)?;
    }
    allocator.debug_stats(out)?;
    let evicted = allocator.clear_pool();
    writeln!(out, "cleared {} pooled frames", evicted)?;
    Ok(())
}
