use std::process::ExitCode;

use red_frame_runtime::{
    common::{Dict, Mapping, Value},
    frame::FrameAllocator,
    locals::{locals_attr, locals_to_fast, py_locals},
    routine::Routine,
};

/// Edits the locals of a frame the way a debugger would and prints the
/// snapshot view before and after.
pub fn run_inspect<O, E>(out: &mut O, err: &mut E) -> ExitCode
where
    O: std::io::Write,
    E: std::io::Write,
{
    super::report(inspect(out, err), err)
}

pub fn inspect<O, E>(out: &mut O, err: &mut E) -> anyhow::Result<()>
where
    O: std::io::Write,
    E: std::io::Write,
{
    let mut allocator = FrameAllocator::default();
    let routine = Routine::builder("area")
        .var_names(&["width", "height", "result"])
        .stack_size(2)
        .optimized(true)
        .build();
    let frame = allocator.create(None, &routine, &Dict::new_ref(), None)?;
    {
        let mut frame = frame.borrow_mut();
        frame.set_local(0, Value::Number(3.0));
        frame.set_local(1, Value::Number(4.0));
    }

    print_snapshot("before", &py_locals(&frame)?.borrow(), out)?;

    let mut view = locals_attr(&frame)?;
    view.set_item("height".into(), Value::Number(10.0));
    view.set_item("watch".into(), Value::from("width * height"));
    drop(view);

    print_snapshot("after", &py_locals(&frame)?.borrow(), out)?;

    if let Err(e) = locals_to_fast(&mut frame.borrow_mut(), false) {
        writeln!(err, "{}", e)?;
    }
    allocator.release(frame);
    Ok(())
}

fn print_snapshot<O>(label: &str, locals: &Dict, out: &mut O) -> std::io::Result<()>
where
    O: std::io::Write,
{
    let mut entries: Vec<_> = locals.iter().collect();
    entries.sort_by(|(l, _), (r, _)| l.cmp(r));
    writeln!(out, "== {} ==", label)?;
    for (name, value) in entries {
        writeln!(out, "{} = {}", name, value)?;
    }
    Ok(())
}
