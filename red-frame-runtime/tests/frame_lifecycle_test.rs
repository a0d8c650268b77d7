use std::rc::Rc;

use red_frame_runtime::{
    common::{Dict, Mapping, Value},
    frame::{BlockKind, FrameAllocator, FrameRef, ReleaseOutcome},
    generator::Generator,
    locals::{locals_attr, py_locals},
    routine::Routine,
    trace::{fire_trace, TraceEvent},
};
use rstest::rstest;

fn routine(name: &str, var_names: &[&str], stack_size: usize) -> Rc<Routine> {
    Routine::builder(name)
        .var_names(var_names)
        .stack_size(stack_size)
        .optimized(true)
        .first_line(10)
        .lines(&[(0, 10), (5, 11), (12, 13)])
        .build()
}

#[test]
fn loop_block_scenario() {
    let mut allocator = FrameAllocator::default();
    let f = routine("f", &["a", "b"], 3);
    let frame = allocator
        .create(None, &f, &Dict::new_ref(), None)
        .unwrap();
    {
        let mut frame = frame.borrow_mut();
        frame.setup_block(BlockKind::Loop, 50, 1);
        frame.push(Value::Number(1.0));
        frame.push(Value::Number(2.0));
        let block = frame.pop_block();
        assert_eq!(block.handler, 50);
        frame.truncate_stack(block.level);
        assert_eq!(frame.stack_depth(), 1);
        frame.post_eval_cleanup();
    }
    assert_eq!(allocator.release(frame), ReleaseOutcome::Pooled);
}

#[rstest]
#[case(1)]
#[case(8)]
#[case(64)]
fn recursive_calls_recycle_storage(#[case] depth: usize) {
    let mut allocator = FrameAllocator::default();
    let globals = Dict::new_ref();
    let fib = routine("fib", &["n"], 2);

    for round in 0..2 {
        let mut chain: Vec<FrameRef> = Vec::new();
        for _ in 0..depth {
            let frame = allocator
                .create(chain.last(), &fib, &globals, None)
                .unwrap();
            chain.push(frame);
        }
        if round == 1 {
            assert_eq!(allocator.pooled_in_class(fib.frame_size()), 0);
        }
        while let Some(frame) = chain.pop() {
            assert_eq!(allocator.release(frame), ReleaseOutcome::Pooled);
        }
        assert_eq!(allocator.pooled_in_class(fib.frame_size()), depth);
    }
    assert_eq!(allocator.stats().fresh, depth);
    assert_eq!(allocator.stats().reused, depth);
    assert_eq!(allocator.clear_pool(), depth);
    assert_eq!(allocator.pooled(), 0);
}

#[test]
fn debugger_edits_a_suspended_generator() {
    let mut allocator = FrameAllocator::default();
    let gen_routine = routine("gen", &["x", "y"], 2);
    let frame = allocator
        .create(None, &gen_routine, &Dict::new_ref(), None)
        .unwrap();
    let generator = Generator::new(frame);

    {
        let frame = generator.resume().unwrap();
        let mut frame = frame.borrow_mut();
        frame.set_local(0, Value::Number(1.0));
        frame.set_lasti(7);
    }
    generator.suspend();

    // The debugger looks at the dormant frame.
    {
        let frame = generator.frame().unwrap();
        assert!(!frame.borrow().is_executing());
        assert_eq!(frame.borrow().line_number(), 11);
        let mut view = locals_attr(&frame).unwrap();
        assert_eq!(view.get_item("x"), Some(Value::Number(1.0)));
        view.set_item("y".into(), Value::from("patched"));
        view.set_item("note".into(), Value::Bool(true));

        let snapshot = py_locals(&frame).unwrap();
        let expected: Dict = [
            ("x", Value::Number(1.0)),
            ("y", Value::from("patched")),
            ("note", Value::Bool(true)),
        ]
        .into_iter()
        .collect();
        assert_eq!(*snapshot.borrow(), expected);
    }

    {
        let frame = generator.resume().unwrap();
        assert_eq!(frame.borrow().local(1), Some(&Value::from("patched")));
    }
    assert_eq!(
        generator.finish(&mut allocator),
        Some(ReleaseOutcome::Pooled)
    );
}

#[test]
fn trace_function_sees_a_consistent_frame() {
    let mut allocator = FrameAllocator::default();
    let f = routine("f", &["a"], 1);
    let frame = allocator
        .create(None, &f, &Dict::new_ref(), None)
        .unwrap();
    let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
    let record = seen.clone();
    frame.borrow_mut().set_trace(Some(Rc::new(
        move |frame: &FrameRef, event: TraceEvent| -> red_frame_runtime::Result<()> {
            let line = frame.borrow().line_number();
            let a = py_locals(frame)?.borrow().get("a");
            record.borrow_mut().push((event, line, a));
            Ok(())
        },
    )));

    // What a dispatcher does when it crosses into line 11.
    {
        let mut frame = frame.borrow_mut();
        frame.set_local(0, Value::Number(5.0));
        frame.set_lasti(5);
        frame.set_line_number(11);
    }
    fire_trace(&frame, TraceEvent::Line).unwrap();
    assert_eq!(
        *seen.borrow(),
        vec![(TraceEvent::Line, 11, Some(Value::Number(5.0)))]
    );
}
