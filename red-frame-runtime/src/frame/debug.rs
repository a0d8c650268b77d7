use std::io::Write;

use crate::common::Value;

use super::Frame;

pub fn dump_frame(frame: &Frame, w: &mut dyn Write) -> Result<(), std::io::Error> {
    writeln!(
        w,
        "== {} line {} ({}) ==",
        frame.routine(),
        frame.line_number(),
        if frame.is_executing() {
            "executing"
        } else {
            "suspended"
        }
    )?;
    for (slot, name, _) in frame.routine().variables() {
        match frame.variable(slot) {
            Some(v) => writeln!(w, "{:04} {:<12} = {}", slot, name, v)?,
            None => writeln!(w, "{:04} {:<12}   <unbound>", slot, name)?,
        }
    }
    for block in frame.blocks().active() {
        writeln!(
            w,
            "          {:<16} -> {:04} (level {})",
            block.kind, block.handler, block.level
        )?;
    }
    for v in frame.slots().stack_values() {
        write!(w, "          ")?;
        match v {
            Value::Nil => writeln!(w, "[  nil  ]")?,
            Value::Bool(b) => writeln!(w, "[{:^7}]", b)?,
            Value::Number(n) => writeln!(w, "[{:^7.3}]", n)?,
            v => writeln!(w, "[{:^7}]", v)?,
        }
    }
    Ok(())
}
