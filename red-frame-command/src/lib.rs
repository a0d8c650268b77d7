pub mod inspect;
pub mod recurse;
pub mod unwind;

use std::process::ExitCode;

fn report<E>(result: anyhow::Result<()>, err: &mut E) -> ExitCode
where
    E: std::io::Write,
{
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = writeln!(err, "{:#}", e);
            ExitCode::FAILURE
        }
    }
}
