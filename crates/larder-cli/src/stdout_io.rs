use std::io::{self, Write};

/// Writes to stdout; a closed reader (e.g. `larder forecast | head`) is not an error.
pub fn write_stdout_text(text: &str) -> io::Result<()> {
    write_tolerating_closed_pipe(&mut io::stdout().lock(), text.as_bytes())
}

pub fn write_stdout_line(text: &str) -> io::Result<()> {
    let mut line = String::with_capacity(text.len() + 1);
    line.push_str(text);
    line.push('\n');
    write_stdout_text(&line)
}

fn write_tolerating_closed_pipe<W>(writer: &mut W, bytes: &[u8]) -> io::Result<()>
where
    W: Write + ?Sized,
{
    match writer.write_all(bytes).and_then(|()| writer.flush()) {
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}
