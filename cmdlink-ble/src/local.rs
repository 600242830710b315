//! Local simulation: a device-side channel driven from stdin
//!
//! Each input line is delivered as one write, then the characteristic is read
//! the way a peer would until the response is complete.

use std::io::{BufRead, Write};

use cmdlink_mcu::{Shell, TransportAdapter, TransportEvent};
use cmdlink_proto::{ReadProgress, ResponseReader};

pub fn run<S, R, W>(
    adapter: &mut TransportAdapter<S>,
    input: R,
    output: &mut W,
    hex: bool,
) -> std::io::Result<()>
where
    S: Shell,
    R: BufRead,
    W: Write,
{
    adapter.dispatch(TransportEvent::Connected);

    for line in input.lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        adapter.dispatch(TransportEvent::Write(&cmdlink_proto::text::encode(line)));

        let mut reader = ResponseReader::new();
        loop {
            let Some(chunk) = adapter.dispatch(TransportEvent::Read) else {
                break;
            };
            print_chunk(output, &chunk, hex)?;
            if reader.accept(&chunk) == ReadProgress::Done {
                break;
            }
        }
        if reader.possibly_truncated() {
            writeln!(output, "-- response filled every chunk, output may be truncated")?;
        }
        writeln!(output)?;
    }

    adapter.dispatch(TransportEvent::Disconnected);
    Ok(())
}

fn print_chunk<W: Write>(output: &mut W, chunk: &[u8], hex: bool) -> std::io::Result<()> {
    if hex {
        writeln!(output, "{}", data_encoding::HEXLOWER.encode(chunk))
    } else {
        writeln!(output, "{:?}", cmdlink_proto::text::decode(chunk))
    }
}
