use crate::core::{TraceEvent, TraceSinkError};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Writes one `<elapsed>\t<description>` line per event.
pub fn write_events<W: Write>(events: &[TraceEvent], output: &mut W) -> io::Result<()> {
    for event in events {
        writeln!(output, "{event}")?;
    }
    output.flush()
}

/// Replaces the content of `path` with `events`.
///
/// The file is truncated first, so an empty trace leaves an empty file. It is
/// closed when this returns, whether or not every line was written.
pub fn persist(events: &[TraceEvent], path: &Path) -> Result<usize, TraceSinkError> {
    let sink_error = |source| TraceSinkError {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(sink_error)?;
    let mut writer = BufWriter::new(file);
    write_events(events, &mut writer).map_err(sink_error)?;

    Ok(events.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn sample() -> Vec<TraceEvent> {
        vec![
            TraceEvent::new(Duration::from_millis(5), "parse"),
            TraceEvent::new(Duration::from_millis(12), "execute"),
        ]
    }

    #[test]
    fn test_write_events_format() {
        let mut buffer = Vec::new();
        write_events(&sample(), &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "5ms\tparse\n12ms\texecute\n");
    }

    #[test]
    fn test_persist_truncates_previous_run() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("query_debug.log");

        assert_eq!(persist(&sample(), &path).unwrap(), 2);
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().collect::<Vec<_>>(), vec!["5ms\tparse", "12ms\texecute"]);

        // Повторный запуск с пустым трейсом не оставляет старых строк
        assert_eq!(persist(&[], &path).unwrap(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_persist_into_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("trace.log");

        let err = persist(&sample(), &path).unwrap_err();
        assert_eq!(err.path, path);
        assert_eq!(err.source.kind(), io::ErrorKind::NotFound);
    }
}
