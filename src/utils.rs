use std::fmt::Display;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Characters that cut a file name short, checked in this order.
const DENIED_SYMBOLS: [char; 13] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|', '+', '!', '%', '@'];

/// Name used when nothing usable can be derived from the link.
pub const FALLBACK_FILENAME: &str = "download";

pub const TEMP_SUFFIX: &str = ".tmp";

/// Takes the last `/` segment of the link and, for each denied symbol in
/// turn, drops everything from its last occurrence onwards.
///
/// May return an empty string, e.g. for links ending in `/`.
pub fn get_filename_from_url(link: &str) -> String {
    let mut name = link.rsplit('/').next().unwrap_or_default();
    for symbol in DENIED_SYMBOLS {
        if let Some(i) = name.rfind(symbol) {
            name = &name[..i];
        }
    }
    name.to_string()
}

pub fn temp_filepath(dir: &Path, filename: &str) -> PathBuf {
    dir.join(format!("{}{}", filename, TEMP_SUFFIX))
}

pub fn info(msg: impl Display) {
    println!("[Info] {}", msg);
}

pub fn warning(sink: &mut dyn Write, msg: impl Display) {
    // best effort
    let _ = writeln!(sink, "[Warning] {}", msg);
}

pub fn error(msg: impl Display) {
    eprintln!("[Error] {}", msg);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_last_segment_and_extension() {
        assert_eq!(get_filename_from_url("http://x.com/a/report.PDF"), "report.PDF");
        assert_eq!(get_filename_from_url("https://host/archive.tar.gz"), "archive.tar.gz");
    }

    #[test]
    fn strips_from_denied_symbols() {
        assert_eq!(get_filename_from_url("http://x.com/file:name"), "file");
        assert_eq!(get_filename_from_url("http://x.com/get.php?id=7"), "get.php");
        assert_eq!(get_filename_from_url("http://x.com/a%20b.txt"), "a");
        assert_eq!(get_filename_from_url("http://x.com/me@host"), "me");
    }

    #[test]
    fn cuts_at_last_occurrence_per_symbol() {
        // ':' is cut at its last occurrence first, then '?' on what remains
        assert_eq!(get_filename_from_url("http://x.com/a?b:c?d"), "a");
        assert_eq!(get_filename_from_url("http://x.com/a:b:c"), "a:b");
    }

    #[test]
    fn trailing_slash_yields_empty_name() {
        assert_eq!(get_filename_from_url("http://x.com/dir/"), "");
        assert_eq!(get_filename_from_url(""), "");
    }

    #[test]
    fn link_without_slash_is_its_own_segment() {
        assert_eq!(get_filename_from_url("file.bin"), "file.bin");
    }

    #[test]
    fn warnings_are_prefixed_lines() {
        let mut sink = Vec::new();
        warning(&mut sink, "disk almost full");
        warning(&mut sink, 42);
        assert_eq!(String::from_utf8(sink).unwrap(), "[Warning] disk almost full\n[Warning] 42\n");
    }

    #[test]
    fn temp_path_appends_suffix() {
        let path = temp_filepath(Path::new("out"), "report.PDF");
        assert_eq!(path, Path::new("out").join("report.PDF.tmp"));
    }
}
