//! Poster descriptor feeds.
//!
//! A feed is any finite, lazy sequence of descriptors. The scraping crate
//! produces them from poster pages; tests hand the pipeline plain vectors.

use std::io;
use std::path::Path;

use crate::models::PosterDescriptor;

/// A finite sequence of posters to process, pulled one at a time.
pub trait PosterFeed {
    fn next_descriptor(&mut self) -> Option<PosterDescriptor>;
}

/// Any descriptor iterator is a feed, so `vec.into_iter()` works directly.
impl<I> PosterFeed for I
where
    I: Iterator<Item = PosterDescriptor>,
{
    fn next_descriptor(&mut self) -> Option<PosterDescriptor> {
        self.next()
    }
}

/// Read a batch import file: one poster-page reference per line.
/// Blank lines and lines starting with `#` are ignored.
pub fn read_import_file(path: &Path) -> io::Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn import_file_skips_comments_and_blanks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# poster sets").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  https://theposterdb.com/set/1  ").unwrap();
        writeln!(file, "https://theposterdb.com/poster/2").unwrap();
        writeln!(file, "   ").unwrap();

        let lines = read_import_file(file.path()).unwrap();
        assert_eq!(
            lines,
            vec![
                "https://theposterdb.com/set/1".to_string(),
                "https://theposterdb.com/poster/2".to_string(),
            ]
        );
    }

    #[test]
    fn import_file_missing_is_an_error() {
        assert!(read_import_file(Path::new("/nonexistent/batch.txt")).is_err());
    }
}
