//! Drag and drop: dropped files become load or subtitle commands

use super::engine::InputHandle;

/// What dropping files onto the window should do to the playlist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DropAction {
    /// Replace the playlist with the first file, append the rest
    #[default]
    Replace,
    Append,
}

const SUBTITLE_EXTENSIONS: &[&str] = &[
    "aqt", "ass", "gsub", "idx", "jss", "lrc", "mks", "pgs", "pjs", "psb", "rt", "sbv", "slt",
    "smi", "sri", "srt", "ssa", "sub", "sup", "utf", "utf-8", "utf8", "vtt",
];

/// Guess from the extension whether a path names a subtitle file
pub fn might_be_subtitle_file(path: &str) -> bool {
    std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUBTITLE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

fn strip_file_scheme(line: &str) -> &str {
    line.strip_prefix("file://").unwrap_or(line)
}

impl InputHandle {
    /// Queue commands for dropped files.
    ///
    /// If every file looks like a subtitle, each is added as a subtitle
    /// track; otherwise all of them are loaded into the playlist.
    pub fn drop_files<S: AsRef<str>>(
        &self,
        files: &[S],
        action: DropAction,
        is_subtitle: impl Fn(&str) -> bool,
    ) {
        let all_subs = files.iter().all(|f| is_subtitle(f.as_ref()));
        for (i, file) in files.iter().enumerate() {
            let file = file.as_ref();
            if all_subs {
                self.run_command(&["osd-auto", "sub-add", file]);
            } else {
                let mode = if i == 0 && action == DropAction::Replace {
                    "replace"
                } else {
                    "append-play"
                };
                self.run_command(&["loadfile", file, mode]);
            }
        }
    }

    /// Handle dropped data of the given MIME type.
    ///
    /// Returns the number of files dropped, or None if the type is not
    /// supported.
    pub fn drop_mime_data(
        &self,
        mime_type: &str,
        data: &[u8],
        action: DropAction,
        is_subtitle: impl Fn(&str) -> bool,
    ) -> Option<usize> {
        let text = String::from_utf8_lossy(data);
        let files: Vec<&str> = match mime_type {
            "text/uri-list" => text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(strip_file_scheme)
                .collect(),
            "text/plain" => text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect(),
            _ => {
                tracing::debug!("Unsupported drop type '{}'", mime_type);
                return None;
            }
        };
        self.drop_files(&files, action, is_subtitle);
        Some(files.len())
    }
}
