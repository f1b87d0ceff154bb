//! Unified diff parser
//!
//! Turns already-produced unified diff text (`git diff`, `diff -u`, a pull
//! request's `.diff`) into file-level records. Parsing is permissive: text
//! that does not look like a diff simply yields no records.

use serde::{Deserialize, Serialize};

/// Path used by diff tools for the missing side of an added or deleted file
pub const DEV_NULL: &str = "/dev/null";

/// One file's worth of changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub from: String,
    pub to: String,
    pub chunks: Vec<RawChunk>,
}

/// A hunk of changes within a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChunk {
    /// The `@@ ... @@` header line as it appeared in the diff
    pub content: String,
    pub old_start: u32,
    pub old_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
    pub changes: Vec<Change>,
}

/// A single line in a hunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    /// The raw line, including its `+`/`-`/` ` prefix
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_line: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Add,
    Del,
    Normal,
}

/// Where the parser is inside the current hunk body
struct HunkCursor {
    chunk: RawChunk,
    old_line: u32,
    new_line: u32,
    old_left: u32,
    new_left: u32,
}

impl HunkCursor {
    fn expects_body(&self) -> bool {
        self.old_left > 0 || self.new_left > 0
    }

    /// Consume one body line. Returns false when the line cannot belong to
    /// this hunk, including when its line number would pass `u32::MAX`.
    fn push(&mut self, line: &str) -> bool {
        let change = match line.as_bytes().first() {
            Some(b'+') => {
                let no = self.new_line;
                let Some(next) = no.checked_add(1) else {
                    return false;
                };
                self.new_line = next;
                self.new_left = self.new_left.saturating_sub(1);
                Change {
                    kind: ChangeKind::Add,
                    content: line.to_string(),
                    old_line: None,
                    new_line: Some(no),
                }
            }
            Some(b'-') => {
                let no = self.old_line;
                let Some(next) = no.checked_add(1) else {
                    return false;
                };
                self.old_line = next;
                self.old_left = self.old_left.saturating_sub(1);
                Change {
                    kind: ChangeKind::Del,
                    content: line.to_string(),
                    old_line: Some(no),
                    new_line: None,
                }
            }
            // Some tools strip the trailing space of an empty context line
            Some(b' ') | None => {
                let (old_no, new_no) = (self.old_line, self.new_line);
                let (Some(old_next), Some(new_next)) =
                    (old_no.checked_add(1), new_no.checked_add(1))
                else {
                    return false;
                };
                self.old_line = old_next;
                self.new_line = new_next;
                self.old_left = self.old_left.saturating_sub(1);
                self.new_left = self.new_left.saturating_sub(1);
                Change {
                    kind: ChangeKind::Normal,
                    content: line.to_string(),
                    old_line: Some(old_no),
                    new_line: Some(new_no),
                }
            }
            // "\ No newline at end of file"
            Some(b'\\') => return true,
            Some(_) => return false,
        };
        self.chunk.changes.push(change);
        true
    }
}

/// Parse unified diff text into file records, in the order the files appear.
pub fn parse(input: &str) -> Vec<FileDiff> {
    let mut files = Vec::new();
    let mut current_file: Option<FileDiff> = None;
    let mut current_hunk: Option<HunkCursor> = None;

    for line in input.lines() {
        if let Some(ref mut hunk) = current_hunk {
            if hunk.expects_body() {
                if hunk.push(line) {
                    continue;
                }
                // Truncated hunk: close it and treat the line as a header
                hunk.old_left = 0;
                hunk.new_left = 0;
            } else if line.starts_with('\\') {
                continue;
            }
        }

        if line.starts_with("diff --git ") {
            finish_file(&mut files, &mut current_file, &mut current_hunk);
            let (from, to) = parse_diff_git_line(line);
            current_file = Some(FileDiff {
                from: from.unwrap_or_default(),
                to: to.unwrap_or_default(),
                chunks: Vec::new(),
            });
        } else if let Some(path) = line.strip_prefix("--- ") {
            // A plain `diff -u` has no `diff --git` line, so `---` opens a
            // new file unless it directly follows a fresh git header.
            let starts_new = match current_file {
                Some(ref f) => current_hunk.is_some() || !f.chunks.is_empty(),
                None => true,
            };
            if starts_new {
                finish_file(&mut files, &mut current_file, &mut current_hunk);
                current_file = Some(FileDiff {
                    from: String::new(),
                    to: String::new(),
                    chunks: Vec::new(),
                });
            }
            if let Some(ref mut f) = current_file {
                f.from = header_path(path);
            }
        } else if let Some(path) = line.strip_prefix("+++ ") {
            let file = current_file.get_or_insert_with(|| FileDiff {
                from: String::new(),
                to: String::new(),
                chunks: Vec::new(),
            });
            file.to = header_path(path);
        } else if let Some(path) = line.strip_prefix("rename from ") {
            if let Some(ref mut f) = current_file {
                f.from = path.to_string();
            }
        } else if let Some(path) = line.strip_prefix("rename to ") {
            if let Some(ref mut f) = current_file {
                f.to = path.to_string();
            }
        } else if line.starts_with("new file mode") {
            if let Some(ref mut f) = current_file {
                f.from = DEV_NULL.to_string();
            }
        } else if line.starts_with("deleted file mode") {
            if let Some(ref mut f) = current_file {
                f.to = DEV_NULL.to_string();
            }
        } else if line.starts_with("@@") {
            let Some(header) = parse_hunk_header(line) else {
                continue;
            };
            let file = current_file.get_or_insert_with(|| FileDiff {
                from: String::new(),
                to: String::new(),
                chunks: Vec::new(),
            });
            if let Some(h) = current_hunk.take() {
                file.chunks.push(h.chunk);
            }
            current_hunk = Some(HunkCursor {
                old_line: header.old_start,
                new_line: header.new_start,
                old_left: header.old_lines,
                new_left: header.new_lines,
                chunk: RawChunk {
                    content: line.to_string(),
                    old_start: header.old_start,
                    old_lines: header.old_lines,
                    new_start: header.new_start,
                    new_lines: header.new_lines,
                    changes: Vec::new(),
                },
            });
        }
        // index, mode, similarity and binary lines carry nothing we keep
    }

    finish_file(&mut files, &mut current_file, &mut current_hunk);
    files
}

fn finish_file(
    files: &mut Vec<FileDiff>,
    current_file: &mut Option<FileDiff>,
    current_hunk: &mut Option<HunkCursor>,
) {
    if let Some(mut f) = current_file.take() {
        if let Some(h) = current_hunk.take() {
            f.chunks.push(h.chunk);
        }
        files.push(f);
    }
}

/// Parse "diff --git a/path b/path" line
fn parse_diff_git_line(line: &str) -> (Option<String>, Option<String>) {
    let line = line.strip_prefix("diff --git ").unwrap_or(line);
    let parts: Vec<&str> = line.splitn(2, " b/").collect();

    let old_path = parts.first().and_then(|p| p.strip_prefix("a/")).map(String::from);
    let new_path = parts.get(1).map(|p| p.to_string());

    (old_path, new_path)
}

/// Path from a `---`/`+++` line: drops a trailing timestamp and the a/ b/ prefix
fn header_path(raw: &str) -> String {
    let path = raw.split('\t').next().unwrap_or(raw).trim_end();
    if path == DEV_NULL {
        return path.to_string();
    }
    path.strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path)
        .to_string()
}

struct HunkHeader {
    old_start: u32,
    old_lines: u32,
    new_start: u32,
    new_lines: u32,
}

/// Parse a hunk header: @@ -old_start,old_count +new_start,new_count @@ <section>
fn parse_hunk_header(line: &str) -> Option<HunkHeader> {
    let rest = line.strip_prefix("@@ ")?;
    let (ranges, _section) = rest.split_once(" @@")?;
    let mut parts = ranges.split_whitespace();

    let old_part = parts.next()?.strip_prefix('-')?;
    let new_part = parts.next()?.strip_prefix('+')?;

    let (old_start, old_lines) = parse_range(old_part)?;
    let (new_start, new_lines) = parse_range(new_part)?;

    Some(HunkHeader {
        old_start,
        old_lines,
        new_start,
        new_lines,
    })
}

fn parse_range(s: &str) -> Option<(u32, u32)> {
    if let Some((start, count)) = s.split_once(',') {
        Some((start.parse().ok()?, count.parse().ok()?))
    } else {
        Some((s.parse().ok()?, 1))
    }
}
