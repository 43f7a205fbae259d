//! Line-level diffs based on the longest common subsequence.

use serde::{Deserialize, Serialize};

use crate::config::TRUNCATION_MARKER;

/// What happened to a line between two texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffLineKind {
    Add,
    Remove,
    Context,
}

/// One line of a line diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    #[serde(rename = "type")]
    pub kind: DiffLineKind,
    pub content: String,
}

impl DiffLine {
    fn new(kind: DiffLineKind, content: &str) -> Self {
        Self {
            kind,
            content: content.to_string(),
        }
    }
}

/// Line statistics for a whole-document change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
    pub unchanged: usize,
    /// Human-readable summary, e.g. "+3 lines, -1 lines (2.4% changed)".
    pub summary: String,
}

/// Compute the line diff between two texts.
///
/// Lines present in both texts (in the same relative order) are context;
/// within a changed block removals come before additions.
#[must_use]
pub fn diff_lines(old_text: &str, new_text: &str) -> Vec<DiffLine> {
    let old: Vec<&str> = old_text.lines().collect();
    let new: Vec<&str> = new_text.lines().collect();

    let prefix = old
        .iter()
        .zip(new.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let mut result: Vec<DiffLine> = old[..prefix]
        .iter()
        .map(|line| DiffLine::new(DiffLineKind::Context, line))
        .collect();
    result.extend(lcs_diff(
        &old[prefix..old.len() - suffix],
        &new[prefix..new.len() - suffix],
    ));
    result.extend(
        old[old.len() - suffix..]
            .iter()
            .map(|line| DiffLine::new(DiffLineKind::Context, line)),
    );
    result
}

/// Classic dynamic-programming LCS walk over two line slices.
fn lcs_diff(old: &[&str], new: &[&str]) -> Vec<DiffLine> {
    let (n, m) = (old.len(), new.len());
    let width = m + 1;
    // table[i * width + j] = LCS length of old[i..] and new[j..]
    let mut table = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i * width + j] = if old[i] == new[j] {
                table[(i + 1) * width + j + 1] + 1
            } else {
                table[(i + 1) * width + j].max(table[i * width + j + 1])
            };
        }
    }

    let mut result = Vec::with_capacity(n + m);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old[i] == new[j] {
            result.push(DiffLine::new(DiffLineKind::Context, old[i]));
            i += 1;
            j += 1;
        } else if table[(i + 1) * width + j] >= table[i * width + j + 1] {
            result.push(DiffLine::new(DiffLineKind::Remove, old[i]));
            i += 1;
        } else {
            result.push(DiffLine::new(DiffLineKind::Add, new[j]));
            j += 1;
        }
    }
    result.extend(old[i..].iter().map(|line| DiffLine::new(DiffLineKind::Remove, line)));
    result.extend(new[j..].iter().map(|line| DiffLine::new(DiffLineKind::Add, line)));
    result
}

/// Count lines of each kind in a diff.
#[must_use]
pub fn count_lines(diff: &[DiffLine], kind: DiffLineKind) -> usize {
    diff.iter().filter(|line| line.kind == kind).count()
}

/// Line statistics and summary for a change between two texts.
#[must_use]
pub fn compute_diff(old_text: &str, new_text: &str) -> DiffStats {
    let diff = diff_lines(old_text, new_text);
    let added = count_lines(&diff, DiffLineKind::Add);
    let removed = count_lines(&diff, DiffLineKind::Remove);
    let unchanged = count_lines(&diff, DiffLineKind::Context);

    DiffStats {
        added,
        removed,
        unchanged,
        summary: diff_summary(added, removed, unchanged),
    }
}

fn diff_summary(added: usize, removed: usize, unchanged: usize) -> String {
    let mut parts = Vec::new();
    if added > 0 {
        parts.push(format!("+{added} lines"));
    }
    if removed > 0 {
        parts.push(format!("-{removed} lines"));
    }
    if parts.is_empty() {
        return "No text changes detected".to_string();
    }

    let total = added + removed + unchanged;
    let percent = (added + removed) as f64 / total as f64 * 100.0;
    format!("{} ({percent:.1}% changed)", parts.join(", "))
}

/// Render a unified diff (`--- / +++ / @@` hunks) between two texts.
///
/// Returns an empty string when the texts have identical lines.
#[must_use]
pub fn unified_diff(
    old_text: &str,
    new_text: &str,
    label_a: &str,
    label_b: &str,
    context: usize,
) -> String {
    let ops = diff_lines(old_text, new_text);

    let mut hunks: Vec<(usize, usize)> = Vec::new();
    for (idx, _) in ops
        .iter()
        .enumerate()
        .filter(|(_, op)| op.kind != DiffLineKind::Context)
    {
        let start = idx.saturating_sub(context);
        let end = (idx + context + 1).min(ops.len());
        match hunks.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => hunks.push((start, end)),
        }
    }
    if hunks.is_empty() {
        return String::new();
    }

    // Line positions (0-based) in the old and new text before each op.
    let mut old_pos = Vec::with_capacity(ops.len());
    let mut new_pos = Vec::with_capacity(ops.len());
    let (mut o, mut n) = (0usize, 0usize);
    for op in &ops {
        old_pos.push(o);
        new_pos.push(n);
        match op.kind {
            DiffLineKind::Context => {
                o += 1;
                n += 1;
            }
            DiffLineKind::Remove => o += 1,
            DiffLineKind::Add => n += 1,
        }
    }

    let mut out = format!("--- {label_a}\n+++ {label_b}\n");
    for (start, end) in hunks {
        let slice = &ops[start..end];
        let old_count = slice.iter().filter(|op| op.kind != DiffLineKind::Add).count();
        let new_count = slice.iter().filter(|op| op.kind != DiffLineKind::Remove).count();
        let old_start = if old_count == 0 { old_pos[start] } else { old_pos[start] + 1 };
        let new_start = if new_count == 0 { new_pos[start] } else { new_pos[start] + 1 };

        out.push_str(&format!(
            "@@ -{old_start},{old_count} +{new_start},{new_count} @@\n"
        ));
        for op in slice {
            let prefix = match op.kind {
                DiffLineKind::Context => ' ',
                DiffLineKind::Remove => '-',
                DiffLineKind::Add => '+',
            };
            out.push(prefix);
            out.push_str(&op.content);
            out.push('\n');
        }
    }
    out
}

/// Cut a diff down to `max_chars` characters, marking the cut.
#[must_use]
pub fn truncate_diff(diff: &str, max_chars: usize) -> String {
    match diff.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{TRUNCATION_MARKER}", &diff[..byte_idx]),
        None => diff.to_string(),
    }
}
