// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output naming and natural (numeric-aware) ordering of input files.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Prefix for PDFs produced by the monochrome converter.
pub const ENHANCED_PREFIX: &str = "enhanced_";

/// Prefix for PDFs produced from a directory of images.
pub const GENERATED_PREFIX: &str = "generated_";

/// A run of either digits or non-digits.
#[derive(Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Text(&'a str),
    Number(&'a str),
}

fn chunks(s: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_digits = None;

    for (i, c) in s.char_indices() {
        let digit = c.is_ascii_digit();
        match in_digits {
            Some(prev) if prev != digit => {
                out.push(make_chunk(&s[start..i], prev));
                start = i;
            }
            _ => {}
        }
        in_digits = Some(digit);
    }
    if let Some(digit) = in_digits {
        out.push(make_chunk(&s[start..], digit));
    }
    out
}

fn make_chunk(text: &str, digits: bool) -> Chunk<'_> {
    if digits {
        Chunk::Number(text)
    } else {
        Chunk::Text(text)
    }
}

/// Compare two digit runs by numeric value without parsing, so arbitrarily
/// long runs cannot overflow. Leading zeros are ignored.
fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Natural ordering: digit runs compare as numbers, text runs compare
/// case-insensitively. `img2` sorts before `img10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let left = chunks(a);
    let right = chunks(b);

    for (l, r) in left.iter().zip(right.iter()) {
        let ordering = match (l, r) {
            (Chunk::Number(x), Chunk::Number(y)) => cmp_digits(x, y),
            (Chunk::Text(x), Chunk::Text(y)) => cmp_text(x, y),
            // Digits sort before letters, as they do in ASCII.
            (Chunk::Number(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Number(_)) => Ordering::Greater,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    left.len().cmp(&right.len())
}

/// Stable natural sort of paths by their full textual form.
pub fn natural_sort(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));
}

/// `<dir>/enhanced_<basename>` for a converted PDF.
pub fn enhanced_output_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{ENHANCED_PREFIX}{name}"))
}

/// Output path for a bundle of images: `generated_<dirname>.pdf`, written next
/// to the directory that holds `first_image`.
///
/// The directory is canonicalised when possible so relative paths such as
/// `scan.png` still yield a meaningful directory name.
pub fn generated_output_path(first_image: &Path) -> PathBuf {
    let dir = match first_image.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let dir = dir.canonicalize().unwrap_or(dir);
    let dir_name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "images".to_string());
    let parent = dir.parent().map(Path::to_path_buf).unwrap_or_else(|| dir.clone());
    parent.join(format!("{GENERATED_PREFIX}{dir_name}.pdf"))
}
